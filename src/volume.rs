//! Brain volumes stored as single-file NIfTI-1 images ('.nii' and '.nii.gz').

use flate2::read::MultiGzDecoder;
use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use std::convert::TryFrom;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use crate::error::{RadiomicsError, Result};
use crate::util::is_gz_file;

pub use nifti::{NiftiHeader, NiftiType};

/// The spatial shape (nx, ny, nz) of the single volume described by a header.
///
/// 2D images get `nz = 1`. Dimensions beyond the third are accepted only if they have length 1.
pub fn volume_shape(header: &NiftiHeader) -> Result<(usize, usize, usize)> {
    let dim: Vec<i64> = header.dim.iter().map(|&d| d as i64).collect();
    let ndim = dim[0];
    if !(1..=7).contains(&ndim) {
        return Err(RadiomicsError::UnsupportedNiftiDimensions(dim));
    }
    let len = |axis: usize| -> i64 {
        if axis as i64 <= ndim {
            dim[axis]
        } else {
            1
        }
    };
    if (1..=3).any(|axis| len(axis) < 1) || (4..=7).any(|axis| len(axis) != 1) {
        return Err(RadiomicsError::UnsupportedNiftiDimensions(dim));
    }
    Ok((len(1) as usize, len(2) as usize, len(3) as usize))
}

/// Number of bytes the file must hold for the voxel data its header describes.
fn required_bytes(header: &NiftiHeader, shape: (usize, usize, usize)) -> Option<u64> {
    let bytes_per_voxel = (header.bitpix.max(8) / 8) as u64;
    (shape.0 as u64)
        .checked_mul(shape.1 as u64)?
        .checked_mul(shape.2 as u64)?
        .checked_mul(bytes_per_voxel)?
        .checked_add(header.vox_offset.max(0.0) as u64)
}

/// Size of the (decompressed) file content in bytes.
fn available_bytes(path: &Path) -> Result<u64> {
    if is_gz_file(path) {
        let mut input = MultiGzDecoder::new(BufReader::new(File::open(path)?));
        Ok(io::copy(&mut input, &mut io::sink())?)
    } else {
        Ok(fs::metadata(path)?.len())
    }
}

/// Drop trailing unit axes and pad 2D data to a single slice.
fn into_array3(mut data: ArrayD<f64>) -> Result<Array3<f64>> {
    while data.ndim() > 3 {
        let last = Axis(data.ndim() - 1);
        if data.len_of(last) != 1 {
            return Err(RadiomicsError::InvalidNiftiFormat(format!(
                "expected a single volume, got shape {:?}",
                data.shape()
            )));
        }
        data = data.index_axis_move(last, 0);
    }
    while data.ndim() < 3 {
        let next = Axis(data.ndim());
        data = data.insert_axis(next);
    }
    data.into_dimensionality::<Ix3>()
        .map_err(|e| RadiomicsError::InvalidNiftiFormat(e.to_string()))
}

/// A single brain volume: the NIfTI header and the voxel values, with `scl_slope` and `scl_inter` applied.
#[derive(Debug, Clone)]
pub struct NiftiVolume {
    pub header: NiftiHeader,
    /// Voxel data indexed as `[x, y, z]`.
    pub data: Array3<f64>,
}

impl NiftiVolume {
    /// Build a volume from voxel data and spacing, with an otherwise default header. The datatype defaults to float32.
    pub fn from_array(data: Array3<f64>, spacing: [f32; 3]) -> NiftiVolume {
        let mut header = NiftiHeader::default();
        header.pixdim[1] = spacing[0];
        header.pixdim[2] = spacing[1];
        header.pixdim[3] = spacing[2];
        header.sform_code = 0;
        header.qform_code = 0;
        NiftiVolume { header, data }.with_datatype(NiftiType::Float32)
    }

    /// Set the on-disk datatype used by [`write_nifti`].
    pub fn with_datatype(mut self, datatype: NiftiType) -> NiftiVolume {
        self.header.datatype = datatype as i16;
        self.header.bitpix = match datatype {
            NiftiType::Uint8 | NiftiType::Int8 => 8,
            NiftiType::Int16 | NiftiType::Uint16 => 16,
            NiftiType::Float64 | NiftiType::Int64 | NiftiType::Uint64 => 64,
            _ => 32,
        };
        self
    }

    /// Read a NIfTI-1 file. If the file's name ends with ".gz", the file is assumed to need GZip decoding.
    ///
    /// The header is checked before any voxel data is loaded: files holding less data than their
    /// header describes are rejected with [`RadiomicsError::InvalidNiftiFormat`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NiftiVolume> {
        let path = path.as_ref();
        let header = NiftiHeader::from_file(path)?;
        let shape = volume_shape(&header)?;
        let available = available_bytes(path)?;
        match required_bytes(&header, shape) {
            Some(required) if required <= available => {}
            required => {
                return Err(RadiomicsError::InvalidNiftiFormat(format!(
                    "header describes a {}x{}x{} volume needing {} bytes, but the file holds {}",
                    shape.0,
                    shape.1,
                    shape.2,
                    required.map_or_else(|| String::from("more than 2^64"), |r| r.to_string()),
                    available
                )));
            }
        }

        let obj = ReaderOptions::new().read_file(path)?;
        let header = obj.header().clone();
        let data = into_array3(obj.into_volume().into_ndarray::<f64>()?)?;
        Ok(NiftiVolume { header, data })
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// "3D", or "2D" for single-slice volumes.
    pub fn dimensionality(&self) -> usize {
        if self.data.len_of(Axis(2)) > 1 {
            3
        } else {
            2
        }
    }

    /// Voxel spacing in mm along x, y and z.
    pub fn spacing(&self) -> [f64; 3] {
        let pixdim = &self.header.pixdim;
        [pixdim[1].abs() as f64, pixdim[2].abs() as f64, pixdim[3].abs() as f64]
    }

    /// The voxel to world affine, as its first three rows.
    ///
    /// Uses the sform if set, then the qform, and falls back to plain voxel scaling.
    pub fn affine(&self) -> [[f64; 4]; 3] {
        let h = &self.header;
        if h.sform_code > 0 {
            let row = |r: [f32; 4]| [r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64];
            return [row(h.srow_x), row(h.srow_y), row(h.srow_z)];
        }
        let [dx, dy, dz] = self.spacing();
        if h.qform_code <= 0 {
            return [[dx, 0., 0., 0.], [0., dy, 0., 0.], [0., 0., dz, 0.]];
        }

        let (b, c, d) = (h.quatern_b as f64, h.quatern_c as f64, h.quatern_d as f64);
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let dz = if h.pixdim[0] < 0.0 { -dz } else { dz };
        [
            [
                (a * a + b * b - c * c - d * d) * dx,
                2.0 * (b * c - a * d) * dy,
                2.0 * (b * d + a * c) * dz,
                h.quatern_x as f64,
            ],
            [
                2.0 * (b * c + a * d) * dx,
                (a * a + c * c - b * b - d * d) * dy,
                2.0 * (c * d - a * b) * dz,
                h.quatern_y as f64,
            ],
            [
                2.0 * (b * d - a * c) * dx,
                2.0 * (c * d + a * b) * dy,
                (a * a + d * d - b * b - c * c) * dz,
                h.quatern_z as f64,
            ],
        ]
    }

    /// Map a (possibly fractional) voxel index to world coordinates using [`NiftiVolume::affine`].
    pub fn voxel_to_world(&self, index: [f64; 3]) -> [f64; 3] {
        let affine = self.affine();
        let mut world = [0.0; 3];
        for (row, w) in affine.iter().zip(world.iter_mut()) {
            *w = row[0] * index[0] + row[1] * index[1] + row[2] * index[2] + row[3];
        }
        world
    }

    /// Whether every voxel is exactly zero.
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }
}

impl fmt::Display for NiftiVolume {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (nx, ny, nz) = self.dim();
        let [dx, dy, dz] = self.spacing();
        write!(f, "NIfTI volume of {}x{}x{} voxels at {}x{}x{} mm.", nx, ny, nz, dx, dy, dz)
    }
}

/// Read a NIfTI-1 volume from a '.nii' or '.nii.gz' file.
///
/// # Examples
///
/// ```no_run
/// let mask = roiradiomics::read_nifti("/path/to/Alabel_170_.nii.gz").unwrap();
/// println!("Mask is empty: {}", mask.is_all_zero());
/// ```
pub fn read_nifti<P: AsRef<Path>>(path: P) -> Result<NiftiVolume> {
    NiftiVolume::from_file(path)
}

/// Write a NIfTI-1 volume in the datatype of its header. If the file's name ends with ".gz", the file is GZip compressed.
///
/// Values are written unscaled. Each axis must fit the header's 16 bit dimension fields.
pub fn write_nifti<P: AsRef<Path>>(path: P, volume: &NiftiVolume) -> Result<()> {
    let (nx, ny, nz) = volume.dim();
    if [nx, ny, nz].iter().any(|&n| i16::try_from(n).is_err()) {
        return Err(RadiomicsError::VolumeTooLarge(nx, ny, nz));
    }

    let mut header = volume.header.clone();
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    let writer = WriterOptions::new(path.as_ref()).reference_header(&header);
    match header.data_type()? {
        NiftiType::Uint8 => writer.write_nifti(&volume.data.mapv(|v| v as u8))?,
        NiftiType::Int16 => writer.write_nifti(&volume.data.mapv(|v| v as i16))?,
        NiftiType::Float32 => writer.write_nifti(&volume.data.mapv(|v| v as f32))?,
        NiftiType::Float64 => writer.write_nifti(&volume.data)?,
        other => return Err(RadiomicsError::UnsupportedNiftiDatatype(other as i16)),
    }
    Ok(())
}
