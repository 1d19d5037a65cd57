use approx::assert_abs_diff_eq;
use ndarray::Array3;

use roiradiomics::volume::volume_shape;
use roiradiomics::{read_nifti, write_nifti, NiftiHeader, NiftiType, NiftiVolume};

fn volume() -> NiftiVolume {
    let data = Array3::from_shape_fn((4, 3, 2), |(x, y, z)| (x + 10 * y + 100 * z) as f64);
    NiftiVolume::from_array(data, [0.9, 1.0, 1.2])
}

#[test]
fn compressed_and_plain_files_hold_the_same_volume() {
    let dir = tempfile::tempdir().unwrap();
    let gz = dir.path().join("A_croppedT1_170_.nii.gz");
    let plain = dir.path().join("A_croppedT1_170_.nii");
    let original = volume().with_datatype(NiftiType::Int16);
    write_nifti(&gz, &original).unwrap();
    write_nifti(&plain, &original).unwrap();

    let from_gz = read_nifti(&gz).unwrap();
    let from_plain = read_nifti(&plain).unwrap();
    assert_eq!(original.data, from_gz.data);
    assert_eq!(from_gz.data, from_plain.data);
    assert_eq!((4, 3, 2), from_gz.dim());
    assert_eq!(NiftiType::Int16 as i16, from_gz.header.datatype);

    // The compressed file starts with the gzip magic bytes.
    let bytes = std::fs::read(&gz).unwrap();
    assert_eq!([0x1f, 0x8b], bytes[0..2]);
    assert_eq!(352 + 4 * 3 * 2 * 2, std::fs::metadata(&plain).unwrap().len());
}

#[test]
fn the_header_alone_can_be_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Alabel_170_.nii.gz");
    write_nifti(&path, &volume().with_datatype(NiftiType::Uint8)).unwrap();

    let header = NiftiHeader::from_file(&path).unwrap();
    assert_eq!(352.0, header.vox_offset);
    assert_eq!((4, 3, 2), volume_shape(&header).unwrap());
    assert_eq!(NiftiType::Uint8 as i16, header.datatype);
    assert_eq!(8, header.bitpix);
    assert_abs_diff_eq!(0.9, header.pixdim[1], epsilon = 1e-6);
    assert_abs_diff_eq!(1.2, header.pixdim[3], epsilon = 1e-6);

    let read = read_nifti(&path).unwrap();
    assert_eq!(3, read.dimensionality());
    assert_abs_diff_eq!(1.2, read.spacing()[2], epsilon = 1e-6);
}

#[test]
fn float_voxels_survive_a_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("float.nii.gz");
    let data = Array3::from_shape_fn((3, 3, 3), |(x, y, z)| 0.25 * (x as f64) - 1.5 * (y as f64) + z as f64);
    write_nifti(&path, &NiftiVolume::from_array(data.clone(), [1.0, 1.0, 1.0])).unwrap();

    let read = read_nifti(&path).unwrap();
    for (a, b) in data.iter().zip(read.data.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
    }
    assert!(!read.is_all_zero());
}

#[test]
fn a_single_slice_is_two_dimensional() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slice.nii");
    let data = Array3::from_shape_fn((5, 4, 1), |(x, y, _)| (x * y) as f64);
    write_nifti(&path, &NiftiVolume::from_array(data.clone(), [1.0, 1.0, 1.0])).unwrap();

    let read = read_nifti(&path).unwrap();
    assert_eq!((5, 4, 1), read.dim());
    assert_eq!(2, read.dimensionality());
    assert_eq!(data, read.data);
}

#[test]
fn reading_a_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_nifti(dir.path().join("nope.nii.gz")).is_err());
}
