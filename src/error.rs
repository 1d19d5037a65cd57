use quick_error::quick_error;
use std::io::Error as IOError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum RadiomicsError {
        /// Invalid NIfTI file, e.g. less voxel data than the header describes.
        InvalidNiftiFormat(reason: String) {
            display("Invalid NIfTI file: {}", reason)
        }

        UnsupportedNiftiDatatype(code: i16) {
            display("Unsupported NIfTI datatype code {}", code)
        }

        UnsupportedNiftiDimensions(dim: Vec<i64>) {
            display("Unsupported NIfTI dimensions {:?}, expected a single 2D or 3D volume", dim)
        }

        /// An axis does not fit the 16 bit dimension fields of the NIfTI-1 header.
        VolumeTooLarge(nx: usize, ny: usize, nz: usize) {
            display("Volume of {}x{}x{} voxels is too large for a NIfTI-1 header", nx, ny, nz)
        }

        Nifti(err: nifti::NiftiError) {
            from()
            display("NIfTI error: {}", err)
            source(err)
        }

        /// Image and mask do not share the same voxel grid.
        GeometryMismatch(image: (usize, usize, usize), mask: (usize, usize, usize)) {
            display("Image size {:?} does not match mask size {:?}", image, mask)
        }

        /// NaN or infinite intensity inside the region of interest.
        NonFiniteIntensity(index: [usize; 3]) {
            display("Non-finite image intensity at voxel {:?} inside the region of interest", index)
        }

        LabelNotPresent(label: u32) {
            display("Label {} not present in mask", label)
        }

        /// A feature row does not share the column schema of its table.
        InconsistentSchema(expected: usize, found: usize) {
            display("Feature row schema differs from table schema ({} columns expected, {} found)", expected, found)
        }

        InvalidConfig(reason: String) {
            display("Invalid configuration: {}", reason)
        }

        Pattern(err: glob::PatternError) {
            from()
            source(err)
        }

        Glob(err: glob::GlobError) {
            from()
            source(err)
        }

        Csv(err: csv::Error) {
            from()
            source(err)
        }

        TomlDe(err: toml::de::Error) {
            from()
            source(err)
        }

        TomlSer(err: toml::ser::Error) {
            from()
            source(err)
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, RadiomicsError>;
