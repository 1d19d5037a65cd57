//! Batch radiomics feature extraction for pairs of cropped T1 images and tissue masks.
//!
//! For each ROI index `x` and tissue (grey and white matter by default), all reference images
//! `*_croppedT1_x_.nii.gz` in the input directory are paired with their mask, features are extracted
//! with a [`FeatureExtractor`], and the rows are written to `GLCM_x_<suffix>.csv`. Empty masks are
//! listed in `empty_masks_log.txt`.
//!
//! ```no_run
//! let mut config = roiradiomics::Config::default();
//! config.input_dir = "/data/check_all_ABC".into();
//! let summary = roiradiomics::run_on_input_dir(&config).unwrap();
//! println!("{}", summary);
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod manifest;
pub mod pipeline;
pub mod skiplog;
pub mod table;
pub mod traits;
pub mod util;
pub mod volume;

pub use config::Config;
pub use error::{RadiomicsError, Result};
pub use features::{ExtractorSettings, FeatureValue, FeatureVector, StandardExtractor};
pub use manifest::{mask_file_name, DirLookup, FileLookup, Manifest, MemoryLookup, TissueSpec};
pub use pipeline::{run, run_on_input_dir, RunSummary, TissueReport};
pub use skiplog::SkipLog;
pub use table::FeatureTable;
pub use traits::FeatureExtractor;
pub use volume::{read_nifti, write_nifti, NiftiHeader, NiftiType, NiftiVolume};
