//! Utility functions used in all other roiradiomics modules.

use std::path::Path;

/// Check whether the file extension ends with ".gz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gz_files_are_detected_by_name() {
        assert!(is_gz_file("subject_croppedT1_170_.nii.gz"));
        assert!(!is_gz_file("subject_croppedT1_170_.nii"));
        assert!(!is_gz_file("/"));
    }
}
