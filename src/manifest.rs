//! Discovery of reference image / mask file pairs.
//!
//! Reference images are cropped T1 volumes named `<subject>_croppedT1_<roi>_.nii.gz`. The mask for
//! a tissue type lives next to it, named by replacing `_croppedT1_<roi>_` with `<token>_<roi>_`,
//! so `A_croppedT1_170_.nii.gz` pairs with `Alabel_170_.nii.gz` (grey matter) and
//! `A_labelWM_170_.nii.gz` (white matter).

use glob::Pattern;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const REFERENCE_TOKEN: &str = "_croppedT1";
pub const NIFTI_GZ_SUFFIX: &str = ".nii.gz";

/// A tissue class with its own set of masks and output tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TissueSpec {
    /// Human readable name, only used for logging.
    pub name: String,
    /// Replaces `_croppedT1` in the reference file name to give the mask file name.
    pub token: String,
    /// Output table suffix, as in `GLCM_<roi>_<suffix>.csv`.
    pub suffix: String,
}

impl TissueSpec {
    pub fn new(name: &str, token: &str, suffix: &str) -> TissueSpec {
        TissueSpec {
            name: String::from(name),
            token: String::from(token),
            suffix: String::from(suffix),
        }
    }

    pub fn grey_matter() -> TissueSpec {
        TissueSpec::new("grey matter", "label", "GM")
    }

    pub fn white_matter() -> TissueSpec {
        TissueSpec::new("white matter", "_labelWM", "WM")
    }
}

impl fmt::Display for TissueSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.suffix)
    }
}

/// Glob pattern matching all reference images for the given ROI index.
pub fn reference_pattern(roi: u32) -> String {
    format!("*{}_{}_{}", REFERENCE_TOKEN, roi, NIFTI_GZ_SUFFIX)
}

/// Whether `file_name` is a reference image for the given ROI index.
pub fn is_reference_name(file_name: &str, roi: u32) -> bool {
    file_name.ends_with(&format!("{}_{}_{}", REFERENCE_TOKEN, roi, NIFTI_GZ_SUFFIX))
}

/// Derive the mask file name from a reference image file name. Every occurrence of `_croppedT1_<roi>_` is replaced.
///
/// # Examples
///
/// ```
/// use roiradiomics::mask_file_name;
/// assert_eq!("Alabel_170_.nii.gz", mask_file_name("A_croppedT1_170_.nii.gz", "label", 170));
/// assert_eq!("A_labelWM_170_.nii.gz", mask_file_name("A_croppedT1_170_.nii.gz", "_labelWM", 170));
/// ```
pub fn mask_file_name(image_name: &str, token: &str, roi: u32) -> String {
    image_name.replace(
        &format!("{}_{}_", REFERENCE_TOKEN, roi),
        &format!("{}_{}_", token, roi),
    )
}

/// Read access to the location holding the reference images and masks.
pub trait FileLookup {
    /// Names (not paths) of the files matching the glob-style `pattern`.
    fn find(&self, pattern: &str) -> Result<Vec<String>>;

    /// Whether a file with this name exists.
    fn exists(&self, name: &str) -> bool;

    /// Full path of the file with this name.
    fn resolve(&self, name: &str) -> PathBuf;
}

/// A [`FileLookup`] over a directory on disk.
#[derive(Debug, Clone)]
pub struct DirLookup {
    dir: PathBuf,
}

impl DirLookup {
    pub fn new<P: AsRef<Path>>(dir: P) -> DirLookup {
        DirLookup {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FileLookup for DirLookup {
    fn find(&self, pattern: &str) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input directory '{}' does not exist", self.dir.display()),
            )
            .into());
        }
        // The directory part is matched literally, only the file name part is a pattern.
        let full = format!(
            "{}{}{}",
            Pattern::escape(&self.dir.to_string_lossy()),
            std::path::MAIN_SEPARATOR,
            pattern
        );

        let mut names = Vec::new();
        for entry in glob::glob(&full)? {
            let path = entry?;
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn exists(&self, name: &str) -> bool {
        self.dir.join(name).is_file()
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// A [`FileLookup`] over a fixed set of file names, rooted at a directory that need not exist.
#[derive(Debug, Clone, Default)]
pub struct MemoryLookup {
    root: PathBuf,
    names: BTreeSet<String>,
}

impl MemoryLookup {
    pub fn new<P, I, S>(root: P, names: I) -> MemoryLookup
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryLookup {
            root: root.as_ref().to_path_buf(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl FileLookup for MemoryLookup {
    fn find(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = Pattern::new(pattern)?;
        Ok(self
            .names
            .iter()
            .filter(|name| pattern.matches(name))
            .cloned()
            .collect())
    }

    fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    /// Both files exist.
    Ready,
    /// The reference image exists but the derived mask file does not.
    MaskMissing,
}

/// One discovered reference image and the mask it should be paired with.
#[derive(Debug, Clone, PartialEq)]
pub struct PairEntry {
    pub image: PathBuf,
    pub mask: PathBuf,
    pub status: PairStatus,
}

/// All pairs of one run, keyed by tissue suffix and ROI index. Pairs are ordered by reference file name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: BTreeMap<(String, u32), Vec<PairEntry>>,
}

impl Manifest {
    /// Discover all pairs for the given tissues and ROI indices.
    ///
    /// The input location is scanned once per ROI index; the result is shared by all tissues.
    pub fn build<L>(lookup: &L, tissues: &[TissueSpec], rois: &[u32]) -> Result<Manifest>
    where
        L: FileLookup + ?Sized,
    {
        let mut entries = BTreeMap::new();
        for &roi in rois {
            let mut images: Vec<String> = lookup
                .find(&reference_pattern(roi))?
                .into_iter()
                .filter(|name| is_reference_name(name, roi))
                .collect();
            images.sort();
            images.dedup();

            for tissue in tissues {
                let pairs: Vec<PairEntry> = images
                    .iter()
                    .map(|image_name| {
                        let mask_name = mask_file_name(image_name, &tissue.token, roi);
                        let status = if lookup.exists(&mask_name) {
                            PairStatus::Ready
                        } else {
                            PairStatus::MaskMissing
                        };
                        PairEntry {
                            image: lookup.resolve(image_name),
                            mask: lookup.resolve(&mask_name),
                            status,
                        }
                    })
                    .collect();
                entries.insert((tissue.suffix.clone(), roi), pairs);
            }
        }
        Ok(Manifest { entries })
    }

    /// The pairs for one tissue and ROI index. Empty if none were discovered.
    pub fn pairs(&self, tissue: &TissueSpec, roi: u32) -> &[PairEntry] {
        self.entries
            .get(&(tissue.suffix.clone(), roi))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of discovered pairs over all tissues and ROI indices.
    pub fn num_pairs(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lookup() -> MemoryLookup {
        MemoryLookup::new(
            "/data",
            vec![
                "B_croppedT1_170_.nii.gz",
                "A_croppedT1_170_.nii.gz",
                "Alabel_170_.nii.gz",
                "A_labelWM_170_.nii.gz",
                "Blabel_170_.nii.gz",
                "A_croppedT1_1700_.nii.gz",
                "A_croppedT1_17_.nii.gz",
                "C_croppedT1_171_.nii",
            ],
        )
    }

    #[test]
    fn mask_names_are_derived_by_substitution() {
        assert_eq!("Blabel_171_.nii.gz", mask_file_name("B_croppedT1_171_.nii.gz", "label", 171));
        assert_eq!("B_croppedT1_171_.nii.gz", mask_file_name("B_croppedT1_171_.nii.gz", "label", 170));
    }

    #[test]
    fn only_reference_images_for_the_roi_are_found() {
        let found = lookup().find(&reference_pattern(170)).unwrap();
        assert_eq!(vec!["A_croppedT1_170_.nii.gz", "B_croppedT1_170_.nii.gz"], found);
        assert!(lookup().find(&reference_pattern(171)).unwrap().is_empty());
    }

    #[test]
    fn the_manifest_marks_missing_masks() {
        let tissues = vec![TissueSpec::grey_matter(), TissueSpec::white_matter()];
        let manifest = Manifest::build(&lookup(), &tissues, &[170, 171]).unwrap();

        let gm = manifest.pairs(&tissues[0], 170);
        assert_eq!(2, gm.len());
        assert_eq!(PathBuf::from("/data/A_croppedT1_170_.nii.gz"), gm[0].image);
        assert_eq!(PathBuf::from("/data/Alabel_170_.nii.gz"), gm[0].mask);
        assert_eq!(PairStatus::Ready, gm[0].status);
        assert_eq!(PairStatus::Ready, gm[1].status);

        let wm = manifest.pairs(&tissues[1], 170);
        assert_eq!(PairStatus::Ready, wm[0].status);
        assert_eq!(PathBuf::from("/data/B_labelWM_170_.nii.gz"), wm[1].mask);
        assert_eq!(PairStatus::MaskMissing, wm[1].status);

        assert!(manifest.pairs(&tissues[0], 171).is_empty());
        assert!(manifest.pairs(&tissues[0], 999).is_empty());
        assert_eq!(4, manifest.num_pairs());
    }
}
