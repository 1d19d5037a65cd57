//! Radiomics feature records and the built-in feature extractor.
//!
//! Feature names follow the common radiomics naming scheme `<imageType>_<featureClass>_<featureName>`,
//! e.g. `original_glcm_Contrast`, and `diagnostics_<section>_<name>` for the diagnostic fields.

pub mod diagnostics;
pub mod firstorder;
pub mod glcm;
pub mod gldm;
pub mod glrlm;
pub mod glszm;
pub mod linalg;
pub mod ngtdm;
pub mod shape;
pub mod sizematrix;

use indexmap::IndexMap;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{RadiomicsError, Result};
use crate::volume::NiftiVolume;
use crate::traits::FeatureExtractor;

/// The diagnostic fields that are removed from every feature record before it is stored.
pub const DROPPED_DIAGNOSTICS: [&str; 2] = [
    "diagnostics_Mask-original_CenterOfMassIndex",
    "diagnostics_Mask-original_CenterOfMass",
];

/// The 13 unique neighbour directions of a voxel in 3D, as `[dx, dy, dz]`. Their negations give the other 13.
pub const DIRECTIONS_3D: [[i64; 3]; 13] = [
    [1, 0, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 1, 0],
    [1, -1, 0],
    [1, 0, 1],
    [1, 0, -1],
    [0, 1, 1],
    [0, 1, -1],
    [1, 1, 1],
    [1, 1, -1],
    [1, -1, 1],
    [1, -1, -1],
];

/// All 26 neighbour offsets of a voxel.
pub fn neighbours_26() -> impl Iterator<Item = [i64; 3]> {
    DIRECTIONS_3D
        .iter()
        .flat_map(|d| std::iter::once(*d).chain(std::iter::once([-d[0], -d[1], -d[2]])))
}

/// A single feature value.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeatureValue::Number(v) => write!(f, "{}", v),
            FeatureValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> FeatureValue {
        FeatureValue::Number(v)
    }
}

impl From<usize> for FeatureValue {
    fn from(v: usize) -> FeatureValue {
        FeatureValue::Number(v as f64)
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> FeatureValue {
        FeatureValue::Text(s)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> FeatureValue {
        FeatureValue::Text(String::from(s))
    }
}

/// An ordered record of named feature values. Names keep their insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    values: IndexMap<String, FeatureValue>,
}

impl FeatureVector {
    pub fn new() -> FeatureVector {
        FeatureVector::default()
    }

    /// Insert or replace a value. A replaced value keeps its original position.
    pub fn insert<V: Into<FeatureValue>>(&mut self, name: &str, value: V) {
        self.values.insert(String::from(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    /// The numeric value of a feature, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(FeatureValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove the named columns, keeping the order of the rest. Names that are not present are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        for name in names {
            self.values.shift_remove(*name);
        }
    }
}

/// Settings of the [`StandardExtractor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Width of the intensity bins used for discretization (entropy, uniformity, GLCM).
    pub bin_width: f64,
    /// Voxel distance of the co-occurring neighbours.
    pub distance: usize,
    /// Whether the co-occurrence matrix counts each neighbour pair in both directions.
    pub symmetric_glcm: bool,
}

impl Default for ExtractorSettings {
    fn default() -> ExtractorSettings {
        ExtractorSettings {
            bin_width: 25.0,
            distance: 1,
            symmetric_glcm: true,
        }
    }
}

/// The voxels of an image inside the region of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    /// Image intensities of the region voxels.
    pub values: Vec<f64>,
    /// `[x, y, z]` indices of the region voxels, in the same order as `values`.
    pub indices: Vec<[usize; 3]>,
    /// Smallest index along each axis.
    pub bbox_min: [usize; 3],
    /// Largest index along each axis (inclusive).
    pub bbox_max: [usize; 3],
}

impl Roi {
    /// Collect the voxels of `image` where `mask` equals `label`.
    pub fn from_volumes(image: &NiftiVolume, mask: &NiftiVolume, label: u32) -> Result<Roi> {
        if image.dim() != mask.dim() {
            return Err(RadiomicsError::GeometryMismatch(image.dim(), mask.dim()));
        }
        let label = label as f64;

        let mut values = Vec::new();
        let mut indices = Vec::new();
        let mut bbox_min = [usize::MAX; 3];
        let mut bbox_max = [0usize; 3];
        for ((x, y, z), &m) in mask.data.indexed_iter() {
            if m != label {
                continue;
            }
            let v = image.data[[x, y, z]];
            if !v.is_finite() {
                return Err(RadiomicsError::NonFiniteIntensity([x, y, z]));
            }
            let idx = [x, y, z];
            for axis in 0..3 {
                bbox_min[axis] = bbox_min[axis].min(idx[axis]);
                bbox_max[axis] = bbox_max[axis].max(idx[axis]);
            }
            values.push(v);
            indices.push(idx);
        }

        Ok(Roi {
            values,
            indices,
            bbox_min,
            bbox_max,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bounding box size along each axis.
    pub fn bbox_size(&self) -> [usize; 3] {
        let mut size = [0; 3];
        if self.is_empty() {
            return size;
        }
        for axis in 0..3 {
            size[axis] = self.bbox_max[axis] - self.bbox_min[axis] + 1;
        }
        size
    }
}

/// Discretize intensities into grey levels `1..` using a fixed bin width.
///
/// Bin edges are multiples of `bin_width`, the lowest bin being the one holding the minimum.
pub fn discretize(values: &[f64], bin_width: f64) -> Vec<usize> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return Vec::new();
    }
    let low = (min / bin_width).floor();
    values
        .iter()
        .map(|v| ((v / bin_width).floor() - low) as usize + 1)
        .collect()
}

/// The discretized region inside its bounding box.
///
/// Each voxel holds the 1-based rank of its grey level among the levels present in the region, 0 marks
/// voxels outside the region. Texture matrices are indexed by rank, so their size depends on the number of
/// distinct grey levels only, not on the intensity range.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyLevelGrid {
    pub ranks: Array3<usize>,
    /// Grey level of each rank, ascending: `levels[rank - 1]`.
    pub levels: Vec<f64>,
}

impl GreyLevelGrid {
    pub fn from_roi(roi: &Roi, bin_width: f64) -> GreyLevelGrid {
        let discrete = discretize(&roi.values, bin_width);
        let present: BTreeSet<usize> = discrete.iter().cloned().collect();
        let rank_of: BTreeMap<usize, usize> = present.iter().enumerate().map(|(k, &l)| (l, k + 1)).collect();

        let size = roi.bbox_size();
        let mut ranks = Array3::zeros((size[0], size[1], size[2]));
        for (idx, level) in roi.indices.iter().zip(discrete.iter()) {
            ranks[[
                idx[0] - roi.bbox_min[0],
                idx[1] - roi.bbox_min[1],
                idx[2] - roi.bbox_min[2],
            ]] = rank_of[level];
        }
        GreyLevelGrid {
            ranks,
            levels: present.iter().map(|&l| l as f64).collect(),
        }
    }

    /// Number of distinct grey levels in the region.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Number of region voxels.
    pub fn num_voxels(&self) -> usize {
        self.ranks.iter().filter(|&&r| r > 0).count()
    }

    /// Rank of the voxel at `index + offset`; 0 if that is outside the grid or the region.
    pub fn rank_at(&self, index: [usize; 3], offset: [i64; 3]) -> usize {
        let (nx, ny, nz) = self.ranks.dim();
        let t = [
            index[0] as i64 + offset[0],
            index[1] as i64 + offset[1],
            index[2] as i64 + offset[2],
        ];
        if t[0] < 0 || t[1] < 0 || t[2] < 0 || t[0] >= nx as i64 || t[1] >= ny as i64 || t[2] >= nz as i64 {
            return 0;
        }
        self.ranks[[t[0] as usize, t[1] as usize, t[2] as usize]]
    }
}

/// Insert `original_<class>_<name>` features sorted by name. Empty names are skipped.
pub(crate) fn insert_sorted<'a, I>(features: &mut FeatureVector, class: &str, values: I)
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut named: Vec<(&str, f64)> = values.into_iter().filter(|(name, _)| !name.is_empty()).collect();
    named.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in named {
        features.insert(&format!("original_{}_{}", class, name), value);
    }
}

/// Shannon entropy (base 2) of a probability distribution, with `eps` added inside the logarithm.
pub(crate) fn entropy<'a, I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    -probabilities
        .into_iter()
        .map(|&p| p * (p + f64::EPSILON).log2())
        .sum::<f64>()
}

/// Radiomics feature extraction on the original image: diagnostics, shape, first order statistics and the
/// texture classes GLCM, GLDM, GLRLM, GLSZM and NGTDM.
///
/// # Examples
///
/// ```no_run
/// use roiradiomics::{read_nifti, FeatureExtractor, StandardExtractor};
///
/// let image = read_nifti("/path/to/A_croppedT1_170_.nii.gz").unwrap();
/// let mask = read_nifti("/path/to/Alabel_170_.nii.gz").unwrap();
/// let features = StandardExtractor::default().execute(&image, &mask, 1).unwrap();
/// println!("GLCM contrast: {:?}", features.number("original_glcm_Contrast"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StandardExtractor {
    pub settings: ExtractorSettings,
}

impl StandardExtractor {
    pub fn new(settings: ExtractorSettings) -> StandardExtractor {
        StandardExtractor { settings }
    }
}

impl FeatureExtractor for StandardExtractor {
    fn execute(&self, image: &NiftiVolume, mask: &NiftiVolume, label: u32) -> Result<FeatureVector> {
        let roi = Roi::from_volumes(image, mask, label)?;
        if roi.is_empty() {
            return Err(RadiomicsError::LabelNotPresent(label));
        }

        let mut features = FeatureVector::new();
        diagnostics::compute(&self.settings, image, mask, label, &roi, &mut features);
        shape::compute(&roi, image.spacing(), &mut features);
        firstorder::compute(&self.settings, image, &roi, &mut features);

        let grid = GreyLevelGrid::from_roi(&roi, self.settings.bin_width);
        glcm::compute(&self.settings, &grid, &mut features);
        gldm::compute(&grid, &mut features);
        glrlm::compute(&grid, &mut features);
        glszm::compute(&grid, &mut features);
        ngtdm::compute(&grid, &mut features);
        Ok(features)
    }
}
