use crate::error::Result;
use crate::features::FeatureVector;
use crate::volume::NiftiVolume;

/// Computes a named feature record for the region of `image` where `mask` equals `label`.
pub trait FeatureExtractor {
    fn execute(&self, image: &NiftiVolume, mask: &NiftiVolume, label: u32) -> Result<FeatureVector>;
}
