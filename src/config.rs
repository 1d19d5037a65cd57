//! Run configuration, stored as TOML.

use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RadiomicsError, Result};
use crate::features::ExtractorSettings;
use crate::manifest::TissueSpec;

/// Everything a run needs: where to read and write, which ROIs and tissues to process, and how to extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the reference images and masks.
    pub input_dir: PathBuf,
    /// Directory receiving the feature tables and logs. Created if missing.
    pub output_dir: PathBuf,
    pub roi_indices: Vec<u32>,
    /// Mask value marking the region of interest.
    pub label: u32,
    /// Tissue passes, processed in this order.
    pub tissues: Vec<TissueSpec>,
    pub extractor: ExtractorSettings,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            roi_indices: vec![170, 171],
            label: 1,
            tissues: vec![TissueSpec::grey_matter(), TissueSpec::white_matter()],
            extractor: ExtractorSettings::default(),
        }
    }
}

impl Config {
    /// Read a configuration from a TOML file. Missing keys take their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let text = fs::read_to_string(path)?;
        Config::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Config> {
        Ok(toml::from_str::<Config>(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let mut text = toml::to_string(self)?;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// Check the settings that would otherwise only fail in the middle of a run.
    pub fn validate(&self) -> Result<()> {
        if self.roi_indices.is_empty() {
            return Err(RadiomicsError::InvalidConfig(String::from("no ROI indices given")));
        }
        if self.tissues.is_empty() {
            return Err(RadiomicsError::InvalidConfig(String::from("no tissues given")));
        }
        let mut suffixes = HashSet::new();
        for tissue in self.tissues.iter() {
            if tissue.token.is_empty() || tissue.suffix.is_empty() {
                return Err(RadiomicsError::InvalidConfig(format!(
                    "tissue '{}' needs a non-empty token and suffix",
                    tissue.name
                )));
            }
            if !suffixes.insert(tissue.suffix.as_str()) {
                return Err(RadiomicsError::InvalidConfig(format!(
                    "tissue suffix '{}' is used more than once",
                    tissue.suffix
                )));
            }
        }
        if !(self.extractor.bin_width > 0.0) {
            return Err(RadiomicsError::InvalidConfig(format!(
                "bin width must be positive, got {}",
                self.extractor.bin_width
            )));
        }
        if self.extractor.distance == 0 {
            return Err(RadiomicsError::InvalidConfig(String::from("GLCM distance must be at least 1")));
        }
        Ok(())
    }
}
