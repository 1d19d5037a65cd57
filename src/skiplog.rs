//! Records of image/mask pairs that did not produce a feature row.

use csv::WriterBuilder;

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const EMPTY_MASKS_LOG_FILE: &str = "empty_masks_log.txt";
pub const FAILURES_LOG_FILE: &str = "extraction_failures.tsv";

/// A pair for which loading or feature extraction failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedPair {
    pub image: PathBuf,
    pub mask: PathBuf,
    pub reason: String,
}

/// Skipped pairs, by reason. Each pass returns one, the driver merges them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkipLog {
    /// Masks whose voxels are all zero.
    pub empty_masks: Vec<PathBuf>,
    /// Masks that do not exist. Counted, but not written to the empty mask log.
    pub missing_masks: Vec<PathBuf>,
    pub failures: Vec<FailedPair>,
}

impl SkipLog {
    pub fn new() -> SkipLog {
        SkipLog::default()
    }

    pub fn merge(&mut self, other: SkipLog) {
        self.empty_masks.extend(other.empty_masks);
        self.missing_masks.extend(other.missing_masks);
        self.failures.extend(other.failures);
    }

    pub fn is_empty(&self) -> bool {
        self.empty_masks.is_empty() && self.missing_masks.is_empty() && self.failures.is_empty()
    }

    /// Write the empty mask paths, one per line.
    pub fn write_empty_masks<W: Write>(&self, output: &mut W) -> Result<()> {
        for mask in self.empty_masks.iter() {
            writeln!(output, "{}", mask.display())?;
        }
        Ok(())
    }

    /// Write the failures as tab separated values with a header line.
    pub fn write_failures<W: Write>(&self, output: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(output);
        wtr.write_record(&["ImageRoot", "MaskPath", "Reason"])?;
        for f in self.failures.iter() {
            wtr.write_record(&[
                f.image.display().to_string(),
                f.mask.display().to_string(),
                f.reason.clone(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the log files into `dir`. The empty mask log is always written; the failure log only if there were failures,
    /// otherwise a failure log left by an earlier run is removed.
    ///
    /// Returns the paths of the written files.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let empty_path = dir.as_ref().join(EMPTY_MASKS_LOG_FILE);
        let mut file = BufWriter::new(File::create(&empty_path)?);
        self.write_empty_masks(&mut file)?;
        file.flush()?;
        written.push(empty_path);

        let failures_path = dir.as_ref().join(FAILURES_LOG_FILE);
        if !self.failures.is_empty() {
            self.write_failures(BufWriter::new(File::create(&failures_path)?))?;
            written.push(failures_path);
        } else {
            match fs::remove_file(&failures_path) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        Ok(written)
    }
}
