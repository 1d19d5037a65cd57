//! The extraction run: one pass per tissue over all ROI indices, then the skip logs.

use log::{debug, info, warn};

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::features::{FeatureVector, StandardExtractor};
use crate::manifest::{DirLookup, FileLookup, Manifest, PairEntry, PairStatus, TissueSpec};
use crate::volume::read_nifti;
use crate::skiplog::{FailedPair, SkipLog};
use crate::table::{feature_row, table_file_name, FeatureTable};
use crate::traits::FeatureExtractor;

/// What happened to one image/mask pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    /// A table row, with the provenance columns already added.
    Row(FeatureVector),
    EmptyMask,
    MaskMissing,
    /// Loading or extraction failed, with the reason.
    Failed(String),
}

/// Load and check one pair, and extract its features. Never fails: errors become [`PairOutcome::Failed`].
///
/// The mask is loaded first so that empty masks are skipped without reading the image.
pub fn process_pair<E>(entry: &PairEntry, extractor: &E, label: u32) -> PairOutcome
where
    E: FeatureExtractor + ?Sized,
{
    if entry.status == PairStatus::MaskMissing {
        return PairOutcome::MaskMissing;
    }
    let mask = match read_nifti(&entry.mask) {
        Ok(mask) => mask,
        Err(e) => return PairOutcome::Failed(format!("cannot read mask: {}", e)),
    };
    if mask.is_all_zero() {
        return PairOutcome::EmptyMask;
    }
    let image = match read_nifti(&entry.image) {
        Ok(image) => image,
        Err(e) => return PairOutcome::Failed(format!("cannot read image: {}", e)),
    };
    match extractor.execute(&image, &mask, label) {
        Ok(features) => PairOutcome::Row(feature_row(features, &entry.image, &entry.mask, label)),
        Err(e) => PairOutcome::Failed(e.to_string()),
    }
}

/// Counts for one tissue and ROI index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoiReport {
    pub roi: u32,
    /// Reference images found for this ROI index.
    pub discovered: usize,
    /// Pairs that produced a table row.
    pub processed: usize,
    pub empty_skipped: usize,
    pub missing_mask_skipped: usize,
    pub failed: usize,
    /// The written table, if any row was produced.
    pub table: Option<PathBuf>,
}

/// Counts for one tissue pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueReport {
    pub tissue: TissueSpec,
    pub rois: Vec<RoiReport>,
}

impl TissueReport {
    fn total(&self, count: fn(&RoiReport) -> usize) -> usize {
        self.rois.iter().map(count).sum()
    }

    pub fn discovered(&self) -> usize {
        self.total(|r| r.discovered)
    }

    pub fn processed(&self) -> usize {
        self.total(|r| r.processed)
    }

    pub fn empty_skipped(&self) -> usize {
        self.total(|r| r.empty_skipped)
    }

    pub fn missing_mask_skipped(&self) -> usize {
        self.total(|r| r.missing_mask_skipped)
    }

    pub fn failed(&self) -> usize {
        self.total(|r| r.failed)
    }

    pub fn tables_written(&self) -> Vec<&PathBuf> {
        self.rois.iter().filter_map(|r| r.table.as_ref()).collect()
    }
}

/// The outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub tissues: Vec<TissueReport>,
    /// The written skip log files.
    pub log_files: Vec<PathBuf>,
    pub skipped: SkipLog,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.tissues.iter().map(|t| t.processed()).sum()
    }

    pub fn empty_skipped(&self) -> usize {
        self.tissues.iter().map(|t| t.empty_skipped()).sum()
    }

    pub fn missing_mask_skipped(&self) -> usize {
        self.tissues.iter().map(|t| t.missing_mask_skipped()).sum()
    }

    pub fn failed(&self) -> usize {
        self.tissues.iter().map(|t| t.failed()).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for t in self.tissues.iter() {
            writeln!(
                f,
                "{}: {} pairs discovered, {} processed, {} empty masks, {} missing masks, {} failed, {} tables written",
                t.tissue,
                t.discovered(),
                t.processed(),
                t.empty_skipped(),
                t.missing_mask_skipped(),
                t.failed(),
                t.tables_written().len()
            )?;
        }
        write!(
            f,
            "total: {} processed, {} empty masks, {} missing masks, {} failed",
            self.processed(),
            self.empty_skipped(),
            self.missing_mask_skipped(),
            self.failed()
        )
    }
}

/// Run one tissue pass: for every ROI index, extract features for all pairs and write the table.
pub fn process_tissue<E>(
    config: &Config,
    manifest: &Manifest,
    tissue: &TissueSpec,
    extractor: &E,
) -> Result<(TissueReport, SkipLog)>
where
    E: FeatureExtractor + ?Sized,
{
    let mut report = TissueReport {
        tissue: tissue.clone(),
        rois: Vec::with_capacity(config.roi_indices.len()),
    };
    let mut skipped = SkipLog::new();

    for &roi in config.roi_indices.iter() {
        info!(
            "Processing {} images for x={} in: {}",
            tissue,
            roi,
            config.input_dir.display()
        );
        let pairs = manifest.pairs(tissue, roi);
        let mut roi_report = RoiReport {
            roi,
            discovered: pairs.len(),
            ..RoiReport::default()
        };
        let mut table = FeatureTable::new();

        for entry in pairs {
            match process_pair(entry, extractor, config.label) {
                PairOutcome::Row(row) => match table.push(row) {
                    Ok(()) => {
                        debug!("Extracted features for {}", entry.mask.display());
                        roi_report.processed += 1;
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", entry.mask.display(), e);
                        roi_report.failed += 1;
                        skipped.failures.push(FailedPair {
                            image: entry.image.clone(),
                            mask: entry.mask.clone(),
                            reason: e.to_string(),
                        });
                    }
                },
                PairOutcome::EmptyMask => {
                    warn!("Empty mask for file: {}, skipping...", entry.mask.display());
                    roi_report.empty_skipped += 1;
                    skipped.empty_masks.push(entry.mask.clone());
                }
                PairOutcome::MaskMissing => {
                    debug!("No mask {} for {}, skipping.", entry.mask.display(), entry.image.display());
                    roi_report.missing_mask_skipped += 1;
                    skipped.missing_masks.push(entry.mask.clone());
                }
                PairOutcome::Failed(reason) => {
                    warn!(
                        "Feature extraction failed for image {} with mask {}: {}",
                        entry.image.display(),
                        entry.mask.display(),
                        reason
                    );
                    roi_report.failed += 1;
                    skipped.failures.push(FailedPair {
                        image: entry.image.clone(),
                        mask: entry.mask.clone(),
                        reason,
                    });
                }
            }
        }

        if table.is_empty() {
            info!("No features found for x={} {}", roi, tissue);
        } else {
            let path = table.write_csv(config.output_dir.join(table_file_name(roi, &tissue.suffix)))?;
            info!(
                "Radiomics features for x={} {} extracted and saved to {}",
                roi,
                tissue,
                path.display()
            );
            roi_report.table = Some(path);
        }
        report.rois.push(roi_report);
    }

    Ok((report, skipped))
}

/// Run all tissue passes and write the skip logs into the output directory.
pub fn run<L, E>(config: &Config, lookup: &L, extractor: &E) -> Result<RunSummary>
where
    L: FileLookup + ?Sized,
    E: FeatureExtractor + ?Sized,
{
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;

    let manifest = Manifest::build(lookup, &config.tissues, &config.roi_indices)?;
    debug!("Discovered {} image/mask pairs.", manifest.num_pairs());

    let mut summary = RunSummary::default();
    for tissue in config.tissues.iter() {
        let (report, skipped) = process_tissue(config, &manifest, tissue, extractor)?;
        summary.tissues.push(report);
        summary.skipped.merge(skipped);
    }

    summary.log_files = summary.skipped.write_to_dir(&config.output_dir)?;
    for path in summary.log_files.iter() {
        info!("Skip log saved to {}", path.display());
    }
    for line in summary.to_string().lines() {
        info!("{}", line);
    }
    Ok(summary)
}

/// [`run`] on the configured input directory with the [`StandardExtractor`].
pub fn run_on_input_dir(config: &Config) -> Result<RunSummary> {
    let lookup = DirLookup::new(&config.input_dir);
    let extractor = StandardExtractor::new(config.extractor.clone());
    run(config, &lookup, &extractor)
}
