//! Feature tables: one row per image/mask pair, written as CSV.

use csv::WriterBuilder;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{RadiomicsError, Result};
use crate::features::{FeatureValue, FeatureVector, DROPPED_DIAGNOSTICS};

pub const IMAGE_COLUMN: &str = "ImageRoot";
pub const MASK_COLUMN: &str = "MaskPath";
pub const LABEL_COLUMN: &str = "Label";

/// File name of the table for one ROI index and tissue suffix, e.g. `GLCM_170_GM.csv`.
pub fn table_file_name(roi: u32, suffix: &str) -> String {
    format!("GLCM_{}_{}.csv", roi, suffix)
}

/// Turn an extracted feature record into a table row: drop the unwanted diagnostics and append the provenance columns.
pub fn feature_row(mut features: FeatureVector, image: &Path, mask: &Path, label: u32) -> FeatureVector {
    features.drop_columns(&DROPPED_DIAGNOSTICS);
    features.insert(IMAGE_COLUMN, image.display().to_string());
    features.insert(MASK_COLUMN, mask.display().to_string());
    features.insert(LABEL_COLUMN, label as f64);
    features
}

/// Rows sharing one column schema. The schema is fixed by the first row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl FeatureTable {
    pub fn new() -> FeatureTable {
        FeatureTable::default()
    }

    /// Append a row. Fails if its column names or their order differ from the table's.
    pub fn push(&mut self, row: FeatureVector) -> Result<()> {
        if self.rows.is_empty() && self.columns.is_empty() {
            self.columns = row.names().map(String::from).collect();
        } else if row.len() != self.columns.len() || !row.names().eq(self.columns.iter().map(|c| c.as_str())) {
            return Err(RadiomicsError::InconsistentSchema(self.columns.len(), row.len()));
        }
        self.rows.push(row.iter().map(|(_, v)| v.clone()).collect());
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the header and all rows as CSV.
    pub fn to_writer<W: Write>(&self, output: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(output);
        wtr.write_record(&self.columns)?;
        for row in self.rows.iter() {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file, replacing any existing file.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::create(&path)?;
        self.to_writer(std::io::BufWriter::new(file))?;
        Ok(path)
    }
}

impl fmt::Display for FeatureTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Feature table with {} rows of {} columns.", self.rows.len(), self.columns.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(contrast: f64) -> FeatureVector {
        let mut fv = FeatureVector::new();
        fv.insert("diagnostics_Versions_roiradiomics", "0.1.0");
        fv.insert(DROPPED_DIAGNOSTICS[0], "(1, 2, 3)");
        fv.insert(DROPPED_DIAGNOSTICS[1], "(1, 2, 3)");
        fv.insert("original_glcm_Contrast", contrast);
        fv
    }

    #[test]
    fn rows_get_provenance_columns_and_lose_the_center_of_mass() {
        let row = feature_row(record(1.5), Path::new("/d/A_croppedT1_170_.nii.gz"), Path::new("/d/Alabel_170_.nii.gz"), 1);
        assert_eq!(
            vec!["diagnostics_Versions_roiradiomics", "original_glcm_Contrast", "ImageRoot", "MaskPath", "Label"],
            row.names().collect::<Vec<_>>()
        );
        assert_eq!(Some(1.0), row.number(LABEL_COLUMN));
    }

    #[test]
    fn the_csv_has_one_line_per_row() {
        let mut table = FeatureTable::new();
        table.push(feature_row(record(1.5), Path::new("a.nii.gz"), Path::new("am.nii.gz"), 1)).unwrap();
        table.push(feature_row(record(f64::NAN), Path::new("b, c.nii.gz"), Path::new("bm.nii.gz"), 1)).unwrap();
        assert_eq!(2, table.num_rows());

        let mut buf: Vec<u8> = Vec::new();
        table.to_writer(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let expected = "diagnostics_Versions_roiradiomics,original_glcm_Contrast,ImageRoot,MaskPath,Label\n\
                        0.1.0,1.5,a.nii.gz,am.nii.gz,1\n\
                        0.1.0,NaN,\"b, c.nii.gz\",bm.nii.gz,1\n";
        assert_eq!(expected, text);
    }

    #[test]
    fn rows_with_another_schema_are_rejected() {
        let mut table = FeatureTable::new();
        table.push(record(1.0)).unwrap();

        let mut other = record(2.0);
        other.insert("original_glcm_Idm", 0.5);
        assert!(table.push(other).is_err());

        let mut reordered = FeatureVector::new();
        reordered.insert("original_glcm_Contrast", 1.0);
        reordered.insert("diagnostics_Versions_roiradiomics", "0.1.0");
        reordered.insert(DROPPED_DIAGNOSTICS[0], "(1, 2, 3)");
        reordered.insert(DROPPED_DIAGNOSTICS[1], "(1, 2, 3)");
        assert!(table.push(reordered).is_err());
        assert_eq!(1, table.num_rows());
    }
}
