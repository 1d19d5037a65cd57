//! Diagnostic fields describing the extraction settings, the image and the mask.

use ndarray::Array3;

use std::collections::VecDeque;
use std::fmt::Display;

use super::{ExtractorSettings, FeatureVector, Roi};
use crate::volume::NiftiVolume;

/// Render values as a parenthesized, comma separated tuple, e.g. `(1, 2, 3)`.
pub fn tuple_text<T: Display>(values: &[T]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Number of 26-connected components of the region.
pub fn count_components(roi: &Roi) -> usize {
    let size = roi.bbox_size();
    let mut inside = Array3::from_elem((size[0], size[1], size[2]), false);
    for idx in roi.indices.iter() {
        inside[[
            idx[0] - roi.bbox_min[0],
            idx[1] - roi.bbox_min[1],
            idx[2] - roi.bbox_min[2],
        ]] = true;
    }

    let mut components = 0;
    let mut queue = VecDeque::new();
    for start in roi.indices.iter() {
        let start = [
            start[0] - roi.bbox_min[0],
            start[1] - roi.bbox_min[1],
            start[2] - roi.bbox_min[2],
        ];
        if !inside[start] {
            continue;
        }
        components += 1;
        inside[start] = false;
        queue.push_back(start);
        while let Some([x, y, z]) = queue.pop_front() {
            for dx in -1i64..=1 {
                for dy in -1i64..=1 {
                    for dz in -1i64..=1 {
                        let n = [x as i64 + dx, y as i64 + dy, z as i64 + dz];
                        if (0..3).any(|a| n[a] < 0 || n[a] >= size[a] as i64) {
                            continue;
                        }
                        let n = [n[0] as usize, n[1] as usize, n[2] as usize];
                        if inside[n] {
                            inside[n] = false;
                            queue.push_back(n);
                        }
                    }
                }
            }
        }
    }
    components
}

/// Add the `diagnostics_*` fields.
pub fn compute(
    settings: &ExtractorSettings,
    image: &NiftiVolume,
    mask: &NiftiVolume,
    label: u32,
    roi: &Roi,
    features: &mut FeatureVector,
) {
    let (nx, ny, nz) = image.dim();
    let (mx, my, mz) = mask.dim();

    features.insert("diagnostics_Versions_roiradiomics", env!("CARGO_PKG_VERSION"));
    features.insert(
        "diagnostics_Configuration_Settings",
        format!(
            "binWidth={}; distance={}; label={}; symmetricalGLCM={}",
            settings.bin_width, settings.distance, label, settings.symmetric_glcm
        ),
    );
    features.insert("diagnostics_Configuration_EnabledImageTypes", "original");

    features.insert(
        "diagnostics_Image-original_Dimensionality",
        format!("{}D", image.dimensionality()),
    );
    features.insert("diagnostics_Image-original_Spacing", tuple_text(&image.spacing()));
    features.insert("diagnostics_Image-original_Size", tuple_text(&[nx, ny, nz]));
    features.insert(
        "diagnostics_Image-original_Mean",
        image.data.mean().unwrap_or(f64::NAN),
    );
    features.insert(
        "diagnostics_Image-original_Minimum",
        image.data.iter().cloned().fold(f64::INFINITY, f64::min),
    );
    features.insert(
        "diagnostics_Image-original_Maximum",
        image.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );

    let bbox_size = roi.bbox_size();
    features.insert("diagnostics_Mask-original_Spacing", tuple_text(&mask.spacing()));
    features.insert("diagnostics_Mask-original_Size", tuple_text(&[mx, my, mz]));
    features.insert(
        "diagnostics_Mask-original_BoundingBox",
        tuple_text(&[
            roi.bbox_min[0],
            roi.bbox_min[1],
            roi.bbox_min[2],
            bbox_size[0],
            bbox_size[1],
            bbox_size[2],
        ]),
    );
    features.insert("diagnostics_Mask-original_VoxelNum", roi.len());
    features.insert("diagnostics_Mask-original_VolumeNum", count_components(roi));

    let n = roi.len() as f64;
    let mut com = [0.0; 3];
    for idx in roi.indices.iter() {
        for axis in 0..3 {
            com[axis] += idx[axis] as f64 / n;
        }
    }
    features.insert("diagnostics_Mask-original_CenterOfMassIndex", tuple_text(&com));
    features.insert(
        "diagnostics_Mask-original_CenterOfMass",
        tuple_text(&mask.voxel_to_world(com)),
    );
}
