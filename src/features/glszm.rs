//! Grey level size zone matrix (GLSZM) features. A zone is a 26-connected set of region voxels sharing
//! the same grey level.

use ndarray::Array3;

use std::collections::VecDeque;

use super::sizematrix::{SizeMatrix, NUM_FEATURES};
use super::{insert_sorted, neighbours_26, FeatureVector, GreyLevelGrid};

pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "SmallAreaEmphasis",
    "LargeAreaEmphasis",
    "GrayLevelNonUniformity",
    "GrayLevelNonUniformityNormalized",
    "SizeZoneNonUniformity",
    "SizeZoneNonUniformityNormalized",
    "ZonePercentage",
    "GrayLevelVariance",
    "ZoneVariance",
    "ZoneEntropy",
    "LowGrayLevelZoneEmphasis",
    "HighGrayLevelZoneEmphasis",
    "SmallAreaLowGrayLevelEmphasis",
    "SmallAreaHighGrayLevelEmphasis",
    "LargeAreaLowGrayLevelEmphasis",
    "LargeAreaHighGrayLevelEmphasis",
];

/// Count the zones of each grey level by size.
pub fn size_zone_matrix(grid: &GreyLevelGrid) -> SizeMatrix {
    let mut matrix = SizeMatrix::new();
    let mut visited = Array3::from_elem(grid.ranks.dim(), false);
    let mut queue = VecDeque::new();
    for ((x, y, z), &rank) in grid.ranks.indexed_iter() {
        if rank == 0 || visited[[x, y, z]] {
            continue;
        }
        visited[[x, y, z]] = true;
        queue.push_back([x, y, z]);
        let mut size = 0;
        while let Some(idx) = queue.pop_front() {
            size += 1;
            for offset in neighbours_26() {
                if grid.rank_at(idx, offset) != rank {
                    continue;
                }
                let n = [
                    (idx[0] as i64 + offset[0]) as usize,
                    (idx[1] as i64 + offset[1]) as usize,
                    (idx[2] as i64 + offset[2]) as usize,
                ];
                if !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }
        matrix.add(rank, size);
    }
    matrix
}

/// Add the `original_glszm_*` features.
pub fn compute(grid: &GreyLevelGrid, features: &mut FeatureVector) {
    let values = size_zone_matrix(grid).features(&grid.levels, grid.num_voxels() as f64);
    insert_sorted(features, "glszm", FEATURE_NAMES.iter().cloned().zip(values.iter().cloned()));
}
