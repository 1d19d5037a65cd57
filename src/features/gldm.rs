//! Grey level dependence matrix (GLDM) features.
//!
//! The dependence of a region voxel is one plus the number of its 26 neighbours inside the region that
//! have exactly the same grey level.

use super::sizematrix::{SizeMatrix, NUM_FEATURES};
use super::{insert_sorted, neighbours_26, FeatureVector, GreyLevelGrid};

/// Names of the [`SizeMatrix::features`] values for dependences. Normalized grey level non-uniformity and
/// percentage are not defined for this class.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "SmallDependenceEmphasis",
    "LargeDependenceEmphasis",
    "GrayLevelNonUniformity",
    "",
    "DependenceNonUniformity",
    "DependenceNonUniformityNormalized",
    "",
    "GrayLevelVariance",
    "DependenceVariance",
    "DependenceEntropy",
    "LowGrayLevelEmphasis",
    "HighGrayLevelEmphasis",
    "SmallDependenceLowGrayLevelEmphasis",
    "SmallDependenceHighGrayLevelEmphasis",
    "LargeDependenceLowGrayLevelEmphasis",
    "LargeDependenceHighGrayLevelEmphasis",
];

pub fn dependence_matrix(grid: &GreyLevelGrid) -> SizeMatrix {
    let mut matrix = SizeMatrix::new();
    for ((x, y, z), &rank) in grid.ranks.indexed_iter() {
        if rank == 0 {
            continue;
        }
        let dependent = neighbours_26().filter(|&o| grid.rank_at([x, y, z], o) == rank).count();
        matrix.add(rank, dependent + 1);
    }
    matrix
}

/// Add the `original_gldm_*` features.
pub fn compute(grid: &GreyLevelGrid, features: &mut FeatureVector) {
    let values = dependence_matrix(grid).features(&grid.levels, grid.num_voxels() as f64);
    insert_sorted(features, "gldm", FEATURE_NAMES.iter().cloned().zip(values.iter().cloned()));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::features::Roi;
    use crate::volume::NiftiVolume;
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    fn grid_of(image: Array3<f64>) -> GreyLevelGrid {
        let mask = NiftiVolume::from_array(Array3::ones(image.dim()), [1.0; 3]);
        let image = NiftiVolume::from_array(image, [1.0; 3]);
        GreyLevelGrid::from_roi(&Roi::from_volumes(&image, &mask, 1).unwrap(), 25.0)
    }

    #[test]
    fn dependences_count_equal_neighbours() {
        // Levels along x: 1 1 2
        let grid = grid_of(Array3::from_shape_vec((3, 1, 1), vec![0.0, 10.0, 30.0]).unwrap());
        let m = dependence_matrix(&grid);
        assert_eq!(2.0, m.count(1, 2));
        assert_eq!(1.0, m.count(2, 1));
    }

    #[test]
    fn the_centre_of_a_uniform_cube_depends_on_all_neighbours() {
        let grid = grid_of(Array3::from_elem((3, 3, 3), 5.0));
        let m = dependence_matrix(&grid);
        assert_eq!(1.0, m.count(1, 27));
        // The 8 corners have 7 neighbours each.
        assert_eq!(8.0, m.count(1, 8));
        assert_eq!(27.0, m.total());

        let mut fv = FeatureVector::new();
        compute(&grid, &mut fv);
        assert_eq!(14, fv.len());
        assert!(!fv.contains("original_gldm_"));
        assert_abs_diff_eq!(27.0, fv.number("original_gldm_GrayLevelNonUniformity").unwrap(), epsilon = 1e-9);
    }
}
