//! Grey level run length matrix (GLRLM) features.
//!
//! A run is a maximal line of region voxels with the same grey level along one of the 13 directions.
//! One matrix is computed per direction, and the features are averaged over the directions.

use super::sizematrix::{SizeMatrix, NUM_FEATURES};
use super::{insert_sorted, FeatureVector, GreyLevelGrid, DIRECTIONS_3D};

/// Names of the [`SizeMatrix::features`] values for run lengths.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "ShortRunEmphasis",
    "LongRunEmphasis",
    "GrayLevelNonUniformity",
    "GrayLevelNonUniformityNormalized",
    "RunLengthNonUniformity",
    "RunLengthNonUniformityNormalized",
    "RunPercentage",
    "GrayLevelVariance",
    "RunVariance",
    "RunEntropy",
    "LowGrayLevelRunEmphasis",
    "HighGrayLevelRunEmphasis",
    "ShortRunLowGrayLevelEmphasis",
    "ShortRunHighGrayLevelEmphasis",
    "LongRunLowGrayLevelEmphasis",
    "LongRunHighGrayLevelEmphasis",
];

/// Count the runs along `direction`.
pub fn run_length_matrix(grid: &GreyLevelGrid, direction: [i64; 3]) -> SizeMatrix {
    let backwards = [-direction[0], -direction[1], -direction[2]];
    let mut matrix = SizeMatrix::new();
    for ((x, y, z), &rank) in grid.ranks.indexed_iter() {
        // Only start counting at the first voxel of a run.
        if rank == 0 || grid.rank_at([x, y, z], backwards) == rank {
            continue;
        }
        let mut length: i64 = 1;
        while grid.rank_at([x, y, z], [direction[0] * length, direction[1] * length, direction[2] * length]) == rank {
            length += 1;
        }
        matrix.add(rank, length as usize);
    }
    matrix
}

/// Add the `original_glrlm_*` features.
pub fn compute(grid: &GreyLevelGrid, features: &mut FeatureVector) {
    let num_voxels = grid.num_voxels() as f64;
    let mut sums = [0.0; NUM_FEATURES];
    for direction in DIRECTIONS_3D.iter() {
        let values = run_length_matrix(grid, *direction).features(&grid.levels, num_voxels);
        for (s, v) in sums.iter_mut().zip(values.iter()) {
            *s += v / DIRECTIONS_3D.len() as f64;
        }
    }
    insert_sorted(features, "glrlm", FEATURE_NAMES.iter().cloned().zip(sums.iter().cloned()));
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
    fn runs_are_counted_along_a_direction() {
        // Levels along x: 1 1 2 1
        let grid = grid_of(Array3::from_shape_vec((4, 1, 1), vec![0.0, 10.0, 30.0, 0.0]).unwrap());
        let m = run_length_matrix(&grid, [1, 0, 0]);
        assert_eq!(1.0, m.count(1, 2));
        assert_eq!(1.0, m.count(1, 1));
        assert_eq!(1.0, m.count(2, 1));
        assert_eq!(3.0, m.total());

        // Across x, every voxel is a run of its own.
        let m = run_length_matrix(&grid, [0, 1, 0]);
        assert_eq!(4.0, m.total());
        assert_eq!(3.0, m.count(1, 1));
    }

    #[test]
    fn a_uniform_cube_has_one_run_per_line() {
        let grid = grid_of(Array3::from_elem((3, 3, 3), 5.0));
        let m = run_length_matrix(&grid, [1, 0, 0]);
        assert_eq!(9.0, m.count(1, 3));
        assert_eq!(9.0, m.total());

        let mut fv = FeatureVector::new();
        compute(&grid, &mut fv);
        assert_eq!(16, fv.len());
        assert_abs_diff_eq!(1.0, fv.number("original_glrlm_GrayLevelNonUniformityNormalized").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(0.0, fv.number("original_glrlm_GrayLevelVariance").unwrap(), epsilon = 1e-12);
        assert_eq!("original_glrlm_GrayLevelNonUniformity", fv.names().next().unwrap());
    }

    #[test]
    fn a_single_voxel_is_one_run_in_every_direction() {
        let grid = grid_of(Array3::from_elem((1, 1, 1), 5.0));
        let mut fv = FeatureVector::new();
        compute(&grid, &mut fv);
        assert_abs_diff_eq!(1.0, fv.number("original_glrlm_RunPercentage").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(1.0, fv.number("original_glrlm_ShortRunEmphasis").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(0.0, fv.number("original_glrlm_RunEntropy").unwrap(), epsilon = 1e-9);
    }
}
