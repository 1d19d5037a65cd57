//! Neighbouring grey tone difference matrix (NGTDM) features.
//!
//! For each grey level `i`, `s_i` sums the absolute difference between `i` and the mean grey level of the
//! 26-neighbourhood (region voxels only) over all voxels of level `i`. Voxels without any region
//! neighbour are left out.

use super::{insert_sorted, neighbours_26, FeatureVector, GreyLevelGrid};

/// Coarseness reported for a region without any grey tone difference.
pub const MAX_COARSENESS: f64 = 1.0e6;

/// Per grey level rank: the number of voxels with at least one neighbour, and their summed differences.
#[derive(Debug, Clone, PartialEq)]
pub struct Ngtdm {
    pub counts: Vec<f64>,
    pub differences: Vec<f64>,
}

impl Ngtdm {
    pub fn from_grid(grid: &GreyLevelGrid) -> Ngtdm {
        let ng = grid.num_levels();
        let mut counts = vec![0.0; ng];
        let mut differences = vec![0.0; ng];
        for ((x, y, z), &rank) in grid.ranks.indexed_iter() {
            if rank == 0 {
                continue;
            }
            let (sum, n) = neighbours_26()
                .map(|o| grid.rank_at([x, y, z], o))
                .filter(|&r| r > 0)
                .fold((0.0, 0usize), |(sum, n), r| (sum + grid.levels[r - 1], n + 1));
            if n == 0 {
                continue;
            }
            counts[rank - 1] += 1.0;
            differences[rank - 1] += (grid.levels[rank - 1] - sum / n as f64).abs();
        }
        Ngtdm { counts, differences }
    }

    /// Busyness, coarseness, complexity, contrast and strength. NaN if no voxel has a neighbour.
    pub fn features(&self, levels: &[f64]) -> [f64; 5] {
        let nvp: f64 = self.counts.iter().sum();
        if nvp == 0.0 {
            return [f64::NAN; 5];
        }
        // (grey level, probability, difference) of the levels that occur.
        let present: Vec<(f64, f64, f64)> = levels
            .iter()
            .zip(self.counts.iter().zip(self.differences.iter()))
            .filter(|(_, (n, _))| **n > 0.0)
            .map(|(&i, (&n, &s))| (i, n / nvp, s))
            .collect();
        let ngp = present.len() as f64;
        let sum_s: f64 = present.iter().map(|&(_, _, s)| s).sum();
        let sum_ps: f64 = present.iter().map(|&(_, p, s)| p * s).sum();

        let mut weighted_contrast = 0.0;
        let mut busyness_denominator = 0.0;
        let mut complexity = 0.0;
        let mut strength = 0.0;
        for &(i, pi, si) in present.iter() {
            for &(j, pj, sj) in present.iter() {
                let d2 = (i - j).powi(2);
                weighted_contrast += pi * pj * d2;
                busyness_denominator += (i * pi - j * pj).abs();
                complexity += (i - j).abs() * (pi * si + pj * sj) / (pi + pj);
                strength += (pi + pj) * d2;
            }
        }

        let busyness = if busyness_denominator == 0.0 { 0.0 } else { sum_ps / busyness_denominator };
        let coarseness = if sum_ps == 0.0 { MAX_COARSENESS } else { 1.0 / sum_ps };
        let contrast = if ngp > 1.0 {
            weighted_contrast / (ngp * (ngp - 1.0)) * sum_s / nvp
        } else {
            0.0
        };
        let strength = if sum_s == 0.0 { 0.0 } else { strength / sum_s };
        [busyness, coarseness, complexity / nvp, contrast, strength]
    }
}

/// Add the `original_ngtdm_*` features.
pub fn compute(grid: &GreyLevelGrid, features: &mut FeatureVector) {
    let values = Ngtdm::from_grid(grid).features(&grid.levels);
    let names = ["Busyness", "Coarseness", "Complexity", "Contrast", "Strength"];
    insert_sorted(features, "ngtdm", names.iter().cloned().zip(values.iter().cloned()));
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
    fn differences_to_the_neighbourhood_mean() {
        // Levels along x: 1 2
        let grid = grid_of(Array3::from_shape_vec((2, 1, 1), vec![0.0, 30.0]).unwrap());
        let m = Ngtdm::from_grid(&grid);
        assert_eq!(vec![1.0, 1.0], m.counts);
        assert_eq!(vec![1.0, 1.0], m.differences);

        let f = m.features(&grid.levels);
        // sum p*s = 1 over |1*0.5 - 2*0.5|, counted twice
        assert_abs_diff_eq!(1.0, f[0], epsilon = 1e-12);
        assert_abs_diff_eq!(1.0, f[1], epsilon = 1e-12);
        // |1 - 2| * (0.5 + 0.5) / 1, counted twice, over 2 voxels
        assert_abs_diff_eq!(1.0, f[2], epsilon = 1e-12);
        // (2 * 0.25) / (2 * 1) * (2 / 2)
        assert_abs_diff_eq!(0.25, f[3], epsilon = 1e-12);
        // 2 * (1 * 1) / 2
        assert_abs_diff_eq!(1.0, f[4], epsilon = 1e-12);
    }

    #[test]
    fn a_uniform_region_is_maximally_coarse() {
        let grid = grid_of(Array3::from_elem((2, 2, 2), 5.0));
        let mut fv = FeatureVector::new();
        compute(&grid, &mut fv);
        assert_eq!(
            vec![
                "original_ngtdm_Busyness",
                "original_ngtdm_Coarseness",
                "original_ngtdm_Complexity",
                "original_ngtdm_Contrast",
                "original_ngtdm_Strength"
            ],
            fv.names().collect::<Vec<_>>()
        );
        assert_eq!(Some(MAX_COARSENESS), fv.number("original_ngtdm_Coarseness"));
        assert_eq!(Some(0.0), fv.number("original_ngtdm_Contrast"));
        assert_eq!(Some(0.0), fv.number("original_ngtdm_Busyness"));
    }

    #[test]
    fn a_single_voxel_has_no_neighbourhood() {
        let grid = grid_of(Array3::from_elem((1, 1, 1), 5.0));
        assert!(Ngtdm::from_grid(&grid).features(&grid.levels).iter().all(|v| v.is_nan()));
    }
}
