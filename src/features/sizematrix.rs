//! Matrices counting grey levels against a size: run lengths (GLRLM), zone sizes (GLSZM) and
//! dependence counts (GLDM). The three classes share their feature formulas.

use std::collections::BTreeMap;

use super::entropy;

/// Number of values returned by [`SizeMatrix::features`].
pub const NUM_FEATURES: usize = 16;

/// Sparse counts of `(grey level rank, size)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeMatrix {
    counts: BTreeMap<(usize, usize), f64>,
}

impl SizeMatrix {
    pub fn new() -> SizeMatrix {
        SizeMatrix::default()
    }

    pub fn add(&mut self, rank: usize, size: usize) {
        *self.counts.entry((rank, size)).or_insert(0.0) += 1.0;
    }

    pub fn count(&self, rank: usize, size: usize) -> f64 {
        self.counts.get(&(rank, size)).cloned().unwrap_or(0.0)
    }

    /// Sum of all counts: the number of runs, zones or voxels.
    pub fn total(&self) -> f64 {
        self.counts.values().sum()
    }

    /// The shared features, in this order:
    ///
    /// small size emphasis, large size emphasis, grey level non-uniformity (plain, normalized),
    /// size non-uniformity (plain, normalized), percentage (total over `num_voxels`), grey level variance,
    /// size variance, entropy, low and high grey level emphasis, then the four small/large size by low/high
    /// grey level emphases.
    ///
    /// `levels[rank - 1]` is the grey level of a rank. All values are NaN for an empty matrix.
    pub fn features(&self, levels: &[f64], num_voxels: f64) -> [f64; NUM_FEATURES] {
        let nz = self.total();
        if nz == 0.0 {
            return [f64::NAN; NUM_FEATURES];
        }

        let mut f = [0.0; NUM_FEATURES];
        let mut level_sums: BTreeMap<usize, f64> = BTreeMap::new();
        let mut size_sums: BTreeMap<usize, f64> = BTreeMap::new();
        let mut mean_level = 0.0;
        let mut mean_size = 0.0;
        for (&(rank, size), &c) in self.counts.iter() {
            let i2 = levels[rank - 1].powi(2);
            let j2 = (size as f64).powi(2);
            f[0] += c / j2;
            f[1] += c * j2;
            f[10] += c / i2;
            f[11] += c * i2;
            f[12] += c / (i2 * j2);
            f[13] += c * i2 / j2;
            f[14] += c * j2 / i2;
            f[15] += c * i2 * j2;
            *level_sums.entry(rank).or_insert(0.0) += c;
            *size_sums.entry(size).or_insert(0.0) += c;
            mean_level += c / nz * levels[rank - 1];
            mean_size += c / nz * size as f64;
        }
        for k in [0, 1, 10, 11, 12, 13, 14, 15].iter() {
            f[*k] /= nz;
        }

        let gln: f64 = level_sums.values().map(|s| s * s).sum();
        let sn: f64 = size_sums.values().map(|s| s * s).sum();
        f[2] = gln / nz;
        f[3] = gln / (nz * nz);
        f[4] = sn / nz;
        f[5] = sn / (nz * nz);
        f[6] = nz / num_voxels;

        let probabilities: Vec<f64> = self.counts.values().map(|c| c / nz).collect();
        for ((&(rank, size), _), p) in self.counts.iter().zip(probabilities.iter()) {
            f[7] += p * (levels[rank - 1] - mean_level).powi(2);
            f[8] += p * (size as f64 - mean_size).powi(2);
        }
        f[9] = entropy(&probabilities);
        f
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn counts_accumulate() {
        let mut m = SizeMatrix::new();
        m.add(1, 2);
        m.add(1, 2);
        m.add(2, 1);
        assert_eq!(2.0, m.count(1, 2));
        assert_eq!(0.0, m.count(2, 2));
        assert_eq!(3.0, m.total());
    }

    #[test]
    fn features_of_a_two_entry_matrix() {
        // One run of length 1 at level 1, one of length 2 at level 2, over 3 voxels.
        let mut m = SizeMatrix::new();
        m.add(1, 1);
        m.add(2, 2);
        let f = m.features(&[1.0, 2.0], 3.0);

        assert_abs_diff_eq!((1.0 + 0.25) / 2.0, f[0], epsilon = 1e-12);
        assert_abs_diff_eq!((1.0 + 4.0) / 2.0, f[1], epsilon = 1e-12);
        assert_abs_diff_eq!(1.0, f[2], epsilon = 1e-12);
        assert_abs_diff_eq!(0.5, f[3], epsilon = 1e-12);
        assert_abs_diff_eq!(1.0, f[4], epsilon = 1e-12);
        assert_abs_diff_eq!(0.5, f[5], epsilon = 1e-12);
        assert_abs_diff_eq!(2.0 / 3.0, f[6], epsilon = 1e-12);
        assert_abs_diff_eq!(0.25, f[7], epsilon = 1e-12);
        assert_abs_diff_eq!(0.25, f[8], epsilon = 1e-12);
        assert_abs_diff_eq!(1.0, f[9], epsilon = 1e-9);
        assert_abs_diff_eq!((1.0 + 0.25) / 2.0, f[10], epsilon = 1e-12);
        assert_abs_diff_eq!((1.0 + 4.0) / 2.0, f[11], epsilon = 1e-12);
        assert_abs_diff_eq!((1.0 + 1.0 / 16.0) / 2.0, f[12], epsilon = 1e-12);
        assert_abs_diff_eq!((1.0 + 1.0) / 2.0, f[13], epsilon = 1e-12);
        assert_abs_diff_eq!((1.0 + 1.0) / 2.0, f[14], epsilon = 1e-12);
        assert_abs_diff_eq!((1.0 + 16.0) / 2.0, f[15], epsilon = 1e-12);
    }

    #[test]
    fn an_empty_matrix_has_no_features() {
        assert!(SizeMatrix::new().features(&[1.0], 1.0).iter().all(|v| v.is_nan()));
    }
}
