//! Grey level co-occurrence matrix (GLCM) features.
//!
//! One matrix is computed per direction (13 directions in 3D, at the configured distance). Directions
//! in which no pair of region voxels exists are ignored. Features are computed per direction and averaged.

use ndarray::{Array2, Array3};

use std::collections::BTreeMap;

use super::linalg::symmetric_eigenvalues;
use super::{entropy, ExtractorSettings, FeatureVector, GreyLevelGrid, DIRECTIONS_3D};

pub const NUM_FEATURES: usize = 24;

/// Names of the features returned by [`matrix_features`], in that order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "Autocorrelation",
    "ClusterProminence",
    "ClusterShade",
    "ClusterTendency",
    "Contrast",
    "Correlation",
    "DifferenceAverage",
    "DifferenceEntropy",
    "DifferenceVariance",
    "Id",
    "Idm",
    "Idmn",
    "Idn",
    "Imc1",
    "Imc2",
    "InverseVariance",
    "JointAverage",
    "JointEnergy",
    "JointEntropy",
    "MCC",
    "MaximumProbability",
    "SumAverage",
    "SumEntropy",
    "SumSquares",
];

/// Raw co-occurrence counts for one direction over a grid of grey level ranks, indexed by `[rank - 1, rank - 1]`.
pub fn cooccurrence_matrix(grid: &Array3<usize>, num_levels: usize, offset: [i64; 3], symmetric: bool) -> Array2<f64> {
    let (nx, ny, nz) = grid.dim();
    let mut p = Array2::zeros((num_levels, num_levels));
    for ((x, y, z), &i) in grid.indexed_iter() {
        if i == 0 {
            continue;
        }
        let (tx, ty, tz) = (x as i64 + offset[0], y as i64 + offset[1], z as i64 + offset[2]);
        if tx < 0 || ty < 0 || tz < 0 || tx >= nx as i64 || ty >= ny as i64 || tz >= nz as i64 {
            continue;
        }
        let j = grid[[tx as usize, ty as usize, tz as usize]];
        if j == 0 {
            continue;
        }
        p[[i - 1, j - 1]] += 1.0;
    }
    if symmetric {
        let transposed = p.t().to_owned();
        p += &transposed;
    }
    p
}

/// Maximal correlation coefficient: the square root of the second largest eigenvalue of
/// `Q(i, j) = sum_k p(i, k) p(j, k) / (px(i) py(k))`.
///
/// The eigenvalues are taken from the symmetric matrix `Dx^(1/2) Q Dx^(-1/2)`, which has the same spectrum.
/// Rows with `px(i) = 0` only add zero eigenvalues and are left out. 1 for a single grey level.
pub fn maximal_correlation_coefficient(p: &Array2<f64>, px: &[f64], py: &[f64]) -> f64 {
    if px.len() < 2 {
        return 1.0;
    }
    let rows: Vec<usize> = (0..px.len()).filter(|&i| px[i] > 0.0).collect();
    let columns: Vec<usize> = (0..py.len()).filter(|&k| py[k] > 0.0).collect();
    if rows.len() < 2 {
        return 0.0;
    }

    let n = rows.len();
    let mut s = Array2::zeros((n, n));
    for (a, &i) in rows.iter().enumerate() {
        for (b, &j) in rows.iter().enumerate().skip(a) {
            let q: f64 = columns.iter().map(|&k| p[[i, k]] * p[[j, k]] / py[k]).sum();
            let v = q / (px[i] * px[j]).sqrt();
            s[[a, b]] = v;
            s[[b, a]] = v;
        }
    }
    symmetric_eigenvalues(&s)[1].max(0.0).sqrt()
}

/// Compute all features of one normalized co-occurrence matrix. `levels` holds the grey level value of each
/// matrix row, and `num_present` the number of grey levels present in the region.
pub fn matrix_features(p: &Array2<f64>, levels: &[f64], num_present: usize) -> [f64; NUM_FEATURES] {
    let ng = levels.len();
    let eps = f64::EPSILON;

    let px: Vec<f64> = (0..ng).map(|i| p.row(i).sum()).collect();
    let py: Vec<f64> = (0..ng).map(|j| p.column(j).sum()).collect();
    let ux: f64 = (0..ng).map(|i| levels[i] * px[i]).sum();
    let uy: f64 = (0..ng).map(|j| levels[j] * py[j]).sum();
    let sigx = (0..ng).map(|i| (levels[i] - ux).powi(2) * px[i]).sum::<f64>().sqrt();
    let sigy = (0..ng).map(|j| (levels[j] - uy).powi(2) * py[j]).sum::<f64>().sqrt();

    // Keyed by i + j and |i - j|.
    let mut p_sum: BTreeMap<usize, f64> = BTreeMap::new();
    let mut p_diff: BTreeMap<usize, f64> = BTreeMap::new();

    let mut autocorrelation = 0.0;
    let mut cluster_prominence = 0.0;
    let mut cluster_shade = 0.0;
    let mut cluster_tendency = 0.0;
    let mut contrast = 0.0;
    let mut joint_energy = 0.0;
    let mut maximum_probability: f64 = 0.0;
    let mut hxy1 = 0.0;
    let mut hxy2 = 0.0;

    for ((i, j), &pij) in p.indexed_iter() {
        let (gi, gj) = (levels[i], levels[j]);
        let pxpy = px[i] * py[j];
        hxy1 -= pij * (pxpy + eps).log2();
        hxy2 -= pxpy * (pxpy + eps).log2();
        if pij == 0.0 {
            continue;
        }
        let s = gi + gj - ux - uy;
        autocorrelation += pij * gi * gj;
        cluster_prominence += s.powi(4) * pij;
        cluster_shade += s.powi(3) * pij;
        cluster_tendency += s.powi(2) * pij;
        contrast += (gi - gj).powi(2) * pij;
        joint_energy += pij * pij;
        maximum_probability = maximum_probability.max(pij);
        *p_sum.entry((gi + gj) as usize).or_insert(0.0) += pij;
        *p_diff.entry((gi - gj).abs() as usize).or_insert(0.0) += pij;
    }

    let hx = entropy(&px);
    let hy = entropy(&py);
    let hxy = entropy(p.iter());

    let correlation = if sigx * sigy == 0.0 {
        1.0
    } else {
        (autocorrelation - ux * uy) / (sigx * sigy)
    };

    let diffs = || p_diff.iter().map(|(&k, &v)| (k as f64, v));
    let difference_average: f64 = diffs().map(|(k, v)| k * v).sum();
    let difference_variance: f64 = diffs().map(|(k, v)| (k - difference_average).powi(2) * v).sum();
    let n = num_present as f64;
    let id: f64 = diffs().map(|(k, v)| v / (1.0 + k)).sum();
    let idm: f64 = diffs().map(|(k, v)| v / (1.0 + k * k)).sum();
    let idmn: f64 = diffs().map(|(k, v)| v / (1.0 + k * k / (n * n))).sum();
    let idn: f64 = diffs().map(|(k, v)| v / (1.0 + k / n)).sum();
    let inverse_variance: f64 = diffs().filter(|&(k, _)| k > 0.0).map(|(k, v)| v / (k * k)).sum();

    let max_hx_hy = hx.max(hy);
    let imc1 = if max_hx_hy == 0.0 { 0.0 } else { (hxy - hxy1) / max_hx_hy };
    let imc2 = if hxy >= hxy2 {
        0.0
    } else {
        (1.0 - (-2.0 * (hxy2 - hxy)).exp()).sqrt()
    };

    let sum_average: f64 = p_sum.iter().map(|(&k, v)| k as f64 * v).sum();
    let sum_squares: f64 = (0..ng).map(|i| (levels[i] - ux).powi(2) * px[i]).sum();

    [
        autocorrelation,
        cluster_prominence,
        cluster_shade,
        cluster_tendency,
        contrast,
        correlation,
        difference_average,
        entropy(p_diff.values()),
        difference_variance,
        id,
        idm,
        idmn,
        idn,
        imc1,
        imc2,
        inverse_variance,
        ux,
        joint_energy,
        hxy,
        maximal_correlation_coefficient(p, &px, &py),
        maximum_probability,
        sum_average,
        entropy(p_sum.values()),
        sum_squares,
    ]
}

/// Average GLCM features over all directions with at least one voxel pair. `None` if there is no such direction.
///
/// Matrices span the grey levels present in the region only.
pub fn averaged_features(grid: &GreyLevelGrid, settings: &ExtractorSettings) -> Option<[f64; NUM_FEATURES]> {
    let ng = grid.num_levels();
    if ng == 0 {
        return None;
    }

    let d = settings.distance as i64;
    let mut sums = [0.0; NUM_FEATURES];
    let mut num_angles = 0;
    for dir in DIRECTIONS_3D.iter() {
        let mut p = cooccurrence_matrix(&grid.ranks, ng, [dir[0] * d, dir[1] * d, dir[2] * d], settings.symmetric_glcm);
        let total = p.sum();
        if total == 0.0 {
            continue;
        }
        p /= total;
        let values = matrix_features(&p, &grid.levels, ng);
        for (s, v) in sums.iter_mut().zip(values.iter()) {
            *s += v;
        }
        num_angles += 1;
    }

    if num_angles == 0 {
        return None;
    }
    for s in sums.iter_mut() {
        *s /= num_angles as f64;
    }
    Some(sums)
}

/// Add the `original_glcm_*` features. All values are NaN if the region has no neighbouring voxel pair.
pub fn compute(settings: &ExtractorSettings, grid: &GreyLevelGrid, features: &mut FeatureVector) {
    let values = match averaged_features(grid, settings) {
        Some(values) => values,
        None => {
            log::debug!("No co-occurring voxel pairs in region of {} voxels, GLCM features are NaN.", grid.num_voxels());
            [f64::NAN; NUM_FEATURES]
        }
    };
    for (name, value) in FEATURE_NAMES.iter().zip(values.iter()) {
        features.insert(&format!("original_glcm_{}", name), *value);
    }
}
