//! First order statistics of the intensities inside the region of interest.

use ndarray::Array1;
use ndarray_stats::interpolate::Linear;
use ndarray_stats::{Quantile1dExt, QuantileExt, SummaryStatisticsExt};
use noisy_float::types::{n64, N64};

use std::collections::BTreeMap;

use super::{discretize, entropy, ExtractorSettings, FeatureVector, Roi};
use crate::volume::NiftiVolume;

/// Percentile `q` (0 to 100) with linear interpolation between the closest ranks.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut data: Array1<N64> = values.iter().map(|&v| n64(v)).collect();
    data.quantile_mut(n64(q / 100.0), &Linear)
        .map(|v| v.raw())
        .unwrap_or(f64::NAN)
}

/// Probability of each grey level, in grey level order.
fn grey_level_probabilities(levels: &[usize]) -> Vec<f64> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &l in levels {
        *counts.entry(l).or_insert(0) += 1;
    }
    let n = levels.len() as f64;
    counts.values().map(|&c| c as f64 / n).collect()
}

fn mean_absolute_deviation(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).abs()).sum::<f64>() / n
}

/// Add the `original_firstorder_*` features.
pub fn compute(settings: &ExtractorSettings, image: &NiftiVolume, roi: &Roi, features: &mut FeatureVector) {
    let x: Array1<f64> = Array1::from(roi.values.clone());
    let n = x.len() as f64;

    let energy = x.iter().map(|v| v * v).sum::<f64>();
    let voxel_volume: f64 = image.spacing().iter().product();

    let minimum = x.min().map(|v| *v).unwrap_or(f64::NAN);
    let maximum = x.max().map(|v| *v).unwrap_or(f64::NAN);
    let p10 = percentile(&roi.values, 10.0);
    let p25 = percentile(&roi.values, 25.0);
    let p75 = percentile(&roi.values, 75.0);
    let p90 = percentile(&roi.values, 90.0);

    let m2 = x.central_moment(2).unwrap_or(f64::NAN);
    let m3 = x.central_moment(3).unwrap_or(f64::NAN);
    let m4 = x.central_moment(4).unwrap_or(f64::NAN);
    let (skewness, kurtosis) = if m2 == 0.0 {
        (0.0, 0.0)
    } else {
        (m3 / m2.powf(1.5), m4 / (m2 * m2))
    };

    let robust: Vec<f64> = roi
        .values
        .iter()
        .cloned()
        .filter(|v| *v >= p10 && *v <= p90)
        .collect();

    let probabilities = grey_level_probabilities(&discretize(&roi.values, settings.bin_width));

    features.insert("original_firstorder_10Percentile", p10);
    features.insert("original_firstorder_90Percentile", p90);
    features.insert("original_firstorder_Energy", energy);
    features.insert("original_firstorder_Entropy", entropy(&probabilities));
    features.insert("original_firstorder_InterquartileRange", p75 - p25);
    features.insert("original_firstorder_Kurtosis", kurtosis);
    features.insert("original_firstorder_Maximum", maximum);
    features.insert("original_firstorder_MeanAbsoluteDeviation", mean_absolute_deviation(&roi.values));
    features.insert("original_firstorder_Mean", x.mean().unwrap_or(f64::NAN));
    features.insert("original_firstorder_Median", percentile(&roi.values, 50.0));
    features.insert("original_firstorder_Minimum", minimum);
    features.insert("original_firstorder_Range", maximum - minimum);
    features.insert(
        "original_firstorder_RobustMeanAbsoluteDeviation",
        mean_absolute_deviation(&robust),
    );
    features.insert("original_firstorder_RootMeanSquared", (energy / n).sqrt());
    features.insert("original_firstorder_Skewness", skewness);
    features.insert("original_firstorder_TotalEnergy", voxel_volume * energy);
    features.insert(
        "original_firstorder_Uniformity",
        probabilities.iter().map(|p| p * p).sum::<f64>(),
    );
    features.insert("original_firstorder_Variance", m2);
}
