//! Post-processing estimators for equally spaced time series.

use thiserror::Error;

/// Default cut-off on the normalized slope of the variance curve.
pub const DEFAULT_SLOPE_THRESHOLD: f64 = 0.025;

/// Minimum number of blocks a transformation must leave.
const MIN_BLOCKS: usize = 10;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum AnalysisError {
    #[error("Series of length {len} is too short for block averaging (need at least {required})")]
    SeriesTooShort { len: usize, required: usize },
    #[error("Series contains non-finite values")]
    NonFinite,
}

/// Result of [`block_average`].
#[derive(Debug, Clone, PartialEq)]
pub struct BlockAverage {
    pub mean: f64,
    /// Index of the block transformation selected as decorrelated.
    pub best_transform: usize,
    /// Block length at the selected transformation times the sampling interval.
    pub correlation_time: f64,
    /// Variance of the mean at the selected transformation.
    pub variance: f64,
    pub block_sizes: Vec<usize>,
    pub variances: Vec<f64>,
    pub errors: Vec<f64>,
}

impl BlockAverage {
    pub fn standard_error(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Estimates the correlation time and the variance of the mean of `series` by repeated
/// block transformations.
///
/// Block lengths double while at least ten blocks remain. The selected transformation
/// is the first one where the normalized slope of the variance curve drops below
/// `threshold`; the last transformation is used when none does.
pub fn block_average(
    series: &[f64],
    threshold: f64,
    time_step: f64,
) -> Result<BlockAverage, AnalysisError> {
    if series.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::NonFinite);
    }
    let upper_limit = series.len() / MIN_BLOCKS;
    let n_transforms = if upper_limit == 0 {
        0
    } else {
        upper_limit.ilog2() as usize
    };
    if n_transforms < 2 {
        return Err(AnalysisError::SeriesTooShort {
            len: series.len(),
            required: 4 * MIN_BLOCKS,
        });
    }

    let mut block_sizes = Vec::with_capacity(n_transforms);
    let mut variances = Vec::with_capacity(n_transforms);
    let mut errors = Vec::with_capacity(n_transforms);

    let mut block_size = 1usize;
    for _ in 0..n_transforms {
        let n_blocks = series.len() / block_size;
        let blocks: Vec<f64> = series[..n_blocks * block_size]
            .chunks_exact(block_size)
            .map(mean)
            .collect();
        let mu = mean(&blocks);
        let var = blocks.iter().map(|b| (b - mu).powi(2)).sum::<f64>() / n_blocks as f64;
        let fourth_moment = blocks.iter().map(|b| (b - mu).powi(4)).sum::<f64>() / n_blocks as f64;
        let dof = (n_blocks - 1) as f64;

        block_sizes.push(block_size);
        variances.push(var / dof);
        errors.push((2.0 * fourth_moment / dof.powi(3)).sqrt());
        block_size *= 2;
    }

    let best_transform = select_transform(&variances, &block_sizes, threshold);

    Ok(BlockAverage {
        mean: mean(series),
        best_transform,
        correlation_time: block_sizes[best_transform] as f64 * time_step,
        variance: variances[best_transform],
        block_sizes,
        variances,
        errors,
    })
}

fn select_transform(variances: &[f64], block_sizes: &[usize], threshold: f64) -> usize {
    let min = variances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = variances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let normalized: Vec<f64> = variances
        .iter()
        .map(|v| if range > 0.0 { (v - min) / range } else { 0.0 })
        .collect();

    let mut slopes: Vec<f64> = normalized
        .windows(2)
        .zip(block_sizes.windows(2))
        .map(|(v, b)| (v[1] - v[0]) / (b[1] - b[0]) as f64)
        .collect();
    let max_abs = slopes.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    if max_abs > 0.0 {
        slopes.iter_mut().for_each(|s| *s /= max_abs);
    }

    slopes
        .iter()
        .position(|&s| s < threshold)
        .unwrap_or(variances.len() - 1)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
