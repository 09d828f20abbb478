//! Vegetation index engine
//!
//! Derives the normalized difference vegetation index from red and
//! near-infrared reflectance, smooths it, and summarises the result.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{AppError, AppResult};
use shared::{
    index_value, validate_band_shapes, validate_finite_grid, BandGrid, IndexSource,
    IndexStatistics, VegetationGrid,
};

/// Gaussian kernel standard deviation in cells
pub const SMOOTHING_SIGMA: f64 = 1.0;

/// Kernel half-width in standard deviations
pub const SMOOTHING_TRUNCATE: f64 = 4.0;

/// Compute `(nir - red) / (nir + red)` per cell, clipped to [-1, 1].
///
/// Cells whose denominator is exactly zero are divided by 1 instead.
pub fn compute_index(red: &BandGrid, nir: &BandGrid) -> AppResult<VegetationGrid> {
    validate_band_shapes(red, nir).map_err(|_| AppError::ShapeMismatch {
        red: red.shape(),
        nir: nir.shape(),
    })?;
    validate_finite_grid(red).map_err(|e| AppError::InvalidGrid(format!("red band: {}", e)))?;
    validate_finite_grid(nir).map_err(|e| AppError::InvalidGrid(format!("nir band: {}", e)))?;

    let data = red
        .data
        .iter()
        .zip(&nir.data)
        .map(|(&r, &n)| index_value(r, n))
        .collect();

    debug!(width = red.width, height = red.height, "Computed vegetation index");

    Ok(VegetationGrid {
        width: red.width,
        height: red.height,
        data,
    })
}

/// Normalized 1-D Gaussian kernel of radius `round(truncate * sigma)`
fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as i64;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Map an out-of-range index onto `[0, n)` by half-sample symmetric reflection
/// (`d c b a | a b c d | d c b a`).
#[inline]
fn reflect(index: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = index.rem_euclid(period);
    (if m < n { m } else { period - m - 1 }) as usize
}

/// Isotropic Gaussian blur (sigma 1, truncated at 4 sigma, reflected edges).
///
/// Applied separably along rows then columns; the shape is preserved.
pub fn smooth(grid: &VegetationGrid) -> VegetationGrid {
    let kernel = gaussian_kernel(SMOOTHING_SIGMA, SMOOTHING_TRUNCATE);
    let radius = (kernel.len() / 2) as i64;
    let (width, height) = (grid.width, grid.height);

    let mut horizontal = vec![0.0; grid.data.len()];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            for (col, cell) in out.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let c = reflect(col as i64 + k as i64 - radius, width);
                        w * grid.data[row * width + c]
                    })
                    .sum();
            }
        });

    let mut smoothed = vec![0.0; grid.data.len()];
    smoothed
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            for (col, cell) in out.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let r = reflect(row as i64 + k as i64 - radius, height);
                        w * horizontal[r * width + col]
                    })
                    .sum();
            }
        });

    VegetationGrid {
        width,
        height,
        data: smoothed,
    }
}

/// Linear-interpolated percentile of pre-sorted values, `q` in [0, 1]
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Summary statistics with population standard deviation
pub fn statistics(grid: &VegetationGrid) -> AppResult<IndexStatistics> {
    validate_finite_grid(grid).map_err(|e| AppError::InvalidGrid(e.to_string()))?;

    let n = grid.data.len() as f64;
    let mean = grid.data.iter().sum::<f64>() / n;
    let variance = grid.data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = grid.data.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Ok(IndexStatistics {
        mean,
        median: percentile(&sorted, 0.5),
        std: variance.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p25: percentile(&sorted, 0.25),
        p75: percentile(&sorted, 0.75),
    })
}

/// Resolve the request's index source into a smoothed index raster.
///
/// Precomputed rasters must already lie in [-1, 1]; they are smoothed like
/// band-derived ones.
pub fn index_from_source(source: &IndexSource) -> AppResult<VegetationGrid> {
    let raw = match source {
        IndexSource::Bands { red, nir } => compute_index(red, nir)?,
        IndexSource::Precomputed { index } => {
            shared::validate_index_range(index).map_err(|e| AppError::InvalidGrid(e.to_string()))?;
            index.clone()
        }
    };
    Ok(smooth(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_with_radius_four() {
        let kernel = gaussian_kernel(1.0, 4.0);
        assert_eq!(kernel.len(), 9);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(kernel[4] > kernel[3]);
    }

    #[test]
    fn reflect_mirrors_at_the_edges() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(3, 1), 0);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 0.5) - 2.5).abs() < 1e-12);
    }
}
