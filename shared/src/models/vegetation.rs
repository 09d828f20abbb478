//! Raster and vegetation index models

use serde::{Deserialize, Serialize};

/// A rectangular raster of `f64` values stored row-major.
///
/// Used for both reflectance bands and the derived vegetation index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    /// Row-major cell values, `width * height` long
    pub data: Vec<f64>,
}

/// A red or near-infrared reflectance band
pub type BandGrid = Grid;

/// A vegetation index raster with values in [-1, 1]
pub type VegetationGrid = Grid;

impl Grid {
    /// Build a grid from row-major data.
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self, &'static str> {
        if width == 0 || height == 0 {
            return Err("Grid must have at least one row and one column");
        }
        if data.len() != width * height {
            return Err("Grid data length does not match its dimensions");
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Grid of the given shape with every cell set to `value`
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a grid from nested rows; rows must all have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, &'static str> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != width) {
            return Err("Grid rows must all have the same length");
        }
        Self::new(width, height, rows.concat())
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.width + col] = value;
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// Descriptive statistics of a vegetation index raster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
}

impl IndexStatistics {
    /// Field health score on a 0-100 scale derived from the mean index
    pub fn health_score(&self) -> f64 {
        health_score(self.mean)
    }
}

/// `(nir - red) / (nir + red)` for one cell, clipped to [-1, 1].
///
/// An exactly zero denominator is replaced by 1.
pub fn index_value(red: f64, nir: f64) -> f64 {
    let denominator = nir + red;
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    ((nir - red) / denominator).clamp(-1.0, 1.0)
}

/// Map a mean vegetation index in [-1, 1] onto a 0-100 health score
pub fn health_score(mean_index: f64) -> f64 {
    ((mean_index + 1.0) * 50.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_value_guards_zero_denominator() {
        assert!((index_value(0.1, 0.5) - 0.4 / 0.6).abs() < 1e-12);
        assert_eq!(index_value(0.0, 0.0), 0.0);
        assert_eq!(index_value(0.5, 0.0), -1.0);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![vec![0.1, 0.2], vec![0.3]];
        assert!(Grid::from_rows(&rows).is_err());
    }

    #[test]
    fn from_rows_is_row_major() {
        let grid = Grid::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.get(1, 0), 4.0);
        assert_eq!(grid.get(0, 2), 3.0);
    }

    #[test]
    fn new_rejects_empty_grid() {
        assert!(Grid::new(0, 0, vec![]).is_err());
    }

    #[test]
    fn health_score_scales_linearly() {
        approx::assert_relative_eq!(health_score(0.7), 85.0, epsilon = 1e-9);
        approx::assert_relative_eq!(health_score(-0.4), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn health_score_is_clamped() {
        assert_eq!(health_score(-1.5), 0.0);
        assert_eq!(health_score(0.0), 50.0);
        assert_eq!(health_score(1.2), 100.0);
    }
}
