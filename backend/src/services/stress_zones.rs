//! Stress zone classification
//!
//! Maps each index cell to a stress category and aggregates zone-level and
//! quadrant-level statistics.

use tracing::debug;

use crate::config::ZoneConfig;
use crate::error::{AppError, AppResult};
use shared::{
    validate_finite_grid, Quadrant, QuadrantStatistics, StressZone, VegetationGrid, ZoneMap,
    ZoneStat, ZoneStatistics, ZoneThresholds,
};

/// Rainfall-adaptive stress zone classifier
#[derive(Debug, Clone)]
pub struct StressZoneClassifier {
    config: ZoneConfig,
}

impl Default for StressZoneClassifier {
    fn default() -> Self {
        Self::new(ZoneConfig::default())
    }
}

impl StressZoneClassifier {
    pub fn new(config: ZoneConfig) -> Self {
        Self { config }
    }

    /// Break points after rain adaptation.
    ///
    /// Heavy recent rain scales every break point down, so fewer cells land
    /// in the stressed categories. The downward direction is intended and
    /// must stay: a wet week is read as recovering, not as stressed.
    pub fn thresholds_for(&self, rainfall_mm: Option<f64>) -> ZoneThresholds {
        match rainfall_mm {
            Some(rain) if rain > self.config.rain_trigger_mm => self.config.thresholds.scaled([
                self.config.rain_critical_factor,
                self.config.rain_high_factor,
                self.config.rain_moderate_factor,
            ]),
            _ => self.config.thresholds,
        }
    }

    /// Classify every cell and aggregate per-category statistics
    pub fn classify(
        &self,
        grid: &VegetationGrid,
        rainfall_mm: Option<f64>,
    ) -> AppResult<(ZoneMap, ZoneStatistics)> {
        validate_finite_grid(grid).map_err(|e| AppError::InvalidGrid(e.to_string()))?;

        let thresholds = self.thresholds_for(rainfall_mm);
        let zones = grid.data.iter().map(|&v| thresholds.classify(v)).collect();
        let zone_map = ZoneMap {
            width: grid.width,
            height: grid.height,
            zones,
        };
        let stats = zone_statistics(grid, &zone_map);

        debug!(
            critical = stats.critical.percentage,
            high = stats.high.percentage,
            moderate = stats.moderate.percentage,
            healthy = stats.healthy.percentage,
            "Classified stress zones"
        );

        Ok((zone_map, stats))
    }

    /// Mean index and share of cells below the unadjusted moderate threshold,
    /// per quadrant. The grid is split at `height / 2` and `width / 2`.
    pub fn quadrant_statistics(&self, grid: &VegetationGrid) -> QuadrantStatistics {
        let mid_row = grid.height / 2;
        let mid_col = grid.width / 2;
        let stressed_below = self.config.thresholds.moderate;

        let mut result = QuadrantStatistics::default();
        for quadrant in Quadrant::ALL {
            let rows = match quadrant {
                Quadrant::NorthWest | Quadrant::NorthEast => 0..mid_row,
                Quadrant::SouthWest | Quadrant::SouthEast => mid_row..grid.height,
            };
            let cols = match quadrant {
                Quadrant::NorthWest | Quadrant::SouthWest => 0..mid_col,
                Quadrant::NorthEast | Quadrant::SouthEast => mid_col..grid.width,
            };

            let mut count = 0usize;
            let mut sum = 0.0;
            let mut stressed = 0usize;
            for row in rows {
                for col in cols.clone() {
                    let value = grid.get(row, col);
                    count += 1;
                    sum += value;
                    if value < stressed_below {
                        stressed += 1;
                    }
                }
            }

            if count > 0 {
                let stat = result.get_mut(quadrant);
                stat.mean_index = sum / count as f64;
                stat.stressed_percentage = stressed as f64 / count as f64 * 100.0;
                stat.cell_count = count;
            }
        }
        result
    }
}

/// Percentage and mean index per category; empty categories report zero
pub fn zone_statistics(grid: &VegetationGrid, zone_map: &ZoneMap) -> ZoneStatistics {
    let total = zone_map.zones.len() as f64;
    let mut stats = ZoneStatistics::default();
    if total == 0.0 {
        return stats;
    }

    for zone in StressZone::ALL {
        let members: Vec<f64> = zone_map
            .zones
            .iter()
            .zip(&grid.data)
            .filter(|(z, _)| **z == zone)
            .map(|(_, &v)| v)
            .collect();
        let mean_index = if members.is_empty() {
            0.0
        } else {
            members.iter().sum::<f64>() / members.len() as f64
        };
        *stats.get_mut(zone) = ZoneStat {
            percentage: members.len() as f64 / total * 100.0,
            mean_index,
        };
    }
    stats
}
