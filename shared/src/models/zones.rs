//! Water stress zone models

use serde::{Deserialize, Serialize};

use crate::types::Quadrant;

/// Ordinal stress category, worst first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StressZone {
    Critical,
    High,
    Moderate,
    Healthy,
}

impl StressZone {
    pub const ALL: [StressZone; 4] = [
        StressZone::Critical,
        StressZone::High,
        StressZone::Moderate,
        StressZone::Healthy,
    ];

    /// Integer code used in zone rasters (0 = critical .. 3 = healthy)
    pub fn code(&self) -> u8 {
        match self {
            StressZone::Critical => 0,
            StressZone::High => 1,
            StressZone::Moderate => 2,
            StressZone::Healthy => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StressZone::Critical => "Critical",
            StressZone::High => "High",
            StressZone::Moderate => "Moderate",
            StressZone::Healthy => "Healthy",
        }
    }

    /// Display colour used by map renderers
    pub fn color(&self) -> &'static str {
        match self {
            StressZone::Critical => "red",
            StressZone::High => "orange",
            StressZone::Moderate => "yellow",
            StressZone::Healthy => "green",
        }
    }
}

impl std::fmt::Display for StressZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Break points between the four stress categories.
///
/// Values below `critical` are critical, below `high` are high stress,
/// below `moderate` are moderate, everything else is healthy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneThresholds {
    pub critical: f64,
    pub high: f64,
    pub moderate: f64,
}

pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.3;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MODERATE_THRESHOLD: f64 = 0.6;

/// Recent rainfall (mm) above which the break points are relaxed.
///
/// Relaxing (scaling down) is the intended direction; do not invert it.
pub const DEFAULT_RAIN_TRIGGER_MM: f64 = 20.0;

/// Critical, high and moderate scale factors applied after heavy rain
pub const DEFAULT_RAIN_FACTORS: [f64; 3] = [0.8, 0.85, 0.9];

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            critical: DEFAULT_CRITICAL_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
            moderate: DEFAULT_MODERATE_THRESHOLD,
        }
    }
}

impl ZoneThresholds {
    /// Multiply each break point by its own factor
    pub fn scaled(&self, factors: [f64; 3]) -> Self {
        Self {
            critical: self.critical * factors[0],
            high: self.high * factors[1],
            moderate: self.moderate * factors[2],
        }
    }

    /// Break points for the given recent rainfall using the default adaptation
    pub fn for_rainfall(&self, rainfall_mm: f64) -> Self {
        if rainfall_mm > DEFAULT_RAIN_TRIGGER_MM {
            self.scaled(DEFAULT_RAIN_FACTORS)
        } else {
            *self
        }
    }

    /// Classify a single vegetation index value
    pub fn classify(&self, value: f64) -> StressZone {
        if value < self.critical {
            StressZone::Critical
        } else if value < self.high {
            StressZone::High
        } else if value < self.moderate {
            StressZone::Moderate
        } else {
            StressZone::Healthy
        }
    }
}

/// Per-cell stress categories, same shape as the index raster it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMap {
    pub width: usize,
    pub height: usize,
    pub zones: Vec<StressZone>,
}

impl ZoneMap {
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> StressZone {
        self.zones[row * self.width + col]
    }

    pub fn count(&self, zone: StressZone) -> usize {
        self.zones.iter().filter(|&&z| z == zone).count()
    }
}

/// Share of the field and mean index for one stress category
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneStat {
    /// Percentage of cells in this category (0-100)
    pub percentage: f64,
    /// Mean vegetation index over member cells; 0 when the category is empty
    pub mean_index: f64,
}

/// Zone-level aggregates for the whole field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneStatistics {
    pub critical: ZoneStat,
    pub high: ZoneStat,
    pub moderate: ZoneStat,
    pub healthy: ZoneStat,
}

impl ZoneStatistics {
    /// Build statistics directly from percentages (mean index left at 0)
    pub fn from_percentages(critical: f64, high: f64, moderate: f64, healthy: f64) -> Self {
        let stat = |percentage| ZoneStat {
            percentage,
            mean_index: 0.0,
        };
        Self {
            critical: stat(critical),
            high: stat(high),
            moderate: stat(moderate),
            healthy: stat(healthy),
        }
    }

    pub fn get(&self, zone: StressZone) -> &ZoneStat {
        match zone {
            StressZone::Critical => &self.critical,
            StressZone::High => &self.high,
            StressZone::Moderate => &self.moderate,
            StressZone::Healthy => &self.healthy,
        }
    }

    pub fn get_mut(&mut self, zone: StressZone) -> &mut ZoneStat {
        match zone {
            StressZone::Critical => &mut self.critical,
            StressZone::High => &mut self.high,
            StressZone::Moderate => &mut self.moderate,
            StressZone::Healthy => &mut self.healthy,
        }
    }

    pub fn percentage(&self, zone: StressZone) -> f64 {
        self.get(zone).percentage
    }

    /// Area fraction in [0, 1]
    pub fn fraction(&self, zone: StressZone) -> f64 {
        self.percentage(zone) / 100.0
    }

    pub fn total_percentage(&self) -> f64 {
        StressZone::ALL.iter().map(|&z| self.percentage(z)).sum()
    }

    /// Area-weighted average of one value per category
    pub fn weighted(&self, weights: &ZoneWeights) -> f64 {
        StressZone::ALL
            .iter()
            .map(|&z| self.fraction(z) * weights.get(z))
            .sum()
    }
}

/// One numeric weight per stress category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneWeights {
    pub critical: f64,
    pub high: f64,
    pub moderate: f64,
    pub healthy: f64,
}

impl ZoneWeights {
    pub fn get(&self, zone: StressZone) -> f64 {
        match zone {
            StressZone::Critical => self.critical,
            StressZone::High => self.high,
            StressZone::Moderate => self.moderate,
            StressZone::Healthy => self.healthy,
        }
    }
}

/// Mean index and stressed share for one quadrant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuadrantStat {
    pub mean_index: f64,
    /// Percentage of cells below the moderate threshold
    pub stressed_percentage: f64,
    /// Cells covered; zero for the empty halves of a single-row or single-column grid
    #[serde(default)]
    pub cell_count: usize,
}

/// Quadrant analysis used to detect spatially uneven stress
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuadrantStatistics {
    #[serde(rename = "NW")]
    pub nw: QuadrantStat,
    #[serde(rename = "NE")]
    pub ne: QuadrantStat,
    #[serde(rename = "SW")]
    pub sw: QuadrantStat,
    #[serde(rename = "SE")]
    pub se: QuadrantStat,
}

impl QuadrantStatistics {
    pub fn get(&self, quadrant: Quadrant) -> &QuadrantStat {
        match quadrant {
            Quadrant::NorthWest => &self.nw,
            Quadrant::NorthEast => &self.ne,
            Quadrant::SouthWest => &self.sw,
            Quadrant::SouthEast => &self.se,
        }
    }

    pub fn get_mut(&mut self, quadrant: Quadrant) -> &mut QuadrantStat {
        match quadrant {
            Quadrant::NorthWest => &mut self.nw,
            Quadrant::NorthEast => &mut self.ne,
            Quadrant::SouthWest => &mut self.sw,
            Quadrant::SouthEast => &mut self.se,
        }
    }

    /// Population variance of the stressed percentages of non-empty quadrants
    pub fn stressed_variance(&self) -> f64 {
        let values: Vec<f64> = Quadrant::ALL
            .iter()
            .map(|&q| self.get(q))
            .filter(|stat| stat.cell_count > 0)
            .map(|stat| stat.stressed_percentage)
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }
}
