//! Water deficit models

use serde::{Deserialize, Serialize};

/// Severity of the weekly water shortfall
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeficitSeverity {
    Low,
    Moderate,
    High,
}

pub const DEFAULT_HIGH_DEFICIT_MM: f64 = 40.0;
pub const DEFAULT_MODERATE_DEFICIT_MM: f64 = 25.0;

/// Hargreaves coefficient, temperature offset and radiation term
pub const HARGREAVES_DEFAULTS: (f64, f64, f64) = (0.0023, 17.8, 5.0);

/// Daily reference evapotranspiration (mm) with the default Hargreaves terms;
/// non-positive temperatures give 0
pub fn reference_et0(temperature_c: f64) -> f64 {
    if temperature_c.is_nan() || temperature_c <= 0.0 {
        return 0.0;
    }
    let (coefficient, offset, radiation) = HARGREAVES_DEFAULTS;
    (coefficient * (temperature_c + offset) * temperature_c.sqrt() * radiation).max(0.0)
}

impl DeficitSeverity {
    /// Label a deficit; both bounds are inclusive (25 mm is Moderate, 40 mm is High)
    pub fn from_deficit(deficit_mm: f64, moderate_mm: f64, high_mm: f64) -> Self {
        if deficit_mm >= high_mm {
            DeficitSeverity::High
        } else if deficit_mm >= moderate_mm {
            DeficitSeverity::Moderate
        } else {
            DeficitSeverity::Low
        }
    }
}

impl std::fmt::Display for DeficitSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeficitSeverity::Low => write!(f, "Low"),
            DeficitSeverity::Moderate => write!(f, "Moderate"),
            DeficitSeverity::High => write!(f, "High"),
        }
    }
}

/// Weekly water deficit for a field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterDeficitAssessment {
    /// Stress-adjusted weekly deficit in mm, rounded to 0.1
    pub deficit_mm: f64,
    pub severity: DeficitSeverity,
    /// Weekly reference evapotranspiration in mm, rounded to 0.1
    pub et0_weekly_mm: f64,
    /// Rainfall credited against the deficit in mm, rounded to 0.1
    pub rainfall_mm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_et0_at_thirty_degrees() {
        assert!((reference_et0(30.0) - 3.0108).abs() < 1e-3);
        assert_eq!(reference_et0(0.0), 0.0);
        assert_eq!(reference_et0(-5.0), 0.0);
    }

    #[test]
    fn severity_boundaries_are_inclusive() {
        let label = |d| DeficitSeverity::from_deficit(d, 25.0, 40.0);
        assert_eq!(label(24.9), DeficitSeverity::Low);
        assert_eq!(label(25.0), DeficitSeverity::Moderate);
        assert_eq!(label(39.9), DeficitSeverity::Moderate);
        assert_eq!(label(40.0), DeficitSeverity::High);
    }
}
