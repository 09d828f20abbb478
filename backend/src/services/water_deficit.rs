//! Water deficit estimation
//!
//! Weekly crop water shortfall from a Hargreaves-style evapotranspiration
//! estimate, rainfall, and the stress picture of the field.

use tracing::debug;

use crate::config::DeficitConfig;
use shared::{round_to, DeficitSeverity, WaterDeficitAssessment, ZoneStatistics};

#[derive(Debug, Clone)]
pub struct WaterDeficitEstimator {
    config: DeficitConfig,
}

impl Default for WaterDeficitEstimator {
    fn default() -> Self {
        Self::new(DeficitConfig::default())
    }
}

impl WaterDeficitEstimator {
    pub fn new(config: DeficitConfig) -> Self {
        Self { config }
    }

    /// Daily reference evapotranspiration (mm) for a mean air temperature.
    ///
    /// `0.0023 * (T + 17.8) * sqrt(T) * 5`; non-positive temperatures give 0.
    pub fn reference_evapotranspiration(&self, temperature_c: f64) -> f64 {
        if temperature_c.is_nan() || temperature_c <= 0.0 {
            return 0.0;
        }
        let et0 = self.config.hargreaves_coefficient
            * (temperature_c + self.config.hargreaves_temperature_offset)
            * temperature_c.sqrt()
            * self.config.radiation_term;
        et0.max(0.0)
    }

    /// Weekly deficit with stress scaling and a severity label.
    ///
    /// Zone statistics and the mean index scale the base deficit
    /// independently; the result never drops below the configured floor.
    pub fn assess(
        &self,
        et0_daily_mm: f64,
        rainfall_mm: f64,
        mean_index: Option<f64>,
        zone_stats: Option<&ZoneStatistics>,
    ) -> WaterDeficitAssessment {
        let c = &self.config;
        let et0_weekly = et0_daily_mm * c.days_per_week;
        let mut deficit = et0_weekly - rainfall_mm;

        if let Some(stats) = zone_stats {
            let stress_factor = 1.0
                + c.critical_stress_weight * stats.critical.percentage / 100.0
                + c.high_stress_weight * stats.high.percentage / 100.0
                + c.moderate_stress_weight * stats.moderate.percentage / 100.0;
            deficit *= stress_factor;
        }

        if let Some(index) = mean_index {
            if index < c.low_index_threshold {
                deficit *= c.low_index_factor;
            } else if index < c.reduced_index_threshold {
                deficit *= c.reduced_index_factor;
            }
        }

        let deficit_mm = round_to(deficit.max(c.minimum_deficit_mm), 1);
        let severity =
            DeficitSeverity::from_deficit(deficit_mm, c.moderate_severity_mm, c.high_severity_mm);

        debug!(deficit_mm, %severity, "Assessed water deficit");

        WaterDeficitAssessment {
            deficit_mm,
            severity,
            et0_weekly_mm: round_to(et0_weekly, 1),
            rainfall_mm: round_to(rainfall_mm, 1),
        }
    }

    /// ET0 from temperature followed by [`assess`](Self::assess)
    pub fn assess_from_weather(
        &self,
        temperature_c: f64,
        rainfall_mm: f64,
        mean_index: Option<f64>,
        zone_stats: Option<&ZoneStatistics>,
    ) -> WaterDeficitAssessment {
        let et0 = self.reference_evapotranspiration(temperature_c);
        self.assess(et0, rainfall_mm, mean_index, zone_stats)
    }
}
