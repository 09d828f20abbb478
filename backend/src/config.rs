//! Configuration management for the irrigation decision engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with the IRR prefix and `__` between
//!    every path segment (e.g. IRR__FORECAST__N_TREES,
//!    IRR__ZONES__THRESHOLDS__CRITICAL)
//!
//! Zone weight tables are replaced as a whole set of four values.

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    ZoneThresholds, ZoneWeights, DEFAULT_HIGH_DEFICIT_MM, DEFAULT_MODERATE_DEFICIT_MM,
    DEFAULT_RAIN_FACTORS, DEFAULT_RAIN_TRIGGER_MM, HARGREAVES_DEFAULTS,
};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Stress zone break points and rain adaptation
    pub zones: ZoneConfig,

    /// Evapotranspiration and deficit scaling
    pub deficit: DeficitConfig,

    /// Recommendation rule triggers
    pub recommendations: RecommendationConfig,

    /// Financial projection constants
    pub financial: FinancialConfig,

    /// Per-zone irrigation plan
    pub plan: PlanConfig,

    /// Forecast model training and inference
    pub forecast: ForecastConfig,

    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ZoneConfig {
    pub thresholds: ZoneThresholds,

    /// Rainfall (mm) above which break points are scaled
    pub rain_trigger_mm: f64,

    pub rain_critical_factor: f64,
    pub rain_high_factor: f64,
    pub rain_moderate_factor: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeficitConfig {
    /// Hargreaves coefficient
    pub hargreaves_coefficient: f64,
    pub hargreaves_temperature_offset: f64,
    /// Radiation term standing in for extraterrestrial radiation
    pub radiation_term: f64,

    pub days_per_week: f64,
    pub minimum_deficit_mm: f64,

    pub critical_stress_weight: f64,
    pub high_stress_weight: f64,
    pub moderate_stress_weight: f64,

    /// Mean index below which the deficit is scaled by `low_index_factor`
    pub low_index_threshold: f64,
    pub low_index_factor: f64,
    /// Mean index below which the deficit is scaled by `reduced_index_factor`
    pub reduced_index_threshold: f64,
    pub reduced_index_factor: f64,

    pub high_severity_mm: f64,
    pub moderate_severity_mm: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Critical zone share (%) that triggers immediate irrigation
    pub critical_area_trigger: f64,
    /// High stress share (%) that triggers increased irrigation
    pub high_area_trigger: f64,
    /// Healthy share (%) required for maintenance advice
    pub healthy_area_trigger: f64,
    /// Variance of quadrant stressed percentages that flags uneven irrigation
    pub quadrant_variance_trigger: f64,

    pub critical_water_multiplier: f64,
    pub high_water_multiplier: f64,

    pub max_recommendations: usize,
    /// Entries kept by the quick analysis
    pub quick_recommendations: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FinancialConfig {
    /// One-off cost of moving to zone-based irrigation
    pub implementation_cost: Decimal,

    /// Water multiplier per zone under optimized irrigation
    pub optimized_water_weights: ZoneWeights,
    /// Stress score per zone (0 = fully stressed, 1 = healthy)
    pub stress_score_weights: ZoneWeights,

    pub critical_recovery_yield: f64,
    pub high_recovery_yield: f64,
    pub moderate_recovery_yield: f64,
    pub maintenance_yield: f64,

    pub dominant_critical_pct: f64,
    pub dominant_high_pct: f64,
    pub secondary_high_pct: f64,
    pub dominant_moderate_pct: f64,

    /// Months per irrigation season, used for payback
    pub season_months: Decimal,

    pub comparison: ComparisonConfig,
}

/// Fixed scenario for the traditional vs optimized comparison
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ComparisonConfig {
    pub over_irrigation_factor: f64,
    pub cycles: u32,
    pub water_rate_per_1000l: Decimal,
    pub traditional_yield_factor: f64,
    pub optimized_yield_factor: f64,
    pub traditional_stress_percentage: u8,
    pub optimized_stress_percentage: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ForecastConfig {
    /// Synthetic training samples
    pub n_samples: usize,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub test_fraction: f64,
    pub seed: u64,

    /// Where the trained model artifact is persisted
    pub artifact_path: PathBuf,

    pub max_forecast_days: usize,
    /// Rainfall (mm) that resets days-since-rain
    pub rain_reset_mm: f64,
    /// Daily decay of cumulative rainfall (mm)
    pub rainfall_decay_mm: f64,
    /// Rainfall (mm) that improves the estimated index
    pub recovery_rain_mm: f64,
    pub recovery_rate: f64,
    pub heat_stress_c: f64,
    pub dry_spell_days: u32,
    pub decline_rate: f64,
    pub index_floor: f64,
    pub index_ceiling: f64,

    /// High-risk days needed for a high overall risk
    pub high_risk_days: usize,

    /// How long the driver waits for background training
    pub training_wait_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlanConfig {
    /// Water depth (mm) given to critical, high and moderate zones
    pub critical_water_mm: f64,
    pub high_water_mm: f64,
    pub moderate_water_mm: f64,

    /// Days after the plan date each stressed zone is watered
    pub critical_delay_days: u32,
    pub high_delay_days: u32,
    pub moderate_delay_days: u32,

    /// Zones smaller than this (acres) are left off the schedule
    pub min_scheduled_acres: f64,

    /// Depth a healthy zone would have received under uniform watering
    pub skipped_zone_mm: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IRR_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IRR__SECTION__KEY)
            .add_source(
                Environment::with_prefix("IRR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            zones: ZoneConfig::default(),
            deficit: DeficitConfig::default(),
            recommendations: RecommendationConfig::default(),
            financial: FinancialConfig::default(),
            plan: PlanConfig::default(),
            forecast: ForecastConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            thresholds: ZoneThresholds::default(),
            rain_trigger_mm: DEFAULT_RAIN_TRIGGER_MM,
            rain_critical_factor: DEFAULT_RAIN_FACTORS[0],
            rain_high_factor: DEFAULT_RAIN_FACTORS[1],
            rain_moderate_factor: DEFAULT_RAIN_FACTORS[2],
        }
    }
}

impl Default for DeficitConfig {
    fn default() -> Self {
        Self {
            hargreaves_coefficient: HARGREAVES_DEFAULTS.0,
            hargreaves_temperature_offset: HARGREAVES_DEFAULTS.1,
            radiation_term: HARGREAVES_DEFAULTS.2,
            days_per_week: 7.0,
            minimum_deficit_mm: 10.0,
            critical_stress_weight: 0.8,
            high_stress_weight: 0.5,
            moderate_stress_weight: 0.2,
            low_index_threshold: 0.3,
            low_index_factor: 1.5,
            reduced_index_threshold: 0.5,
            reduced_index_factor: 1.2,
            high_severity_mm: DEFAULT_HIGH_DEFICIT_MM,
            moderate_severity_mm: DEFAULT_MODERATE_DEFICIT_MM,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            critical_area_trigger: 10.0,
            high_area_trigger: 20.0,
            healthy_area_trigger: 50.0,
            quadrant_variance_trigger: 100.0,
            critical_water_multiplier: 1.5,
            high_water_multiplier: 1.3,
            max_recommendations: 5,
            quick_recommendations: 3,
        }
    }
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            implementation_cost: Decimal::from(5000),
            optimized_water_weights: ZoneWeights {
                critical: 1.4,
                high: 1.2,
                moderate: 1.0,
                healthy: 0.8,
            },
            stress_score_weights: ZoneWeights {
                critical: 0.0,
                high: 0.3,
                moderate: 0.6,
                healthy: 1.0,
            },
            critical_recovery_yield: 0.15,
            high_recovery_yield: 0.12,
            moderate_recovery_yield: 0.08,
            maintenance_yield: 0.05,
            dominant_critical_pct: 20.0,
            dominant_high_pct: 30.0,
            secondary_high_pct: 15.0,
            dominant_moderate_pct: 30.0,
            season_months: Decimal::from(4),
            comparison: ComparisonConfig::default(),
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            over_irrigation_factor: 1.5,
            cycles: 10,
            water_rate_per_1000l: Decimal::from(50),
            traditional_yield_factor: 0.90,
            optimized_yield_factor: 1.05,
            traditional_stress_percentage: 45,
            optimized_stress_percentage: 15,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            n_samples: 5000,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 10,
            min_samples_leaf: 5,
            test_fraction: 0.2,
            seed: 42,
            artifact_path: PathBuf::from("models/stress_forecast.json"),
            max_forecast_days: 7,
            rain_reset_mm: 5.0,
            rainfall_decay_mm: 2.0,
            recovery_rain_mm: 10.0,
            recovery_rate: 0.02,
            heat_stress_c: 35.0,
            dry_spell_days: 7,
            decline_rate: 0.015,
            index_floor: 0.1,
            index_ceiling: 0.9,
            high_risk_days: 3,
            training_wait_secs: 60,
        }
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            critical_water_mm: 60.0,
            high_water_mm: 40.0,
            moderate_water_mm: 25.0,
            critical_delay_days: 0,
            high_delay_days: 2,
            moderate_delay_days: 4,
            min_scheduled_acres: 0.1,
            skipped_zone_mm: 40.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "irrigation_engine=debug,irrigation_backend=debug".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = Config::default();
        assert_eq!(config.zones.thresholds.critical, 0.3);
        assert_eq!(config.deficit.minimum_deficit_mm, 10.0);
        assert_eq!(config.recommendations.max_recommendations, 5);
        assert_eq!(config.financial.implementation_cost, Decimal::from(5000));
        assert_eq!(config.forecast.n_trees, 100);
        assert_eq!(config.forecast.max_forecast_days, 7);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        std::env::set_var("IRR__FORECAST__N_TREES", "12");
        std::env::set_var("IRR__ZONES__THRESHOLDS__CRITICAL", "0.25");
        let loaded = Config::load();
        std::env::remove_var("IRR__FORECAST__N_TREES");
        std::env::remove_var("IRR__ZONES__THRESHOLDS__CRITICAL");

        let config = loaded.unwrap();
        assert_eq!(config.forecast.n_trees, 12);
        assert_eq!(config.zones.thresholds.critical, 0.25);
        assert_eq!(config.zones.thresholds.high, 0.5);
        assert_eq!(config.deficit.minimum_deficit_mm, 10.0);
    }
}
