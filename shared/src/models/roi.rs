//! Financial projection models for zone-based irrigation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::ZoneStatistics;

/// Irrigation delivery method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IrrigationMethod {
    #[default]
    Flood,
    Drip,
    Sprinkler,
}

impl IrrigationMethod {
    /// Typical water rate per 1000 litres for this method
    pub fn default_water_rate(&self) -> Decimal {
        match self {
            IrrigationMethod::Flood => Decimal::from(50),
            IrrigationMethod::Drip => Decimal::from(40),
            IrrigationMethod::Sprinkler => Decimal::from(45),
        }
    }
}

impl std::fmt::Display for IrrigationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrrigationMethod::Flood => write!(f, "flood"),
            IrrigationMethod::Drip => write!(f, "drip"),
            IrrigationMethod::Sprinkler => write!(f, "sprinkler"),
        }
    }
}

fn default_cycles() -> u32 {
    10
}

/// Input for an ROI projection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoiRequest {
    #[validate(range(min = 0.0))]
    pub field_area_ha: f64,
    #[validate(length(min = 1))]
    pub crop_type: String,
    pub zone_statistics: ZoneStatistics,
    /// Falls back to the irrigation method's typical rate when absent
    pub water_rate_per_1000l: Option<Decimal>,
    #[serde(default)]
    pub irrigation_method: IrrigationMethod,
    #[serde(default = "default_cycles")]
    #[validate(range(max = 365))]
    pub irrigation_cycles: u32,
}

/// Season totals under one irrigation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub water_usage_liters: Decimal,
    pub water_cost: Decimal,
    pub yield_quintal: Decimal,
    pub revenue: Decimal,
    pub profit: Decimal,
}

/// Differences between the uniform and the zone-optimized policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsProjection {
    pub water_saved_liters: Decimal,
    pub water_saved_percentage: Decimal,
    pub cost_saved: Decimal,
    pub yield_improvement_percentage: Decimal,
    pub yield_increase_quintal: Decimal,
    pub revenue_increase: Decimal,
    /// Always `cost_saved + revenue_increase`
    pub total_season_benefit: Decimal,
}

/// Return on the one-off implementation cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiSummary {
    pub implementation_cost: Decimal,
    pub total_benefit: Decimal,
    pub roi_percentage: Decimal,
    /// Zero when the season produces no benefit
    pub payback_months: Decimal,
}

/// Echo of the resolved inputs that produced a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiInputs {
    pub field_area_ha: f64,
    pub crop_type: String,
    pub crop_name: String,
    pub water_rate_per_1000l: Decimal,
    pub irrigation_method: IrrigationMethod,
    pub irrigation_cycles: u32,
}

/// Uniform vs zone-optimized irrigation projection for one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiProjection {
    pub current_scenario: ScenarioProjection,
    pub optimized_scenario: ScenarioProjection,
    pub savings: SavingsProjection,
    pub roi: RoiSummary,
    pub inputs: RoiInputs,
}

/// Traditional or optimized side of a demo comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonScenario {
    pub water_liters: Decimal,
    pub cost: Decimal,
    pub stress_percentage: u8,
    pub yield_quintal_per_ha: Decimal,
}

/// Traditional flood irrigation against zone-optimized irrigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationComparison {
    pub traditional: ComparisonScenario,
    pub optimized: ComparisonScenario,
    pub water_saved_liters: Decimal,
    pub cost_saved: Decimal,
    pub water_saved_percentage: Decimal,
}
