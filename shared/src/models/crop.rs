//! Crop reference data
//!
//! Static agronomic parameters per crop. The table is immutable and shared by
//! every analysis; lookups are case-insensitive on the crop identifier.

use serde::{Deserialize, Serialize};

use crate::models::StressZone;

/// Qualitative drought stress tolerance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StressTolerance {
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
}

impl std::fmt::Display for StressTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StressTolerance::Low => write!(f, "low"),
            StressTolerance::LowMedium => write!(f, "low-medium"),
            StressTolerance::Medium => write!(f, "medium"),
            StressTolerance::MediumHigh => write!(f, "medium-high"),
            StressTolerance::High => write!(f, "high"),
        }
    }
}

/// Agronomic profile of a crop
#[derive(Debug, Clone, Serialize)]
pub struct CropProfile {
    pub id: &'static str,
    pub name: &'static str,
    /// Optimal vegetation index range (min, max)
    pub optimal_index_range: (f64, f64),
    pub water_need_mm_per_week: f64,
    pub critical_growth_stages: &'static [&'static str],
    pub stress_tolerance: StressTolerance,
    /// Market price per quintal (100 kg)
    pub price_per_quintal: f64,
    pub typical_yield_quintal_per_ha: f64,
    /// Multiplier applied to weekly need under uniform irrigation
    pub water_multiplier: f64,
    /// 0 = tolerant, 1 = very sensitive
    pub drought_sensitivity: f64,
}

pub const CROPS: &[CropProfile] = &[
    CropProfile {
        id: "rice",
        name: "Rice",
        optimal_index_range: (0.6, 0.85),
        water_need_mm_per_week: 50.0,
        critical_growth_stages: &[
            "Transplanting (0-20 days)",
            "Tillering (21-45 days)",
            "Panicle Initiation (46-65 days)",
            "Flowering (66-85 days)",
            "Grain Filling (86-115 days)",
        ],
        stress_tolerance: StressTolerance::Low,
        price_per_quintal: 2000.0,
        typical_yield_quintal_per_ha: 45.0,
        water_multiplier: 1.5,
        drought_sensitivity: 0.9,
    },
    CropProfile {
        id: "wheat",
        name: "Wheat",
        optimal_index_range: (0.55, 0.80),
        water_need_mm_per_week: 35.0,
        critical_growth_stages: &[
            "Germination (0-10 days)",
            "Crown Root Initiation (11-21 days)",
            "Tillering (22-60 days)",
            "Jointing (61-90 days)",
            "Heading/Flowering (91-110 days)",
            "Grain Filling (111-130 days)",
        ],
        stress_tolerance: StressTolerance::Medium,
        price_per_quintal: 2100.0,
        typical_yield_quintal_per_ha: 42.0,
        water_multiplier: 1.0,
        drought_sensitivity: 0.6,
    },
    CropProfile {
        id: "cotton",
        name: "Cotton",
        optimal_index_range: (0.50, 0.75),
        water_need_mm_per_week: 40.0,
        critical_growth_stages: &[
            "Germination (0-15 days)",
            "Seedling (16-35 days)",
            "Squaring (36-60 days)",
            "Flowering (61-95 days)",
            "Boll Development (96-140 days)",
            "Maturity (141-180 days)",
        ],
        stress_tolerance: StressTolerance::MediumHigh,
        price_per_quintal: 6000.0,
        typical_yield_quintal_per_ha: 25.0,
        water_multiplier: 1.2,
        drought_sensitivity: 0.5,
    },
    CropProfile {
        id: "sugarcane",
        name: "Sugarcane",
        optimal_index_range: (0.65, 0.90),
        water_need_mm_per_week: 55.0,
        critical_growth_stages: &[
            "Germination (0-30 days)",
            "Tillering (31-120 days)",
            "Grand Growth (121-270 days)",
            "Maturity (271-365 days)",
        ],
        stress_tolerance: StressTolerance::Low,
        price_per_quintal: 350.0,
        typical_yield_quintal_per_ha: 700.0,
        water_multiplier: 1.6,
        drought_sensitivity: 0.85,
    },
    CropProfile {
        id: "maize",
        name: "Maize",
        optimal_index_range: (0.55, 0.80),
        water_need_mm_per_week: 38.0,
        critical_growth_stages: &[
            "Germination (0-10 days)",
            "Vegetative (11-50 days)",
            "Tasseling (51-65 days)",
            "Silking (66-75 days)",
            "Grain Filling (76-110 days)",
            "Maturity (111-130 days)",
        ],
        stress_tolerance: StressTolerance::Medium,
        price_per_quintal: 1800.0,
        typical_yield_quintal_per_ha: 55.0,
        water_multiplier: 1.1,
        drought_sensitivity: 0.7,
    },
    CropProfile {
        id: "vegetables",
        name: "Vegetables",
        optimal_index_range: (0.50, 0.75),
        water_need_mm_per_week: 30.0,
        critical_growth_stages: &[
            "Seedling (0-15 days)",
            "Vegetative Growth (16-40 days)",
            "Flowering (41-60 days)",
            "Fruit Development (61-90 days)",
            "Harvest (91-120 days)",
        ],
        stress_tolerance: StressTolerance::LowMedium,
        price_per_quintal: 2500.0,
        typical_yield_quintal_per_ha: 200.0,
        water_multiplier: 0.9,
        drought_sensitivity: 0.75,
    },
];

/// Look up a crop profile by identifier (case-insensitive)
pub fn find_crop(crop_type: &str) -> Option<&'static CropProfile> {
    CROPS
        .iter()
        .find(|crop| crop.id.eq_ignore_ascii_case(crop_type.trim()))
}

/// All known crop identifiers
pub fn crop_ids() -> Vec<&'static str> {
    CROPS.iter().map(|crop| crop.id).collect()
}

/// Weekly water requirement multiplier for a stress level
pub fn stress_water_multiplier(zone: StressZone) -> f64 {
    match zone {
        StressZone::Healthy => 0.8,
        StressZone::Moderate => 1.0,
        StressZone::High => 1.3,
        StressZone::Critical => 1.5,
    }
}

/// Water needed for one week at a given stress level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterRequirement {
    /// Depth in mm, rounded to 0.1
    pub water_mm: f64,
    pub liters_per_hectare: u64,
    pub total_liters: u64,
    pub stress_level: StressZone,
}

/// Crop-specific status of a vegetation index value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropIndexAssessment {
    pub status: StressZone,
    /// Signed distance from the midpoint of the optimal range
    pub deviation: f64,
    pub optimal_range: (f64, f64),
    pub current_index: f64,
}

/// 1 mm of water over one hectare is 10,000 litres
pub const LITERS_PER_MM_HECTARE: f64 = 10_000.0;

impl CropProfile {
    /// Weekly water requirement for this crop at the given stress level
    pub fn water_requirement(&self, field_area_ha: f64, stress_level: StressZone) -> WaterRequirement {
        let required_mm = self.water_need_mm_per_week * stress_water_multiplier(stress_level);
        let liters_per_ha = required_mm * LITERS_PER_MM_HECTARE;
        WaterRequirement {
            water_mm: round_to(required_mm, 1),
            liters_per_hectare: liters_per_ha.max(0.0) as u64,
            total_liters: (liters_per_ha * field_area_ha).max(0.0) as u64,
            stress_level,
        }
    }

    /// Compare an index value against this crop's optimal range
    pub fn assess_index(&self, index_value: f64) -> CropIndexAssessment {
        let (min, max) = self.optimal_index_range;
        let status = if index_value < min - 0.15 {
            StressZone::Critical
        } else if index_value < min {
            StressZone::High
        } else if index_value < min + 0.05 {
            StressZone::Moderate
        } else if index_value <= max {
            StressZone::Healthy
        } else {
            // dense canopy above the optimum still warrants attention
            StressZone::Moderate
        };
        CropIndexAssessment {
            status,
            deviation: round_to(index_value - (min + max) / 2.0, 3),
            optimal_range: self.optimal_index_range,
            current_index: round_to(index_value, 3),
        }
    }

    /// Growth-stage advice; the current stage advances every 30 days
    pub fn growth_stage_advice(&self, days_after_planting: Option<u32>) -> String {
        let stages = self.critical_growth_stages;
        match days_after_planting {
            None => format!(
                "Critical growth stages: {}",
                stages.iter().take(3).copied().collect::<Vec<_>>().join(", ")
            ),
            Some(days) => {
                let index = ((days / 30) as usize).min(stages.len().saturating_sub(1));
                format!("Current stage: {}", stages[index])
            }
        }
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find_crop("Wheat").map(|c| c.name), Some("Wheat"));
        assert_eq!(find_crop(" RICE ").map(|c| c.id), Some("rice"));
        assert!(find_crop("quinoa").is_none());
    }

    #[test]
    fn critical_requirement_for_wheat() {
        let wheat = find_crop("wheat").unwrap();
        let req = wheat.water_requirement(2.0, StressZone::Critical);
        assert_eq!(req.water_mm, 52.5);
        assert_eq!(req.liters_per_hectare, 525_000);
        assert_eq!(req.total_liters, 1_050_000);
    }

    #[test]
    fn index_assessment_bands() {
        let wheat = find_crop("wheat").unwrap();
        assert_eq!(wheat.assess_index(0.35).status, StressZone::Critical);
        assert_eq!(wheat.assess_index(0.50).status, StressZone::High);
        assert_eq!(wheat.assess_index(0.57).status, StressZone::Moderate);
        assert_eq!(wheat.assess_index(0.70).status, StressZone::Healthy);
        assert_eq!(wheat.assess_index(0.85).status, StressZone::Moderate);
    }

    #[test]
    fn growth_stage_advice_caps_at_last_stage() {
        let sugarcane = find_crop("sugarcane").unwrap();
        assert_eq!(
            sugarcane.growth_stage_advice(Some(400)),
            "Current stage: Maturity (271-365 days)"
        );
        assert!(sugarcane
            .growth_stage_advice(None)
            .starts_with("Critical growth stages: Germination"));
    }
}
