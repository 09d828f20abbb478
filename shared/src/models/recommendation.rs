//! Irrigation recommendation models

use serde::{Deserialize, Serialize};

use crate::models::StressZone;

/// How soon a recommendation should be acted on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Critical,
    High,
    Moderate,
    Info,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Critical => write!(f, "CRITICAL"),
            Urgency::High => write!(f, "HIGH"),
            Urgency::Moderate => write!(f, "MODERATE"),
            Urgency::Info => write!(f, "INFO"),
        }
    }
}

/// Qualitative cost of carrying out a recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CostImpact {
    High,
    Medium,
    Low,
    None,
}

/// A single prioritized irrigation action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1 is most urgent
    pub priority: u8,
    pub urgency: Urgency,
    /// Target zone name ("Critical", "High", "Field-wide", "Variable")
    pub zone: String,
    pub action: String,
    pub reason: String,
    pub water_amount: String,
    pub timing: String,
    pub cost_impact: CostImpact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_stage_note: Option<String>,
    /// Crop-specific index status, attached to maintenance advice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_status: Option<StressZone>,
}

/// Estimated savings from switching to zone-based irrigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterEfficiency {
    pub savings_percentage: f64,
    /// Monthly savings depth in mm
    pub savings_mm: f64,
    pub savings_liters: u64,
    /// Health-weighted irrigation efficiency (0-100)
    pub current_efficiency: f64,
    pub water_waste_percentage: f64,
    pub explanation: String,
}
