//! Per-zone irrigation plan models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{StressZone, Urgency};

pub const ACRES_PER_HECTARE: f64 = 2.47105;

/// Water and timing for one stress category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneIrrigation {
    pub zone: StressZone,
    /// Hex fill colour for map overlays
    pub color: String,
    pub priority: u8,
    pub percentage: f64,
    pub area_hectares: f64,
    pub area_acres: f64,
    pub water_mm: f64,
    pub water_liters: u64,
    /// Days from the plan date; `None` when the zone needs no water
    pub irrigate_in_days: Option<u32>,
    pub timing: String,
    pub action: String,
    pub reason: String,
}

/// One dated irrigation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledIrrigation {
    pub date: NaiveDate,
    pub day_label: String,
    pub zone: StressZone,
    pub urgency: Urgency,
    pub water_liters: u64,
}

/// Ordered field instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationStep {
    pub step: u8,
    pub zone: StressZone,
    pub action: String,
    pub water: String,
    pub timing: String,
}

/// Zone-by-zone watering plan for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationPlan {
    pub plan_date: NaiveDate,
    /// Worst zone first
    pub zones: Vec<ZoneIrrigation>,
    pub total_water_liters: u64,
    pub total_water_cubic_meters: f64,
    pub schedule: Vec<ScheduledIrrigation>,
    pub steps: Vec<IrrigationStep>,
    pub skipped_area_acres: f64,
    /// Water not spent on healthy zones
    pub potential_savings_liters: u64,
    pub savings_explanation: String,
}

impl IrrigationPlan {
    pub fn zone(&self, zone: StressZone) -> Option<&ZoneIrrigation> {
        self.zones.iter().find(|z| z.zone == zone)
    }
}

/// Hex overlay colour per stress category
pub fn zone_fill_color(zone: StressZone) -> &'static str {
    match zone {
        StressZone::Critical => "#DC2626",
        StressZone::High => "#EA580C",
        StressZone::Moderate => "#EAB308",
        StressZone::Healthy => "#16A34A",
    }
}
