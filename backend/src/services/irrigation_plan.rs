//! Per-zone irrigation plan
//!
//! Turns the zone distribution into field instructions: how much water each
//! stress category gets, on which day, and in what order.

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::config::PlanConfig;
use crate::error::{AppError, AppResult};
use crate::services::recommendation::format_thousands;
use shared::{
    round_to, validate_field_area, validate_zone_percentages, zone_fill_color, IrrigationPlan,
    IrrigationStep, ScheduledIrrigation, StressZone, Urgency, ZoneIrrigation, ZoneStatistics,
    ACRES_PER_HECTARE, LITERS_PER_MM_HECTARE,
};

#[derive(Debug, Clone)]
pub struct IrrigationPlanner {
    config: PlanConfig,
}

impl Default for IrrigationPlanner {
    fn default() -> Self {
        Self::new(PlanConfig::default())
    }
}

fn reason(zone: StressZone) -> &'static str {
    match zone {
        StressZone::Critical => "Crops are very dry, leaves turning yellow/brown",
        StressZone::High => "Soil moisture is low, crops showing stress",
        StressZone::Moderate => "Crops starting to show stress, preventive watering needed",
        StressZone::Healthy => "Crops are healthy with adequate soil moisture",
    }
}

fn urgency(zone: StressZone) -> Urgency {
    match zone {
        StressZone::Critical => Urgency::Critical,
        StressZone::High => Urgency::High,
        StressZone::Moderate => Urgency::Moderate,
        StressZone::Healthy => Urgency::Info,
    }
}

fn timing_text(delay_days: u32) -> String {
    match delay_days {
        0 => "Today".to_string(),
        1 => "Within 1 day".to_string(),
        n => format!("Within {} days", n),
    }
}

fn day_label(delay_days: u32) -> String {
    match delay_days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        n => format!("In {} days", n),
    }
}

impl IrrigationPlanner {
    pub fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    /// Depth and delay for a category; healthy zones get neither
    fn dose(&self, zone: StressZone) -> Option<(f64, u32)> {
        let c = &self.config;
        match zone {
            StressZone::Critical => Some((c.critical_water_mm, c.critical_delay_days)),
            StressZone::High => Some((c.high_water_mm, c.high_delay_days)),
            StressZone::Moderate => Some((c.moderate_water_mm, c.moderate_delay_days)),
            StressZone::Healthy => None,
        }
    }

    /// Plan watering for every stress category, starting on `plan_date`
    pub fn plan(
        &self,
        zone_stats: &ZoneStatistics,
        field_area_ha: f64,
        plan_date: NaiveDate,
    ) -> AppResult<IrrigationPlan> {
        validate_field_area(field_area_ha)
            .map_err(|e| AppError::validation("field_area_ha", e))?;
        validate_zone_percentages(zone_stats)
            .map_err(|e| AppError::validation("zone_statistics", e))?;

        let mut zones = Vec::with_capacity(StressZone::ALL.len());
        let mut total_liters = 0.0;
        for (rank, zone) in StressZone::ALL.into_iter().enumerate() {
            let percentage = zone_stats.percentage(zone);
            let area_ha = percentage / 100.0 * field_area_ha;
            let (water_mm, delay) = match self.dose(zone) {
                Some((mm, days)) => (mm, Some(days)),
                None => (0.0, None),
            };
            let liters = area_ha * water_mm * LITERS_PER_MM_HECTARE;
            total_liters += liters;

            let action = match delay {
                Some(0) => format!("Give {}mm water today", water_mm),
                Some(days) => format!("Give {}mm water in {} days", water_mm, days),
                None => "No water needed now".to_string(),
            };

            zones.push(ZoneIrrigation {
                zone,
                color: zone_fill_color(zone).to_string(),
                priority: rank as u8 + 1,
                percentage: round_to(percentage, 1),
                area_hectares: round_to(area_ha, 2),
                area_acres: round_to(area_ha * ACRES_PER_HECTARE, 2),
                water_mm,
                water_liters: liters as u64,
                irrigate_in_days: delay,
                timing: delay.map_or_else(|| "No watering needed".to_string(), timing_text),
                action,
                reason: reason(zone).to_string(),
            });
        }

        let scheduled: Vec<&ZoneIrrigation> = zones
            .iter()
            .filter(|z| {
                z.irrigate_in_days.is_some() && z.area_acres > self.config.min_scheduled_acres
            })
            .collect();

        let mut schedule = Vec::with_capacity(scheduled.len());
        for z in &scheduled {
            let delay = z.irrigate_in_days.unwrap_or_default();
            let date = plan_date
                .checked_add_days(Days::new(u64::from(delay)))
                .ok_or_else(|| AppError::validation("analysis_date", "Plan date is out of range"))?;
            schedule.push(ScheduledIrrigation {
                date,
                day_label: day_label(delay),
                zone: z.zone,
                urgency: urgency(z.zone),
                water_liters: z.water_liters,
            });
        }

        let mut steps: Vec<IrrigationStep> = scheduled
            .iter()
            .map(|z| {
                let verb = match z.zone {
                    StressZone::Critical => "Start with",
                    StressZone::High => "Then water",
                    _ => "Schedule",
                };
                let timing = match z.irrigate_in_days {
                    Some(0) => "Today - morning or evening".to_string(),
                    Some(days) => timing_text(days),
                    None => String::new(),
                };
                (z, verb, timing)
            })
            .enumerate()
            .map(|(i, (z, verb, timing))| IrrigationStep {
                step: i as u8 + 1,
                zone: z.zone,
                action: format!(
                    "{} {} zones ({:.2} acres)",
                    verb,
                    z.zone.color().to_uppercase(),
                    z.area_acres
                ),
                water: format!("{} liters", format_thousands(z.water_liters)),
                timing,
            })
            .collect();

        let healthy_ha = zone_stats.percentage(StressZone::Healthy) / 100.0 * field_area_ha;
        let skipped_acres = round_to(healthy_ha * ACRES_PER_HECTARE, 2);
        steps.push(IrrigationStep {
            step: steps.len() as u8 + 1,
            zone: StressZone::Healthy,
            action: format!(
                "Skip {} zones ({:.2} acres)",
                StressZone::Healthy.color().to_uppercase(),
                skipped_acres
            ),
            water: "No water needed".to_string(),
            timing: "Already healthy".to_string(),
        });

        let potential_savings_liters =
            (healthy_ha * self.config.skipped_zone_mm * LITERS_PER_MM_HECTARE) as u64;

        debug!(
            total_liters,
            scheduled = schedule.len(),
            potential_savings_liters,
            "Built irrigation plan"
        );

        Ok(IrrigationPlan {
            plan_date,
            zones,
            total_water_liters: total_liters as u64,
            total_water_cubic_meters: round_to(total_liters / 1000.0, 2),
            schedule,
            steps,
            skipped_area_acres: skipped_acres,
            potential_savings_liters,
            savings_explanation: format!(
                "Saving water by not irrigating {:.2} acres of healthy crops",
                skipped_acres
            ),
        })
    }
}
