//! Financial ROI calculator
//!
//! Projects one season under uniform irrigation and under zone-optimized
//! irrigation. Money, volumes and yields are carried as `Decimal`.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;
use validator::Validate;

use crate::config::FinancialConfig;
use crate::error::{AppError, AppResult};
use shared::{
    find_crop, validate_field_area, ComparisonScenario, CropProfile, IrrigationComparison,
    RoiInputs, RoiProjection, RoiRequest, RoiSummary, SavingsProjection, ScenarioProjection,
    StressZone, ZoneStatistics,
};

#[derive(Debug, Clone)]
pub struct FinancialCalculator {
    config: FinancialConfig,
}

impl Default for FinancialCalculator {
    fn default() -> Self {
        Self::new(FinancialConfig::default())
    }
}

fn to_decimal(value: f64, field: &str) -> AppResult<Decimal> {
    Decimal::from_f64(value)
        .ok_or_else(|| AppError::validation(field, format!("{} is not a finite number", field)))
}

/// Overflow-checked product; an overflow is reported against `field`
fn product(factors: &[Decimal], field: &str) -> AppResult<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(*f))
        .ok_or_else(|| AppError::validation(field, format!("{} is too large to project", field)))
}

/// Overflow-checked quotient; a zero divisor is the caller's concern
fn quotient(numerator: Decimal, denominator: Decimal, field: &str) -> AppResult<Decimal> {
    numerator
        .checked_div(denominator)
        .ok_or_else(|| AppError::validation(field, format!("{} is too large to project", field)))
}

fn difference(a: Decimal, b: Decimal, field: &str) -> AppResult<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| AppError::validation(field, format!("{} is too large to project", field)))
}

/// Whole units, dropping the fraction
fn whole(value: Decimal) -> Decimal {
    value.trunc()
}

fn one_decimal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven)
}

impl FinancialCalculator {
    pub fn new(config: FinancialConfig) -> Self {
        Self { config }
    }

    /// Validate an [`RoiRequest`] and project it
    pub fn project(&self, request: &RoiRequest) -> AppResult<RoiProjection> {
        request.validate()?;
        self.calculate_roi(
            request.field_area_ha,
            &request.crop_type,
            &request.zone_statistics,
            request.water_rate_per_1000l,
            request.irrigation_method,
            request.irrigation_cycles,
        )
    }

    /// Uniform vs zone-optimized projection for one season.
    ///
    /// The water rate defaults to the irrigation method's typical rate.
    /// Zero area, zero cycles and zero benefit produce zeros, not errors;
    /// an area or rate too large for `Decimal` is a validation error.
    pub fn calculate_roi(
        &self,
        field_area_ha: f64,
        crop_type: &str,
        zone_stats: &ZoneStatistics,
        water_rate_per_1000l: Option<Decimal>,
        irrigation_method: shared::IrrigationMethod,
        irrigation_cycles: u32,
    ) -> AppResult<RoiProjection> {
        validate_field_area(field_area_ha)
            .map_err(|e| AppError::validation("field_area_ha", e))?;
        let crop =
            find_crop(crop_type).ok_or_else(|| AppError::UnknownCrop(crop_type.to_string()))?;
        let rate = water_rate_per_1000l.unwrap_or_else(|| irrigation_method.default_water_rate());
        if rate < Decimal::ZERO {
            return Err(AppError::validation(
                "water_rate_per_1000l",
                "Water rate cannot be negative",
            ));
        }

        let c = &self.config;
        let area = to_decimal(field_area_ha, "field_area_ha")?;
        let cycles = Decimal::from(irrigation_cycles);
        let liters_per_mm_ha = Decimal::from(10_000);
        let thousand = Decimal::from(1000);
        let weekly_need = to_decimal(crop.water_need_mm_per_week, "water_need_mm_per_week")?;

        // Uniform irrigation
        let current_mm = weekly_need * to_decimal(crop.water_multiplier, "water_multiplier")?;
        let current_liters = product(&[current_mm, liters_per_mm_ha, area, cycles], "field_area_ha")?;
        let current_cost = product(&[current_liters / thousand, rate], "water_rate_per_1000l")?;

        // Zone-optimized irrigation
        let optimized_multiplier = to_decimal(
            zone_stats.weighted(&c.optimized_water_weights),
            "zone_statistics",
        )?;
        let optimized_liters = product(
            &[weekly_need, optimized_multiplier, liters_per_mm_ha, area, cycles],
            "field_area_ha",
        )?;
        let optimized_cost = product(&[optimized_liters / thousand, rate], "water_rate_per_1000l")?;

        let water_saved_liters = difference(current_liters, optimized_liters, "field_area_ha")?;
        let water_saved_pct = if current_liters > Decimal::ZERO {
            water_saved_liters / current_liters * Decimal::from(100)
        } else {
            Decimal::ZERO
        };

        // Yield
        let yield_improvement = to_decimal(self.yield_improvement(zone_stats), "zone_statistics")?;
        let price = to_decimal(crop.price_per_quintal, "price_per_quintal")?;
        let current_yield = product(
            &[
                to_decimal(crop.typical_yield_quintal_per_ha, "typical_yield_quintal_per_ha")?,
                area,
            ],
            "field_area_ha",
        )?;
        let improved_yield = product(&[current_yield, Decimal::ONE + yield_improvement], "field_area_ha")?;
        let yield_increase = improved_yield - current_yield;

        let current_revenue = product(&[current_yield, price], "field_area_ha")?;
        let optimized_revenue = product(&[improved_yield, price], "field_area_ha")?;

        let cost_saved = whole(difference(current_cost, optimized_cost, "water_rate_per_1000l")?);
        let revenue_increase = whole(product(&[yield_increase, price], "field_area_ha")?);
        let total_benefit = cost_saved
            .checked_add(revenue_increase)
            .ok_or_else(|| AppError::validation("field_area_ha", "field_area_ha is too large to project"))?;

        let implementation_cost = c.implementation_cost;
        let roi_percentage = if implementation_cost > Decimal::ZERO {
            product(
                &[quotient(total_benefit, implementation_cost, "implementation_cost")?, Decimal::from(100)],
                "implementation_cost",
            )?
        } else {
            Decimal::ZERO
        };
        let payback_months = if total_benefit > Decimal::ZERO {
            one_decimal(product(
                &[quotient(implementation_cost, total_benefit, "implementation_cost")?, c.season_months],
                "implementation_cost",
            )?)
        } else {
            Decimal::ZERO
        };

        let current_profit = difference(current_revenue, current_cost, "water_rate_per_1000l")?;
        let optimized_profit = difference(optimized_revenue, optimized_cost, "water_rate_per_1000l")?;

        debug!(
            crop = crop.id,
            %total_benefit,
            %roi_percentage,
            "Calculated ROI projection"
        );

        Ok(RoiProjection {
            current_scenario: ScenarioProjection {
                water_usage_liters: whole(current_liters),
                water_cost: whole(current_cost),
                yield_quintal: one_decimal(current_yield),
                revenue: whole(current_revenue),
                profit: whole(current_profit),
            },
            optimized_scenario: ScenarioProjection {
                water_usage_liters: whole(optimized_liters),
                water_cost: whole(optimized_cost),
                yield_quintal: one_decimal(improved_yield),
                revenue: whole(optimized_revenue),
                profit: whole(optimized_profit),
            },
            savings: SavingsProjection {
                water_saved_liters: whole(water_saved_liters),
                water_saved_percentage: one_decimal(water_saved_pct),
                cost_saved,
                yield_improvement_percentage: one_decimal(yield_improvement * Decimal::from(100)),
                yield_increase_quintal: one_decimal(yield_increase),
                revenue_increase,
                total_season_benefit: total_benefit,
            },
            roi: RoiSummary {
                implementation_cost,
                total_benefit,
                roi_percentage,
                payback_months,
            },
            inputs: RoiInputs {
                field_area_ha,
                crop_type: crop_type.to_string(),
                crop_name: crop.name.to_string(),
                water_rate_per_1000l: rate,
                irrigation_method,
                irrigation_cycles,
            },
        })
    }

    /// Fractional yield gain from fixing the dominant stress, scaled by how
    /// stressed the field is overall
    pub fn yield_improvement(&self, zone_stats: &ZoneStatistics) -> f64 {
        let c = &self.config;
        let critical = zone_stats.percentage(StressZone::Critical);
        let high = zone_stats.percentage(StressZone::High);
        let moderate = zone_stats.percentage(StressZone::Moderate);

        let base = if critical > c.dominant_critical_pct || high > c.dominant_high_pct {
            c.critical_recovery_yield
        } else if high > c.secondary_high_pct {
            c.high_recovery_yield
        } else if moderate > c.dominant_moderate_pct {
            c.moderate_recovery_yield
        } else {
            c.maintenance_yield
        };

        let stress_score = zone_stats.weighted(&c.stress_score_weights);
        base * (1.0 - stress_score)
    }

    /// Traditional flood irrigation against zone-optimized irrigation
    pub fn comparison(&self, field_area_ha: f64, crop_type: &str) -> AppResult<IrrigationComparison> {
        validate_field_area(field_area_ha)
            .map_err(|e| AppError::validation("field_area_ha", e))?;
        let crop =
            find_crop(crop_type).ok_or_else(|| AppError::UnknownCrop(crop_type.to_string()))?;
        let cmp = &self.config.comparison;

        let traditional_mm =
            crop.water_need_mm_per_week * crop.water_multiplier * cmp.over_irrigation_factor;
        let traditional = self.comparison_scenario(
            crop,
            field_area_ha,
            traditional_mm,
            cmp.traditional_yield_factor,
            cmp.traditional_stress_percentage,
        )?;
        let optimized = self.comparison_scenario(
            crop,
            field_area_ha,
            crop.water_need_mm_per_week,
            cmp.optimized_yield_factor,
            cmp.optimized_stress_percentage,
        )?;

        let water_saved = difference(traditional.water_liters, optimized.water_liters, "field_area_ha")?;
        let water_saved_percentage = if traditional.water_liters > Decimal::ZERO {
            one_decimal(water_saved / traditional.water_liters * Decimal::from(100))
        } else {
            Decimal::ZERO
        };

        Ok(IrrigationComparison {
            cost_saved: difference(traditional.cost, optimized.cost, "field_area_ha")?,
            water_saved_liters: water_saved,
            water_saved_percentage,
            traditional,
            optimized,
        })
    }

    fn comparison_scenario(
        &self,
        crop: &CropProfile,
        field_area_ha: f64,
        water_mm: f64,
        yield_factor: f64,
        stress_percentage: u8,
    ) -> AppResult<ComparisonScenario> {
        let cmp = &self.config.comparison;
        let liters = product(
            &[
                to_decimal(water_mm, "water_mm")?,
                Decimal::from(10_000),
                to_decimal(field_area_ha, "field_area_ha")?,
                Decimal::from(cmp.cycles),
            ],
            "field_area_ha",
        )?;
        let cost = product(&[liters / Decimal::from(1000), cmp.water_rate_per_1000l], "field_area_ha")?;
        let yield_per_ha = to_decimal(crop.typical_yield_quintal_per_ha * yield_factor, "yield")?;

        Ok(ComparisonScenario {
            water_liters: whole(liters),
            cost: whole(cost),
            stress_percentage,
            yield_quintal_per_ha: one_decimal(yield_per_ha),
        })
    }
}
