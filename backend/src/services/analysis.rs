//! Field analysis pipeline
//!
//! Runs the engine components in dependency order for one field and
//! assembles the report.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::financial::FinancialCalculator;
use crate::services::forecast::{synthetic_weather, StressForecastService};
use crate::services::irrigation_plan::IrrigationPlanner;
use crate::services::recommendation::{water_savings_for, RecommendationEngine, RecommendationInput};
use crate::services::stress_zones::StressZoneClassifier;
use crate::services::vegetation::{index_from_source, statistics};
use crate::services::water_deficit::WaterDeficitEstimator;
use shared::{
    find_crop, health_score, validate_boundary, validate_field_area, validate_weather_day,
    AnalysisMetadata, CropProfile, FieldAnalysis, FieldAnalysisRequest, IndexStatistics,
    QuadrantStatistics, QuickAnalysis, Recommendation, WaterDeficitAssessment,
    WaterEfficiency, ZoneStatistics,
};

/// Everything the full and quick reports share
struct CoreResults {
    metadata: AnalysisMetadata,
    crop: &'static CropProfile,
    statistics: IndexStatistics,
    zone_stats: ZoneStatistics,
    quadrant_stats: QuadrantStatistics,
    deficit: WaterDeficitAssessment,
    recommendations: Vec<Recommendation>,
    efficiency: WaterEfficiency,
}

/// Orchestrates the engine for a single field
pub struct FieldAnalyzer {
    classifier: StressZoneClassifier,
    deficit: WaterDeficitEstimator,
    recommender: RecommendationEngine,
    financial: FinancialCalculator,
    planner: IrrigationPlanner,
    forecast: Arc<StressForecastService>,
}

impl FieldAnalyzer {
    pub fn new(config: &Config, forecast: Arc<StressForecastService>) -> Self {
        Self {
            classifier: StressZoneClassifier::new(config.zones.clone()),
            deficit: WaterDeficitEstimator::new(config.deficit.clone()),
            recommender: RecommendationEngine::new(config.recommendations.clone()),
            financial: FinancialCalculator::new(config.financial.clone()),
            planner: IrrigationPlanner::new(config.plan.clone()),
            forecast,
        }
    }

    /// Analyzer with an untrained forecast service
    pub fn from_config(config: &Config) -> Self {
        let forecast = Arc::new(StressForecastService::new(config.forecast.clone()));
        Self::new(config, forecast)
    }

    pub fn forecast_service(&self) -> &Arc<StressForecastService> {
        &self.forecast
    }

    pub fn financial(&self) -> &FinancialCalculator {
        &self.financial
    }

    /// Full report including ROI projection and stress forecast.
    ///
    /// When the forecast model is not ready the report carries the static
    /// fallback forecast instead of failing.
    #[instrument(skip_all, fields(crop = %request.crop_type))]
    pub fn analyze(&self, request: &FieldAnalysisRequest) -> AppResult<FieldAnalysis> {
        let core = self.run_core(request)?;

        let roi_analysis = self.financial.calculate_roi(
            request.field_area_ha,
            core.crop.id,
            &core.zone_stats,
            request.water_rate_per_1000l,
            request.irrigation_method,
            request.irrigation_cycles,
        )?;

        let weather = if request.weather_forecast.is_empty() {
            synthetic_weather(
                &request.current_weather,
                self.forecast.config().max_forecast_days,
            )
        } else {
            request.weather_forecast.clone()
        };
        let stress_forecast = self
            .forecast
            .forecast_or_fallback(core.statistics.mean, &weather)?;

        info!(
            analysis_id = %core.metadata.analysis_id,
            recommendations = core.recommendations.len(),
            forecast_fallback = stress_forecast.is_fallback(),
            "Field analysis complete"
        );

        let crop_assessment = core.crop.assess_index(core.statistics.mean);
        let irrigation_plan = self.planner.plan(
            &core.zone_stats,
            request.field_area_ha,
            core.metadata.analysis_date,
        )?;

        Ok(FieldAnalysis {
            metadata: core.metadata,
            statistics: core.statistics,
            zone_distribution: core.zone_stats,
            quadrant_analysis: core.quadrant_stats,
            weather: request.current_weather,
            water_deficit: core.deficit,
            recommendations: core.recommendations,
            water_efficiency: core.efficiency,
            crop_assessment,
            roi_analysis,
            stress_forecast,
            irrigation_plan,
        })
    }

    /// Statistics, zones, deficit and the top recommendations only
    #[instrument(skip_all, fields(crop = %request.crop_type))]
    pub fn quick_analysis(&self, request: &FieldAnalysisRequest) -> AppResult<QuickAnalysis> {
        let mut core = self.run_core(request)?;
        core.recommendations
            .truncate(self.recommender.config().quick_recommendations);

        Ok(QuickAnalysis {
            metadata: core.metadata,
            statistics: core.statistics,
            zone_distribution: core.zone_stats,
            weather: request.current_weather,
            water_deficit: core.deficit,
            recommendations: core.recommendations,
            water_efficiency: core.efficiency,
        })
    }

    fn validate_request(&self, request: &FieldAnalysisRequest) -> AppResult<&'static CropProfile> {
        request.validate()?;
        validate_field_area(request.field_area_ha)
            .map_err(|e| AppError::validation("field_area_ha", e))?;
        if let Some(boundary) = &request.boundary {
            validate_boundary(boundary).map_err(|e| AppError::validation("boundary", e))?;
        }
        validate_weather_day(&request.current_weather)
            .map_err(|e| AppError::validation("current_weather", e))?;
        if let Some(rain) = request.forecast_rainfall_mm {
            if !rain.is_finite() || rain < 0.0 {
                return Err(AppError::validation(
                    "forecast_rainfall_mm",
                    "Forecast rainfall must be a non-negative number",
                ));
            }
        }
        find_crop(&request.crop_type).ok_or_else(|| AppError::UnknownCrop(request.crop_type.clone()))
    }

    fn run_core(&self, request: &FieldAnalysisRequest) -> AppResult<CoreResults> {
        let crop = self.validate_request(request)?;
        let weather = request.current_weather;

        let grid = index_from_source(&request.source)?;
        let stats = statistics(&grid)?;

        let (_zone_map, zone_stats) = self.classifier.classify(&grid, Some(weather.rainfall_mm))?;
        let quadrant_stats = self.classifier.quadrant_statistics(&grid);

        let rainfall = request.forecast_rainfall_mm.unwrap_or(weather.rainfall_mm);
        let deficit = self.deficit.assess_from_weather(
            weather.temperature_c,
            rainfall,
            Some(stats.mean),
            Some(&zone_stats),
        );

        let recommendations = self.recommender.recommend(&RecommendationInput {
            zone_stats: &zone_stats,
            quadrant_stats: &quadrant_stats,
            deficit: &deficit,
            mean_index: stats.mean,
            crop_type: crop.id,
            field_area_ha: request.field_area_ha,
            days_after_planting: request.days_after_planting,
        })?;
        let efficiency = water_savings_for(&zone_stats, crop, request.field_area_ha);

        let generated_at = Utc::now();
        let metadata = AnalysisMetadata {
            analysis_id: Uuid::new_v4(),
            generated_at,
            analysis_date: request
                .analysis_date
                .unwrap_or_else(|| generated_at.date_naive()),
            field_area_hectares: request.field_area_ha,
            health_score: shared::round_to(health_score(stats.mean), 1),
            crop_type: crop.id.to_string(),
            crop_name: crop.name.to_string(),
            center: request.boundary.as_ref().and_then(|b| b.center()),
        };

        Ok(CoreResults {
            metadata,
            crop,
            statistics: stats,
            zone_stats,
            quadrant_stats,
            deficit,
            recommendations,
            efficiency,
        })
    }
}
