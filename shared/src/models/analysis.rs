//! Field analysis request and report models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    BandGrid, CropIndexAssessment, IndexStatistics, IrrigationMethod, IrrigationPlan,
    QuadrantStatistics, Recommendation, RoiProjection, StressForecast, VegetationGrid, WaterDeficitAssessment,
    WaterEfficiency, WeatherDay, ZoneStatistics,
};
use crate::types::{FieldBoundary, GpsCoordinates};

/// How the vegetation index raster is supplied
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexSource {
    /// Red and near-infrared reflectance bands of equal shape
    Bands { red: BandGrid, nir: BandGrid },
    /// An index raster computed upstream
    Precomputed { index: VegetationGrid },
}

fn default_cycles() -> u32 {
    10
}

/// Everything needed to analyse one field
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FieldAnalysisRequest {
    pub source: IndexSource,
    #[validate(length(min = 1))]
    pub crop_type: String,
    #[validate(range(min = 0.0))]
    pub field_area_ha: f64,
    pub boundary: Option<FieldBoundary>,
    #[validate]
    pub current_weather: WeatherDay,
    /// Expected rainfall over the coming week; current rainfall is used when absent
    pub forecast_rainfall_mm: Option<f64>,
    #[serde(default)]
    #[validate]
    pub weather_forecast: Vec<WeatherDay>,
    pub water_rate_per_1000l: Option<Decimal>,
    #[serde(default)]
    pub irrigation_method: IrrigationMethod,
    #[serde(default = "default_cycles")]
    #[validate(range(max = 365))]
    pub irrigation_cycles: u32,
    pub days_after_planting: Option<u32>,
    pub analysis_date: Option<NaiveDate>,
}

/// Report header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub analysis_date: NaiveDate,
    pub field_area_hectares: f64,
    /// 0-100 score from the mean index
    pub health_score: f64,
    pub crop_type: String,
    pub crop_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<GpsCoordinates>,
}

/// Full analysis report for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAnalysis {
    pub metadata: AnalysisMetadata,
    pub statistics: IndexStatistics,
    pub zone_distribution: ZoneStatistics,
    pub quadrant_analysis: QuadrantStatistics,
    pub weather: WeatherDay,
    pub water_deficit: WaterDeficitAssessment,
    pub recommendations: Vec<Recommendation>,
    pub water_efficiency: WaterEfficiency,
    pub crop_assessment: CropIndexAssessment,
    pub roi_analysis: RoiProjection,
    pub stress_forecast: StressForecast,
    pub irrigation_plan: IrrigationPlan,
}

/// Lightweight report without financial projection or forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickAnalysis {
    pub metadata: AnalysisMetadata,
    pub statistics: IndexStatistics,
    pub zone_distribution: ZoneStatistics,
    pub weather: WeatherDay,
    pub water_deficit: WaterDeficitAssessment,
    pub recommendations: Vec<Recommendation>,
    pub water_efficiency: WaterEfficiency,
}
