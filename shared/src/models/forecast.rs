//! Stress forecast models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Ordinal stress risk class predicted by the forecast model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Class index used by the classifier (0 = low .. 2 = high)
    pub fn class_index(&self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Advice attached to a forecast whose overall risk is this level
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::High => "URGENT: High stress risk detected. Increase irrigation immediately.",
            RiskLevel::Medium => "MODERATE: Monitor closely and prepare for additional irrigation.",
            RiskLevel::Low => "LOW: Continue current irrigation schedule. Monitor conditions.",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Daily weather entry consumed by the forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct WeatherDay {
    pub temperature_c: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity_percent: f64,
    #[validate(range(min = 0.0))]
    pub rainfall_mm: f64,
}

impl WeatherDay {
    pub fn new(temperature_c: f64, humidity_percent: f64, rainfall_mm: f64) -> Self {
        Self {
            temperature_c,
            humidity_percent,
            rainfall_mm,
        }
    }
}

/// Number of features in the classifier contract
pub const FEATURE_COUNT: usize = 5;

/// Feature names in contract order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "NDVI",
    "Temperature",
    "Humidity",
    "Rainfall",
    "Days Since Rain",
];

/// The fixed 5-feature input of the stress classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressFeatures {
    pub vegetation_index: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub cumulative_rainfall_mm: f64,
    pub days_since_rain: f64,
}

impl StressFeatures {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.vegetation_index,
            self.temperature_c,
            self.humidity_percent,
            self.cumulative_rainfall_mm,
            self.days_since_rain,
        ]
    }
}

/// Relative importance of each classifier feature (sums to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    #[serde(rename = "NDVI")]
    pub vegetation_index: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Rainfall")]
    pub rainfall: f64,
    #[serde(rename = "Days Since Rain")]
    pub days_since_rain: f64,
}

impl FeatureImportance {
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            vegetation_index: values[0],
            temperature: values[1],
            humidity: values[2],
            rainfall: values[3],
            days_since_rain: values[4],
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.vegetation_index,
            self.temperature,
            self.humidity,
            self.rainfall,
            self.days_since_rain,
        ]
    }

    /// Snapshot published with fallback forecasts
    pub fn fallback() -> Self {
        Self::from_array([0.35, 0.25, 0.20, 0.15, 0.05])
    }
}

/// Model output for one forecast day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStressPrediction {
    /// 1-based day number
    pub day: u8,
    pub risk_level: RiskLevel,
    /// Probability of the predicted class
    pub stress_probability: f64,
    /// Highest class probability
    pub confidence_score: f64,
    pub estimated_index: f64,
    pub weather: WeatherDay,
    pub days_since_rain: u32,
    pub cumulative_rainfall_mm: f64,
}

/// Aggregate view over the daily predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub overall_risk: RiskLevel,
    pub high_stress_days: usize,
    pub average_stress_probability: f64,
    pub recommendation: String,
    pub confidence: f64,
}

/// Where a forecast came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForecastSource {
    Model { model_id: Uuid },
    Fallback,
}

/// Multi-day stress forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressForecast {
    pub daily_predictions: Vec<DailyStressPrediction>,
    pub summary: ForecastSummary,
    pub feature_importance: FeatureImportance,
    pub source: ForecastSource,
}

impl StressForecast {
    /// Static response used when no trained model is available
    pub fn fallback() -> Self {
        Self {
            daily_predictions: Vec::new(),
            summary: ForecastSummary {
                overall_risk: RiskLevel::Medium,
                high_stress_days: 0,
                average_stress_probability: 0.5,
                recommendation:
                    "Weather-based prediction unavailable. Monitor field conditions closely."
                        .to_string(),
                confidence: 0.5,
            },
            feature_importance: FeatureImportance::fallback(),
            source: ForecastSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ForecastSource::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_index_round_trips() {
        for level in RiskLevel::ALL {
            assert_eq!(RiskLevel::from_class_index(level.class_index()), Some(level));
        }
        assert_eq!(RiskLevel::from_class_index(3), None);
    }

    #[test]
    fn fallback_importance_sums_to_one() {
        let total: f64 = FeatureImportance::fallback().to_array().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn importance_serializes_with_feature_names() {
        let json = serde_json::to_value(FeatureImportance::fallback()).unwrap();
        assert_eq!(json["NDVI"], 0.35);
        assert_eq!(json["Days Since Rain"], 0.05);
    }
}
