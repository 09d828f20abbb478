//! Decision engine services for vegetation stress analysis

pub mod analysis;
pub mod financial;
pub mod forecast;
pub mod irrigation_plan;
pub mod recommendation;
pub mod stress_zones;
pub mod vegetation;
pub mod water_deficit;

pub use analysis::FieldAnalyzer;
pub use financial::FinancialCalculator;
pub use forecast::{ModelStatus, StressForecastService};
pub use irrigation_plan::IrrigationPlanner;
pub use recommendation::{RecommendationEngine, RecommendationInput};
pub use stress_zones::StressZoneClassifier;
pub use water_deficit::WaterDeficitEstimator;
