//! Tests for the field analysis pipeline
//! Verifies end-to-end reports, request validation and the forecast fallback

use approx::assert_relative_eq;
use chrono::NaiveDate;
use irrigation_backend::error::AppError;
use irrigation_backend::services::FieldAnalyzer;
use irrigation_backend::Config;
use rust_decimal::Decimal;
use shared::{
    DeficitSeverity, FieldAnalysisRequest, FieldBoundary, GpsCoordinates, Grid, IndexSource,
    IrrigationMethod, StressZone, Urgency, WeatherDay,
};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn request(source: IndexSource) -> FieldAnalysisRequest {
    FieldAnalysisRequest {
        source,
        crop_type: "rice".into(),
        field_area_ha: 2.0,
        boundary: None,
        current_weather: WeatherDay::new(30.0, 50.0, 0.0),
        forecast_rainfall_mm: None,
        weather_forecast: Vec::new(),
        water_rate_per_1000l: None,
        irrigation_method: IrrigationMethod::Flood,
        irrigation_cycles: 10,
        days_after_planting: None,
        analysis_date: None,
    }
}

fn uniform_field(value: f64) -> IndexSource {
    IndexSource::Precomputed {
        index: Grid::filled(10, 10, value),
    }
}

fn analyzer() -> FieldAnalyzer {
    FieldAnalyzer::from_config(&Config::default())
}

// =============================================================================
// Quick analysis
// =============================================================================

mod quick {
    use super::*;

    #[test]
    fn healthy_field_report() {
        let report = analyzer().quick_analysis(&request(uniform_field(0.7))).unwrap();

        assert_relative_eq!(report.statistics.mean, 0.7, epsilon = 1e-9);
        assert_relative_eq!(report.metadata.health_score, 85.0);
        assert_eq!(report.metadata.crop_name, "Rice");
        assert_relative_eq!(report.zone_distribution.healthy.percentage, 100.0);

        // ET0(30) * 7 with no rain and no stress scaling
        assert_relative_eq!(report.water_deficit.deficit_mm, 21.1);
        assert_eq!(report.water_deficit.severity, DeficitSeverity::Low);

        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].urgency, Urgency::Info);
        assert_eq!(report.recommendations[0].zone, "Field-wide");
    }

    #[test]
    fn quick_report_keeps_three_recommendations() {
        // west half critical, east half high stress, heat and no rain
        let mut grid = Grid::filled(20, 20, 0.4);
        for row in 0..20 {
            for col in 0..10 {
                grid.set(row, col, 0.05);
            }
        }
        let mut req = request(IndexSource::Precomputed { index: grid });
        req.current_weather = WeatherDay::new(40.0, 20.0, 0.0);

        let analyzer = analyzer();
        let quick = analyzer.quick_analysis(&req).unwrap();
        let full = analyzer.analyze(&req).unwrap();
        assert!(quick.recommendations.len() <= 3);
        assert!(full.recommendations.len() >= quick.recommendations.len());
        assert_eq!(quick.recommendations[0].priority, 1);
        assert_eq!(quick.recommendations[..], full.recommendations[..quick.recommendations.len()]);
    }

    #[test]
    fn bands_are_turned_into_an_index() {
        let source = IndexSource::Bands {
            red: Grid::filled(6, 6, 0.1),
            nir: Grid::filled(6, 6, 0.5),
        };
        let report = analyzer().quick_analysis(&request(source)).unwrap();
        assert_relative_eq!(report.statistics.mean, 0.4 / 0.6, epsilon = 1e-9);
    }

    #[test]
    fn uniform_strip_is_not_flagged_as_uneven() {
        let req = request(IndexSource::Precomputed {
            index: Grid::filled(4, 1, 0.2),
        });
        let report = analyzer().quick_analysis(&req).unwrap();
        assert_eq!(report.recommendations[0].priority, 1);
        assert!(report.recommendations.iter().all(|r| r.priority != 4));
    }

    #[test]
    fn forecast_rainfall_overrides_current_rain() {
        let mut req = request(uniform_field(0.7));
        req.forecast_rainfall_mm = Some(15.0);
        let report = analyzer().quick_analysis(&req).unwrap();
        assert_relative_eq!(report.water_deficit.rainfall_mm, 15.0);
        assert_relative_eq!(report.water_deficit.deficit_mm, 10.0);
    }
}

// =============================================================================
// Full analysis
// =============================================================================

mod full {
    use super::*;

    #[test]
    fn untrained_model_falls_back() {
        let report = analyzer().analyze(&request(uniform_field(0.7))).unwrap();
        assert!(report.stress_forecast.is_fallback());
        assert_eq!(report.crop_assessment.status, StressZone::Healthy);
        assert_eq!(report.roi_analysis.current_scenario.water_usage_liters, dec("15000000"));
        assert_eq!(
            report.roi_analysis.savings.total_season_benefit,
            report.roi_analysis.savings.cost_saved + report.roi_analysis.savings.revenue_increase
        );
    }

    #[test]
    fn metadata_carries_date_and_center() {
        let corner = |lat: &str, lon: &str| GpsCoordinates::new(dec(lat), dec(lon));
        let mut req = request(uniform_field(0.7));
        req.analysis_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        req.boundary = Some(FieldBoundary::new(vec![
            corner("18.0", "98.0"),
            corner("18.0", "98.2"),
            corner("18.2", "98.2"),
            corner("18.2", "98.0"),
            corner("18.0", "98.0"),
        ]));

        let report = analyzer().analyze(&req).unwrap();
        assert_eq!(report.metadata.analysis_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(report.metadata.center.is_some());
        assert_relative_eq!(report.metadata.field_area_hectares, 2.0);
    }

    #[test]
    fn plan_is_dated_by_the_analysis() {
        let mut req = request(uniform_field(0.1));
        req.analysis_date = NaiveDate::from_ymd_opt(2024, 6, 1);

        let report = analyzer().analyze(&req).unwrap();
        let plan = &report.irrigation_plan;
        assert_eq!(plan.plan_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        // whole 2 ha field is critical: 60 mm over 2 ha
        assert_eq!(plan.total_water_liters, 1_200_000);
        assert_eq!(plan.schedule.len(), 1);
        assert_eq!(plan.schedule[0].zone, StressZone::Critical);
        assert_eq!(plan.potential_savings_liters, 0);
    }

    #[test]
    fn reports_are_serializable() {
        let report = analyzer().analyze(&request(uniform_field(0.65))).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["zone_distribution"]["healthy"]["percentage"].is_number());
        assert!(json["stress_forecast"]["summary"]["overall_risk"].is_string());
    }
}

// =============================================================================
// Request validation
// =============================================================================

mod validation {
    use super::*;

    #[test]
    fn unknown_crop() {
        let mut req = request(uniform_field(0.7));
        req.crop_type = "durian".into();
        let err = analyzer().analyze(&req).unwrap_err();
        assert!(matches!(err, AppError::UnknownCrop(_)));
        assert_eq!(err.to_response().error.field.as_deref(), Some("crop_type"));
    }

    #[test]
    fn negative_area() {
        let mut req = request(uniform_field(0.7));
        req.field_area_ha = -1.0;
        assert!(matches!(
            analyzer().quick_analysis(&req),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn huge_area_fails_cleanly() {
        let mut req = request(uniform_field(0.7));
        req.field_area_ha = 1e24;
        match analyzer().analyze(&req) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "field_area_ha"),
            other => panic!("expected area validation error, got {:?}", other.map(|r| r.metadata.analysis_id)),
        }
    }

    #[test]
    fn mismatched_bands() {
        let source = IndexSource::Bands {
            red: Grid::filled(4, 4, 0.1),
            nir: Grid::filled(5, 4, 0.5),
        };
        assert!(matches!(
            analyzer().quick_analysis(&request(source)),
            Err(AppError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn open_boundary_ring() {
        let mut req = request(uniform_field(0.7));
        req.boundary = Some(FieldBoundary::new(vec![
            GpsCoordinates::new(dec("18.0"), dec("98.0")),
            GpsCoordinates::new(dec("18.0"), dec("98.2")),
            GpsCoordinates::new(dec("18.2"), dec("98.2")),
            GpsCoordinates::new(dec("18.2"), dec("98.0")),
        ]));
        match analyzer().analyze(&req) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "boundary"),
            other => panic!("expected boundary validation error, got {:?}", other),
        }
    }

    #[test]
    fn implausible_weather() {
        let mut req = request(uniform_field(0.7));
        req.current_weather = WeatherDay::new(30.0, 50.0, -3.0);
        assert!(matches!(
            analyzer().quick_analysis(&req),
            Err(AppError::Validation { .. })
        ));
    }
}
