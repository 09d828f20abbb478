//! Tests for the water deficit estimator
//! Verifies evapotranspiration, stress scaling, the deficit floor and severity

use approx::assert_relative_eq;
use irrigation_backend::services::WaterDeficitEstimator;
use proptest::prelude::*;
use shared::{DeficitSeverity, ZoneStatistics};

// =============================================================================
// Reference evapotranspiration
// =============================================================================

mod evapotranspiration {
    use super::*;

    #[test]
    fn et0_at_thirty_degrees() {
        let et0 = WaterDeficitEstimator::default().reference_evapotranspiration(30.0);
        assert_relative_eq!(et0, 3.0108, epsilon = 1e-3);
    }

    #[test]
    fn freezing_temperatures_give_zero() {
        let estimator = WaterDeficitEstimator::default();
        assert_eq!(estimator.reference_evapotranspiration(0.0), 0.0);
        assert_eq!(estimator.reference_evapotranspiration(-5.0), 0.0);
    }

    #[test]
    fn hotter_days_evaporate_more() {
        let estimator = WaterDeficitEstimator::default();
        assert!(
            estimator.reference_evapotranspiration(35.0)
                > estimator.reference_evapotranspiration(25.0)
        );
    }
}

// =============================================================================
// Deficit assessment
// =============================================================================

mod assessment {
    use super::*;

    #[test]
    fn moderate_bound_is_inclusive() {
        let result = WaterDeficitEstimator::default().assess(5.0, 10.0, None, None);
        assert_relative_eq!(result.deficit_mm, 25.0);
        assert_eq!(result.severity, DeficitSeverity::Moderate);
        assert_relative_eq!(result.et0_weekly_mm, 35.0);
        assert_relative_eq!(result.rainfall_mm, 10.0);
    }

    #[test]
    fn high_bound_is_inclusive() {
        let result = WaterDeficitEstimator::default().assess(5.0, 0.0, Some(0.45), None);
        // 35 * 1.2
        assert_relative_eq!(result.deficit_mm, 42.0);
        assert_eq!(result.severity, DeficitSeverity::High);

        let at_bound = WaterDeficitEstimator::default().assess(40.0 / 7.0, 0.0, None, None);
        assert_relative_eq!(at_bound.deficit_mm, 40.0);
        assert_eq!(at_bound.severity, DeficitSeverity::High);
    }

    #[test]
    fn heavy_rain_hits_the_floor() {
        let result = WaterDeficitEstimator::default().assess(5.0, 100.0, None, None);
        assert_relative_eq!(result.deficit_mm, 10.0);
        assert_eq!(result.severity, DeficitSeverity::Low);
    }

    #[test]
    fn critical_zones_raise_the_deficit() {
        let stats = ZoneStatistics::from_percentages(50.0, 0.0, 0.0, 50.0);
        let result = WaterDeficitEstimator::default().assess(5.0, 0.0, None, Some(&stats));
        // 35 * (1 + 0.8 * 0.5)
        assert_relative_eq!(result.deficit_mm, 49.0);
        assert_eq!(result.severity, DeficitSeverity::High);
    }

    #[test]
    fn zone_and_index_scaling_compound() {
        let stats = ZoneStatistics::from_percentages(50.0, 0.0, 0.0, 50.0);
        let result = WaterDeficitEstimator::default().assess(5.0, 0.0, Some(0.2), Some(&stats));
        // 35 * 1.4 * 1.5
        assert_relative_eq!(result.deficit_mm, 73.5);
    }

    #[test]
    fn weekly_figure_from_weather() {
        let result = WaterDeficitEstimator::default().assess_from_weather(30.0, 0.0, Some(0.7), None);
        assert_relative_eq!(result.deficit_mm, 21.1);
        assert_eq!(result.severity, DeficitSeverity::Low);
    }
}

// =============================================================================
// Properties
// =============================================================================

mod properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The deficit never drops below the 10 mm floor
        #[test]
        fn prop_deficit_floor(
            et0 in 0.0f64..12.0,
            rain in 0.0f64..200.0,
            index in -1.0f64..=1.0,
        ) {
            let result = WaterDeficitEstimator::default().assess(et0, rain, Some(index), None);
            prop_assert!(result.deficit_mm >= 10.0);
        }

        /// Severity agrees with the reported deficit
        #[test]
        fn prop_severity_matches_deficit(et0 in 0.0f64..12.0, rain in 0.0f64..80.0) {
            let result = WaterDeficitEstimator::default().assess(et0, rain, None, None);
            let expected = if result.deficit_mm >= 40.0 {
                DeficitSeverity::High
            } else if result.deficit_mm >= 25.0 {
                DeficitSeverity::Moderate
            } else {
                DeficitSeverity::Low
            };
            prop_assert_eq!(result.severity, expected);
        }

        /// More rain never means a larger deficit
        #[test]
        fn prop_rain_reduces_deficit(et0 in 0.0f64..12.0, rain in 0.0f64..50.0, extra in 0.0f64..50.0) {
            let estimator = WaterDeficitEstimator::default();
            let dry = estimator.assess(et0, rain, None, None);
            let wet = estimator.assess(et0, rain + extra, None, None);
            prop_assert!(wet.deficit_mm <= dry.deficit_mm);
        }
    }
}
