//! Validation utilities for the Irrigation Advisor
//!
//! Input checks shared by the backend pipeline and the browser calculators.

use crate::models::{Grid, WeatherDay, ZoneStatistics};
use crate::types::FieldBoundary;

// ============================================================================
// Raster Validations
// ============================================================================

/// Validate that red and NIR bands have identical shapes
pub fn validate_band_shapes(red: &Grid, nir: &Grid) -> Result<(), &'static str> {
    if red.shape() != nir.shape() {
        return Err("Red and NIR bands must have the same shape");
    }
    Ok(())
}

/// Validate that a grid is non-empty, consistent and holds only finite values
pub fn validate_finite_grid(grid: &Grid) -> Result<(), &'static str> {
    if grid.width == 0 || grid.height == 0 {
        return Err("Grid must have at least one row and one column");
    }
    if grid.data.len() != grid.width * grid.height {
        return Err("Grid data length does not match its dimensions");
    }
    if grid.data.iter().any(|v| !v.is_finite()) {
        return Err("Grid contains non-finite values");
    }
    Ok(())
}

/// Validate that every index value lies within [-1, 1]
pub fn validate_index_range(grid: &Grid) -> Result<(), &'static str> {
    validate_finite_grid(grid)?;
    if grid.data.iter().any(|v| !(-1.0..=1.0).contains(v)) {
        return Err("Vegetation index values must lie within [-1, 1]");
    }
    Ok(())
}

// ============================================================================
// Field Validations
// ============================================================================

/// Validate zone percentages are non-negative and sum to 100 (within 0.5)
pub fn validate_zone_percentages(stats: &ZoneStatistics) -> Result<(), &'static str> {
    let values = [
        stats.critical.percentage,
        stats.high.percentage,
        stats.moderate.percentage,
        stats.healthy.percentage,
    ];
    if values.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err("Zone percentages must be finite and non-negative");
    }
    if (stats.total_percentage() - 100.0).abs() > 0.5 {
        return Err("Zone percentages must sum to 100");
    }
    Ok(())
}

/// Validate field area in hectares
pub fn validate_field_area(area_ha: f64) -> Result<(), &'static str> {
    if !area_ha.is_finite() {
        return Err("Field area must be a finite number");
    }
    if area_ha < 0.0 {
        return Err("Field area cannot be negative");
    }
    Ok(())
}

/// Validate a field boundary ring
pub fn validate_boundary(boundary: &FieldBoundary) -> Result<(), &'static str> {
    // a closed triangle needs four points including the repeated first vertex
    if boundary.points.len() < 4 {
        return Err("Field boundary needs at least three distinct vertices");
    }
    if boundary.points.first() != boundary.points.last() {
        return Err("Field boundary ring must be closed");
    }
    if !boundary.points.iter().all(|p| p.is_valid()) {
        return Err("Field boundary contains invalid coordinates");
    }
    Ok(())
}

// ============================================================================
// Weather Validations
// ============================================================================

/// Validate a daily weather entry
pub fn validate_weather_day(day: &WeatherDay) -> Result<(), &'static str> {
    if !day.temperature_c.is_finite()
        || !day.humidity_percent.is_finite()
        || !day.rainfall_mm.is_finite()
    {
        return Err("Weather values must be finite");
    }
    if !(-60.0..=60.0).contains(&day.temperature_c) {
        return Err("Temperature must be between -60 and 60 °C");
    }
    if !(0.0..=100.0).contains(&day.humidity_percent) {
        return Err("Humidity must be between 0 and 100%");
    }
    if day.rainfall_mm < 0.0 {
        return Err("Rainfall cannot be negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GpsCoordinates;
    use rust_decimal::Decimal;

    // ========================================================================
    // Raster Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_band_shapes() {
        let a = Grid::filled(3, 2, 0.1);
        let b = Grid::filled(3, 2, 0.4);
        let c = Grid::filled(2, 3, 0.4);
        assert!(validate_band_shapes(&a, &b).is_ok());
        assert!(validate_band_shapes(&a, &c).is_err());
    }

    #[test]
    fn test_validate_finite_grid() {
        let mut grid = Grid::filled(2, 2, 0.5);
        assert!(validate_finite_grid(&grid).is_ok());
        grid.set(1, 1, f64::NAN);
        assert!(validate_finite_grid(&grid).is_err());
    }

    #[test]
    fn test_validate_index_range() {
        let mut grid = Grid::filled(2, 2, 1.0);
        assert!(validate_index_range(&grid).is_ok());
        grid.set(0, 0, -1.01);
        assert!(validate_index_range(&grid).is_err());
    }

    // ========================================================================
    // Field Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_zone_percentages() {
        let ok = ZoneStatistics::from_percentages(10.0, 20.0, 30.0, 40.0);
        assert!(validate_zone_percentages(&ok).is_ok());
        let short = ZoneStatistics::from_percentages(10.0, 20.0, 30.0, 30.0);
        assert!(validate_zone_percentages(&short).is_err());
        let negative = ZoneStatistics::from_percentages(-10.0, 30.0, 40.0, 40.0);
        assert!(validate_zone_percentages(&negative).is_err());
    }

    #[test]
    fn test_validate_field_area() {
        assert!(validate_field_area(0.0).is_ok());
        assert!(validate_field_area(12.5).is_ok());
        assert!(validate_field_area(-1.0).is_err());
        assert!(validate_field_area(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_boundary() {
        let p = |lat: i64, lon: i64| GpsCoordinates::new(Decimal::from(lat), Decimal::from(lon));
        let closed = FieldBoundary::new(vec![p(10, 70), p(10, 71), p(11, 71), p(10, 70)]);
        assert!(validate_boundary(&closed).is_ok());

        let open = FieldBoundary::new(vec![p(10, 70), p(10, 71), p(11, 71), p(11, 70)]);
        assert!(validate_boundary(&open).is_err());

        let too_short = FieldBoundary::new(vec![p(10, 70), p(10, 71), p(10, 70)]);
        assert!(validate_boundary(&too_short).is_err());

        let off_globe = FieldBoundary::new(vec![p(95, 70), p(10, 71), p(11, 71), p(95, 70)]);
        assert!(validate_boundary(&off_globe).is_err());
    }

    // ========================================================================
    // Weather Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_weather_day() {
        assert!(validate_weather_day(&WeatherDay::new(30.0, 60.0, 0.0)).is_ok());
        assert!(validate_weather_day(&WeatherDay::new(30.0, 120.0, 0.0)).is_err());
        assert!(validate_weather_day(&WeatherDay::new(30.0, 60.0, -2.0)).is_err());
        assert!(validate_weather_day(&WeatherDay::new(f64::NAN, 60.0, 0.0)).is_err());
    }

    // ========================================================================
    // Property Tests
    // ========================================================================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// Any split of the field into four shares passes
            #[test]
            fn prop_complete_split_is_valid(a in 0.0f64..=100.0, b in 0.0f64..=1.0, c in 0.0f64..=1.0) {
                let high = (100.0 - a) * b;
                let moderate = (100.0 - a - high) * c;
                let healthy = 100.0 - a - high - moderate;
                let stats = ZoneStatistics::from_percentages(a, high, moderate, healthy.max(0.0));
                prop_assert!(validate_zone_percentages(&stats).is_ok());
            }

            /// Plausible weather always validates
            #[test]
            fn prop_plausible_weather_is_valid(t in -40.0f64..50.0, h in 0.0f64..=100.0, r in 0.0f64..300.0) {
                prop_assert!(validate_weather_day(&WeatherDay::new(t, h, r)).is_ok());
            }
        }
    }
}
