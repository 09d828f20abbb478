//! WebAssembly module for the Irrigation Advisor
//!
//! Provides client-side computation for:
//! - Per-pixel vegetation index and stress zone lookups
//! - Crop water requirements and index assessments
//! - Reference evapotranspiration, deficit severity labels and health scores
//! - Offline validation of zone statistics

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("irrigation advisor ready"));
}

fn parse_zone(name: &str) -> Result<StressZone, String> {
    StressZone::ALL
        .into_iter()
        .find(|z| z.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| format!("Unknown stress zone '{}'", name))
}

fn crop(crop_type: &str) -> Result<&'static CropProfile, String> {
    find_crop(crop_type).ok_or_else(|| {
        format!(
            "Unknown crop type '{}'. Available: {}",
            crop_type,
            crop_ids().join(", ")
        )
    })
}

fn water_requirement_json(crop_type: &str, field_area_ha: f64, zone: &str) -> Result<String, String> {
    validate_field_area(field_area_ha)?;
    let requirement = crop(crop_type)?.water_requirement(field_area_ha, parse_zone(zone)?);
    serde_json::to_string(&requirement).map_err(|e| e.to_string())
}

fn index_assessment_json(crop_type: &str, index_value: f64) -> Result<String, String> {
    let assessment = crop(crop_type)?.assess_index(index_value);
    serde_json::to_string(&assessment).map_err(|e| e.to_string())
}

/// Vegetation index of a single red/NIR reflectance pair
#[wasm_bindgen]
pub fn compute_index_value(red: f64, nir: f64) -> f64 {
    index_value(red, nir)
}

/// Stress zone name for one index value after recent rainfall
#[wasm_bindgen]
pub fn classify_index_value(index_value: f64, rainfall_mm: f64) -> String {
    ZoneThresholds::default()
        .for_rainfall(rainfall_mm)
        .classify(index_value)
        .to_string()
}

/// Zone codes (0 = critical .. 3 = healthy) for a row-major index buffer
#[wasm_bindgen]
pub fn classify_index_buffer(values: &[f64], rainfall_mm: f64) -> Vec<u8> {
    let thresholds = ZoneThresholds::default().for_rainfall(rainfall_mm);
    values.iter().map(|&v| thresholds.classify(v).code()).collect()
}

/// 0-100 field health score from a mean index
#[wasm_bindgen]
pub fn field_health_score(mean_index: f64) -> f64 {
    health_score(mean_index)
}

/// "Low", "Moderate" or "High" for a weekly deficit in mm
#[wasm_bindgen]
pub fn deficit_severity(deficit_mm: f64) -> String {
    DeficitSeverity::from_deficit(deficit_mm, DEFAULT_MODERATE_DEFICIT_MM, DEFAULT_HIGH_DEFICIT_MM)
        .to_string()
}

/// Weekly water requirement for a crop at a stress level, as JSON
#[wasm_bindgen]
pub fn crop_water_requirement(crop_type: &str, field_area_ha: f64, zone: &str) -> Result<String, JsValue> {
    water_requirement_json(crop_type, field_area_ha, zone).map_err(|e| JsValue::from_str(&e))
}

/// Index value compared with the crop's optimal range, as JSON
#[wasm_bindgen]
pub fn assess_crop_index(crop_type: &str, index_value: f64) -> Result<String, JsValue> {
    index_assessment_json(crop_type, index_value).map_err(|e| JsValue::from_str(&e))
}

/// Daily reference evapotranspiration (mm) for a mean temperature
#[wasm_bindgen]
pub fn reference_evapotranspiration(temperature_c: f64) -> f64 {
    reference_et0(temperature_c)
}

/// Supported crop identifiers
#[wasm_bindgen]
pub fn available_crops() -> js_sys::Array {
    crop_ids().into_iter().map(JsValue::from_str).collect()
}

/// Validate zone statistics JSON (percentages non-negative, summing to 100)
#[wasm_bindgen]
pub fn validate_zone_statistics(stats_json: &str) -> bool {
    serde_json::from_str::<ZoneStatistics>(stats_json)
        .map(|stats| validate_zone_percentages(&stats).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_index_value() {
        assert!((compute_index_value(0.1, 0.5) - 0.4 / 0.6).abs() < 1e-12);
        assert_eq!(compute_index_value(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_classify_index_value() {
        assert_eq!(classify_index_value(0.2, 0.0), "Critical");
        assert_eq!(classify_index_value(0.45, 0.0), "High");
        assert_eq!(classify_index_value(0.55, 0.0), "Moderate");
        assert_eq!(classify_index_value(0.55, 30.0), "Healthy");
    }

    #[test]
    fn test_classify_index_buffer() {
        assert_eq!(classify_index_buffer(&[0.1, 0.4, 0.55, 0.9], 0.0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_deficit_severity() {
        assert_eq!(deficit_severity(10.0), "Low");
        assert_eq!(deficit_severity(25.0), "Moderate");
        assert_eq!(deficit_severity(40.0), "High");
    }

    #[test]
    fn test_reference_evapotranspiration() {
        assert!((reference_evapotranspiration(30.0) * 7.0 - 21.1).abs() < 0.05);
        assert_eq!(reference_evapotranspiration(-2.0), 0.0);
    }

    #[test]
    fn test_health_score() {
        assert!((field_health_score(0.7) - 85.0).abs() < 1e-9);
        assert_eq!(field_health_score(-1.0), 0.0);
    }

    #[test]
    fn test_water_requirement_json() {
        let json = water_requirement_json("rice", 2.0, "critical").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["water_mm"].as_f64().unwrap() > 50.0);
        assert!(water_requirement_json("rice", 2.0, "parched").is_err());
        assert!(water_requirement_json("durian", 2.0, "high").is_err());
        assert!(water_requirement_json("rice", -2.0, "high").is_err());
    }

    #[test]
    fn test_index_assessment_json() {
        let json = index_assessment_json("wheat", 0.7).unwrap();
        assert!(json.contains("\"status\""));
        assert!(index_assessment_json("durian", 0.7).is_err());
    }

    #[test]
    fn test_validate_zone_statistics() {
        let ok = serde_json::to_string(&ZoneStatistics::from_percentages(10.0, 20.0, 30.0, 40.0)).unwrap();
        assert!(validate_zone_statistics(&ok));
        let bad = serde_json::to_string(&ZoneStatistics::from_percentages(10.0, 20.0, 30.0, 10.0)).unwrap();
        assert!(!validate_zone_statistics(&bad));
        assert!(!validate_zone_statistics("not json"));
    }
}
