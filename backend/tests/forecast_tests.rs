//! Tests for the stress forecast model and service
//! Verifies training, persistence, the model handoff and forecast invariants

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use irrigation_backend::config::ForecastConfig;
use irrigation_backend::error::AppError;
use irrigation_backend::ml::synthetic;
use irrigation_backend::ml::StressModel;
use irrigation_backend::services::{ModelStatus, StressForecastService};
use proptest::prelude::*;
use shared::{ForecastSource, RiskLevel, WeatherDay, FEATURE_COUNT};
use uuid::Uuid;

fn scratch_artifact() -> PathBuf {
    std::env::temp_dir()
        .join(format!("irrigation-forecast-{}", Uuid::new_v4()))
        .join("stress_forecast.json")
}

/// Small, fast training configuration
fn small_config() -> ForecastConfig {
    ForecastConfig {
        n_samples: 600,
        n_trees: 15,
        max_depth: 6,
        artifact_path: scratch_artifact(),
        ..ForecastConfig::default()
    }
}

fn trained_service() -> &'static StressForecastService {
    static SERVICE: OnceLock<StressForecastService> = OnceLock::new();
    SERVICE.get_or_init(|| {
        let config = small_config();
        let model = StressModel::train(&config).unwrap();
        StressForecastService::with_model(config, model)
    })
}

fn dry_heat(days: usize) -> Vec<WeatherDay> {
    (0..days).map(|_| WeatherDay::new(39.0, 25.0, 0.0)).collect()
}

// =============================================================================
// Training and persistence
// =============================================================================

mod training {
    use super::*;

    #[test]
    fn synthetic_data_is_reproducible() {
        let a = synthetic::generate(300, 42);
        let b = synthetic::generate(300, 42);
        assert_eq!(a, b);
        assert_eq!(a.n_features, FEATURE_COUNT);
        assert_eq!(a.n_classes, 3);
    }

    #[test]
    fn model_learns_the_labelling_rule() {
        let model = StressModel::train(&small_config()).unwrap();
        assert!(model.accuracy > 0.6, "accuracy {}", model.accuracy);
        assert_eq!(model.train_samples + model.test_samples, 600);
        assert!(model.test_samples >= 120 && model.test_samples <= 121);

        let importance: f64 = model.feature_importance.to_array().iter().sum();
        assert!((importance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_forest() {
        let config = small_config();
        let a = StressModel::train(&config).unwrap();
        let b = StressModel::train(&config).unwrap();
        assert_eq!(a.forest(), b.forest());
        assert_eq!(a.accuracy, b.accuracy);
    }

    #[test]
    fn artifact_round_trip() {
        let config = small_config();
        let model = StressModel::train(&config).unwrap();
        model.save(&config.artifact_path).unwrap();

        let restored = StressModel::load(&config.artifact_path).unwrap();
        assert_eq!(restored.model_id, model.model_id);
        assert_eq!(restored.forest().n_trees(), model.forest().n_trees());
        let sample = synthetic::generate(50, 7);
        for row in &sample.features {
            assert_eq!(restored.forest().predict(row), model.forest().predict(row));
        }

        let service = StressForecastService::new(config);
        assert!(service.load_artifact().unwrap());
        assert!(service.is_ready());
    }

    #[test]
    fn missing_artifact_is_not_an_error() {
        let service = StressForecastService::new(small_config());
        assert!(!service.load_artifact().unwrap());
        assert!(!service.is_ready());
    }

    /// Save a trained model, rewrite its JSON and try to load it back
    fn load_tampered(tamper: impl Fn(&mut serde_json::Value)) -> Result<StressModel, AppError> {
        let config = small_config();
        StressModel::train(&config)
            .unwrap()
            .save(&config.artifact_path)
            .unwrap();
        let mut json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&config.artifact_path).unwrap()).unwrap();
        tamper(&mut json);
        std::fs::write(&config.artifact_path, serde_json::to_vec(&json).unwrap()).unwrap();
        StressModel::load(&config.artifact_path)
    }

    #[test]
    fn tampered_artifacts_are_rejected() {
        assert!(load_tampered(|json| assert_eq!(json["forest"]["trees"][0]["nodes"][0]["kind"], "split")).is_ok());

        let cases: Vec<Box<dyn Fn(&mut serde_json::Value)>> = vec![
            Box::new(|json| json["forest"]["trees"][0]["nodes"] = serde_json::json!([])),
            Box::new(|json| json["forest"]["trees"][0]["nodes"][0]["left"] = serde_json::json!(100_000)),
            Box::new(|json| json["forest"]["trees"][0]["nodes"][0]["right"] = serde_json::json!(0)),
            Box::new(|json| json["forest"]["trees"] = serde_json::json!([])),
            Box::new(|json| json["forest"]["n_classes"] = serde_json::json!(5)),
            Box::new(|json| {
                let nodes = json["forest"]["trees"][0]["nodes"].as_array_mut().unwrap();
                let leaf = nodes.iter_mut().find(|n| n["kind"] == "leaf").unwrap();
                leaf["probabilities"] = serde_json::json!([1.0]);
            }),
        ];
        for tamper in cases {
            let result = load_tampered(tamper);
            assert!(
                matches!(result, Err(AppError::InvalidArtifact(_))),
                "tampered artifact loaded: {:?}",
                result.map(|m| m.model_id)
            );
        }
    }

    #[test]
    fn service_refuses_tampered_artifact() {
        let config = small_config();
        StressModel::train(&config).unwrap().save(&config.artifact_path).unwrap();
        let mut json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&config.artifact_path).unwrap()).unwrap();
        json["forest"]["trees"][0]["nodes"][0]["left"] = serde_json::json!(0);
        std::fs::write(&config.artifact_path, serde_json::to_vec(&json).unwrap()).unwrap();

        let service = StressForecastService::new(config);
        assert!(matches!(service.load_artifact(), Err(AppError::InvalidArtifact(_))));
        assert!(!service.is_ready());
    }

    #[test]
    fn corrupt_artifact_is_reported() {
        let config = small_config();
        let path = config.artifact_path.clone();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(StressModel::load(&path), Err(AppError::Serialization(_))));
    }
}

// =============================================================================
// Model handoff
// =============================================================================

mod handoff {
    use super::*;

    #[tokio::test]
    async fn background_training_publishes_the_model() {
        // large enough that training outlives the assertions below
        let config = ForecastConfig {
            n_samples: 3000,
            n_trees: 40,
            ..small_config()
        };
        let service = Arc::new(StressForecastService::new(config));
        assert_eq!(service.status(), ModelStatus::Untrained);

        let handle = service.spawn_training().expect("first training run starts");
        assert!(service.spawn_training().is_none());
        assert!(service.is_training());
        assert_eq!(service.status(), ModelStatus::Training);

        let model = handle.await.unwrap().unwrap();
        assert!(!service.is_training());
        assert!(service.is_ready());
        match service.status() {
            ModelStatus::Ready { model_id, training, .. } => {
                assert_eq!(model_id, model.model_id);
                assert!(!training);
            }
            other => panic!("expected ready model, got {:?}", other),
        }

        let forecast = service.predict(0.5, &dry_heat(3)).unwrap();
        assert!(!forecast.is_fallback());
    }

    #[tokio::test]
    async fn inference_keeps_serving_during_retraining() {
        let first = StressModel::train(&small_config()).unwrap();
        let first_id = first.model_id;
        let config = ForecastConfig {
            n_samples: 3000,
            n_trees: 40,
            seed: 7,
            ..small_config()
        };
        let service = Arc::new(StressForecastService::with_model(config, first));

        let handle = service.spawn_training().expect("retraining starts");
        assert!(service.is_training());

        // the published model answers while the replacement is being grown
        let during = service.predict(0.5, &dry_heat(3)).unwrap();
        assert_eq!(during.source, ForecastSource::Model { model_id: first_id });
        match service.status() {
            ModelStatus::Ready { model_id, training, .. } => {
                assert_eq!(model_id, first_id);
                assert!(training);
            }
            other => panic!("expected the first model to stay published, got {:?}", other),
        }

        let second = handle.await.unwrap().unwrap();
        assert_ne!(second.model_id, first_id);
        assert_eq!(service.current_model().unwrap().model_id, second.model_id);
        assert_eq!(second.forest().n_trees(), 40);

        let after = service.predict(0.5, &dry_heat(3)).unwrap();
        assert_eq!(after.source, ForecastSource::Model { model_id: second.model_id });
    }

    #[test]
    fn fallback_before_training() {
        let service = StressForecastService::new(small_config());
        assert!(matches!(
            service.predict(0.5, &dry_heat(3)),
            Err(AppError::ModelUnavailable)
        ));
        let forecast = service.forecast_or_fallback(0.5, &dry_heat(3)).unwrap();
        assert!(forecast.is_fallback());
        assert!(forecast.daily_predictions.is_empty());
        assert_eq!(forecast.summary.overall_risk, RiskLevel::Medium);
    }
}

// =============================================================================
// Forecast behavior
// =============================================================================

mod forecasting {
    use super::*;

    #[test]
    fn horizon_is_capped_at_seven_days() {
        let forecast = trained_service().predict(0.6, &dry_heat(10)).unwrap();
        assert_eq!(forecast.daily_predictions.len(), 7);
        let days: Vec<u8> = forecast.daily_predictions.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn heat_lowers_the_estimated_index() {
        let forecast = trained_service().predict(0.6, &dry_heat(4)).unwrap();
        let estimates: Vec<f64> = forecast
            .daily_predictions
            .iter()
            .map(|d| d.estimated_index)
            .collect();
        for pair in estimates.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert!(estimates[0] < 0.6);
    }

    #[test]
    fn rain_resets_the_dry_spell() {
        let weather = vec![
            WeatherDay::new(28.0, 60.0, 0.0),
            WeatherDay::new(28.0, 60.0, 0.0),
            WeatherDay::new(26.0, 80.0, 18.0),
            WeatherDay::new(28.0, 60.0, 0.0),
        ];
        let forecast = trained_service().predict(0.5, &weather).unwrap();
        let dry: Vec<u32> = forecast
            .daily_predictions
            .iter()
            .map(|d| d.days_since_rain)
            .collect();
        assert_eq!(dry, vec![1, 2, 0, 1]);
        assert_eq!(forecast.daily_predictions[2].cumulative_rainfall_mm, 18.0);
        assert_eq!(forecast.daily_predictions[3].cumulative_rainfall_mm, 16.0);
    }

    #[test]
    fn empty_weather_gives_empty_forecast() {
        let forecast = trained_service().predict(0.5, &[]).unwrap();
        assert!(forecast.daily_predictions.is_empty());
        assert_eq!(forecast.summary.high_stress_days, 0);
        assert_eq!(forecast.summary.overall_risk, RiskLevel::Low);
    }

    #[test]
    fn invalid_weather_is_rejected() {
        let weather = vec![WeatherDay::new(30.0, 140.0, 0.0)];
        assert!(matches!(
            trained_service().predict(0.5, &weather),
            Err(AppError::Validation { .. })
        ));
    }
}

// =============================================================================
// Properties
// =============================================================================

mod properties {
    use super::*;

    fn weather_strategy() -> impl Strategy<Value = WeatherDay> {
        (10.0f64..45.0, 10.0f64..100.0, 0.0f64..40.0)
            .prop_map(|(t, h, r)| WeatherDay::new(t, h, r))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Forecast length, index bounds and summary agree with the daily rows
        #[test]
        fn prop_forecast_invariants(
            index in -1.0f64..=1.0,
            weather in proptest::collection::vec(weather_strategy(), 0..12),
        ) {
            let forecast = trained_service().predict(index, &weather).unwrap();
            let days = &forecast.daily_predictions;
            prop_assert_eq!(days.len(), weather.len().min(7));

            for day in days {
                prop_assert!((0.1..=0.9).contains(&day.estimated_index));
                prop_assert!((0.0..=1.0).contains(&day.stress_probability));
                prop_assert!((0.0..=1.0).contains(&day.confidence_score));
                prop_assert!(day.cumulative_rainfall_mm >= 0.0);
            }

            let high = days.iter().filter(|d| d.risk_level == RiskLevel::High).count();
            prop_assert_eq!(forecast.summary.high_stress_days, high);
            let expected = if high >= 3 {
                RiskLevel::High
            } else if high >= 1 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };
            prop_assert_eq!(forecast.summary.overall_risk, expected);
        }
    }
}
