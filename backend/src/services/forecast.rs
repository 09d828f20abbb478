//! Stress forecast service
//!
//! Owns the trained classifier. Training runs on the blocking pool and
//! publishes a fresh `Arc` under a write lock when it finishes; inference
//! clones the current `Arc` under a read lock, so it never observes a
//! half-built model and never waits for training.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ForecastConfig;
use crate::error::{AppError, AppResult};
use crate::ml::synthetic::exponential;
use crate::ml::StressModel;
use shared::{
    round_to, validate_weather_day, DailyStressPrediction, ForecastSource, ForecastSummary,
    RiskLevel, StressFeatures, StressForecast, WeatherDay,
};

/// Readiness of the forecast model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    Ready {
        model_id: Uuid,
        trained_at: DateTime<Utc>,
        accuracy: f64,
        training: bool,
    },
    Training,
    Untrained,
}

/// Clears the training flag when dropped, including on a panicking run
struct TrainingFlag<'a>(&'a AtomicBool);

impl Drop for TrainingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct StressForecastService {
    config: ForecastConfig,
    model: RwLock<Option<Arc<StressModel>>>,
    training: AtomicBool,
}

impl StressForecastService {
    /// Service with no model yet
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
            training: AtomicBool::new(false),
        }
    }

    /// Service with an already trained model
    pub fn with_model(config: ForecastConfig, model: StressModel) -> Self {
        let service = Self::new(config);
        service.publish(model);
        service
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Option<Arc<StressModel>>> {
        self.model.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Arc<StressModel>>> {
        self.model.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the published model
    pub fn publish(&self, model: StressModel) -> Arc<StressModel> {
        let model = Arc::new(model);
        *self.write_slot() = Some(Arc::clone(&model));
        model
    }

    pub fn current_model(&self) -> Option<Arc<StressModel>> {
        self.read_slot().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.read_slot().is_some()
    }

    pub fn is_training(&self) -> bool {
        self.training.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> ModelStatus {
        match self.current_model() {
            Some(model) => ModelStatus::Ready {
                model_id: model.model_id,
                trained_at: model.trained_at,
                accuracy: model.accuracy,
                training: self.is_training(),
            },
            None if self.is_training() => ModelStatus::Training,
            None => ModelStatus::Untrained,
        }
    }

    /// Publish the persisted artifact if one exists.
    ///
    /// Returns `Ok(false)` when there is no artifact on disk.
    pub fn load_artifact(&self) -> AppResult<bool> {
        let path = &self.config.artifact_path;
        if !path.exists() {
            debug!(path = %path.display(), "No stress model artifact found");
            return Ok(false);
        }
        let model = StressModel::load(path)?;
        self.publish(model);
        Ok(true)
    }

    /// Train, persist and publish synchronously.
    ///
    /// A failed write is logged; the freshly trained model is still published.
    pub fn train_blocking(&self) -> AppResult<Arc<StressModel>> {
        info!(
            samples = self.config.n_samples,
            trees = self.config.n_trees,
            "Training stress forecast model"
        );
        let model = StressModel::train(&self.config)?;
        if let Err(e) = model.save(&self.config.artifact_path) {
            warn!(error = %e, "Could not persist stress forecast model");
        }
        Ok(self.publish(model))
    }

    /// Start training on the blocking pool.
    ///
    /// Returns `None` when a training run is already in flight.
    pub fn spawn_training(self: &Arc<Self>) -> Option<JoinHandle<AppResult<Arc<StressModel>>>> {
        if self
            .training
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Stress model training already in progress");
            return None;
        }

        let service = Arc::clone(self);
        Some(tokio::task::spawn_blocking(move || {
            let _flag = TrainingFlag(&service.training);
            let result = service.train_blocking();
            if let Err(e) = &result {
                error!(error = %e, "Stress model training failed");
            }
            result
        }))
    }

    /// Daily risk predictions for up to `max_forecast_days` days.
    ///
    /// Fails with [`AppError::ModelUnavailable`] until a model is published.
    pub fn predict(&self, current_index: f64, forecast: &[WeatherDay]) -> AppResult<StressForecast> {
        if !current_index.is_finite() {
            return Err(AppError::validation(
                "current_index",
                "Vegetation index must be a finite number",
            ));
        }
        for day in forecast {
            validate_weather_day(day).map_err(|e| AppError::validation("weather_forecast", e))?;
        }
        let model = self.current_model().ok_or(AppError::ModelUnavailable)?;
        let c = &self.config;

        let mut predictions = Vec::new();
        let mut days_since_rain = 0u32;
        let mut cumulative_rainfall = 0.0;
        let mut estimated_index = current_index;

        for (i, weather) in forecast.iter().take(c.max_forecast_days).enumerate() {
            let day = (i + 1) as f64;

            if weather.rainfall_mm > c.rain_reset_mm {
                days_since_rain = 0;
                cumulative_rainfall = weather.rainfall_mm;
            } else {
                days_since_rain += 1;
                cumulative_rainfall = f64::max(0.0, cumulative_rainfall - c.rainfall_decay_mm);
            }

            // compounds from the previous day's estimate
            if weather.rainfall_mm > c.recovery_rain_mm {
                estimated_index += c.recovery_rate * day;
            } else if weather.temperature_c > c.heat_stress_c || days_since_rain > c.dry_spell_days {
                estimated_index -= c.decline_rate * day;
            }
            estimated_index = estimated_index.clamp(c.index_floor, c.index_ceiling);

            let features = StressFeatures {
                vegetation_index: estimated_index,
                temperature_c: weather.temperature_c,
                humidity_percent: weather.humidity_percent,
                cumulative_rainfall_mm: cumulative_rainfall,
                days_since_rain: f64::from(days_since_rain),
            };
            let prediction = model.predict(&features);
            let risk_level = RiskLevel::from_class_index(prediction.class).ok_or_else(|| {
                AppError::Internal(format!("classifier returned class {}", prediction.class))
            })?;

            predictions.push(DailyStressPrediction {
                day: (i + 1) as u8,
                risk_level,
                stress_probability: prediction.probabilities[prediction.class],
                confidence_score: prediction.confidence,
                estimated_index: round_to(estimated_index, 3),
                weather: *weather,
                days_since_rain,
                cumulative_rainfall_mm: cumulative_rainfall,
            });
        }

        let summary = self.summarize(&predictions);
        debug!(
            days = predictions.len(),
            overall = %summary.overall_risk,
            "Stress forecast produced"
        );

        Ok(StressForecast {
            daily_predictions: predictions,
            summary,
            feature_importance: model.feature_importance,
            source: ForecastSource::Model {
                model_id: model.model_id,
            },
        })
    }

    /// [`predict`](Self::predict), or the static fallback when no model is ready
    pub fn forecast_or_fallback(&self, current_index: f64, forecast: &[WeatherDay]) -> AppResult<StressForecast> {
        match self.predict(current_index, forecast) {
            Err(AppError::ModelUnavailable) => {
                warn!("Stress model not ready, using fallback forecast");
                Ok(StressForecast::fallback())
            }
            other => other,
        }
    }

    fn summarize(&self, predictions: &[DailyStressPrediction]) -> ForecastSummary {
        let high_stress_days = predictions
            .iter()
            .filter(|p| p.risk_level == RiskLevel::High)
            .count();

        let overall_risk = if high_stress_days >= self.config.high_risk_days {
            RiskLevel::High
        } else if high_stress_days >= 1 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let mean = |f: fn(&DailyStressPrediction) -> f64| {
            if predictions.is_empty() {
                0.0
            } else {
                round_to(
                    predictions.iter().map(f).sum::<f64>() / predictions.len() as f64,
                    3,
                )
            }
        };

        ForecastSummary {
            overall_risk,
            high_stress_days,
            average_stress_probability: mean(|p| p.stress_probability),
            recommendation: overall_risk.recommendation().to_string(),
            confidence: mean(|p| p.confidence_score),
        }
    }
}

/// Deterministic stand-in forecast derived from current conditions.
///
/// The same conditions always give the same days: temperature within
/// ±3 °C, humidity within ±10 points, exponential rainfall (mean 5 mm).
pub fn synthetic_weather(current: &WeatherDay, days: usize) -> Vec<WeatherDay> {
    let seed = current.temperature_c.to_bits()
        ^ current.humidity_percent.to_bits().rotate_left(21)
        ^ current.rainfall_mm.to_bits().rotate_left(42);
    let mut rng = StdRng::seed_from_u64(seed);

    (0..days)
        .map(|_| {
            let temperature = current.temperature_c + rng.gen_range(-3.0..=3.0);
            let humidity = (current.humidity_percent + rng.gen_range(-10.0..=10.0)).clamp(0.0, 100.0);
            let rainfall = round_to(exponential(&mut rng, 5.0), 1);
            WeatherDay::new(round_to(temperature, 1), round_to(humidity, 1), rainfall)
        })
        .collect()
}
