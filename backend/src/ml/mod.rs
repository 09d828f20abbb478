//! Stress forecast model: training pipeline and persisted artifact

pub mod decision_tree;
pub mod random_forest;
pub mod synthetic;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::ForecastConfig;
use crate::error::{AppError, AppResult};
use decision_tree::TreeParams;
use random_forest::{ForestParams, RandomForest, RfPrediction};
use shared::{FeatureImportance, RiskLevel, StressFeatures, FEATURE_COUNT};

/// A trained classifier plus the metadata published with it.
///
/// Immutable once built; retraining produces a new instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressModel {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    /// Held-out accuracy
    pub accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub feature_importance: FeatureImportance,
    forest: RandomForest,
}

impl StressModel {
    /// Generate synthetic data, split 80/20, grow the forest and score it
    pub fn train(config: &ForecastConfig) -> AppResult<Self> {
        let data = synthetic::generate(config.n_samples, config.seed);
        if data.len() < 2 {
            return Err(AppError::Training(
                "at least two samples are needed to train".into(),
            ));
        }

        let mut order: Vec<usize> = (0..data.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(config.seed));
        let n_test = ((data.len() as f64 * config.test_fraction).ceil() as usize)
            .clamp(1, data.len() - 1);
        let (test_rows, train_rows) = order.split_at(n_test);
        let train = data.select(train_rows);
        let test = data.select(test_rows);

        let params = ForestParams {
            n_trees: config.n_trees,
            tree: TreeParams {
                max_depth: config.max_depth,
                min_samples_split: config.min_samples_split,
                min_samples_leaf: config.min_samples_leaf,
                max_features: None,
            },
            bootstrap: true,
            seed: config.seed,
        };

        let forest = RandomForest::fit(&train, &params).map_err(AppError::Training)?;
        let accuracy = forest.accuracy(&test);

        let importances = forest.feature_importances();
        let mut snapshot = [0.0; FEATURE_COUNT];
        snapshot.copy_from_slice(&importances[..FEATURE_COUNT]);

        info!(
            accuracy,
            trees = forest.n_trees(),
            avg_depth = forest.avg_depth(),
            "Stress forecast model trained"
        );

        Ok(Self {
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            accuracy,
            train_samples: train.len(),
            test_samples: test.len(),
            feature_importance: FeatureImportance::from_array(snapshot),
            forest,
        })
    }

    pub fn predict(&self, features: &StressFeatures) -> RfPrediction {
        self.forest.predict_with_probabilities(&features.to_array())
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Write the artifact next to its final path, then rename into place
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(self)?)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), model_id = %self.model_id, "Saved stress forecast model");
        Ok(())
    }

    /// Read an artifact and check it is safe to run inference on
    pub fn load(path: &Path) -> AppResult<Self> {
        let bytes = fs::read(path)?;
        let model: Self = serde_json::from_slice(&bytes)?;
        if model.forest.n_features() != FEATURE_COUNT {
            return Err(AppError::InvalidArtifact(format!(
                "artifact expects {} features, classifier contract has {}",
                model.forest.n_features(),
                FEATURE_COUNT
            )));
        }
        if model.forest.n_classes() != RiskLevel::ALL.len() {
            return Err(AppError::InvalidArtifact(format!(
                "artifact predicts {} classes, expected {}",
                model.forest.n_classes(),
                RiskLevel::ALL.len()
            )));
        }
        model.forest.validate().map_err(AppError::InvalidArtifact)?;
        info!(path = %path.display(), model_id = %model.model_id, "Loaded stress forecast model");
        Ok(model)
    }
}
