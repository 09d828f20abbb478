//! Synthetic training data for the stress forecast classifier
//!
//! Samples plausible field conditions, injects the agronomic correlations
//! between rain, heat and drought, and labels each sample from an additive
//! stress score. Fully determined by the seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::decision_tree::Dataset;
use shared::{RiskLevel, StressFeatures, FEATURE_COUNT};

/// Exponential draw by inverse transform
pub(crate) fn exponential(rng: &mut StdRng, scale: f64) -> f64 {
    let u: f64 = rng.gen();
    -scale * (1.0 - u).ln()
}

/// Poisson draw (Knuth); fine for small means
fn poisson(rng: &mut StdRng, lambda: f64) -> u32 {
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0;
    loop {
        p *= rng.gen::<f64>();
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

/// One sample of field conditions with the correlations applied
pub fn sample_conditions(rng: &mut StdRng) -> StressFeatures {
    let mut index = rng.gen_range(0.1..0.9);
    let temperature = rng.gen_range(15.0..45.0);
    let mut humidity = rng.gen_range(20.0..90.0);
    let rainfall = exponential(rng, 15.0).min(100.0);
    let mut days_since_rain = poisson(rng, 7.0).min(30);

    if rainfall > 20.0 {
        index = f64::min(index + rng.gen_range(0.1..0.3), 0.9);
        days_since_rain = days_since_rain.saturating_sub(5);
        humidity = f64::min(humidity + rng.gen_range(10.0..20.0), 90.0);
    }

    if temperature > 35.0 {
        index = f64::max(index - rng.gen_range(0.1..0.25), 0.1);
        humidity = f64::max(humidity - rng.gen_range(10.0..20.0), 20.0);
    }

    if days_since_rain > 15 {
        index = f64::max(index - rng.gen_range(0.15..0.35), 0.1);
        humidity = f64::max(humidity - rng.gen_range(15.0..25.0), 20.0);
    }

    StressFeatures {
        vegetation_index: index,
        temperature_c: temperature,
        humidity_percent: humidity,
        cumulative_rainfall_mm: rainfall,
        days_since_rain: f64::from(days_since_rain),
    }
}

/// Additive stress score from field conditions
pub fn stress_score(features: &StressFeatures) -> u32 {
    let mut score = 0;

    score += match features.vegetation_index {
        v if v < 0.3 => 3,
        v if v < 0.5 => 2,
        v if v < 0.6 => 1,
        _ => 0,
    };
    score += match features.temperature_c {
        t if t > 38.0 => 2,
        t if t > 32.0 => 1,
        _ => 0,
    };
    score += match features.humidity_percent {
        h if h < 35.0 => 2,
        h if h < 50.0 => 1,
        _ => 0,
    };
    score += match features.cumulative_rainfall_mm {
        r if r < 5.0 => 2,
        r if r < 15.0 => 1,
        _ => 0,
    };
    score += match features.days_since_rain {
        d if d > 20.0 => 2,
        d if d > 10.0 => 1,
        _ => 0,
    };

    score
}

/// Risk label for a stress score
pub fn label_for_score(score: u32) -> RiskLevel {
    if score >= 7 {
        RiskLevel::High
    } else if score >= 4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// `n_samples` labelled samples over the 5-feature contract
pub fn generate(n_samples: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let sample = sample_conditions(&mut rng);
        labels.push(label_for_score(stress_score(&sample)).class_index());
        features.push(sample.to_array().to_vec());
    }

    Dataset {
        features,
        labels,
        n_features: FEATURE_COUNT,
        n_classes: RiskLevel::ALL.len(),
    }
}
