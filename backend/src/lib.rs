//! Vegetation stress analysis and irrigation decision engine
//!
//! Turns red/near-infrared reflectance (or a precomputed index raster) plus
//! weather into stress zones, a water deficit estimate, ranked irrigation
//! recommendations, an ROI projection and a 7-day stress forecast.

pub mod config;
pub mod error;
pub mod ml;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
