//! Shared types and models for the Irrigation Advisor
//!
//! This crate contains the value objects exchanged between the analysis
//! backend, the browser calculators (via WASM), and external collaborators.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
