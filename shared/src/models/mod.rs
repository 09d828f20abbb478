//! Domain models for the Irrigation Advisor

mod analysis;
mod crop;
mod deficit;
mod forecast;
mod plan;
mod recommendation;
mod roi;
mod vegetation;
mod zones;

pub use analysis::*;
pub use crop::*;
pub use deficit::*;
pub use forecast::*;
pub use plan::*;
pub use recommendation::*;
pub use roi::*;
pub use vegetation::*;
pub use zones::*;
