//! Error types for the croscope protocol layer.

mod analysis;
mod cache;
mod capture;
mod extraction;
mod model;
mod registry;

pub use analysis::*;
pub use cache::*;
pub use capture::*;
pub use extraction::*;
pub use model::*;
pub use registry::*;
