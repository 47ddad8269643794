//! UI element detection adapter for croscope.
//!
//! Talks to a self-hosted detection service over HTTP and converts labeled
//! regions into CRO scores, recommendations and layout insights.

mod adapter;
mod insights;
mod types;

pub use adapter::{MODEL_ID, YoloVision};
