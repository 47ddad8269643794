//! Claude vision adapter for croscope.

mod adapter;
mod api;

pub use adapter::{ClaudeVision, MODEL_ID};
