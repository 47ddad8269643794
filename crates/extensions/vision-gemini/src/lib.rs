//! Gemini vision adapter for croscope.

mod adapter;
mod types;

pub use adapter::{GeminiVision, MODEL_ID};
