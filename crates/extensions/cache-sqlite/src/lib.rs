//! SQLite backing store for the croscope analysis cache.
//!
//! Shared across processes pointing at the same file. Results are stored as
//! JSON with an absolute expiry; expired rows read as absent and are removed
//! lazily.

mod schema;
mod store;

pub use store::SqliteCache;
