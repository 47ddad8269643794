//! Data model shared by the engine, adapters and collaborators.

mod artifact;
mod finding;
mod progress;
mod request;
mod result;

pub use artifact::*;
pub use finding::*;
pub use progress::*;
pub use request::*;
pub use result::*;
