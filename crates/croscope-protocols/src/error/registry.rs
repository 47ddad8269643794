//! Component registration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
