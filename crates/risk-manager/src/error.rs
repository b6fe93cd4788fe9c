//! Risk store errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lock could not be acquired within the configured budget
    #[error("risk state unavailable: {resource} busy for {waited_ms}ms")]
    Unavailable { resource: String, waited_ms: u64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
