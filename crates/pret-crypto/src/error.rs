//! Error types for commitment handling.

use thiserror::Error;

/// Error in commitment parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A hex-encoded commitment could not be decoded.
    #[error("invalid commitment encoding: {0}")]
    InvalidEncoding(String),
}
