//! # Shared Errors
//!
//! Failure types used by more than one PRET crate.
//!
//! ## Design
//!
//! - Input errors are raised before any external call and have no side effects.
//! - Fetch errors describe one entity's data-source failure. They are
//!   recoverable and never abort a batch.
//! - Encoding errors indicate a broken invariant in the encoder pipeline.

use thiserror::Error;

/// A scalar value (timestamp, date) failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid value: {0}")]
    Validation(String),
}

/// A value could not be brought into canonical form.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Canonical form admits integers only.
    #[error("non-integer number {0} at {1}")]
    FloatRejected(f64, String),

    #[error("could not serialize value: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Malformed or missing caller input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The identifier was empty after trimming.
    #[error("entity identifier is empty")]
    EmptyIdentifier,

    /// The identifier exceeds the accepted length.
    #[error("entity identifier is {len} characters, maximum is {max}")]
    IdentifierTooLong {
        /// Observed length in characters.
        len: usize,
        /// Accepted maximum.
        max: usize,
    },

    /// The identifier contains a control character.
    #[error("entity identifier contains a control character at position {position}")]
    ControlCharacter {
        /// Zero-based character position.
        position: usize,
    },

    /// A free-text query named no LEI, CIN or company name.
    #[error("no entity identifier found in query")]
    NoEntityInQuery,

    /// The batch exceeds the configured size bound.
    #[error("batch of {size} identifiers exceeds the maximum of {max}")]
    BatchTooLarge {
        /// Number of identifiers submitted.
        size: usize,
        /// Accepted maximum.
        max: usize,
    },
}

/// Data-source failure for a single entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The source has no record for the requested key.
    #[error("no record found for {key}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// The source could not be reached or refused the request.
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with a payload that fails validation.
    #[error("malformed source payload: {0}")]
    Malformed(String),
}

/// Encoder pipeline failure.
///
/// The encoder itself is total. This only arises when a caller hands an
/// oversized field list to a bounded constructor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The bounded field list grew past its arity cap.
    #[error("bounded field list has {len} elements, cap is {cap}")]
    ArityExceeded {
        /// Observed length.
        len: usize,
        /// The arity cap.
        cap: usize,
    },
}
