//! Error types for dealbook

use thiserror::Error;

/// Main error type for dealbook
#[derive(Error, Debug)]
pub enum DealbookError {
    // Offer validation errors
    #[error("Invalid offer amount: {0}")]
    InvalidAmount(i64),

    #[error("Missing reason: {0}")]
    MissingReason(String),

    // State machine errors
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Turn violation: {0}")]
    TurnViolation(String),

    #[error("Stale state for {entity}: expected revision {expected}, found {found}")]
    StaleState {
        entity: String,
        expected: u64,
        found: u64,
    },

    // Transaction pricing errors
    #[error("Negative monetary field {field}: {value}")]
    NegativeMonetaryField { field: &'static str, value: i64 },

    #[error("Deal is not accepted: {0}")]
    DealNotAccepted(String),

    // Lookup errors
    #[error("Deal not found: {0}")]
    DealNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Listing not found: {0}")]
    ListingNotFound(String),

    #[error("Unknown party: actor {actor} has no side on listing {listing}")]
    UnknownParty { actor: String, listing: String },

    #[error("Listing mismatch: deal {deal} is not bound to listing {listing}")]
    ListingMismatch { deal: String, listing: String },

    // General errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DealbookError {
    /// HTTP status the surrounding web layer maps this error to.
    ///
    /// 422 for validation failures, 409 for turn/state conflicts, 404 for
    /// lookup failures, 500 otherwise.
    pub fn http_status(&self) -> u16 {
        match self {
            DealbookError::InvalidAmount(_)
            | DealbookError::MissingReason(_)
            | DealbookError::NegativeMonetaryField { .. }
            | DealbookError::UnknownParty { .. }
            | DealbookError::ListingMismatch { .. } => 422,

            DealbookError::InvalidTransition(_)
            | DealbookError::TurnViolation(_)
            | DealbookError::StaleState { .. } => 409,

            DealbookError::DealNotFound(_)
            | DealbookError::TransactionNotFound(_)
            | DealbookError::ListingNotFound(_)
            | DealbookError::DealNotAccepted(_) => 404,

            DealbookError::Serialization(_) | DealbookError::Io(_) => 500,
        }
    }
}

/// Result type alias for dealbook operations
pub type Result<T> = std::result::Result<T, DealbookError>;
