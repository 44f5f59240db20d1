//! The module contains the errors the engine can produce.
//!
//! - [`ValidationError`] user input rejected by a flow step. Never leaves the
//!   engine: the dispatcher turns it into a re-prompt.
//! - [`BackendError`] a ledger or user-directory call failed.
//! - [`TransportError`] a reply could not be delivered.
//! - [`EngineError`] session store failures and builder misconfiguration.
use thiserror::Error;

/// Input rejected by a step validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown payment method: {0}")]
    UnknownPaymentMethod(String),
    #[error("counterparty name must not be empty")]
    EmptyCounterparty,
}

/// Failure of a persistence or user-directory collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend call timed out")]
    Timeout,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("{status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("duplicate request (already stored)")]
    Duplicate,
}

/// Failure of the outbound chat transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("session store error: {0}")]
    Store(String),
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Store(a), Self::Store(b)) => a == b,
            (Self::MissingComponent(a), Self::MissingComponent(b)) => a == b,
            (Self::Backend(a), Self::Backend(b)) => a == b,
            _ => false,
        }
    }
}
