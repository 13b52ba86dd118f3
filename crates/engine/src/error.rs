//! The module contains the errors the engine can throw.
//!
//! Business-rule violations ([`InsufficientBalance`], [`OverAllocation`],
//! [`Forbidden`], ...) are terminal: they propagate to the caller and are
//! never retried. Only [`Database`] errors may be retried, and only when the
//! underlying store reports a transient conflict.
//!
//! [`InsufficientBalance`]: EngineError::InsufficientBalance
//! [`OverAllocation`]: EngineError::OverAllocation
//! [`Forbidden`]: EngineError::Forbidden
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Over-allocation: {0}")]
    OverAllocation(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::OverAllocation(a), Self::OverAllocation(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
