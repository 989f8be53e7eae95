/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error(transparent)]
    DieselError(#[from] diesel::result::Error),
    #[error(transparent)]
    DieselConnectionError(#[from] diesel::ConnectionError),
    #[error(transparent)]
    PoolError(#[from] diesel::r2d2::PoolError),
}

impl StoreError {
    /// Name of the violated constraint, if this is a uniqueness violation.
    pub fn violated_constraint(&self) -> Option<&str> {
        match self {
            StoreError::UniqueViolation(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum GungnirError {
    #[error("{0}")]
    Validation(String),
    #[error("This transaction has already been used")]
    TransactionReplayed,
    #[error("You already have an active booster")]
    ActiveBoosterExists,
    #[error("The requested slot is not available for these dates")]
    SlotUnavailable,
    #[error("payment could not be verified: {0}")]
    PaymentRejected(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error(transparent)]
    StoreError(#[from] StoreError),
}

impl GungnirError {
    pub fn validation(msg: &str) -> GungnirError {
        GungnirError::Validation(msg.to_string())
    }

    pub fn not_found(what: &str) -> GungnirError {
        GungnirError::NotFound(what.to_string())
    }
}

impl From<std::string::String> for GungnirError {
    fn from(err: std::string::String) -> Self {
        GungnirError::Validation(err)
    }
}

impl From<chrono::ParseError> for GungnirError {
    fn from(err: chrono::ParseError) -> Self {
        GungnirError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GungnirError>;
