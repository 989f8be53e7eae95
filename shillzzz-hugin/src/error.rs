/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use shillzzz_gungnir::GungnirError;
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum HuginError {
    #[error("request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("rpc error: {0}")]
    RpcError(String),
    /// The payment exists but does not satisfy the purchase.
    #[error("{0}")]
    Rejected(String),
}

impl From<HuginError> for GungnirError {
    fn from(err: HuginError) -> Self {
        match err {
            HuginError::Rejected(msg) => GungnirError::PaymentRejected(msg),
            other => GungnirError::Upstream(other.to_string()),
        }
    }
}
