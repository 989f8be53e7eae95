/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use serde::Serialize;
use shillzzz_gungnir::{GungnirError, StoreError};
use std::convert::Infallible;
use thiserror::Error;
use warp::{http::StatusCode, Rejection, Reply};

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("Forbidden")]
    Forbidden,
    #[error(transparent)]
    GungnirError(#[from] GungnirError),
    #[error(transparent)]
    StoreError(#[from] StoreError),
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("invalid socket address: {0}")]
    AddrError(#[from] std::net::AddrParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl warp::reject::Reject for Error {}

pub(crate) fn reject(err: impl Into<Error>) -> Rejection {
    warp::reject::custom(err.into())
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    message: String,
    status: String,
}

fn status_of(err: &Error) -> StatusCode {
    match err {
        Error::Forbidden => StatusCode::FORBIDDEN,
        Error::GungnirError(e) => match e {
            GungnirError::Validation(_)
            | GungnirError::TransactionReplayed
            | GungnirError::ActiveBoosterExists
            | GungnirError::SlotUnavailable
            | GungnirError::PaymentRejected(_) => StatusCode::BAD_REQUEST,
            GungnirError::NotFound(_) => StatusCode::NOT_FOUND,
            GungnirError::Upstream(_) | GungnirError::StoreError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<Error>() {
        let code = status_of(e);
        if code == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {e}");
        }
        (code, e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed".to_string(),
        )
    } else {
        log::error!("unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
    };

    let json = warp::reply::json(&ErrorResponse {
        status: code.to_string(),
        message,
    });

    Ok(warp::reply::with_status(json, code))
}
