/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Admin allowlist and cron secret checks.

use secrecy::{ExposeSecret, Secret};
use std::collections::HashSet;
use warp::Rejection;

use crate::error::{reject, Error};
use crate::state::AppState;

pub const ADMIN_HEADER: &str = "x-admin-wallet";
const BEARER: &str = "Bearer ";

/// Wallets allowed to moderate ads and trigger snapshots.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowlist(HashSet<String>);

impl AdminAllowlist {
    pub fn new<I, S>(wallets: I) -> AdminAllowlist
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AdminAllowlist(
            wallets
                .into_iter()
                .map(|w| w.as_ref().trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, wallet: &str) -> bool {
        self.0.contains(wallet.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn bearer(header: Option<&str>) -> Option<&str> {
    header
        .filter(|h| h.starts_with(BEARER))
        .map(|h| h.trim_start_matches(BEARER).trim())
}

/// An unset or empty secret disables cron access.
fn cron_allowed(secret: &Option<Secret<String>>, authorization: Option<&str>) -> bool {
    match (secret, bearer(authorization)) {
        (Some(secret), Some(token)) => {
            let secret = secret.expose_secret();
            !secret.is_empty() && secret == token
        }
        _ => false,
    }
}

pub(crate) async fn admin(
    wallet: Option<String>,
    state: AppState,
) -> Result<AppState, Rejection> {
    match wallet {
        Some(w) if state.admins.contains(&w) => Ok(state),
        _ => {
            log::warn!("admin request refused for {:?}", wallet);
            Err(reject(Error::Forbidden))
        }
    }
}

pub(crate) async fn cron(
    authorization: Option<String>,
    state: AppState,
) -> Result<AppState, Rejection> {
    if cron_allowed(&state.cron_secret, authorization.as_deref()) {
        Ok(state)
    } else {
        log::warn!("cron request refused");
        Err(reject(Error::Forbidden))
    }
}

/// Admin wallet or cron secret.
pub(crate) async fn operator(
    wallet: Option<String>,
    authorization: Option<String>,
    state: AppState,
) -> Result<AppState, Rejection> {
    let is_admin = wallet.as_deref().map_or(false, |w| state.admins.contains(w));
    if is_admin || cron_allowed(&state.cron_secret, authorization.as_deref()) {
        Ok(state)
    } else {
        log::warn!("operator request refused");
        Err(reject(Error::Forbidden))
    }
}
