/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use serde::de::DeserializeOwned;
use shillzzz_gungnir::AdKind;
use std::convert::Infallible;
use warp::{Filter, Rejection};

use crate::auth::{self, ADMIN_HEADER};
use crate::error::handle_rejection;
use crate::handlers;
use crate::state::AppState;

const BODY_LIMIT: u64 = 64 * 1024;

/// All endpoints with error responses rendered as JSON.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    endpoints(state).recover(handle_rejection)
}

pub fn endpoints(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    purchase_booster(state.clone())
        .or(list_boosters(state.clone()))
        .or(get_pot(state.clone()))
        .or(take_snapshot(state.clone()))
        .or(latest_snapshot(state.clone()))
        .or(submit_banner(state.clone()))
        .or(submit_featured(state.clone()))
        .or(ad_availability(state.clone()))
        .or(approve_ad(state.clone()))
        .or(reject_ad(state.clone()))
        .or(record_shill(state.clone()))
        .or(leaderboard(state.clone()))
        .or(cron_snapshot(state.clone()))
        .or(cron_cleanup(state.clone()))
        .or(cron_counters(state))
}

/// POST /boosters/purchase
pub fn purchase_booster(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("boosters")
        .and(warp::path("purchase"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::purchase_booster)
}

/// GET /boosters?user=
pub fn list_boosters(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("boosters")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handlers::BoostersQuery>())
        .and(with_state(state))
        .and_then(handlers::list_boosters)
}

pub fn get_pot(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("pot")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::weekly_pot)
}

pub fn take_snapshot(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("pot")
        .and(warp::path("snapshot"))
        .and(warp::path::end())
        .and(warp::post())
        .and(operator(state))
        .and_then(handlers::take_snapshot)
}

pub fn latest_snapshot(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("pot")
        .and(warp::path("snapshot"))
        .and(warp::path("latest"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::latest_snapshot)
}

/// POST /ads/submit
pub fn submit_banner(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("ads")
        .and(warp::path("submit"))
        .and(warp::path::end())
        .and(warp::post())
        .map(|| AdKind::Banner)
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::submit_ad)
}

/// POST /ads/featured/submit
pub fn submit_featured(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("ads")
        .and(warp::path("featured"))
        .and(warp::path("submit"))
        .and(warp::path::end())
        .and(warp::post())
        .map(|| AdKind::Featured)
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::submit_ad)
}

/// GET /ads/availability?kind=&slot=&start=&end=
pub fn ad_availability(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("ads")
        .and(warp::path("availability"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handlers::AvailabilityQuery>())
        .and(with_state(state))
        .and_then(handlers::ad_availability)
}

/// POST /admin/ads/{banner|featured}/{id}/approve
pub fn approve_ad(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("admin")
        .and(warp::path("ads"))
        .and(warp::path::param::<AdKind>())
        .and(warp::path::param::<i64>())
        .and(warp::path("approve"))
        .and(warp::path::end())
        .and(warp::post())
        .and(admin(state))
        .and_then(handlers::approve_ad)
}

/// POST /admin/ads/{banner|featured}/{id}/reject
pub fn reject_ad(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("admin")
        .and(warp::path("ads"))
        .and(warp::path::param::<AdKind>())
        .and(warp::path::param::<i64>())
        .and(warp::path("reject"))
        .and(warp::path::end())
        .and(warp::post())
        .and(admin(state))
        .and_then(handlers::reject_ad)
}

pub fn record_shill(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("shills")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::record_shill)
}

/// GET /leaderboard?limit=&basis=
pub fn leaderboard(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("leaderboard")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handlers::LeaderboardQuery>())
        .and(with_state(state))
        .and_then(handlers::leaderboard)
}

pub fn cron_snapshot(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("cron")
        .and(warp::path("snapshot"))
        .and(warp::path::end())
        .and(warp::post())
        .and(cron(state))
        .and_then(handlers::take_snapshot)
}

pub fn cron_cleanup(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("cron")
        .and(warp::path("cleanup"))
        .and(warp::path::end())
        .and(warp::post())
        .and(cron(state))
        .and_then(handlers::cleanup)
}

pub fn cron_counters(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Rejection> + Clone {
    warp::path("cron")
        .and(warp::path("counters"))
        .and(warp::path::end())
        .and(warp::post())
        .and(cron(state))
        .and_then(handlers::recompute_counters)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_LIMIT).and(warp::body::json())
}

fn admin(state: AppState) -> impl Filter<Extract = (AppState,), Error = Rejection> + Clone {
    warp::header::optional::<String>(ADMIN_HEADER)
        .and(with_state(state))
        .and_then(auth::admin)
}

fn cron(state: AppState) -> impl Filter<Extract = (AppState,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_state(state))
        .and_then(auth::cron)
}

fn operator(state: AppState) -> impl Filter<Extract = (AppState,), Error = Rejection> + Clone {
    warp::header::optional::<String>(ADMIN_HEADER)
        .and(warp::header::optional::<String>("authorization"))
        .and(with_state(state))
        .and_then(auth::operator)
}
