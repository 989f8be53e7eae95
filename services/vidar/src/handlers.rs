/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shillzzz_gungnir::boosters::PurchaseRequest;
use shillzzz_gungnir::pot::{SnapshotOutcome, SnapshotView};
use shillzzz_gungnir::shills::ShillRequest;
use shillzzz_gungnir::{AdKind, BoosterPack, GungnirError, NewAd, RankingBasis, UserBooster};
use warp::{Rejection, Reply};

use crate::error::reject;
use crate::state::AppState;

pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;
pub const MAX_LEADERBOARD_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct BoostersQuery {
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
struct BoostersResponse {
    packs: Vec<BoosterPack>,
    active: Option<UserBooster>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub kind: Option<AdKind>,
    pub slot: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
    pub basis: Option<RankingBasis>,
}

#[derive(Debug, Serialize)]
struct SnapshotResponse<'a> {
    ok: bool,
    created: bool,
    snapshot_id: Option<i64>,
    message: String,
    snapshot: Option<&'a SnapshotView>,
}

pub async fn purchase_booster(
    req: PurchaseRequest,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let receipt = state.engine.purchase_booster(&req).await.map_err(reject)?;
    Ok(warp::reply::json(&receipt))
}

pub async fn list_boosters(query: BoostersQuery, state: AppState) -> Result<impl Reply, Rejection> {
    let packs = state.engine.booster_catalog().map_err(reject)?;
    let active = match query.user.as_deref() {
        Some(user) => state.engine.active_booster(user).map_err(reject)?,
        None => None,
    };
    Ok(warp::reply::json(&BoostersResponse { packs, active }))
}

pub async fn weekly_pot(state: AppState) -> Result<impl Reply, Rejection> {
    let pot = state.engine.weekly_pot().await.map_err(reject)?;
    Ok(warp::reply::json(&pot))
}

pub async fn take_snapshot(state: AppState) -> Result<impl Reply, Rejection> {
    let outcome = state.engine.take_weekly_snapshot().await.map_err(reject)?;
    let message = match &outcome {
        SnapshotOutcome::Created(_) => "snapshot created".to_string(),
        SnapshotOutcome::Duplicate(_) => "a matching snapshot was taken recently".to_string(),
        SnapshotOutcome::BelowThreshold { pot_usd, min_usd } => {
            format!("pot of {pot_usd} USD is below the {min_usd} USD minimum")
        }
    };
    Ok(warp::reply::json(&SnapshotResponse {
        ok: true,
        created: outcome.created(),
        snapshot_id: outcome.snapshot_id(),
        message,
        snapshot: outcome.view(),
    }))
}

pub async fn latest_snapshot(state: AppState) -> Result<impl Reply, Rejection> {
    match state.engine.latest_snapshot().map_err(reject)? {
        Some(view) => Ok(warp::reply::json(&view)),
        None => Err(reject(GungnirError::not_found("snapshot"))),
    }
}

pub async fn submit_ad(kind: AdKind, ad: NewAd, state: AppState) -> Result<impl Reply, Rejection> {
    let ad = state.engine.submit_ad(kind, &ad).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({ "ok": true, "ad": ad })))
}

pub async fn ad_availability(
    query: AvailabilityQuery,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let availability = state
        .engine
        .ad_availability(
            query.kind.unwrap_or(AdKind::Banner),
            &query.slot,
            query.start,
            query.end.unwrap_or(query.start),
        )
        .map_err(reject)?;
    Ok(warp::reply::json(&availability))
}

pub async fn approve_ad(kind: AdKind, id: i64, state: AppState) -> Result<impl Reply, Rejection> {
    let ad = state.engine.approve_ad(kind, id).map_err(reject)?;
    Ok(warp::reply::json(&json!({ "ok": true, "ad": ad })))
}

pub async fn reject_ad(kind: AdKind, id: i64, state: AppState) -> Result<impl Reply, Rejection> {
    state.engine.reject_ad(kind, id).map_err(reject)?;
    Ok(warp::reply::json(&json!({ "ok": true, "deleted": id })))
}

pub async fn record_shill(req: ShillRequest, state: AppState) -> Result<impl Reply, Rejection> {
    let receipt = state.engine.record_shill(&req).map_err(reject)?;
    Ok(warp::reply::json(&receipt))
}

pub async fn leaderboard(query: LeaderboardQuery, state: AppState) -> Result<impl Reply, Rejection> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
        .clamp(1, MAX_LEADERBOARD_SIZE);
    let board = state
        .engine
        .leaderboard(query.basis.unwrap_or_default(), limit)
        .map_err(reject)?;
    Ok(warp::reply::json(&board))
}

pub async fn cleanup(state: AppState) -> Result<impl Reply, Rejection> {
    let report = state.engine.cleanup().map_err(reject)?;
    Ok(warp::reply::json(&report))
}

pub async fn recompute_counters(state: AppState) -> Result<impl Reply, Rejection> {
    let updated = state.engine.recompute_counters().map_err(reject)?;
    Ok(warp::reply::json(&json!({ "ok": true, "updated": updated })))
}
