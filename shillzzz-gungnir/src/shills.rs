/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::Engine;
use crate::error::{GungnirError, Result};
use crate::models::*;
use crate::pot::{RankingBasis, WeekWindow};
use crate::store::{PeriodCounters, Store};

pub const DEFAULT_CHAIN: &str = "solana";
pub const SHILL_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShillRequest {
    pub user: Option<String>,
    pub wallet_address: Option<String>,
    pub telegram_handle: Option<String>,
    pub contract_address: String,
    pub chain: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

/// First non-empty identity field of a request.
pub fn requested_identity<'a>(candidates: &[Option<&'a str>]) -> &'a str {
    candidates
        .iter()
        .flatten()
        .find(|c| !c.trim().is_empty())
        .copied()
        .unwrap_or("")
}

#[derive(Debug, Clone, Serialize)]
pub struct ShillReceipt {
    pub shill: Shill,
    pub user: User,
    pub token: Token,
    pub multiplier: i32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CleanupReport {
    pub purged_shills: usize,
    pub expired_boosters: usize,
}

/// Top `limit` users under `basis`. Ties go to the lower user id.
pub fn leaderboard(
    store: &dyn Store,
    basis: RankingBasis,
    window: &WeekWindow,
    limit: usize,
) -> Result<Vec<RankedUser>> {
    match basis {
        RankingBasis::AllTimeShills => Ok(store.top_users_by_total(limit as i64)?),
        RankingBasis::WeeklyShills => {
            let mut points: Vec<(i64, i64)> = store
                .shill_points_between(window.start, window.end)?
                .into_iter()
                .filter(|(_, p)| *p > 0)
                .collect();
            points.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            points.truncate(limit);

            let ids: Vec<i64> = points.iter().map(|(u, _)| *u).collect();
            let identities: HashMap<i64, String> = store
                .users_by_ids(&ids)?
                .into_iter()
                .map(|u| (u.id, u.identity))
                .collect();

            Ok(points
                .into_iter()
                .map(|(user_id, shills)| RankedUser {
                    user_id,
                    identity: identities
                        .get(&user_id)
                        .cloned()
                        .unwrap_or_else(|| ANONYMOUS.to_string()),
                    shills,
                })
                .collect())
        }
    }
}

impl Engine {
    /// Records a shill, weighted by the user's active booster.
    pub fn record_shill(&self, req: &ShillRequest) -> Result<ShillReceipt> {
        let contract = req.contract_address.trim().to_lowercase();
        if contract.is_empty() {
            return Err(GungnirError::validation("missing contract address"));
        }
        let now = self.now();
        let identity = normalize_identity(requested_identity(&[
            req.user.as_deref(),
            req.wallet_address.as_deref(),
            req.telegram_handle.as_deref(),
        ]));
        let user = self.store.find_or_create_user(&identity, now)?;
        let mut token = self.store.find_or_create_token(&NewToken {
            contract_address: &contract,
            chain: req
                .chain
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CHAIN),
            name: req.name.as_deref(),
            symbol: req.symbol.as_deref(),
            created_at: now,
        })?;

        self.store.expire_user_boosters(Some(user.id), now)?;
        let multiplier = self
            .store
            .active_user_booster(user.id, now)?
            .map(|b| b.multiplier.max(1))
            .unwrap_or(1);

        let shill = self.store.insert_shill(&NewShill {
            user_id: user.id,
            token_id: token.id,
            points: multiplier as i64,
            created_at: now,
        })?;
        let user = self.store.add_user_shills(user.id, shill.points, now)?;
        token.total_shills += shill.points;
        log::debug!(
            "{} shilled {} for {} point(s)",
            user.identity,
            token.contract_address,
            shill.points
        );

        Ok(ShillReceipt {
            shill,
            user,
            token,
            multiplier,
        })
    }

    pub fn leaderboard(&self, basis: RankingBasis, limit: usize) -> Result<Vec<RankedUser>> {
        let window = WeekWindow::containing(self.now(), self.config.pot.offset());
        leaderboard(self.store.as_ref(), basis, &window, limit)
    }

    /// Purges shill events older than a week and expires stale boosters.
    pub fn cleanup(&self) -> Result<CleanupReport> {
        let now = self.now();
        let purged_shills = self
            .store
            .purge_shills_before(now - Duration::days(SHILL_RETENTION_DAYS))?;
        let expired_boosters = self.store.expire_user_boosters(None, now)?;
        log::info!("cleanup purged {purged_shills} shills, expired {expired_boosters} boosters");
        Ok(CleanupReport {
            purged_shills,
            expired_boosters,
        })
    }

    /// Rebuilds daily (last 24h) and weekly (current window) counters from shill events.
    pub fn recompute_counters(&self) -> Result<usize> {
        let now = self.now();
        let window = WeekWindow::containing(now, self.config.pot.offset());
        let counters = period_counters(self.store.as_ref(), now, &window)?;
        let updated = self.store.replace_period_counters(&counters, now)?;
        log::info!("recomputed period counters for {updated} users");
        Ok(updated)
    }
}

fn period_counters(
    store: &dyn Store,
    now: DateTime<Utc>,
    window: &WeekWindow,
) -> Result<PeriodCounters> {
    let mut counters = PeriodCounters::new();
    for (user, points) in store.shill_points_between(now - Duration::hours(24), now)? {
        counters.entry(user).or_insert((0, 0)).0 = points;
    }
    for (user, points) in store.shill_points_between(window.start, window.end)? {
        counters.entry(user).or_insert((0, 0)).1 = points;
    }
    Ok(counters)
}
