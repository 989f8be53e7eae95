/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use bigdecimal::BigDecimal;
use chrono::Duration;
use serde::Serialize;

use super::{decimal_from_f64, WeeklyPot};
use crate::engine::Engine;
use crate::error::Result;
use crate::models::*;
use crate::shills::leaderboard;

/// Percent of the pot paid to ranks 1 through 10.
pub const PRIZE_SCHEDULE: [i32; 10] = [30, 20, 15, 10, 8, 6, 4, 3, 2, 2];

/// A snapshot younger than this with a near-identical pot is returned instead of a new one.
pub const DUPLICATE_WINDOW_HOURS: i64 = 24;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SnapshotView {
    pub snapshot: PotSnapshot,
    pub winners: Vec<PotSnapshotWinner>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SnapshotOutcome {
    Created(SnapshotView),
    Duplicate(SnapshotView),
    BelowThreshold { pot_usd: BigDecimal, min_usd: f64 },
}

impl SnapshotOutcome {
    pub fn snapshot_id(&self) -> Option<i64> {
        self.view().map(|v| v.snapshot.id)
    }

    pub fn view(&self) -> Option<&SnapshotView> {
        match self {
            SnapshotOutcome::Created(v) | SnapshotOutcome::Duplicate(v) => Some(v),
            SnapshotOutcome::BelowThreshold { .. } => None,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, SnapshotOutcome::Created(_))
    }
}

/// `earlier` is within 1% of `current`.
fn within_one_percent(earlier: &BigDecimal, current: &BigDecimal) -> bool {
    (earlier - current).abs() * BigDecimal::from(100) <= current.abs()
}

/// Splits `pot` over the ranked users following [`PRIZE_SCHEDULE`].
pub fn allocate_prizes(
    pot: &WeeklyPot,
    ranked: Vec<RankedUser>,
) -> Vec<NewPotSnapshotWinner> {
    let hundred = BigDecimal::from(100);
    ranked
        .into_iter()
        .zip(PRIZE_SCHEDULE.iter())
        .enumerate()
        .map(|(i, (user, pct))| {
            let prize_sol = &pot.pot_sol * BigDecimal::from(*pct) / &hundred;
            let prize_usd = (&prize_sol * &pot.sol_usd_rate).round(6);
            NewPotSnapshotWinner {
                rank: i as i32 + 1,
                user_id: user.user_id,
                identity: user.identity,
                shills: user.shills,
                percentage: *pct,
                prize_sol,
                prize_usd,
            }
        })
        .collect()
}

impl Engine {
    /// Freezes the current pot and its top ten.
    pub async fn take_weekly_snapshot(&self) -> Result<SnapshotOutcome> {
        let pot = self.weekly_pot().await?;
        let now = self.now();

        let recent = self
            .store
            .snapshots_since(now - Duration::hours(DUPLICATE_WINDOW_HOURS))?;
        if let Some(matching) = recent
            .into_iter()
            .find(|s| within_one_percent(&s.pot_sol, &pot.pot_sol))
        {
            log::info!(
                "snapshot {} from {} still matches the pot, not taking another",
                matching.id,
                matching.created_at
            );
            let winners = self.store.snapshot_winners(matching.id)?;
            return Ok(SnapshotOutcome::Duplicate(SnapshotView {
                snapshot: matching,
                winners,
            }));
        }

        let min_usd = self.config.pot.min_snapshot_usd;
        if pot.pot_usd < decimal_from_f64(min_usd) {
            log::info!("pot is only {} USD, skipping snapshot", pot.pot_usd);
            return Ok(SnapshotOutcome::BelowThreshold {
                pot_usd: pot.pot_usd,
                min_usd,
            });
        }

        let basis = self.config.pot.ranking;
        let ranked = leaderboard(
            self.store.as_ref(),
            basis,
            &pot.window,
            PRIZE_SCHEDULE.len(),
        )?;
        let winners = allocate_prizes(&pot, ranked);

        let (snapshot, winners) = self.store.insert_snapshot(
            &NewPotSnapshot {
                pot_sol: pot.pot_sol.clone(),
                pot_usd: pot.pot_usd.clone(),
                sol_usd_rate: pot.sol_usd_rate.clone(),
                weekly_earnings_sol: pot.weekly_earnings_sol.clone(),
                week_start: pot.window.start,
                week_end: pot.window.end,
                ranking: basis.to_string(),
                created_at: now,
            },
            &winners,
        )?;
        log::info!(
            "snapshot {} taken: {} SOL split over {} winner(s)",
            snapshot.id,
            snapshot.pot_sol,
            winners.len()
        );
        self.announce(format!(
            "Weekly pot snapshot: {} SOL (~${}) across {} winners",
            snapshot.pot_sol,
            snapshot.pot_usd.round(2),
            winners.len()
        ))
        .await;

        Ok(SnapshotOutcome::Created(SnapshotView { snapshot, winners }))
    }

    pub fn latest_snapshot(&self) -> Result<Option<SnapshotView>> {
        match self.store.latest_snapshot()? {
            Some(snapshot) => {
                let winners = self.store.snapshot_winners(snapshot.id)?;
                Ok(Some(SnapshotView { snapshot, winners }))
            }
            None => Ok(None),
        }
    }
}
