/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Persistence seam.
//!
//! Every domain operation talks to the database through [`Store`]. [`PgStore`] is the
//! production implementation on diesel/Postgres; [`MemStore`] keeps the same uniqueness
//! rules in memory and backs the tests and local demos.

mod mem;
mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::*;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Unique constraint on `user_boosters.transaction_hash`.
pub const BOOSTER_TRANSACTION_CONSTRAINT: &str = "user_boosters_transaction_hash_key";
/// Partial unique index on `user_boosters.user_id WHERE is_active`.
pub const ACTIVE_BOOSTER_CONSTRAINT: &str = "user_boosters_one_active_per_user";

/// Unique `(payment_type, transaction_hash)` on `sol_payments`.
pub const SOL_PAYMENT_CONSTRAINT: &str = "sol_payments_type_transaction_key";

/// Per-user `(daily, weekly)` shill point counters.
pub type PeriodCounters = HashMap<i64, (i64, i64)>;

pub trait Store: Send + Sync {
    fn find_or_create_user(&self, identity: &str, now: DateTime<Utc>) -> StoreResult<User>;
    fn find_user(&self, identity: &str) -> StoreResult<Option<User>>;
    fn users_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<User>>;
    /// Adds `points` to the user's all-time total and refreshes the tier.
    fn add_user_shills(&self, user_id: i64, points: i64, now: DateTime<Utc>) -> StoreResult<User>;
    /// Resets every user's daily/weekly counters, then applies `counters`.
    fn replace_period_counters(
        &self,
        counters: &PeriodCounters,
        now: DateTime<Utc>,
    ) -> StoreResult<usize>;
    fn top_users_by_total(&self, limit: i64) -> StoreResult<Vec<RankedUser>>;
    /// Shill points per user for shills created in `[from, to]`, unordered.
    fn shill_points_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<(i64, i64)>>;

    fn find_or_create_token(&self, token: &NewToken) -> StoreResult<Token>;
    /// Appends the shill and bumps the token's total.
    fn insert_shill(&self, shill: &NewShill) -> StoreResult<Shill>;
    fn purge_shills_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;

    fn booster_packs(&self) -> StoreResult<Vec<BoosterPack>>;
    fn booster_pack(&self, id: i64) -> StoreResult<Option<BoosterPack>>;
    fn insert_booster_pack(&self, pack: &NewBoosterPack) -> StoreResult<BoosterPack>;
    fn user_booster_by_transaction(&self, tx_hash: &str) -> StoreResult<Option<UserBooster>>;
    /// Deactivates flagged-active boosters whose expiry has passed, for one user or all.
    fn expire_user_boosters(&self, user_id: Option<i64>, now: DateTime<Utc>) -> StoreResult<usize>;
    fn active_user_booster(&self, user_id: i64, now: DateTime<Utc>)
        -> StoreResult<Option<UserBooster>>;
    fn insert_user_booster(&self, booster: &NewUserBooster) -> StoreResult<UserBooster>;

    fn insert_sol_payment(&self, payment: &NewSolPayment) -> StoreResult<SolPayment>;
    fn sum_sol_payments(
        &self,
        payment_type: PaymentType,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<BigDecimal>;

    fn ad_transaction_exists(&self, kind: AdKind, tx_hash: &str) -> StoreResult<bool>;
    /// Bookings (pending or approved) of `slot` overlapping `[start, end]` inclusively.
    fn overlapping_ads(
        &self,
        kind: AdKind,
        slot: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Ad>>;
    fn insert_ad(&self, kind: AdKind, ad: &NewAd, now: DateTime<Utc>) -> StoreResult<Ad>;
    fn set_ad_approved(&self, kind: AdKind, id: i64, approved: bool) -> StoreResult<Option<Ad>>;
    fn delete_ad(&self, kind: AdKind, id: i64) -> StoreResult<bool>;
    fn approved_ads_starting_between(
        &self,
        kind: AdKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Ad>>;

    fn latest_snapshot(&self) -> StoreResult<Option<PotSnapshot>>;
    /// Snapshots created after `cutoff`, newest first.
    fn snapshots_since(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<PotSnapshot>>;
    fn snapshot_winners(&self, snapshot_id: i64) -> StoreResult<Vec<PotSnapshotWinner>>;
    fn insert_snapshot(
        &self,
        snapshot: &NewPotSnapshot,
        winners: &[NewPotSnapshotWinner],
    ) -> StoreResult<(PotSnapshot, Vec<PotSnapshotWinner>)>;
}

/// Sums `(user_id, points)` rows per user.
pub(crate) fn aggregate_points<I>(rows: I) -> Vec<(i64, i64)>
where
    I: IntoIterator<Item = (i64, i64)>,
{
    let mut per_user = HashMap::<i64, i64>::new();
    for (user, points) in rows {
        *per_user.entry(user).or_insert(0) += points;
    }
    per_user.into_iter().collect()
}
