/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::{exists, sum};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::DatabaseErrorKind;

use super::{aggregate_points, PeriodCounters, Store, StoreResult};
use crate::error::StoreError;
use crate::models::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Expands `$body` once per ad table, with `$table` bound to that table's schema module.
macro_rules! with_ad_table {
    ($kind:expr, $table:ident => $body:expr) => {
        match $kind {
            AdKind::Banner => {
                use crate::schema::ad_slots as $table;
                $body
            }
            AdKind::Featured => {
                use crate::schema::featured_ads as $table;
                $body
            }
        }
    };
}

fn map_unique(err: diesel::result::Error) -> StoreError {
    match err {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreError::UniqueViolation(info.constraint_name().unwrap_or("unknown").to_string())
        }
        other => StoreError::DieselError(other),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl PgStore {
    pub fn connect(database_url: &str, pool_size: u32) -> Result<PgStore, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Ok(PgStore { pool })
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl Store for PgStore {
    fn find_or_create_user(&self, identity_in: &str, now: DateTime<Utc>) -> StoreResult<User> {
        use crate::schema::users::dsl::*;
        let conn = &mut self.conn()?;
        let tier_in = Tier::Bronze.to_string();
        diesel::insert_into(users)
            .values(&NewUser {
                identity: identity_in,
                tier: &tier_in,
                created_at: now,
                updated_at: now,
            })
            .on_conflict(identity)
            .do_nothing()
            .execute(conn)?;
        let result = users.filter(identity.eq(identity_in)).first::<User>(conn)?;
        Ok(result)
    }

    fn find_user(&self, identity_in: &str) -> StoreResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let result = users
            .filter(identity.eq(identity_in))
            .first::<User>(&mut self.conn()?)
            .optional()?;
        Ok(result)
    }

    fn users_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<User>> {
        use crate::schema::users::dsl::*;
        let result = users
            .filter(id.eq_any(ids))
            .load::<User>(&mut self.conn()?)?;
        Ok(result)
    }

    fn add_user_shills(&self, user_id_in: i64, points: i64, now: DateTime<Utc>) -> StoreResult<User> {
        use crate::schema::users::dsl::*;
        let conn = &mut self.conn()?;
        let result = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let user = diesel::update(users.find(user_id_in))
                .set((total_shills.eq(total_shills + points), updated_at.eq(now)))
                .get_result::<User>(conn)?;
            let new_tier = Tier::from_total_shills(user.total_shills).to_string();
            if user.tier == new_tier {
                return Ok(user);
            }
            diesel::update(users.find(user_id_in))
                .set(tier.eq(&new_tier))
                .get_result::<User>(conn)
        })?;
        Ok(result)
    }

    fn replace_period_counters(
        &self,
        counters: &PeriodCounters,
        now: DateTime<Utc>,
    ) -> StoreResult<usize> {
        use crate::schema::users::dsl::*;
        let conn = &mut self.conn()?;
        let updated = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::update(users)
                .set((daily_shills.eq(0), weekly_shills.eq(0)))
                .execute(conn)?;
            let mut updated = 0;
            for (uid, (daily, weekly)) in counters {
                updated += diesel::update(users.find(*uid))
                    .set((
                        daily_shills.eq(*daily),
                        weekly_shills.eq(*weekly),
                        updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }
            Ok(updated)
        })?;
        Ok(updated)
    }

    fn top_users_by_total(&self, limit: i64) -> StoreResult<Vec<RankedUser>> {
        use crate::schema::users::dsl::*;
        let result = users
            .filter(total_shills.gt(0))
            .order((total_shills.desc(), id.asc()))
            .limit(limit)
            .select((id, identity, total_shills))
            .load::<(i64, String, i64)>(&mut self.conn()?)?;
        Ok(result
            .into_iter()
            .map(|(user_id, ident, shills)| RankedUser {
                user_id,
                identity: ident,
                shills,
            })
            .collect())
    }

    fn shill_points_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<(i64, i64)>> {
        use crate::schema::shills::dsl::*;
        let rows = shills
            .filter(created_at.ge(from))
            .filter(created_at.le(to))
            .select((user_id, points))
            .load::<(i64, i64)>(&mut self.conn()?)?;
        Ok(aggregate_points(rows))
    }

    fn find_or_create_token(&self, token: &NewToken) -> StoreResult<Token> {
        use crate::schema::tokens::dsl::*;
        let conn = &mut self.conn()?;
        diesel::insert_into(tokens)
            .values(token)
            .on_conflict(contract_address)
            .do_nothing()
            .execute(conn)?;
        let result = tokens
            .filter(contract_address.eq(token.contract_address))
            .first::<Token>(conn)?;
        Ok(result)
    }

    fn insert_shill(&self, shill: &NewShill) -> StoreResult<Shill> {
        use crate::schema::{shills, tokens};
        let conn = &mut self.conn()?;
        let result = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let inserted = diesel::insert_into(shills::table)
                .values(shill)
                .get_result::<Shill>(conn)?;
            diesel::update(tokens::table.find(shill.token_id))
                .set(tokens::total_shills.eq(tokens::total_shills + shill.points))
                .execute(conn)?;
            Ok(inserted)
        })?;
        Ok(result)
    }

    fn purge_shills_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        use crate::schema::shills::dsl::*;
        let deleted = diesel::delete(shills.filter(created_at.lt(cutoff)))
            .execute(&mut self.conn()?)?;
        Ok(deleted)
    }

    fn booster_packs(&self) -> StoreResult<Vec<BoosterPack>> {
        use crate::schema::booster_packs::dsl::*;
        let result = booster_packs
            .order((price_sol.asc(), id.asc()))
            .load::<BoosterPack>(&mut self.conn()?)?;
        Ok(result)
    }

    fn booster_pack(&self, pack_id: i64) -> StoreResult<Option<BoosterPack>> {
        use crate::schema::booster_packs::dsl::*;
        let result = booster_packs
            .find(pack_id)
            .first::<BoosterPack>(&mut self.conn()?)
            .optional()?;
        Ok(result)
    }

    fn insert_booster_pack(&self, pack: &NewBoosterPack) -> StoreResult<BoosterPack> {
        use crate::schema::booster_packs::dsl::*;
        let result = diesel::insert_into(booster_packs)
            .values(pack)
            .get_result::<BoosterPack>(&mut self.conn()?)?;
        Ok(result)
    }

    fn user_booster_by_transaction(&self, tx_hash: &str) -> StoreResult<Option<UserBooster>> {
        use crate::schema::user_boosters::dsl::*;
        let result = user_boosters
            .filter(transaction_hash.eq(tx_hash))
            .first::<UserBooster>(&mut self.conn()?)
            .optional()?;
        Ok(result)
    }

    fn expire_user_boosters(&self, user: Option<i64>, now: DateTime<Utc>) -> StoreResult<usize> {
        use crate::schema::user_boosters::dsl::*;
        let conn = &mut self.conn()?;
        let expired = match user {
            Some(uid) => diesel::update(
                user_boosters
                    .filter(user_id.eq(uid))
                    .filter(is_active.eq(true))
                    .filter(expires_at.le(now)),
            )
            .set(is_active.eq(false))
            .execute(conn)?,
            None => diesel::update(
                user_boosters
                    .filter(is_active.eq(true))
                    .filter(expires_at.le(now)),
            )
            .set(is_active.eq(false))
            .execute(conn)?,
        };
        Ok(expired)
    }

    fn active_user_booster(
        &self,
        uid: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserBooster>> {
        use crate::schema::user_boosters::dsl::*;
        let result = user_boosters
            .filter(user_id.eq(uid))
            .filter(is_active.eq(true))
            .filter(expires_at.gt(now))
            .order(expires_at.desc())
            .first::<UserBooster>(&mut self.conn()?)
            .optional()?;
        Ok(result)
    }

    fn insert_user_booster(&self, booster: &NewUserBooster) -> StoreResult<UserBooster> {
        use crate::schema::user_boosters::dsl::*;
        diesel::insert_into(user_boosters)
            .values(booster)
            .get_result::<UserBooster>(&mut self.conn()?)
            .map_err(map_unique)
    }

    fn insert_sol_payment(&self, payment: &NewSolPayment) -> StoreResult<SolPayment> {
        use crate::schema::sol_payments::dsl::*;
        let result = diesel::insert_into(sol_payments)
            .values(payment)
            .get_result::<SolPayment>(&mut self.conn()?)
            .map_err(map_unique)?;
        Ok(result)
    }

    fn sum_sol_payments(
        &self,
        kind: PaymentType,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<BigDecimal> {
        use crate::schema::sol_payments::dsl::*;
        let total = sol_payments
            .filter(payment_type.eq(kind.to_string()))
            .filter(created_at.ge(from))
            .filter(created_at.le(to))
            .select(sum(amount_sol))
            .first::<Option<BigDecimal>>(&mut self.conn()?)?;
        Ok(total.unwrap_or_default())
    }

    fn ad_transaction_exists(&self, kind: AdKind, tx_hash: &str) -> StoreResult<bool> {
        let conn = &mut self.conn()?;
        let found = with_ad_table!(kind, t => diesel::select(exists(
            t::table.filter(t::transaction_hash.eq(tx_hash))
        ))
        .get_result::<bool>(conn)?);
        Ok(found)
    }

    fn overlapping_ads(
        &self,
        kind: AdKind,
        slot_in: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Ad>> {
        let conn = &mut self.conn()?;
        let result = with_ad_table!(kind, t => t::table
            .filter(t::slot.eq(slot_in))
            .filter(t::start_date.le(end))
            .filter(t::end_date.ge(start))
            .order(t::start_date.asc())
            .load::<Ad>(conn)?);
        Ok(result)
    }

    fn insert_ad(&self, kind: AdKind, ad: &NewAd, now: DateTime<Utc>) -> StoreResult<Ad> {
        let conn = &mut self.conn()?;
        let result = with_ad_table!(kind, t => diesel::insert_into(t::table)
            .values((
                t::advertiser.eq(&ad.advertiser),
                t::slot.eq(&ad.slot),
                t::title.eq(ad.title.as_deref()),
                t::link_url.eq(&ad.link_url),
                t::image_url.eq(ad.image_url.as_deref()),
                t::start_date.eq(ad.start_date),
                t::end_date.eq(ad.end_date),
                t::price_sol.eq(&ad.price_sol),
                t::total_paid_sol.eq(ad.total_paid_sol.as_ref()),
                t::transaction_hash.eq(&ad.transaction_hash),
                t::is_approved.eq(false),
                t::created_at.eq(now),
            ))
            .get_result::<Ad>(conn)
            .map_err(map_unique)?);
        Ok(result)
    }

    fn set_ad_approved(&self, kind: AdKind, ad_id: i64, approved: bool) -> StoreResult<Option<Ad>> {
        let conn = &mut self.conn()?;
        let result = with_ad_table!(kind, t => diesel::update(t::table.find(ad_id))
            .set(t::is_approved.eq(approved))
            .get_result::<Ad>(conn)
            .optional()?);
        Ok(result)
    }

    fn delete_ad(&self, kind: AdKind, ad_id: i64) -> StoreResult<bool> {
        let conn = &mut self.conn()?;
        let deleted = with_ad_table!(kind, t => diesel::delete(t::table.find(ad_id)).execute(conn)?);
        Ok(deleted > 0)
    }

    fn approved_ads_starting_between(
        &self,
        kind: AdKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Ad>> {
        let conn = &mut self.conn()?;
        let result = with_ad_table!(kind, t => t::table
            .filter(t::is_approved.eq(true))
            .filter(t::start_date.ge(from))
            .filter(t::start_date.le(to))
            .load::<Ad>(conn)?);
        Ok(result)
    }

    fn latest_snapshot(&self) -> StoreResult<Option<PotSnapshot>> {
        use crate::schema::pot_snapshots::dsl::*;
        let result = pot_snapshots
            .order((created_at.desc(), id.desc()))
            .first::<PotSnapshot>(&mut self.conn()?)
            .optional()?;
        Ok(result)
    }

    fn snapshots_since(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<PotSnapshot>> {
        use crate::schema::pot_snapshots::dsl::*;
        let result = pot_snapshots
            .filter(created_at.gt(cutoff))
            .order((created_at.desc(), id.desc()))
            .load::<PotSnapshot>(&mut self.conn()?)?;
        Ok(result)
    }

    fn snapshot_winners(&self, sid: i64) -> StoreResult<Vec<PotSnapshotWinner>> {
        use crate::schema::pot_snapshot_winners::dsl::*;
        let result = pot_snapshot_winners
            .filter(snapshot_id.eq(sid))
            .order(rank.asc())
            .load::<PotSnapshotWinner>(&mut self.conn()?)?;
        Ok(result)
    }

    fn insert_snapshot(
        &self,
        snapshot: &NewPotSnapshot,
        winners: &[NewPotSnapshotWinner],
    ) -> StoreResult<(PotSnapshot, Vec<PotSnapshotWinner>)> {
        use crate::schema::{pot_snapshot_winners as w, pot_snapshots};
        let conn = &mut self.conn()?;
        let result = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let snap = diesel::insert_into(pot_snapshots::table)
                .values(snapshot)
                .get_result::<PotSnapshot>(conn)?;
            let mut rows = Vec::with_capacity(winners.len());
            for winner in winners {
                let row = diesel::insert_into(w::table)
                    .values((
                        w::snapshot_id.eq(snap.id),
                        w::rank.eq(winner.rank),
                        w::user_id.eq(winner.user_id),
                        w::identity.eq(&winner.identity),
                        w::shills.eq(winner.shills),
                        w::percentage.eq(winner.percentage),
                        w::prize_sol.eq(&winner.prize_sol),
                        w::prize_usd.eq(&winner.prize_usd),
                    ))
                    .get_result::<PotSnapshotWinner>(conn)?;
                rows.push(row);
            }
            Ok((snap, rows))
        })?;
        Ok(result)
    }
}
