/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Mutex, MutexGuard};

use super::{
    aggregate_points, PeriodCounters, Store, StoreResult, ACTIVE_BOOSTER_CONSTRAINT,
    BOOSTER_TRANSACTION_CONSTRAINT, SOL_PAYMENT_CONSTRAINT,
};
use crate::error::StoreError;
use crate::models::*;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    tokens: Vec<Token>,
    shills: Vec<Shill>,
    booster_packs: Vec<BoosterPack>,
    user_boosters: Vec<UserBooster>,
    ad_slots: Vec<Ad>,
    featured_ads: Vec<Ad>,
    sol_payments: Vec<SolPayment>,
    pot_snapshots: Vec<PotSnapshot>,
    pot_snapshot_winners: Vec<PotSnapshotWinner>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn ads(&mut self, kind: AdKind) -> &mut Vec<Ad> {
        match kind {
            AdKind::Banner => &mut self.ad_slots,
            AdKind::Featured => &mut self.featured_ads,
        }
    }
}

/// In-memory [`Store`] enforcing the same unique constraints as the Postgres schema.
#[derive(Debug, Default)]
pub struct MemStore {
    tables: Mutex<Tables>,
}

impl MemStore {
    pub fn new() -> MemStore {
        MemStore::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemStore {
    fn find_or_create_user(&self, identity: &str, now: DateTime<Utc>) -> StoreResult<User> {
        let mut t = self.tables()?;
        if let Some(user) = t.users.iter().find(|u| u.identity == identity) {
            return Ok(user.clone());
        }
        let user = User {
            id: t.id(),
            identity: identity.to_string(),
            tier: Tier::Bronze.to_string(),
            total_shills: 0,
            daily_shills: 0,
            weekly_shills: 0,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    fn find_user(&self, identity: &str) -> StoreResult<Option<User>> {
        let t = self.tables()?;
        Ok(t.users.iter().find(|u| u.identity == identity).cloned())
    }

    fn users_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<User>> {
        let t = self.tables()?;
        Ok(t.users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    fn add_user_shills(&self, user_id: i64, points: i64, now: DateTime<Utc>) -> StoreResult<User> {
        let mut t = self.tables()?;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::DieselError(diesel::result::Error::NotFound))?;
        user.total_shills += points;
        user.tier = Tier::from_total_shills(user.total_shills).to_string();
        user.updated_at = now;
        Ok(user.clone())
    }

    fn replace_period_counters(
        &self,
        counters: &PeriodCounters,
        now: DateTime<Utc>,
    ) -> StoreResult<usize> {
        let mut t = self.tables()?;
        let mut updated = 0;
        for user in t.users.iter_mut() {
            match counters.get(&user.id) {
                Some((daily, weekly)) => {
                    user.daily_shills = *daily;
                    user.weekly_shills = *weekly;
                    user.updated_at = now;
                    updated += 1;
                }
                None => {
                    user.daily_shills = 0;
                    user.weekly_shills = 0;
                }
            }
        }
        Ok(updated)
    }

    fn top_users_by_total(&self, limit: i64) -> StoreResult<Vec<RankedUser>> {
        let t = self.tables()?;
        let mut ranked: Vec<RankedUser> = t
            .users
            .iter()
            .filter(|u| u.total_shills > 0)
            .map(|u| RankedUser {
                user_id: u.id,
                identity: u.identity.clone(),
                shills: u.total_shills,
            })
            .collect();
        ranked.sort_by(|a, b| b.shills.cmp(&a.shills).then(a.user_id.cmp(&b.user_id)));
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }

    fn shill_points_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<(i64, i64)>> {
        let t = self.tables()?;
        Ok(aggregate_points(
            t.shills
                .iter()
                .filter(|s| s.created_at >= from && s.created_at <= to)
                .map(|s| (s.user_id, s.points)),
        ))
    }

    fn find_or_create_token(&self, token: &NewToken) -> StoreResult<Token> {
        let mut t = self.tables()?;
        if let Some(found) = t
            .tokens
            .iter()
            .find(|k| k.contract_address == token.contract_address)
        {
            return Ok(found.clone());
        }
        let created = Token {
            id: t.id(),
            contract_address: token.contract_address.to_string(),
            chain: token.chain.to_string(),
            name: token.name.map(str::to_string),
            symbol: token.symbol.map(str::to_string),
            total_shills: 0,
            created_at: token.created_at,
        };
        t.tokens.push(created.clone());
        Ok(created)
    }

    fn insert_shill(&self, shill: &NewShill) -> StoreResult<Shill> {
        let mut t = self.tables()?;
        let row = Shill {
            id: t.id(),
            user_id: shill.user_id,
            token_id: shill.token_id,
            points: shill.points,
            created_at: shill.created_at,
        };
        if let Some(token) = t.tokens.iter_mut().find(|k| k.id == shill.token_id) {
            token.total_shills += shill.points;
        }
        t.shills.push(row.clone());
        Ok(row)
    }

    fn purge_shills_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut t = self.tables()?;
        let before = t.shills.len();
        t.shills.retain(|s| s.created_at >= cutoff);
        Ok(before - t.shills.len())
    }

    fn booster_packs(&self) -> StoreResult<Vec<BoosterPack>> {
        let t = self.tables()?;
        let mut packs = t.booster_packs.clone();
        packs.sort_by(|a, b| a.price_sol.cmp(&b.price_sol).then(a.id.cmp(&b.id)));
        Ok(packs)
    }

    fn booster_pack(&self, id: i64) -> StoreResult<Option<BoosterPack>> {
        let t = self.tables()?;
        Ok(t.booster_packs.iter().find(|p| p.id == id).cloned())
    }

    fn insert_booster_pack(&self, pack: &NewBoosterPack) -> StoreResult<BoosterPack> {
        let mut t = self.tables()?;
        let row = BoosterPack {
            id: t.id(),
            name: pack.name.clone(),
            price_sol: pack.price_sol.clone(),
            multiplier: pack.multiplier,
            duration_hours: pack.duration_hours,
        };
        t.booster_packs.push(row.clone());
        Ok(row)
    }

    fn user_booster_by_transaction(&self, tx_hash: &str) -> StoreResult<Option<UserBooster>> {
        let t = self.tables()?;
        Ok(t.user_boosters
            .iter()
            .find(|b| b.transaction_hash == tx_hash)
            .cloned())
    }

    fn expire_user_boosters(&self, user_id: Option<i64>, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut t = self.tables()?;
        let mut expired = 0;
        for booster in t.user_boosters.iter_mut().filter(|b| {
            user_id.map_or(true, |u| b.user_id == u) && b.is_active && b.expires_at <= now
        }) {
            booster.is_active = false;
            expired += 1;
        }
        Ok(expired)
    }

    fn active_user_booster(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserBooster>> {
        let t = self.tables()?;
        Ok(t.user_boosters
            .iter()
            .filter(|b| b.user_id == user_id && b.is_active_at(now))
            .max_by_key(|b| b.expires_at)
            .cloned())
    }

    fn insert_user_booster(&self, booster: &NewUserBooster) -> StoreResult<UserBooster> {
        let mut t = self.tables()?;
        if t.user_boosters
            .iter()
            .any(|b| b.transaction_hash == booster.transaction_hash)
        {
            return Err(StoreError::UniqueViolation(
                BOOSTER_TRANSACTION_CONSTRAINT.to_string(),
            ));
        }
        if booster.is_active
            && t.user_boosters
                .iter()
                .any(|b| b.user_id == booster.user_id && b.is_active)
        {
            return Err(StoreError::UniqueViolation(
                ACTIVE_BOOSTER_CONSTRAINT.to_string(),
            ));
        }
        let row = UserBooster {
            id: t.id(),
            user_id: booster.user_id,
            booster_pack_id: booster.booster_pack_id,
            multiplier: booster.multiplier,
            transaction_hash: booster.transaction_hash.to_string(),
            payment_method: booster.payment_method.to_string(),
            is_active: booster.is_active,
            expires_at: booster.expires_at,
            created_at: booster.created_at,
        };
        t.user_boosters.push(row.clone());
        Ok(row)
    }

    fn insert_sol_payment(&self, payment: &NewSolPayment) -> StoreResult<SolPayment> {
        let mut t = self.tables()?;
        if t.sol_payments.iter().any(|p| {
            p.payment_type == payment.payment_type && p.transaction_hash == payment.transaction_hash
        }) {
            return Err(StoreError::UniqueViolation(
                SOL_PAYMENT_CONSTRAINT.to_string(),
            ));
        }
        let row = SolPayment {
            id: t.id(),
            wallet: payment.wallet.to_string(),
            payment_type: payment.payment_type.to_string(),
            amount_sol: payment.amount_sol.clone(),
            amount_usd: payment.amount_usd.clone(),
            transaction_hash: payment.transaction_hash.to_string(),
            created_at: payment.created_at,
        };
        t.sol_payments.push(row.clone());
        Ok(row)
    }

    fn sum_sol_payments(
        &self,
        payment_type: PaymentType,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<BigDecimal> {
        let t = self.tables()?;
        let kind = payment_type.to_string();
        Ok(t.sol_payments
            .iter()
            .filter(|p| p.payment_type == kind && p.created_at >= from && p.created_at <= to)
            .fold(BigDecimal::default(), |acc, p| acc + &p.amount_sol))
    }

    fn ad_transaction_exists(&self, kind: AdKind, tx_hash: &str) -> StoreResult<bool> {
        let mut t = self.tables()?;
        Ok(t.ads(kind).iter().any(|a| a.transaction_hash == tx_hash))
    }

    fn overlapping_ads(
        &self,
        kind: AdKind,
        slot: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Ad>> {
        let mut t = self.tables()?;
        let mut found: Vec<Ad> = t
            .ads(kind)
            .iter()
            .filter(|a| a.slot == slot && a.overlaps(start, end))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.start_date);
        Ok(found)
    }

    fn insert_ad(&self, kind: AdKind, ad: &NewAd, now: DateTime<Utc>) -> StoreResult<Ad> {
        let mut t = self.tables()?;
        let row = Ad {
            id: t.id(),
            advertiser: ad.advertiser.clone(),
            slot: ad.slot.clone(),
            title: ad.title.clone(),
            link_url: ad.link_url.clone(),
            image_url: ad.image_url.clone(),
            start_date: ad.start_date,
            end_date: ad.end_date,
            price_sol: ad.price_sol.clone(),
            total_paid_sol: ad.total_paid_sol.clone(),
            transaction_hash: ad.transaction_hash.clone(),
            is_approved: false,
            created_at: now,
        };
        t.ads(kind).push(row.clone());
        Ok(row)
    }

    fn set_ad_approved(&self, kind: AdKind, id: i64, approved: bool) -> StoreResult<Option<Ad>> {
        let mut t = self.tables()?;
        Ok(t.ads(kind).iter_mut().find(|a| a.id == id).map(|a| {
            a.is_approved = approved;
            a.clone()
        }))
    }

    fn delete_ad(&self, kind: AdKind, id: i64) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let ads = t.ads(kind);
        let before = ads.len();
        ads.retain(|a| a.id != id);
        Ok(ads.len() < before)
    }

    fn approved_ads_starting_between(
        &self,
        kind: AdKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Ad>> {
        let mut t = self.tables()?;
        Ok(t.ads(kind)
            .iter()
            .filter(|a| a.is_approved && a.start_date >= from && a.start_date <= to)
            .cloned()
            .collect())
    }

    fn latest_snapshot(&self) -> StoreResult<Option<PotSnapshot>> {
        let t = self.tables()?;
        Ok(t.pot_snapshots
            .iter()
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    fn snapshots_since(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<PotSnapshot>> {
        let t = self.tables()?;
        let mut recent: Vec<PotSnapshot> = t
            .pot_snapshots
            .iter()
            .filter(|s| s.created_at > cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(recent)
    }

    fn snapshot_winners(&self, snapshot_id: i64) -> StoreResult<Vec<PotSnapshotWinner>> {
        let t = self.tables()?;
        let mut winners: Vec<PotSnapshotWinner> = t
            .pot_snapshot_winners
            .iter()
            .filter(|w| w.snapshot_id == snapshot_id)
            .cloned()
            .collect();
        winners.sort_by_key(|w| w.rank);
        Ok(winners)
    }

    fn insert_snapshot(
        &self,
        snapshot: &NewPotSnapshot,
        winners: &[NewPotSnapshotWinner],
    ) -> StoreResult<(PotSnapshot, Vec<PotSnapshotWinner>)> {
        let mut t = self.tables()?;
        let snap = PotSnapshot {
            id: t.id(),
            pot_sol: snapshot.pot_sol.clone(),
            pot_usd: snapshot.pot_usd.clone(),
            sol_usd_rate: snapshot.sol_usd_rate.clone(),
            weekly_earnings_sol: snapshot.weekly_earnings_sol.clone(),
            week_start: snapshot.week_start,
            week_end: snapshot.week_end,
            ranking: snapshot.ranking.clone(),
            created_at: snapshot.created_at,
        };
        let mut rows = Vec::with_capacity(winners.len());
        for winner in winners {
            let row = PotSnapshotWinner {
                id: t.id(),
                snapshot_id: snap.id,
                rank: winner.rank,
                user_id: winner.user_id,
                identity: winner.identity.clone(),
                shills: winner.shills,
                percentage: winner.percentage,
                prize_sol: winner.prize_sol.clone(),
                prize_usd: winner.prize_usd.clone(),
            };
            rows.push(row);
        }
        t.pot_snapshots.push(snap.clone());
        t.pot_snapshot_winners.extend(rows.iter().cloned());
        Ok((snap, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap()
    }

    fn booster<'a>(user_id: i64, tx: &'a str, expires_at: DateTime<Utc>) -> NewUserBooster<'a> {
        NewUserBooster {
            user_id,
            booster_pack_id: 1,
            multiplier: 2,
            transaction_hash: tx,
            payment_method: "sol",
            is_active: true,
            expires_at,
            created_at: now(),
        }
    }

    #[test]
    fn users_are_created_once() {
        let store = MemStore::new();
        let a = store.find_or_create_user("degen", now()).unwrap();
        let b = store.find_or_create_user("degen", now()).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.tier, "bronze");
    }

    #[test]
    fn booster_transaction_hash_is_unique() {
        let store = MemStore::new();
        store
            .insert_user_booster(&booster(1, "sig", now() + Duration::hours(1)))
            .unwrap();
        let err = store
            .insert_user_booster(&booster(2, "sig", now() + Duration::hours(1)))
            .unwrap_err();
        assert_eq!(err.violated_constraint(), Some(BOOSTER_TRANSACTION_CONSTRAINT));
    }

    #[test]
    fn only_one_flagged_active_booster_per_user() {
        let store = MemStore::new();
        store
            .insert_user_booster(&booster(1, "a", now() + Duration::hours(1)))
            .unwrap();
        let err = store
            .insert_user_booster(&booster(1, "b", now() + Duration::hours(1)))
            .unwrap_err();
        assert_eq!(err.violated_constraint(), Some(ACTIVE_BOOSTER_CONSTRAINT));

        store.expire_user_boosters(Some(1), now() + Duration::hours(2)).unwrap();
        assert!(store
            .insert_user_booster(&booster(1, "b", now() + Duration::hours(3)))
            .is_ok());
    }

    #[test]
    fn purge_drops_only_old_shills() {
        let store = MemStore::new();
        for days in [1, 6, 8, 10] {
            store
                .insert_shill(&NewShill {
                    user_id: 1,
                    token_id: 1,
                    points: 1,
                    created_at: now() - Duration::days(days),
                })
                .unwrap();
        }
        assert_eq!(store.purge_shills_before(now() - Duration::days(7)).unwrap(), 2);
        let left = store
            .shill_points_between(now() - Duration::days(30), now())
            .unwrap();
        assert_eq!(left, vec![(1, 2)]);
    }
}
