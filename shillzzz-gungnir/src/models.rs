/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
#![allow(clippy::extra_unused_lifetimes)]

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::schema::{
    booster_packs, pot_snapshots, shills, sol_payments, tokens, user_boosters, users,
};

/// Identity used when a request carries neither wallet nor handle.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentType {
    Booster,
    Banner,
    Featured,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Sol,
    Test,
    Legacy,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdKind {
    Banner,
    Featured,
}

impl AdKind {
    pub fn payment_type(&self) -> PaymentType {
        match self {
            AdKind::Banner => PaymentType::Banner,
            AdKind::Featured => PaymentType::Featured,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

impl Tier {
    pub fn from_total_shills(total: i64) -> Tier {
        match total {
            t if t < 100 => Tier::Bronze,
            t if t < 500 => Tier::Silver,
            t if t < 2000 => Tier::Gold,
            _ => Tier::Diamond,
        }
    }
}

/// Strips a leading `@` and surrounding whitespace; empty input maps to [`ANONYMOUS`].
pub fn normalize_identity(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if stripped.is_empty() {
        ANONYMOUS.to_string()
    } else {
        stripped.to_string()
    }
}

#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i64,
    pub identity: String,
    pub tier: String,
    pub total_shills: i64,
    pub daily_shills: i64,
    pub weekly_shills: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub identity: &'a str,
    pub tier: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = tokens)]
pub struct Token {
    pub id: i64,
    pub contract_address: String,
    pub chain: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_shills: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = tokens)]
pub struct NewToken<'a> {
    pub contract_address: &'a str,
    pub chain: &'a str,
    pub name: Option<&'a str>,
    pub symbol: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = shills)]
pub struct Shill {
    pub id: i64,
    pub user_id: i64,
    pub token_id: i64,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = shills)]
pub struct NewShill {
    pub user_id: i64,
    pub token_id: i64,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = booster_packs)]
pub struct BoosterPack {
    pub id: i64,
    pub name: String,
    pub price_sol: BigDecimal,
    pub multiplier: i32,
    pub duration_hours: i32,
}

#[derive(Insertable, Debug, Clone, Deserialize)]
#[diesel(table_name = booster_packs)]
pub struct NewBoosterPack {
    pub name: String,
    pub price_sol: BigDecimal,
    pub multiplier: i32,
    pub duration_hours: i32,
}

#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[diesel(table_name = user_boosters)]
pub struct UserBooster {
    pub id: i64,
    pub user_id: i64,
    pub booster_pack_id: i64,
    pub multiplier: i32,
    pub transaction_hash: String,
    pub payment_method: String,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserBooster {
    /// "Active" is always computed; the stored flag alone is not trusted.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = user_boosters)]
pub struct NewUserBooster<'a> {
    pub user_id: i64,
    pub booster_pack_id: i64,
    pub multiplier: i32,
    pub transaction_hash: &'a str,
    pub payment_method: &'a str,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Row shape shared by `ad_slots` (banner) and `featured_ads`.
#[derive(Queryable, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ad {
    pub id: i64,
    pub advertiser: String,
    pub slot: String,
    pub title: Option<String>,
    pub link_url: String,
    pub image_url: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_sol: BigDecimal,
    pub total_paid_sol: Option<BigDecimal>,
    pub transaction_hash: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Ad {
    /// Amount counted towards the pot: what was paid, or the list price.
    pub fn earned_sol(&self) -> BigDecimal {
        self.total_paid_sol
            .clone()
            .unwrap_or_else(|| self.price_sol.clone())
    }

    /// Inclusive calendar overlap with `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAd {
    pub advertiser: String,
    pub slot: String,
    pub title: Option<String>,
    pub link_url: String,
    pub image_url: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_sol: BigDecimal,
    pub total_paid_sol: Option<BigDecimal>,
    pub transaction_hash: String,
}

#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = sol_payments)]
pub struct SolPayment {
    pub id: i64,
    pub wallet: String,
    pub payment_type: String,
    pub amount_sol: BigDecimal,
    pub amount_usd: Option<BigDecimal>,
    pub transaction_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = sol_payments)]
pub struct NewSolPayment<'a> {
    pub wallet: &'a str,
    pub payment_type: &'a str,
    pub amount_sol: BigDecimal,
    pub amount_usd: Option<BigDecimal>,
    pub transaction_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[diesel(table_name = pot_snapshots)]
pub struct PotSnapshot {
    pub id: i64,
    pub pot_sol: BigDecimal,
    pub pot_usd: BigDecimal,
    pub sol_usd_rate: BigDecimal,
    pub weekly_earnings_sol: BigDecimal,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub ranking: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = pot_snapshots)]
pub struct NewPotSnapshot {
    pub pot_sol: BigDecimal,
    pub pot_usd: BigDecimal,
    pub sol_usd_rate: BigDecimal,
    pub weekly_earnings_sol: BigDecimal,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub ranking: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotSnapshotWinner {
    pub id: i64,
    pub snapshot_id: i64,
    pub rank: i32,
    pub user_id: i64,
    pub identity: String,
    pub shills: i64,
    pub percentage: i32,
    pub prize_sol: BigDecimal,
    pub prize_usd: BigDecimal,
}

/// A winner row before its snapshot id is known.
#[derive(Debug, Clone)]
pub struct NewPotSnapshotWinner {
    pub rank: i32,
    pub user_id: i64,
    pub identity: String,
    pub shills: i64,
    pub percentage: i32,
    pub prize_sol: BigDecimal,
    pub prize_usd: BigDecimal,
}

/// A user's position on a leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedUser {
    pub user_id: i64,
    pub identity: String,
    pub shills: i64,
}
