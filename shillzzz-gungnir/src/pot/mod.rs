/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Weekly community pot.
//!
//! Every caller that needs the pot (HTTP, cron, jobs) goes through [`compute_weekly_pot`].

pub mod snapshot;

pub use snapshot::{SnapshotOutcome, SnapshotView, PRIZE_SCHEDULE};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{AdKind, PaymentType};
use crate::price::PriceCache;
use crate::store::Store;

/// How snapshot winners are ranked.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RankingBasis {
    /// All-time `users.total_shills`, independent of the pot window.
    #[default]
    AllTimeShills,
    /// Shill points earned inside the pot's week window.
    WeeklyShills,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PotConfig {
    #[serde(default = "default_take_rate_percent")]
    pub take_rate_percent: u32,
    #[serde(default = "default_min_snapshot_usd")]
    pub min_snapshot_usd: f64,
    #[serde(default)]
    pub ranking: RankingBasis,
    /// Offset of the "local" time the week is anchored to.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_take_rate_percent() -> u32 {
    40
}

fn default_min_snapshot_usd() -> f64 {
    1.0
}

impl Default for PotConfig {
    fn default() -> Self {
        PotConfig {
            take_rate_percent: default_take_rate_percent(),
            min_snapshot_usd: default_min_snapshot_usd(),
            ranking: RankingBasis::default(),
            utc_offset_minutes: 0,
        }
    }
}

impl PotConfig {
    pub fn take_rate(&self) -> BigDecimal {
        BigDecimal::from(self.take_rate_percent) / BigDecimal::from(100)
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset"))
    }
}

/// Monday 00:00:01 to Sunday 23:59:59.999 in the configured offset.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl WeekWindow {
    pub fn containing(now: DateTime<Utc>, offset: FixedOffset) -> WeekWindow {
        let local = now.with_timezone(&offset);
        let monday = local.date_naive()
            - Duration::days(local.weekday().num_days_from_monday() as i64);
        let sunday = monday + Duration::days(6);

        let opens = NaiveTime::from_hms_opt(0, 0, 1).expect("valid time");
        let closes = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid time");

        WeekWindow {
            start: to_utc(monday.and_time(opens), offset),
            end: to_utc(sunday.and_time(closes), offset),
            start_date: monday,
            end_date: sunday,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - Duration::seconds(offset.local_minus_utc() as i64)))
}

/// Converts through the shortest decimal representation of `value`.
pub fn decimal_from_f64(value: f64) -> BigDecimal {
    BigDecimal::from_str(&value.to_string()).unwrap_or_default()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EarningsBreakdown {
    pub booster_sol: BigDecimal,
    pub banner_sol: BigDecimal,
    pub featured_sol: BigDecimal,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WeeklyPot {
    pub pot_sol: BigDecimal,
    pub pot_usd: BigDecimal,
    pub sol_usd_rate: BigDecimal,
    pub weekly_earnings_sol: BigDecimal,
    pub breakdown: EarningsBreakdown,
    /// The goal is the pot itself, so progress is always complete.
    pub goal_sol: BigDecimal,
    pub progress: f64,
    pub window: WeekWindow,
}

fn approved_ad_earnings(store: &dyn Store, kind: AdKind, window: &WeekWindow) -> Result<BigDecimal> {
    let ads = store.approved_ads_starting_between(kind, window.start_date, window.end_date)?;
    Ok(ads
        .iter()
        .fold(BigDecimal::default(), |acc, ad| acc + ad.earned_sol()))
}

pub async fn compute_weekly_pot(
    store: &dyn Store,
    clock: &dyn Clock,
    prices: &PriceCache,
    config: &PotConfig,
) -> Result<WeeklyPot> {
    let window = WeekWindow::containing(clock.now(), config.offset());

    let booster_sol = store.sum_sol_payments(PaymentType::Booster, window.start, window.end)?;
    let banner_sol = approved_ad_earnings(store, AdKind::Banner, &window)?;
    let featured_sol = approved_ad_earnings(store, AdKind::Featured, &window)?;

    let weekly_earnings_sol = &booster_sol + &banner_sol + &featured_sol;
    let pot_sol = &weekly_earnings_sol * config.take_rate();

    let sol_usd_rate = decimal_from_f64(prices.sol_usd().await);
    let pot_usd = (&pot_sol * &sol_usd_rate).round(6);

    log::debug!(
        "weekly pot {} SOL from {} SOL earnings ({} - {})",
        pot_sol,
        weekly_earnings_sol,
        window.start,
        window.end
    );

    Ok(WeeklyPot {
        goal_sol: pot_sol.clone(),
        pot_sol,
        pot_usd,
        sol_usd_rate,
        weekly_earnings_sol,
        breakdown: EarningsBreakdown {
            booster_sol,
            banner_sol,
            featured_sol,
        },
        progress: 1.0,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{NewAd, NewSolPayment};
    use crate::price::StaticPrice;
    use crate::store::MemStore;
    use std::sync::Arc;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn payment(store: &MemStore, kind: PaymentType, sol: &str, when: &str) {
        let kind = kind.to_string();
        store
            .insert_sol_payment(&NewSolPayment {
                wallet: "w",
                payment_type: &kind,
                amount_sol: dec(sol),
                amount_usd: None,
                transaction_hash: when,
                created_at: at(when),
            })
            .unwrap();
    }

    fn ad(store: &MemStore, kind: AdKind, start: &str, price: &str, paid: Option<&str>, approve: bool) {
        let d = NaiveDate::from_str(start).unwrap();
        let row = store
            .insert_ad(
                kind,
                &NewAd {
                    advertiser: "adv".into(),
                    slot: start.into(),
                    title: None,
                    link_url: "https://example.org".into(),
                    image_url: None,
                    start_date: d,
                    end_date: d + Duration::days(2),
                    price_sol: dec(price),
                    total_paid_sol: paid.map(dec),
                    transaction_hash: format!("{kind}-{start}-{price}"),
                },
                at("2024-06-01T00:00:00Z"),
            )
            .unwrap();
        if approve {
            store.set_ad_approved(kind, row.id, true).unwrap();
        }
    }

    #[test]
    fn wednesday_is_bracketed_by_monday_and_sunday() {
        let w = WeekWindow::containing(at("2024-06-05T15:30:00Z"), FixedOffset::east_opt(0).unwrap());
        assert_eq!(w.start, at("2024-06-03T00:00:01Z"));
        assert_eq!(w.end, at("2024-06-09T23:59:59.999Z"));
        assert_eq!(w.start_date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(w.end_date, NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
    }

    #[test]
    fn sunday_and_monday_edges() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let sunday = WeekWindow::containing(at("2024-06-09T23:59:59Z"), utc);
        assert_eq!(sunday.start, at("2024-06-03T00:00:01Z"));
        let monday = WeekWindow::containing(at("2024-06-10T08:00:00Z"), utc);
        assert_eq!(monday.start, at("2024-06-10T00:00:01Z"));
        assert!(!sunday.contains(monday.start));
    }

    #[test]
    fn window_follows_local_offset() {
        // Monday 01:00 in UTC+2 is still Sunday evening in UTC.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let w = WeekWindow::containing(at("2024-06-09T23:00:00Z"), plus_two);
        assert_eq!(w.start_date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(w.start, at("2024-06-09T22:00:01Z"));
    }

    #[test]
    fn take_rate_is_forty_percent() {
        assert_eq!(PotConfig::default().take_rate(), dec("0.4"));
    }

    #[tokio::test]
    async fn sums_three_streams_inside_window() {
        let store = MemStore::new();
        payment(&store, PaymentType::Booster, "1.5", "2024-06-04T10:00:00Z");
        payment(&store, PaymentType::Booster, "0.5", "2024-06-09T23:00:00Z");
        // outside the window or not a booster payment
        payment(&store, PaymentType::Booster, "9", "2024-06-02T23:00:00Z");
        payment(&store, PaymentType::Banner, "7", "2024-06-04T10:00:00Z");

        ad(&store, AdKind::Banner, "2024-06-05", "2", Some("2.5"), true);
        ad(&store, AdKind::Banner, "2024-06-06", "3", None, false);
        ad(&store, AdKind::Featured, "2024-06-03", "1", None, true);
        ad(&store, AdKind::Featured, "2024-06-10", "4", None, true);

        let clock = FixedClock::new(at("2024-06-05T12:00:00Z"));
        let prices = PriceCache::new(Arc::new(StaticPrice(150.0)));
        let pot = compute_weekly_pot(&store, &clock, &prices, &PotConfig::default())
            .await
            .unwrap();

        assert_eq!(pot.breakdown.booster_sol, dec("2"));
        assert_eq!(pot.breakdown.banner_sol, dec("2.5"));
        assert_eq!(pot.breakdown.featured_sol, dec("1"));
        assert_eq!(pot.weekly_earnings_sol, dec("5.5"));
        assert_eq!(pot.pot_sol, &pot.weekly_earnings_sol * dec("0.4"));
        assert_eq!(pot.pot_sol, dec("2.2"));
        assert_eq!(pot.pot_usd, dec("330"));
        assert_eq!(pot.goal_sol, pot.pot_sol);
        assert_eq!(pot.progress, 1.0);
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let store = MemStore::new();
        payment(&store, PaymentType::Booster, "0.3", "2024-06-04T10:00:00Z");
        let clock = FixedClock::new(at("2024-06-05T12:00:00Z"));
        let prices = PriceCache::new(Arc::new(StaticPrice(123.45)));
        let config = PotConfig::default();

        let first = compute_weekly_pot(&store, &clock, &prices, &config).await.unwrap();
        let second = compute_weekly_pot(&store, &clock, &prices, &config).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sol_usd_rate, dec("123.45"));
    }

    #[tokio::test]
    async fn empty_week_has_empty_pot() {
        let store = MemStore::new();
        let clock = FixedClock::new(at("2024-06-05T12:00:00Z"));
        let prices = PriceCache::new(Arc::new(StaticPrice(150.0)));
        let pot = compute_weekly_pot(&store, &clock, &prices, &PotConfig::default())
            .await
            .unwrap();
        assert_eq!(pot.pot_sol, BigDecimal::default());
        assert_eq!(pot.pot_usd, BigDecimal::default());
    }
}
