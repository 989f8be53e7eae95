/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! The wired-up service core.
//!
//! Operations live next to their domain: see `boosters`, `ads`, `shills` and `pot::snapshot`
//! for the `impl Engine` blocks.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{NewSolPayment, PaymentType};
use crate::notify::{self, Notifier};
use crate::payments::{PaymentConfig, PaymentVerifier};
use crate::pot::{self, decimal_from_f64, PotConfig, WeeklyPot};
use crate::price::PriceCache;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub payments: PaymentConfig,
    #[serde(default)]
    pub pot: PotConfig,
}

#[derive(Clone)]
pub struct Engine {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub prices: Arc<PriceCache>,
    pub verifier: Arc<dyn PaymentVerifier>,
    pub notifier: Arc<dyn Notifier>,
    pub config: EngineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("prices", &self.prices)
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn weekly_pot(&self) -> Result<WeeklyPot> {
        pot::compute_weekly_pot(
            self.store.as_ref(),
            self.clock.as_ref(),
            &self.prices,
            &self.config.pot,
        )
        .await
    }

    /// Appends to the payment ledger. Failures are logged, never returned.
    pub(crate) async fn record_payment(
        &self,
        payment_type: PaymentType,
        wallet: &str,
        transaction_hash: &str,
        amount_sol: BigDecimal,
        now: DateTime<Utc>,
    ) {
        let rate = decimal_from_f64(self.prices.sol_usd().await);
        let amount_usd = (&amount_sol * &rate).round(6);
        let payment_type = payment_type.to_string();
        let entry = NewSolPayment {
            wallet,
            payment_type: &payment_type,
            amount_sol,
            amount_usd: Some(amount_usd),
            transaction_hash,
            created_at: now,
        };
        if let Err(e) = self.store.insert_sol_payment(&entry) {
            log::warn!("could not record {payment_type} payment {transaction_hash}: {e}");
        }
    }

    pub(crate) async fn announce(&self, message: String) {
        notify::best_effort(self.notifier.as_ref(), message).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::NullNotifier;
    use crate::payments::TrustingVerifier;
    use crate::price::StaticPrice;
    use crate::store::MemStore;

    pub(crate) struct Harness {
        pub engine: Engine,
        pub store: Arc<MemStore>,
        pub clock: Arc<FixedClock>,
    }

    pub(crate) fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    pub(crate) fn harness(now: &str) -> Harness {
        harness_with(now, Arc::new(TrustingVerifier))
    }

    pub(crate) fn harness_with(now: &str, verifier: Arc<dyn PaymentVerifier>) -> Harness {
        let store = Arc::new(MemStore::new());
        let clock = Arc::new(FixedClock::new(at(now)));
        let engine = Engine {
            store: store.clone(),
            clock: clock.clone(),
            prices: Arc::new(PriceCache::new(Arc::new(StaticPrice(150.0)))),
            verifier,
            notifier: Arc::new(NullNotifier),
            config: EngineConfig {
                payments: PaymentConfig {
                    treasury_wallet: "treasury".into(),
                    allow_test_payments: true,
                },
                pot: PotConfig::default(),
            },
        };
        Harness {
            engine,
            store,
            clock,
        }
    }
}
