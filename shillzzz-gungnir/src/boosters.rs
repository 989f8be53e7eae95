/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Booster admission.
//!
//! A purchase is admitted only if its transaction id has never been used and the buyer
//! holds no active booster. Both rules are checked up front and enforced again by the
//! store's unique constraints, so concurrent purchases cannot slip through.

use bigdecimal::BigDecimal;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{GungnirError, Result, StoreError};
use crate::models::*;
use crate::payments::PaymentProof;
use crate::shills::requested_identity;
use crate::store::BOOSTER_TRANSACTION_CONSTRAINT;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseRequest {
    pub user: Option<String>,
    pub wallet_address: Option<String>,
    pub telegram_handle: Option<String>,
    pub booster_pack_id: i64,
    #[serde(flatten)]
    pub payment: PaymentProof,
}

impl PurchaseRequest {
    pub fn identity(&self) -> String {
        normalize_identity(requested_identity(&[
            self.user.as_deref(),
            self.wallet_address.as_deref(),
            self.telegram_handle.as_deref(),
        ]))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub ok: bool,
    pub booster: UserBooster,
    pub transaction_id: String,
}

/// Maps an insert conflict to the admission rule it broke.
fn admission_conflict(err: StoreError) -> GungnirError {
    match err.violated_constraint() {
        Some(BOOSTER_TRANSACTION_CONSTRAINT) => GungnirError::TransactionReplayed,
        Some(_) => GungnirError::ActiveBoosterExists,
        None => err.into(),
    }
}

impl Engine {
    pub async fn purchase_booster(&self, req: &PurchaseRequest) -> Result<PurchaseReceipt> {
        let now = self.now();
        let identity = req.identity();
        let user = self.store.find_or_create_user(&identity, now)?;

        let method = req.payment.method()?;
        let transaction_id = req.payment.transaction_id(&self.config.payments, now)?;

        if let Some(used) = self.store.user_booster_by_transaction(&transaction_id)? {
            log::warn!(
                "{identity} replayed transaction {transaction_id} (booster {})",
                used.id
            );
            return Err(GungnirError::TransactionReplayed);
        }

        let expired = self.store.expire_user_boosters(Some(user.id), now)?;
        if expired > 0 {
            log::debug!("expired {expired} booster(s) of {identity}");
        }
        if self.store.active_user_booster(user.id, now)?.is_some() {
            return Err(GungnirError::ActiveBoosterExists);
        }

        let pack = self
            .store
            .booster_pack(req.booster_pack_id)?
            .ok_or_else(|| GungnirError::not_found("booster pack"))?;

        let paid_sol = match method {
            PaymentMethod::Sol => {
                let sender = req
                    .wallet_address
                    .as_deref()
                    .map(normalize_identity)
                    .unwrap_or_else(|| identity.clone());
                let verified = self
                    .verifier
                    .verify(
                        &transaction_id,
                        &pack.price_sol,
                        &self.config.payments.treasury_wallet,
                        &sender,
                    )
                    .await?;
                Some(verified.amount_sol)
            }
            PaymentMethod::Test | PaymentMethod::Legacy => None,
        };

        // Verification may have taken a while.
        let now = self.now();
        if self.store.active_user_booster(user.id, now)?.is_some() {
            return Err(GungnirError::ActiveBoosterExists);
        }

        let payment_method = method.to_string();
        let booster = self
            .store
            .insert_user_booster(&NewUserBooster {
                user_id: user.id,
                booster_pack_id: pack.id,
                multiplier: pack.multiplier,
                transaction_hash: &transaction_id,
                payment_method: &payment_method,
                is_active: true,
                expires_at: now + Duration::hours(pack.duration_hours as i64),
                created_at: now,
            })
            .map_err(admission_conflict)?;
        log::info!(
            "{identity} bought {} ({}x until {}) with {payment_method} payment {transaction_id}",
            pack.name,
            booster.multiplier,
            booster.expires_at
        );

        if let Some(amount) = paid_sol {
            self.record_payment(PaymentType::Booster, &identity, &transaction_id, amount, now)
                .await;
        }
        self.announce(format!(
            "{identity} activated {} ({}x for {}h)",
            pack.name, pack.multiplier, pack.duration_hours
        ))
        .await;

        Ok(PurchaseReceipt {
            ok: true,
            booster,
            transaction_id,
        })
    }

    /// The user's current booster, if any. Unknown users simply have none.
    pub fn active_booster(&self, identity: &str) -> Result<Option<UserBooster>> {
        let now = self.now();
        match self.store.find_user(&normalize_identity(identity))? {
            Some(user) => {
                self.store.expire_user_boosters(Some(user.id), now)?;
                Ok(self.store.active_user_booster(user.id, now)?)
            }
            None => Ok(None),
        }
    }

    pub fn booster_catalog(&self) -> Result<Vec<BoosterPack>> {
        Ok(self.store.booster_packs()?)
    }

    pub fn add_booster_pack(&self, pack: &NewBoosterPack) -> Result<BoosterPack> {
        if pack.name.trim().is_empty() {
            return Err(GungnirError::validation("booster pack needs a name"));
        }
        if pack.multiplier < 1 {
            return Err(GungnirError::validation("multiplier must be at least 1"));
        }
        if pack.duration_hours < 1 {
            return Err(GungnirError::validation("duration must be at least one hour"));
        }
        if pack.price_sol < BigDecimal::default() {
            return Err(GungnirError::validation("price cannot be negative"));
        }
        Ok(self.store.insert_booster_pack(pack)?)
    }
}
