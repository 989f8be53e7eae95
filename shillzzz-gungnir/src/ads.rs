/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Banner and featured ad bookings.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{GungnirError, Result};
use crate::models::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    pub conflicts: Vec<i64>,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(GungnirError::Validation(format!("missing {field}")))
    } else {
        Ok(value)
    }
}

/// Trims and checks a submission before anything touches the store.
pub fn validate_submission(ad: &NewAd) -> Result<NewAd> {
    let advertiser = normalize_identity(&ad.advertiser);
    let slot = required(&ad.slot, "slot")?.to_string();
    let link_url = required(&ad.link_url, "link url")?.to_string();
    let transaction_hash = required(&ad.transaction_hash, "transaction hash")?.to_string();

    if ad.end_date < ad.start_date {
        return Err(GungnirError::validation("end date is before start date"));
    }
    if ad.price_sol <= BigDecimal::default() {
        return Err(GungnirError::validation("price must be positive"));
    }
    if let Some(paid) = &ad.total_paid_sol {
        if *paid < BigDecimal::default() {
            return Err(GungnirError::validation("paid amount cannot be negative"));
        }
    }

    Ok(NewAd {
        advertiser,
        slot,
        link_url,
        transaction_hash,
        title: ad.title.as_deref().map(str::trim).map(str::to_string),
        image_url: ad.image_url.as_deref().map(str::trim).map(str::to_string),
        ..ad.clone()
    })
}

impl Engine {
    pub fn ad_availability(
        &self,
        kind: AdKind,
        slot: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Availability> {
        if end < start {
            return Err(GungnirError::validation("end date is before start date"));
        }
        let conflicts: Vec<i64> = self
            .store
            .overlapping_ads(kind, slot.trim(), start, end)?
            .iter()
            .map(|a| a.id)
            .collect();
        Ok(Availability {
            available: conflicts.is_empty(),
            conflicts,
        })
    }

    /// Books `slot` for the requested dates. The booking waits for admin approval.
    pub async fn submit_ad(&self, kind: AdKind, submission: &NewAd) -> Result<Ad> {
        let ad = validate_submission(submission)?;

        if self.store.ad_transaction_exists(kind, &ad.transaction_hash)? {
            log::warn!(
                "{} reused transaction {} for a {kind} ad",
                ad.advertiser,
                ad.transaction_hash
            );
            return Err(GungnirError::TransactionReplayed);
        }
        if !self
            .store
            .overlapping_ads(kind, &ad.slot, ad.start_date, ad.end_date)?
            .is_empty()
        {
            return Err(GungnirError::SlotUnavailable);
        }

        let now = self.now();
        let row = self.store.insert_ad(kind, &ad, now)?;
        log::info!(
            "{kind} ad {} booked {} from {} to {}",
            row.id,
            row.slot,
            row.start_date,
            row.end_date
        );

        self.record_payment(
            kind.payment_type(),
            &row.advertiser,
            &row.transaction_hash,
            row.earned_sol(),
            now,
        )
        .await;
        self.announce(format!(
            "New {kind} ad for {} ({} - {}) awaiting approval",
            row.slot, row.start_date, row.end_date
        ))
        .await;

        Ok(row)
    }

    pub fn approve_ad(&self, kind: AdKind, id: i64) -> Result<Ad> {
        let ad = self
            .store
            .set_ad_approved(kind, id, true)?
            .ok_or_else(|| GungnirError::NotFound(format!("{kind} ad {id}")))?;
        log::info!("{kind} ad {id} approved");
        Ok(ad)
    }

    /// Rejection removes the booking and frees the slot.
    pub fn reject_ad(&self, kind: AdKind, id: i64) -> Result<()> {
        if !self.store.delete_ad(kind, id)? {
            return Err(GungnirError::NotFound(format!("{kind} ad {id}")));
        }
        log::info!("{kind} ad {id} rejected");
        Ok(())
    }
}
