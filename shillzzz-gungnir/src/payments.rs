/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! On-chain payment verification seam and payment identifiers.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{GungnirError, Result};
use crate::models::PaymentMethod;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Wallet that receives booster and ad payments.
    pub treasury_wallet: String,
    /// Accept `test` payments that skip on-chain verification.
    #[serde(default)]
    pub allow_test_payments: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPayment {
    pub signature: String,
    pub amount_sol: BigDecimal,
}

#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Confirms that `signature` settled at least `expected_sol` into `recipient` and was
    /// sent by `sender`.
    async fn verify(
        &self,
        signature: &str,
        expected_sol: &BigDecimal,
        recipient: &str,
        sender: &str,
    ) -> Result<VerifiedPayment>;
}

/// Proof of payment as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentProof {
    pub payment_method: Option<String>,
    pub transaction_signature: Option<String>,
    /// Legacy clients nest the hash in an object.
    pub payment_data: Option<serde_json::Value>,
}

impl PaymentProof {
    pub fn method(&self) -> Result<PaymentMethod> {
        match self.payment_method.as_deref() {
            None | Some("") => Ok(PaymentMethod::Legacy),
            Some(m) => m
                .parse::<PaymentMethod>()
                .map_err(|_| GungnirError::Validation(format!("unknown payment method '{m}'"))),
        }
    }

    /// Resolves the transaction identifier that makes this payment single-use.
    pub fn transaction_id(&self, config: &PaymentConfig, now: DateTime<Utc>) -> Result<String> {
        match self.method()? {
            PaymentMethod::Test => {
                if !config.allow_test_payments {
                    return Err(GungnirError::validation("test payments are disabled"));
                }
                Ok(format!("test-{}", now.timestamp_millis()))
            }
            PaymentMethod::Sol => self
                .transaction_signature
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| GungnirError::validation("missing transaction signature")),
            PaymentMethod::Legacy => self
                .payment_data
                .as_ref()
                .and_then(|d| d.get("transaction_hash").or_else(|| d.get("transactionHash")))
                .and_then(|h| h.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| GungnirError::validation("invalid payment data")),
        }
    }
}

/// A verifier that accepts every payment at face value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustingVerifier;

#[async_trait]
impl PaymentVerifier for TrustingVerifier {
    async fn verify(
        &self,
        signature: &str,
        expected_sol: &BigDecimal,
        _recipient: &str,
        _sender: &str,
    ) -> Result<VerifiedPayment> {
        Ok(VerifiedPayment {
            signature: signature.to_string(),
            amount_sol: expected_sol.clone(),
        })
    }
}
