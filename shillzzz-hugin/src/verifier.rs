/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Payment verification against a Solana JSON-RPC node.
//!
//! A payment is accepted when the transaction is confirmed without error, the claiming
//! wallet paid the fee (and therefore signed it) and the treasury balance grew by at least
//! the expected amount.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use shillzzz_gungnir::{PaymentVerifier, Result as GungnirResult, VerifiedPayment};

use crate::error::HuginError;

pub const LAMPORTS_PER_SOL: i64 = 1_000_000_000;

#[derive(Debug, Clone)]
pub struct SolanaRpcVerifier {
    client: reqwest::Client,
    rpc_url: String,
}

impl SolanaRpcVerifier {
    pub fn new(rpc_url: &str) -> SolanaRpcVerifier {
        SolanaRpcVerifier {
            client: reqwest::Client::new(),
            rpc_url: rpc_url.to_string(),
        }
    }

    async fn get_transaction(&self, signature: &str) -> crate::Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTransaction",
            "params": [
                signature,
                {
                    "encoding": "jsonParsed",
                    "commitment": "confirmed",
                    "maxSupportedTransactionVersion": 0
                }
            ]
        });
        let response: Value = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(HuginError::RpcError(err.to_string()));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}

fn lamports(balances: &Value, index: usize) -> Option<i64> {
    balances.get(index).and_then(Value::as_i64)
}

/// Checks a `getTransaction` result and returns the SOL credited to `recipient`.
pub fn check_transfer(
    result: &Value,
    expected_sol: &BigDecimal,
    recipient: &str,
    sender: &str,
) -> crate::Result<BigDecimal> {
    if result.is_null() {
        return Err(HuginError::Rejected(
            "transaction not found or not confirmed".to_string(),
        ));
    }
    let meta = result
        .get("meta")
        .ok_or_else(|| HuginError::RpcError("transaction has no meta".to_string()))?;
    if !meta.get("err").map_or(true, Value::is_null) {
        return Err(HuginError::Rejected("transaction failed on chain".to_string()));
    }

    let keys: Vec<&str> = result
        .pointer("/transaction/message/accountKeys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(|k| k.get("pubkey").and_then(Value::as_str).or_else(|| k.as_str()))
                .collect()
        })
        .unwrap_or_default();

    match keys.first() {
        Some(payer) if *payer == sender => {}
        _ => {
            return Err(HuginError::Rejected(
                "transaction was not sent by the claiming wallet".to_string(),
            ))
        }
    }

    let index = keys
        .iter()
        .position(|k| *k == recipient)
        .ok_or_else(|| HuginError::Rejected("treasury is not part of the transaction".to_string()))?;
    let pre = meta.get("preBalances").and_then(|b| lamports(b, index));
    let post = meta.get("postBalances").and_then(|b| lamports(b, index));
    let (pre, post) = match (pre, post) {
        (Some(pre), Some(post)) => (pre, post),
        _ => return Err(HuginError::RpcError("missing balances".to_string())),
    };

    let received = BigDecimal::from(post - pre) / BigDecimal::from(LAMPORTS_PER_SOL);
    if &received < expected_sol {
        return Err(HuginError::Rejected(format!(
            "treasury received {received} SOL, expected {expected_sol} SOL"
        )));
    }
    Ok(received)
}

#[async_trait]
impl PaymentVerifier for SolanaRpcVerifier {
    async fn verify(
        &self,
        signature: &str,
        expected_sol: &BigDecimal,
        recipient: &str,
        sender: &str,
    ) -> GungnirResult<VerifiedPayment> {
        let result = self.get_transaction(signature).await?;
        let amount_sol = check_transfer(&result, expected_sol, recipient, sender)?;
        log::debug!("verified {signature}: {amount_sol} SOL from {sender}");
        Ok(VerifiedPayment {
            signature: signature.to_string(),
            amount_sol,
        })
    }
}
