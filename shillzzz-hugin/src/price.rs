/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use async_trait::async_trait;
use serde_json::Value;
use shillzzz_gungnir::{PriceSource, Result as GungnirResult};

use crate::error::HuginError;

pub const COINGECKO_SOL_USD: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd";

/// SOL/USD from a CoinGecko-style `simple/price` endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoSource {
    client: reqwest::Client,
    url: String,
}

impl CoinGeckoSource {
    pub fn new(url: &str) -> CoinGeckoSource {
        CoinGeckoSource {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    async fn fetch(&self) -> crate::Result<f64> {
        let body: Value = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_sol_usd(&body)
    }
}

impl Default for CoinGeckoSource {
    fn default() -> Self {
        CoinGeckoSource::new(COINGECKO_SOL_USD)
    }
}

/// Reads `solana.usd` from a `simple/price` response.
pub fn parse_sol_usd(body: &Value) -> crate::Result<f64> {
    body.get("solana")
        .and_then(|s| s.get("usd"))
        .and_then(Value::as_f64)
        .ok_or_else(|| HuginError::RpcError(format!("no solana.usd price in {body}")))
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn sol_usd(&self) -> GungnirResult<f64> {
        Ok(self.fetch().await?)
    }
}
