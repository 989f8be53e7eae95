/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! Application configuration data structure

use config::Config;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use shillzzz_gungnir::{EngineConfig, PaymentConfig, PotConfig};

use crate::error::Error;

/// Environment variable selecting `settings/<name>.yaml`.
pub const ENVIRONMENT_VAR: &str = "SHILLZZZ_ENVIRONMENT";
const DEFAULT_ENVIRONMENT: &str = "local";

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub application: AppSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub cron: CronSettings,
    pub payments: PaymentSettings,
    #[serde(default)]
    pub price: PriceSettings,
    #[serde(default)]
    pub pot: PotConfig,
    #[serde(default)]
    pub notify: NotifySettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

impl AppSettings {
    pub fn connection_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Without a url the service runs on the in-memory store.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<Secret<String>>,
    #[serde(
        default = "default_pool_size",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    10
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            url: None,
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AdminSettings {
    #[serde(default)]
    pub wallets: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CronSettings {
    pub secret: Option<Secret<String>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PaymentSettings {
    pub treasury_wallet: String,
    pub rpc_url: String,
    #[serde(default)]
    pub allow_test_payments: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PriceSettings {
    pub url: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_fallback_usd")]
    pub fallback_usd: f64,
}

fn default_ttl_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_fallback_usd() -> f64 {
    100.0
}

impl Default for PriceSettings {
    fn default() -> Self {
        PriceSettings {
            url: shillzzz_hugin::price::COINGECKO_SOL_USD.to_string(),
            ttl_secs: default_ttl_secs(),
            timeout_secs: default_timeout_secs(),
            fallback_usd: default_fallback_usd(),
        }
    }
}

/// Telegram announcements are sent only when both fields are set.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NotifySettings {
    pub bot_token: Option<Secret<String>>,
    pub chat_id: Option<String>,
}

impl Settings {
    /// Loads `settings/base.yaml`, the environment file and `SHILLZZZ__*` variables.
    pub fn load() -> Result<Self, Error> {
        let settings_dir = std::env::current_dir()?.join("settings");
        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.into());

        // SHILLZZZ__APPLICATION__PORT sets application.port,
        // SHILLZZZ__ADMIN__WALLETS=a,b sets admin.wallets.
        let builder = Config::builder()
            .add_source(config::File::from(settings_dir.join("base")).required(true))
            .add_source(config::File::from(settings_dir.join(environment)).required(false))
            .add_source(
                config::Environment::with_prefix("SHILLZZZ")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("admin.wallets"),
            );

        let settings = builder.build().and_then(Config::try_deserialize)?;
        Ok(settings)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            payments: PaymentConfig {
                treasury_wallet: self.payments.treasury_wallet.clone(),
                allow_test_payments: self.payments.allow_test_payments,
            },
            pot: self.pot.clone(),
        }
    }
}
