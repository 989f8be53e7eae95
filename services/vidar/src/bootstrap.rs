/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! This module defines the application type and operations.

use secrecy::ExposeSecret;
use shillzzz_gungnir::{
    Engine, MemStore, NullNotifier, Notifier, PaymentVerifier, PgStore, PriceCache, Store,
    SystemClock,
};
use shillzzz_hugin::{CoinGeckoSource, SolanaRpcVerifier, WebhookNotifier};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use warp::Filter;

use crate::auth::AdminAllowlist;
use crate::error::Result;
use crate::filters;
use crate::settings::Settings;
use crate::state::AppState;

#[derive(Debug)]
pub struct Application {
    addr: SocketAddr,
    state: AppState,
}

impl Application {
    pub fn new(settings: Settings) -> Result<Self> {
        let addr: SocketAddr = settings.application.connection_string().parse()?;
        let engine = build_engine(&settings)?;
        let admins = AdminAllowlist::new(&settings.admin.wallets);
        if admins.is_empty() {
            log::warn!("no admin wallets configured, moderation endpoints are closed");
        }
        let state = AppState::new(engine, admins, settings.cron.secret.clone());
        Ok(Application { addr, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn listen_and_serve(self) {
        let Application { addr, state } = self;
        let cors = warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_headers(vec![
                "Accept",
                "Content-Type",
                "Authorization",
                "Origin",
                "X-Requested-With",
                crate::auth::ADMIN_HEADER,
            ]);
        let routes = filters::routes(state)
            .with(cors)
            .with(warp::log("vidar"));

        log::info!("vidar listening on {addr}");
        warp::serve(routes).run(addr).await;
    }
}

/// Wires the store, price feed, payment verifier and notifier from settings.
pub fn build_engine(settings: &Settings) -> Result<Engine> {
    let store: Arc<dyn Store> = match &settings.database.url {
        Some(url) => Arc::new(PgStore::connect(
            url.expose_secret(),
            settings.database.pool_size,
        )?),
        None => {
            log::warn!("no database configured, using the in-memory store");
            Arc::new(MemStore::new())
        }
    };

    let prices = PriceCache::with_settings(
        Arc::new(CoinGeckoSource::new(&settings.price.url)),
        Duration::from_secs(settings.price.ttl_secs),
        Duration::from_secs(settings.price.timeout_secs),
        settings.price.fallback_usd,
    );
    let verifier: Arc<dyn PaymentVerifier> =
        Arc::new(SolanaRpcVerifier::new(&settings.payments.rpc_url));
    let notifier: Arc<dyn Notifier> = match (&settings.notify.bot_token, &settings.notify.chat_id) {
        (Some(token), Some(chat)) => Arc::new(WebhookNotifier::new(token.clone(), chat)),
        _ => Arc::new(NullNotifier),
    };

    Ok(Engine {
        store,
        clock: Arc::new(SystemClock),
        prices: Arc::new(prices),
        verifier,
        notifier,
        config: settings.engine_config(),
    })
}
