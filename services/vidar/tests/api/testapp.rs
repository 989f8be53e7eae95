use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde_json::Value;
use shillzzz_gungnir::payments::TrustingVerifier;
use shillzzz_gungnir::price::StaticPrice;
use shillzzz_gungnir::{
    BoosterPack, Engine, EngineConfig, FixedClock, MemStore, NewBoosterPack, NullNotifier,
    PaymentConfig, PotConfig, PriceCache,
};
use std::str::FromStr;
use std::sync::Arc;
use vidar::auth::AdminAllowlist;
use vidar::filters;
use vidar::state::AppState;
use warp::http::StatusCode;

pub const ADMIN: &str = "AdminWallet111";
pub const CRON_SECRET: &str = "cron-s3cret";

/// Test application
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemStore>,
    pub clock: Arc<FixedClock>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

impl TestApp {
    /// Spawns a service on the in-memory store, frozen at `now`.
    pub fn spawn(now: &str) -> Self {
        let store = Arc::new(MemStore::new());
        let clock = Arc::new(FixedClock::new(at(now)));
        let engine = Engine {
            store: store.clone(),
            clock: clock.clone(),
            prices: Arc::new(PriceCache::new(Arc::new(StaticPrice(150.0)))),
            verifier: Arc::new(TrustingVerifier),
            notifier: Arc::new(NullNotifier),
            config: EngineConfig {
                payments: PaymentConfig {
                    treasury_wallet: "Treasury".into(),
                    allow_test_payments: true,
                },
                pot: PotConfig::default(),
            },
        };
        let state = AppState::new(
            engine,
            AdminAllowlist::new([ADMIN]),
            Some(Secret::new(CRON_SECRET.to_string())),
        );
        TestApp {
            state,
            store,
            clock,
        }
    }

    pub fn add_pack(&self, price_sol: &str, multiplier: i32, duration_hours: i32) -> BoosterPack {
        self.state
            .engine
            .add_booster_pack(&NewBoosterPack {
                name: format!("{multiplier}x for {duration_hours}h"),
                price_sol: BigDecimal::from_str(price_sol).expect("valid decimal"),
                multiplier,
                duration_hours,
            })
            .expect("failed to add booster pack")
    }

    pub async fn send(&self, request: warp::test::RequestBuilder) -> TestResponse {
        let routes = filters::routes(self.state.clone());
        let resp = request.reply(&routes).await;
        let body = if resp.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(resp.body()).expect("response is not json")
        };
        TestResponse {
            status: resp.status(),
            body,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(warp::test::request().method("GET").path(path)).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        self.send(
            warp::test::request()
                .method("POST")
                .path(path)
                .json(body),
        )
        .await
    }
}
