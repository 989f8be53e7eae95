use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use std::str::FromStr;
use warp::http::StatusCode;

use crate::testapp::{TestApp, ADMIN};

fn decimal(v: &Value) -> BigDecimal {
    BigDecimal::from_str(v.as_str().expect("decimal string")).expect("valid decimal")
}

async fn buy_with_sol(app: &TestApp, wallet: &str, pack_id: i64, signature: &str) {
    let resp = app
        .post(
            "/boosters/purchase",
            &json!({
                "wallet_address": wallet,
                "booster_pack_id": pack_id,
                "payment_method": "sol",
                "transaction_signature": signature
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
}

async fn shill(app: &TestApp, user: &str) {
    let resp = app
        .post("/shills", &json!({ "user": user, "contract_address": "Mint111" }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn pot_is_forty_percent_of_weekly_earnings() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let pack = app.add_pack("2.5", 2, 24);
    buy_with_sol(&app, "WalletA", pack.id, "sigA").await;
    buy_with_sol(&app, "WalletB", pack.id, "sigB").await;

    let resp = app.get("/pot").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(decimal(&resp.body["weekly_earnings_sol"]), BigDecimal::from(5));
    assert_eq!(decimal(&resp.body["pot_sol"]), BigDecimal::from(2));
    assert_eq!(decimal(&resp.body["pot_usd"]), BigDecimal::from(300));
    assert_eq!(resp.body["progress"], 1.0);
    assert_eq!(resp.body["window"]["start_date"], "2024-06-03");
    assert_eq!(resp.body["window"]["end_date"], "2024-06-09");
}

#[tokio::test]
async fn snapshot_requires_an_operator() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");

    let anonymous = app
        .send(warp::test::request().method("POST").path("/pot/snapshot"))
        .await;
    assert_eq!(anonymous.status, StatusCode::FORBIDDEN);

    let stranger = app
        .send(
            warp::test::request()
                .method("POST")
                .path("/pot/snapshot")
                .header("x-admin-wallet", "SomeoneElse"),
        )
        .await;
    assert_eq!(stranger.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn snapshot_twice_in_a_minute_returns_the_same_snapshot() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let pack = app.add_pack("2.5", 2, 24);
    buy_with_sol(&app, "WalletA", pack.id, "sigA").await;
    shill(&app, "WalletA").await;
    // WalletA's booster doubles its single shill
    for _ in 0..3 {
        shill(&app, "carol").await;
    }

    let snapshot = || {
        warp::test::request()
            .method("POST")
            .path("/pot/snapshot")
            .header("x-admin-wallet", ADMIN)
    };

    let first = app.send(snapshot()).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["created"], true);
    let id = first.body["snapshot_id"].as_i64().expect("snapshot id");

    let winners = first.body["snapshot"]["winners"]
        .as_array()
        .expect("winners")
        .clone();
    assert_eq!(winners.len(), 2);
    assert_eq!(winners[0]["identity"], "carol");
    assert_eq!(winners[0]["percentage"], 30);
    assert_eq!(decimal(&winners[0]["prize_sol"]), BigDecimal::from_str("0.3").unwrap());
    assert_eq!(winners[1]["percentage"], 20);

    app.clock.advance(chrono::Duration::minutes(1));
    let second = app.send(snapshot()).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["created"], false);
    assert_eq!(second.body["snapshot_id"].as_i64(), Some(id));

    let latest = app.get("/pot/snapshot/latest").await;
    assert_eq!(latest.status, StatusCode::OK);
    assert_eq!(latest.body["snapshot"]["id"].as_i64(), Some(id));
}

#[tokio::test]
async fn tiny_pot_is_not_snapshotted() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let pack = app.add_pack("0.001", 2, 24);
    buy_with_sol(&app, "WalletA", pack.id, "sigA").await;

    let resp = app
        .send(
            warp::test::request()
                .method("POST")
                .path("/pot/snapshot")
                .header("x-admin-wallet", ADMIN),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body["snapshot_id"].is_null());

    let latest = app.get("/pot/snapshot/latest").await;
    assert_eq!(latest.status, StatusCode::NOT_FOUND);
}
