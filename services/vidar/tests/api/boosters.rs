use serde_json::json;
use warp::http::StatusCode;

use crate::testapp::TestApp;

#[tokio::test]
async fn purchase_with_test_payment_succeeds() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let pack = app.add_pack("0.1", 2, 1);

    let resp = app
        .post(
            "/boosters/purchase",
            &json!({ "user": "@alice", "booster_pack_id": pack.id, "payment_method": "test" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["ok"], true);
    assert!(resp.body["transaction_id"]
        .as_str()
        .expect("transaction id")
        .starts_with("test-"));
    assert_eq!(resp.body["booster"]["multiplier"], 2);

    let listing = app.get("/boosters?user=alice").await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.body["packs"].as_array().map(Vec::len), Some(1));
    assert_eq!(listing.body["active"]["booster_pack_id"], pack.id);

    let nobody = app.get("/boosters?user=bob").await;
    assert!(nobody.body["active"].is_null());
}

#[tokio::test]
async fn replayed_transaction_is_rejected_for_another_user() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let pack = app.add_pack("0.1", 2, 1);
    let body = |user: &str| {
        json!({
            "user": user,
            "booster_pack_id": pack.id,
            "payment_data": { "transactionHash": "abc123" }
        })
    };

    let first = app.post("/boosters/purchase", &body("alice")).await;
    assert_eq!(first.status, StatusCode::OK);

    let replay = app.post("/boosters/purchase", &body("bob")).await;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);
    assert_eq!(replay.body["message"], "This transaction has already been used");
}

#[tokio::test]
async fn active_booster_blocks_a_second_purchase_until_it_expires() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let pack = app.add_pack("0.1", 2, 1);
    let buy = || json!({ "user": "alice", "booster_pack_id": pack.id, "payment_method": "test" });

    assert_eq!(app.post("/boosters/purchase", &buy()).await.status, StatusCode::OK);

    app.clock.advance(chrono::Duration::minutes(59));
    let early = app.post("/boosters/purchase", &buy()).await;
    assert_eq!(early.status, StatusCode::BAD_REQUEST);
    assert_eq!(early.body["message"], "You already have an active booster");

    app.clock.advance(chrono::Duration::minutes(2));
    let later = app.post("/boosters/purchase", &buy()).await;
    assert_eq!(later.status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_pack_is_not_found() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let resp = app
        .post(
            "/boosters/purchase",
            &json!({ "user": "alice", "booster_pack_id": 42, "payment_method": "test" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let pack = app.add_pack("0.1", 2, 1);

    let no_pack = app
        .post("/boosters/purchase", &json!({ "user": "alice" }))
        .await;
    assert_eq!(no_pack.status, StatusCode::BAD_REQUEST);

    let no_signature = app
        .post(
            "/boosters/purchase",
            &json!({ "user": "alice", "booster_pack_id": pack.id, "payment_method": "sol" }),
        )
        .await;
    assert_eq!(no_signature.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_signature.body["status"], "400 Bad Request");
}
