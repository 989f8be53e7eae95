use serde_json::{json, Value};
use shillzzz_gungnir::Store;
use warp::http::StatusCode;

use crate::testapp::{TestApp, ADMIN};

fn booking(slot: &str, start: &str, end: &str, tx: &str) -> Value {
    json!({
        "advertiser": "@advertiser",
        "slot": slot,
        "title": "To the moon",
        "link_url": "https://example.org",
        "start_date": start,
        "end_date": end,
        "price_sol": "1.5",
        "transaction_hash": tx
    })
}

fn admin_post(path: &str, wallet: Option<&str>) -> warp::test::RequestBuilder {
    let request = warp::test::request().method("POST").path(path);
    match wallet {
        Some(w) => request.header("x-admin-wallet", w),
        None => request,
    }
}

#[tokio::test]
async fn overlapping_featured_booking_is_rejected() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");

    let first = app
        .post("/ads/featured/submit", &booking("hero", "2024-06-10", "2024-06-12", "tx-1"))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["ad"]["advertiser"], "advertiser");
    assert_eq!(first.body["ad"]["is_approved"], false);

    let clash = app
        .post("/ads/featured/submit", &booking("hero", "2024-06-12", "2024-06-15", "tx-2"))
        .await;
    assert_eq!(clash.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        clash.body["message"],
        "The requested slot is not available for these dates"
    );

    // the banner table is separate
    let banner = app
        .post("/ads/submit", &booking("hero", "2024-06-12", "2024-06-15", "tx-2"))
        .await;
    assert_eq!(banner.status, StatusCode::OK);
}

#[tokio::test]
async fn availability_reports_conflicts() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let booked = app
        .post("/ads/submit", &booking("top", "2024-06-10", "2024-06-12", "tx-1"))
        .await;
    let id = booked.body["ad"]["id"].clone();

    let taken = app
        .get("/ads/availability?kind=banner&slot=top&start=2024-06-12&end=2024-06-20")
        .await;
    assert_eq!(taken.status, StatusCode::OK);
    assert_eq!(taken.body["available"], false);
    assert_eq!(taken.body["conflicts"], json!([id]));

    let free = app
        .get("/ads/availability?kind=featured&slot=top&start=2024-06-12")
        .await;
    assert_eq!(free.body["available"], true);

    let bad = app.get("/ads/availability?slot=top&start=someday").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn moderation_is_limited_to_admin_wallets() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let booked = app
        .post("/ads/submit", &booking("top", "2024-06-05", "2024-06-06", "tx-1"))
        .await;
    let id = booked.body["ad"]["id"].as_i64().expect("ad id");
    let approve = format!("/admin/ads/banner/{id}/approve");

    assert_eq!(app.send(admin_post(&approve, None)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.send(admin_post(&approve, Some("advertiser"))).await.status,
        StatusCode::FORBIDDEN
    );

    let approved = app.send(admin_post(&approve, Some(ADMIN))).await;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["ad"]["is_approved"], true);

    let pot = app.get("/pot").await;
    assert_eq!(pot.body["breakdown"]["banner_sol"], "1.5");
}

#[tokio::test]
async fn rejection_deletes_the_booking() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let booked = app
        .post("/ads/featured/submit", &booking("hero", "2024-06-10", "2024-06-12", "tx-1"))
        .await;
    let id = booked.body["ad"]["id"].as_i64().expect("ad id");
    let reject = format!("/admin/ads/featured/{id}/reject");

    let first = app.send(admin_post(&reject, Some(ADMIN))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert!(!app
        .store
        .ad_transaction_exists(shillzzz_gungnir::AdKind::Featured, "tx-1")
        .expect("store"));

    let again = app.send(admin_post(&reject, Some(ADMIN))).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let unknown_kind = app
        .send(admin_post(&format!("/admin/ads/popup/{id}/reject"), Some(ADMIN)))
        .await;
    assert_eq!(unknown_kind.status, StatusCode::NOT_FOUND);
}
