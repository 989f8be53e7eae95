use serde_json::json;
use warp::http::StatusCode;

use crate::testapp::{at, TestApp, CRON_SECRET};

fn cron(path: &str, token: Option<&str>) -> warp::test::RequestBuilder {
    let request = warp::test::request().method("POST").path(path);
    match token {
        Some(t) => request.header("authorization", format!("Bearer {t}")),
        None => request,
    }
}

#[tokio::test]
async fn cron_endpoints_need_the_secret() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    for path in ["/cron/snapshot", "/cron/cleanup", "/cron/counters"] {
        assert_eq!(app.send(cron(path, None)).await.status, StatusCode::FORBIDDEN);
        assert_eq!(
            app.send(cron(path, Some("guess"))).await.status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.send(cron(path, Some(CRON_SECRET))).await.status,
            StatusCode::OK
        );
    }
}

#[tokio::test]
async fn cleanup_purges_old_shills_and_counters_follow() {
    let app = TestApp::spawn("2024-05-27T12:00:00Z");
    let shill = json!({ "user": "dora", "contract_address": "Mint111" });
    assert_eq!(app.post("/shills", &shill).await.status, StatusCode::OK);
    app.clock.set(at("2024-06-05T11:00:00Z"));
    assert_eq!(app.post("/shills", &shill).await.status, StatusCode::OK);

    let cleanup = app.send(cron("/cron/cleanup", Some(CRON_SECRET))).await;
    assert_eq!(cleanup.body["purged_shills"], 1);

    let counters = app.send(cron("/cron/counters", Some(CRON_SECRET))).await;
    assert_eq!(counters.body["updated"], 1);

    let board = app.get("/leaderboard?basis=weekly_shills").await;
    assert_eq!(board.status, StatusCode::OK);
    assert_eq!(board.body, json!([{ "user_id": 1, "identity": "dora", "shills": 1 }]));

    let all_time = app.get("/leaderboard").await;
    assert_eq!(all_time.body[0]["shills"], 2);
}

#[tokio::test]
async fn shill_without_contract_is_rejected() {
    let app = TestApp::spawn("2024-06-05T12:00:00Z");
    let resp = app
        .post("/shills", &json!({ "user": "dora", "contract_address": " " }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["message"], "missing contract address");
}
