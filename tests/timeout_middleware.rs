use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use std::time::Duration;
use tea_wallet::http::middleware::timeout::{enforce, TimeoutPolicy, TimeoutState, ROUTE_SERVICE};
use tea_wallet::service::timeout_monitor::TimeoutMonitor;
use tower::ServiceExt;

fn app(monitor: &TimeoutMonitor, timeout_ms: u64) -> Router {
    Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "done"
            }),
        )
        .route("/fast", get(|| async { "done" }))
        .layer(from_fn_with_state(
            TimeoutState::new(TimeoutPolicy::new(timeout_ms, "Test Route"), monitor.clone()),
            enforce,
        ))
}

#[tokio::test]
async fn slow_handler_gets_504() {
    let monitor = TimeoutMonitor::new();
    let resp = app(&monitor, 50)
        .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["success"], false);
    assert_eq!(v["timeout"], true);
    assert_eq!(v["error"], "Request timeout");
    assert_eq!(v["message"], "Operation timed out after 50ms");

    let exceeded = monitor.exceeded(10);
    assert_eq!(exceeded.len(), 1);
    assert_eq!(exceeded[0].service, ROUTE_SERVICE);
    assert_eq!(exceeded[0].operation, "Test Route");
    assert_eq!(exceeded[0].timeout_ms, 50);
    assert_eq!(exceeded[0].details.as_ref().unwrap()["url"], "/slow");
}

#[tokio::test]
async fn fast_handler_passes_through_and_is_logged_ok() {
    let monitor = TimeoutMonitor::new();
    let resp = app(&monitor, 5_000)
        .oneshot(Request::get("/fast").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"done");

    let events = monitor.recent(10);
    assert_eq!(events.len(), 1);
    assert!(!events[0].exceeded);
    assert_eq!(events[0].details.as_ref().unwrap()["method"], "GET");
}

#[test]
fn predefined_policies_cover_five_to_120_seconds() {
    assert_eq!(TimeoutPolicy::rfid().timeout_ms, 5_000);
    assert_eq!(TimeoutPolicy::machine_auth().timeout_ms, 5_000);
    assert_eq!(TimeoutPolicy::payment().timeout_ms, 30_000);
    assert_eq!(TimeoutPolicy::analytics().timeout_ms, 60_000);
    assert_eq!(TimeoutPolicy::export().timeout_ms, 120_000);
    assert_eq!(TimeoutPolicy::export().route_name, "File Export");
}
