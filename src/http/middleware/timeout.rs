use crate::service::timeout_monitor::TimeoutMonitor;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::{Duration, Instant};

pub const ROUTE_SERVICE: &str = "Route";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub timeout_ms: u64,
    pub route_name: String,
}

impl TimeoutPolicy {
    pub fn new(timeout_ms: u64, route_name: &str) -> Self {
        Self {
            timeout_ms,
            route_name: route_name.to_string(),
        }
    }

    /// RFID validation at the machine.
    pub fn rfid() -> Self {
        Self::new(5_000, "RFID Operation")
    }

    pub fn machine_auth() -> Self {
        Self::new(5_000, "Machine Authentication")
    }

    pub fn payment() -> Self {
        Self::new(30_000, "Payment Processing")
    }

    pub fn analytics() -> Self {
        Self::new(60_000, "Analytics Report")
    }

    pub fn export() -> Self {
        Self::new(120_000, "File Export")
    }
}

#[derive(Clone)]
pub struct TimeoutState {
    pub policy: TimeoutPolicy,
    pub monitor: TimeoutMonitor,
}

impl TimeoutState {
    pub fn new(policy: TimeoutPolicy, monitor: TimeoutMonitor) -> Self {
        Self { policy, monitor }
    }
}

/// Cuts the handler off after the policy's limit and answers 504. Every
/// request, cut off or not, is recorded in the timeout monitor.
pub async fn enforce(State(state): State<TimeoutState>, request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let url = request.uri().to_string();
    let policy = &state.policy;
    let start = Instant::now();

    match tokio::time::timeout(Duration::from_millis(policy.timeout_ms), next.run(request)).await {
        Ok(response) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            state.monitor.log(
                ROUTE_SERVICE,
                &policy.route_name,
                duration_ms,
                policy.timeout_ms,
                Some(json!({ "method": method, "url": url })),
            );
            response
        }
        Err(_) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::error!(
                route = %policy.route_name,
                method = %method,
                url = %url,
                duration_ms,
                timeout_ms = policy.timeout_ms,
                "request exceeded route timeout"
            );
            state.monitor.log_cut_off(
                ROUTE_SERVICE,
                &policy.route_name,
                duration_ms,
                policy.timeout_ms,
                Some(json!({ "method": method, "url": url })),
            );

            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({
                    "success": false,
                    "error": "Request timeout",
                    "message": format!("Operation timed out after {}ms", policy.timeout_ms),
                    "timeout": true
                })),
            )
                .into_response()
        }
    }
}
