use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

pub const MAX_TIMEOUT_EVENTS: usize = 1000;
pub const DEFAULT_EVENT_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimeoutEvent {
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub operation: String,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    pub exceeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ServiceTimeoutStats {
    pub total: usize,
    pub exceeded: usize,
    pub ok: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeoutStats {
    pub total: usize,
    pub exceeded: usize,
    pub ok: usize,
    pub success_rate: String,
    pub by_service: BTreeMap<String, ServiceTimeoutStats>,
}

/// In-process ring buffer of timing observations for routes and outbound
/// gateway calls. Only the newest `MAX_TIMEOUT_EVENTS` are kept.
#[derive(Clone)]
pub struct TimeoutMonitor {
    events: Arc<Mutex<VecDeque<TimeoutEvent>>>,
    capacity: usize,
}

impl Default for TimeoutMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutMonitor {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TIMEOUT_EVENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(MAX_TIMEOUT_EVENTS)))),
            capacity: capacity.max(1),
        }
    }

    /// Records a measured operation. `exceeded` is derived from the durations.
    pub fn log(
        &self,
        service: &str,
        operation: &str,
        duration_ms: u64,
        timeout_ms: u64,
        details: Option<serde_json::Value>,
    ) -> TimeoutEvent {
        self.push(TimeoutEvent {
            timestamp: Utc::now(),
            service: service.to_string(),
            operation: operation.to_string(),
            duration_ms,
            timeout_ms,
            exceeded: duration_ms > timeout_ms,
            details,
        })
    }

    /// Records an operation that was cut off at its deadline. Always counts as
    /// exceeded, even when the timer fired on the exact millisecond.
    pub fn log_cut_off(
        &self,
        service: &str,
        operation: &str,
        duration_ms: u64,
        timeout_ms: u64,
        details: Option<serde_json::Value>,
    ) -> TimeoutEvent {
        self.push(TimeoutEvent {
            timestamp: Utc::now(),
            service: service.to_string(),
            operation: operation.to_string(),
            duration_ms,
            timeout_ms,
            exceeded: true,
            details,
        })
    }

    fn push(&self, event: TimeoutEvent) -> TimeoutEvent {
        if event.exceeded {
            tracing::warn!(
                service = %event.service,
                operation = %event.operation,
                duration_ms = event.duration_ms,
                timeout_ms = event.timeout_ms,
                exceeded_by_ms = event.duration_ms.saturating_sub(event.timeout_ms),
                "timeout exceeded"
            );
        } else {
            tracing::debug!(
                service = %event.service,
                operation = %event.operation,
                duration_ms = event.duration_ms,
                timeout_ms = event.timeout_ms,
                margin_ms = event.timeout_ms - event.duration_ms,
                "completed within timeout"
            );
        }

        let mut events = self.events.lock();
        events.push_back(event.clone());
        while events.len() > self.capacity {
            events.pop_front();
        }
        event
    }

    pub fn stats(&self) -> TimeoutStats {
        let events = self.events.lock();
        let total = events.len();
        let exceeded = events.iter().filter(|e| e.exceeded).count();
        let ok = total - exceeded;

        let mut by_service: BTreeMap<String, ServiceTimeoutStats> = BTreeMap::new();
        for event in events.iter() {
            let entry = by_service.entry(event.service.clone()).or_default();
            entry.total += 1;
            if event.exceeded {
                entry.exceeded += 1;
            } else {
                entry.ok += 1;
            }
        }

        let success_rate = if total > 0 {
            format!("{:.2}%", ok as f64 / total as f64 * 100.0)
        } else {
            "N/A".to_string()
        };

        TimeoutStats {
            total,
            exceeded,
            ok,
            success_rate,
            by_service,
        }
    }

    /// Newest `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<TimeoutEvent> {
        let events = self.events.lock();
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn exceeded(&self, limit: usize) -> Vec<TimeoutEvent> {
        let events = self.events.lock();
        let matching: Vec<&TimeoutEvent> = events.iter().filter(|e| e.exceeded).collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
