use crate::domain::payment::PreparedPaymentOrder;
use anyhow::Result;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// How long an order outlives its expiry before a store may drop it. Within
/// this window execution still sees the order and can report it as expired
/// rather than missing.
pub const EXPIRED_ORDER_GRACE_MINUTES: i64 = 10;

#[async_trait::async_trait]
pub trait PreparedOrderStore: Send + Sync {
    async fn save(&self, order: &PreparedPaymentOrder) -> Result<()>;

    /// Reads the order without consuming it.
    async fn get(&self, reference_id: &str) -> Result<Option<PreparedPaymentOrder>>;

    /// Removes and returns the order. A second call for the same reference
    /// returns `None`.
    async fn take(&self, reference_id: &str) -> Result<Option<PreparedPaymentOrder>>;

    async fn ping(&self) -> bool {
        true
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPreparedOrderStore {
    orders: Arc<Mutex<HashMap<String, PreparedPaymentOrder>>>,
}

impl InMemoryPreparedOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }
}

#[async_trait::async_trait]
impl PreparedOrderStore for InMemoryPreparedOrderStore {
    async fn save(&self, order: &PreparedPaymentOrder) -> Result<()> {
        let cutoff = Utc::now() - Duration::minutes(EXPIRED_ORDER_GRACE_MINUTES);
        let mut orders = self.orders.lock();
        orders.retain(|_, o| o.expires_at > cutoff);
        orders.insert(order.reference_id.clone(), order.clone());
        Ok(())
    }

    async fn get(&self, reference_id: &str) -> Result<Option<PreparedPaymentOrder>> {
        Ok(self.orders.lock().get(reference_id).cloned())
    }

    async fn take(&self, reference_id: &str) -> Result<Option<PreparedPaymentOrder>> {
        Ok(self.orders.lock().remove(reference_id))
    }
}
