use crate::domain::payment::PreparedPaymentOrder;
use crate::prepared::store::{PreparedOrderStore, EXPIRED_ORDER_GRACE_MINUTES};
use anyhow::Result;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;

#[derive(Clone)]
pub struct PreparedOrderStoreRedis {
    pub client: redis::Client,
}

impl PreparedOrderStoreRedis {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn order_key(reference_id: &str) -> String {
        format!("wallet:prepared_order:{}", reference_id)
    }

    /// Key lifetime: what is left of the order plus the grace window.
    pub fn key_ttl_secs(order: &PreparedPaymentOrder, now: DateTime<Utc>) -> u64 {
        let remaining = (order.expires_at - now).num_seconds().max(0);
        (remaining + EXPIRED_ORDER_GRACE_MINUTES * 60).max(1) as u64
    }
}

#[async_trait::async_trait]
impl PreparedOrderStore for PreparedOrderStoreRedis {
    async fn save(&self, order: &PreparedPaymentOrder) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ttl = Self::key_ttl_secs(order, Utc::now());
        let payload = serde_json::to_string(order)?;
        let _: () = conn
            .set_ex(Self::order_key(&order.reference_id), payload, ttl)
            .await?;
        Ok(())
    }

    async fn get(&self, reference_id: &str) -> Result<Option<PreparedPaymentOrder>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::order_key(reference_id)).await?;

        match payload {
            Some(p) => Ok(Some(serde_json::from_str::<PreparedPaymentOrder>(&p)?)),
            None => Ok(None),
        }
    }

    async fn take(&self, reference_id: &str) -> Result<Option<PreparedPaymentOrder>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = redis::cmd("GETDEL")
            .arg(Self::order_key(reference_id))
            .query_async(&mut conn)
            .await?;

        match payload {
            Some(p) => Ok(Some(serde_json::from_str::<PreparedPaymentOrder>(&p)?)),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> bool {
        if let Ok(mut conn) = self.client.get_multiplexed_async_connection().await {
            let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
            return pong.is_ok();
        }
        false
    }
}
