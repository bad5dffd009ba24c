use crate::domain::payment::{GatewayOrder, PaymentLink};
use crate::gateways::{GatewayError, OrderRequest, PaymentGateway, PaymentLinkRequest};
use crate::service::timeout_monitor::TimeoutMonitor;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub struct RazorpayGateway {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
    pub monitor: TimeoutMonitor,
}

impl RazorpayGateway {
    async fn post(&self, path: &str, operation: &str, body: Value) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        tracing::info!(operation, url = %url, "calling razorpay");

        let start = Instant::now();
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        let result = match resp {
            Ok(r) if r.status().is_success() => r.json::<Value>().await.map_err(|e| GatewayError::Decode {
                operation: operation.to_string(),
                message: e.to_string(),
            }),
            Ok(r) => {
                let status = r.status().as_u16();
                let body = r.text().await.unwrap_or_default();
                Err(GatewayError::Rejected {
                    operation: operation.to_string(),
                    status,
                    body: body.chars().take(200).collect(),
                })
            }
            Err(e) if e.is_timeout() => Err(GatewayError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.timeout_ms,
            }),
            Err(e) => Err(GatewayError::Network {
                operation: operation.to_string(),
                message: e.to_string(),
            }),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Err(GatewayError::Timeout { .. }) => {
                self.monitor
                    .log_cut_off("Razorpay", operation, elapsed_ms, self.timeout_ms, None);
            }
            _ => {
                self.monitor
                    .log("Razorpay", operation, elapsed_ms, self.timeout_ms, None);
            }
        }

        result
    }
}

#[async_trait::async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, GatewayError> {
        let mut body = json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "description": request.description,
            "reference_id": request.reference_id,
        });

        if let Some(customer) = &request.customer {
            let mut c = serde_json::Map::new();
            if let Some(name) = &customer.name {
                c.insert("name".to_string(), json!(name));
            }
            if let Some(email) = &customer.email {
                c.insert("email".to_string(), json!(email));
            }
            if let Some(contact) = &customer.contact {
                c.insert("contact".to_string(), json!(contact));
            }
            body["customer"] = Value::Object(c);
        }

        // callback_method is mandatory once a callback_url is given.
        if let Some(callback_url) = &request.callback_url {
            body["callback_url"] = json!(callback_url);
            body["callback_method"] = json!("get");
        }

        if let Some(expire_by) = request.expire_by {
            body["expire_by"] = json!(expire_by);
        }

        let operation = "payment link creation";
        let v = self.post("/v1/payment_links", operation, body).await?;
        let field = |name: &str| v.get(name).and_then(|x| x.as_str()).map(ToString::to_string);

        match (field("id"), field("short_url")) {
            (Some(id), Some(short_url)) => Ok(PaymentLink {
                id,
                short_url,
                status: field("status").unwrap_or_else(|| "created".to_string()),
            }),
            _ => Err(GatewayError::Decode {
                operation: operation.to_string(),
                message: "missing id or short_url".to_string(),
            }),
        }
    }

    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let body = json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "receipt": request.receipt,
            "payment_capture": 1
        });

        let operation = "order creation";
        let v = self.post("/v1/orders", operation, body).await?;
        let id = v
            .get("id")
            .and_then(|id| id.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| GatewayError::Decode {
                operation: operation.to_string(),
                message: "missing order id".to_string(),
            })?;

        Ok(GatewayOrder {
            id,
            amount_minor: v.get("amount").and_then(|a| a.as_i64()).unwrap_or(request.amount_minor),
            currency: v
                .get("currency")
                .and_then(|c| c.as_str())
                .map(ToString::to_string)
                .unwrap_or(request.currency),
            receipt: request.receipt,
            status: v
                .get("status")
                .and_then(|s| s.as_str())
                .unwrap_or("created")
                .to_string(),
        })
    }
}
