use crate::domain::payment::{GatewayOrder, PaymentLink};
use crate::gateways::{GatewayError, OrderRequest, PaymentGateway, PaymentLinkRequest};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Only the newest link requests are remembered.
pub const MAX_RECORDED_LINK_REQUESTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    AlwaysSuccess,
    AlwaysFailure,
    AlwaysTimeout,
}

impl MockBehavior {
    pub fn parse(s: &str) -> Self {
        match s {
            "ALWAYS_FAILURE" => MockBehavior::AlwaysFailure,
            "ALWAYS_TIMEOUT" => MockBehavior::AlwaysTimeout,
            _ => MockBehavior::AlwaysSuccess,
        }
    }
}

/// Stand-in gateway for local runs without Razorpay credentials.
#[derive(Clone)]
pub struct MockGateway {
    pub behavior: MockBehavior,
    pub key_id: String,
    pub checkout_base_url: String,
    links: Arc<Mutex<VecDeque<PaymentLinkRequest>>>,
}

impl MockGateway {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            key_id: "rzp_test_mock".to_string(),
            checkout_base_url: "https://rzp.io/mock".to_string(),
            links: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Most recent payment link requests, oldest first.
    pub fn link_requests(&self) -> Vec<PaymentLinkRequest> {
        self.links.lock().iter().cloned().collect()
    }

    fn fail(&self, operation: &str) -> Option<GatewayError> {
        match self.behavior {
            MockBehavior::AlwaysSuccess => None,
            MockBehavior::AlwaysFailure => Some(GatewayError::Rejected {
                operation: operation.to_string(),
                status: 400,
                body: "mock decline".to_string(),
            }),
            MockBehavior::AlwaysTimeout => Some(GatewayError::Timeout {
                operation: operation.to_string(),
                timeout_ms: 0,
            }),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, GatewayError> {
        if let Some(e) = self.fail("payment link creation") {
            return Err(e);
        }

        let id = format!("plink_mock_{}", uuid::Uuid::new_v4().simple());
        let short_url = format!("{}/{}", self.checkout_base_url, request.reference_id);
        let mut links = self.links.lock();
        links.push_back(request);
        while links.len() > MAX_RECORDED_LINK_REQUESTS {
            links.pop_front();
        }
        drop(links);

        Ok(PaymentLink {
            id,
            short_url,
            status: "created".to_string(),
        })
    }

    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder, GatewayError> {
        if let Some(e) = self.fail("order creation") {
            return Err(e);
        }

        Ok(GatewayOrder {
            id: format!("order_mock_{}", uuid::Uuid::new_v4().simple()),
            amount_minor: request.amount_minor,
            currency: request.currency,
            receipt: request.receipt,
            status: "created".to_string(),
        })
    }
}
