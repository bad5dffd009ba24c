pub mod config;
pub mod domain {
    pub mod payment;
    pub mod wallet;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod caller;
    pub mod handlers {
        pub mod ops;
        pub mod timeouts;
        pub mod wallet;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod timeout;
    }
    pub mod routes;
}
pub mod prepared {
    pub mod store;
    pub mod store_redis;
}
pub mod repo {
    pub mod memory_wallet_repo;
    pub mod wallet_repo;
}
pub mod service {
    pub mod recharge_export;
    pub mod recharge_service;
    pub mod timeout_monitor;
    pub mod wallet_ledger;
}

#[derive(Clone)]
pub struct AppState {
    pub recharge_service: service::recharge_service::RechargeService,
    pub timeout_monitor: service::timeout_monitor::TimeoutMonitor,
}
