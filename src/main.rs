use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tea_wallet::config::AppConfig;
use tea_wallet::gateways::mock::{MockBehavior, MockGateway};
use tea_wallet::gateways::razorpay::RazorpayGateway;
use tea_wallet::gateways::PaymentGateway;
use tea_wallet::http::routes::router;
use tea_wallet::prepared::store::{InMemoryPreparedOrderStore, PreparedOrderStore};
use tea_wallet::prepared::store_redis::PreparedOrderStoreRedis;
use tea_wallet::repo::memory_wallet_repo::InMemoryWalletRepo;
use tea_wallet::repo::wallet_repo::WalletRepo;
use tea_wallet::service::recharge_service::{RechargeService, RechargeSettings};
use tea_wallet::service::timeout_monitor::TimeoutMonitor;
use tea_wallet::service::wallet_ledger::WalletLedger;
use tea_wallet::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let timeout_monitor = TimeoutMonitor::new();

    let ledger: Arc<dyn WalletLedger> = match &cfg.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Arc::new(WalletRepo { pool })
        }
        None => {
            tracing::warn!("DATABASE_URL not set, wallet balances live in memory only");
            Arc::new(InMemoryWalletRepo::new(cfg.default_max_wallet_balance))
        }
    };

    let prepared_orders: Arc<dyn PreparedOrderStore> = match &cfg.redis_url {
        Some(url) => Arc::new(PreparedOrderStoreRedis::new(redis::Client::open(url.clone())?)),
        None => {
            tracing::warn!("REDIS_URL not set, prepared orders are kept in process memory");
            Arc::new(InMemoryPreparedOrderStore::new())
        }
    };

    let gateway: Arc<dyn PaymentGateway> = if cfg.razorpay.has_credentials() {
        Arc::new(RazorpayGateway {
            base_url: cfg.razorpay.base_url.clone(),
            key_id: cfg.razorpay.key_id.clone(),
            key_secret: cfg.razorpay.key_secret.clone(),
            timeout_ms: cfg.razorpay.timeout_ms,
            client: reqwest::Client::new(),
            monitor: timeout_monitor.clone(),
        })
    } else {
        tracing::warn!("Razorpay credentials not found, using the mock gateway");
        Arc::new(MockGateway::new(MockBehavior::parse(&cfg.mock_gateway_behavior)))
    };

    if cfg.razorpay.key_secret.is_empty() {
        tracing::warn!("RAZORPAY_KEY_SECRET not set, payment callbacks will be refused");
    }

    let mut settings = RechargeSettings::new(&cfg.razorpay.key_secret, Some(cfg.payment_callback_url.clone()));
    settings.prepared_order_ttl = chrono::Duration::seconds(cfg.prepared_order_ttl_secs);

    let state = AppState {
        recharge_service: RechargeService {
            gateway,
            prepared_orders,
            ledger,
            settings,
        },
        timeout_monitor,
    };

    let app = router(state, cfg.internal_api_key.clone());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
