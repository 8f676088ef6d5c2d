use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::Bot;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;

use eduhub_core::cashfree::CashfreeClient;
use eduhub_core::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cashfree: CashfreeClient,
    pub bot: Bot,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eduhub_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Payment gateway module starting...");
    tracing::info!("Base URL: {}", config.base_url);
    tracing::info!("Cashfree environment: {:?}", config.cashfree_env);

    let cashfree = CashfreeClient::new(
        config.cashfree_client_id.clone(),
        config.cashfree_client_secret.clone(),
        config.cashfree_env,
        config.base_url.clone(),
    );
    let bot = Bot::new(config.bot_token.clone());

    let state = AppState {
        config: Arc::new(config),
        cashfree,
        bot,
    };

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/success", get(handlers::success::success_page))
        .route("/api/webhook", post(handlers::webhook::payment_webhook))
        .route("/api/cashfree/order", post(handlers::order::fetch_order))
        .route("/api/cashfree/create", post(handlers::order::create_order))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.listen_port));
    tracing::info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
