mod analyzer;
mod chain;
mod config;
mod errors;
mod noise;
mod predictor;
mod pricing;
mod server;
mod state;

use axum::routing::{get, post};

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("chainlens starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let port = cfg.server_port;
    let app_state = state::AppState::new(cfg);

    let app = axum::Router::new()
        .route("/", get(server::routes::root))
        .route("/health", get(server::routes::health))
        .route("/api/v1/option-chain", get(server::routes::get_option_chain))
        .route("/api/v1/strategies", get(server::routes::get_strategies))
        .route("/api/v1/analysis", get(server::routes::get_analysis))
        .route("/api/v1/market-data", get(server::routes::get_market_data))
        .route(
            "/api/v1/predict-probability",
            post(server::routes::predict_probability),
        )
        .route("/api/v1/counters", get(server::routes::get_counters))
        .route("/ws", get(server::ws::ws_handler))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(app_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
