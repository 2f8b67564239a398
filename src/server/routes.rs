use crate::analyzer::AnalysisOutcome;
use crate::noise::SeededNoise;
use crate::predictor::ScoreFeatures;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use portable_atomic::Ordering::Relaxed;
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct ChainQuery {
    pub symbol: Option<String>,
    pub expiry: Option<String>,
}

/// GET / -- service banner
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "chainlens options analysis API",
        "status": "running",
    }))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/v1/option-chain -- a fresh snapshot for the symbol
pub async fn get_option_chain(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChainQuery>,
) -> Json<serde_json::Value> {
    let symbol = symbol_or_default(&state, params.symbol);
    let mut noise = SeededNoise::from_entropy();
    let snapshot = state
        .generator
        .generate(&symbol, params.expiry.as_deref(), &mut noise);
    state.counters.chains_generated.fetch_add(1, Relaxed);
    Json(serde_json::json!(snapshot))
}

/// GET /api/v1/strategies -- high-probability strategies only.
/// A failed pass surfaces as an empty list, never an error status.
pub async fn get_strategies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChainQuery>,
) -> Json<serde_json::Value> {
    let symbol = symbol_or_default(&state, params.symbol);
    let mut noise = SeededNoise::from_entropy();
    let snapshot = state
        .generator
        .generate(&symbol, params.expiry.as_deref(), &mut noise);
    state.counters.chains_generated.fetch_add(1, Relaxed);

    match state.analyzer.analyze(&snapshot, &mut noise) {
        AnalysisOutcome::Completed(result) => {
            state.counters.analyses_completed.fetch_add(1, Relaxed);
            tracing::info!(
                symbol = %symbol,
                found = result.high_probability_strategies.len(),
                "strategy scan complete"
            );
            Json(serde_json::json!(result.high_probability_strategies))
        }
        AnalysisOutcome::Failed { error, .. } => {
            state.counters.analyses_failed.fetch_add(1, Relaxed);
            tracing::warn!(symbol = %symbol, error = %error, "strategy scan failed");
            Json(serde_json::json!([]))
        }
    }
}

/// GET /api/v1/analysis -- the full pass, success or structured failure
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChainQuery>,
) -> Json<AnalysisOutcome> {
    let symbol = symbol_or_default(&state, params.symbol);
    let mut noise = SeededNoise::from_entropy();
    let snapshot = state
        .generator
        .generate(&symbol, params.expiry.as_deref(), &mut noise);
    state.counters.chains_generated.fetch_add(1, Relaxed);

    let outcome = state.analyzer.analyze(&snapshot, &mut noise);
    if outcome.is_failed() {
        state.counters.analyses_failed.fetch_add(1, Relaxed);
    } else {
        state.counters.analyses_completed.fetch_add(1, Relaxed);
    }
    Json(outcome)
}

/// GET /api/v1/market-data -- breadth indicators plus simulated sentiment
pub async fn get_market_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChainQuery>,
) -> Json<serde_json::Value> {
    let symbol = symbol_or_default(&state, params.symbol);
    let mut noise = SeededNoise::from_entropy();
    let snapshot = state.generator.generate(&symbol, None, &mut noise);
    state.counters.chains_generated.fetch_add(1, Relaxed);

    let indicators = crate::analyzer::indicators::compute(
        &snapshot,
        state.analyzer.config().max_pain_step,
    );

    use crate::noise::NoiseSource;
    Json(serde_json::json!({
        "symbol": symbol,
        "vix": noise.uniform(10.0, 25.0),
        "rsi": noise.uniform(30.0, 70.0),
        "indicators": indicators,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// POST /api/v1/predict-probability -- linear scorer over caller features
pub async fn predict_probability(
    State(state): State<Arc<AppState>>,
    Json(features): Json<ScoreFeatures>,
) -> Json<serde_json::Value> {
    state.counters.predictions_served.fetch_add(1, Relaxed);
    Json(serde_json::json!({ "probability": state.scorer.score(&features) }))
}

/// GET /api/v1/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "chains_generated": state.counters.chains_generated.load(Relaxed),
        "analyses_completed": state.counters.analyses_completed.load(Relaxed),
        "analyses_failed": state.counters.analyses_failed.load(Relaxed),
        "predictions_served": state.counters.predictions_served.load(Relaxed),
        "ws_messages_sent": state.counters.ws_messages_sent.load(Relaxed),
    }))
}

fn symbol_or_default(state: &AppState, symbol: Option<String>) -> String {
    symbol
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.config.default_symbol.clone())
        .to_uppercase()
}
