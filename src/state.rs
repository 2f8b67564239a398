use crate::analyzer::StrategyAnalyzer;
use crate::chain::synthetic::SyntheticChain;
use crate::config::{AnalyzerConfig, AppConfig};
use crate::predictor::LinearScorer;
use portable_atomic::AtomicU64;
use std::sync::Arc;

// ── Performance counters (lock-free) ──

pub struct PerfCounters {
    pub chains_generated: AtomicU64,
    pub analyses_completed: AtomicU64,
    pub analyses_failed: AtomicU64,
    pub predictions_served: AtomicU64,
    pub ws_messages_sent: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            chains_generated: AtomicU64::new(0),
            analyses_completed: AtomicU64::new(0),
            analyses_failed: AtomicU64::new(0),
            predictions_served: AtomicU64::new(0),
            ws_messages_sent: AtomicU64::new(0),
        }
    }
}

// ── Application shared state ──

/// Shared across handlers. Everything here is read-only configuration or
/// atomic counters: each request brings its own noise source, so no locks
/// are needed and concurrent analysis passes never interfere.
pub struct AppState {
    pub config: AppConfig,
    pub analyzer: StrategyAnalyzer,
    pub generator: SyntheticChain,
    pub scorer: LinearScorer,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let analyzer_cfg = AnalyzerConfig {
            risk_free_rate: config.risk_free_rate,
            ..AnalyzerConfig::default()
        };
        Arc::new(Self {
            config,
            analyzer: StrategyAnalyzer::new(analyzer_cfg.clone()),
            generator: SyntheticChain::new(analyzer_cfg),
            scorer: LinearScorer::new(),
            counters: PerfCounters::new(),
        })
    }
}
