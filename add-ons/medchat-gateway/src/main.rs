//! Axum-based gateway for the medical chat responder. Config-driven via CoreConfig.

mod error;
mod handlers;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use medchat_core::{CoreConfig, KnowledgeStore};
use medchat_skills::{ChatPipeline, GenerationSettings, LlmMode, ModelRouter, ResponseComposer};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) pipeline: Arc<ChatPipeline>,
    pub(crate) llm_mode: LlmMode,
}

/// Pre-flight check: config loads, the knowledge store opens, and the port is free.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking knowledge store ({:?})... ", config.storage_backend);
    let store = KnowledgeStore::from_config(&config)
        .map_err(|e| format!("knowledge store LOCKED or inaccessible: {}", e))?;
    println!("OK ({} entries)", store.len());
    drop(store);

    print!("Checking llm_mode '{}'... ", config.llm_mode);
    let router = ModelRouter::from_config(&config).map_err(|e| e.to_string())?;
    println!("OK (resolved to {})", router.mode());

    let addr = format!("{}:{}", config.host, config.port);
    print!("Checking {}... ", addr);
    match std::net::TcpListener::bind(&addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => return Err(format!("{} BLOCKED: {}", addr, e)),
    }

    println!("\nAll checks passed. Ready to start gateway.");
    Ok(())
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::status::status))
        .route("/api/v1/health", get(handlers::status::health))
        .route("/api/v1/kb-status", get(handlers::status::kb_status))
        .route("/chat", post(handlers::chat::chat))
        .route("/ingest", post(handlers::ingest::ingest))
        .with_state(state)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "medchat::gateway", "ctrl-c handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "medchat::gateway", "Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[medchat-gateway] .env not loaded: {} (using system environment)", e);
    }

    if std::env::args().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(CoreConfig::load()?);
    let store = Arc::new(KnowledgeStore::from_config(&config)?);
    let router = ModelRouter::from_config(&config)?;
    let composer = ResponseComposer::from_router(&router, GenerationSettings::from_config(&config));
    let pipeline = Arc::new(ChatPipeline::new(store, composer, config.match_limit));

    let app = build_app(AppState {
        config: Arc::clone(&config),
        pipeline,
        llm_mode: router.mode(),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        target: "medchat::gateway",
        llm_mode = %router.mode(),
        "{} listening on {}",
        config.app_name,
        addr
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
