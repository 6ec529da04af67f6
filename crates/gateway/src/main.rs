//! DocChat API Gateway
//!
//! The entry point for all external requests. Handles:
//! - Document ingestion (builds the retrieval indexes)
//! - Question answering over the indexed corpus
//! - Conversation session management
//! - Observability (logging, tracing)

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use docchat_answer::{ChatEngine, LlmClient, OpenAiChatClient, SessionStore};
use docchat_common::{config::AppConfig, embeddings, Embedder};
use docchat_retrieval::DualRetriever;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionStore>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn LlmClient>,
    /// Swapped wholesale when a new corpus is ingested
    pub engine: Arc<RwLock<Arc<ChatEngine>>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.observability.log_level.clone()));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting DocChat gateway v{}", docchat_common::VERSION);

    let config = Arc::new(config);

    // External collaborators
    let embedder = embeddings::create_embedder(&config.embedding)?;
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiChatClient::new(config.llm.clone())?);
    let sessions = Arc::new(SessionStore::new());

    // Start with an empty corpus; questions degrade to "no context" until
    // documents are ingested
    let retriever =
        DualRetriever::build(&[], embedder.clone(), config.retrieval.top_k).await?;
    let engine = ChatEngine::new(
        retriever,
        llm.clone(),
        sessions.clone(),
        config.retrieval.dedup_prefix_chars,
    );

    let state = AppState {
        config: config.clone(),
        sessions,
        embedder,
        llm,
        engine: Arc::new(RwLock::new(Arc::new(engine))),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Document endpoints
        .route("/documents", post(handlers::documents::ingest_documents))
        // Chat endpoint
        .route("/ask", post(handlers::chat::ask))
        // Session endpoints
        .route(
            "/sessions",
            post(handlers::sessions::create_session).get(handlers::sessions::list_sessions),
        )
        .route("/sessions/{id}", get(handlers::sessions::get_session));

    // Compose the app
    Router::new()
        // Health endpoints (no versioning)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
