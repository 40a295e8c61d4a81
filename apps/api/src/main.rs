mod config;
mod errors;
mod overlay;
mod routes;
mod session;
mod state;
mod upstream;

use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::overlay::layout::{LayoutProvider, TidyTreeLayout};
use crate::routes::build_router;
use crate::session::context::SessionContext;
use crate::session::questions::{QuestionSource, UpstreamQuestionSource};
use crate::session::transcript::{default_rules, load_rules};
use crate::state::AppState;
use crate::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Copilot API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the talent API client
    let upstream = UpstreamClient::new(
        config.upstream_base_url.clone(),
        Duration::from_secs(config.upstream_timeout_secs),
    );
    info!("Talent API client initialized ({})", config.upstream_base_url);

    // Transcript keyword rules (built-in table unless overridden)
    let rules = match &config.keyword_rules_path {
        Some(path) => load_rules(path)?,
        None => default_rules(),
    };
    info!("Transcript keyword rules loaded ({} rules)", rules.len());

    // Injected collaborators for the overlay engine and question flow
    let layout: Arc<dyn LayoutProvider> = Arc::new(TidyTreeLayout);
    let questions: Arc<dyn QuestionSource> = Arc::new(UpstreamQuestionSource(upstream.clone()));

    // Build app state around the single live session context
    let state = AppState {
        session: Arc::new(Mutex::new(SessionContext::new(rules))),
        upstream,
        questions,
        layout,
        selection: Arc::new(AtomicU64::new(0)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
