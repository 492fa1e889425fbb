//! Report Server
//!
//! Renders report templates into PDF, spreadsheet, word-processor, rich
//! text, CSV and XML documents. Provides REST API endpoints for:
//!
//! - Fixed reports whose templates read their own data from the database
//! - Reports fed with caller rows (`GenerateWithRecordset`) or a caller
//!   table (`GenerateWithDataTable`)
//! - Sample reports built from fixed demonstration data
//!
//! ## Architecture
//!
//! Handlers validate the request and hand it to the rendering pipeline in
//! `report-core`, which runs on the blocking pool:
//!
//! - Rate limiting via tower-governor
//! - ETag client caching on the fixed reports
//! - Request tracing via tower-http

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use report_core::{Exporter, Renderer, TemplateResolver};
use report_engine::{init_font_cache, TypstEngine};
use report_types::ConnectionInfo;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod cache;
mod error;
mod models;
mod samples;
#[cfg(test)]
mod tests;

use api::AppState;
use cache::CachePolicy;

/// Command-line arguments for the report server
#[derive(Parser, Debug)]
#[command(name = "report-server")]
#[command(about = "Report server rendering templates to PDF and data formats")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "REPORT_PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "REPORT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Directory `~/...` report paths resolve against
    #[arg(long, env = "CONTENT_ROOT", default_value = ".")]
    content_root: PathBuf,

    /// Connection string for self-supplying templates
    /// (`Server=..;Database=..;User ID=..;Password=..`)
    #[arg(long, env = "DEFAULT_CONNECTION", hide_env_values = true)]
    connection_string: Option<String>,

    /// Additional font directories
    #[arg(long = "font-dir", env = "REPORT_FONT_DIRS", value_delimiter = ',')]
    font_dirs: Vec<PathBuf>,

    /// Client cache lifetime of fixed reports, in seconds
    #[arg(long, default_value = "60")]
    cache_seconds: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting report server on {}:{}", args.host, args.port);

    let connection = args
        .connection_string
        .as_deref()
        .map(str::parse::<ConnectionInfo>)
        .transpose()?;
    match &connection {
        Some(c) => info!("Database: {} on {}", c.database, c.server),
        None => warn!("No connection string configured; fixed reports reading tables will fail"),
    }

    if !args.font_dirs.is_empty() {
        init_font_cache(&args.font_dirs);
    }

    let engine = TypstEngine::with_postgres();
    let resolver = TemplateResolver::new(&args.content_root);
    info!("Content root: {}", resolver.root().display());

    let state = AppState {
        renderer: Arc::new(Renderer::new(engine.clone(), resolver.clone(), connection)),
        exporter: Arc::new(Exporter::new(engine, resolver)),
        cache: CachePolicy::new(args.cache_seconds),
    };

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(GovernorLayer {
                config: governor_conf,
            })
            .layer(cors),
    );

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
