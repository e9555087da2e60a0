use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use tessera_feed::{
    api::{create_feed_router, create_reputation_router, FeedApiState, ReputationApiState},
    config::FeedConfig,
    feed::FeedService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates all tuning values
    let config = FeedConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check TESSERA_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting Tessera feed engine");
    info!(
        "Anti-abuse guard: {} actions per {}s rolling window",
        config.abuse.max_actions_per_window, config.abuse.window_secs
    );
    info!(
        "Reputation tuning: engagement saturation {}, badge saturation {}, accuracy alpha {}",
        config.reputation.engagement_saturation,
        config.reputation.badge_saturation,
        config.reputation.accuracy_alpha
    );

    let service = Arc::new(FeedService::new(config.service_settings()));

    // Periodically drop idle rate-limit windows so the guard map cannot
    // grow with one-time visitors
    let cleanup_service = service.clone();
    let cleanup_every = Duration::from_secs(config.abuse.window_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            let removed = cleanup_service.run_guard_cleanup();
            if removed > 0 {
                debug!("Dropped {} idle rate-limit windows", removed);
            }
        }
    });

    // Build the application with routes
    let app = Router::new()
        .nest(
            "/api/feed",
            create_feed_router(FeedApiState {
                service: service.clone(),
            })
            .merge(create_reputation_router(ReputationApiState {
                service: service.clone(),
            })),
        )
        // Health check
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http());

    // Start the server on configured host/port
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Tessera feed engine listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging based on configuration
fn init_logging(config: &FeedConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
