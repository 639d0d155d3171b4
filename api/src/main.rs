// ============================================================================
// BLOG API
// ============================================================================

// - User CRUD with case-insensitive unique usernames and emails
// - Post CRUD, newest first, with cascade delete from the owning user
// - Password login issuing short-lived HS256 JWTs
// - CORS, request tracing, timeouts and concurrency limits
// - Structured logging

use anyhow::Context;
use blog_api::{AppState, config::Config};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blog_api=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let addr = config.bind_addr;
    info!("Loaded configuration: {:?}", config);

    let state = AppState::new(config).context("failed to prepare application state")?;
    let app = blog_api::app(state);

    // Start server
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server running on http://{}", addr);
    info!("API Endpoints:");
    info!("  GET    /health                - Health check");
    info!("  POST   /api/users             - Create account");
    info!("  POST   /api/users/token       - Login (form), returns bearer token");
    info!("  GET    /api/users/me          - Current user (auth)");
    info!("  GET    /api/users/:id         - Public profile");
    info!("  GET    /api/users/:id/posts   - Posts by user (paginated)");
    info!("  PATCH  /api/users/:id         - Update user");
    info!("  DELETE /api/users/:id         - Delete user and their posts");
    info!("  GET    /api/posts             - List posts (paginated)");
    info!("  POST   /api/posts             - Create post");
    info!("  GET    /api/posts/:id         - Get post");
    info!("  PUT    /api/posts/:id         - Replace post");
    info!("  PATCH  /api/posts/:id         - Update post");
    info!("  DELETE /api/posts/:id         - Delete post");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
