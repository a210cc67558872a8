use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use presensi_engine::roster::listen_for_roster_changes;
use presensi_engine::RosterCache;
use presensi_events::{
    EmailConfig, EmailNotificationSender, EventBus, LogNotificationSender, NotificationDispatcher,
    NotificationSender,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use presensi_api::config::ServerConfig;
use presensi_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "presensi_api=debug,presensi_engine=debug,presensi_events=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        late_grace_minutes = config.engine.late_grace_minutes,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = presensi_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    presensi_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    presensi_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus + notifications ---
    let event_bus = Arc::new(EventBus::default());

    let sender: Arc<dyn NotificationSender> = match EmailConfig::from_env() {
        Some(email) => {
            tracing::info!(host = %email.smtp_host, "SMTP notifications enabled");
            Arc::new(EmailNotificationSender::new(email).expect("Invalid SMTP configuration"))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, notifications will only be logged");
            Arc::new(LogNotificationSender)
        }
    };
    let dispatcher = NotificationDispatcher::new(pool.clone(), sender);
    let dispatcher_handle = tokio::spawn(dispatcher.run(event_bus.subscribe()));

    // --- Roster cache ---
    let roster = Arc::new(RosterCache::new());
    let roster_cancel = CancellationToken::new();
    let roster_handle = tokio::spawn(listen_for_roster_changes(
        pool.clone(),
        Arc::clone(&roster),
        roster_cancel.clone(),
    ));

    tracing::info!("Background services started (notification dispatcher, roster listener)");

    // --- App ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(pool, Arc::new(config), Arc::clone(&event_bus), roster);
    let app = presensi_api::build_app(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    roster_cancel.cancel();
    let _ = tokio::time::timeout(shutdown_timeout, roster_handle).await;
    tracing::info!("Roster listener stopped");

    // The router held the last other clone of the bus; dropping ours closes
    // the channel so the dispatcher drains and exits.
    drop(event_bus);
    let _ = tokio::time::timeout(shutdown_timeout, dispatcher_handle).await;
    tracing::info!("Notification dispatcher stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
