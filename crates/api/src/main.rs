use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use goldipuppy_events::{
    EmailServiceConfig, EmailServiceMailer, EventBus, Mailer, OutboxDispatcher, SmtpConfig,
    SmtpMailer,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goldipuppy_api::background::deposit_expiry;
use goldipuppy_api::config::ServerConfig;
use goldipuppy_api::router::build_app_router;
use goldipuppy_api::state::AppState;
use goldipuppy_api::storage::LocalImageStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // LOG_FORMAT=json switches to one JSON object per line.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "goldipuppy_api=debug,goldipuppy_events=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = goldipuppy_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    goldipuppy_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    goldipuppy_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Mail transports ---
    let smtp: Option<Arc<dyn Mailer>> = SmtpConfig::from_env().and_then(|cfg| {
        match SmtpMailer::new(cfg) {
            Ok(mailer) => Some(Arc::new(mailer) as Arc<dyn Mailer>),
            Err(e) => {
                tracing::error!(error = %e, "SMTP transport misconfigured, disabled");
                None
            }
        }
    });
    let email_service: Option<Arc<dyn Mailer>> =
        EmailServiceConfig::from_env().and_then(|cfg| match EmailServiceMailer::new(cfg) {
            Ok(mailer) => Some(Arc::new(mailer) as Arc<dyn Mailer>),
            Err(e) => {
                tracing::error!(error = %e, "Email service transport misconfigured, disabled");
                None
            }
        });
    tracing::info!(
        smtp = smtp.is_some(),
        email_service = email_service.is_some(),
        "Mail transports configured"
    );

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Outbox dispatcher (delivers queued notifications, woken by bus events).
    let dispatcher_cancel = CancellationToken::new();
    let dispatcher = OutboxDispatcher::new(
        pool.clone(),
        smtp.clone(),
        email_service,
        Duration::from_secs(config.outbox_poll_interval_secs.max(1)),
    );
    let dispatcher_handle = tokio::spawn(
        dispatcher.run(event_bus.subscribe(), dispatcher_cancel.clone()),
    );

    // Deposit expiry sweep.
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(deposit_expiry::run(
        pool.clone(),
        Arc::clone(&event_bus),
        config.store.clone(),
        Duration::from_secs(config.deposit_sweep_interval_secs),
        sweep_cancel.clone(),
    ));

    tracing::info!("Background services started (outbox dispatcher, deposit expiry sweep)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        contact_mailer: smtp,
        images: Arc::new(LocalImageStore::new(&config.storage)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
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

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Deposit expiry sweep stopped");

    dispatcher_cancel.cancel();
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Outbox dispatcher stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
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
