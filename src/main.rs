use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use chat_relay::adapters::{
    app_router, ConnectionHub, HttpOptions, InMemoryMessageLog, JwtSessionValidator,
    MockSessionValidator, PostgresMessageLog, WebSocketState,
};
use chat_relay::application::ChatRelay;
use chat_relay::config::{AppConfig, DatabaseConfig};
use chat_relay::ports::{MessageLog, SessionValidator};

/// Token accepted by the development validator when no JWT secret is set.
const DEV_TOKEN: &str = "dev-token";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    tracing::info!(
        environment = ?config.server.environment,
        "chat relay v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let validator = session_validator(&config)?;
    let log = message_log(&config.database, config.relay.history_max_limit).await?;

    let hub = Arc::new(ConnectionHub::new());
    let relay = Arc::new(ChatRelay::new(hub.clone(), log, config.relay.limits()));
    let state = WebSocketState::new(relay, hub, validator);

    let options = HttpOptions {
        cors_origins: config.server.cors_origins_list(),
        request_timeout: Some(config.server.request_timeout()),
    };
    let app = app_router(state, &options);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

/// JSON logs in production, pretty logs elsewhere. `RUST_LOG` overrides the
/// configured filter.
fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.server.log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }
}

fn session_validator(
    config: &AppConfig,
) -> Result<Arc<dyn SessionValidator>, Box<dyn std::error::Error>> {
    match &config.auth.jwt_secret {
        Some(secret) if config.auth.has_secret() => {
            tracing::info!(require_exp = config.auth.require_exp, "using JWT session validator");
            Ok(Arc::new(JwtSessionValidator::new(
                secret.clone(),
                config.auth.require_exp,
            )))
        }
        _ => {
            tracing::warn!(
                token = DEV_TOKEN,
                "no JWT secret configured, accepting only the development token"
            );
            let validator = MockSessionValidator::new().with_test_user(DEV_TOKEN, "dev-user")?;
            Ok(Arc::new(validator))
        }
    }
}

/// Without a database the log keeps only what history can serve.
async fn message_log(
    config: &DatabaseConfig,
    in_memory_capacity: usize,
) -> Result<Arc<dyn MessageLog>, Box<dyn std::error::Error>> {
    let Some(url) = config.url() else {
        tracing::info!(
            capacity = in_memory_capacity,
            "no database configured, recent message history is kept in memory"
        );
        return Ok(Arc::new(InMemoryMessageLog::with_capacity(in_memory_capacity)));
    };

    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(url)
        .await?;

    let log = PostgresMessageLog::new(pool);
    if config.run_migrations {
        log.migrate().await?;
        tracing::info!("database migrations applied");
    }
    tracing::info!("message history is stored in PostgreSQL");
    Ok(Arc::new(log))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
