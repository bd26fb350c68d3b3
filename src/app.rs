//! Process wiring: tracing, storage, git host, worker and HTTP server.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::adapters::events::{HttpFanoutConfig, HttpFanoutPublisher};
use crate::adapters::forgejo::{ForgejoConfig, ForgejoGitHost, HmacSha256Verifier};
use crate::adapters::http::{app_router, AppState, RouterOptions};
use crate::adapters::outbox::{ReconciliationWorker, ReconciliationWorkerConfig};
use crate::adapters::postgres::{
    PostgresClaimMirrorRepository, PostgresOutboxStore, PostgresSubscriberDirectory,
};
use crate::application::{OperationDispatcher, OperationSettings};
use crate::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use crate::domain::foundation::DomainError;
use crate::ports::{CommitAuthor, GitHostError};

/// Failures that stop the process before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("git host client: {0}")]
    GitHost(#[from] GitHostError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `server.log_level`. Production logs are JSON.
pub fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if server.is_production() {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

/// Runs the service until ctrl-c.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let outbox = Arc::new(PostgresOutboxStore::new(pool.clone()));
    let claims = Arc::new(PostgresClaimMirrorRepository::new(pool.clone()));
    let default_branch = config.git_host.default_branch()?;

    let worker = if config.worker.enabled {
        let git_host = Arc::new(ForgejoGitHost::new(forgejo_config(&config)?)?);
        let dispatcher = Arc::new(OperationDispatcher::new(
            git_host,
            claims.clone(),
            OperationSettings::new(
                default_branch.clone(),
                config.git_host.author_email_domain.clone(),
            ),
        ));
        let worker_config = ReconciliationWorkerConfig::default()
            .with_poll_interval(config.worker.poll_interval())
            .with_batch_size(config.worker.batch_size)
            .with_stale_claim_timeout(config.worker.stale_claim_timeout());

        Some(ReconciliationWorker::with_config(outbox.clone(), dispatcher, worker_config).spawn())
    } else {
        tracing::info!("Reconciliation worker disabled");
        None
    };

    let publisher = HttpFanoutPublisher::new(
        Arc::new(PostgresSubscriberDirectory::new(pool.clone())),
        HttpFanoutConfig {
            max_concurrent: config.notifications.max_concurrent,
            max_subscribers_per_event: config.notifications.max_subscribers_per_event,
            timeout: config.notifications.timeout(),
        },
    )?;

    let state = AppState {
        outbox,
        claims,
        event_publisher: Arc::new(publisher),
        webhook_verifier: Arc::new(HmacSha256Verifier::new(config.webhook.secret.clone())),
        default_branch,
    };
    let router = app_router(
        state,
        RouterOptions {
            debug_routes: config.features.debug_routes,
            request_timeout: config.server.request_timeout(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, debug_routes = config.features.debug_routes, "Listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // The worker finishes its in-flight batch before the pool closes.
    if let Some(worker) = worker {
        if let Err(e) = worker.shutdown().await {
            tracing::error!(error = %e, "Reconciliation worker panicked");
        }
    }
    close(pool).await;

    served?;
    Ok(())
}

fn forgejo_config(config: &AppConfig) -> Result<ForgejoConfig, ValidationError> {
    let git_host = &config.git_host;
    let token: SecretString = git_host
        .api_token
        .clone()
        .ok_or(ValidationError::MissingRequired("GIT_HOST__API_TOKEN"))?;

    Ok(
        ForgejoConfig::new(git_host.base_url.clone(), git_host.organization.clone(), token)
            .with_webhook(
                git_host.webhook_callback_url.clone(),
                config.webhook.secret.clone(),
            )
            .with_default_branch(git_host.default_branch()?)
            .with_committer(CommitAuthor {
                name: "claim-mirror".to_string(),
                email: format!("service@{}", git_host.author_email_domain),
            })
            .with_connect_timeout(git_host.connect_timeout())
            .with_request_timeout(git_host.request_timeout()),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn close(pool: PgPool) {
    pool.close().await;
    tracing::info!("Database pool closed");
}
