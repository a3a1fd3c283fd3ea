mod config;
mod dispatch;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use capsule_api::AppStateInner;
use capsule_core::{
    Clock, CreateTimeCapsule, EmailService, SendEmail, SystemClock, TimeCapsuleRepository,
};
use capsule_db::{Database, SqliteTimeCapsuleRepository};
use capsule_mail::{LogEmailService, SendGridEmailService};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timecapsule=debug,capsule_core=debug,capsule_db=info,capsule_mail=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Storage and collaborators
    let db = Arc::new(Database::open(&config.db_path)?);
    let repository: Arc<dyn TimeCapsuleRepository> = Arc::new(SqliteTimeCapsuleRepository::new(db));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let email = email_service(&config)?;

    // Background dispatcher
    let send_email = SendEmail::new(repository.clone(), email, clock.clone())
        .with_lookback(config.lookback)
        .with_concurrency(config.delivery_concurrency);
    let create = CreateTimeCapsule::new(repository.clone(), clock).with_min_lead(config.min_lead);
    info!(
        "Dispatch every {}s over a {}s lookback window, min lead {}s",
        config.dispatch_interval_secs,
        send_email.lookback().num_seconds(),
        create.min_lead().num_seconds()
    );
    tokio::spawn(dispatch::run_dispatch_loop(
        Arc::new(send_email),
        config.dispatch_interval_secs,
    ));

    let state = Arc::new(AppStateInner { create, repository });
    let app = capsule_api::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Time capsule server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn email_service(config: &Config) -> anyhow::Result<Arc<dyn EmailService>> {
    match &config.sendgrid_api_key {
        Some(key) => {
            let mut service = SendGridEmailService::new(key.clone())?;
            if let Some(sender) = &config.sender_address {
                service = service.with_sender(sender.clone());
            }
            info!("Email delivery via SendGrid");
            Ok(Arc::new(service))
        }
        None => {
            warn!("SENDGRID_API_KEY not set; capsules will be logged, not emailed");
            Ok(Arc::new(LogEmailService))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
