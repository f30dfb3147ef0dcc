#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::sync::Arc;
use threadline_server::api::{MgmtState, ServiceContainer};
use threadline_server::config::Config;
use threadline_server::services::health_service::HealthService;
use threadline_server::services::push::{PushProvider, WebhookPushProvider};
use threadline_server::storage::message_repo::MessageRepository;
use threadline_server::storage::notification_repo::NotificationRepository;
use threadline_server::storage::refresh_token_repo::RefreshTokenRepository;
use threadline_server::workers::{InboxSweeperWorker, NotificationDispatchWorker, TokenCleanupWorker, Workers};
use threadline_server::{storage, telemetry};
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    threadline_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx, workers) = async {
        // Phase 1: Infrastructure setup
        let pool = storage::init_pool(&config.database_url).await?;
        threadline_server::run_migrations(&pool).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        threadline_server::spawn_signal_handler(shutdown_tx.clone());

        // Phase 2: Component wiring
        let services = ServiceContainer::build(&config, pool.clone());
        let health_service = HealthService::new(pool.clone());

        let push_provider: Option<Arc<dyn PushProvider>> = config
            .notifications
            .webhook_url
            .clone()
            .map(|url| Arc::new(WebhookPushProvider::new(url)) as Arc<dyn PushProvider>);

        let workers = Workers {
            inbox_sweeper: InboxSweeperWorker::new(pool.clone(), MessageRepository::new(), config.messaging.clone()),
            token_cleanup: TokenCleanupWorker::new(pool.clone(), RefreshTokenRepository::new()),
            notification_dispatch: push_provider.map(|provider| {
                NotificationDispatchWorker::new(
                    pool,
                    NotificationRepository::new(),
                    provider,
                    config.notifications.clone(),
                )
            }),
        };

        // Phase 3: Runtime setup
        let app_router = threadline_server::api::app_router(config.clone(), services);
        let mgmt_app = threadline_server::api::mgmt_router(MgmtState { health_service });

        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        tracing::info!(address = %api_addr, "listening");
        tracing::info!(address = %mgmt_addr, "management server listening");

        let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
        let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr).await?;

        Ok::<
            (
                tokio::net::TcpListener,
                tokio::net::TcpListener,
                axum::Router,
                axum::Router,
                watch::Sender<bool>,
                watch::Receiver<bool>,
                Workers,
            ),
            anyhow::Error,
        >((api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx, workers))
    }
    .instrument(boot_span)
    .await?;

    // Phase 4: Start runtime
    let worker_tasks = workers.spawn_all(shutdown_rx.clone());

    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = mgmt_rx.wait_for(|&s| s).await;
        });

    if let Err(e) = tokio::try_join!(api_server, mgmt_server) {
        tracing::error!(error = %e, "Server error");
    }

    // Phase 5: Graceful shutdown orchestration
    let _ = shutdown_tx.send(true);
    tokio::select! {
        () = async {
            futures::future::join_all(worker_tasks).await;
        } => {
            tracing::info!("Background tasks finished.");
        }
        () = tokio::time::sleep(std::time::Duration::from_secs(config.server.shutdown_timeout_secs)) => {
            tracing::warn!("Timeout waiting for background tasks to finish.");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
