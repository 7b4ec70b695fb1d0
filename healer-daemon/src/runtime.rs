use std::sync::Arc;

use healer_core::HealerConfig;
use tokio::net::TcpListener;

use crate::adb::AdbControl;
use crate::error::{io_err, DaemonError};
use crate::http::{self, AppState};
use crate::watcher::{WatchSettings, WatcherRegistry};

/// Output format of the daemon's log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: HealerConfig, log_format: LogFormat) -> Result<(), DaemonError> {
    init_tracing(log_format);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon: HTTP server plus every watcher it starts, until ctrl-c.
pub async fn run(config: HealerConfig) -> Result<(), DaemonError> {
    config.validate()?;

    let control = Arc::new(AdbControl::new(config.adb_path.clone(), config.adb_timeout()));
    let registry = WatcherRegistry::new(control, WatchSettings::from_config(&config));
    let app = http::router(AppState {
        registry: Arc::clone(&registry),
        inventory: config.inventory.clone(),
    });

    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|source| DaemonError::Bind {
            addr: config.bind.clone(),
            source,
        })?;
    tracing::info!(
        addr = %config.bind,
        interval_secs = config.heal_interval_secs,
        package = %config.package,
        "healer listening",
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    registry.shutdown();
    served.map_err(|e| io_err("http-server", e))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c, shutting down daemon"),
        Err(err) => {
            tracing::error!(error = %err, "ctrl-c handler failed, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
