//! Application bootstrap: configuration, telemetry, storage, listener.

use std::net::SocketAddr;
use std::sync::Arc;

use docgate_api::ApiServer;
use docgate_config::{AppConfig, LogStyle, load_from_env};
use docgate_scratch::ScratchStore;
use docgate_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use docgate_transform::{Dispatcher, PdfiumRasterizer};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the gateway.
pub(crate) struct BootstrapDependencies {
    config: AppConfig,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config = load_from_env().map_err(|err| AppError::config("config.load", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self { config, telemetry })
    }
}

/// Entry point for the application boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or startup fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence over injected dependencies, to simplify testing.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies { config, telemetry } = dependencies;

    let logging = LoggingConfig {
        level: &config.telemetry.log_level,
        format: log_format(config.telemetry.log_style),
        build_sha: option_env!("DOCGATE_BUILD_SHA").unwrap_or("dev"),
    };
    docgate_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("serve");

    info!("Docgate gateway bootstrap starting");

    let store = ScratchStore::open(&config.scratch.root, telemetry.clone())
        .map_err(|err| AppError::scratch("scratch.open", err))?;
    info!(root = %store.root().display(), "scratch storage ready");

    let dispatcher = Dispatcher::new(Arc::new(PdfiumRasterizer::new()), config.pipeline);

    let addr = SocketAddr::new(config.app.bind_addr, config.app.http_port);
    let api = ApiServer::new(config, telemetry, store, dispatcher)
        .map_err(|err| AppError::api_server("api_server.new", err))?;

    info!(addr = %addr, "Launching API listener");
    api.serve(addr)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;

    info!("API server shutdown complete");
    Ok(())
}

const fn log_format(style: LogStyle) -> LogFormat {
    match style {
        LogStyle::Json => LogFormat::Json,
        LogStyle::Pretty => LogFormat::Pretty,
        LogStyle::Infer => LogFormat::infer(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_maps_styles() {
        assert!(matches!(log_format(LogStyle::Json), LogFormat::Json));
        assert!(matches!(log_format(LogStyle::Pretty), LogFormat::Pretty));
        let _inferred = log_format(LogStyle::Infer);
    }

    #[test]
    fn dependencies_build_from_default_environment() -> AppResult<()> {
        let deps = BootstrapDependencies::from_env()?;
        assert!(deps.config.app.http_port > 0);
        Ok(())
    }
}
