use std::process::ExitCode;

use configs::AppConfig;
use tracing::{error, info, warn};

/// Resolves on Ctrl+C. If the handler cannot be installed the server runs until killed.
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

fn main() -> ExitCode {
    // .env first so RUST_LOG, LOG_FORMAT and the config overrides see it
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let cfg = match AppConfig::load_or_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(n) = cfg.server.worker_threads {
        builder.worker_threads(n);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        worker_threads = ?cfg.server.worker_threads,
        "starting client api"
    );
    match rt.block_on(server::run(cfg, ctrl_c())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "client api stopped with an error");
            ExitCode::FAILURE
        }
    }
}
