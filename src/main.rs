//! `banyan-shield` server binary.

use banyan_config::{ShieldConfig, load_dotenv};
use banyan_core::Server;
use banyan_core::logging::LogConfig;
use banyan_security::nonce::strict_template;
use banyan_security::policy_for_mode;
use banyan_shield::ShieldApp;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Pick up BANYAN_LOG_* from .env before the subscriber is installed.
    if let Err(err) = load_dotenv(None) {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }
    LogConfig::from_env().init();

    let config = match ShieldConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let app = match ShieldApp::from_config(&config) {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "Failed to set up violation forwarding");
            return ExitCode::FAILURE;
        }
    };

    let policy = if config.strict_csp {
        strict_template().to_string()
    } else {
        policy_for_mode(config.mode)
    };

    info!(
        mode = %config.mode,
        report_only = config.report_only,
        strict_csp = config.strict_csp,
        forwarding = config.reporting.forwarding_enabled(),
        policy = %policy,
        "Content Security Policy configured"
    );
    info!(addr = %config.bind_addr(), "Starting banyan-shield");

    let server = Server::new(config.bind_addr(), app)
        .with_body_limit(config.reporting.max_report_bytes);

    match server.listen().await {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Server error");
            ExitCode::FAILURE
        }
    }
}
