//! `pass-policy-service` — resolve deposit policies and repository
//! requirements for academic submissions against a PASS/Fedora repository.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use pass_policy_service::cli::{Cli, Command};
use pass_policy_service::config::Config;
use pass_policy_service::{setup_tracing, validate_rules_file, PolicyService};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("failed to set up tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Validate { rules_file } => match validate_rules_file(&rules_file) {
            Ok(rules) => {
                info!(policies = rules.policies.len(), "rules document is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("rules document is invalid: {e}");
                ExitCode::FAILURE
            }
        },

        Command::Serve {
            rules_file,
            external,
            internal,
            username,
            password,
            port,
            host,
        } => {
            let mut config = match Config::load(cli.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    error!("failed to load configuration: {e}");
                    return ExitCode::FAILURE;
                }
            };

            if let Some(external) = external {
                config.baseuris.public = external;
            }
            if let Some(internal) = internal {
                config.baseuris.private = internal;
            }
            if let Some(username) = username {
                config.credentials.username = Some(username);
            }
            if password.is_some() {
                config.credentials.password = password;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            info!(
                version = env!("CARGO_PKG_VERSION"),
                host = %config.server.host,
                port = config.server.port,
                "starting pass-policy-service"
            );

            let service = match PolicyService::new(config, &rules_file) {
                Ok(service) => service,
                Err(e) => {
                    error!("failed to initialize policy service: {e}");
                    return ExitCode::FAILURE;
                }
            };

            if let Err(e) = service.run().await {
                error!("policy service error: {e}");
                return ExitCode::FAILURE;
            }

            ExitCode::SUCCESS
        }
    }
}
