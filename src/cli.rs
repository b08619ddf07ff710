//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PASS policy service: resolve deposit policies and repository
/// requirements for academic submissions.
#[derive(Parser, Debug)]
#[command(name = "pass-policy-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML).
    #[arg(short, long, env = "PASS_POLICY_SERVICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "PASS_POLICY_SERVICE_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json).
    #[arg(long, env = "PASS_POLICY_SERVICE_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands: run the service, or validate a rules document.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the PASS policy service over HTTP.
    Serve {
        /// Path to the policy rules document.
        rules_file: PathBuf,

        /// External (public) PASS base URI.
        #[arg(short = 'e', long, env = "PASS_EXTERNAL_FEDORA_BASEURL")]
        external: Option<String>,

        /// Internal (private) PASS base URI.
        #[arg(short = 'i', long, env = "PASS_FEDORA_BASEURL")]
        internal: Option<String>,

        /// Username for basic auth to Fedora.
        #[arg(short, long, env = "PASS_FEDORA_USER")]
        username: Option<String>,

        /// Password for basic auth to Fedora.
        #[arg(short, long, env = "PASS_FEDORA_PASSWORD")]
        password: Option<String>,

        /// Port for the policy service HTTP endpoint.
        #[arg(long, env = "POLICY_SERVICE_PORT")]
        port: Option<u16>,

        /// Host to bind to.
        #[arg(long)]
        host: Option<String>,
    },

    /// Validate a given policy rules file against the bundled schema.
    Validate {
        /// Path to the policy rules document.
        rules_file: PathBuf,
    },
}
