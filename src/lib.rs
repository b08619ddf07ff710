//! PASS policy service
//!
//! Resolves the deposit policies and canonical repository requirements
//! applicable to a scholarly-submission URI, against a declarative rules
//! document evaluated over the submission's JSON-LD entity graph.
//!
//! # Features
//!
//! - **Rules DSL**: variable expansion, condition evaluation, and template
//!   expansion over a PASS/Fedora entity graph (see [`policy_core`]).
//! - **Requirements analysis**: canonical `required`/`oneOf`/`optional`
//!   repository partitions, reconciled against a submission's own
//!   `effectivePolicies`.
//! - **HTTP surface**: `/policies`, `/repositories`, `/health`.
//! - **Schema validation**: a `validate` CLI command for rules documents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;

pub use error::{Error, Result};

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use policy_core::{BaseUris, RulesDocument};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::client::ReqwestFetcher;
use crate::config::Config;
use crate::http::{create_router, AppState};

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// This never currently fails but returns a `Result` to match the
/// subscriber-initialization idiom used elsewhere in this crate.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}

/// Read and validate a rules document from `path` against the bundled JSON
/// Schema, without resolving it against any submission.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or fails
/// schema validation.
pub fn validate_rules_file(path: &Path) -> Result<RulesDocument> {
    let bytes = std::fs::read(path)?;
    RulesDocument::parse(&bytes).map_err(Error::Policy)
}

/// The running policy service: a loaded rules document plus the live
/// collaborators (fetcher, base-URI translation) it resolves against.
pub struct PolicyService {
    config: Config,
    rules: Arc<RulesDocument>,
}

impl PolicyService {
    /// Load the rules document at `rules_path` and build a service bound to
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules document cannot be read or fails
    /// validation.
    pub fn new(config: Config, rules_path: &Path) -> Result<Self> {
        let rules = validate_rules_file(rules_path)?;
        Ok(Self {
            config,
            rules: Arc::new(rules),
        })
    }

    /// Serve `/policies`, `/repositories`, and `/health` until a shutdown
    /// signal (Ctrl+C or SIGTERM) is received, then let `axum::serve`'s own
    /// graceful shutdown drain in-flight connections to completion.
    /// `config.server.shutdown_timeout` is logged alongside the signal for
    /// operational visibility but isn't enforced as a hard cutoff here.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured host/port cannot be bound, the
    /// live HTTP client cannot be built, or the server exits with an I/O
    /// error.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("invalid host: {e}")))?,
            self.config.server.port,
        );

        let baseuris = BaseUris::new(self.config.baseuris.public.clone(), self.config.baseuris.private.clone());

        let basic_auth = self
            .config
            .credentials
            .username
            .clone()
            .map(|username| (username, self.config.credentials.password.clone().unwrap_or_default()));

        let fetcher = ReqwestFetcher::new(baseuris.clone(), basic_auth, self.config.server.request_timeout)?;

        let state = Arc::new(AppState {
            rules: self.rules,
            fetcher: Arc::new(fetcher),
            baseuris,
        });

        let router = create_router(state);
        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?;

        info!(host = %bound.ip(), port = bound.port(), "listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(self.config.server.shutdown_timeout))
            .await?;

        info!("policy service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal(drain_timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(timeout = ?drain_timeout, "shutdown signal received, draining in-flight requests");
}
