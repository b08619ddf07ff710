//! Configuration management for the PASS policy service.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server bind configuration.
    pub server: ServerConfig,
    /// Public/private PASS repository base URIs.
    pub baseuris: BaseUriConfig,
    /// Basic-auth credentials for talking to the PASS/Fedora repository.
    pub credentials: CredentialsConfig,
    /// Path to the policy rules document, if not given on the command line.
    #[serde(default)]
    pub rules_path: Option<String>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Timeout applied to outbound requests to the PASS/Fedora repository.
    #[serde(with = "crate::config::humantime_serde")]
    pub request_timeout: Duration,
    /// Graceful shutdown timeout.
    #[serde(with = "crate::config::humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Public/private PASS repository base URIs for URI rewriting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BaseUriConfig {
    /// The externally-visible (public) PASS base URI.
    pub public: String,
    /// The internal (private) PASS base URI the service talks to.
    pub private: String,
}

/// Basic-auth credentials for the Fedora/PASS repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Username for HTTP basic auth, if required by the repository.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for HTTP basic auth.
    #[serde(default)]
    pub password: Option<String>,
}

impl Config {
    /// Load configuration from an optional YAML file plus environment
    /// variables, applying the legacy single-purpose env vars supported by
    /// existing deployments as final overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be
    /// parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!("config file not found: {}", p.display())));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("PASS_POLICY_SERVICE_").split("__"));

        let mut config: Self = figment.extract().map_err(|e| Error::Config(e.to_string()))?;
        config.apply_legacy_env_vars(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Overlay the legacy, non-prefixed env vars honored for compatibility
    /// with existing deployments. Takes a lookup function so tests can
    /// supply a fake environment without mutating the process's real one.
    fn apply_legacy_env_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PASS_EXTERNAL_FEDORA_BASEURL") {
            self.baseuris.public = v;
        }
        if let Some(v) = lookup("PASS_FEDORA_BASEURL") {
            self.baseuris.private = v;
        }
        if let Some(v) = lookup("PASS_FEDORA_USER") {
            self.credentials.username = Some(v);
        }
        if let Some(v) = lookup("PASS_FEDORA_PASSWORD") {
            self.credentials.password = Some(v);
        }
        if let Some(v) = lookup("POLICY_SERVICE_PORT") {
            if let Ok(port) = v.parse() {
                self.server.port = port;
            }
        }
    }
}

/// Custom humantime serde module for `Duration`, supporting the
/// `"30s"`/`"5m"`/`"100ms"` config convention.
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize `Duration` to a human-readable string (e.g. `"30s"`).
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format!("{}s", duration.as_secs()).serialize(serializer)
    }

    /// Deserialize a human-readable duration string (e.g. `"30s"`, `"5m"`,
    /// `"100ms"`).
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed.
    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Some(secs) = s.strip_suffix("ms") {
            return secs.parse::<u64>().map(Duration::from_millis).map_err(serde::de::Error::custom);
        }
        if let Some(secs) = s.strip_suffix('s') {
            return secs.parse::<u64>().map(Duration::from_secs).map_err(serde::de::Error::custom);
        }
        if let Some(mins) = s.strip_suffix('m') {
            return mins
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(serde::de::Error::custom);
        }
        s.parse::<u64>().map(Duration::from_secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_bind_to_an_ephemeral_port() {
        let config = Config::default();
        assert_eq!(config.server.port, 0);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn loads_server_config_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "server:\n  host: 127.0.0.1\n  port: 8080").unwrap();
        drop(f);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn legacy_port_env_var_overrides_config() {
        let mut config = Config::default();
        config.apply_legacy_env_vars(|name| {
            (name == "POLICY_SERVICE_PORT").then(|| "9999".to_string())
        });
        assert_eq!(config.server.port, 9999);
    }
}
