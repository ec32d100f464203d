//! Configuration loading and validation.
//!
//! All values are read from environment variables once at startup into an
//! immutable struct; nothing mutates process-global state afterwards. The
//! credential fields are opaque pass-through values for the token endpoint.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated exchange-client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// OAuth2 grant type forwarded to the token endpoint. **Required.**
    pub grant_type: String,

    /// OAuth2 client identifier. **Required.**
    pub client_id: String,

    /// Resource-owner username. **Required.**
    pub username: String,

    /// Resource-owner password. **Required.**
    pub password: String,

    /// Base URL of the remote service (production or sandbox). **Required.**
    pub base_url: String,

    /// Path to the caller's PEM-encoded private key.
    #[serde(default = "default_private_key_path")]
    pub private_key_path: String,

    /// Path to the remote counterparty's PEM-encoded public key.
    #[serde(default = "default_public_key_path")]
    pub public_key_path: String,

    /// Directory where raw responses and normalized results are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Timeout applied to every HTTP call, in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_private_key_path() -> String {
    "private.pem".into()
}
fn default_public_key_path() -> String {
    "public.pem".into()
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_http_timeout() -> u64 {
    30
}

impl Settings {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or empty.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let settings: Settings = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.grant_type, "GRANT_TYPE")?;
        ensure_non_empty(&self.client_id, "CLIENT_ID")?;
        ensure_non_empty(&self.username, "USERNAME")?;
        ensure_non_empty(&self.password, "PASSWORD")?;
        ensure_non_empty(&self.base_url, "BASE_URL")?;

        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            grant_type: "password".into(),
            client_id: "client".into(),
            username: "user".into(),
            password: "secret".into(),
            base_url: "https://sandbox.example.com".into(),
            private_key_path: default_private_key_path(),
            public_key_path: default_public_key_path(),
            output_dir: default_output_dir(),
            http_timeout_secs: default_http_timeout(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_private_key_path(), "private.pem");
        assert_eq!(default_public_key_path(), "public.pem");
        assert_eq!(default_output_dir(), ".");
        assert_eq!(default_http_timeout(), 30);
    }

    #[test]
    fn valid_settings_pass() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_credentials() {
        let mut cfg = settings();
        cfg.username = "  ".into();
        assert!(cfg.validate().is_err());

        let mut cfg = settings();
        cfg.password = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_base_url() {
        let mut cfg = settings();
        cfg.base_url = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = settings();
        cfg.http_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }
}
