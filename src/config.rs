//! # Configuration
//!
//! Runtime settings for [`crate::Endpoint`]. Defaults suit tests and local
//! use; deployments override them through the environment.

use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use crate::document::DEFAULT_METHOD;
use crate::resolve;

/// Runtime configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// DID method name used for new DIDs, the `<method>` in
    /// `did:<method>:<id>`.
    pub method: String,

    /// Upper bound on every registry call, in milliseconds.
    pub registry_timeout_ms: u64,

    /// Whether verification fails for credentials past their expiration date.
    pub reject_expired: bool,

    /// `tracing` filter directive used by binaries, e.g. `info` or
    /// `idblock_did=debug`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            registry_timeout_ms: 5000,
            reject_expired: true,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for any that are unset.
    ///
    /// Variables:
    /// - `IDBLOCK_DID_METHOD` (default: `idblock`)
    /// - `IDBLOCK_REGISTRY_TIMEOUT_MS` (default: 5000)
    /// - `IDBLOCK_REJECT_EXPIRED` (default: true)
    /// - `RUST_LOG` (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable if a value cannot be parsed.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable if a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(method) = lookup("IDBLOCK_DID_METHOD") {
            // the method must survive the lexical DID check
            if resolve::method(&format!("did:{method}:z")) != Some(method.as_str()) {
                return Err(anyhow!("IDBLOCK_DID_METHOD: {method:?} is not a valid method name").into());
            }
            config.method = method;
        }
        if let Some(timeout) = lookup("IDBLOCK_REGISTRY_TIMEOUT_MS") {
            config.registry_timeout_ms =
                timeout.parse::<u64>().with_context(|| format!("IDBLOCK_REGISTRY_TIMEOUT_MS: {timeout:?}"))?;
        }
        if let Some(reject) = lookup("IDBLOCK_REJECT_EXPIRED") {
            config.reject_expired =
                reject.parse::<bool>().with_context(|| format!("IDBLOCK_REJECT_EXPIRED: {reject:?}"))?;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// Registry timeout as a [`Duration`].
    #[must_use]
    pub const fn registry_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_timeout_ms)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("should load");
        assert_eq!(config, Config::default());
        assert_eq!(config.method, "idblock");
        assert_eq!(config.registry_timeout(), Duration::from_secs(5));
        assert!(config.reject_expired);
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("IDBLOCK_DID_METHOD", "example"),
            ("IDBLOCK_REGISTRY_TIMEOUT_MS", "250"),
            ("IDBLOCK_REJECT_EXPIRED", "false"),
            ("RUST_LOG", "idblock_did=debug"),
        ]))
        .expect("should load");

        assert_eq!(config.method, "example");
        assert_eq!(config.registry_timeout(), Duration::from_millis(250));
        assert!(!config.reject_expired);
        assert_eq!(config.log_filter, "idblock_did=debug");
    }

    #[test]
    fn invalid_values() {
        for vars in [
            [("IDBLOCK_REGISTRY_TIMEOUT_MS", "soon")],
            [("IDBLOCK_REJECT_EXPIRED", "maybe")],
            [("IDBLOCK_DID_METHOD", "Not-A-Method")],
        ] {
            let err = Config::from_lookup(lookup(&vars)).expect_err("should fail");
            assert_eq!(err.code(), "internalError");
            assert!(err.to_string().contains(vars[0].0));
        }
    }

    #[test]
    fn partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"registryTimeoutMs": 100}"#).expect("should deserialize");
        assert_eq!(config.registry_timeout_ms, 100);
        assert_eq!(config.method, "idblock");
    }
}
