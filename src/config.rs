//! Client configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default backend address, matching the CSV server's default bind.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default address the CSV server binds to.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Configuration for the HTTP client and the download directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without the `/api/...` path.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Directory downloaded CSV files are written to.
    pub download_dir: PathBuf,
    /// User agent string.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            download_dir: PathBuf::from("."),
            user_agent: format!("csvgen/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Defaults overridden by `CSVGEN_BASE_URL`, `CSVGEN_TIMEOUT_SECS` and
    /// `CSVGEN_DOWNLOAD_DIR` when they are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("CSVGEN_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(secs) = lookup("CSVGEN_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(_) => log::warn!("ignoring invalid CSVGEN_TIMEOUT_SECS={secs:?}"),
            }
        }
        if let Some(dir) = lookup("CSVGEN_DOWNLOAD_DIR").filter(|v| !v.trim().is_empty()) {
            config.download_dir = PathBuf::from(dir);
        }

        config
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the download directory.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}

/// Server bind address from `CSVGEN_BIND`, falling back to [`DEFAULT_BIND`].
pub fn bind_address() -> String {
    env::var("CSVGEN_BIND")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.download_dir, PathBuf::from("."));
    }

    #[test]
    fn environment_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CSVGEN_BASE_URL", "http://backend:8080"),
            ("CSVGEN_TIMEOUT_SECS", "5"),
            ("CSVGEN_DOWNLOAD_DIR", "/tmp/exports"),
        ]));
        assert_eq!(config.base_url, "http://backend:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn invalid_timeout_keeps_default() {
        let config = Config::from_lookup(lookup(&[("CSVGEN_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn builder_methods() {
        let config = Config::default()
            .with_base_url("http://127.0.0.1:9000")
            .with_timeout(Duration::from_secs(2))
            .with_download_dir("out");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.download_dir, PathBuf::from("out"));
    }
}
