use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "RiskView";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend base URL used when `RISKVIEW_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Local listen address used when `RISKVIEW_BIND` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3030";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const API_URL_VAR: &str = "RISKVIEW_API_URL";
pub const BIND_VAR: &str = "RISKVIEW_BIND";
pub const RESULT_STORE_VAR: &str = "RISKVIEW_RESULT_STORE";
pub const DATA_DIR_VAR: &str = "RISKVIEW_DATA_DIR";
pub const CONNECT_TIMEOUT_VAR: &str = "RISKVIEW_CONNECT_TIMEOUT_SECS";

/// Fallback tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "riskview_lib=info,riskview=info,tower_http=warn"
}

/// Default data directory: ~/RiskView/ on all platforms.
///
/// Falls back to a relative `RiskView` directory when the home
/// directory cannot be determined (containers without `$HOME`).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(APP_NAME))
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidApiUrl { var: &'static str, value: String },
    #[error("{var} is not a socket address: {value:?}")]
    InvalidBindAddr { var: &'static str, value: String },
    #[error("{var} must be \"memory\" or \"file\", got {value:?}")]
    InvalidStoreKind { var: &'static str, value: String },
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Where the last prediction result lives between submit and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Process memory only. Lost on restart.
    Memory,
    /// JSON file under the data directory. Survives restarts.
    File,
}

/// Prediction backend connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Origin of the prediction API, without trailing slash.
    pub base_url: String,
    /// Connect timeout. Requests themselves are never time-limited:
    /// inference may legitimately take a while.
    pub connect_timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Complete runtime configuration, built once at startup and injected.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unset and empty variables both select the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = match get(API_URL_VAR) {
            Some(url) => {
                let url = url.trim().to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidApiUrl {
                        var: API_URL_VAR,
                        value: url,
                    });
                }
                url
            }
            None => DEFAULT_API_URL.to_string(),
        };
        let mut backend = BackendConfig::new(&base_url);

        if let Some(raw) = get(CONNECT_TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout {
                    var: CONNECT_TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            backend.connect_timeout = Duration::from_secs(secs);
        }

        let bind_raw = get(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr {
                var: BIND_VAR,
                value: bind_raw.clone(),
            })?;

        let store = match get(RESULT_STORE_VAR).as_deref().map(str::trim) {
            None | Some("memory") => StoreKind::Memory,
            Some("file") => StoreKind::File,
            Some(other) => {
                return Err(ConfigError::InvalidStoreKind {
                    var: RESULT_STORE_VAR,
                    value: other.to_string(),
                })
            }
        };

        let data_dir = get(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);

        Ok(Self {
            backend,
            bind_addr,
            store,
            data_dir,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            store: StoreKind::Memory,
            data_dir: app_data_dir(),
        }
    }
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
    fn defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.store, StoreKind::Memory);
        assert!(config.data_dir.ends_with("RiskView"));
    }

    #[test]
    fn api_url_override_trims_trailing_slash() {
        let config =
            AppConfig::from_lookup(lookup(&[(API_URL_VAR, "https://risk.example.org/")])).unwrap();
        assert_eq!(config.backend.base_url, "https://risk.example.org");
    }

    #[test]
    fn empty_api_url_falls_back_to_default() {
        let config = AppConfig::from_lookup(lookup(&[(API_URL_VAR, "  ")])).unwrap();
        assert_eq!(config.backend.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn api_url_without_scheme_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(API_URL_VAR, "localhost:8000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiUrl { .. }));
    }

    #[test]
    fn file_store_and_data_dir() {
        let config = AppConfig::from_lookup(lookup(&[
            (RESULT_STORE_VAR, "file"),
            (DATA_DIR_VAR, "/tmp/riskview-test"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreKind::File);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/riskview-test"));
    }

    #[test]
    fn unknown_store_kind_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(RESULT_STORE_VAR, "redis")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidStoreKind {
                var: RESULT_STORE_VAR,
                value: "redis".into()
            }
        );
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(BIND_VAR, "not-an-addr")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    }

    #[test]
    fn connect_timeout_override() {
        let config = AppConfig::from_lookup(lookup(&[(CONNECT_TIMEOUT_VAR, "3")])).unwrap();
        assert_eq!(config.backend.connect_timeout, Duration::from_secs(3));

        let err = AppConfig::from_lookup(lookup(&[(CONNECT_TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
    }

    #[test]
    fn app_name_is_riskview() {
        assert_eq!(APP_NAME, "RiskView");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
