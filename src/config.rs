use serde::Deserialize;

const DEFAULT_PORT: u16 = 42069;
const DEFAULT_UPSTREAM: &str = "http://httpbin.org";

/// Settings for the demo server binary.
///
/// The library never reads these; the port and handler are passed to
/// [`Server::serve`](crate::server::Server::serve) directly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// Base URL that `/httpbin/...` requests are proxied to
    pub upstream: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upstream: DEFAULT_UPSTREAM.to_string(),
        }
    }
}

impl Config {
    /// Loads the YAML file named by `HTTPSERVER_CONFIG` (if any), then applies
    /// the `PORT` and `UPSTREAM` environment overrides.
    pub fn load() -> Self {
        let mut cfg = match std::env::var("HTTPSERVER_CONFIG") {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(raw) => Self::from_yaml(&raw).unwrap_or_else(|e| {
                    tracing::warn!(%path, error = %e, "Invalid config file, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!(%path, error = %e, "Could not read config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => cfg.port = port,
                Err(_) => tracing::warn!(%port, "Ignoring invalid PORT"),
            }
        }
        if let Ok(upstream) = std::env::var("UPSTREAM") {
            cfg.upstream = upstream;
        }

        cfg
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}
