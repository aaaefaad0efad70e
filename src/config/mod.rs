// Configuration module entry point
// Loads layered settings: defaults, optional file, environment

mod types;

use std::net::SocketAddr;

pub use types::{AssetsConfig, Config, HttpConfig, LoggingConfig, ServerConfig};

/// Default config file stem, resolved as config.toml / config.json / ...
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The bare `PORT` environment variable wins over every other source.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("INGRESS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.keep_alive", true)?
            .set_default("server.shutdown_timeout", 10)?
            .set_default("assets.root", "docs")?
            .set_default("assets.index_file", "index.html")?
            .set_default("http.server_name", "acl-ingress-k8s")?
            .set_default("logging.level", "info")?
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Level;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/config").unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.assets.root, PathBuf::from("docs"));
        assert_eq!(cfg.assets.index_file, "index.html");
        assert_eq!(cfg.http.server_name, "acl-ingress-k8s");
        assert_eq!(cfg.http.backend_host, None);
        assert_eq!(cfg.logging.level, Level::Info);
        assert!(cfg.server.keep_alive);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingress.toml");
        std::fs::write(
            &path,
            "[assets]\nroot = \"public\"\n\n[http]\nbackend_host = \"node-7\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let stem = dir.path().join("ingress");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.assets.root, PathBuf::from("public"));
        assert_eq!(cfg.http.backend_host.as_deref(), Some("node-7"));
        assert_eq!(cfg.logging.level, Level::Debug);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 3000;
        assert_eq!(cfg.socket_addr().unwrap().port(), 3000);

        cfg.server.host = "not an address".to_string();
        assert!(cfg.socket_addr().is_err());
    }
}
