// Configuration module entry point
// Loads layered configuration: defaults, optional config file, environment

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig};

/// Environment variable naming an alternative config file (without extension)
pub const CONFIG_PATH_ENV: &str = "FILEDROP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config";
const ENV_PREFIX: &str = "FILEDROP";

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 << 20;
pub const DEFAULT_FORM_FIELD: &str = "myFile";

impl Config {
    /// Load from `$FILEDROP_CONFIG`, falling back to `config.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error; defaults and `FILEDROP_*` environment
    /// variables (`__` between nested keys) still apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("storage.upload_dir", "./uploads")?
            .set_default("storage.max_upload_size", DEFAULT_MAX_UPLOAD_SIZE)?
            .set_default("storage.form_field", DEFAULT_FORM_FIELD)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::AccessLogFormat;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("/nonexistent/filedrop-config").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.upload_dir, "./uploads");
        assert_eq!(cfg.storage.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(cfg.storage.form_field, "myFile");
        assert_eq!(cfg.logging.access_log_format, AccessLogFormat::Combined);
        assert_eq!(cfg.performance.max_connections, None);
        assert_eq!(cfg.performance.shutdown_timeout, 30);
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse().unwrap()
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filedrop.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090
workers = 2

[storage]
upload_dir = "/var/lib/filedrop"
max_upload_size = 1024

[logging]
access_log_format = "json"

[performance]
max_connections = 64
"#
        )
        .unwrap();

        let stem = dir.path().join("filedrop");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.storage.upload_dir, "/var/lib/filedrop");
        assert_eq!(cfg.storage.max_upload_size, 1024);
        assert_eq!(cfg.storage.form_field, "myFile");
        assert_eq!(cfg.logging.access_log_format, AccessLogFormat::Json);
        assert_eq!(cfg.performance.max_connections, Some(64));
    }

    #[test]
    fn test_invalid_address() {
        let mut cfg = Config::load_from("/nonexistent/filedrop-config").unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
