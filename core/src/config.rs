//! Runtime configuration and logging setup

use crate::convert::DashboardLimits;
use crate::storage::DEFAULT_CAPACITY;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_VIEWER_URL: &str = "http://localhost:8081/index2.html";
pub const DEFAULT_LOCAL_VIEWER_URL: &str = "dashboard.html";
pub const DEFAULT_FORK_ENDPOINT: &str = "https://app.getpostman.com/run-collection/fork";
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 10;

/// Core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EchoConfig {
    /// Directory holding preferences and exported files
    pub storage_path: PathBuf,
    /// Maximum number of exchanges kept in memory
    pub buffer_capacity: usize,
    /// Hosted dashboard viewer
    pub viewer_base_url: String,
    /// Viewer bundled with the extension, receives `compressed=true`
    pub local_viewer_url: String,
    pub fork_endpoint: String,
    pub render_interval_ms: u64,
    pub dashboard: DashboardLimits,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            buffer_capacity: DEFAULT_CAPACITY,
            viewer_base_url: DEFAULT_VIEWER_URL.to_string(),
            local_viewer_url: DEFAULT_LOCAL_VIEWER_URL.to_string(),
            fork_endpoint: DEFAULT_FORK_ENDPOINT.to_string(),
            render_interval_ms: DEFAULT_RENDER_INTERVAL_MS,
            dashboard: DashboardLimits::default(),
        }
    }
}

impl EchoConfig {
    /// Defaults overridden by `ECHO_STORAGE_PATH`, `ECHO_VIEWER_URL` and
    /// `ECHO_BUFFER_CAPACITY`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os("ECHO_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("ECHO_VIEWER_URL") {
            if !url.trim().is_empty() {
                config.viewer_base_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var("ECHO_BUFFER_CAPACITY") {
            match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => config.buffer_capacity = capacity,
                _ => tracing::warn!("Ignoring invalid ECHO_BUFFER_CAPACITY {:?}", raw),
            }
        }
        config
    }

    pub fn render_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.render_interval_ms)
    }
}

pub fn create_default_config() -> EchoConfig {
    EchoConfig::default()
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("echo"))
        .unwrap_or_else(|| PathBuf::from("./"))
}

/// Initialize logging (call once at startup)
/// `storage_path` is used to store log files in release mode
#[allow(unused_variables)]
pub fn init_core(storage_path: Option<&Path>) -> anyhow::Result<()> {
    #[cfg(debug_assertions)]
    {
        let level = resolve_log_level();
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init();
    }

    #[cfg(not(debug_assertions))]
    {
        let level = resolve_log_level();

        let log_dir = storage_path
            .map(|p| p.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        let file_appender = tracing_appender::rolling::daily(&log_dir, "echo_core");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Logging lasts until process exit
        std::mem::forget(guard);

        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(non_blocking)
            .try_init();
    }

    tracing::info!("Echo core initialized v{}", crate::VERSION);
    Ok(())
}

/// Ensure the storage directory exists
pub fn prepare_storage(config: &EchoConfig) -> anyhow::Result<&Path> {
    std::fs::create_dir_all(&config.storage_path).with_context(|| {
        format!(
            "Failed to create storage directory {}",
            config.storage_path.display()
        )
    })?;
    Ok(&config.storage_path)
}

fn resolve_log_level() -> tracing::level_filters::LevelFilter {
    use tracing::level_filters::LevelFilter;

    match std::env::var("RUST_LOG") {
        Ok(val) => match val.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" | "warning" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        },
        Err(_) => LevelFilter::INFO,
    }
}
