use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::config::{Config, LogFormat, LoggingConfig};

/// Build the level filter: `RUST_LOG` first, the configured level second
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Invalid log level configuration")
}

/// Daily-rotated appender for `logging.file`, keeping `max_files` old files
pub fn file_appender(path: &str, max_files: usize) -> Result<RollingFileAppender> {
    let path = Path::new(path);
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Log file path {} has no file name", path.display()))?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .max_log_files(max_files.max(1))
        .build(directory)
        .with_context(|| format!("Failed to open log directory {}", directory.display()))
}

/// Initialize the tracing subscriber for logging.
///
/// With `logging.file` set, events also go to that file as JSON. The
/// returned guard flushes the file writer and must live until exit.
pub fn init_telemetry(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_writer, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) =
                tracing_appender::non_blocking(file_appender(path, config.max_files)?);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };
    let file_layer = file_writer.map(|writer: NonBlocking| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .flatten_event(true)
            .with_writer(writer)
    });

    let registry = Registry::default()
        .with(env_filter(config)?)
        .with(file_layer);

    let installed = match config.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            registry.with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_span_list(true)
                .flatten_event(true);

            registry.with(fmt_layer).try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            registry.with(fmt_layer).try_init()
        }
    };
    installed.context("Failed to install tracing subscriber")?;

    tracing::info!(
        log_level = %config.level,
        log_format = ?config.format,
        log_file = config.file.as_deref().unwrap_or("-"),
        "Telemetry initialized"
    );

    Ok(guard)
}

/// Log server startup information; credentials are never included
pub fn log_startup_info(config: &Config) {
    let db = &config.database;
    tracing::info!(
        server_address = %config.server_address(),
        database_host = %db.host,
        database_port = db.port,
        database_name = %db.name,
        database_user = %db.user,
        url_override = db.url.is_some(),
        max_connections = db.max_connections,
        health_interval_secs = config.health.interval_secs,
        auth_enabled = !config.auth.api_key.is_empty(),
        "Task API starting up"
    );
}

/// Log the error and its cause chain
pub fn report_error(error: &anyhow::Error, context: &str) {
    tracing::error!(error = %error, context, "Operation failed");

    for (depth, cause) in error.chain().skip(1).enumerate() {
        tracing::error!(error = %cause, depth = depth + 1, "Error cause");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_configured_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let config = LoggingConfig {
                level: level.to_string(),
                format: LogFormat::Compact,
                file: None,
                max_files: 3,
            };
            assert!(env_filter(&config).is_ok());
        }
    }

    #[test]
    fn test_file_appender_writes_into_configured_directory() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");

        let mut appender = file_appender(path.to_str().unwrap(), 3).unwrap();
        appender.write_all(b"{\"message\":\"hello\"}\n").unwrap();
        appender.flush().unwrap();

        let written: Vec<_> = std::fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("app.log"));
    }

    #[test]
    fn test_file_appender_rejects_path_without_file_name() {
        assert!(file_appender("/", 3).is_err());
    }

    #[test]
    fn test_log_format_names() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
        assert!(serde_json::from_str::<LogFormat>("\"xml\"").is_err());
    }
}
