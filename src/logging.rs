use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::time::UtcTime, prelude::*, registry::Registry, EnvFilter, Layer,
};

use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize stdout logging plus an optional rolling file.
///
/// Filter precedence: `logging.level` from config, then `RUST_LOG`, then `info`.
/// The returned guard flushes the file writer and must live as long as the process.
pub fn init_with_config(cfg: &LoggingConfig) -> Option<WorkerGuard> {
    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(cfg.format)];

    let guard = if cfg.enable_file_logging {
        build_file_layer(cfg).map(|(layer, guard)| {
            layers.push(layer);
            guard
        })
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(cfg))
        .try_init();

    guard
}

fn env_filter(cfg: &LoggingConfig) -> EnvFilter {
    match cfg.level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stdout)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stdout)
            .boxed(),
    }
}

fn rotation_for(policy: &str) -> Rotation {
    match policy.to_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn build_file_layer(cfg: &LoggingConfig) -> Option<(BoxedLayer, WorkerGuard)> {
    if let Err(err) = std::fs::create_dir_all(&cfg.dir) {
        eprintln!(
            "Failed to create log directory '{}' ({err}), continuing with stdout logs",
            cfg.dir
        );
        return None;
    }

    let appender = RollingFileAppender::new(rotation_for(&cfg.rotation), &cfg.dir, &cfg.filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = match cfg.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(writer)
            .boxed(),
    };

    Some((layer, guard))
}
