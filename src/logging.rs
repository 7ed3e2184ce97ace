//! Structured logging for the connection engine. Mirrors the broker-side
//! `LogConfig`/`Logger`/`LogUtils` split, retargeted at client-side spans:
//! one span per TCP connection, one per in-flight request.

use anyhow::Result;
use serde::Serialize;
use std::io;
use tracing::Span;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

#[derive(Debug, Clone, Serialize)]
pub struct LogConfig {
    pub level: String,
    pub console: bool,
    pub file: bool,
    pub log_dir: String,
    pub file_prefix: String,
    pub json_format: bool,
    pub with_thread_ids: bool,
    pub with_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            file: false,
            log_dir: "./logs".to_string(),
            file_prefix: "kafka-wire-client".to_string(),
            json_format: false,
            with_thread_ids: true,
            with_spans: true,
        }
    }
}

pub struct Logger;

impl Logger {
    pub fn init(config: LogConfig) -> Result<()> {
        if config.file {
            std::fs::create_dir_all(&config.log_dir)?;
        }

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

        let mut layers = Vec::<Box<dyn Layer<_> + Send + Sync>>::new();

        if config.console {
            let console_layer = if config.json_format {
                fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_thread_ids(config.with_thread_ids)
                    .with_span_events(if config.with_spans {
                        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
                    } else {
                        fmt::format::FmtSpan::NONE
                    })
                    .with_writer(io::stdout)
                    .boxed()
            } else {
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_thread_ids(config.with_thread_ids)
                    .with_span_events(if config.with_spans {
                        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
                    } else {
                        fmt::format::FmtSpan::NONE
                    })
                    .with_writer(io::stdout)
                    .boxed()
            };
            layers.push(console_layer);
        }

        if config.file {
            let file_appender = RollingFileAppender::new(
                Rotation::DAILY,
                &config.log_dir,
                &format!("{}.log", config.file_prefix),
            );
            let file_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_thread_ids(config.with_thread_ids)
                .with_ansi(false)
                .with_writer(file_appender)
                .boxed();
            layers.push(file_layer);
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()
            .ok();

        tracing::info!(config = ?config, "logging initialized");
        Ok(())
    }

    pub fn init_default() -> Result<()> {
        Self::init(LogConfig::default())
    }

    pub fn init_with_env() -> Result<()> {
        let config = LogConfig {
            level: std::env::var("KAFKA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            console: std::env::var("KAFKA_LOG_CONSOLE")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            file: std::env::var("KAFKA_LOG_FILE")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
            log_dir: std::env::var("KAFKA_LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
            file_prefix: std::env::var("KAFKA_LOG_PREFIX")
                .unwrap_or_else(|_| "kafka-wire-client".to_string()),
            json_format: std::env::var("KAFKA_LOG_JSON")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
            with_thread_ids: true,
            with_spans: true,
        };
        Self::init(config)
    }
}

/// Span/metric helpers the connection engine calls directly (no `println!`
/// anywhere in this crate).
pub struct LogUtils;

impl LogUtils {
    pub fn connection_span(host: &str, port: u16, instance_id: u64) -> Span {
        tracing::info_span!(
            "connection",
            host = host,
            port = port,
            instance_id = instance_id,
            status = tracing::field::Empty,
        )
    }

    pub fn request_span(api_name: &str, api_key: i16, correlation_id: i32) -> Span {
        tracing::info_span!(
            "request",
            api_name = api_name,
            api_key = api_key,
            correlation_id = correlation_id,
            duration_ms = tracing::field::Empty,
        )
    }

    pub fn log_request_completed(
        api_name: &str,
        correlation_id: i32,
        duration_ms: u64,
        success: bool,
    ) {
        if success {
            tracing::debug!(
                api_name,
                correlation_id,
                duration_ms,
                "request completed"
            );
        } else {
            tracing::warn!(
                api_name,
                correlation_id,
                duration_ms,
                "request failed"
            );
        }
    }

    pub fn log_connection_closed(host: &str, port: u16, reason: &str) {
        tracing::info!(host, port, reason, "connection closed");
    }
}
