//! # Logging
//!
//! Installs the process-wide `tracing` subscriber and mirrors events to a
//! host [`LoggerSink`] (Logcat, a desktop log file, ...).
//!
//! Every Echo crate logs through the `tracing` macros; nothing here needs to
//! be called from library code except the redaction helpers, which keep
//! stream credentials and device paths out of the logs:
//!
//! - [`redact_url`] drops query strings (signed CDN URLs carry tokens)
//! - [`redact_headers`] masks credential headers of remote streams
//! - [`strip_path`] reduces local file locations to their file name
//!
//! Fields whose name looks like a credential are also masked before an
//! entry reaches the sink.
//!
//! ```ignore
//! use bridge_traits::time::{ConsoleLogger, LogLevel};
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug)
//!         .with_logger_sink(Arc::new(ConsoleLogger::default())),
//! )?;
//! ```

use crate::error::{Error, Result};

use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

/// Crates whose events are shown at the configured level by default.
const ECHO_CRATES: &[&str] = &[
    "echo_workspace",
    "core_runtime",
    "core_extension",
    "core_playback",
    "core_service",
    "provider_offline",
    "bridge_desktop",
];

/// Dependencies that are only interesting when something breaks.
const QUIET_CRATES: &[&str] = &["sqlx"];

/// Substrings marking a header or field name as a credential.
const CREDENTIAL_MARKERS: &[&str] = &[
    "authorization",
    "cookie",
    "token",
    "secret",
    "password",
    "signature",
    "api_key",
    "api-key",
    "apikey",
];

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, coloured; debug builds default to it.
    Pretty,
    /// One JSON object per event; release builds default to it.
    Json,
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied to the Echo crates when no `filter` is given.
    pub level: LogLevel,
    /// Full `EnvFilter` directive string, e.g. `core_playback=trace,sqlx=warn`.
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Report span enter/exit (pretty) or span context (JSON).
    pub enable_spans: bool,
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Directive string handed to `EnvFilter`.
    fn directives(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }
        let level = level_name(self.level);
        ECHO_CRATES
            .iter()
            .map(|name| format!("{name}={level}"))
            .chain(QUIET_CRATES.iter().map(|name| format!("{name}=warn")))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .field("enable_spans", &self.enable_spans)
            .field("display_target", &self.display_target)
            .finish()
    }
}

/// Install the global subscriber. Fails if one is already installed or the
/// filter does not parse.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(output_layer(&config))
        .with(filter)
        .with(LoggerSinkLayer::new(config.logger_sink.clone()))
        .try_init()
        .map_err(|e| Error::Config(format!("Logging already initialized: {e}")))
}

fn output_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let base = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_writer(io::stderr);

    match config.format {
        LogFormat::Pretty => base
            .pretty()
            .with_span_events(if config.enable_spans {
                FmtSpan::ACTIVE
            } else {
                FmtSpan::NONE
            })
            .boxed(),
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(config.directives())
        .map_err(|e| Error::Config(format!("Invalid log filter: {e}")))
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

fn log_level(level: &tracing::Level) -> LogLevel {
    match *level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

// ============================================================================
// Redaction
// ============================================================================

fn is_credential(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    CREDENTIAL_MARKERS.iter().any(|marker| name.contains(marker))
}

/// `url` without its query string and fragment.
pub fn redact_url(url: &str) -> String {
    match url.find(['?', '#']) {
        Some(end) => format!("{}?{REDACTED}", &url[..end]),
        None => url.to_string(),
    }
}

/// Stream request headers as `{Key=value, ...}`, sorted by key, with
/// credential values masked.
pub fn redact_headers(headers: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = headers.iter().collect();
    pairs.sort();

    let rendered: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| {
            let value = if is_credential(key) { REDACTED } else { value.as_str() };
            format!("{key}={value}")
        })
        .collect();
    format!("{{{}}}", rendered.join(", "))
}

/// File name of a local path or URI (`/`, `\` and `content://` separated).
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

// ============================================================================
// Sink layer
// ============================================================================

/// Mirrors events that pass the filter to a [`LoggerSink`].
struct LoggerSinkLayer {
    sink: Option<Arc<dyn LoggerSink>>,
}

impl LoggerSinkLayer {
    fn new(sink: Option<Arc<dyn LoggerSink>>) -> Self {
        Self { sink }
    }

    fn entry<S>(event: &Event<'_>, ctx: &Context<'_, S>) -> LogEntry
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let metadata = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields.message.unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(log_level(metadata.level()), metadata.target(), message);
        entry.fields = fields.fields;
        entry.span_id = ctx.lookup_current().map(|span| span.name().to_string());
        entry
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = &self.sink else {
            return;
        };
        if log_level(event.metadata().level()) < sink.min_level() {
            return;
        }

        let entry = Self::entry(event, &ctx);
        let sink = Arc::clone(sink);

        // On a runtime the emitting task must not wait for the host logger.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = sink.log(entry).await {
                        eprintln!("LoggerSink error: {err}");
                    }
                });
            }
            Err(_) => {
                if let Err(err) = futures::executor::block_on(sink.log(entry)) {
                    eprintln!("LoggerSink error: {err}");
                }
            }
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: HashMap<String, String>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name if is_credential(name) => {
                self.fields.insert(name.to_string(), REDACTED.to_string());
            }
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }
}
