//! Logging handle for healthcheck runs.
//!
//! A [`RunLog`] owns a fully built `tracing` dispatcher (console and file
//! sinks, level filter, line format). It is created once by the binary and
//! handed to whoever needs to log; nothing here installs a global subscriber,
//! so building several handles (as tests do) is harmless.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry, prelude::*};

/// Default location of the persistent log file.
pub const DEFAULT_LOG_FILE: &str = "logs/monitor.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Line format for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// `<timestamp> | <LEVEL> | <message>`
    #[default]
    Pipe,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pipe" | "text" => Ok(LogFormat::Pipe),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::logging(format!("unknown log format: {other}"))),
        }
    }
}

/// Options for building a [`RunLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogOptions {
    /// Level directive used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
    /// Append-only log file; `None` disables the file sink.
    pub file: Option<PathBuf>,
    /// Mirror log lines to stderr.
    pub console: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pipe,
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            console: true,
        }
    }
}

/// Explicit logging capability for one run.
#[derive(Clone)]
pub struct RunLog {
    dispatch: Dispatch,
}

impl RunLog {
    /// Build the console and file sinks described by `options`.
    ///
    /// The level comes from `RUST_LOG` when set, otherwise from
    /// `options.level`. The log file's parent directory is created if needed.
    pub fn init(options: &LogOptions) -> Result<Self> {
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if options.console {
            layers.push(layer_for(options.format, std::io::stderr));
        }

        if let Some(path) = &options.file {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            layers.push(layer_for(options.format, Arc::new(file)));
        }

        let filter = env_filter(&options.level)?;
        Ok(Self::from_layers(layers, filter))
    }

    /// Build a handle that writes every line to `writer`.
    ///
    /// `RUST_LOG` is ignored here so the output only depends on the arguments.
    pub fn with_writer<W>(writer: W, format: LogFormat, level: &str) -> Result<Self>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_new(level).map_err(Error::logging)?;
        Ok(Self::from_layers(vec![layer_for(format, writer)], filter))
    }

    fn from_layers(layers: Vec<BoxedLayer>, filter: EnvFilter) -> Self {
        let subscriber = Registry::default().with(layers).with(filter);
        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// The underlying dispatcher, for instrumenting futures with
    /// `tracing::instrument::WithSubscriber`.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `f` with this handle as the current subscriber.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLog").finish_non_exhaustive()
    }
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(Error::logging),
    }
}

fn layer_for<W>(format: LogFormat, writer: W) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pipe => tracing_subscriber::fmt::layer()
            .event_format(PipeFormat)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
    }
}

/// Renders `<timestamp> | <LEVEL> | <message fields>`.
struct PipeFormat;

impl<S, N> FormatEvent<S, N> for PipeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        SystemTime.format_time(&mut writer)?;
        write!(writer, " | {} | ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_pipe_format_line_shape() {
        let buffer = Buffer::default();
        let log = RunLog::with_writer(buffer.clone(), LogFormat::Pipe, "info").unwrap();

        log.scope(|| {
            tracing::info!("API OK: example");
            tracing::error!("NET FAIL: gateway");
        });

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parts: Vec<&str> = lines[0].splitn(3, " | ").collect();
        assert_eq!(parts.len(), 3);
        assert!(!parts[0].is_empty());
        assert_eq!(parts[1], "INFO");
        assert_eq!(parts[2], "API OK: example");

        assert!(lines[1].contains(" | ERROR | NET FAIL: gateway"));
    }

    #[test]
    fn test_level_filter_applies() {
        let buffer = Buffer::default();
        let log = RunLog::with_writer(buffer.clone(), LogFormat::Pipe, "warn").unwrap();

        log.scope(|| {
            tracing::info!("hidden");
            tracing::warn!("shown");
        });

        let output = buffer.contents();
        assert!(!output.contains("hidden"));
        assert!(output.contains("shown"));
    }

    #[test]
    fn test_events_outside_scope_are_not_captured() {
        let buffer = Buffer::default();
        let log = RunLog::with_writer(buffer.clone(), LogFormat::Pipe, "info").unwrap();

        tracing::info!("outside");
        log.scope(|| tracing::info!("inside"));

        let output = buffer.contents();
        assert!(!output.contains("outside"));
        assert!(output.contains("inside"));
    }

    #[test]
    fn test_json_format() {
        let buffer = Buffer::default();
        let log = RunLog::with_writer(buffer.clone(), LogFormat::Json, "info").unwrap();

        log.scope(|| tracing::info!(name = "api", "check passed"));

        let output = buffer.contents();
        assert!(output.trim_start().starts_with('{'));
        assert!(output.contains("\"level\":\"INFO\""));
        assert!(output.contains("check passed"));
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("monitor.log");
        let options = LogOptions {
            level: "info".to_string(),
            format: LogFormat::Pipe,
            file: Some(path.clone()),
            console: false,
        };

        let first = RunLog::init(&options).unwrap();
        first.scope(|| tracing::info!("first run"));

        // A second handle over the same file appends rather than truncating.
        let second = RunLog::init(&options).unwrap();
        second.scope(|| tracing::info!("second run"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("| INFO | first run"));
        assert!(contents.contains("| INFO | second run"));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("pipe".parse::<LogFormat>().unwrap(), LogFormat::Pipe);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
