//! Log output of the CLI. The library itself only emits `tracing` events;
//! [`init`] installs the subscriber that prints them.

use std::{
    collections::HashMap,
    fmt::Write as _,
    fs::OpenOptions,
    path::PathBuf,
};
use anyhow::{anyhow, Context as _};
use nu_ansi_term::{Color, Style};
use serde::Deserialize;
use termcolor::ColorChoice;
use tracing::{field::Visit, Level};
use tracing_log::NormalizeEvent;
use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    fmt::FormatEvent,
    prelude::*,
};


#[derive(Debug, confique::Config)]
pub struct LogConfig {
    /// Specifies what log messages to emit, based on the module path and log level.
    ///
    /// This is a map where the key specifies a module path prefix, and the
    /// value specifies a minimum log level. For each log message, the map
    /// entry with the longest prefix matching the log's module path is chosen.
    /// If no such entry exists, the log is not emitted. Otherwise, that
    /// entry's level is used to check whether the log message should be
    /// emitted.
    ///
    /// Example: only "info" and above generally, but everything from the
    /// introspection client and "debug" messages of the HTTP library `hyper`:
    ///
    ///    [log]
    ///    filters.graphql_clientgen = "info"
    ///    filters."graphql_clientgen::schema" = "trace"
    ///    filters.hyper = "debug"
    #[config(default = { "graphql_clientgen": "info" })]
    pub filters: Filters,

    /// If this is set, log messages are also written to this file. Relative
    /// paths are relative to the current working directory.
    pub file: Option<PathBuf>,

    /// If this is set to `false`, log messages are not written to stdout.
    #[config(default = true)]
    pub stdout: bool,
}

#[derive(Debug, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub struct Filters(HashMap<String, LevelFilter>);

impl TryFrom<HashMap<String, String>> for Filters {
    type Error = String;
    fn try_from(value: HashMap<String, String>) -> Result<Self, Self::Error> {
        value.into_iter()
            .map(|(target_prefix, level)| {
                let level = parse_level_filter(&level)?;
                Ok((target_prefix, level))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

fn parse_level_filter(s: &str) -> Result<LevelFilter, String> {
    match s {
        "off" => Ok(LevelFilter::OFF),
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(format!("invalid log level '{other}'")),
    }
}

/// Whether a log message with `target` and `level` passes `filters`: the
/// entry with the longest matching prefix decides.
fn is_enabled(filters: &HashMap<String, LevelFilter>, target: &str, level: &Level) -> bool {
    filters.iter()
        .filter(|(target_prefix, _)| target.starts_with(target_prefix.as_str()))
        .max_by_key(|(target_prefix, _)| target_prefix.len())
        .map(|(_, level_filter)| level <= level_filter)
        .unwrap_or(false)
}

/// Installs our own logger globally. Must only be called once!
pub fn init(config: &LogConfig, color: ColorChoice) -> anyhow::Result<()> {
    let filter = {
        let filters = config.filters.0.clone();
        let max_level = filters.values().max().copied().unwrap_or(LevelFilter::OFF);
        FilterFn::new(move |metadata| is_enabled(&filters, metadata.target(), metadata.level()))
            .with_max_level_hint(max_level)
    };

    macro_rules! subscriber {
        ($writer:expr) => {
            tracing_subscriber::fmt::layer()
                .event_format(EventFormatter(color))
                .with_writer($writer)
        };
    }

    let stdout_output = config.stdout.then(|| subscriber!(std::io::stdout));

    let file_output = config.file.as_ref()
        .map(|path| -> anyhow::Result<std::fs::File> {
            use std::io::Write;

            let mut file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .with_context(|| format!("failed to open/create log file '{}'", path.display()))?;

            // Add an empty line separator to see separate runs easier.
            file.write_all(b"\n").context("could not write to log file")?;

            Ok(file)
        })
        .transpose()?
        .map(|file| subscriber!(file).with_ansi(color == ColorChoice::Always));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_output)
        .with(stdout_output)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;

    Ok(())
}

type TracingWriter<'a> = tracing_subscriber::fmt::format::Writer<'a>;

#[derive(Clone, Copy)]
struct EventFormatter(ColorChoice);

impl<S, N> FormatEvent<S, N> for EventFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: TracingWriter<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let use_ansi = self.0 == ColorChoice::Always
            || (writer.has_ansi_escapes() && self.0 != ColorChoice::Never);

        // Events forwarded from the `log` crate carry their real metadata in
        // fields.
        let normalized_metadata = event.normalized_metadata();
        let metadata = normalized_metadata.as_ref().unwrap_or(event.metadata());

        let dim_style = Style::new().dimmed();
        let level_style = match *metadata.level() {
            Level::ERROR => Style::new().fg(Color::Red).bold(),
            Level::WARN => Style::new().fg(Color::Yellow).bold(),
            Level::INFO => Style::new().fg(Color::Green),
            Level::DEBUG => Style::new().fg(Color::Blue),
            Level::TRACE => Style::new().fg(Color::Magenta),
        };
        let body_style = match *metadata.level() {
            Level::ERROR => Style::new().fg(Color::Red),
            Level::WARN => Style::new().fg(Color::Yellow),
            Level::INFO => Style::new(),
            Level::DEBUG => Style::new().dimmed(),
            Level::TRACE => Style::new().fg(Color::DarkGray),
        };

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%3f");
        with_style(&mut writer, use_ansi, dim_style, |w| write!(w, "{timestamp} "))?;
        with_style(&mut writer, use_ansi, level_style, |w| write!(w, "{:5}", metadata.level()))?;
        with_style(&mut writer, use_ansi, dim_style, |w| write!(w, " {} >  ", metadata.target()))?;

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        // Continuation lines of multi-line messages are indented to align
        // with the first line.
        let indent = "2021-05-04 19:40:18.270 DEBUG ".len() + 4 + metadata.target().len();
        let mut lines = fields.message.lines();
        let first = lines.next().unwrap_or("");
        with_style(&mut writer, use_ansi, body_style, |w| write!(w, "{first}"))?;
        for line in lines {
            write!(writer, "\n{:indent$}", "")?;
            with_style(&mut writer, use_ansi, body_style, |w| write!(w, "{line}"))?;
        }

        if !fields.rest.is_empty() {
            with_style(&mut writer, use_ansi, level_style, |w| write!(w, " ~~"))?;
            for (name, value) in &fields.rest {
                write!(writer, " ")?;
                with_style(&mut writer, use_ansi, body_style.italic(), |w| write!(w, "{name}"))?;
                with_style(&mut writer, use_ansi, body_style, |w| write!(w, "={value}"))?;
            }
        }

        writeln!(writer)
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    rest: Vec<(&'static str, String)>,
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let name = field.name();
        if name == "message" {
            let _ = write!(self.message, "{value:?}");
        } else if !name.starts_with("log.") {
            self.rest.push((name, format!("{value:?}")));
        }
    }
}

fn with_style(
    out: &mut TracingWriter<'_>,
    use_ansi: bool,
    style: Style,
    f: impl FnOnce(&mut TracingWriter<'_>) -> std::fmt::Result,
) -> std::fmt::Result {
    if use_ansi {
        write!(out, "{}", style.prefix())?;
    }
    f(out)?;
    if use_ansi {
        write!(out, "{}", style.suffix())?;
    }
    Ok(())
}
