//! Console logging.
//!
//! Lines look like `2026-01-01T12:00:00.123Z  INFO flightops::reconcile: reconcile: message`,
//! i.e. the target comes before the span path. The filter comes from
//! `RUST_LOG` and defaults to `info`.

use std::fmt;
use std::io::IsTerminal;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Event formatter that puts the target before the span path
pub struct TargetFirstFormat {
    ansi: bool,
}

impl TargetFirstFormat {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    fn level_color(level: &Level) -> &'static str {
        match *level {
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            Level::DEBUG => "\x1b[34m",
            Level::TRACE => "\x1b[35m",
        }
    }
}

impl<S, N> FormatEvent<S, N> for TargetFirstFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        write!(writer, "{} ", now)?;

        if self.ansi {
            write!(
                writer,
                "{}{:>5}\x1b[0m ",
                Self::level_color(metadata.level()),
                metadata.level()
            )?;
        } else {
            write!(writer, "{:>5} ", metadata.level())?;
        }
        write!(writer, "{}: ", metadata.target())?;

        if let Some(scope) = ctx.event_scope() {
            let names: Vec<&str> = scope.from_root().map(|span| span.name()).collect();
            if !names.is_empty() {
                write!(writer, "{}: ", names.join(":"))?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global subscriber. Calling it twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = std::io::stderr().is_terminal();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .event_format(TargetFirstFormat::new(ansi));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
