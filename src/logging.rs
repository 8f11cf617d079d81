//! Session logging.
//!
//! Every event is written twice, to stderr and to a per-run file, as
//! `[LEVEL] timestamp - message`.

use crate::error::{AppError, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

/// Event formatter shared by the console and file layers.
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
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
        write!(
            writer,
            "[{}] {} - ",
            event.metadata().level(),
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f")
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Name of the log file for a run started at `started`.
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("downloader-{}.log", started.format("%Y-%m-%d-%H-%M-%S"))
}

/// Installs the global subscriber and returns the path of the session log file.
///
/// # Errors
/// * If the log directory or file cannot be created
/// * If a global subscriber is already installed
pub fn init(logs_directory: &Path) -> Result<PathBuf> {
    fs::create_dir_all(logs_directory)?;
    let path = logs_directory.join(log_file_name(Local::now()));
    let file = File::create(&path)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(path)
}
