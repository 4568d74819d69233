use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directives for the verbosity flags; None defers to RUST_LOG
fn directives(verbose_level: u8, quiet: bool) -> Option<&'static str> {
    if quiet {
        return Some("error");
    }
    match verbose_level {
        0 => None,
        // -v: debug, without the per-request hyper noise
        1 => Some("debug,hyper::proto::h1=warn,hyper::client::pool=warn"),
        _ => Some("trace"),
    }
}

fn build_filter(verbose_level: u8, quiet: bool) -> EnvFilter {
    match directives(verbose_level, quiet) {
        Some("error") => EnvFilter::new("error"),
        Some(fallback) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Rolling appender for `log_path`: "plexlink.log" rotates into "plexlink.<date>"
fn file_writer(log_path: &Path) -> Result<RollingFileAppender> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let log_prefix = log_filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(log_filename);

    Ok(RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix))
}

pub fn init_logging(verbose_level: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let filter = build_filter(verbose_level, quiet);

    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal());

    let (writer, ansi) = match log_file {
        Some(path) => (BoxMakeWriter::new(file_writer(&path)?), false),
        None => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
    };

    let registry = Registry::default().with(filter);
    if json {
        let layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer);
        registry.with(layer).init();
    } else {
        let layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer);
        registry.with(layer).init();
    }

    Ok(())
}
