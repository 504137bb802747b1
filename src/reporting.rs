//! Utilities for logging and automated bug reporting.

use std::{io::Write, path::PathBuf, str::FromStr};

use eyre::Context;
use tracing_appender::{
    non_blocking::{NonBlockingBuilder, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt};

use crate::fs;

/// File name prefix of the rolling log files.
pub const LOG_FILE_NAME: &str = "aqi-dashboard.log";
const DEFAULT_FILTER: &str = "warn,aqi_dashboard=info,waqi=info";

/// Daily (or otherwise rotated) log files in `directory`, created on demand.
#[derive(Clone)]
struct LogFile {
    directory: PathBuf,
    rotation: Rotation,
}

/// Destination of formatted log lines, stdout and/or a log file.
struct ReportWriter {
    stdout: bool,
    log_file: Option<RollingFileAppender>,
}

impl ReportWriter {
    fn try_new(stdout: bool, log_file: Option<&LogFile>) -> eyre::Result<Self> {
        let log_file = log_file
            .map(|log_file| {
                fs::create_dir_if_not_exists(&log_file.directory).wrap_err_with(|| {
                    format!("Unable to create log file directory {:?}", log_file.directory)
                })?;
                Ok::<_, eyre::Error>(RollingFileAppender::new(
                    log_file.rotation.clone(),
                    &log_file.directory,
                    LOG_FILE_NAME,
                ))
            })
            .transpose()?;

        Ok(Self { stdout, log_file })
    }
}

impl Write for ReportWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.stdout {
            std::io::stdout().write_all(buf)?;
        }

        if let Some(log_file) = &mut self.log_file {
            log_file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.stdout {
            std::io::stdout().flush()?;
        }
        if let Some(log_file) = &mut self.log_file {
            log_file.flush()?;
        }
        Ok(())
    }
}

/// Keeps the log writer and sentry client alive, dropping it flushes pending messages.
pub struct ReportingGuard {
    _sentry: Option<sentry::ClientInitGuard>,
    _writer: WorkerGuard,
}

pub struct ReportingOptions {
    pub data_dir: PathBuf,
    pub log_rotation: Rotation,
}

impl ReportingOptions {
    fn log_dir(&self) -> PathBuf {
        self.data_dir.join("log")
    }
}

fn init_sentry() -> eyre::Result<Option<sentry::ClientInitGuard>> {
    let sentry_dsn = match std::env::var("SENTRY_DSN") {
        Ok(sentry_dsn) => sentry_dsn,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(error) => return Err(error).wrap_err("Error reading `SENTRY_DSN` environment variable"),
    };
    let dsn: sentry::types::Dsn = sentry_dsn
        .parse()
        .wrap_err("Error parsing `SENTRY_DSN` environment variable")?;

    Ok(Some(sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        traces_sample_rate: 0.2,
        ..sentry::ClientOptions::default()
    })))
}

/// Install the global `tracing` subscriber and the `color-eyre` report hooks. Logs go to stdout
/// and a daily rolling file in `<data_dir>/log`, filtered by `RUST_LOG`.
pub fn setup_reporting(options: &ReportingOptions) -> eyre::Result<ReportingGuard> {
    let sentry = init_sentry()?;

    let report_writer = ReportWriter::try_new(
        true,
        Some(&LogFile {
            directory: options.log_dir(),
            rotation: options.log_rotation.clone(),
        }),
    )?;

    let (non_blocking_writer, report_writer_guard) = NonBlockingBuilder::default()
        .buffered_lines_limit(1000)
        .lossy(false)
        .finish(report_writer);

    let rust_log_env: String =
        std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_owned());
    let filter = tracing_subscriber::EnvFilter::from_str(rust_log_env.as_str())
        .wrap_err_with(|| format!("Error parsing `RUST_LOG` filter {:?}", rust_log_env))?;

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking_writer);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .with(tracing_error::ErrorLayer::default())
        .with(sentry.as_ref().map(|_| sentry_tracing::layer()))
        .try_init()
        .wrap_err("Unable to install tracing subscriber")?;

    let (eyre_panic_hook, eyre_hook) = color_eyre::config::HookBuilder::new().into_hooks();
    let eyre_panic_hook = eyre_panic_hook.into_panic_hook();
    eyre::set_hook(eyre_hook.into_eyre_hook())?;
    std::panic::set_hook(Box::new(move |panic_info| {
        eyre_panic_hook(panic_info);
    }));

    if sentry.is_some() {
        tracing::info!("sentry.io reporting is enabled");
    }

    Ok(ReportingGuard {
        _sentry: sentry,
        _writer: report_writer_guard,
    })
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use tracing_appender::rolling::Rotation;

    use super::{LogFile, ReportWriter, LOG_FILE_NAME};

    #[test]
    fn log_file_created_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("data").join("log");
        let mut writer = ReportWriter::try_new(
            false,
            Some(&LogFile {
                directory: log_dir.clone(),
                rotation: Rotation::NEVER,
            }),
        )
        .unwrap();

        writer.write_all(b"Dashboard written\n").unwrap();
        writer.flush().unwrap();

        let contents = std::fs::read_to_string(log_dir.join(LOG_FILE_NAME)).unwrap();
        assert_eq!("Dashboard written\n", contents);
    }

    #[test]
    fn writer_without_destinations_accepts_everything() {
        let mut writer = ReportWriter::try_new(false, None).unwrap();
        assert_eq!(5, writer.write(b"hello").unwrap());
        writer.flush().unwrap();
    }
}
