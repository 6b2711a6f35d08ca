//! Logging configuration for applications embedding the builder.
//!
//! The library itself only emits `tracing` events and never installs a
//! subscriber. [`LogConfig::init`] is the one place that does.

use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use snafu::ResultExt;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Error, error};

/// Where log events go and which level passes the filter.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Append events to this file when set.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub emit_journald: bool,

    #[serde(default)]
    pub emit_stdout: bool,

    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            emit_journald: false,
            emit_stdout: false,
            emit_stderr: Self::default_emit_stderr(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::INFO }

    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { true }

    /// Installs the global `tracing` subscriber described by this config.
    ///
    /// A sink that cannot be opened (an unwritable log file, a missing
    /// journald socket) is skipped rather than failing the whole setup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitializeLogger`] when a global subscriber has
    /// already been installed.
    pub fn init(&self) -> Result<(), Error> {
        let Self { file_path, emit_journald, emit_stdout, emit_stderr, level } = self;
        let file = file_path
            .as_ref()
            .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());

        tracing_subscriber::registry()
            .with(LevelFilter::from_level(*level))
            .with(emit_journald.then(tracing_journald::layer).and_then(Result::ok))
            .with(file.map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file))))
            .with(emit_stdout.then(|| fmt::layer().with_writer(std::io::stdout)))
            .with(emit_stderr.then(|| fmt::layer().with_writer(std::io::stderr)))
            .try_init()
            .context(error::InitializeLoggerSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: LogConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.level, tracing::Level::INFO);
        assert!(config.emit_stderr);
        assert!(!config.emit_stdout);
        assert!(!config.emit_journald);
        assert!(config.file_path.is_none());
    }

    #[test]
    fn test_level_from_string() {
        let config: LogConfig =
            serde_yaml::from_str("level: debug\nemitStdout: true\nfilePath: /tmp/kubuild.log\n")
                .unwrap();
        assert_eq!(config.level, tracing::Level::DEBUG);
        assert!(config.emit_stdout);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/kubuild.log")));

        assert!(serde_yaml::from_str::<LogConfig>("level: loud\n").is_err());
    }

    #[test]
    fn test_init_writes_file_and_installs_once() {
        let path = std::env::temp_dir()
            .join(format!("{}-{}-init.log", kubuild_base::PROJECT_NAME, std::process::id()));
        let _unused = std::fs::remove_file(&path);
        let config = LogConfig {
            file_path: Some(path.clone()),
            emit_stderr: false,
            ..LogConfig::default()
        };

        assert!(config.init().is_ok());
        tracing::info!("file sink marker 4f1c");
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("file sink marker 4f1c"));

        assert!(matches!(config.init(), Err(Error::InitializeLogger { .. })));
        std::fs::remove_file(&path).unwrap();
    }
}
