mod error;
mod log;

use std::path::Path;

use kubuild_base::consts::k8s::deployment;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub use self::{error::Error, log::LogConfig};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub log: LogConfig,
}

/// Fallbacks substituted by the builder when a setter receives an
/// out-of-range value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    /// Used by `set_history_limit` for a non-positive limit.
    #[serde(default = "Defaults::default_revision_history_limit")]
    pub revision_history_limit: i32,

    /// Used by `set_deploy_max_time` for a negative deadline.
    #[serde(default = "Defaults::default_progress_deadline_seconds")]
    pub progress_deadline_seconds: i32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            revision_history_limit: Self::default_revision_history_limit(),
            progress_deadline_seconds: Self::default_progress_deadline_seconds(),
        }
    }
}

impl Defaults {
    #[inline]
    #[must_use]
    pub const fn default_revision_history_limit() -> i32 {
        deployment::DEFAULT_REVISION_HISTORY_LIMIT
    }

    #[inline]
    #[must_use]
    pub const fn default_progress_deadline_seconds() -> i32 {
        deployment::DEFAULT_PROGRESS_DEADLINE_SECONDS
    }
}

impl Config {
    /// Loads a YAML config, expanding `~` in `path` and in `log.filePath`.
    ///
    /// # Errors
    ///
    /// Fails when a path cannot be resolved, the file cannot be read or its
    /// content is not a valid config document.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut config: Self = {
            let path =
                path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                    error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
                })?;
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.log.file_path = config
            .log
            .file_path
            .map(|path| {
                path.try_resolve()
                    .map(|resolved| resolved.to_path_buf())
                    .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
            })
            .transpose()?;

        Ok(config)
    }
}
