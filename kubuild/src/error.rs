use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Deployment name is not allowed to be empty"))]
    EmptyName,

    #[snafu(display("Deployment labels are not allowed to be empty"))]
    EmptyLabels,

    #[snafu(display("Deployment.spec.template labels are not allowed to be empty"))]
    EmptyPodLabels,

    #[snafu(display("Deployment.spec.template.spec.containers is not allowed to be empty"))]
    EmptyContainers,

    #[snafu(display("Deployment selector labels are not allowed to be empty"))]
    EmptySelector,

    #[snafu(display("Container port {port} is out of range, expected 0 < containerPort < 65536"))]
    InvalidContainerPort { port: i32 },

    #[snafu(display("Container image is not allowed to be empty"))]
    EmptyImage,

    #[snafu(display("Failed to map selector match expressions, error: {source}"))]
    MapMatchExpressions { source: crate::selector::Error },

    #[snafu(display("Failed to map container environment variables, error: {source}"))]
    MapEnvs { source: crate::env::Error },

    #[snafu(display("Failed to decode Deployment from JSON, error: {source}"))]
    DecodeJson { source: serde_json::Error },

    #[snafu(display("Failed to decode Deployment from YAML, error: {source}"))]
    DecodeYaml { source: serde_yaml::Error },
}

/// Coarse classification of [`Error`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A required field is missing or a value is outside its legal range.
    Validation,
    /// Converting caller input into descriptor fragments failed.
    Mapping,
    /// A serialized descriptor could not be decoded.
    Decode,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyName
            | Self::EmptyLabels
            | Self::EmptyPodLabels
            | Self::EmptyContainers
            | Self::EmptySelector
            | Self::InvalidContainerPort { .. }
            | Self::EmptyImage => ErrorKind::Validation,
            Self::MapMatchExpressions { .. } | Self::MapEnvs { .. } => ErrorKind::Mapping,
            Self::DecodeJson { .. } | Self::DecodeYaml { .. } => ErrorKind::Decode,
        }
    }
}
