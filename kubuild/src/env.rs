//! Conversion of an environment map into container [`EnvVar`] entries.
//!
//! The resulting list is ordered by variable name, so the same map always
//! yields the same list regardless of the iteration order of its source.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::EnvVar;
use snafu::{Snafu, ensure};

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "Environment variable name '{name}' is invalid, expected it to match \
         [A-Za-z_][A-Za-z0-9_]*"
    ))]
    InvalidName { name: String },
}

/// Converts `(name, value)` pairs into environment variables sorted by name.
///
/// A name appearing more than once keeps its last value.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] for the first name, in sorted order, that is
/// not a C identifier.
pub fn to_env_vars<I, K, V>(envs: I) -> Result<Vec<EnvVar>, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    envs.into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect::<BTreeMap<String, String>>()
        .into_iter()
        .map(|(name, value)| -> Result<EnvVar, Error> {
            ensure!(is_c_identifier(&name), InvalidNameSnafu { name });
            Ok(EnvVar { name, value: Some(value), ..EnvVar::default() })
        })
        .collect()
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
