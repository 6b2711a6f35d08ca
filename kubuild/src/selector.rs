//! Mapping of caller supplied match expressions into the selector
//! representation of the descriptor.

use std::{fmt, str::FromStr};

use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use serde::{Deserialize, Serialize};
use snafu::{Snafu, ensure};

/// Set-based label selector operator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val = match self {
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
        };
        f.write_str(val)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            "Exists" => Ok(Self::Exists),
            "DoesNotExist" => Ok(Self::DoesNotExist),
            _ => InvalidOperatorSnafu { value }.fail(),
        }
    }
}

/// One match expression as supplied by a caller.
///
/// The operator is kept as text and only checked while mapping, so a whole
/// list can be decoded from configuration before it is validated.
#[derive(Clone, Debug, Default, Deserialize, Eq, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    pub key: String,

    pub operator: String,

    #[serde(default)]
    pub values: Vec<String>,
}

impl LabelSelectorRequirement {
    #[must_use]
    pub fn new<K, O, I, V>(key: K, operator: O, values: I) -> Self
    where
        K: Into<String>,
        O: fmt::Display,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            operator: operator.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// # Errors
    ///
    /// Fails when the key is blank or the operator is unknown.
    pub fn to_kubernetes(&self) -> Result<metav1::LabelSelectorRequirement, Error> {
        let Self { key, operator, values } = self;
        ensure!(!key.trim().is_empty(), EmptyKeySnafu);
        let operator = operator.parse::<Operator>()?;

        Ok(metav1::LabelSelectorRequirement {
            key: key.clone(),
            operator: operator.to_string(),
            values: (!values.is_empty()).then(|| values.clone()),
        })
    }
}

/// Maps every requirement, preserving input order.
///
/// # Errors
///
/// Returns the error of the first requirement that fails to map.
pub fn to_match_expressions<I>(
    requirements: I,
) -> Result<Vec<metav1::LabelSelectorRequirement>, Error>
where
    I: IntoIterator<Item = LabelSelectorRequirement>,
{
    requirements.into_iter().map(|requirement| requirement.to_kubernetes()).collect()
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("'{value}' is not a valid label selector operator"))]
    InvalidOperator { value: String },

    #[snafu(display("Match expression key is not allowed to be empty"))]
    EmptyKey,
}
