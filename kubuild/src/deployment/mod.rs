//! The Deployment accumulator.
//!
//! [`DeploymentBuilder`] owns a work-in-progress [`Deployment`] and a single
//! error slot. Every setter consumes and returns the builder so calls can be
//! chained. The first failing setter records its error, every later setter
//! becomes a no-op, and [`DeploymentBuilder::finish`] reports that first
//! error.

mod finish;
mod pod;

use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::PodSpec,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kubuild_base::consts::k8s::deployment::MIN_READY_SECONDS_FLOOR;
use snafu::{ResultExt, ensure};

pub use self::finish::{Finished, TypeMeta};
use crate::{
    config::Defaults,
    error::{self, Error},
    selector::{self, LabelSelectorRequirement},
};

#[must_use = "a builder does nothing until `finish` is called"]
#[derive(Debug, Default)]
pub struct DeploymentBuilder {
    deployment: Deployment,

    defaults: Defaults,

    error: Option<Error>,
}

impl From<Deployment> for DeploymentBuilder {
    fn from(deployment: Deployment) -> Self {
        Self { deployment, defaults: Defaults::default(), error: None }
    }
}

impl DeploymentBuilder {
    pub fn new() -> Self { Self::default() }

    /// Decodes a complete Deployment from JSON.
    ///
    /// A decoding failure does not break the chain, it is recorded as the
    /// builder's error and surfaces from [`finish`](Self::finish).
    pub fn from_json(data: &[u8]) -> Self {
        serde_json::from_slice::<Deployment>(data)
            .context(error::DecodeJsonSnafu)
            .map_or_else(Self::failed, Self::from)
    }

    /// Decodes a complete Deployment from YAML, see
    /// [`from_json`](Self::from_json).
    pub fn from_yaml(data: &[u8]) -> Self {
        serde_yaml::from_slice::<Deployment>(data)
            .context(error::DecodeYamlSnafu)
            .map_or_else(Self::failed, Self::from)
    }

    fn failed(err: Error) -> Self {
        let mut builder = Self::new();
        builder.record(err);
        builder
    }

    /// Replaces the fallbacks used when a setter coerces an out-of-range
    /// value. Already applied values are left alone.
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// The work-in-progress descriptor.
    #[must_use]
    pub const fn deployment(&self) -> &Deployment { &self.deployment }

    /// The first recorded error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> { self.error.as_ref() }

    pub fn set_name<S: Into<String>>(self, name: S) -> Self {
        self.apply(|this| {
            this.deployment.metadata.name = Some(name.into());
            Ok(())
        })
    }

    /// Sets the namespace of the Deployment and of its pod template.
    pub fn set_namespace<S: Into<String>>(self, namespace: S) -> Self {
        self.apply(|this| {
            let namespace = namespace.into();
            this.template_metadata_mut().namespace = Some(namespace.clone());
            this.deployment.metadata.namespace = Some(namespace);
            Ok(())
        })
    }

    pub fn set_namespace_and_name<N, S>(self, namespace: N, name: S) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        self.set_namespace(namespace).set_name(name)
    }

    /// Sets both the Deployment labels and the pod template labels.
    ///
    /// The two copies are independent afterwards, a later
    /// [`set_pod_labels`](Self::set_pod_labels) only touches the template.
    pub fn set_labels<I, K, V>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.apply(|this| {
            this.write_labels(string_map(labels));
            Ok(())
        })
    }

    /// Sets the pod template labels only. Not meant to be combined with
    /// [`set_labels`](Self::set_labels), whichever runs last wins for the
    /// template.
    pub fn set_pod_labels<I, K, V>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.apply(|this| {
            this.template_metadata_mut().labels = Some(string_map(labels));
            Ok(())
        })
    }

    /// Sets the selector match labels, and through
    /// [`set_labels`](Self::set_labels) the Deployment and pod template
    /// labels to the same map. Existing match expressions are kept.
    ///
    /// Records [`Error::EmptySelector`] for an empty map.
    pub fn set_selector<I, K, V>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.apply(|this| this.write_selector(string_map(labels)))
    }

    /// Replaces the selector match expressions. Match labels are kept.
    ///
    /// Records [`Error::MapMatchExpressions`] when a requirement cannot be
    /// mapped.
    pub fn set_match_expressions<I>(self, requirements: I) -> Self
    where
        I: IntoIterator<Item = LabelSelectorRequirement>,
    {
        self.apply(|this| {
            let expressions = selector::to_match_expressions(requirements)
                .context(error::MapMatchExpressionsSnafu)?;
            this.spec_mut().selector.match_expressions = Some(expressions);
            Ok(())
        })
    }

    #[must_use]
    pub fn pod_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.template.metadata.as_ref())
            .and_then(|metadata| metadata.labels.as_ref())
    }

    pub fn set_annotations<I, K, V>(self, annotations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.apply(|this| {
            this.deployment.metadata.annotations = Some(string_map(annotations));
            Ok(())
        })
    }

    /// Sets the desired replica count as given, zero and negative included.
    pub fn set_replicas(self, replicas: i32) -> Self {
        self.apply(|this| {
            this.spec_mut().replicas = Some(replicas);
            Ok(())
        })
    }

    /// Negative values are clamped to zero.
    pub fn set_min_ready_seconds(self, seconds: i32) -> Self {
        self.apply(|this| {
            this.spec_mut().min_ready_seconds = Some(seconds.max(MIN_READY_SECONDS_FLOOR));
            Ok(())
        })
    }

    /// Number of old `ReplicaSet`s kept for rollback. A non-positive limit
    /// falls back to [`Defaults::revision_history_limit`].
    pub fn set_history_limit(self, limit: i32) -> Self {
        self.apply(|this| {
            let limit = if limit <= 0 { this.defaults.revision_history_limit } else { limit };
            this.spec_mut().revision_history_limit = Some(limit);
            Ok(())
        })
    }

    /// Seconds a rollout may take before the controller reports
    /// `ProgressDeadlineExceeded`. A negative value falls back to
    /// [`Defaults::progress_deadline_seconds`].
    pub fn set_deploy_max_time(self, seconds: i32) -> Self {
        self.apply(|this| {
            let seconds =
                if seconds < 0 { this.defaults.progress_deadline_seconds } else { seconds };
            this.spec_mut().progress_deadline_seconds = Some(seconds);
            Ok(())
        })
    }

    /// Runs `f` unless an error is already recorded, recording the error `f`
    /// returns.
    fn apply<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        if self.error.is_none()
            && let Err(err) = f(&mut self)
        {
            self.record(err);
        }
        self
    }

    fn record(&mut self, err: Error) {
        if self.error.is_none() {
            tracing::debug!(
                deployment = self.deployment.metadata.name.as_deref().unwrap_or_default(),
                "Deployment builder recorded error: {err}"
            );
            self.error = Some(err);
        }
    }

    fn write_labels(&mut self, labels: BTreeMap<String, String>) {
        self.template_metadata_mut().labels = Some(labels.clone());
        self.deployment.metadata.labels = Some(labels);
    }

    fn write_selector(&mut self, labels: BTreeMap<String, String>) -> Result<(), Error> {
        ensure!(!labels.is_empty(), error::EmptySelectorSnafu);
        self.write_labels(labels.clone());
        self.spec_mut().selector.match_labels = Some(labels);
        Ok(())
    }

    fn spec_mut(&mut self) -> &mut DeploymentSpec {
        self.deployment.spec.get_or_insert_with(DeploymentSpec::default)
    }

    fn template_metadata_mut(&mut self) -> &mut ObjectMeta {
        self.spec_mut().template.metadata.get_or_insert_with(ObjectMeta::default)
    }

    fn pod_spec_mut(&mut self) -> &mut PodSpec {
        self.spec_mut().template.spec.get_or_insert_with(PodSpec::default)
    }
}

fn string_map<I, K, V>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries.into_iter().map(|(key, value)| (key.into(), value.into())).collect()
}
