use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use kubuild_base::consts::k8s::deployment as consts;
use snafu::ensure;

use crate::{
    deployment::DeploymentBuilder,
    error::{self, Error},
};

/// `apiVersion` and `kind` of a finished descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TypeMeta {
    pub api_version: &'static str,

    pub kind: &'static str,
}

impl TypeMeta {
    #[must_use]
    pub const fn deployment() -> Self {
        Self { api_version: consts::API_VERSION, kind: consts::KIND }
    }
}

/// Outcome of [`DeploymentBuilder::finish`].
///
/// The descriptor is available even when an error was recorded, check
/// [`error`](Self::error) before submitting it anywhere.
#[derive(Debug)]
pub struct Finished {
    deployment: Deployment,

    type_meta: Option<TypeMeta>,

    error: Option<Error>,
}

impl Finished {
    #[must_use]
    pub const fn deployment(&self) -> &Deployment { &self.deployment }

    /// Stamped only when verification passed.
    #[must_use]
    pub const fn type_meta(&self) -> Option<TypeMeta> { self.type_meta }

    #[must_use]
    pub const fn error(&self) -> Option<&Error> { self.error.as_ref() }

    #[must_use]
    pub const fn is_ok(&self) -> bool { self.error.is_none() }

    #[must_use]
    pub fn into_parts(self) -> (Deployment, Option<Error>) { (self.deployment, self.error) }

    /// # Errors
    ///
    /// Returns the recorded error, dropping the descriptor.
    pub fn into_result(self) -> Result<Deployment, Error> {
        self.error.map_or(Ok(self.deployment), Err)
    }
}

impl DeploymentBuilder {
    /// Verifies required fields, derives the selector from the pod template
    /// labels when none was set, and stamps the type metadata.
    ///
    /// Verification is skipped when a setter already recorded an error, that
    /// error is reported instead.
    #[must_use]
    pub fn finish(mut self) -> Finished {
        let type_meta = if self.error.is_none() {
            self.verify().map_err(|err| self.record(err)).ok()
        } else {
            None
        };

        let Self { deployment, error, .. } = self;
        let name = deployment.metadata.name.as_deref().unwrap_or_default();
        match &error {
            Some(err) => tracing::warn!(deployment = name, "Deployment is incomplete: {err}"),
            None => tracing::debug!(deployment = name, "Deployment finished"),
        }

        Finished { deployment, type_meta, error }
    }

    fn verify(&mut self) -> Result<TypeMeta, Error> {
        let metadata = &self.deployment.metadata;
        ensure!(
            metadata.name.as_deref().is_some_and(|name| !name.trim().is_empty()),
            error::EmptyNameSnafu
        );
        ensure!(metadata.labels.as_ref().is_some_and(is_non_empty), error::EmptyLabelsSnafu);
        ensure!(self.pod_labels().is_some_and(is_non_empty), error::EmptyPodLabelsSnafu);
        ensure!(
            self.deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.template.spec.as_ref())
                .is_some_and(|pod| !pod.containers.is_empty()),
            error::EmptyContainersSnafu
        );

        // A derived selector rewrites the Deployment labels too.
        if self.selector_is_unset() {
            let pod_labels = self.pod_labels().cloned().unwrap_or_default();
            self.write_selector(pod_labels)?;
        }

        Ok(TypeMeta::deployment())
    }

    fn selector_is_unset(&self) -> bool {
        self.deployment.spec.as_ref().is_none_or(|spec| {
            spec.selector.match_labels.as_ref().is_none_or(BTreeMap::is_empty)
                && spec.selector.match_expressions.as_ref().is_none_or(Vec::is_empty)
        })
    }
}

fn is_non_empty(labels: &BTreeMap<String, String>) -> bool { !labels.is_empty() }

#[cfg(test)]
mod tests {
    use k8s_openapi::Resource;

    use super::*;
    use crate::{
        ErrorKind,
        selector::{LabelSelectorRequirement, Operator},
    };

    fn minimal() -> DeploymentBuilder {
        DeploymentBuilder::new().set_name("web").set_labels([("app", "web")]).set_container(
            "web",
            "nginx:1.27",
            80,
        )
    }

    fn labels(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_minimal_build_finishes() {
        let finished = minimal().finish();

        assert!(finished.is_ok());
        assert_eq!(
            finished.type_meta(),
            Some(TypeMeta { api_version: "apps/v1", kind: "Deployment" })
        );

        let value = serde_json::to_value(finished.deployment()).unwrap();
        assert_eq!(value["apiVersion"], "apps/v1");
        assert_eq!(value["kind"], "Deployment");
        assert_eq!(value["spec"]["selector"]["matchLabels"]["app"], "web");
    }

    #[test]
    fn test_type_meta_matches_resource() {
        let type_meta = TypeMeta::deployment();
        assert_eq!(type_meta.api_version, <Deployment as Resource>::API_VERSION);
        assert_eq!(type_meta.kind, <Deployment as Resource>::KIND);
    }

    #[test]
    fn test_missing_name() {
        for builder in [minimal().set_name(""), minimal().set_name("  ")] {
            let finished = builder.finish();
            assert!(matches!(finished.error(), Some(Error::EmptyName)));
            assert!(finished.type_meta().is_none());
        }

        let finished = DeploymentBuilder::new()
            .set_labels([("app", "web")])
            .set_container("web", "nginx", 80)
            .finish();
        let err = finished.error().unwrap();
        assert!(matches!(err, Error::EmptyName));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_missing_labels() {
        let finished = DeploymentBuilder::new()
            .set_name("web")
            .set_pod_labels([("app", "web")])
            .set_container("web", "nginx", 80)
            .finish();
        assert!(matches!(finished.error(), Some(Error::EmptyLabels)));

        let finished = minimal().set_labels(BTreeMap::<String, String>::new()).finish();
        assert!(matches!(finished.error(), Some(Error::EmptyLabels)));
    }

    #[test]
    fn test_missing_pod_labels() {
        let finished = minimal().set_pod_labels(BTreeMap::<String, String>::new()).finish();
        assert!(matches!(finished.error(), Some(Error::EmptyPodLabels)));
    }

    #[test]
    fn test_missing_containers() {
        let finished = DeploymentBuilder::new().set_name("web").set_labels([("app", "web")]).finish();
        let err = finished.error().unwrap();
        assert!(matches!(err, Error::EmptyContainers));
        assert!(err.to_string().contains("containers"));
    }

    #[test]
    fn test_checks_run_in_order() {
        let finished = DeploymentBuilder::new().finish();
        assert!(matches!(finished.error(), Some(Error::EmptyName)));

        let finished = DeploymentBuilder::new().set_name("web").finish();
        assert!(matches!(finished.error(), Some(Error::EmptyLabels)));
    }

    #[test]
    fn test_selector_derived_from_pod_labels() {
        let finished = minimal().set_pod_labels([("app", "x")]).finish();

        let deployment = finished.into_result().unwrap();
        assert_eq!(deployment.metadata.labels, Some(labels(&[("app", "x")])));
        let spec = deployment.spec.unwrap();
        assert_eq!(spec.selector.match_labels, Some(labels(&[("app", "x")])));
        assert_eq!(spec.template.metadata.unwrap().labels, Some(labels(&[("app", "x")])));
    }

    #[test]
    fn test_explicit_selector_is_kept() {
        let finished = minimal().set_selector([("tier", "web")]).set_pod_labels([("app", "x")]).finish();

        let spec = finished.deployment().spec.as_ref().unwrap();
        assert_eq!(spec.selector.match_labels, Some(labels(&[("tier", "web")])));
    }

    #[test]
    fn test_match_expressions_count_as_selector() {
        let finished = minimal()
            .set_match_expressions([LabelSelectorRequirement::new("app", Operator::In, ["web"])])
            .finish();

        assert!(finished.is_ok());
        let selector = &finished.deployment().spec.as_ref().unwrap().selector;
        assert!(selector.match_labels.is_none());
        assert_eq!(selector.match_expressions.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_prior_error_is_reported() {
        let finished = minimal().set_container("web", "nginx", 70000).finish();

        assert!(matches!(finished.error(), Some(Error::InvalidContainerPort { port: 70000 })));
        assert!(finished.type_meta().is_none());
        let spec = finished.deployment().spec.as_ref().unwrap();
        assert_eq!(spec.selector.match_labels, None);

        let (deployment, err) = finished.into_parts();
        assert_eq!(deployment.metadata.name.as_deref(), Some("web"));
        assert!(err.is_some());
    }

    #[test]
    fn test_finish_is_idempotent() {
        let first = minimal().set_pod_labels([("app", "x")]).finish().into_result().unwrap();
        let second = DeploymentBuilder::from(first.clone()).finish();

        assert!(second.is_ok());
        assert_eq!(second.deployment(), &first);
    }

    #[test]
    fn test_decoded_descriptor_finishes() {
        let data = b"apiVersion: apps/v1
kind: Deployment
metadata:
  name: api
  labels:
    app: api
spec:
  selector: {}
  template:
    metadata:
      labels:
        app: api
    spec:
      containers:
        - name: api
          image: registry.local/api:2
";
        let finished = DeploymentBuilder::from_yaml(data).set_history_limit(-1).finish();

        let deployment = finished.into_result().unwrap();
        let spec = deployment.spec.unwrap();
        assert_eq!(spec.selector.match_labels, Some(labels(&[("app", "api")])));
        assert_eq!(spec.revision_history_limit, Some(10));
    }

    #[test]
    fn test_full_chain() {
        let finished = DeploymentBuilder::new()
            .set_namespace_and_name("shop", "checkout")
            .set_selector([("app", "checkout")])
            .set_annotations([("team", "payments")])
            .set_replicas(3)
            .set_min_ready_seconds(10)
            .set_history_limit(5)
            .set_deploy_max_time(300)
            .set_http_liveness(8080, "/healthz", crate::ProbeTiming::new(30, 1, 10), None)
            .set_tcp_readiness("", 8080, crate::ProbeTiming::new(5, 1, 5))
            .set_envs([("RUST_LOG", "info")])
            .set_pv_claim("cache", "checkout-cache")
            .set_pvc_mounts("cache", "/var/cache/checkout")
            .set_container("checkout", "registry.local/checkout:1.4.2", 8080)
            .set_container("metrics", "registry.local/exporter:0.9", 9100)
            .finish();

        assert!(finished.is_ok(), "{:?}", finished.error());
        let deployment = finished.into_result().unwrap();
        assert_eq!(deployment.metadata.namespace.as_deref(), Some("shop"));

        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(3));
        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.containers.len(), 2);
        let primary = &pod.containers[0];
        assert_eq!(primary.name, "checkout");
        assert!(primary.liveness_probe.is_some());
        assert!(primary.readiness_probe.is_some());
        assert_eq!(primary.env.as_ref().unwrap()[0].name, "RUST_LOG");
        assert!(pod.containers[1].env.is_none());
        assert_eq!(pod.volumes.unwrap()[0].name, "cache");
    }
}
