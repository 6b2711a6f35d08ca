//! Setters for the pod template: containers, environment, probes, volumes.
//!
//! Probes and volume mounts always target the primary container
//! ([`PRIMARY_INDEX`]), which is created empty when missing. A later
//! [`set_container`](DeploymentBuilder::set_container) fills such an empty
//! slot instead of appending.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PersistentVolumeClaimVolumeSource, Probe, Volume, VolumeMount,
};
use kubuild_base::consts::k8s::container::{MAX_PORT, MIN_PORT, PRIMARY_INDEX};
use snafu::{ResultExt, ensure};

use crate::{
    deployment::DeploymentBuilder,
    env,
    error,
    probe::{self, ProbeTiming},
};

#[derive(Clone, Copy, Debug)]
enum ProbeKind {
    Liveness,
    Readiness,
}

impl DeploymentBuilder {
    /// Adds a container exposing a single port.
    ///
    /// The first container without an image, typically one pre-allocated by
    /// a probe, env or mount setter, receives the name, image and port.
    /// Without such a slot the container is appended.
    ///
    /// Records [`crate::Error::InvalidContainerPort`] unless `0 < container_port <
    /// 65536`, and [`crate::Error::EmptyImage`] for a blank image.
    pub fn set_container<N, I>(self, name: N, image: I, container_port: i32) -> Self
    where
        N: Into<String>,
        I: Into<String>,
    {
        self.apply(|this| {
            ensure!(
                (MIN_PORT + 1..MAX_PORT).contains(&container_port),
                error::InvalidContainerPortSnafu { port: container_port }
            );
            let image = image.into();
            ensure!(!image.trim().is_empty(), error::EmptyImageSnafu);

            let name = name.into();
            let ports = vec![ContainerPort { container_port, ..ContainerPort::default() }];
            let containers = &mut this.pod_spec_mut().containers;
            if let Some(index) = vacant_container_index(containers) {
                let container = &mut containers[index];
                container.name = name;
                container.image = Some(image);
                container.ports = Some(ports);
            } else {
                containers.push(Container {
                    name,
                    image: Some(image),
                    ports: Some(ports),
                    ..Container::default()
                });
            }
            Ok(())
        })
    }

    /// Attaches the environment to every container that has none yet,
    /// creating an empty container when there is none at all.
    ///
    /// Records [`crate::Error::MapEnvs`] when a name is not a valid identifier.
    pub fn set_envs<I, K, V>(self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.apply(|this| {
            let envs = env::to_env_vars(envs).context(error::MapEnvsSnafu)?;
            let containers = &mut this.pod_spec_mut().containers;
            if containers.is_empty() {
                containers.push(Container::default());
            }
            for container in containers.iter_mut().filter(|container| container.env.is_none()) {
                container.env = Some(envs.clone());
            }
            Ok(())
        })
    }

    pub fn set_http_liveness<P>(
        self,
        port: i32,
        path: P,
        timing: ProbeTiming,
        headers: Option<BTreeMap<String, String>>,
    ) -> Self
    where
        P: Into<String>,
    {
        self.set_probe(ProbeKind::Liveness, probe::http_probe(port, path, timing, headers))
    }

    pub fn set_command_liveness<I, S>(self, command: I, timing: ProbeTiming) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_probe(ProbeKind::Liveness, probe::command_probe(command, timing))
    }

    pub fn set_tcp_liveness<H>(self, host: H, port: i32, timing: ProbeTiming) -> Self
    where
        H: Into<String>,
    {
        self.set_probe(ProbeKind::Liveness, probe::tcp_probe(host, port, timing))
    }

    pub fn set_http_readiness<P>(
        self,
        port: i32,
        path: P,
        timing: ProbeTiming,
        headers: Option<BTreeMap<String, String>>,
    ) -> Self
    where
        P: Into<String>,
    {
        self.set_probe(ProbeKind::Readiness, probe::http_probe(port, path, timing, headers))
    }

    pub fn set_command_readiness<I, S>(self, command: I, timing: ProbeTiming) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_probe(ProbeKind::Readiness, probe::command_probe(command, timing))
    }

    pub fn set_tcp_readiness<H>(self, host: H, port: i32, timing: ProbeTiming) -> Self
    where
        H: Into<String>,
    {
        self.set_probe(ProbeKind::Readiness, probe::tcp_probe(host, port, timing))
    }

    /// Declares a volume backed by the persistent volume claim `claim_name`.
    /// The claim must live in the Deployment's namespace.
    pub fn set_pv_claim<V, C>(self, volume_name: V, claim_name: C) -> Self
    where
        V: Into<String>,
        C: Into<String>,
    {
        self.apply(|this| {
            let volume = Volume {
                name: volume_name.into(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: claim_name.into(),
                    read_only: Some(false),
                }),
                ..Volume::default()
            };
            this.pod_spec_mut().volumes.get_or_insert_with(Vec::new).push(volume);
            Ok(())
        })
    }

    /// Mounts `volume_name` at `mount_path` in the primary container.
    ///
    /// The volume is not checked against the declared volumes, pair it with
    /// [`set_pv_claim`](Self::set_pv_claim) in any order.
    pub fn set_pvc_mounts<V, P>(self, volume_name: V, mount_path: P) -> Self
    where
        V: Into<String>,
        P: Into<String>,
    {
        self.apply(|this| {
            let mount = VolumeMount {
                name: volume_name.into(),
                mount_path: mount_path.into(),
                ..VolumeMount::default()
            };
            this.primary_container_mut().volume_mounts.get_or_insert_with(Vec::new).push(mount);
            Ok(())
        })
    }

    /// Replaces the probe of `kind` on the primary container.
    fn set_probe(self, kind: ProbeKind, probe: Probe) -> Self {
        self.apply(|this| {
            let container = this.primary_container_mut();
            match kind {
                ProbeKind::Liveness => container.liveness_probe = Some(probe),
                ProbeKind::Readiness => container.readiness_probe = Some(probe),
            }
            Ok(())
        })
    }

    fn primary_container_mut(&mut self) -> &mut Container {
        let containers = &mut self.pod_spec_mut().containers;
        if containers.len() <= PRIMARY_INDEX {
            containers.resize_with(PRIMARY_INDEX + 1, Container::default);
        }
        &mut containers[PRIMARY_INDEX]
    }
}

/// Index of the first container whose image is unset or blank.
fn vacant_container_index(containers: &[Container]) -> Option<usize> {
    containers
        .iter()
        .position(|container| container.image.as_deref().is_none_or(|image| image.trim().is_empty()))
}
