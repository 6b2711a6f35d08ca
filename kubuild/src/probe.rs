//! Probe sub-builder.
//!
//! Timing values are passed through unchecked. The control plane expects
//! `timeoutSeconds` and `periodSeconds` of at least one second, callers are
//! responsible for supplying them.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{ExecAction, HTTPGetAction, HTTPHeader, Probe, TCPSocketAction},
    apimachinery::pkg::util::intstr::IntOrString,
};

/// What a probe does to decide whether the container is healthy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProbeAction {
    /// `GET http://<pod-ip>:<port><path>` with optional extra headers.
    Http { port: i32, path: String, headers: BTreeMap<String, String> },

    /// Open a TCP connection to `host:port`, an empty host means the pod IP.
    Tcp { host: String, port: i32 },

    /// Run a command inside the container.
    Command { command: Vec<String> },
}

/// Timing shared by every probe kind, in seconds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProbeTiming {
    /// Delay after container start before the first probe.
    pub initial_delay_seconds: i32,

    pub timeout_seconds: i32,

    pub period_seconds: i32,
}

impl ProbeTiming {
    #[must_use]
    pub const fn new(initial_delay_seconds: i32, timeout_seconds: i32, period_seconds: i32) -> Self {
        Self { initial_delay_seconds, timeout_seconds, period_seconds }
    }
}

impl ProbeAction {
    #[must_use]
    pub fn into_probe(self, timing: ProbeTiming) -> Probe {
        let ProbeTiming { initial_delay_seconds, timeout_seconds, period_seconds } = timing;
        let probe = Probe {
            initial_delay_seconds: Some(initial_delay_seconds),
            timeout_seconds: Some(timeout_seconds),
            period_seconds: Some(period_seconds),
            ..Probe::default()
        };

        match self {
            Self::Http { port, path, headers } => {
                let http_headers = (!headers.is_empty()).then(|| {
                    headers
                        .into_iter()
                        .map(|(name, value)| HTTPHeader { name, value })
                        .collect::<Vec<_>>()
                });
                Probe {
                    http_get: Some(HTTPGetAction {
                        port: IntOrString::Int(port),
                        path: Some(path),
                        http_headers,
                        ..HTTPGetAction::default()
                    }),
                    ..probe
                }
            }
            Self::Tcp { host, port } => Probe {
                tcp_socket: Some(TCPSocketAction {
                    host: (!host.is_empty()).then_some(host),
                    port: IntOrString::Int(port),
                }),
                ..probe
            },
            Self::Command { command } => {
                Probe { exec: Some(ExecAction { command: Some(command) }), ..probe }
            }
        }
    }
}

#[must_use]
pub fn http_probe<P>(
    port: i32,
    path: P,
    timing: ProbeTiming,
    headers: Option<BTreeMap<String, String>>,
) -> Probe
where
    P: Into<String>,
{
    ProbeAction::Http { port, path: path.into(), headers: headers.unwrap_or_default() }
        .into_probe(timing)
}

#[must_use]
pub fn tcp_probe<H>(host: H, port: i32, timing: ProbeTiming) -> Probe
where
    H: Into<String>,
{
    ProbeAction::Tcp { host: host.into(), port }.into_probe(timing)
}

#[must_use]
pub fn command_probe<I, S>(command: I, timing: ProbeTiming) -> Probe
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ProbeAction::Command { command: command.into_iter().map(Into::into).collect() }
        .into_probe(timing)
}
