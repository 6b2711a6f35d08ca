//! `kubuild` assembles validated Kubernetes `apps/v1` Deployments from
//! incrementally supplied fields.
//!
//! ```rust
//! use kubuild::{DeploymentBuilder, ProbeTiming};
//!
//! let deployment = DeploymentBuilder::new()
//!     .set_namespace_and_name("shop", "checkout")
//!     .set_labels([("app", "checkout")])
//!     .set_container("checkout", "registry.local/checkout:1.4.2", 8080)
//!     .set_http_readiness(8080, "/ready", ProbeTiming::new(5, 1, 5), None)
//!     .set_envs([("RUST_LOG", "info")])
//!     .finish()
//!     .into_result()
//!     .expect("checkout deployment is complete");
//!
//! let selector = deployment.spec.expect("spec is set").selector;
//! assert_eq!(selector.match_labels.expect("derived")["app"], "checkout");
//! ```

pub mod config;
mod deployment;
pub mod env;
mod error;
pub mod probe;
pub mod selector;

pub use k8s_openapi;

pub use self::{
    deployment::{DeploymentBuilder, Finished, TypeMeta},
    error::{Error, ErrorKind},
    probe::{ProbeAction, ProbeTiming},
    selector::{LabelSelectorRequirement, Operator},
};
