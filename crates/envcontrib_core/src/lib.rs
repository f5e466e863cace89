//! Core of the environment contribution protocol.
//! Extensions contribute variables to a run's environment through one
//! capability with a current and a legacy entry point.

pub mod extension;
pub mod logging;
pub mod model;

pub use extension::capability::{
    classified_type_count, classify, overrides, ContributorKind, EntryPoint, Overrides,
};
pub use extension::contributor::{
    ContributionError, ContributionResult, EnvironmentContributingAction,
};
pub use extension::kernel::{ContributorRegistry, ContributorRegistryError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::env_vars::EnvVars;
pub use model::run::{GeneralRun, LegacyRun, Run, RunId, RunValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
