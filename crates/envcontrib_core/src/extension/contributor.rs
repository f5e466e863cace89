//! Environment contribution capability.
//!
//! # Responsibility
//! - Define the two contribution entry points (current and legacy).
//! - Bridge a call on the entry point a contributor does not implement to the
//!   one it does.
//!
//! # Invariants
//! - A default body forwards only when its type implements exactly the other
//!   entry point, so default bodies never forward to each other.
//! - A general run is never narrowed to a legacy run; the current default
//!   body forwards only when `Run::as_legacy` succeeds.
//! - Contributor failures are returned unchanged.

use crate::extension::capability::{classify, ContributorKind, EntryPoint, Overrides};
use crate::model::env_vars::EnvVars;
use crate::model::run::{LegacyRun, Run};
use std::any::type_name;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of one contribution call.
pub type ContributionResult = Result<(), ContributionError>;

/// Failure raised by a contributor's own body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionError {
    message: String,
}

impl ContributionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ContributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "contribution failed: {}", self.message)
    }
}

impl Error for ContributionError {}

/// Capability of an extension that contributes environment variables to a run.
///
/// Implementors override one or both entry points and list them in
/// [`EnvironmentContributingAction::OVERRIDES`]; the list is read once per
/// type. The declaration is required, including `Overrides::NONE` for a type
/// with no bodies. An entry point that is overridden but not declared runs
/// only when called directly. One that is declared but not overridden
/// degrades to a no-op.
///
/// A default body forwards only when its type declares exactly the other
/// entry point. A type declaring `Overrides::BOTH` therefore never forwards:
/// if it supplies only a legacy body, the current entry point is a no-op for
/// it. Forwarding whenever the counterpart is declared would let two
/// undefined bodies of a `BOTH` type call each other forever.
///
/// ```
/// use envcontrib_core::{
///     ContributionResult, EnvVars, EnvironmentContributingAction, GeneralRun, LegacyRun,
///     Overrides, Run,
/// };
///
/// struct Workspace;
///
/// impl EnvironmentContributingAction for Workspace {
///     const OVERRIDES: Overrides = Overrides::LEGACY;
///
///     fn build_env_vars(&self, build: &LegacyRun, env: &mut EnvVars) -> ContributionResult {
///         env.put("WS", build.workspace().display().to_string());
///         Ok(())
///     }
/// }
///
/// let build = LegacyRun::new(GeneralRun::new("nightly", 1).unwrap(), "/ws", "agent");
/// let mut env = EnvVars::new();
/// Workspace.build_environment(Run::from(&build), &mut env).unwrap();
/// assert_eq!(env.get("WS"), Some("/ws"));
/// ```
///
/// Omitting the declaration does not compile:
///
/// ```compile_fail
/// use envcontrib_core::{ContributionResult, EnvVars, EnvironmentContributingAction, LegacyRun};
///
/// struct Undeclared;
///
/// impl EnvironmentContributingAction for Undeclared {
///     fn build_env_vars(&self, _build: &LegacyRun, env: &mut EnvVars) -> ContributionResult {
///         env.put("X", "1");
///         Ok(())
///     }
/// }
/// ```
pub trait EnvironmentContributingAction: Send + Sync + 'static {
    /// Entry points this type supplies its own body for.
    const OVERRIDES: Overrides;

    /// Contributes variables for a run of any shape.
    ///
    /// Called by the current engine for every run.
    #[allow(deprecated)]
    fn build_environment(&self, run: Run<'_>, env: &mut EnvVars) -> ContributionResult {
        if !classify::<Self>().bridges_from(EntryPoint::BuildEnvironment) {
            return Ok(());
        }
        match run.as_legacy() {
            Some(build) => self.build_env_vars(build, env),
            None => Ok(()),
        }
    }

    /// Contributes variables for a legacy run.
    #[deprecated(note = "implement `build_environment` instead")]
    fn build_env_vars(&self, build: &LegacyRun, env: &mut EnvVars) -> ContributionResult {
        if !classify::<Self>().bridges_from(EntryPoint::BuildEnvVars) {
            return Ok(());
        }
        self.build_environment(Run::from(build), env)
    }
}

/// Object-safe view of a contributor, used where contributor types are erased.
pub(crate) trait ErasedContributor: Send + Sync {
    fn kind(&self) -> ContributorKind;
    fn type_name(&self) -> &'static str;
    fn build_environment(&self, run: Run<'_>, env: &mut EnvVars) -> ContributionResult;
    fn build_env_vars(&self, build: &LegacyRun, env: &mut EnvVars) -> ContributionResult;
}

impl<T: EnvironmentContributingAction> ErasedContributor for T {
    fn kind(&self) -> ContributorKind {
        classify::<T>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn build_environment(&self, run: Run<'_>, env: &mut EnvVars) -> ContributionResult {
        EnvironmentContributingAction::build_environment(self, run, env)
    }

    #[allow(deprecated)]
    fn build_env_vars(&self, build: &LegacyRun, env: &mut EnvVars) -> ContributionResult {
        EnvironmentContributingAction::build_env_vars(self, build, env)
    }
}
