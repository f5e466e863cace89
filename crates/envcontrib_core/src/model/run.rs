//! Run model shared by contributors.
//!
//! # Responsibility
//! - Describe the two historical run shapes (general and legacy).
//! - Provide the borrowed tagged view passed into contribution calls.
//!
//! # Invariants
//! - `RunId` is never nil.
//! - `job_name` is never blank.
//! - A `LegacyRun` is always a valid `GeneralRun` (widening is infallible).
//! - Narrowing is only available through `Run::as_legacy`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stable identifier of one run.
pub type RunId = Uuid;

/// Run-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunValidationError {
    NilRunId,
    EmptyJobName,
}

impl Display for RunValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilRunId => write!(f, "run id must not be nil"),
            Self::EmptyJobName => write!(f, "run job name must not be empty"),
        }
    }
}

impl Error for RunValidationError {}

/// One invocation of a unit of work, independent of the engine driving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GeneralRunWire")]
pub struct GeneralRun {
    id: RunId,
    job_name: String,
    number: u64,
}

#[derive(Deserialize)]
struct GeneralRunWire {
    id: RunId,
    job_name: String,
    number: u64,
}

impl TryFrom<GeneralRunWire> for GeneralRun {
    type Error = RunValidationError;

    fn try_from(value: GeneralRunWire) -> Result<Self, Self::Error> {
        GeneralRun::with_id(value.id, value.job_name, value.number)
    }
}

impl GeneralRun {
    /// Creates a run with a generated id.
    ///
    /// # Errors
    /// - Returns `EmptyJobName` when `job_name` is blank.
    pub fn new(job_name: impl Into<String>, number: u64) -> Result<Self, RunValidationError> {
        Self::with_id(Uuid::new_v4(), job_name, number)
    }

    /// Creates a run with a caller-provided id.
    ///
    /// Used when the orchestration system already assigned the identity.
    pub fn with_id(
        id: RunId,
        job_name: impl Into<String>,
        number: u64,
    ) -> Result<Self, RunValidationError> {
        if id.is_nil() {
            return Err(RunValidationError::NilRunId);
        }
        let job_name = job_name.into();
        if job_name.trim().is_empty() {
            return Err(RunValidationError::EmptyJobName);
        }
        Ok(Self {
            id,
            job_name,
            number,
        })
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Human-readable label, e.g. `nightly #42`.
    pub fn display_name(&self) -> String {
        format!("{} #{}", self.job_name, self.number)
    }
}

/// Run driven by the older execution engine.
///
/// Carries everything a `GeneralRun` does plus the facts that only the older
/// engine knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRun {
    run: GeneralRun,
    workspace: PathBuf,
    built_on: String,
}

impl LegacyRun {
    pub fn new(run: GeneralRun, workspace: impl Into<PathBuf>, built_on: impl Into<String>) -> Self {
        Self {
            run,
            workspace: workspace.into(),
            built_on: built_on.into(),
        }
    }

    /// Widens this run to its general shape.
    pub fn as_general(&self) -> &GeneralRun {
        &self.run
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Name of the node the run executed on. Empty for the built-in node.
    pub fn built_on(&self) -> &str {
        &self.built_on
    }
}

/// Borrowed view of a run handed to contributors.
///
/// The variant is the run's dynamic shape. Contributors narrow with
/// [`Run::as_legacy`]; nothing else in the crate converts a general run into
/// a legacy one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run<'a> {
    General(&'a GeneralRun),
    Legacy(&'a LegacyRun),
}

impl<'a> Run<'a> {
    /// Returns the legacy shape when this run actually is one.
    pub fn as_legacy(self) -> Option<&'a LegacyRun> {
        match self {
            Self::General(_) => None,
            Self::Legacy(build) => Some(build),
        }
    }

    pub fn is_legacy(self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Returns the general facts shared by both shapes.
    pub fn general(self) -> &'a GeneralRun {
        match self {
            Self::General(run) => run,
            Self::Legacy(build) => build.as_general(),
        }
    }

    pub fn id(self) -> RunId {
        self.general().id()
    }

    pub fn job_name(self) -> &'a str {
        self.general().job_name()
    }

    pub fn number(self) -> u64 {
        self.general().number()
    }
}

impl<'a> From<&'a GeneralRun> for Run<'a> {
    fn from(run: &'a GeneralRun) -> Self {
        Self::General(run)
    }
}

impl<'a> From<&'a LegacyRun> for Run<'a> {
    fn from(build: &'a LegacyRun) -> Self {
        Self::Legacy(build)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeneralRun, LegacyRun, Run, RunValidationError};
    use uuid::Uuid;

    fn legacy() -> LegacyRun {
        let run = GeneralRun::new("nightly", 7).expect("valid run");
        LegacyRun::new(run, "/var/ws/nightly", "agent-1")
    }

    #[test]
    fn rejects_nil_id_and_blank_job() {
        let err = GeneralRun::with_id(Uuid::nil(), "nightly", 1).unwrap_err();
        assert_eq!(err, RunValidationError::NilRunId);

        let err = GeneralRun::new("   ", 1).unwrap_err();
        assert_eq!(err, RunValidationError::EmptyJobName);
    }

    #[test]
    fn general_view_never_narrows() {
        let run = GeneralRun::new("nightly", 3).expect("valid run");
        let view = Run::from(&run);
        assert!(!view.is_legacy());
        assert!(view.as_legacy().is_none());
        assert_eq!(view.general(), &run);
    }

    #[test]
    fn legacy_view_narrows_and_widens_to_same_run() {
        let build = legacy();
        let view = Run::from(&build);
        assert!(view.is_legacy());
        assert_eq!(view.as_legacy(), Some(&build));
        assert_eq!(view.id(), build.as_general().id());
        assert_eq!(view.job_name(), "nightly");
        assert_eq!(view.number(), 7);
    }

    #[test]
    fn display_name_joins_job_and_number() {
        let run = GeneralRun::new("release/main", 12).expect("valid run");
        assert_eq!(run.display_name(), "release/main #12");
    }
}
