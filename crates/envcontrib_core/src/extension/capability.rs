//! Entry-point declarations and per-type contributor classification.

use crate::extension::contributor::EnvironmentContributingAction;
use log::info;
use once_cell::sync::Lazy;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{PoisonError, RwLock};

static CLASSIFICATIONS: Lazy<RwLock<HashMap<TypeId, ContributorKind>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Stable id of the current entry point.
pub const ENTRY_POINT_BUILD_ENVIRONMENT: &str = "build_environment";
/// Stable id of the legacy entry point.
pub const ENTRY_POINT_BUILD_ENV_VARS: &str = "build_env_vars";

/// Contribution entry points a contributor may provide a body for.
///
/// The bridge between the two is symmetric and only well-defined for exactly
/// two entry points. Adding a third would leave the delegation target of a
/// default body ambiguous, so this enum is closed on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryPoint {
    /// Current operation, accepts any run shape.
    BuildEnvironment,
    /// Legacy operation, accepts only legacy runs.
    BuildEnvVars,
}

impl EntryPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuildEnvironment => ENTRY_POINT_BUILD_ENVIRONMENT,
            Self::BuildEnvVars => ENTRY_POINT_BUILD_ENV_VARS,
        }
    }

    /// The entry point a default body of `self` may forward to.
    pub fn counterpart(self) -> Self {
        match self {
            Self::BuildEnvironment => Self::BuildEnvVars,
            Self::BuildEnvVars => Self::BuildEnvironment,
        }
    }
}

impl Display for EntryPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of entry points a contributor type supplies its own body for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Overrides {
    current: bool,
    legacy: bool,
}

impl Overrides {
    pub const NONE: Self = Self {
        current: false,
        legacy: false,
    };
    pub const CURRENT: Self = Self {
        current: true,
        legacy: false,
    };
    pub const LEGACY: Self = Self {
        current: false,
        legacy: true,
    };
    pub const BOTH: Self = Self {
        current: true,
        legacy: true,
    };

    pub const fn contains(self, entry_point: EntryPoint) -> bool {
        match entry_point {
            EntryPoint::BuildEnvironment => self.current,
            EntryPoint::BuildEnvVars => self.legacy,
        }
    }
}

/// Dispatch classification of one contributor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContributorKind {
    /// Only the current entry point has a body.
    Current,
    /// Only the legacy entry point has a body.
    Legacy,
    /// Both entry points have independent bodies.
    Both,
    /// Neither entry point has a body; both calls are no-ops.
    Neither,
}

impl ContributorKind {
    pub const fn from_overrides(overrides: Overrides) -> Self {
        match (overrides.current, overrides.legacy) {
            (true, false) => Self::Current,
            (false, true) => Self::Legacy,
            (true, true) => Self::Both,
            (false, false) => Self::Neither,
        }
    }

    /// Whether this kind supplies its own body for `entry_point`.
    pub fn implements(self, entry_point: EntryPoint) -> bool {
        match (self, entry_point) {
            (Self::Both, _) => true,
            (Self::Current, EntryPoint::BuildEnvironment) => true,
            (Self::Legacy, EntryPoint::BuildEnvVars) => true,
            _ => false,
        }
    }

    /// Whether a default body of `entry_point` forwards to its counterpart.
    ///
    /// True only when the counterpart is the single implemented entry point,
    /// so two defaults can never forward to each other.
    pub fn bridges_from(self, entry_point: EntryPoint) -> bool {
        match (self, entry_point) {
            (Self::Legacy, EntryPoint::BuildEnvironment) => true,
            (Self::Current, EntryPoint::BuildEnvVars) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Legacy => "legacy",
            Self::Both => "both",
            Self::Neither => "neither",
        }
    }
}

impl Display for ContributorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers whether contributor type `T` supplies its own body for `entry_point`.
pub fn overrides<T>(entry_point: EntryPoint) -> bool
where
    T: EnvironmentContributingAction + ?Sized,
{
    classify::<T>().implements(entry_point)
}

/// Returns the cached classification of contributor type `T`.
///
/// The first query for a type computes and records it; later queries, from
/// any instance or thread, read the recorded value.
pub fn classify<T>() -> ContributorKind
where
    T: EnvironmentContributingAction + ?Sized,
{
    let type_id = TypeId::of::<T>();
    if let Some(kind) = CLASSIFICATIONS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
    {
        return *kind;
    }

    let mut classifications = CLASSIFICATIONS
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *classifications.entry(type_id).or_insert_with(|| {
        let kind = ContributorKind::from_overrides(T::OVERRIDES);
        info!(
            "event=contributor_classified module=extension status=ok type={} kind={}",
            type_name::<T>(),
            kind
        );
        kind
    })
}

/// Number of contributor types classified so far in this process.
pub fn classified_type_count() -> usize {
    CLASSIFICATIONS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}
