//! Ordered contributor registry and environment assembly.

use crate::extension::capability::ContributorKind;
use crate::extension::contributor::{
    ContributionError, EnvironmentContributingAction, ErasedContributor,
};
use crate::model::env_vars::EnvVars;
use crate::model::run::Run;
use indexmap::IndexMap;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registered contributor snapshot.
struct RegisteredContributor {
    kind: ContributorKind,
    contributor: Box<dyn ErasedContributor>,
}

/// In-process registry of contributors attached to runs.
///
/// Each contributor type is classified once at registration. Assembly then
/// routes every contributor straight to the entry point it implements, in
/// registration order.
#[derive(Default)]
pub struct ContributorRegistry {
    entries: IndexMap<String, RegisteredContributor>,
}

impl ContributorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one contributor under `contributor_id`.
    ///
    /// Returns the contributor's classification.
    pub fn register<C>(
        &mut self,
        contributor_id: &str,
        contributor: C,
    ) -> Result<ContributorKind, ContributorRegistryError>
    where
        C: EnvironmentContributingAction,
    {
        let id = contributor_id.trim().to_string();
        if !is_valid_contributor_id(&id) {
            return Err(ContributorRegistryError::InvalidContributorId(id));
        }
        if self.entries.contains_key(id.as_str()) {
            return Err(ContributorRegistryError::DuplicateContributorId(id));
        }

        let contributor: Box<dyn ErasedContributor> = Box::new(contributor);
        let kind = contributor.kind();
        info!(
            "event=contributor_registered module=extension status=ok id={} type={} kind={}",
            id,
            contributor.type_name(),
            kind
        );
        self.entries
            .insert(id, RegisteredContributor { kind, contributor });
        Ok(kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns contributor ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn kind_of(&self, contributor_id: &str) -> Option<ContributorKind> {
        self.entries
            .get(contributor_id.trim())
            .map(|entry| entry.kind)
    }

    pub fn list_by_kind(&self, kind: ContributorKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Applies every contributor to `env` in registration order.
    ///
    /// Stops at the first contributor failure and returns it.
    pub fn contribute_all(
        &self,
        run: Run<'_>,
        env: &mut EnvVars,
    ) -> Result<(), ContributorRegistryError> {
        for (position, (id, entry)) in self.entries.iter().enumerate() {
            let before = env.len();
            let outcome = match entry.kind {
                ContributorKind::Current | ContributorKind::Both => entry
                    .contributor
                    .build_environment(run, env)
                    .map(|()| true),
                ContributorKind::Legacy => match run.as_legacy() {
                    Some(build) => entry
                        .contributor
                        .build_env_vars(build, env)
                        .map(|()| true),
                    None => Ok(false),
                },
                ContributorKind::Neither => Ok(false),
            };

            match outcome {
                Ok(true) => debug!(
                    "event=contribution_applied module=extension status=ok id={} kind={} run={} vars_before={} vars_after={}",
                    id,
                    entry.kind,
                    run.id(),
                    before,
                    env.len()
                ),
                Ok(false) => debug!(
                    "event=contribution_skipped module=extension status=ok id={} kind={} run={} legacy_run={}",
                    id,
                    entry.kind,
                    run.id(),
                    run.is_legacy()
                ),
                Err(source) => {
                    error!(
                        "event=contribution_failed module=extension status=error id={} type={} run={} position={}",
                        id,
                        entry.contributor.type_name(),
                        run.id(),
                        position
                    );
                    return Err(ContributorRegistryError::ContributionFailed {
                        position,
                        contributor: id.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds the merged environment for `run`.
    ///
    /// Starts from the run's characteristic variables, then applies every
    /// contributor.
    pub fn environment_for(&self, run: Run<'_>) -> Result<EnvVars, ContributorRegistryError> {
        let mut env = EnvVars::for_run(run);
        self.contribute_all(run, &mut env)?;
        Ok(env)
    }
}

fn is_valid_contributor_id(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
            continue;
        }
        if c == '.' || c == '_' || c == '-' {
            if prev_separator {
                return false;
            }
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

/// Registration and assembly errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributorRegistryError {
    InvalidContributorId(String),
    DuplicateContributorId(String),
    ContributionFailed {
        position: usize,
        contributor: String,
        source: ContributionError,
    },
}

impl Display for ContributorRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContributorId(value) => write!(f, "contributor id is invalid: {value}"),
            Self::DuplicateContributorId(value) => {
                write!(f, "contributor id already registered: {value}")
            }
            Self::ContributionFailed {
                position,
                contributor,
                source,
            } => write!(
                f,
                "contributor `{contributor}` at position {position} failed: {source}"
            ),
        }
    }
}

impl Error for ContributorRegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ContributionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
