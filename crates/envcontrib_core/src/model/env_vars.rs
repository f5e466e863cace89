//! Environment map assembled for one run.
//!
//! # Responsibility
//! - Hold name/value pairs contributed for a run in insertion order.
//! - Apply merge/overwrite semantics (last writer for a key wins).
//!
//! # Invariants
//! - Overwriting a key keeps its original position.
//! - Key comparison follows the host convention: case-insensitive on Windows,
//!   case-sensitive elsewhere. The first-seen spelling of a key is kept.
//! - Names and values are never validated here.

use crate::model::run::Run;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static VARIABLE_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("valid variable reference regex")
});

/// Characteristic variable holding the run id.
pub const ENV_RUN_ID: &str = "RUN_ID";
/// Characteristic variable holding the job name.
pub const ENV_JOB_NAME: &str = "JOB_NAME";
/// Characteristic variable holding the run number.
pub const ENV_BUILD_NUMBER: &str = "BUILD_NUMBER";
/// Characteristic variable holding `<job>-<number>`.
pub const ENV_BUILD_TAG: &str = "BUILD_TAG";
/// Legacy-only: workspace directory of the run.
pub const ENV_WORKSPACE: &str = "WORKSPACE";
/// Legacy-only: node the run executed on.
pub const ENV_NODE_NAME: &str = "NODE_NAME";

/// Node name reported when a legacy run executed on the built-in node.
const BUILT_IN_NODE_NAME: &str = "built-in";

/// Insertion-ordered environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: IndexMap<String, String>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map seeded with the characteristic variables of `run`.
    pub fn for_run(run: Run<'_>) -> Self {
        let mut env = Self::new();
        env.put(ENV_RUN_ID, run.id().to_string());
        env.put(ENV_JOB_NAME, run.job_name());
        env.put(ENV_BUILD_NUMBER, run.number().to_string());
        env.put(
            ENV_BUILD_TAG,
            format!("{}-{}", run.job_name().replace('/', "-"), run.number()),
        );
        if let Some(build) = run.as_legacy() {
            env.put(ENV_WORKSPACE, build.workspace().display().to_string());
            let node = if build.built_on().is_empty() {
                BUILT_IN_NODE_NAME
            } else {
                build.built_on()
            };
            env.put(ENV_NODE_NAME, node);
        }
        env
    }

    /// Sets `key` to `value`, replacing any earlier value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index_of(&key) {
            Some(index) => {
                if let Some((_, slot)) = self.vars.get_index_mut(index) {
                    *slot = value;
                }
            }
            None => {
                self.vars.insert(key, value);
            }
        }
    }

    /// Applies every pair in order with [`EnvVars::put`].
    pub fn put_all<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.put(key, value);
        }
    }

    /// Sets `key` with override semantics.
    ///
    /// - An empty `value` removes `key`.
    /// - `BASE+SUFFIX` prepends `value` to `BASE` using the platform path
    ///   separator, e.g. `PATH+MAVEN=/opt/maven/bin`.
    /// - Any other key behaves like [`EnvVars::put`].
    pub fn override_var(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.remove(key);
            return;
        }

        let Some((base, _)) = key.split_once('+') else {
            self.put(key, value);
            return;
        };

        let merged = match self.get(base) {
            Some(existing) if !existing.is_empty() => {
                format!("{value}{}{existing}", path_separator())
            }
            _ => value.to_string(),
        };
        self.put(base, merged);
    }

    /// Applies every pair in order with [`EnvVars::override_var`].
    pub fn override_all<'a>(&mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (key, value) in pairs {
            self.override_var(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let index = self.index_of(key)?;
        self.vars.get_index(index).map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.index_of(key)?;
        self.vars.shift_remove_index(index).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Substitutes `$NAME` and `${NAME}` references with values from this map.
    ///
    /// Unknown references are left as written.
    pub fn expand(&self, text: &str) -> String {
        VARIABLE_REF_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match self.get(name) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        if cfg!(windows) {
            self.vars
                .keys()
                .position(|existing| existing.eq_ignore_ascii_case(key))
        } else {
            self.vars.get_index_of(key)
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EnvVars
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        env.put_all(iter);
        env
    }
}

fn path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}
