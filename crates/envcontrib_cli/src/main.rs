//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `envcontrib_core` linkage and the contribution chain end to end.
//! - Keep output deterministic apart from generated run ids.
//!
//! Logging is enabled by setting `ENVCONTRIB_LOG_DIR` to an absolute path;
//! `ENVCONTRIB_LOG_LEVEL` overrides the build-mode default.

use envcontrib_core::{
    ContributionResult, ContributorRegistry, EnvVars, EnvironmentContributingAction, GeneralRun,
    LegacyRun, Overrides, Run,
};
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "ENVCONTRIB_LOG_DIR";
const LOG_LEVEL_ENV: &str = "ENVCONTRIB_LOG_LEVEL";

/// Current-protocol contributor: applies to every run.
struct ToolchainPath;

impl EnvironmentContributingAction for ToolchainPath {
    const OVERRIDES: Overrides = Overrides::CURRENT;

    fn build_environment(&self, run: Run<'_>, env: &mut EnvVars) -> ContributionResult {
        env.override_var("PATH+TOOLCHAIN", "/opt/toolchain/bin");
        env.put("TOOLCHAIN_CACHE", format!("/var/cache/{}", run.job_name()));
        Ok(())
    }
}

/// Legacy-protocol contributor: applies to legacy runs only.
struct WorkspaceScratch;

impl EnvironmentContributingAction for WorkspaceScratch {
    const OVERRIDES: Overrides = Overrides::LEGACY;

    fn build_env_vars(&self, build: &LegacyRun, env: &mut EnvVars) -> ContributionResult {
        env.put("SCRATCH_DIR", format!("{}/tmp", build.workspace().display()));
        Ok(())
    }
}

/// Contributor that declares no entry point.
struct Inert;

impl EnvironmentContributingAction for Inert {
    const OVERRIDES: Overrides = Overrides::NONE;
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("envcontrib: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level = std::env::var(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| envcontrib_core::default_log_level().to_string());
        envcontrib_core::init_logging(&level, &log_dir)?;
    }

    println!("envcontrib_core version={}", envcontrib_core::core_version());

    let mut registry = ContributorRegistry::new();
    registry.register("builtin.toolchain-path", ToolchainPath)?;
    registry.register("legacy.workspace-scratch", WorkspaceScratch)?;
    registry.register("builtin.inert", Inert)?;
    for id in registry.ids() {
        if let Some(kind) = registry.kind_of(id) {
            println!("contributor id={id} kind={kind}");
        }
    }

    let general = GeneralRun::new("nightly", 1)?;
    let legacy = LegacyRun::new(GeneralRun::new("release", 7)?, "/var/ws/release", "agent-1");

    for run in [Run::from(&general), Run::from(&legacy)] {
        let env = registry.environment_for(run)?;
        println!(
            "run={} legacy={} vars={}",
            run.general().display_name(),
            run.is_legacy(),
            env.len()
        );
        for (key, value) in env.iter() {
            println!("  {key}={value}");
        }
    }

    log::logger().flush();
    Ok(())
}
