use envcontrib_core::{
    ContributionError, ContributionResult, ContributorKind, ContributorRegistry,
    ContributorRegistryError, EnvVars, EnvironmentContributingAction, GeneralRun, LegacyRun,
    Overrides, Run,
};
use std::error::Error;

struct ToolPath;

impl EnvironmentContributingAction for ToolPath {
    const OVERRIDES: Overrides = Overrides::CURRENT;

    fn build_environment(&self, _run: Run<'_>, env: &mut EnvVars) -> ContributionResult {
        env.override_var("PATH+TOOLS", "/opt/tools/bin");
        env.put("TOOL_HOME", "/opt/tools");
        Ok(())
    }
}

struct WorkspaceMarker;

impl EnvironmentContributingAction for WorkspaceMarker {
    const OVERRIDES: Overrides = Overrides::LEGACY;

    fn build_env_vars(&self, build: &LegacyRun, env: &mut EnvVars) -> ContributionResult {
        let marker = format!("{}/.marker", build.workspace().display());
        env.put("MARKER", marker);
        Ok(())
    }
}

struct Overrider;

impl EnvironmentContributingAction for Overrider {
    const OVERRIDES: Overrides = Overrides::BOTH;

    fn build_environment(&self, _run: Run<'_>, env: &mut EnvVars) -> ContributionResult {
        env.put("TOOL_HOME", "/srv/tools");
        Ok(())
    }

    fn build_env_vars(&self, _build: &LegacyRun, env: &mut EnvVars) -> ContributionResult {
        env.put("TOOL_HOME", "/legacy/tools");
        Ok(())
    }
}

struct Silent;

impl EnvironmentContributingAction for Silent {
    const OVERRIDES: Overrides = Overrides::NONE;
}

struct Rejecting;

impl EnvironmentContributingAction for Rejecting {
    const OVERRIDES: Overrides = Overrides::CURRENT;

    fn build_environment(&self, _run: Run<'_>, _env: &mut EnvVars) -> ContributionResult {
        Err(ContributionError::new("vault sealed"))
    }
}

struct AfterFailure;

impl EnvironmentContributingAction for AfterFailure {
    const OVERRIDES: Overrides = Overrides::CURRENT;

    fn build_environment(&self, _run: Run<'_>, env: &mut EnvVars) -> ContributionResult {
        env.put("UNREACHED", "1");
        Ok(())
    }
}

fn full_registry() -> ContributorRegistry {
    let mut registry = ContributorRegistry::new();
    registry.register("tools.path", ToolPath).expect("register tools");
    registry
        .register("legacy.workspace-marker", WorkspaceMarker)
        .expect("register marker");
    registry.register("tools.override", Overrider).expect("register overrider");
    registry.register("silent", Silent).expect("register silent");
    registry
}

fn legacy_run() -> LegacyRun {
    LegacyRun::new(
        GeneralRun::new("release/main", 21).expect("valid run"),
        "/var/ws/release",
        "agent-3",
    )
}

#[test]
fn registration_classifies_each_contributor() {
    let registry = full_registry();
    assert_eq!(registry.kind_of("tools.path"), Some(ContributorKind::Current));
    assert_eq!(
        registry.kind_of("legacy.workspace-marker"),
        Some(ContributorKind::Legacy)
    );
    assert_eq!(registry.kind_of("tools.override"), Some(ContributorKind::Both));
    assert_eq!(registry.kind_of("silent"), Some(ContributorKind::Neither));
    assert_eq!(registry.kind_of("missing"), None);
}

#[test]
fn dispatch_table_matches_calling_current_entry_point_on_every_contributor() {
    let registry = full_registry();
    let build = legacy_run();
    let general = GeneralRun::new("nightly", 2).expect("valid run");

    for run in [Run::from(&build), Run::from(&general)] {
        let mut routed = EnvVars::new();
        routed.put("PATH", "/usr/bin");
        registry
            .contribute_all(run, &mut routed)
            .expect("routed assembly should succeed");

        let mut direct = EnvVars::new();
        direct.put("PATH", "/usr/bin");
        ToolPath
            .build_environment(run, &mut direct)
            .expect("tools");
        WorkspaceMarker
            .build_environment(run, &mut direct)
            .expect("marker");
        Overrider
            .build_environment(run, &mut direct)
            .expect("overrider");
        Silent.build_environment(run, &mut direct).expect("silent");

        assert_eq!(routed, direct);
    }
}

#[test]
fn legacy_contributor_applies_only_to_legacy_runs() {
    let registry = full_registry();

    let build = legacy_run();
    let env = registry
        .environment_for(Run::from(&build))
        .expect("legacy assembly should succeed");
    assert_eq!(env.get("MARKER"), Some("/var/ws/release/.marker"));
    assert_eq!(env.get("TOOL_HOME"), Some("/srv/tools"));
    assert_eq!(env.get("BUILD_TAG"), Some("release-main-21"));
    assert_eq!(env.get("WORKSPACE"), Some("/var/ws/release"));

    let general = GeneralRun::new("nightly", 2).expect("valid run");
    let env = registry
        .environment_for(Run::from(&general))
        .expect("general assembly should succeed");
    assert!(!env.contains_key("MARKER"));
    assert!(!env.contains_key("WORKSPACE"));
    assert_eq!(env.get("PATH"), Some("/opt/tools/bin"));
}

#[test]
fn first_failure_stops_assembly_and_propagates() {
    let mut registry = ContributorRegistry::new();
    registry.register("tools.path", ToolPath).expect("register tools");
    registry.register("secrets", Rejecting).expect("register rejecting");
    registry.register("after", AfterFailure).expect("register after");

    let run = GeneralRun::new("nightly", 3).expect("valid run");
    let mut env = EnvVars::new();
    let err = registry
        .contribute_all(Run::from(&run), &mut env)
        .expect_err("failing contributor must abort assembly");

    match &err {
        ContributorRegistryError::ContributionFailed {
            position,
            contributor,
            source,
        } => {
            assert_eq!(*position, 1);
            assert_eq!(contributor, "secrets");
            assert_eq!(source.message(), "vault sealed");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.source().is_some());
    assert!(err.to_string().contains("vault sealed"));

    assert_eq!(env.get("TOOL_HOME"), Some("/opt/tools"));
    assert!(!env.contains_key("UNREACHED"));
}
