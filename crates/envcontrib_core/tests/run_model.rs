use envcontrib_core::{EnvVars, GeneralRun, LegacyRun, Run, RunValidationError};
use uuid::Uuid;

fn fixed_id() -> Uuid {
    Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap()
}

#[test]
fn general_run_serializes_expected_wire_fields() {
    let run = GeneralRun::with_id(fixed_id(), "nightly", 42).unwrap();

    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["id"], fixed_id().to_string());
    assert_eq!(json["job_name"], "nightly");
    assert_eq!(json["number"], 42);

    let decoded: GeneralRun = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, run);
}

#[test]
fn deserialize_rejects_nil_id() {
    let value = serde_json::json!({
        "id": "00000000-0000-0000-0000-000000000000",
        "job_name": "nightly",
        "number": 1
    });

    let err = serde_json::from_value::<GeneralRun>(value).unwrap_err();
    assert!(
        err.to_string().contains("run id must not be nil"),
        "unexpected error: {err}"
    );
}

#[test]
fn legacy_run_nests_general_run() {
    let build = LegacyRun::new(
        GeneralRun::with_id(fixed_id(), "nightly", 3).unwrap(),
        "/ws",
        "agent-1",
    );

    let json = serde_json::to_value(&build).unwrap();
    assert_eq!(json["run"]["job_name"], "nightly");
    assert_eq!(json["workspace"], "/ws");
    assert_eq!(json["built_on"], "agent-1");
}

#[test]
fn characteristic_variables_follow_run_shape() {
    let run = GeneralRun::with_id(fixed_id(), "nightly", 5).unwrap();
    let env = EnvVars::for_run(Run::from(&run));
    let keys: Vec<_> = env.keys().collect();
    assert_eq!(keys, vec!["RUN_ID", "JOB_NAME", "BUILD_NUMBER", "BUILD_TAG"]);
    assert_eq!(env.get("RUN_ID"), Some("11111111-2222-4333-8444-555555555555"));
    assert_eq!(env.get("BUILD_TAG"), Some("nightly-5"));

    let build = LegacyRun::new(run, "/ws", "agent-1");
    let env = EnvVars::for_run(Run::from(&build));
    assert_eq!(env.get("WORKSPACE"), Some("/ws"));
    assert_eq!(env.get("NODE_NAME"), Some("agent-1"));
}

#[test]
fn blank_job_name_is_rejected() {
    let err = GeneralRun::new("  ", 1).unwrap_err();
    assert_eq!(err, RunValidationError::EmptyJobName);
}
