use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use fuel_cli::commands::{config, doctor, plan, provision};
use fuel_core::config::{ConfigOverrides, LoadOptions};
use serde_json::Value;
use tempfile::TempDir;

const CLOSED_PORT_URL: &str = "http://127.0.0.1:9";

#[test]
fn plan_prints_every_request_a_run_would_send() {
    with_env(&[], || {
        let dir = entities_dir(
            r#"[
                {"externalServiceAgreementId": "sa-1", "externalLegalEntityId": "le-1", "numberOfUsers": 5},
                {"externalServiceAgreementId": "sa-2", "externalLegalEntityId": "le-2", "numberOfUsers": 2}
            ]"#,
        );

        let result = plan::run(LoadOptions::default(), &dir.path().join("entities.json"));
        assert_eq!(result.exit_code, 0, "expected successful dry run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "plan");
        assert_eq!(payload["status"], "ok");

        let requests = &payload["details"]["requests"];
        assert_eq!(requests["approval_types"].as_array().map(Vec::len), Some(3));
        assert_eq!(requests["policies"].as_array().map(Vec::len), Some(4));
        assert_eq!(requests["approval_type_links"].as_array().map(Vec::len), Some(2));
        // payments and contacts per entity
        assert_eq!(requests["bulk_policy_assignments"].as_array().map(Vec::len), Some(4));
        assert_eq!(payload["details"]["report"]["entities"][1]["status"], "provisioned");
    });
}

#[test]
fn plan_reports_skip_when_no_capability_is_enabled() {
    with_env(
        &[
            ("FUEL_CAPABILITIES_APPROVALS_FOR_PAYMENTS", "false"),
            ("FUEL_CAPABILITIES_APPROVALS_FOR_CONTACTS", "false"),
        ],
        || {
            let dir = entities_dir(
                r#"[{"externalServiceAgreementId": "sa-1", "externalLegalEntityId": "le-1", "numberOfUsers": 5}]"#,
            );

            let result = plan::run(LoadOptions::default(), &dir.path().join("entities.json"));
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["details"]["report"]["skipped"], true);
            assert_eq!(payload["details"]["steps"], Value::Array(Vec::new()));
            assert_eq!(
                payload["details"]["requests"]["approval_types"],
                Value::Array(Vec::new())
            );
        },
    );
}

#[test]
fn plan_rejects_missing_entities_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");

        let result = plan::run(LoadOptions::default(), &dir.path().join("missing.json"));
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "entities_input");
    });
}

#[test]
fn plan_rejects_entity_without_service_agreement() {
    with_env(&[], || {
        let dir = entities_dir(
            r#"[{"externalServiceAgreementId": " ", "externalLegalEntityId": "le-1", "numberOfUsers": 5}]"#,
        );

        let result = plan::run(LoadOptions::default(), &dir.path().join("entities.json"));
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "entities_input");
    });
}

#[test]
fn provision_returns_config_failure_for_zero_concurrency() {
    with_env(&[], || {
        let dir = entities_dir("[]");
        let options = LoadOptions {
            overrides: ConfigOverrides { max_concurrency: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        };

        let result = provision::run(options, &dir.path().join("entities.json"));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "provision");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn provision_fails_with_session_class_when_identity_is_unreachable() {
    with_env(
        &[("FUEL_IDENTITY_BASE_URL", CLOSED_PORT_URL), ("FUEL_HTTP_TIMEOUT_SECS", "2")],
        || {
            let dir = entities_dir(
                r#"[{"externalServiceAgreementId": "sa-1", "externalLegalEntityId": "le-1", "numberOfUsers": 5}]"#,
            );

            let result = provision::run(LoadOptions::default(), &dir.path().join("entities.json"));
            assert_eq!(result.exit_code, 6);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "session_failure");
        },
    );
}

#[test]
fn provision_requires_explicit_config_file_to_exist() {
    with_env(&[], || {
        let dir = entities_dir("[]");
        let options = LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        };

        let result = provision::run(options, &dir.path().join("entities.json"));
        assert_eq!(result.exit_code, 2);
        assert!(parse_payload(&result.output)["message"]
            .as_str()
            .is_some_and(|message| message.contains("absent.toml")));
    });
}

#[test]
fn config_output_redacts_password_and_attributes_sources() {
    with_env(&[("FUEL_ADMIN_PASSWORD", "s3cret-value")], || {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fuel.toml");
        fs::write(&path, "[provisioning]\nmax_concurrency = 4\n").expect("write config");

        let output = config::run(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        });

        assert!(!output.contains("s3cret-value"));
        assert!(output.contains("- admin.password = <redacted> (source: env (FUEL_ADMIN_PASSWORD))"));
        assert!(output.contains(&format!(
            "- provisioning.max_concurrency = 4 (source: file ({}))",
            path.display()
        )));
        assert!(output.contains("- admin.username = admin (source: default)"));
    });
}

#[test]
fn config_output_notes_password_defaulting() {
    with_env(&[], || {
        let output = config::run(LoadOptions::default());
        assert!(output.contains("- admin.password = <defaults to admin.username> (source: default)"));
    });
}

#[test]
fn doctor_reports_unreachable_endpoints() {
    with_env(
        &[
            ("FUEL_APPROVALS_BASE_URL", CLOSED_PORT_URL),
            ("FUEL_ACCESS_CONTROL_BASE_URL", CLOSED_PORT_URL),
            ("FUEL_IDENTITY_BASE_URL", CLOSED_PORT_URL),
            ("FUEL_HTTP_TIMEOUT_SECS", "2"),
        ],
        || {
            let output = doctor::run(LoadOptions::default(), true);
            let report = parse_payload(&output);

            assert_eq!(report["overall_status"], "fail");
            let checks = report["checks"].as_array().cloned().unwrap_or_default();
            let status_of = |name: &str| {
                checks
                    .iter()
                    .find(|check| check["name"] == name)
                    .map(|check| check["status"].clone())
                    .unwrap_or(Value::Null)
            };
            assert_eq!(status_of("config_validation"), "pass");
            assert_eq!(status_of("admin_credentials"), "pass");
            assert_eq!(status_of("identity_endpoint"), "fail");
        },
    );
}

#[test]
fn doctor_skips_remaining_checks_when_config_is_invalid() {
    with_env(&[("FUEL_APPROVALS_BASE_URL", "ftp://approvals")], || {
        let output = doctor::run(LoadOptions::default(), false);

        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] approvals_endpoint:"));
    });
}

fn entities_dir(contents: &str) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    write_entities(dir.path(), contents);
    dir
}

fn write_entities(dir: &Path, contents: &str) {
    fs::write(dir.join("entities.json"), contents).expect("write entities");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "FUEL_APPROVALS_BASE_URL",
        "FUEL_ACCESS_CONTROL_BASE_URL",
        "FUEL_IDENTITY_BASE_URL",
        "FUEL_ADMIN_USERNAME",
        "FUEL_ADMIN_PASSWORD",
        "FUEL_HTTP_TIMEOUT_SECS",
        "FUEL_CAPABILITIES_APPROVALS_FOR_PAYMENTS",
        "FUEL_CAPABILITIES_APPROVALS_FOR_CONTACTS",
        "FUEL_FUNCTION_GROUPS_LEVEL_A",
        "FUEL_FUNCTION_GROUPS_LEVEL_B",
        "FUEL_FUNCTION_GROUPS_LEVEL_C",
        "FUEL_PROVISIONING_MAX_CONCURRENCY",
        "FUEL_PROVISIONING_CONTINUE_ON_ERROR",
        "FUEL_LOGGING_LEVEL",
        "FUEL_LOGGING_FORMAT",
        "FUEL_LOG_LEVEL",
        "FUEL_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
