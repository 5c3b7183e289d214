use std::env;
use std::fs;
use std::path::Path;

use fuel_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let admin_password = if config.admin.has_explicit_password() {
        "<redacted>"
    } else {
        "<defaults to admin.username>"
    };

    let fields: Vec<(&str, String, Vec<&str>)> = vec![
        ("approvals.base_url", config.approvals.base_url.clone(), vec!["FUEL_APPROVALS_BASE_URL"]),
        (
            "access_control.base_url",
            config.access_control.base_url.clone(),
            vec!["FUEL_ACCESS_CONTROL_BASE_URL"],
        ),
        ("identity.base_url", config.identity.base_url.clone(), vec!["FUEL_IDENTITY_BASE_URL"]),
        ("admin.username", config.admin.username.clone(), vec!["FUEL_ADMIN_USERNAME"]),
        ("admin.password", admin_password.to_string(), vec!["FUEL_ADMIN_PASSWORD"]),
        ("http.timeout_secs", config.http.timeout_secs.to_string(), vec!["FUEL_HTTP_TIMEOUT_SECS"]),
        (
            "capabilities.approvals_for_payments",
            config.capabilities.approvals_for_payments.to_string(),
            vec!["FUEL_CAPABILITIES_APPROVALS_FOR_PAYMENTS"],
        ),
        (
            "capabilities.approvals_for_contacts",
            config.capabilities.approvals_for_contacts.to_string(),
            vec!["FUEL_CAPABILITIES_APPROVALS_FOR_CONTACTS"],
        ),
        (
            "function_groups.level_a",
            config.function_groups.level_a.clone(),
            vec!["FUEL_FUNCTION_GROUPS_LEVEL_A"],
        ),
        (
            "function_groups.level_b",
            config.function_groups.level_b.clone(),
            vec!["FUEL_FUNCTION_GROUPS_LEVEL_B"],
        ),
        (
            "function_groups.level_c",
            config.function_groups.level_c.clone(),
            vec!["FUEL_FUNCTION_GROUPS_LEVEL_C"],
        ),
        (
            "provisioning.max_concurrency",
            config.provisioning.max_concurrency.to_string(),
            vec!["FUEL_PROVISIONING_MAX_CONCURRENCY"],
        ),
        (
            "provisioning.continue_on_error",
            config.provisioning.continue_on_error.to_string(),
            vec!["FUEL_PROVISIONING_CONTINUE_ON_ERROR"],
        ),
        ("logging.level", config.logging.level.clone(), vec!["FUEL_LOGGING_LEVEL", "FUEL_LOG_LEVEL"]),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            vec!["FUEL_LOGGING_FORMAT", "FUEL_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: cli > env > file > default):".to_string()];
    lines.extend(
        fields
            .into_iter()
            .map(|(key, value, env_keys)| render_line(key, &value, source(key, &env_keys))),
    );
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
