use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::approval::ApprovalLevel;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["fuel.toml", "config/fuel.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub approvals: ServiceEndpoint,
    pub access_control: ServiceEndpoint,
    pub identity: ServiceEndpoint,
    pub admin: AdminConfig,
    pub http: HttpConfig,
    pub capabilities: CapabilitiesConfig,
    pub function_groups: FunctionGroupsConfig,
    pub provisioning: ProvisioningConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServiceEndpoint {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub username: String,
    password: Option<SecretString>,
}

impl AdminConfig {
    /// The root entitlements admin logs in with its username as password unless
    /// one is configured.
    pub fn password(&self) -> SecretString {
        match &self.password {
            Some(password) => password.clone(),
            None => SecretString::from(self.username.clone()),
        }
    }

    pub fn has_explicit_password(&self) -> bool {
        self.password.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilitiesConfig {
    pub approvals_for_payments: bool,
    pub approvals_for_contacts: bool,
}

/// Function-group names that carry the approval levels inside a service agreement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionGroupsConfig {
    pub level_a: String,
    pub level_b: String,
    pub level_c: String,
}

impl FunctionGroupsConfig {
    pub fn name_for(&self, level: ApprovalLevel) -> &str {
        match level {
            ApprovalLevel::A => &self.level_a,
            ApprovalLevel::B => &self.level_b,
            ApprovalLevel::C => &self.level_c,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProvisioningConfig {
    pub max_concurrency: usize,
    pub continue_on_error: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub approvals_base_url: Option<String>,
    pub access_control_base_url: Option<String>,
    pub identity_base_url: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub log_level: Option<String>,
    pub max_concurrency: Option<usize>,
    pub continue_on_error: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            approvals: ServiceEndpoint {
                base_url: "http://localhost:8080/approval-integration-service/v2".to_string(),
            },
            access_control: ServiceEndpoint {
                base_url: "http://localhost:8080/accessgroup-integration-service/v2".to_string(),
            },
            identity: ServiceEndpoint {
                base_url: "http://localhost:8080/gateway/api/auth".to_string(),
            },
            admin: AdminConfig { username: "admin".to_string(), password: None },
            http: HttpConfig { timeout_secs: 30 },
            capabilities: CapabilitiesConfig {
                approvals_for_payments: true,
                approvals_for_contacts: true,
            },
            function_groups: FunctionGroupsConfig {
                level_a: "Approver A".to_string(),
                level_b: "Approver B".to_string(),
                level_c: "Approver C".to_string(),
            },
            provisioning: ProvisioningConfig { max_concurrency: 1, continue_on_error: true },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(base_url) = patch.approvals.and_then(|endpoint| endpoint.base_url) {
            self.approvals.base_url = base_url;
        }
        if let Some(base_url) = patch.access_control.and_then(|endpoint| endpoint.base_url) {
            self.access_control.base_url = base_url;
        }
        if let Some(base_url) = patch.identity.and_then(|endpoint| endpoint.base_url) {
            self.identity.base_url = base_url;
        }

        if let Some(admin) = patch.admin {
            if let Some(username) = admin.username {
                self.admin.username = username;
            }
            if let Some(admin_password_value) = admin.password {
                self.admin.password = Some(secret_value(admin_password_value));
            }
        }

        if let Some(timeout_secs) = patch.http.and_then(|http| http.timeout_secs) {
            self.http.timeout_secs = timeout_secs;
        }

        if let Some(capabilities) = patch.capabilities {
            if let Some(enabled) = capabilities.approvals_for_payments {
                self.capabilities.approvals_for_payments = enabled;
            }
            if let Some(enabled) = capabilities.approvals_for_contacts {
                self.capabilities.approvals_for_contacts = enabled;
            }
        }

        if let Some(function_groups) = patch.function_groups {
            if let Some(name) = function_groups.level_a {
                self.function_groups.level_a = name;
            }
            if let Some(name) = function_groups.level_b {
                self.function_groups.level_b = name;
            }
            if let Some(name) = function_groups.level_c {
                self.function_groups.level_c = name;
            }
        }

        if let Some(provisioning) = patch.provisioning {
            if let Some(max_concurrency) = provisioning.max_concurrency {
                self.provisioning.max_concurrency = max_concurrency;
            }
            if let Some(continue_on_error) = provisioning.continue_on_error {
                self.provisioning.continue_on_error = continue_on_error;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FUEL_APPROVALS_BASE_URL") {
            self.approvals.base_url = value;
        }
        if let Some(value) = read_env("FUEL_ACCESS_CONTROL_BASE_URL") {
            self.access_control.base_url = value;
        }
        if let Some(value) = read_env("FUEL_IDENTITY_BASE_URL") {
            self.identity.base_url = value;
        }

        if let Some(value) = read_env("FUEL_ADMIN_USERNAME") {
            self.admin.username = value;
        }
        if let Some(value) = read_env("FUEL_ADMIN_PASSWORD") {
            self.admin.password = Some(secret_value(value));
        }

        if let Some(value) = read_env("FUEL_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = parse_u64("FUEL_HTTP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FUEL_CAPABILITIES_APPROVALS_FOR_PAYMENTS") {
            self.capabilities.approvals_for_payments =
                parse_bool("FUEL_CAPABILITIES_APPROVALS_FOR_PAYMENTS", &value)?;
        }
        if let Some(value) = read_env("FUEL_CAPABILITIES_APPROVALS_FOR_CONTACTS") {
            self.capabilities.approvals_for_contacts =
                parse_bool("FUEL_CAPABILITIES_APPROVALS_FOR_CONTACTS", &value)?;
        }

        if let Some(value) = read_env("FUEL_FUNCTION_GROUPS_LEVEL_A") {
            self.function_groups.level_a = value;
        }
        if let Some(value) = read_env("FUEL_FUNCTION_GROUPS_LEVEL_B") {
            self.function_groups.level_b = value;
        }
        if let Some(value) = read_env("FUEL_FUNCTION_GROUPS_LEVEL_C") {
            self.function_groups.level_c = value;
        }

        if let Some(value) = read_env("FUEL_PROVISIONING_MAX_CONCURRENCY") {
            self.provisioning.max_concurrency =
                parse_usize("FUEL_PROVISIONING_MAX_CONCURRENCY", &value)?;
        }
        if let Some(value) = read_env("FUEL_PROVISIONING_CONTINUE_ON_ERROR") {
            self.provisioning.continue_on_error =
                parse_bool("FUEL_PROVISIONING_CONTINUE_ON_ERROR", &value)?;
        }

        let log_level = read_env("FUEL_LOGGING_LEVEL").or_else(|| read_env("FUEL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("FUEL_LOGGING_FORMAT").or_else(|| read_env("FUEL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.approvals_base_url {
            self.approvals.base_url = base_url;
        }
        if let Some(base_url) = overrides.access_control_base_url {
            self.access_control.base_url = base_url;
        }
        if let Some(base_url) = overrides.identity_base_url {
            self.identity.base_url = base_url;
        }
        if let Some(username) = overrides.admin_username {
            self.admin.username = username;
        }
        if let Some(admin_password) = overrides.admin_password {
            self.admin.password = Some(secret_value(admin_password));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(max_concurrency) = overrides.max_concurrency {
            self.provisioning.max_concurrency = max_concurrency;
        }
        if let Some(continue_on_error) = overrides.continue_on_error {
            self.provisioning.continue_on_error = continue_on_error;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("approvals.base_url", &self.approvals.base_url)?;
        validate_base_url("access_control.base_url", &self.access_control.base_url)?;
        validate_base_url("identity.base_url", &self.identity.base_url)?;
        validate_admin(&self.admin)?;
        validate_http(&self.http)?;
        validate_function_groups(&self.function_groups)?;
        validate_provisioning(&self.provisioning)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path, else the default candidates.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_base_url(key: &str, base_url: &str) -> Result<(), ConfigError> {
    let base_url = base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }

    Ok(())
}

fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
    if admin.username.trim().is_empty() {
        return Err(ConfigError::Validation(
            "admin.username is required; it names the root entitlements admin used for login"
                .to_string(),
        ));
    }

    let blank_password =
        admin.password.as_ref().is_some_and(|password| password.expose_secret().trim().is_empty());
    if blank_password {
        return Err(ConfigError::Validation(
            "admin.password must not be blank; omit it to log in with the username".to_string(),
        ));
    }

    Ok(())
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.timeout_secs == 0 || http.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "http.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_function_groups(function_groups: &FunctionGroupsConfig) -> Result<(), ConfigError> {
    for level in ApprovalLevel::ALL {
        if function_groups.name_for(level).trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "function_groups.level_{} must name the function group for approval level {level}",
                level.as_str().to_ascii_lowercase()
            )));
        }
    }

    Ok(())
}

fn validate_provisioning(provisioning: &ProvisioningConfig) -> Result<(), ConfigError> {
    if provisioning.max_concurrency == 0 {
        return Err(ConfigError::Validation(
            "provisioning.max_concurrency must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    approvals: Option<EndpointPatch>,
    access_control: Option<EndpointPatch>,
    identity: Option<EndpointPatch>,
    admin: Option<AdminPatch>,
    http: Option<HttpPatch>,
    capabilities: Option<CapabilitiesPatch>,
    function_groups: Option<FunctionGroupsPatch>,
    provisioning: Option<ProvisioningPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointPatch {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CapabilitiesPatch {
    approvals_for_payments: Option<bool>,
    approvals_for_contacts: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionGroupsPatch {
    level_a: Option<String>,
    level_b: Option<String>,
    level_c: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProvisioningPatch {
    max_concurrency: Option<usize>,
    continue_on_error: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
