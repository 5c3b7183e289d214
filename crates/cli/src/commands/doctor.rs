use fuel_core::config::{AppConfig, LoadOptions};
use fuel_core::{Capabilities, ProvisioningPlan};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const ENDPOINT_CHECKS: [&str; 3] =
    ["approvals_endpoint", "access_control_endpoint", "identity_endpoint"];

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_admin_credentials(&config));
            checks.push(check_capabilities(&config));
            checks.extend(check_endpoints(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["admin_credentials", "capabilities"].into_iter().chain(ENDPOINT_CHECKS) {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_admin_credentials(config: &AppConfig) -> DoctorCheck {
    let details = if config.admin.has_explicit_password() {
        format!("logging in as `{}` with a configured password", config.admin.username)
    } else {
        format!("logging in as `{}`; password defaults to the username", config.admin.username)
    };

    DoctorCheck { name: "admin_credentials", status: CheckStatus::Pass, details }
}

fn check_capabilities(config: &AppConfig) -> DoctorCheck {
    let plan = ProvisioningPlan::resolve(Capabilities::from(&config.capabilities));
    let details = if plan.is_empty() {
        "no approval capability enabled; provisioning runs will be skipped".to_string()
    } else {
        let steps = plan.steps().iter().map(|step| format!("{step:?}")).collect::<Vec<_>>();
        format!("plan steps: {}", steps.join(", "))
    };

    DoctorCheck { name: "capabilities", status: CheckStatus::Pass, details }
}

fn check_endpoints(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return ENDPOINT_CHECKS
                .into_iter()
                .map(|name| DoctorCheck {
                    name,
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                })
                .collect();
        }
    };

    let endpoints = [
        &config.approvals.base_url,
        &config.access_control.base_url,
        &config.identity.base_url,
    ];

    ENDPOINT_CHECKS
        .into_iter()
        .zip(endpoints)
        .map(|(name, base_url)| {
            let probe =
                runtime.block_on(fuel_client::probe_endpoint(config.http.timeout_secs, base_url));
            match probe {
                Ok(status) => DoctorCheck {
                    name,
                    status: CheckStatus::Pass,
                    details: format!("`{base_url}` answered HTTP {status}"),
                },
                Err(error) => DoctorCheck { name, status: CheckStatus::Fail, details: error.to_string() },
            }
        })
        .collect()
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
