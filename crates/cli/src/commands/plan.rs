//! Dry run. The whole provisioning flow executes against in-memory services and
//! the command prints every request a real run would send. Function-group ids
//! are synthesized, so no network access is needed.

use std::path::Path;
use std::sync::Arc;

use fuel_client::{InMemoryApprovalService, InMemoryFunctionGroupResolver, InMemorySessionProvider};
use fuel_core::config::{AppConfig, LoadOptions};
use fuel_core::{ApprovalsProvisioner, ProvisionerSettings};
use serde_json::json;

use crate::commands::{read_entities, runtime, CommandResult};

const COMMAND: &str = "plan";

pub fn run(options: LoadOptions, entities_path: &Path) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    crate::init_logging(&config.logging);

    let entities = match read_entities(entities_path) {
        Ok(entities) => entities,
        Err(error) => {
            return CommandResult::failure(COMMAND, "entities_input", format!("{error:#}"), 3);
        }
    };

    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(message) => return CommandResult::failure(COMMAND, "runtime_init", message, 4),
    };

    let approvals = Arc::new(InMemoryApprovalService::new());
    let provisioner = ApprovalsProvisioner::new(
        approvals.clone(),
        Arc::new(InMemoryFunctionGroupResolver::synthetic()),
        Arc::new(InMemorySessionProvider::new()),
        ProvisionerSettings::from(&config),
    );

    let report = match runtime.block_on(provisioner.run(entities)) {
        Ok(report) => report,
        Err(error) => return CommandResult::failure(COMMAND, error.error_class(), error.to_string(), 6),
    };

    let requests = approvals.recorded();
    let message = if report.skipped {
        "no approval capability enabled; a run would be skipped".to_string()
    } else {
        format!(
            "{} approval types, {} policies, {} policy assignments for {} legal entities",
            requests.approval_types.len(),
            requests.policies.len(),
            requests.policy_assignment_count(),
            report.entities.len()
        )
    };

    CommandResult::success_with_details(
        COMMAND,
        message,
        Some(json!({
            "steps": provisioner.plan().steps(),
            "report": report,
            "requests": requests,
        })),
    )
}
