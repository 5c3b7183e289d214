use std::path::Path;

use fuel_client::HttpAdapters;
use fuel_core::config::{AppConfig, LoadOptions};
use fuel_core::{ApprovalsProvisioner, ProvisionerSettings};

use crate::commands::{read_entities, runtime, to_details, CommandResult};

const COMMAND: &str = "provision";

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

    let adapters = match HttpAdapters::from_config(&config) {
        Ok(adapters) => adapters,
        Err(error) => {
            return CommandResult::failure(COMMAND, "http_client", error.to_string(), 5);
        }
    };
    let provisioner = ApprovalsProvisioner::new(
        adapters.approvals,
        adapters.function_groups,
        adapters.session,
        ProvisionerSettings::from(&config),
    );

    let report = match runtime.block_on(provisioner.run(entities)) {
        Ok(report) => report,
        Err(error) => return CommandResult::failure(COMMAND, error.error_class(), error.to_string(), 6),
    };

    if report.skipped {
        return CommandResult::success_with_details(
            COMMAND,
            "no approval capability enabled; nothing provisioned",
            to_details(&report),
        );
    }

    let summary = format!(
        "provisioned {} of {} legal entities ({} failed, {} not attempted)",
        report.provisioned(),
        report.entities.len(),
        report.failed(),
        report.not_attempted()
    );

    if report.is_success() {
        CommandResult::success_with_details(COMMAND, summary, to_details(&report))
    } else {
        let error_class = report
            .first_failure()
            .and_then(|failure| failure.error_class.clone())
            .unwrap_or_else(|| "entity_failure".to_string());
        CommandResult::failure_with_details(COMMAND, &error_class, summary, 7, to_details(&report))
    }
}
