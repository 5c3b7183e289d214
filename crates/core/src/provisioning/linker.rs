use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::approval::ApprovalLevel;
use crate::domain::assignment::ApprovalTypeAssignment;
use crate::errors::ProvisioningError;
use crate::provisioning::context::ProvisioningContext;
use crate::remote::{ApprovalService, FunctionGroupResolver};

/// Binds the run's approval types to a service agreement's per-level function groups.
#[derive(Clone)]
pub struct FunctionGroupLinker {
    approvals: Arc<dyn ApprovalService>,
    function_groups: Arc<dyn FunctionGroupResolver>,
}

impl FunctionGroupLinker {
    pub fn new(
        approvals: Arc<dyn ApprovalService>,
        function_groups: Arc<dyn FunctionGroupResolver>,
    ) -> Self {
        Self { approvals, function_groups }
    }

    /// Resolves all three levels first. A missing group aborts before any link
    /// request is sent.
    pub async fn resolve(
        &self,
        context: &ProvisioningContext,
        external_service_agreement_id: &str,
    ) -> Result<Vec<ApprovalTypeAssignment>, ProvisioningError> {
        let mut assignments = Vec::with_capacity(ApprovalLevel::ALL.len());

        for level in ApprovalLevel::ALL {
            let function_group_id = self
                .function_groups
                .find_function_group_id(level, external_service_agreement_id)
                .await
                .map_err(|source| ProvisioningError::Lookup { level, source })?
                .ok_or_else(|| ProvisioningError::Resolution {
                    level,
                    external_service_agreement_id: external_service_agreement_id.to_string(),
                })?;

            debug!(
                event_name = "access_control.function_group.resolved",
                level = level.as_str(),
                external_service_agreement_id,
                function_group_id = %function_group_id.0,
                "function group resolved"
            );
            assignments.push(ApprovalTypeAssignment {
                approval_type_id: context.approval_type_id(level).clone(),
                function_group_id,
            });
        }

        Ok(assignments)
    }

    pub async fn link(
        &self,
        context: &ProvisioningContext,
        external_service_agreement_id: &str,
    ) -> Result<(), ProvisioningError> {
        let assignments = self.resolve(context, external_service_agreement_id).await?;

        self.approvals
            .assign_approval_types(&assignments)
            .await
            .map_err(|source| ProvisioningError::Linking { source })?;

        info!(
            event_name = "approvals.approval_types.linked",
            external_service_agreement_id,
            links = assignments.len(),
            "approval types linked to function groups"
        );
        Ok(())
    }
}
