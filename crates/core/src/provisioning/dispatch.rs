use std::sync::Arc;

use tracing::info;

use crate::domain::assignment::PolicyAssignment;
use crate::errors::ProvisioningError;
use crate::provisioning::plan::Capability;
use crate::remote::ApprovalService;

/// Sends planned policy assignments to the approval integration service.
#[derive(Clone)]
pub struct PolicyAssignmentDispatcher {
    approvals: Arc<dyn ApprovalService>,
}

impl PolicyAssignmentDispatcher {
    pub fn new(approvals: Arc<dyn ApprovalService>) -> Self {
        Self { approvals }
    }

    /// One bulk request for the whole batch. An empty batch sends nothing.
    pub async fn submit(
        &self,
        capability: Capability,
        assignments: &[PolicyAssignment],
    ) -> Result<(), ProvisioningError> {
        if assignments.is_empty() {
            return Ok(());
        }

        self.approvals
            .assign_policies(assignments)
            .await
            .map_err(|source| ProvisioningError::Assignment { capability, source })?;

        info!(
            event_name = "approvals.policies.assigned",
            capability = capability.as_str(),
            assignments = assignments.len(),
            tiers = assignments.iter().map(|a| a.bounded_policies.len()).sum::<usize>(),
            "policy assignments submitted"
        );
        Ok(())
    }

    pub async fn submit_one(
        &self,
        capability: Capability,
        assignment: &PolicyAssignment,
    ) -> Result<(), ProvisioningError> {
        self.approvals
            .assign_policy(assignment)
            .await
            .map_err(|source| ProvisioningError::Assignment { capability, source })?;

        info!(
            event_name = "approvals.policy.assigned",
            capability = capability.as_str(),
            resource = assignment.resource_name(),
            function = assignment.function_name(),
            "policy assignment submitted"
        );
        Ok(())
    }
}
