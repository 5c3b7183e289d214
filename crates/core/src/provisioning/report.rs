use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::legal_entity::LegalEntityTarget;
use crate::errors::ProvisioningError;
use crate::provisioning::context::ProvisioningContext;
use crate::provisioning::plan::{Capability, ProvisioningStep};

/// Last stage a legal entity reached. Approval types and policies are run scoped,
/// so every attempted entity starts at `TypesAndPoliciesReady`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStage {
    Start,
    TypesAndPoliciesReady,
    FunctionGroupsLinked,
    PaymentsAssigned,
    ContactsAssigned,
    Done,
}

impl EntityStage {
    pub fn after(step: ProvisioningStep) -> Self {
        match step {
            ProvisioningStep::LinkFunctionGroups => Self::FunctionGroupsLinked,
            ProvisioningStep::AssignPolicies(Capability::PaymentsApprovals) => {
                Self::PaymentsAssigned
            }
            ProvisioningStep::AssignPolicies(Capability::ContactsApprovals) => {
                Self::ContactsAssigned
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Provisioned,
    Failed,
    NotAttempted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityOutcome {
    pub external_service_agreement_id: String,
    pub external_legal_entity_id: String,
    pub status: EntityStatus,
    pub stage: EntityStage,
    pub error_class: Option<String>,
    pub message: Option<String>,
}

impl EntityOutcome {
    pub fn provisioned(target: &LegalEntityTarget) -> Self {
        Self::new(target, EntityStatus::Provisioned, EntityStage::Done, None)
    }

    pub fn failed(target: &LegalEntityTarget, stage: EntityStage, error: &ProvisioningError) -> Self {
        Self::new(target, EntityStatus::Failed, stage, Some(error))
    }

    pub fn not_attempted(target: &LegalEntityTarget) -> Self {
        Self::new(target, EntityStatus::NotAttempted, EntityStage::Start, None)
    }

    /// The entity task ended without producing a result (panic or cancellation).
    pub fn task_failed(target: &LegalEntityTarget, message: String) -> Self {
        Self {
            message: Some(message),
            error_class: Some("task_failure".to_string()),
            ..Self::new(target, EntityStatus::Failed, EntityStage::TypesAndPoliciesReady, None)
        }
    }

    fn new(
        target: &LegalEntityTarget,
        status: EntityStatus,
        stage: EntityStage,
        error: Option<&ProvisioningError>,
    ) -> Self {
        Self {
            external_service_agreement_id: target.external_service_agreement_id.clone(),
            external_legal_entity_id: target.external_legal_entity_id.clone(),
            status,
            stage,
            error_class: error.map(|error| error.error_class().to_string()),
            message: error.map(ToString::to_string),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// No approval capability was enabled, so nothing was sent.
    pub skipped: bool,
    pub context: Option<ProvisioningContext>,
    pub entities: Vec<EntityOutcome>,
}

impl RunReport {
    pub fn provisioned(&self) -> usize {
        self.count(EntityStatus::Provisioned)
    }

    pub fn failed(&self) -> usize {
        self.count(EntityStatus::Failed)
    }

    pub fn not_attempted(&self) -> usize {
        self.count(EntityStatus::NotAttempted)
    }

    pub fn is_success(&self) -> bool {
        self.entities.iter().all(|entity| entity.status == EntityStatus::Provisioned)
    }

    pub fn first_failure(&self) -> Option<&EntityOutcome> {
        self.entities.iter().find(|entity| entity.status == EntityStatus::Failed)
    }

    fn count(&self, status: EntityStatus) -> usize {
        self.entities.iter().filter(|entity| entity.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{EntityOutcome, EntityStage, EntityStatus, RunReport};
    use crate::domain::approval::ApprovalLevel;
    use crate::domain::legal_entity::LegalEntityTarget;
    use crate::errors::ProvisioningError;
    use crate::provisioning::plan::{Capability, ProvisioningStep};

    #[test]
    fn stages_follow_plan_steps() {
        assert_eq!(
            EntityStage::after(ProvisioningStep::LinkFunctionGroups),
            EntityStage::FunctionGroupsLinked
        );
        assert_eq!(
            EntityStage::after(ProvisioningStep::AssignPolicies(Capability::ContactsApprovals)),
            EntityStage::ContactsAssigned
        );
        assert!(EntityStage::TypesAndPoliciesReady < EntityStage::FunctionGroupsLinked);
        assert!(EntityStage::ContactsAssigned < EntityStage::Done);
    }

    #[test]
    fn report_counts_outcomes_by_status() {
        let ok = LegalEntityTarget::new("sa-1", "le-1", 5);
        let broken = LegalEntityTarget::new("sa-2", "le-2", 5);
        let skipped = LegalEntityTarget::new("sa-3", "le-3", 5);
        let error = ProvisioningError::Resolution {
            level: ApprovalLevel::B,
            external_service_agreement_id: "sa-2".to_string(),
        };

        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            skipped: false,
            context: None,
            entities: vec![
                EntityOutcome::provisioned(&ok),
                EntityOutcome::failed(&broken, EntityStage::TypesAndPoliciesReady, &error),
                EntityOutcome::not_attempted(&skipped),
            ],
        };

        assert_eq!((report.provisioned(), report.failed(), report.not_attempted()), (1, 1, 1));
        assert!(!report.is_success());

        let failure = report.first_failure().expect("one failure recorded");
        assert_eq!(failure.status, EntityStatus::Failed);
        assert_eq!(failure.error_class.as_deref(), Some("resolution_failure"));
        assert_eq!(failure.external_legal_entity_id, "le-2");
    }
}
