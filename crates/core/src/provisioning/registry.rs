use std::sync::Arc;

use tracing::info;

use crate::domain::approval::{ApprovalTypeId, NewApprovalType};
use crate::domain::policy::{ApprovalChain, PolicyDefinition, PolicyId, PolicyItem};
use crate::errors::ProvisioningError;
use crate::provisioning::context::{ApprovalTypeIds, PolicyIds};
use crate::remote::ApprovalService;

#[derive(Clone)]
pub struct ApprovalTypeRegistry {
    approvals: Arc<dyn ApprovalService>,
}

impl ApprovalTypeRegistry {
    pub fn new(approvals: Arc<dyn ApprovalService>) -> Self {
        Self { approvals }
    }

    pub async fn create_approval_type(
        &self,
        approval_type: &NewApprovalType,
    ) -> Result<ApprovalTypeId, ProvisioningError> {
        let id = self.approvals.create_approval_type(approval_type).await.map_err(|source| {
            ProvisioningError::Creation {
                what: format!("approval type {}", approval_type.level),
                source,
            }
        })?;

        info!(
            event_name = "approvals.approval_type.created",
            level = approval_type.level.as_str(),
            rank = approval_type.rank,
            approval_type_id = %id.0,
            "approval type created"
        );
        Ok(id)
    }

    /// Creates the three approval types in the order given, expected A, B, C.
    pub async fn create_all(
        &self,
        requests: &[NewApprovalType; 3],
    ) -> Result<ApprovalTypeIds, ProvisioningError> {
        let [a, b, c] = requests;
        Ok(ApprovalTypeIds {
            a: self.create_approval_type(a).await?,
            b: self.create_approval_type(b).await?,
            c: self.create_approval_type(c).await?,
        })
    }
}

#[derive(Clone)]
pub struct PolicyBuilder {
    approvals: Arc<dyn ApprovalService>,
}

impl PolicyBuilder {
    pub fn new(approvals: Arc<dyn ApprovalService>) -> Self {
        Self { approvals }
    }

    /// One single-approver item per level of the chain, in chain order.
    pub fn compose(chain: ApprovalChain, approval_types: &ApprovalTypeIds) -> PolicyDefinition {
        if chain == ApprovalChain::Zero {
            return PolicyDefinition::zero_approval();
        }

        let items = chain
            .levels()
            .iter()
            .map(|level| PolicyItem::single(approval_types.get(*level).clone()))
            .collect();
        PolicyDefinition::new(chain.label(), items)
    }

    pub async fn create_policy(
        &self,
        policy: &PolicyDefinition,
    ) -> Result<PolicyId, ProvisioningError> {
        let id = self.approvals.create_policy(policy).await.map_err(|source| {
            ProvisioningError::Creation { what: format!("policy `{}`", policy.name()), source }
        })?;

        info!(
            event_name = "approvals.policy.created",
            policy_name = policy.name(),
            items = policy.items().len(),
            policy_id = %id.0,
            "policy created"
        );
        Ok(id)
    }

    pub async fn create_all(
        &self,
        approval_types: &ApprovalTypeIds,
    ) -> Result<PolicyIds, ProvisioningError> {
        let zero = self.create_policy(&Self::compose(ApprovalChain::Zero, approval_types)).await?;
        let a = self.create_policy(&Self::compose(ApprovalChain::A, approval_types)).await?;
        let ab = self.create_policy(&Self::compose(ApprovalChain::AB, approval_types)).await?;
        let abc = self.create_policy(&Self::compose(ApprovalChain::ABC, approval_types)).await?;

        Ok(PolicyIds { zero, a, ab, abc })
    }
}

#[cfg(test)]
mod tests {
    use super::PolicyBuilder;
    use crate::domain::approval::ApprovalTypeId;
    use crate::domain::policy::ApprovalChain;
    use crate::provisioning::context::ApprovalTypeIds;

    fn approval_types() -> ApprovalTypeIds {
        ApprovalTypeIds {
            a: ApprovalTypeId("type-a".to_string()),
            b: ApprovalTypeId("type-b".to_string()),
            c: ApprovalTypeId("type-c".to_string()),
        }
    }

    #[test]
    fn abc_policy_has_three_single_approver_items_in_order() {
        let policy = PolicyBuilder::compose(ApprovalChain::ABC, &approval_types());

        let items = policy
            .items()
            .iter()
            .map(|item| (item.approval_type_id().0.as_str(), item.required_approval_count()))
            .collect::<Vec<_>>();
        assert_eq!(items, vec![("type-a", 1), ("type-b", 1), ("type-c", 1)]);
        assert_eq!(policy.name(), "A+B+C");
    }

    #[test]
    fn zero_policy_has_no_items() {
        let policy = PolicyBuilder::compose(ApprovalChain::Zero, &approval_types());
        assert!(policy.items().is_empty());
        assert!(policy.is_auto_approve());
    }

    #[test]
    fn intermediate_chains_are_prefixes_of_the_full_chain() {
        let types = approval_types();
        let full = PolicyBuilder::compose(ApprovalChain::ABC, &types);

        for chain in [ApprovalChain::A, ApprovalChain::AB] {
            let policy = PolicyBuilder::compose(chain, &types);
            assert_eq!(policy.items(), &full.items()[..policy.items().len()]);
        }
    }
}
