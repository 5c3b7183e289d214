use serde::Serialize;

use crate::domain::approval::{ApprovalLevel, ApprovalTypeId};
use crate::domain::policy::{ApprovalChain, PolicyId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApprovalTypeIds {
    pub a: ApprovalTypeId,
    pub b: ApprovalTypeId,
    pub c: ApprovalTypeId,
}

impl ApprovalTypeIds {
    pub fn get(&self, level: ApprovalLevel) -> &ApprovalTypeId {
        match level {
            ApprovalLevel::A => &self.a,
            ApprovalLevel::B => &self.b,
            ApprovalLevel::C => &self.c,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PolicyIds {
    pub zero: PolicyId,
    pub a: PolicyId,
    pub ab: PolicyId,
    pub abc: PolicyId,
}

impl PolicyIds {
    pub fn get(&self, chain: ApprovalChain) -> &PolicyId {
        match chain {
            ApprovalChain::Zero => &self.zero,
            ApprovalChain::A => &self.a,
            ApprovalChain::AB => &self.ab,
            ApprovalChain::ABC => &self.abc,
        }
    }
}

/// Remote ids created by the one-time setup of a run.
///
/// Only the setup step constructs this value, so holding one proves approval
/// types and policies exist. It is read-only and shared across entity tasks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProvisioningContext {
    approval_types: ApprovalTypeIds,
    policies: PolicyIds,
}

impl ProvisioningContext {
    pub(crate) fn new(approval_types: ApprovalTypeIds, policies: PolicyIds) -> Self {
        Self { approval_types, policies }
    }

    pub fn approval_type_id(&self, level: ApprovalLevel) -> &ApprovalTypeId {
        self.approval_types.get(level)
    }

    pub fn policy_id(&self, chain: ApprovalChain) -> &PolicyId {
        self.policies.get(chain)
    }

    pub fn approval_types(&self) -> &ApprovalTypeIds {
        &self.approval_types
    }

    pub fn policies(&self) -> &PolicyIds {
        &self.policies
    }
}

#[cfg(test)]
pub(crate) fn fixture() -> ProvisioningContext {
    ProvisioningContext::new(
        ApprovalTypeIds {
            a: ApprovalTypeId("type-a".to_string()),
            b: ApprovalTypeId("type-b".to_string()),
            c: ApprovalTypeId("type-c".to_string()),
        },
        PolicyIds {
            zero: PolicyId("policy-zero".to_string()),
            a: PolicyId("policy-a".to_string()),
            ab: PolicyId("policy-ab".to_string()),
            abc: PolicyId("policy-abc".to_string()),
        },
    )
}
