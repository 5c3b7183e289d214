use serde::{Deserialize, Serialize};

use crate::domain::approval::{ApprovalLevel, ApprovalTypeId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub String);

/// The four policies created per run, named by the approval levels they chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalChain {
    Zero,
    A,
    AB,
    ABC,
}

impl ApprovalChain {
    pub const ALL: [ApprovalChain; 4] = [Self::Zero, Self::A, Self::AB, Self::ABC];

    pub fn levels(self) -> &'static [ApprovalLevel] {
        match self {
            Self::Zero => &[],
            Self::A => &[ApprovalLevel::A],
            Self::AB => &[ApprovalLevel::A, ApprovalLevel::B],
            Self::ABC => &[ApprovalLevel::A, ApprovalLevel::B, ApprovalLevel::C],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Zero => "Zero approval",
            Self::A => "A",
            Self::AB => "A+B",
            Self::ABC => "A+B+C",
        }
    }
}

/// One requirement of a policy: `required_approval_count` sign-offs of the given type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyItem {
    approval_type_id: ApprovalTypeId,
    required_approval_count: u32,
}

impl PolicyItem {
    pub fn new(
        approval_type_id: ApprovalTypeId,
        required_approval_count: u32,
    ) -> Result<Self, DomainError> {
        if required_approval_count == 0 {
            return Err(DomainError::ZeroApprovalCount { approval_type_id: approval_type_id.0 });
        }

        Ok(Self { approval_type_id, required_approval_count })
    }

    pub fn single(approval_type_id: ApprovalTypeId) -> Self {
        Self { approval_type_id, required_approval_count: 1 }
    }

    pub fn approval_type_id(&self) -> &ApprovalTypeId {
        &self.approval_type_id
    }

    pub fn required_approval_count(&self) -> u32 {
        self.required_approval_count
    }
}

/// Ordered approval requirements. Item order is escalation order; no items means
/// the transaction is approved automatically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDefinition {
    name: String,
    items: Vec<PolicyItem>,
}

impl PolicyDefinition {
    pub fn new(name: impl Into<String>, items: Vec<PolicyItem>) -> Self {
        Self { name: name.into(), items }
    }

    pub fn zero_approval() -> Self {
        Self::new(ApprovalChain::Zero.label(), Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> String {
        if self.items.is_empty() {
            return "No approval required".to_string();
        }

        let approvals: u32 = self.items.iter().map(PolicyItem::required_approval_count).sum();
        format!("{} policy requiring {approvals} approval(s)", self.name)
    }

    pub fn items(&self) -> &[PolicyItem] {
        &self.items
    }

    pub fn is_auto_approve(&self) -> bool {
        self.items.is_empty()
    }
}
