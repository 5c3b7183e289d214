use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::approval::ApprovalTypeId;
use crate::domain::function::{BusinessFunction, CurrencyCode, Resource};
use crate::domain::policy::PolicyId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionGroupId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBound {
    pub currency_code: CurrencyCode,
    pub amount: Decimal,
}

impl CurrencyBound {
    pub fn new(currency_code: CurrencyCode, amount: Decimal) -> Self {
        Self { currency_code, amount }
    }
}

/// A policy tier. `upper_bound: None` is the unbounded tier that catches every
/// amount above the previous tiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedPolicy {
    pub policy_id: PolicyId,
    pub upper_bound: Option<CurrencyBound>,
}

impl BoundedPolicy {
    pub fn is_unbounded(&self) -> bool {
        self.upper_bound.is_none()
    }
}

/// All tiers for one (resource, function) pair of one legal entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAssignment {
    pub external_service_agreement_id: String,
    pub external_legal_entity_id: String,
    pub function: BusinessFunction,
    pub bounded_policies: Vec<BoundedPolicy>,
}

impl PolicyAssignment {
    pub fn resource(&self) -> Resource {
        self.function.resource()
    }

    pub fn resource_name(&self) -> &'static str {
        self.function.resource().as_str()
    }

    pub fn function_name(&self) -> &'static str {
        self.function.name()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTypeAssignment {
    pub approval_type_id: ApprovalTypeId,
    pub function_group_id: FunctionGroupId,
}
