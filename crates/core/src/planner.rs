//! Threshold assignment planning.
//!
//! Maps an organization's size and a business function onto ordered policy
//! tiers. The remote service evaluates tiers in ascending bound order and the
//! first matching bound wins, so the last tier is always unbounded.
//! Pure: no I/O, no randomness.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::assignment::{BoundedPolicy, CurrencyBound, PolicyAssignment};
use crate::domain::function::{currency_for, BusinessFunction, PaymentFunction};
use crate::domain::legal_entity::LegalEntityTarget;
use crate::domain::policy::ApprovalChain;
use crate::provisioning::context::ProvisioningContext;
use crate::provisioning::plan::Capability;

/// Below this many users an organization cannot staff an approval ladder and
/// every payment is auto-approved.
pub const MIN_USERS_FOR_APPROVAL_LADDER: u32 = 3;

const PAYMENT_LADDER: [(ApprovalChain, u32); 3] =
    [(ApprovalChain::Zero, 100), (ApprovalChain::A, 1_000), (ApprovalChain::AB, 100_000)];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub chain: ApprovalChain,
    pub upper_bound: Option<CurrencyBound>,
}

impl Tier {
    fn unbounded(chain: ApprovalChain) -> Self {
        Self { chain, upper_bound: None }
    }
}

pub fn payment_tiers(number_of_users: u32, function: PaymentFunction) -> Vec<Tier> {
    if number_of_users < MIN_USERS_FOR_APPROVAL_LADDER {
        return vec![Tier::unbounded(ApprovalChain::Zero)];
    }

    let currency = currency_for(function);
    let mut tiers = PAYMENT_LADDER
        .iter()
        .map(|(chain, amount)| Tier {
            chain: *chain,
            upper_bound: Some(CurrencyBound::new(currency, Decimal::from(*amount))),
        })
        .collect::<Vec<_>>();
    tiers.push(Tier::unbounded(ApprovalChain::ABC));
    tiers
}

pub fn contacts_tiers() -> Vec<Tier> {
    vec![Tier::unbounded(ApprovalChain::A)]
}

pub fn tiers_for(function: BusinessFunction, number_of_users: u32) -> Vec<Tier> {
    match function {
        BusinessFunction::Payment(payment) => payment_tiers(number_of_users, payment),
        BusinessFunction::Contacts => contacts_tiers(),
    }
}

pub fn functions_for(capability: Capability) -> Vec<BusinessFunction> {
    match capability {
        Capability::PaymentsApprovals => {
            PaymentFunction::ALL.into_iter().map(BusinessFunction::Payment).collect()
        }
        Capability::ContactsApprovals => vec![BusinessFunction::Contacts],
    }
}

pub fn plan_assignment(
    context: &ProvisioningContext,
    target: &LegalEntityTarget,
    function: BusinessFunction,
) -> PolicyAssignment {
    let bounded_policies = tiers_for(function, target.number_of_users)
        .into_iter()
        .map(|tier| BoundedPolicy {
            policy_id: context.policy_id(tier.chain).clone(),
            upper_bound: tier.upper_bound,
        })
        .collect();

    PolicyAssignment {
        external_service_agreement_id: target.external_service_agreement_id.clone(),
        external_legal_entity_id: target.external_legal_entity_id.clone(),
        function,
        bounded_policies,
    }
}

/// One assignment per function of the capability, in function order.
pub fn plan_capability(
    context: &ProvisioningContext,
    target: &LegalEntityTarget,
    capability: Capability,
) -> Vec<PolicyAssignment> {
    functions_for(capability)
        .into_iter()
        .map(|function| plan_assignment(context, target, function))
        .collect()
}
