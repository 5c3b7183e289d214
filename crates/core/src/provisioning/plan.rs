use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CapabilitiesConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    PaymentsApprovals,
    ContactsApprovals,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PaymentsApprovals => "payments",
            Self::ContactsApprovals => "contacts",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub approvals_for_payments: bool,
    pub approvals_for_contacts: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self { approvals_for_payments: true, approvals_for_contacts: true }
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::PaymentsApprovals => self.approvals_for_payments,
            Capability::ContactsApprovals => self.approvals_for_contacts,
        }
    }
}

impl From<&CapabilitiesConfig> for Capabilities {
    fn from(config: &CapabilitiesConfig) -> Self {
        Self {
            approvals_for_payments: config.approvals_for_payments,
            approvals_for_contacts: config.approvals_for_contacts,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    LinkFunctionGroups,
    AssignPolicies(Capability),
}

/// Steps every legal entity goes through, resolved once from the enabled capabilities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProvisioningPlan {
    steps: Vec<ProvisioningStep>,
}

impl ProvisioningPlan {
    pub fn resolve(capabilities: Capabilities) -> Self {
        let assignments = [Capability::PaymentsApprovals, Capability::ContactsApprovals]
            .into_iter()
            .filter(|capability| capabilities.is_enabled(*capability))
            .map(ProvisioningStep::AssignPolicies)
            .collect::<Vec<_>>();

        if assignments.is_empty() {
            return Self { steps: Vec::new() };
        }

        let mut steps = Vec::with_capacity(assignments.len() + 1);
        steps.push(ProvisioningStep::LinkFunctionGroups);
        steps.extend(assignments);
        Self { steps }
    }

    pub fn steps(&self) -> &[ProvisioningStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Capabilities, Capability, ProvisioningPlan, ProvisioningStep};

    #[test]
    fn both_capabilities_link_then_assign_payments_then_contacts() {
        let plan = ProvisioningPlan::resolve(Capabilities::all());

        assert_eq!(
            plan.steps(),
            &[
                ProvisioningStep::LinkFunctionGroups,
                ProvisioningStep::AssignPolicies(Capability::PaymentsApprovals),
                ProvisioningStep::AssignPolicies(Capability::ContactsApprovals),
            ]
        );
    }

    #[test]
    fn contacts_only_still_links_function_groups() {
        let plan = ProvisioningPlan::resolve(Capabilities {
            approvals_for_payments: false,
            approvals_for_contacts: true,
        });

        assert_eq!(
            plan.steps(),
            &[
                ProvisioningStep::LinkFunctionGroups,
                ProvisioningStep::AssignPolicies(Capability::ContactsApprovals),
            ]
        );
    }

    #[test]
    fn nothing_enabled_resolves_to_empty_plan() {
        let plan = ProvisioningPlan::resolve(Capabilities::default());
        assert!(plan.is_empty());
    }
}
