pub mod config;
pub mod domain;
pub mod errors;
pub mod planner;
pub mod provisioning;
pub mod remote;

pub use domain::approval::{ApprovalLevel, ApprovalType, ApprovalTypeId, NewApprovalType};
pub use domain::assignment::{
    ApprovalTypeAssignment, BoundedPolicy, CurrencyBound, FunctionGroupId, PolicyAssignment,
};
pub use domain::function::{currency_for, BusinessFunction, CurrencyCode, PaymentFunction, Resource};
pub use domain::legal_entity::{parse_targets, LegalEntityTarget};
pub use domain::policy::{ApprovalChain, PolicyDefinition, PolicyId, PolicyItem};
pub use errors::{DomainError, ProvisioningError, RemoteError};
pub use provisioning::context::ProvisioningContext;
pub use provisioning::plan::{Capabilities, Capability, ProvisioningPlan, ProvisioningStep};
pub use provisioning::report::{EntityOutcome, EntityStage, EntityStatus, RunReport};
pub use provisioning::{ApprovalsProvisioner, ProvisionerSettings};
pub use remote::{ApprovalService, FunctionGroupResolver, SessionProvider};
