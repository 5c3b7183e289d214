//! Contracts of the remote services the provisioning engine drives.
//!
//! Implementations enforce the expected HTTP status of each call and report
//! anything else as [`RemoteError`]. None of them retries.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::approval::{ApprovalLevel, ApprovalTypeId, NewApprovalType};
use crate::domain::assignment::{ApprovalTypeAssignment, FunctionGroupId, PolicyAssignment};
use crate::domain::policy::{PolicyDefinition, PolicyId};
use crate::errors::RemoteError;

#[async_trait]
pub trait ApprovalService: Send + Sync {
    /// Expects `201 Created`. Not idempotent: every call creates a new record.
    async fn create_approval_type(
        &self,
        approval_type: &NewApprovalType,
    ) -> Result<ApprovalTypeId, RemoteError>;

    /// Expects `201 Created`.
    async fn create_policy(&self, policy: &PolicyDefinition) -> Result<PolicyId, RemoteError>;

    /// Expects `200 OK`.
    async fn assign_approval_types(
        &self,
        assignments: &[ApprovalTypeAssignment],
    ) -> Result<(), RemoteError>;

    /// Bulk submission, expects `204 No Content`. All-or-nothing as reported by the service.
    async fn assign_policies(&self, assignments: &[PolicyAssignment]) -> Result<(), RemoteError>;

    /// Single submission, expects `201 Created`.
    async fn assign_policy(&self, assignment: &PolicyAssignment) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait FunctionGroupResolver: Send + Sync {
    /// `Ok(None)` when the service agreement has no function group for `level`.
    async fn find_function_group_id(
        &self,
        level: ApprovalLevel,
        external_service_agreement_id: &str,
    ) -> Result<Option<FunctionGroupId>, RemoteError>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn login(&self, username: &str, password: &SecretString) -> Result<(), RemoteError>;

    /// Switches the authenticated session to the master service agreement scope.
    async fn select_master_context(&self) -> Result<(), RemoteError>;
}
