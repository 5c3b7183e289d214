//! In-memory adapters for dry runs and tests.
//!
//! They honour the same contracts as the HTTP adapters, hand out sequential
//! ids and record every request so callers can inspect what a run would send.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use fuel_core::domain::approval::{ApprovalLevel, ApprovalTypeId, NewApprovalType};
use fuel_core::domain::assignment::{ApprovalTypeAssignment, FunctionGroupId, PolicyAssignment};
use fuel_core::domain::policy::{PolicyDefinition, PolicyId};
use fuel_core::errors::RemoteError;
use fuel_core::remote::{ApprovalService, FunctionGroupResolver, SessionProvider};
use secrecy::SecretString;
use serde::Serialize;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Every request an [`InMemoryApprovalService`] accepted, in arrival order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RecordedCalls {
    pub approval_types: Vec<NewApprovalType>,
    pub policies: Vec<PolicyDefinition>,
    pub approval_type_links: Vec<Vec<ApprovalTypeAssignment>>,
    pub bulk_policy_assignments: Vec<Vec<PolicyAssignment>>,
    pub single_policy_assignments: Vec<PolicyAssignment>,
}

impl RecordedCalls {
    pub fn policy_assignment_count(&self) -> usize {
        self.bulk_policy_assignments.iter().map(Vec::len).sum::<usize>()
            + self.single_policy_assignments.len()
    }
}

#[derive(Default)]
pub struct InMemoryApprovalService {
    calls: Mutex<RecordedCalls>,
    next_id: AtomicUsize,
    failures: Mutex<HashMap<&'static str, u16>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl InMemoryApprovalService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call, which makes overlapping entity work observable.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every later call of `operation` answer with `status`.
    pub fn fail_on(&self, operation: &'static str, status: u16) {
        lock(&self.failures).insert(operation, status);
    }

    pub fn recorded(&self) -> RecordedCalls {
        lock(&self.calls).clone()
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(
        &self,
        operation: &'static str,
        expected: u16,
    ) -> Result<InFlight<'_>, RemoteError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let injected = lock(&self.failures).get(operation).copied();
        match injected {
            Some(actual) => Err(RemoteError::UnexpectedStatus {
                operation,
                expected,
                actual,
                body: "injected failure".to_string(),
            }),
            None => Ok(guard),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ApprovalService for InMemoryApprovalService {
    async fn create_approval_type(
        &self,
        approval_type: &NewApprovalType,
    ) -> Result<ApprovalTypeId, RemoteError> {
        let _call = self.enter("create_approval_type", 201).await?;
        lock(&self.calls).approval_types.push(approval_type.clone());
        Ok(ApprovalTypeId(self.next_id("approval-type")))
    }

    async fn create_policy(&self, policy: &PolicyDefinition) -> Result<PolicyId, RemoteError> {
        let _call = self.enter("create_policy", 201).await?;
        lock(&self.calls).policies.push(policy.clone());
        Ok(PolicyId(self.next_id("policy")))
    }

    async fn assign_approval_types(
        &self,
        assignments: &[ApprovalTypeAssignment],
    ) -> Result<(), RemoteError> {
        let _call = self.enter("assign_approval_types", 200).await?;
        lock(&self.calls).approval_type_links.push(assignments.to_vec());
        Ok(())
    }

    async fn assign_policies(&self, assignments: &[PolicyAssignment]) -> Result<(), RemoteError> {
        let _call = self.enter("assign_policies", 204).await?;
        lock(&self.calls).bulk_policy_assignments.push(assignments.to_vec());
        Ok(())
    }

    async fn assign_policy(&self, assignment: &PolicyAssignment) -> Result<(), RemoteError> {
        let _call = self.enter("assign_policy", 201).await?;
        lock(&self.calls).single_policy_assignments.push(assignment.clone());
        Ok(())
    }
}

/// Function groups keyed by (service agreement, level). In synthetic mode every
/// lookup succeeds with an id derived from its key.
#[derive(Default)]
pub struct InMemoryFunctionGroupResolver {
    groups: HashMap<(String, ApprovalLevel), FunctionGroupId>,
    synthetic: bool,
    lookups: Mutex<Vec<(ApprovalLevel, String)>>,
}

impl InMemoryFunctionGroupResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn synthetic() -> Self {
        Self { synthetic: true, ..Self::default() }
    }

    pub fn with_group(
        mut self,
        external_service_agreement_id: impl Into<String>,
        level: ApprovalLevel,
        function_group_id: impl Into<String>,
    ) -> Self {
        self.groups.insert(
            (external_service_agreement_id.into(), level),
            FunctionGroupId(function_group_id.into()),
        );
        self
    }

    /// Registers A, B and C groups for a service agreement.
    pub fn with_all_levels(self, external_service_agreement_id: &str) -> Self {
        ApprovalLevel::ALL.into_iter().fold(self, |resolver, level| {
            let id = format!("fg-{external_service_agreement_id}-{level}");
            resolver.with_group(external_service_agreement_id, level, id)
        })
    }

    pub fn lookups(&self) -> Vec<(ApprovalLevel, String)> {
        lock(&self.lookups).clone()
    }
}

#[async_trait]
impl FunctionGroupResolver for InMemoryFunctionGroupResolver {
    async fn find_function_group_id(
        &self,
        level: ApprovalLevel,
        external_service_agreement_id: &str,
    ) -> Result<Option<FunctionGroupId>, RemoteError> {
        lock(&self.lookups).push((level, external_service_agreement_id.to_string()));

        if self.synthetic {
            return Ok(Some(FunctionGroupId(format!("fg-{external_service_agreement_id}-{level}"))));
        }

        Ok(self.groups.get(&(external_service_agreement_id.to_string(), level)).cloned())
    }
}

#[derive(Default)]
pub struct InMemorySessionProvider {
    reject_login: bool,
    logins: Mutex<Vec<String>>,
    master_context_selections: AtomicUsize,
}

impl InMemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every login answers `401 Unauthorized`.
    pub fn rejecting() -> Self {
        Self { reject_login: true, ..Self::default() }
    }

    pub fn logins(&self) -> Vec<String> {
        lock(&self.logins).clone()
    }

    pub fn master_context_selections(&self) -> usize {
        self.master_context_selections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for InMemorySessionProvider {
    async fn login(&self, username: &str, _password: &SecretString) -> Result<(), RemoteError> {
        if self.reject_login {
            return Err(RemoteError::UnexpectedStatus {
                operation: "login",
                expected: 200,
                actual: 401,
                body: "invalid credentials".to_string(),
            });
        }

        lock(&self.logins).push(username.to_string());
        Ok(())
    }

    async fn select_master_context(&self) -> Result<(), RemoteError> {
        self.master_context_selections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
