//! Approval provisioning orchestration.
//!
//! A run logs in as the root entitlements admin, creates the approval types and
//! policies once, then links function groups and assigns policies for every
//! legal entity. Nothing is retried and nothing created is rolled back.

pub mod context;
pub mod dispatch;
pub mod linker;
pub mod plan;
pub mod registry;
pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::approval::{ApprovalLevel, NewApprovalType};
use crate::domain::legal_entity::LegalEntityTarget;
use crate::errors::ProvisioningError;
use crate::planner;
use crate::remote::{ApprovalService, FunctionGroupResolver, SessionProvider};

use self::context::ProvisioningContext;
use self::dispatch::PolicyAssignmentDispatcher;
use self::linker::FunctionGroupLinker;
use self::plan::{Capabilities, ProvisioningPlan, ProvisioningStep};
use self::registry::{ApprovalTypeRegistry, PolicyBuilder};
use self::report::{EntityOutcome, EntityStage, RunReport};

#[derive(Clone, Debug)]
pub struct ProvisionerSettings {
    pub admin_username: String,
    pub admin_password: SecretString,
    pub capabilities: Capabilities,
    pub max_concurrency: usize,
    pub continue_on_error: bool,
}

impl ProvisionerSettings {
    pub fn new(admin_username: impl Into<String>, admin_password: SecretString) -> Self {
        Self {
            admin_username: admin_username.into(),
            admin_password,
            capabilities: Capabilities::all(),
            max_concurrency: 1,
            continue_on_error: true,
        }
    }
}

impl From<&AppConfig> for ProvisionerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            admin_username: config.admin.username.clone(),
            admin_password: config.admin.password(),
            capabilities: Capabilities::from(&config.capabilities),
            max_concurrency: config.provisioning.max_concurrency,
            continue_on_error: config.provisioning.continue_on_error,
        }
    }
}

/// Failure of one legal entity, tagged with the last stage it completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityFailure {
    pub stage: EntityStage,
    pub error: ProvisioningError,
}

#[derive(Clone)]
struct EntityWorker {
    linker: FunctionGroupLinker,
    dispatcher: PolicyAssignmentDispatcher,
    plan: ProvisioningPlan,
}

impl EntityWorker {
    async fn provision(
        &self,
        context: &ProvisioningContext,
        target: &LegalEntityTarget,
    ) -> Result<(), EntityFailure> {
        let mut stage = EntityStage::TypesAndPoliciesReady;

        for step in self.plan.steps() {
            let result = match *step {
                ProvisioningStep::LinkFunctionGroups => {
                    self.linker.link(context, &target.external_service_agreement_id).await
                }
                ProvisioningStep::AssignPolicies(capability) => {
                    let assignments = planner::plan_capability(context, target, capability);
                    self.dispatcher.submit(capability, &assignments).await
                }
            };

            result.map_err(|error| EntityFailure { stage, error })?;
            stage = EntityStage::after(*step);
        }

        Ok(())
    }
}

enum PendingEntity {
    NotAttempted(LegalEntityTarget),
    Spawned(LegalEntityTarget, JoinHandle<EntityOutcome>),
}

pub struct ApprovalsProvisioner {
    session: Arc<dyn SessionProvider>,
    registry: ApprovalTypeRegistry,
    policies: PolicyBuilder,
    worker: EntityWorker,
    settings: ProvisionerSettings,
    setup_claimed: AtomicBool,
}

impl ApprovalsProvisioner {
    pub fn new(
        approvals: Arc<dyn ApprovalService>,
        function_groups: Arc<dyn FunctionGroupResolver>,
        session: Arc<dyn SessionProvider>,
        settings: ProvisionerSettings,
    ) -> Self {
        let plan = ProvisioningPlan::resolve(settings.capabilities);

        Self {
            session,
            registry: ApprovalTypeRegistry::new(Arc::clone(&approvals)),
            policies: PolicyBuilder::new(Arc::clone(&approvals)),
            worker: EntityWorker {
                linker: FunctionGroupLinker::new(Arc::clone(&approvals), function_groups),
                dispatcher: PolicyAssignmentDispatcher::new(approvals),
                plan,
            },
            settings,
            setup_claimed: AtomicBool::new(false),
        }
    }

    pub fn plan(&self) -> &ProvisioningPlan {
        &self.worker.plan
    }

    pub fn settings(&self) -> &ProvisionerSettings {
        &self.settings
    }

    pub async fn open_session(&self) -> Result<(), ProvisioningError> {
        self.session
            .login(&self.settings.admin_username, &self.settings.admin_password)
            .await
            .map_err(|source| ProvisioningError::Session { source })?;
        self.session
            .select_master_context()
            .await
            .map_err(|source| ProvisioningError::Session { source })?;

        info!(
            event_name = "identity.session.opened",
            username = %self.settings.admin_username,
            "logged in and switched to master service agreement"
        );
        Ok(())
    }

    /// Creates approval types A, B, C and the four policies. Callable once per
    /// provisioner; later calls fail with `AlreadyProvisioned` before any remote call.
    pub async fn setup_approval_types_and_policies(
        &self,
    ) -> Result<Arc<ProvisioningContext>, ProvisioningError> {
        if self.setup_claimed.swap(true, Ordering::SeqCst) {
            return Err(ProvisioningError::AlreadyProvisioned);
        }

        let requests = {
            let mut rng = rand::thread_rng();
            ApprovalLevel::ALL.map(|level| NewApprovalType::with_random_rank(level, &mut rng))
        };

        let approval_types = self.registry.create_all(&requests).await?;
        let policies = self.policies.create_all(&approval_types).await?;

        info!(
            event_name = "approvals.setup.completed",
            approval_types = ApprovalLevel::ALL.len(),
            policies = 4,
            "approval types and policies created"
        );
        Ok(Arc::new(ProvisioningContext::new(approval_types, policies)))
    }

    pub async fn setup_access_control_and_perform_approval_assignments(
        &self,
        context: &ProvisioningContext,
        external_service_agreement_id: &str,
        external_legal_entity_id: &str,
        number_of_users: u32,
    ) -> Result<(), ProvisioningError> {
        let target = LegalEntityTarget::new(
            external_service_agreement_id,
            external_legal_entity_id,
            number_of_users,
        );

        self.worker.provision(context, &target).await.map_err(|failure| failure.error)
    }

    /// Full run. Session and setup failures abort the run; entity failures are
    /// recorded in the report.
    pub async fn run(
        &self,
        entities: Vec<LegalEntityTarget>,
    ) -> Result<RunReport, ProvisioningError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        if self.plan().is_empty() {
            info!(
                event_name = "approvals.run.skipped",
                correlation_id = %run_id,
                "no approval capability enabled; skipping approvals provisioning"
            );
            return Ok(RunReport {
                run_id,
                started_at,
                finished_at: Utc::now(),
                skipped: true,
                context: None,
                entities: Vec::new(),
            });
        }

        info!(
            event_name = "approvals.run.started",
            correlation_id = %run_id,
            entities = entities.len(),
            max_concurrency = self.settings.max_concurrency,
            "approvals provisioning started"
        );

        self.open_session().await?;
        let context = self.setup_approval_types_and_policies().await?;
        let outcomes = self.provision_entities(run_id, &context, entities).await;

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            skipped: false,
            context: Some(context.as_ref().clone()),
            entities: outcomes,
        };

        info!(
            event_name = "approvals.run.finished",
            correlation_id = %run_id,
            provisioned = report.provisioned(),
            failed = report.failed(),
            not_attempted = report.not_attempted(),
            "approvals provisioning finished"
        );
        Ok(report)
    }

    async fn provision_entities(
        &self,
        run_id: Uuid,
        context: &Arc<ProvisioningContext>,
        entities: Vec<LegalEntityTarget>,
    ) -> Vec<EntityOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let halted = Arc::new(AtomicBool::new(false));
        let mut pending = Vec::with_capacity(entities.len());

        for target in entities {
            // Waiting for a permit before spawning keeps max_concurrency = 1 strictly sequential.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) if !halted.load(Ordering::SeqCst) => permit,
                _ => {
                    pending.push(PendingEntity::NotAttempted(target));
                    continue;
                }
            };

            let worker = self.worker.clone();
            let context = Arc::clone(context);
            let halted = Arc::clone(&halted);
            let continue_on_error = self.settings.continue_on_error;
            let task_target = target.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match worker.provision(&context, &task_target).await {
                    Ok(()) => {
                        info!(
                            event_name = "approvals.entity.provisioned",
                            correlation_id = %run_id,
                            external_service_agreement_id = %task_target.external_service_agreement_id,
                            external_legal_entity_id = %task_target.external_legal_entity_id,
                            "legal entity provisioned"
                        );
                        EntityOutcome::provisioned(&task_target)
                    }
                    Err(failure) => {
                        if !continue_on_error {
                            halted.store(true, Ordering::SeqCst);
                        }
                        warn!(
                            event_name = "approvals.entity.failed",
                            correlation_id = %run_id,
                            external_service_agreement_id = %task_target.external_service_agreement_id,
                            external_legal_entity_id = %task_target.external_legal_entity_id,
                            stage = ?failure.stage,
                            error_class = failure.error.error_class(),
                            error = %failure.error,
                            "legal entity provisioning failed"
                        );
                        EntityOutcome::failed(&task_target, failure.stage, &failure.error)
                    }
                }
            });
            pending.push(PendingEntity::Spawned(target, handle));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for entry in pending {
            let outcome = match entry {
                PendingEntity::NotAttempted(target) => EntityOutcome::not_attempted(&target),
                PendingEntity::Spawned(target, handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(join_error) => {
                        warn!(
                            event_name = "approvals.entity.task_failed",
                            correlation_id = %run_id,
                            external_legal_entity_id = %target.external_legal_entity_id,
                            error = %join_error,
                            "legal entity task did not complete"
                        );
                        EntityOutcome::task_failed(&target, join_error.to_string())
                    }
                },
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}
