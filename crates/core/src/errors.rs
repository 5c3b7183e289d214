use thiserror::Error;

use crate::domain::approval::ApprovalLevel;
use crate::provisioning::plan::Capability;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("policy item for approval type `{approval_type_id}` must require at least one approval")]
    ZeroApprovalCount { approval_type_id: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failure of a single remote call. Bulk calls report one error for the whole
/// batch; the wire protocol carries no per-item status.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{operation} expected HTTP {expected} but got HTTP {actual}: {body}")]
    UnexpectedStatus { operation: &'static str, expected: u16, actual: u16, body: String },
    #[error("{operation} transport failure: {message}")]
    Transport { operation: &'static str, message: String },
    #[error("{operation} returned an unreadable body: {message}")]
    Decode { operation: &'static str, message: String },
    #[error("{operation} requires an authenticated session")]
    NotAuthenticated { operation: &'static str },
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::UnexpectedStatus { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Decode { operation, .. }
            | Self::NotAuthenticated { operation } => operation,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("failed to create {what}: {source}")]
    Creation { what: String, source: RemoteError },
    #[error(
        "no function group found for approval level {level} in service agreement `{external_service_agreement_id}`"
    )]
    Resolution { level: ApprovalLevel, external_service_agreement_id: String },
    #[error("function group lookup for approval level {level} failed: {source}")]
    Lookup { level: ApprovalLevel, source: RemoteError },
    #[error("failed to link approval types to function groups: {source}")]
    Linking { source: RemoteError },
    #[error("failed to assign {capability} policies: {source}")]
    Assignment { capability: Capability, source: RemoteError },
    #[error("session setup failed: {source}")]
    Session { source: RemoteError },
    #[error("approval types and policies were already created in this run")]
    AlreadyProvisioned,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ProvisioningError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Creation { .. } => "creation_failure",
            Self::Resolution { .. } | Self::Lookup { .. } => "resolution_failure",
            Self::Linking { .. } => "linking_failure",
            Self::Assignment { .. } => "assignment_failure",
            Self::Session { .. } => "session_failure",
            Self::AlreadyProvisioned => "already_provisioned",
            Self::Domain(_) => "domain_validation",
        }
    }

    /// Remote failure behind this error, if any.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Creation { source, .. }
            | Self::Lookup { source, .. }
            | Self::Linking { source }
            | Self::Assignment { source, .. }
            | Self::Session { source } => Some(source),
            Self::Resolution { .. } | Self::AlreadyProvisioned | Self::Domain(_) => None,
        }
    }
}
