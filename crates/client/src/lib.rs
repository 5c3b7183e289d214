pub mod access_group;
pub mod approvals;
mod http;
pub mod identity;
pub mod memory;
pub mod session;

use std::sync::Arc;

use fuel_core::config::AppConfig;
use fuel_core::errors::RemoteError;
use tracing::debug;

pub use access_group::AccessGroupFunctionGroupResolver;
pub use approvals::ApprovalIntegrationClient;
pub use identity::HttpSessionProvider;
pub use memory::{
    InMemoryApprovalService, InMemoryFunctionGroupResolver, InMemorySessionProvider, RecordedCalls,
};
pub use session::SessionHandle;

/// HTTP adapters of one run. They share a single connection pool and session.
#[derive(Clone)]
pub struct HttpAdapters {
    pub approvals: Arc<ApprovalIntegrationClient>,
    pub function_groups: Arc<AccessGroupFunctionGroupResolver>,
    pub session: Arc<HttpSessionProvider>,
}

impl HttpAdapters {
    pub fn from_config(config: &AppConfig) -> Result<Self, RemoteError> {
        let http = http::build_client(config.http.timeout_secs)?;
        let session = SessionHandle::new();

        Ok(Self {
            approvals: Arc::new(ApprovalIntegrationClient::new(
                http.clone(),
                config.approvals.base_url.clone(),
                session.clone(),
            )),
            function_groups: Arc::new(AccessGroupFunctionGroupResolver::new(
                http.clone(),
                config.access_control.base_url.clone(),
                session.clone(),
                config.function_groups.clone(),
            )),
            session: Arc::new(HttpSessionProvider::new(
                http,
                config.identity.base_url.clone(),
                config.access_control.base_url.clone(),
                session,
            )),
        })
    }
}

/// Sends a bare GET to `base_url` and returns whatever status comes back. Any
/// HTTP answer, 404 included, means the service is reachable.
pub async fn probe_endpoint(timeout_secs: u64, base_url: &str) -> Result<u16, RemoteError> {
    const OPERATION: &str = "probe_endpoint";
    let http = http::build_client(timeout_secs)?;
    let response =
        http.get(base_url).send().await.map_err(|error| http::transport(OPERATION, error))?;

    let status = response.status().as_u16();
    debug!(operation = OPERATION, base_url, status, "endpoint answered");
    Ok(status)
}
