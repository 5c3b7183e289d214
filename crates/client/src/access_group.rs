use async_trait::async_trait;
use fuel_core::config::FunctionGroupsConfig;
use fuel_core::domain::approval::ApprovalLevel;
use fuel_core::domain::assignment::FunctionGroupId;
use fuel_core::errors::RemoteError;
use fuel_core::remote::FunctionGroupResolver;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::http::{decode_json, expect_status, join_url, transport};
use crate::session::SessionHandle;

const FUNCTION_GROUPS: &str = "/accessgroups/function-groups";

/// Finds a service agreement's function group for an approval level by the
/// function-group name configured for that level.
#[derive(Clone)]
pub struct AccessGroupFunctionGroupResolver {
    http: Client,
    base_url: String,
    session: SessionHandle,
    names: FunctionGroupsConfig,
}

impl AccessGroupFunctionGroupResolver {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        session: SessionHandle,
        names: FunctionGroupsConfig,
    ) -> Self {
        Self { http, base_url: base_url.into(), session, names }
    }
}

#[async_trait]
impl FunctionGroupResolver for AccessGroupFunctionGroupResolver {
    async fn find_function_group_id(
        &self,
        level: ApprovalLevel,
        external_service_agreement_id: &str,
    ) -> Result<Option<FunctionGroupId>, RemoteError> {
        const OPERATION: &str = "list_function_groups";
        let url = join_url(&self.base_url, FUNCTION_GROUPS);
        let request = self
            .session
            .authorize(
                OPERATION,
                self.http.get(url).query(&[("serviceAgreementId", external_service_agreement_id)]),
            )
            .await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        let response = expect_status(OPERATION, response, StatusCode::OK).await?;
        let groups: Vec<FunctionGroupSummary> = decode_json(OPERATION, response).await?;

        let wanted = self.names.name_for(level);
        let found = groups.into_iter().find(|group| group.name == wanted);

        debug!(
            operation = OPERATION,
            level = level.as_str(),
            function_group_name = wanted,
            external_service_agreement_id,
            found = found.is_some(),
            "function group lookup"
        );
        Ok(found.map(|group| FunctionGroupId(group.id)))
    }
}

#[derive(Debug, Deserialize)]
struct FunctionGroupSummary {
    id: String,
    name: String,
}
