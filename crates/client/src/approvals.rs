//! Approval integration service client.
//!
//! Creation endpoints answer `201`, approval-type linking and deletions `200`,
//! bulk policy assignment `204`. Any other status is returned as
//! [`RemoteError::UnexpectedStatus`] with the response body.

use async_trait::async_trait;
use fuel_core::domain::approval::{ApprovalTypeId, NewApprovalType};
use fuel_core::domain::assignment::{ApprovalTypeAssignment, BoundedPolicy, PolicyAssignment};
use fuel_core::domain::function::BusinessFunction;
use fuel_core::domain::policy::{PolicyDefinition, PolicyId};
use fuel_core::errors::RemoteError;
use fuel_core::remote::ApprovalService;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{decode_json, expect_status, join_url, transport};
use crate::session::SessionHandle;

const APPROVAL_TYPES: &str = "/approval-types";
const APPROVAL_TYPE_ASSIGNMENTS: &str = "/approval-type-assignments";
const APPROVAL_TYPE_ASSIGNMENTS_BULK: &str = "/approval-type-assignments/bulk";
const POLICIES: &str = "/policies";
const POLICY_ASSIGNMENTS: &str = "/policy-assignments";
const POLICY_ASSIGNMENTS_BULK: &str = "/policy-assignments/bulk";

#[derive(Clone)]
pub struct ApprovalIntegrationClient {
    http: Client,
    base_url: String,
    session: SessionHandle,
}

impl ApprovalIntegrationClient {
    pub fn new(http: Client, base_url: impl Into<String>, session: SessionHandle) -> Self {
        Self { http, base_url: base_url.into(), session }
    }

    pub async fn delete_approval_type(&self, id: &ApprovalTypeId) -> Result<(), RemoteError> {
        const OPERATION: &str = "delete_approval_type";
        let url = join_url(&self.base_url, &format!("{APPROVAL_TYPES}/{}", id.0));
        let request = self.session.authorize(OPERATION, self.http.delete(url)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        expect_status(OPERATION, response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn delete_approval_type_assignment(
        &self,
        job_profile_id: &str,
    ) -> Result<(), RemoteError> {
        const OPERATION: &str = "delete_approval_type_assignment";
        let url = join_url(&self.base_url, &format!("{APPROVAL_TYPE_ASSIGNMENTS}/{job_profile_id}"));
        let request = self.session.authorize(OPERATION, self.http.delete(url)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        expect_status(OPERATION, response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn delete_policy(&self, id: &PolicyId) -> Result<(), RemoteError> {
        const OPERATION: &str = "delete_policy";
        let url = join_url(&self.base_url, &format!("{POLICIES}/{}", id.0));
        let request = self.session.authorize(OPERATION, self.http.delete(url)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        expect_status(OPERATION, response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn delete_policy_assignment(
        &self,
        external_service_agreement_id: &str,
        external_legal_entity_id: &str,
        function: BusinessFunction,
    ) -> Result<(), RemoteError> {
        const OPERATION: &str = "delete_policy_assignment";
        let body = DeletePolicyAssignmentRequest {
            external_service_agreement_id,
            external_legal_entity_id,
            resource: function.resource().as_str(),
            function: function.name(),
        };
        let url = join_url(&self.base_url, POLICY_ASSIGNMENTS);
        let request = self.session.authorize(OPERATION, self.http.delete(url).json(&body)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        expect_status(OPERATION, response, StatusCode::OK).await?;
        Ok(())
    }
}

#[async_trait]
impl ApprovalService for ApprovalIntegrationClient {
    async fn create_approval_type(
        &self,
        approval_type: &NewApprovalType,
    ) -> Result<ApprovalTypeId, RemoteError> {
        const OPERATION: &str = "create_approval_type";
        let body = ApprovalTypeRequest {
            name: approval_type.name(),
            description: approval_type.description(),
            rank: approval_type.rank,
        };
        let url = join_url(&self.base_url, APPROVAL_TYPES);
        let request = self.session.authorize(OPERATION, self.http.post(url).json(&body)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        let response = expect_status(OPERATION, response, StatusCode::CREATED).await?;
        let created: ApprovalTypeCreated = decode_json(OPERATION, response).await?;

        debug!(operation = OPERATION, id = %created.approval_type.id, "approval type accepted");
        Ok(ApprovalTypeId(created.approval_type.id))
    }

    async fn create_policy(&self, policy: &PolicyDefinition) -> Result<PolicyId, RemoteError> {
        const OPERATION: &str = "create_policy";
        let body = PolicyRequest {
            name: policy.name(),
            description: policy.description(),
            items: policy
                .items()
                .iter()
                .map(|item| PolicyItemDto {
                    approval_type_id: &item.approval_type_id().0,
                    number_of_approvals: item.required_approval_count(),
                })
                .collect(),
        };
        let url = join_url(&self.base_url, POLICIES);
        let request = self.session.authorize(OPERATION, self.http.post(url).json(&body)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        let response = expect_status(OPERATION, response, StatusCode::CREATED).await?;
        let created: PolicyCreated = decode_json(OPERATION, response).await?;

        debug!(operation = OPERATION, id = %created.policy.id, "policy accepted");
        Ok(PolicyId(created.policy.id))
    }

    async fn assign_approval_types(
        &self,
        assignments: &[ApprovalTypeAssignment],
    ) -> Result<(), RemoteError> {
        const OPERATION: &str = "assign_approval_types";
        let body = ApprovalTypeAssignmentsRequest {
            approval_type_assignments: assignments
                .iter()
                .map(|assignment| ApprovalTypeAssignmentDto {
                    approval_type_id: &assignment.approval_type_id.0,
                    job_profile_id: &assignment.function_group_id.0,
                })
                .collect(),
        };
        let url = join_url(&self.base_url, APPROVAL_TYPE_ASSIGNMENTS_BULK);
        let request = self.session.authorize(OPERATION, self.http.post(url).json(&body)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        expect_status(OPERATION, response, StatusCode::OK).await?;
        Ok(())
    }

    async fn assign_policies(&self, assignments: &[PolicyAssignment]) -> Result<(), RemoteError> {
        const OPERATION: &str = "assign_policies";
        let body = PolicyAssignmentsRequest {
            policy_assignments: assignments.iter().map(PolicyAssignmentDto::from).collect(),
        };
        let url = join_url(&self.base_url, POLICY_ASSIGNMENTS_BULK);
        let request = self.session.authorize(OPERATION, self.http.post(url).json(&body)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        expect_status(OPERATION, response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    async fn assign_policy(&self, assignment: &PolicyAssignment) -> Result<(), RemoteError> {
        const OPERATION: &str = "assign_policy";
        let body = PolicyAssignmentDto::from(assignment);
        let url = join_url(&self.base_url, POLICY_ASSIGNMENTS);
        let request = self.session.authorize(OPERATION, self.http.post(url).json(&body)).await?;

        let response = request.send().await.map_err(|error| transport(OPERATION, error))?;
        expect_status(OPERATION, response, StatusCode::CREATED).await?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalTypeRequest<'a> {
    name: &'a str,
    description: String,
    rank: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyRequest<'a> {
    name: &'a str,
    description: String,
    items: Vec<PolicyItemDto<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyItemDto<'a> {
    approval_type_id: &'a str,
    number_of_approvals: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalTypeAssignmentsRequest<'a> {
    approval_type_assignments: Vec<ApprovalTypeAssignmentDto<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalTypeAssignmentDto<'a> {
    approval_type_id: &'a str,
    job_profile_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyAssignmentsRequest<'a> {
    policy_assignments: Vec<PolicyAssignmentDto<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyAssignmentDto<'a> {
    external_service_agreement_id: &'a str,
    external_legal_entity_id: &'a str,
    resource: &'static str,
    functions: [&'static str; 1],
    bounds: Vec<BoundDto<'a>>,
}

impl<'a> From<&'a PolicyAssignment> for PolicyAssignmentDto<'a> {
    fn from(assignment: &'a PolicyAssignment) -> Self {
        Self {
            external_service_agreement_id: &assignment.external_service_agreement_id,
            external_legal_entity_id: &assignment.external_legal_entity_id,
            resource: assignment.resource_name(),
            functions: [assignment.function_name()],
            bounds: assignment.bounded_policies.iter().map(BoundDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundDto<'a> {
    policy_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    upper_bound: Option<CurrencyDto>,
}

impl<'a> From<&'a BoundedPolicy> for BoundDto<'a> {
    fn from(bounded: &'a BoundedPolicy) -> Self {
        Self {
            policy_id: &bounded.policy_id.0,
            upper_bound: bounded.upper_bound.as_ref().map(|bound| CurrencyDto {
                currency_code: bound.currency_code.as_str(),
                amount: bound.amount,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyDto {
    currency_code: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletePolicyAssignmentRequest<'a> {
    external_service_agreement_id: &'a str,
    external_legal_entity_id: &'a str,
    resource: &'static str,
    function: &'static str,
}

#[derive(Debug, Deserialize)]
struct Identified {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalTypeCreated {
    approval_type: Identified,
}

#[derive(Debug, Deserialize)]
struct PolicyCreated {
    policy: Identified,
}

#[cfg(test)]
mod tests {
    use fuel_core::domain::approval::{ApprovalLevel, ApprovalTypeId, NewApprovalType};
    use fuel_core::domain::assignment::{BoundedPolicy, CurrencyBound, PolicyAssignment};
    use fuel_core::domain::function::{BusinessFunction, CurrencyCode, PaymentFunction};
    use fuel_core::domain::policy::{PolicyDefinition, PolicyId, PolicyItem};
    use fuel_core::errors::RemoteError;
    use fuel_core::remote::ApprovalService;
    use reqwest::Client;
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::ApprovalIntegrationClient;
    use crate::session::SessionHandle;

    async fn authenticated_client(server: &MockServer) -> ApprovalIntegrationClient {
        let session = SessionHandle::new();
        session.store(SecretString::from("token-1")).await;
        ApprovalIntegrationClient::new(Client::new(), server.uri(), session)
    }

    fn sepa_assignment() -> PolicyAssignment {
        PolicyAssignment {
            external_service_agreement_id: "sa-1".to_string(),
            external_legal_entity_id: "le-1".to_string(),
            function: BusinessFunction::Payment(PaymentFunction::SepaCreditTransfer),
            bounded_policies: vec![
                BoundedPolicy {
                    policy_id: PolicyId("policy-zero".to_string()),
                    upper_bound: Some(CurrencyBound::new(CurrencyCode::Eur, Decimal::from(100))),
                },
                BoundedPolicy { policy_id: PolicyId("policy-abc".to_string()), upper_bound: None },
            ],
        }
    }

    #[tokio::test]
    async fn create_approval_type_reads_nested_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approval-types"))
            .and(header("Authorization", "Bearer token-1"))
            .and(body_json(json!({
                "name": "B",
                "description": "Approval type B",
                "rank": 150
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"approvalType": {"id": "at-b"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        let id = client
            .create_approval_type(&NewApprovalType { level: ApprovalLevel::B, rank: 150 })
            .await
            .expect("approval type created");

        assert_eq!(id, ApprovalTypeId("at-b".to_string()));
    }

    #[tokio::test]
    async fn create_approval_type_rejects_ok_instead_of_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approval-types"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"approvalType": {"id": "at-a"}})),
            )
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        let error = client
            .create_approval_type(&NewApprovalType { level: ApprovalLevel::A, rank: 5 })
            .await
            .expect_err("200 is not the expected status");

        assert_eq!(error.status(), Some(200));
        assert_eq!(error.operation(), "create_approval_type");
    }

    #[tokio::test]
    async fn zero_approval_policy_is_sent_with_empty_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/policies"))
            .and(body_json(json!({
                "name": "Zero approval",
                "description": "No approval required",
                "items": []
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"policy": {"id": "p-0"}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        let id = client
            .create_policy(&PolicyDefinition::zero_approval())
            .await
            .expect("policy created");

        assert_eq!(id, PolicyId("p-0".to_string()));
    }

    #[tokio::test]
    async fn policy_items_keep_escalation_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/policies"))
            .and(body_json(json!({
                "name": "A+B",
                "description": "A+B policy requiring 2 approval(s)",
                "items": [
                    {"approvalTypeId": "at-a", "numberOfApprovals": 1},
                    {"approvalTypeId": "at-b", "numberOfApprovals": 1}
                ]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"policy": {"id": "p-ab"}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        let policy = PolicyDefinition::new(
            "A+B",
            vec![
                PolicyItem::single(ApprovalTypeId("at-a".to_string())),
                PolicyItem::single(ApprovalTypeId("at-b".to_string())),
            ],
        );

        client.create_policy(&policy).await.expect("policy created");
    }

    #[tokio::test]
    async fn bulk_assignment_omits_unbounded_upper_bound() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/policy-assignments/bulk"))
            .and(body_json(json!({
                "policyAssignments": [{
                    "externalServiceAgreementId": "sa-1",
                    "externalLegalEntityId": "le-1",
                    "resource": "Payments",
                    "functions": ["SEPA CT"],
                    "bounds": [
                        {"policyId": "policy-zero", "upperBound": {"currencyCode": "EUR", "amount": 100.0}},
                        {"policyId": "policy-abc"}
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        client.assign_policies(&[sepa_assignment()]).await.expect("bulk accepted");
    }

    #[tokio::test]
    async fn bulk_assignment_surfaces_conflict_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/policy-assignments/bulk"))
            .respond_with(ResponseTemplate::new(409).set_body_string("assignment already exists"))
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        let error =
            client.assign_policies(&[sepa_assignment()]).await.expect_err("conflict is a failure");

        assert_eq!(
            error,
            RemoteError::UnexpectedStatus {
                operation: "assign_policies",
                expected: 204,
                actual: 409,
                body: "assignment already exists".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn single_assignment_expects_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/policy-assignments"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        client.assign_policy(&sepa_assignment()).await.expect("single assignment accepted");
    }

    #[tokio::test]
    async fn approval_type_links_expect_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approval-type-assignments/bulk"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        let error = client
            .assign_approval_types(&[])
            .await
            .expect_err("only 200 counts as success for linking");

        assert_eq!(error.status(), Some(201));
    }

    #[tokio::test]
    async fn deletions_expect_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/policies/p-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/policy-assignments"))
            .and(body_json(json!({
                "externalServiceAgreementId": "sa-1",
                "externalLegalEntityId": "le-1",
                "resource": "Contacts",
                "function": "Contacts"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/approval-types/at-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = authenticated_client(&server).await;
        client.delete_policy(&PolicyId("p-1".to_string())).await.expect("policy deleted");
        client
            .delete_policy_assignment("sa-1", "le-1", BusinessFunction::Contacts)
            .await
            .expect("assignment deleted");

        let error = client
            .delete_approval_type(&ApprovalTypeId("at-1".to_string()))
            .await
            .expect_err("missing approval type");
        assert_eq!(error.status(), Some(404));
    }

    #[tokio::test]
    async fn calls_without_login_are_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/policies"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApprovalIntegrationClient::new(Client::new(), server.uri(), SessionHandle::new());
        let error = client
            .create_policy(&PolicyDefinition::zero_approval())
            .await
            .expect_err("no session token");

        assert_eq!(error, RemoteError::NotAuthenticated { operation: "create_policy" });
    }
}
