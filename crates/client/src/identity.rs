use async_trait::async_trait;
use fuel_core::errors::RemoteError;
use fuel_core::remote::SessionProvider;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{decode_json, expect_status, join_url, transport};
use crate::session::SessionHandle;

const LOGIN: &str = "/login";
const MASTER_SERVICE_AGREEMENT: &str = "/accessgroups/serviceagreements/master";
const USER_CONTEXT: &str = "/accessgroups/usercontext";

/// Logs in against the identity service and scopes the session to the master
/// service agreement. The token lands in the shared [`SessionHandle`].
#[derive(Clone)]
pub struct HttpSessionProvider {
    http: Client,
    identity_base_url: String,
    access_control_base_url: String,
    session: SessionHandle,
}

impl HttpSessionProvider {
    pub fn new(
        http: Client,
        identity_base_url: impl Into<String>,
        access_control_base_url: impl Into<String>,
        session: SessionHandle,
    ) -> Self {
        Self {
            http,
            identity_base_url: identity_base_url.into(),
            access_control_base_url: access_control_base_url.into(),
            session,
        }
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn login(&self, username: &str, password: &SecretString) -> Result<(), RemoteError> {
        const OPERATION: &str = "login";
        let url = join_url(&self.identity_base_url, LOGIN);
        let form = [("username", username), ("password", password.expose_secret())];

        let response =
            self.http.post(url).form(&form).send().await.map_err(|error| transport(OPERATION, error))?;
        let response = expect_status(OPERATION, response, StatusCode::OK).await?;
        let token: LoginResponse = decode_json(OPERATION, response).await?;

        self.session.store(SecretString::from(token.access_token)).await;
        debug!(operation = OPERATION, username, "session token stored");
        Ok(())
    }

    async fn select_master_context(&self) -> Result<(), RemoteError> {
        const LOOKUP: &str = "get_master_service_agreement";
        const SELECT: &str = "select_user_context";

        let url = join_url(&self.access_control_base_url, MASTER_SERVICE_AGREEMENT);
        let request = self.session.authorize(LOOKUP, self.http.get(url)).await?;
        let response = request.send().await.map_err(|error| transport(LOOKUP, error))?;
        let response = expect_status(LOOKUP, response, StatusCode::OK).await?;
        let master: MasterServiceAgreement = decode_json(LOOKUP, response).await?;

        let url = join_url(&self.access_control_base_url, USER_CONTEXT);
        let body = UserContextRequest { service_agreement_id: &master.id };
        let request = self.session.authorize(SELECT, self.http.post(url).json(&body)).await?;
        let response = request.send().await.map_err(|error| transport(SELECT, error))?;
        expect_status(SELECT, response, StatusCode::NO_CONTENT).await?;

        debug!(operation = SELECT, service_agreement_id = %master.id, "master context selected");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct MasterServiceAgreement {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserContextRequest<'a> {
    service_agreement_id: &'a str,
}
