use std::sync::Arc;

use fuel_core::errors::RemoteError;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

/// Bearer token shared by every HTTP adapter of a run. Written once by login,
/// read by every request afterwards.
#[derive(Clone, Default)]
pub struct SessionHandle {
    token: Arc<RwLock<Option<SecretString>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn store(&self, token: SecretString) {
        *self.token.write().await = Some(token);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub(crate) async fn authorize(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, RemoteError> {
        match self.token.read().await.as_ref() {
            Some(token) => Ok(request.bearer_auth(token.expose_secret())),
            None => Err(RemoteError::NotAuthenticated { operation }),
        }
    }
}
