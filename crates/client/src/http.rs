use std::time::Duration;

use fuel_core::errors::RemoteError;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, RemoteError> {
    Client::builder().timeout(Duration::from_secs(timeout_secs)).build().map_err(|error| {
        RemoteError::Transport { operation: "build_http_client", message: error.to_string() }
    })
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn transport(operation: &'static str, error: reqwest::Error) -> RemoteError {
    RemoteError::Transport { operation, message: error.to_string() }
}

/// Anything but `expected` is a hard failure carrying the status and body.
pub(crate) async fn expect_status(
    operation: &'static str,
    response: Response,
    expected: StatusCode,
) -> Result<Response, RemoteError> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::UnexpectedStatus {
        operation,
        expected: expected.as_u16(),
        actual: status.as_u16(),
        body,
    })
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, RemoteError> {
    response
        .json::<T>()
        .await
        .map_err(|error| RemoteError::Decode { operation, message: error.to_string() })
}

#[cfg(test)]
mod tests {
    use super::join_url;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://host/api/", "/policies"), "http://host/api/policies");
        assert_eq!(join_url("http://host/api", "policies"), "http://host/api/policies");
    }
}
