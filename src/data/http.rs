use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::data::error::ServiceError;

pub(crate) fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

/// Sends `request` and decodes a JSON body, mapping each failure stage onto
/// its [`ServiceError`] variant. `label` names the call in errors and logs.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    label: &str,
) -> Result<T, ServiceError> {
    let response = request.send().await.map_err(|err| {
        tracing::warn!(label, error = %err, "request failed");
        ServiceError::Network {
            label: label.to_string(),
            message: err.to_string(),
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.ok();
        tracing::warn!(label, status = status.as_u16(), "request returned non-success status");
        return Err(ServiceError::Http {
            label: label.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await.map_err(|err| ServiceError::Network {
        label: label.to_string(),
        message: err.to_string(),
    })?;

    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::warn!(label, error = %err, "failed to decode payload");
        ServiceError::Parse {
            label: label.to_string(),
            message: err.to_string(),
        }
    })
}
