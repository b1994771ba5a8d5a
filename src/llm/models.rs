//! Model listing via `GET {base_url}/models`.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::ModelListError;

const LIST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Fetch the model ids a provider serves, sorted and deduplicated.
pub async fn list_models(provider: &ProviderConfig) -> Result<Vec<String>, ModelListError> {
    let url = provider.endpoint("models");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(LIST_TIMEOUT_SECS))
        .build()
        .map_err(|source| ModelListError::Request {
            url: url.clone(),
            source,
        })?;

    let mut request = client.get(&url);
    if let Some(key) = provider.api_key() {
        request = request.bearer_auth(key);
    }

    debug!("Listing models from {}", url);
    let response = request.send().await.map_err(|source| ModelListError::Request {
        url: url.clone(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ModelListError::Http {
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| ModelListError::Request { url, source })?;
    let list: ModelList =
        serde_json::from_str(&body).map_err(|e| ModelListError::InvalidResponse(e.to_string()))?;

    let mut ids: Vec<String> = list.data.into_iter().map(|m| m.id).collect();
    ids.sort();
    ids.dedup();
    Ok(ids)
}
