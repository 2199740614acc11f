//! HTTP access to the upstream record store.

use std::time::Duration;

use async_trait::async_trait;
use medcard_core::{AggregatorConfig, RecordError};
use serde_json::Value;

/// Read-only access to the record store.
///
/// The seam is deliberately one method wide: callers hand over a relative
/// path (query string included) and get the decoded JSON body back. Tests
/// swap in scripted implementations; production uses [`HttpRecordStore`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// GET `path` relative to the store root and decode the body as JSON.
    /// One attempt, no retries.
    async fn get_json(&self, path: &str) -> Result<Value, RecordError>;
}

/// reqwest-backed [`RecordStore`] speaking JSON over HTTP.
pub struct HttpRecordStore {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpRecordStore {
    pub fn new(config: &AggregatorConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn get_json(&self, path: &str) -> Result<Value, RecordError> {
        let url = self.url_for(path);
        let resource = resource_label(path);
        tracing::debug!(resource = %resource, "fetching record resource");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(reqwest::header::ACCEPT, "application/fhir+json, application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecordError::Unreachable {
                        resource: resource.to_string(),
                        detail: format!("request timed out after {}s", self.timeout.as_secs()),
                    }
                } else if e.is_connect() {
                    RecordError::Unreachable {
                        resource: resource.to_string(),
                        detail: format!("could not connect to {}", self.base_url),
                    }
                } else {
                    RecordError::Unreachable {
                        resource: resource.to_string(),
                        detail: e.without_url().to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecordError::UpstreamStatus {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                RecordError::Decode {
                    resource: resource.to_string(),
                    detail: e.without_url().to_string(),
                }
            } else {
                RecordError::Unreachable {
                    resource: resource.to_string(),
                    detail: e.without_url().to_string(),
                }
            }
        })
    }
}

// Query strings carry the subject's external identifier; keep them out of
// the labels and error details that end up in logs. reqwest's error text
// embeds the full request URL unless stripped with `without_url`.
fn resource_label(path: &str) -> &str {
    path.split_once('?').map_or(path, |(base, _)| base)
}

/// Resolve the store-assigned id for a subject's external identifier.
///
/// Zero search hits is an expected outcome and comes back as `Ok(None)`;
/// transport failures propagate. A hit whose resource carries no id is
/// treated as no hit.
pub async fn find_patient_id(
    store: &dyn RecordStore,
    identifier: &str,
) -> Result<Option<String>, RecordError> {
    let path = format!("Patient?identifier={}", urlencoding::encode(identifier));
    let bundle = store.get_json(&path).await?;

    let id = bundle
        .get("entry")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("resource"))
        .and_then(|resource| resource.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if id.is_none() {
        tracing::debug!("patient search returned no usable hit");
    }
    Ok(id)
}
