//! HTTP client for JSONBin-compatible document hosts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RemoteError, RemoteSnapshot, RemoteStore};
use crate::models::{normalize_entries, sort_by_date, timestamp_from_value, Entry, StoreConfig};

/// Public JSONBin API.
pub const DEFAULT_ENDPOINT: &str = "https://api.jsonbin.io/v3/b";

const MASTER_KEY_HEADER: &str = "X-Master-Key";
const ACCESS_KEY_HEADER: &str = "X-Access-Key";
const VERSIONING_HEADER: &str = "X-Bin-Versioning";

/// Metadata keys holding a modification time, most specific first.
const TIMESTAMP_KEYS: [&str; 3] = ["updatedAt", "modifiedAt", "createdAt"];

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    record: Value,
    #[serde(default)]
    metadata: Value,
}

impl Envelope {
    /// Entries from `record.entries`, or `None` when that is not an array.
    fn take_entries(&mut self) -> Option<Vec<Value>> {
        match self.record.get_mut("entries").map(Value::take) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }
    }

    fn updated_at(&self) -> DateTime<Utc> {
        TIMESTAMP_KEYS
            .iter()
            .find_map(|key| timestamp_from_value(self.metadata.get(*key)))
            .unwrap_or_else(Utc::now)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushBody<'a> {
    entries: &'a [Entry],
    updated_at: DateTime<Utc>,
}

/// Client for a JSONBin-style REST endpoint.
#[derive(Debug, Clone)]
pub struct JsonBinClient {
    endpoint: String,
    http: reqwest::Client,
}

impl JsonBinClient {
    /// Creates a client for `endpoint` (e.g. `https://api.jsonbin.io/v3/b`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    /// Creates a client reusing an existing HTTP client.
    pub fn with_client(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { endpoint, http }
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn latest_url(&self, config: &StoreConfig) -> String {
        format!("{}/{}/latest", self.endpoint, config.bin_id)
    }

    fn bin_url(&self, config: &StoreConfig) -> String {
        format!("{}/{}", self.endpoint, config.bin_id)
    }

    fn with_credentials(request: RequestBuilder, config: &StoreConfig) -> RequestBuilder {
        let mut request = request;
        if !config.master_key.is_empty() {
            request = request.header(MASTER_KEY_HEADER, &config.master_key);
        }
        if !config.access_key.is_empty() {
            request = request.header(ACCESS_KEY_HEADER, &config.access_key);
        }
        request
    }

    async fn read_envelope(response: Response) -> Result<Envelope, RemoteError> {
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn error_from(response: Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RemoteError::http(status, &body)
    }
}

#[async_trait]
impl RemoteStore for JsonBinClient {
    fn backend_name(&self) -> &str {
        "jsonbin"
    }

    async fn fetch_entries(&self, config: &StoreConfig) -> Result<RemoteSnapshot, RemoteError> {
        let url = self.latest_url(config);
        tracing::debug!("Fetching entries from {}", url);

        let response = Self::with_credentials(self.http.get(&url), config)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let mut envelope = Self::read_envelope(response).await?;
        let updated_at = envelope.updated_at();
        let entries = normalize_entries(envelope.take_entries().unwrap_or_default());

        tracing::debug!("Fetched {} entries", entries.len());
        Ok(RemoteSnapshot {
            entries,
            updated_at,
        })
    }

    async fn push_entries(
        &self,
        config: &StoreConfig,
        entries: &[Entry],
    ) -> Result<RemoteSnapshot, RemoteError> {
        let url = self.bin_url(config);
        let sent = sort_by_date(entries.to_vec());
        tracing::debug!("Pushing {} entries to {}", sent.len(), url);

        let body = PushBody {
            entries: &sent,
            updated_at: Utc::now(),
        };
        let response = Self::with_credentials(self.http.put(&url), config)
            .header(VERSIONING_HEADER, "false")
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let mut envelope = Self::read_envelope(response).await?;
        let updated_at = envelope.updated_at();
        let entries = match envelope.take_entries() {
            Some(items) => normalize_entries(items),
            None => sent,
        };

        Ok(RemoteSnapshot {
            entries,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode as AxumStatus},
        response::{IntoResponse, Response as AxumResponse},
        routing::{get, put},
        Json, Router,
    };
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-process stand-in for the document host.
    #[derive(Clone, Default)]
    struct TestHost {
        bins: Arc<Mutex<HashMap<String, Value>>>,
        headers: Arc<Mutex<Vec<HeaderMap>>>,
    }

    async fn latest(State(host): State<TestHost>, Path(id): Path<String>, headers: HeaderMap) -> AxumResponse {
        host.headers.lock().unwrap().push(headers);
        match id.as_str() {
            "broken" => return AxumStatus::INTERNAL_SERVER_ERROR.into_response(),
            "garbage" => return (AxumStatus::OK, "<html>").into_response(),
            "modified" => {
                return Json(json!({
                    "record": { "entries": "not-a-list" },
                    "metadata": { "modifiedAt": "2024-02-01T09:00:00Z", "createdAt": "2023-01-01T00:00:00Z" }
                }))
                .into_response()
            }
            _ => {}
        }
        match host.bins.lock().unwrap().get(&id) {
            Some(record) => Json(json!({
                "record": record,
                "metadata": { "id": id, "private": true, "createdAt": "2024-01-01T00:00:00.000Z" }
            }))
            .into_response(),
            None => (AxumStatus::NOT_FOUND, r#"{"message":"Bin not found"}"#).into_response(),
        }
    }

    async fn replace(
        State(host): State<TestHost>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> AxumResponse {
        let authorized = headers
            .get("x-master-key")
            .and_then(|v| v.to_str().ok())
            .map(|key| key == "master")
            .unwrap_or(false);
        host.headers.lock().unwrap().push(headers);
        if !authorized {
            return (AxumStatus::UNAUTHORIZED, "Invalid X-Master-Key provided").into_response();
        }
        if id == "silent" {
            return Json(json!({ "metadata": { "parentId": id } })).into_response();
        }
        host.bins.lock().unwrap().insert(id.clone(), body.clone());
        Json(json!({
            "record": body,
            "metadata": { "parentId": id, "private": true, "updatedAt": "2024-03-01T12:00:00Z" }
        }))
        .into_response()
    }

    async fn spawn_host() -> (JsonBinClient, TestHost) {
        let host = TestHost::default();
        let app = Router::new()
            .route("/b/{id}/latest", get(latest))
            .route("/b/{id}", put(replace))
            .with_state(host.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (JsonBinClient::new(format!("http://{}/b/", addr)), host)
    }

    fn config(bin_id: &str) -> StoreConfig {
        StoreConfig::new(bin_id).with_master_key("master")
    }

    #[test]
    fn test_urls() {
        let client = JsonBinClient::new("https://api.jsonbin.io/v3/b/");
        assert_eq!(client.endpoint(), "https://api.jsonbin.io/v3/b");
        assert_eq!(
            client.latest_url(&config("abc")),
            "https://api.jsonbin.io/v3/b/abc/latest"
        );
        assert_eq!(client.bin_url(&config("abc")), "https://api.jsonbin.io/v3/b/abc");
    }

    #[tokio::test]
    async fn test_push_then_fetch_returns_same_entries() {
        let (client, _host) = spawn_host().await;
        let cfg = config("diary");
        let entries = vec![
            Entry::new("2024-01-06").with_mood("😐 Neutral"),
            Entry::new("2024-01-05").with_mood("🙂 Gut").with_notes("zwei\nZeilen"),
        ];

        let pushed = client.push_entries(&cfg, &entries).await.unwrap();
        assert_eq!(
            pushed.updated_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );

        let fetched = client.fetch_entries(&cfg).await.unwrap();
        assert_eq!(fetched.entries, pushed.entries);
        assert_eq!(fetched.entries[0].date, "2024-01-05");
        assert_eq!(fetched.entries[0].notes, "zwei\nZeilen");
        assert_eq!(
            fetched.updated_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );

        // Pushing again leaves the same stored state
        client.push_entries(&cfg, &entries).await.unwrap();
        let again = client.fetch_entries(&cfg).await.unwrap();
        assert_eq!(again.entries, fetched.entries);
    }

    #[tokio::test]
    async fn test_push_sends_credentials_and_disables_versioning() {
        let (client, host) = spawn_host().await;
        let cfg = config("diary").with_access_key("reader");

        client
            .push_entries(&cfg, &[Entry::new("2024-01-05")])
            .await
            .unwrap();

        let headers = host.headers.lock().unwrap();
        let sent = headers.last().unwrap();
        assert_eq!(sent.get("x-master-key").unwrap(), "master");
        assert_eq!(sent.get("x-access-key").unwrap(), "reader");
        assert_eq!(sent.get("x-bin-versioning").unwrap(), "false");
        assert!(sent
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json"));
    }

    #[tokio::test]
    async fn test_push_body_uses_stored_keys() {
        let (client, host) = spawn_host().await;
        client
            .push_entries(&config("diary"), &[Entry::new("2024-01-05").with_mood("🙂 Gut")])
            .await
            .unwrap();

        let bins = host.bins.lock().unwrap();
        let record = bins.get("diary").unwrap();
        assert_eq!(record["entries"][0]["datum"], "2024-01-05");
        assert_eq!(record["entries"][0]["stimmung"], "🙂 Gut");
        assert!(record["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_fetch_without_keys_sends_no_credential_headers() {
        let (client, host) = spawn_host().await;
        let _ = client.fetch_entries(&StoreConfig::new("missing")).await;

        let headers = host.headers.lock().unwrap();
        let sent = headers.last().unwrap();
        assert!(sent.get("x-master-key").is_none());
        assert!(sent.get("x-access-key").is_none());
    }

    #[tokio::test]
    async fn test_fetch_missing_bin_is_not_found() {
        let (client, _host) = spawn_host().await;
        let err = client.fetch_entries(&config("missing")).await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_server_error_uses_status() {
        let (client, _host) = spawn_host().await;
        let err = client.fetch_entries(&config("broken")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Http { status: 500, .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json_is_decode_error() {
        let (client, _host) = spawn_host().await;
        let err = client.fetch_entries(&config("garbage")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_prefers_modified_at_and_tolerates_bad_entries() {
        let (client, _host) = spawn_host().await;
        let snapshot = client.fetch_entries(&config("modified")).await.unwrap();
        assert!(snapshot.entries.is_empty());
        assert_eq!(
            snapshot.updated_at,
            Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_push_rejected_uses_body_as_message() {
        let (client, _host) = spawn_host().await;
        let cfg = StoreConfig::new("diary").with_master_key("wrong");
        let err = client
            .push_entries(&cfg, &[Entry::new("2024-01-05")])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RemoteError::Http {
                status: 401,
                message: "Invalid X-Master-Key provided".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_push_without_echo_returns_sent_entries() {
        let (client, _host) = spawn_host().await;
        let before = Utc::now();
        let snapshot = client
            .push_entries(
                &config("silent"),
                &[Entry::new("2024-01-07"), Entry::new("2024-01-05")],
            )
            .await
            .unwrap();

        let dates: Vec<&str> = snapshot.entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-05", "2024-01-07"]);
        assert!(snapshot.updated_at >= before);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = JsonBinClient::new("http://127.0.0.1:1/b");
        let err = client.fetch_entries(&config("diary")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }
}
