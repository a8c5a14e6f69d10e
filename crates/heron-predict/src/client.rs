//! HTTP client for the prediction endpoint.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;

pub struct PredictClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    flow_id: String,
    retry: RetryPolicy,
}

/// One outbound prediction request: the cleaned user text, the session
/// key identifying the conversation, and any attached file uploads.
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub question: String,
    pub session_id: String,
    pub uploads: Vec<Upload>,
}

/// A file forwarded alongside the question, as a base64 data URL.
#[derive(Debug, Clone)]
pub struct Upload {
    pub data: String,
    pub name: String,
    pub mime: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
}

impl PredictError {
    /// Network failures, rate limits and server-side errors are worth
    /// retrying; client-side errors and parse failures are not.
    fn is_transient(&self) -> bool {
        match self {
            PredictError::Http(_) => true,
            PredictError::RateLimited { .. } => true,
            PredictError::Api { status, .. } => *status >= 500,
            PredictError::Parse(_) => false,
        }
    }
}

impl PredictClient {
    pub fn new(base_url: String, api_key: String, flow_id: String, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            flow_id,
            retry,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/v1/prediction/{}", self.base_url, self.flow_id)
    }

    /// Send a prediction request, retrying transient failures per the
    /// configured policy. A 429 response's `retry-after` overrides the
    /// computed backoff delay for that attempt.
    pub async fn predict(&self, req: &PredictRequest) -> Result<Value, PredictError> {
        let url = self.endpoint();
        let body = build_request_body(req);
        let mut last_err: Option<PredictError> = None;

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                let delay = match &last_err {
                    Some(PredictError::RateLimited { retry_after_ms }) => {
                        std::time::Duration::from_millis(*retry_after_ms)
                    }
                    _ => self.retry.delay_for(attempt - 1, &req.session_id),
                };
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&url, &body).await {
                Ok(payload) => {
                    if attempt > 1 {
                        info!(attempt, session = %req.session_id, "prediction succeeded after retry");
                    }
                    return Ok(payload);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        endpoint = %url,
                        session = %req.session_id,
                        error = %e,
                        "prediction attempt failed"
                    );
                    if !e.is_transient() {
                        return Err(e);
                    }
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(PredictError::Parse("no attempts made".to_string())))
    }

    async fn attempt(&self, url: &str, body: &Value) -> Result<Value, PredictError> {
        debug!(endpoint = %url, "sending prediction request");

        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(5000);
            return Err(PredictError::RateLimited {
                retry_after_ms: retry,
            });
        }

        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PredictError::Api { status, message });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| PredictError::Parse(e.to_string()))
    }
}

fn build_request_body(req: &PredictRequest) -> Value {
    let mut body = serde_json::json!({
        "question": req.question,
        "overrideConfig": { "sessionId": req.session_id },
    });

    if !req.uploads.is_empty() {
        let uploads: Vec<Value> = req
            .uploads
            .iter()
            .map(|u| {
                serde_json::json!({
                    "data": u.data,
                    "type": "file",
                    "name": u.name,
                    "mime": u.mime,
                })
            })
            .collect();
        body["uploads"] = Value::Array(uploads);
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(base_url: String, max_attempts: u32) -> PredictClient {
        PredictClient::new(
            base_url,
            "test-key".to_string(),
            "flow-1".to_string(),
            RetryPolicy {
                max_attempts,
                base_delay_ms: 0,
                jitter_ms: 0,
            },
        )
    }

    fn request() -> PredictRequest {
        PredictRequest {
            question: "what is up".to_string(),
            session_id: "slack:im:D1:1.0".to_string(),
            uploads: Vec::new(),
        }
    }

    #[test]
    fn body_omits_uploads_when_empty() {
        let body = build_request_body(&request());
        assert_eq!(body["question"], "what is up");
        assert_eq!(body["overrideConfig"]["sessionId"], "slack:im:D1:1.0");
        assert!(body.get("uploads").is_none());
    }

    #[test]
    fn body_includes_uploads_as_data_urls() {
        let mut req = request();
        req.uploads.push(Upload {
            data: "data:text/plain;base64,aGk=".to_string(),
            name: "hi.txt".to_string(),
            mime: "text/plain".to_string(),
        });
        let body = build_request_body(&req);
        assert_eq!(body["uploads"][0]["type"], "file");
        assert_eq!(body["uploads"][0]["data"], "data:text/plain;base64,aGk=");
        assert_eq!(body["uploads"][0]["mime"], "text/plain");
    }

    #[tokio::test]
    async fn predict_happy_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/prediction/flow-1")
                .header("authorization", "Bearer test-key")
                .json_body_includes(r#"{"question": "what is up"}"#);
            then.status(200).json_body(json!({"text": "not much"}));
        });

        let client = test_client(server.base_url(), 3);
        let payload = client.predict(&request()).await.expect("prediction");
        assert_eq!(payload["text"], "not much");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/prediction/flow-1");
            then.status(404).body("no such flow");
        });

        let client = test_client(server.base_url(), 3);
        let err = client.predict(&request()).await.unwrap_err();
        assert!(matches!(err, PredictError::Api { status: 404, .. }));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn server_errors_retry_until_exhausted() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/prediction/flow-1");
            then.status(500).body("boom");
        });

        let client = test_client(server.base_url(), 3);
        let err = client.predict(&request()).await.unwrap_err();
        assert!(matches!(err, PredictError::Api { status: 500, .. }));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn rate_limits_honor_retry_after() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/prediction/flow-1");
            then.status(429).header("retry-after", "0").body("slow down");
        });

        let client = test_client(server.base_url(), 2);
        let err = client.predict(&request()).await.unwrap_err();
        assert!(matches!(err, PredictError::RateLimited { retry_after_ms: 0 }));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn non_json_success_body_is_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/prediction/flow-1");
            then.status(200).body("<html>definitely not json</html>");
        });

        let client = test_client(server.base_url(), 3);
        let err = client.predict(&request()).await.unwrap_err();
        assert!(matches!(err, PredictError::Parse(_)));
    }
}
