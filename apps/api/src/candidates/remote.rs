//! Remote candidate store — forwards every operation to another instance of
//! this API over HTTP.
//!
//! Error envelopes coming back from the remote are mapped onto the same
//! `AppError` kinds the local backends produce, so callers cannot tell which
//! backend they are talking to.
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::candidates::store::CandidateStore;
use crate::candidates::validation::CandidateDraft;
use crate::errors::{AppError, FieldError};
use crate::models::candidate::{Candidate, CandidateStatus};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    details: Vec<FieldError>,
}

#[derive(Clone)]
pub struct RemoteCandidateStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RemoteCandidateStore {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/candidates{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AppError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!("Remote candidate store answered {status}");
            return response
                .json::<T>()
                .await
                .map_err(|e| AppError::Upstream(format!("invalid response body: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &body))
    }
}

/// Rebuilds the local error kind from a remote error response.
fn error_from_response(status: u16, body: &str) -> AppError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        warn!("Remote candidate store returned {status} without an error envelope");
        return AppError::Upstream(format!("status {status}: {body}"));
    };

    let ErrorBody {
        code,
        message,
        details,
    } = envelope.error;
    match code.as_str() {
        "VALIDATION_ERROR" => AppError::Validation(details),
        "CONFLICT" => AppError::Conflict(message),
        "NOT_FOUND" => AppError::NotFound(message),
        "BAD_REQUEST" => AppError::BadRequest(message),
        // Our own credentials were refused; that is not the caller's fault.
        "UNAUTHORIZED" => AppError::Upstream("remote rejected the configured token".to_string()),
        _ => AppError::Upstream(format!("status {status} ({code}): {message}")),
    }
}

#[async_trait]
impl CandidateStore for RemoteCandidateStore {
    async fn list(&self) -> Result<Vec<Candidate>, AppError> {
        self.send(self.request(Method::GET, "")).await
    }

    async fn get(&self, id: Uuid) -> Result<Candidate, AppError> {
        self.send(self.request(Method::GET, &format!("/{id}"))).await
    }

    async fn create(&self, draft: CandidateDraft) -> Result<Candidate, AppError> {
        self.send(self.request(Method::POST, "").json(&draft)).await
    }

    async fn update(&self, id: Uuid, draft: CandidateDraft) -> Result<Candidate, AppError> {
        self.send(self.request(Method::PUT, &format!("/{id}")).json(&draft))
            .await
    }

    async fn set_status(&self, id: Uuid, status: CandidateStatus) -> Result<Candidate, AppError> {
        let body = json!({ "status": status });
        self.send(self.request(Method::PATCH, &format!("/{id}/status")).json(&body))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let _ack: serde_json::Value = self
            .send(self.request(Method::DELETE, &format!("/{id}")))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::test_support::{issue_token, TEST_SECRET};
    use crate::auth::JwtVerifier;
    use crate::candidates::memory::InMemoryCandidateStore;
    use crate::candidates::store::test_support::{draft, exercise_contract};
    use crate::routes::build_router;
    use crate::state::AppState;

    /// Serves the real router over an in-memory store on an ephemeral port.
    async fn spawn_backend() -> String {
        let state = AppState {
            store: Arc::new(InMemoryCandidateStore::new()),
            verifier: Arc::new(JwtVerifier::new(TEST_SECRET)),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_store_contract_over_http() {
        let base = spawn_backend().await;
        let store = RemoteCandidateStore::new(&base, Some(issue_token("recruiter-1"))).unwrap();
        exercise_contract(&store).await;
    }

    #[tokio::test]
    async fn test_bad_token_surfaces_as_upstream() {
        let base = spawn_backend().await;
        let store = RemoteCandidateStore::new(&base, Some("not-a-jwt".to_string())).unwrap();
        let result = store.create(draft("A", "B", "a@b.io")).await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
        // Reads are public.
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_upstream_error() {
        let store = RemoteCandidateStore::new("http://127.0.0.1:9", None).unwrap();
        assert!(matches!(store.list().await, Err(AppError::Upstream(_))));
    }

    #[test]
    fn test_error_from_response_maps_codes() {
        let validation = serde_json::json!({
            "error": {
                "code": "VALIDATION_ERROR",
                "message": "Validation failed",
                "details": [{ "field": "email", "message": "Please enter a valid email" }]
            }
        })
        .to_string();
        match error_from_response(400, &validation) {
            AppError::Validation(details) => {
                assert_eq!(details, vec![FieldError::new("email", "Please enter a valid email")])
            }
            other => panic!("unexpected {other:?}"),
        }

        let conflict = r#"{"error":{"code":"CONFLICT","message":"Email already exists"}}"#;
        assert!(matches!(
            error_from_response(400, conflict),
            AppError::Conflict(m) if m == "Email already exists"
        ));

        let missing = r#"{"error":{"code":"NOT_FOUND","message":"Candidate not found"}}"#;
        assert!(matches!(error_from_response(404, missing), AppError::NotFound(_)));

        assert!(matches!(
            error_from_response(502, "<html>bad gateway</html>"),
            AppError::Upstream(_)
        ));
    }
}
