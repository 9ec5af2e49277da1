use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exam::evaluation::Evaluation;
use crate::exam::task::{ExamTask, TaskKind};

/// Body of a grading call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    pub prompt: String,
    pub task_type: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_outline: Option<String>,
    pub essay: String,
}

impl GradeRequest {
    pub fn new(task: &ExamTask, essay: &str) -> Self {
        Self {
            prompt: task.prompt.clone(),
            task_type: task.kind,
            data_outline: task.data_outline.clone(),
            essay: essay.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GraderError {
    #[error("Missing grader credential: set {0}")]
    MissingCredential(String),
    #[error("No grader endpoint configured")]
    NotConfigured,
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Malformed grader response: {0}")]
    Malformed(String),
    #[error("Grading is unavailable in this build")]
    Unavailable,
}

impl GraderError {
    /// Text stored in the session's error slot.
    pub fn display_message(&self) -> String {
        format!("Error: {self}")
    }
}

/// External essay grader. Implementations perform one blocking call per
/// [`grade`](Grader::grade) and never retry on their own.
pub trait Grader: Send + Sync {
    fn grade(&self, request: &GradeRequest) -> Result<Evaluation, GraderError>;
}

/// Error body returned by the grading service on a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Map a non-success status and its raw body to an error, falling back to a
/// generic message when the body carries no `error` field.
pub fn rejection(status: u16, body: &str) -> GraderError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Server Error: {status}"));
    GraderError::Rejected { status, message }
}

pub fn parse_evaluation(body: &str) -> Result<Evaluation, GraderError> {
    serde_json::from_str(body).map_err(|e| GraderError::Malformed(e.to_string()))
}

#[cfg(feature = "network")]
pub use http::HttpGrader;

#[cfg(feature = "network")]
mod http {
    use std::time::Duration;

    use reqwest::blocking::Client;
    use tracing::{debug, info};

    use super::{GradeRequest, Grader, GraderError, parse_evaluation, rejection};
    use crate::exam::evaluation::Evaluation;

    /// Posts [`GradeRequest`] JSON to a grading endpoint.
    pub struct HttpGrader {
        client: Client,
        endpoint: Option<String>,
        api_key_env: String,
        require_api_key: bool,
    }

    impl HttpGrader {
        pub fn new(
            endpoint: Option<String>,
            api_key_env: &str,
            require_api_key: bool,
            timeout: Duration,
        ) -> Result<Self, GraderError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| GraderError::Transport(e.to_string()))?;
            Ok(Self {
                client,
                endpoint,
                api_key_env: api_key_env.to_string(),
                require_api_key,
            })
        }

        fn api_key(&self) -> Result<Option<String>, GraderError> {
            match std::env::var(&self.api_key_env) {
                Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
                _ if self.require_api_key => {
                    Err(GraderError::MissingCredential(self.api_key_env.clone()))
                }
                _ => Ok(None),
            }
        }
    }

    impl Grader for HttpGrader {
        fn grade(&self, request: &GradeRequest) -> Result<Evaluation, GraderError> {
            let endpoint = self.endpoint.as_deref().ok_or(GraderError::NotConfigured)?;
            // Read per call so a key exported mid-session is picked up.
            let key = self.api_key()?;

            let mut builder = self.client.post(endpoint).json(request);
            if let Some(key) = key {
                builder = builder.bearer_auth(key);
            }

            info!(task = %request.task_type, "sending essay to grader");
            let response = builder
                .send()
                .map_err(|e| GraderError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .map_err(|e| GraderError::Transport(e.to_string()))?;
            debug!(status = status.as_u16(), bytes = body.len(), "grader responded");

            if !status.is_success() {
                return Err(rejection(status.as_u16(), &body));
            }
            parse_evaluation(&body)
        }
    }
}

/// Stand-in used when the crate is built without network support.
pub struct OfflineGrader;

impl Grader for OfflineGrader {
    fn grade(&self, _request: &GradeRequest) -> Result<Evaluation, GraderError> {
        Err(GraderError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::task::TaskCategory;

    fn task() -> ExamTask {
        ExamTask {
            id: "w1".to_string(),
            kind: TaskKind::Task1,
            category: TaskCategory::BarChart,
            prompt: "Describe the chart.".to_string(),
            data_outline: Some("Cars: UK > France".to_string()),
            image: None,
            model_answer: None,
        }
    }

    #[test]
    fn request_wire_shape() {
        let req = GradeRequest::new(&task(), "My essay");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["prompt"], "Describe the chart.");
        assert_eq!(value["taskType"], "Task 1");
        assert_eq!(value["dataOutline"], "Cars: UK > France");
        assert_eq!(value["essay"], "My essay");
    }

    #[test]
    fn request_omits_missing_outline() {
        let mut t = task();
        t.data_outline = None;
        let value = serde_json::to_value(GradeRequest::new(&t, "x")).unwrap();
        assert!(value.get("dataOutline").is_none());
    }

    #[test]
    fn rejection_uses_error_field() {
        let err = rejection(500, r#"{"error": "Missing API key"}"#);
        assert_eq!(err.display_message(), "Error: Missing API key");
    }

    #[test]
    fn rejection_without_body_is_generic() {
        assert_eq!(rejection(502, "").display_message(), "Error: Server Error: 502");
        assert_eq!(
            rejection(503, "<html>oops</html>").display_message(),
            "Error: Server Error: 503"
        );
    }

    #[test]
    fn malformed_body_is_reported() {
        let err = parse_evaluation("{not json").unwrap_err();
        assert!(matches!(err, GraderError::Malformed(_)));
    }

    #[test]
    fn offline_grader_fails() {
        let req = GradeRequest::new(&task(), "x");
        assert!(matches!(OfflineGrader.grade(&req), Err(GraderError::Unavailable)));
    }

    #[cfg(feature = "network")]
    mod http {
        use std::time::Duration;

        use super::*;

        const UNSET_KEY_VAR: &str = "BANDR_TEST_KEY_THAT_IS_NEVER_SET";

        #[test]
        fn missing_endpoint_is_not_configured() {
            let grader = HttpGrader::new(None, UNSET_KEY_VAR, true, Duration::from_secs(1)).unwrap();
            let err = grader.grade(&GradeRequest::new(&task(), "x")).unwrap_err();
            assert!(matches!(err, GraderError::NotConfigured));
            assert_eq!(err.display_message(), "Error: No grader endpoint configured");
        }

        #[test]
        fn missing_key_fails_before_sending() {
            // Nothing listens here; reaching the network would be a Transport error.
            let grader = HttpGrader::new(
                Some("http://127.0.0.1:9/api/evaluate".to_string()),
                UNSET_KEY_VAR,
                true,
                Duration::from_secs(1),
            )
            .unwrap();
            let err = grader.grade(&GradeRequest::new(&task(), "x")).unwrap_err();
            match &err {
                GraderError::MissingCredential(var) => assert_eq!(var, UNSET_KEY_VAR),
                other => panic!("expected missing credential, got {other:?}"),
            }
            assert_eq!(
                err.display_message(),
                format!("Error: Missing grader credential: set {UNSET_KEY_VAR}")
            );
        }
    }
}
