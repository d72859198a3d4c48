pub mod dto;
pub mod memory;

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

use crate::error::AppError;
use crate::models::{Goal, Task, validate_snapshot};

pub use memory::InMemoryRemoteStore;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "100";

/// Per-user goal collection in the remote document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every goal in the user's namespace. Order is not guaranteed.
    async fn fetch_goals(&self, uid: &str) -> Result<Vec<Goal>, AppError>;
    /// Appends a goal with no tasks. Not idempotent.
    async fn create_goal(&self, uid: &str, name: &str) -> Result<(), AppError>;
    /// Overwrites the goal's whole task array.
    async fn update_goal_tasks(&self, uid: &str, goal_id: &str, tasks: &[Task]) -> Result<(), AppError>;
}

#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub auth_token: Option<String>,
    pub base_url: String,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            auth_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let project_id = env::var("FIRESTORE_PROJECT_ID")
            .map_err(|_| AppError::Config("FIRESTORE_PROJECT_ID is not set".to_string()))?;
        let auth_token = env::var("FIRESTORE_AUTH_TOKEN").ok().filter(|t| !t.is_empty());
        let base_url = env::var("FIRESTORE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            project_id,
            auth_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

pub struct FirestoreHttpClient {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreHttpClient {
    pub fn new(config: FirestoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// `.../users/{uid}/goals[/{goal_id}]`, each id percent-encoded as a single segment.
    fn goals_url(&self, uid: &str, goal_id: Option<&str>) -> Result<Url, AppError> {
        let base = &self.config.base_url;
        let mut url = Url::parse(base)
            .map_err(|e| AppError::Config(format!("Invalid Firestore url {}: {}", base, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config(format!("Firestore url {} cannot be a base", base)))?;
            segments
                .pop_if_empty()
                .push("projects")
                .push(&self.config.project_id)
                .push("databases")
                .push("(default)")
                .push("documents")
                .push("users")
                .push(uid)
                .push("goals");
            if let Some(goal_id) = goal_id {
                segments.push(goal_id);
            }
        }
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| AppError::RemoteUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Firestore returned 404: {}", body);
            return Err(AppError::NotFound);
        }
        // `currentDocument.exists=true` on a deleted goal.
        if status == StatusCode::BAD_REQUEST && body.contains("FAILED_PRECONDITION") {
            tracing::debug!("Firestore precondition failed: {}", body);
            return Err(AppError::NotFound);
        }
        Err(AppError::RemoteUnavailable(format!("Firestore API error {}: {}", status, body)))
    }

    fn parse_goal_from_document(&self, doc: &dto::Document) -> Result<Goal, AppError> {
        let name = doc
            .fields
            .get("name")
            .and_then(dto::Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::MalformedDocument("missing goal name".to_string()))?
            .to_string();

        let mut tasks = Vec::new();
        if let Some(values) = doc.fields.get("tasks").and_then(dto::Value::as_array) {
            for value in values {
                let task = dto::value_to_task(value)
                    .ok_or_else(|| AppError::MalformedDocument("malformed task entry".to_string()))?;
                tasks.push(task);
            }
        }

        let goal = Goal {
            id: doc.id().to_string(),
            name,
            tasks,
        };
        validate_snapshot(std::slice::from_ref(&goal)).map_err(AppError::MalformedDocument)?;
        Ok(goal)
    }
}

#[async_trait]
impl RemoteStore for FirestoreHttpClient {
    async fn fetch_goals(&self, uid: &str) -> Result<Vec<Goal>, AppError> {
        let mut goals = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.goals_url(uid, None)?;
            url.query_pairs_mut().append_pair("pageSize", PAGE_SIZE);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let response = self.send(self.client.get(url)).await?;
            let body_text = response
                .text()
                .await
                .map_err(|e| AppError::RemoteUnavailable(e.to_string()))?;
            let page: dto::ListDocumentsResponse = serde_json::from_str(&body_text)
                .map_err(|e| {
                    tracing::error!("Failed to parse: {}", e);
                    AppError::RemoteUnavailable(format!("Failed to parse Firestore response: {}", e))
                })?;

            for doc in &page.documents {
                match self.parse_goal_from_document(doc) {
                    Ok(goal) => goals.push(goal),
                    Err(e) => {
                        tracing::warn!("Skipping goal document {}: {}", doc.name, e);
                    }
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(goals)
    }

    async fn create_goal(&self, uid: &str, name: &str) -> Result<(), AppError> {
        let url = self.goals_url(uid, None)?;

        let mut fields = HashMap::new();
        fields.insert("name".to_string(), dto::Value::StringValue(name.to_string()));
        fields.insert("tasks".to_string(), dto::tasks_to_value(&[]));
        fields.insert(
            "createdAt".to_string(),
            dto::Value::IntegerValue(Utc::now().timestamp_millis().to_string()),
        );
        let request_body = dto::WriteDocumentRequest { fields };

        self.send(self.client.post(url).json(&request_body)).await?;
        tracing::info!("Created goal \"{}\" for user {}", name, uid);
        Ok(())
    }

    async fn update_goal_tasks(&self, uid: &str, goal_id: &str, tasks: &[Task]) -> Result<(), AppError> {
        let mut url = self.goals_url(uid, Some(goal_id))?;
        url.query_pairs_mut()
            .append_pair("updateMask.fieldPaths", "tasks")
            .append_pair("currentDocument.exists", "true");

        let mut fields = HashMap::new();
        fields.insert("tasks".to_string(), dto::tasks_to_value(tasks));
        let request_body = dto::WriteDocumentRequest { fields };

        self.send(self.client.patch(url).json(&request_body)).await?;
        tracing::debug!("Updated {} tasks on goal {}", tasks.len(), goal_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{Method, StatusCode as HttpStatus, Uri};
    use serde_json::json;

    fn goal_document(uid: &str, id: &str, name: &str) -> serde_json::Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/users/{}/goals/{}", uid, id),
            "fields": {
                "name": { "stringValue": name },
                "tasks": { "arrayValue": { "values": [{
                    "mapValue": { "fields": {
                        "id": { "stringValue": "t1" },
                        "title": { "stringValue": "First step" },
                        "completed": { "booleanValue": true }
                    }}
                }]}}
            }
        })
    }

    /// Stands in for the Firestore documents API under `/v1/projects/demo/...`.
    async fn fake_firestore(method: Method, uri: Uri) -> (HttpStatus, String) {
        let path = uri.path();
        let query = uri.query().unwrap_or_default();
        let prefix = "/v1/projects/demo/databases/(default)/documents/users/";
        let Some(rest) = path.strip_prefix(prefix) else {
            return (HttpStatus::NOT_FOUND, String::new());
        };

        match (method.as_str(), rest) {
            ("GET", "u1/goals") if query.contains("pageToken=p2") => {
                let page = json!({ "documents": [goal_document("u1", "g2", "Run")] });
                (HttpStatus::OK, page.to_string())
            }
            ("GET", "u1/goals") => {
                let malformed = json!({
                    "name": "projects/demo/databases/(default)/documents/users/u1/goals/bad",
                    "fields": { "createdAt": { "integerValue": "0" } }
                });
                let page = json!({
                    "documents": [goal_document("u1", "g1", "Read"), malformed],
                    "nextPageToken": "p2"
                });
                (HttpStatus::OK, page.to_string())
            }
            ("GET", "a%2Fb/goals") => (HttpStatus::OK, "{}".to_string()),
            ("GET", "down/goals") => (HttpStatus::INTERNAL_SERVER_ERROR, "boom".to_string()),
            ("PATCH", "u1/goals/g1") => (HttpStatus::OK, "{}".to_string()),
            ("PATCH", "u1/goals/gone") => {
                let body = json!({ "error": { "code": 400, "status": "FAILED_PRECONDITION" } });
                (HttpStatus::BAD_REQUEST, body.to_string())
            }
            ("PATCH", "u1/goals/invalid") => {
                let body = json!({ "error": { "code": 400, "status": "INVALID_ARGUMENT" } });
                (HttpStatus::BAD_REQUEST, body.to_string())
            }
            _ => (HttpStatus::NOT_FOUND, String::new()),
        }
    }

    async fn client_for_fake() -> FirestoreHttpClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(fake_firestore);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = FirestoreConfig {
            project_id: "demo".to_string(),
            auth_token: Some("token".to_string()),
            base_url: format!("http://{}/v1", addr),
        };
        FirestoreHttpClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_follows_pages_and_skips_malformed_documents() {
        let client = client_for_fake().await;

        let goals = client.fetch_goals("u1").await.unwrap();

        let ids: Vec<&str> = goals.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2"]);
        assert_eq!(goals[0].name, "Read");
        assert_eq!(goals[0].tasks, vec![Task { id: "t1".to_string(), title: "First step".to_string(), completed: true }]);
    }

    #[tokio::test]
    async fn test_server_error_is_remote_unavailable() {
        let client = client_for_fake().await;
        assert!(matches!(client.fetch_goals("down").await, Err(AppError::RemoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_uid_is_encoded_as_one_segment() {
        let client = client_for_fake().await;
        assert!(client.fetch_goals("a/b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_mapping() {
        let client = client_for_fake().await;
        let tasks = vec![Task::new("t1".to_string(), "First step".to_string())];

        assert!(client.update_goal_tasks("u1", "g1", &tasks).await.is_ok());
        assert!(matches!(client.update_goal_tasks("u1", "missing", &tasks).await, Err(AppError::NotFound)));
        assert!(matches!(client.update_goal_tasks("u1", "gone", &tasks).await, Err(AppError::NotFound)));
        assert!(matches!(
            client.update_goal_tasks("u1", "invalid", &tasks).await,
            Err(AppError::RemoteUnavailable(_))
        ));
    }

    #[test]
    fn test_document_without_goal_name_is_malformed() {
        let client = FirestoreHttpClient::new(FirestoreConfig::new("demo")).unwrap();
        let doc: dto::Document = serde_json::from_value(json!({
            "name": "projects/demo/databases/(default)/documents/users/u1/goals/g1",
            "fields": {}
        }))
        .unwrap();
        assert!(matches!(client.parse_goal_from_document(&doc), Err(AppError::MalformedDocument(_))));
    }
}
