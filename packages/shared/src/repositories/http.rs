use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::repositories::errors::api_errors::ApiError;
use crate::validation::{Field, FieldErrors};

/// Thin JSON client over the REST backend. Cloning shares the underlying
/// connection pool and bearer token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .send(self.http.get(self.url(path)).query(query))
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.http.post(self.url(path)).json(body)).await?;
        Ok(response.json::<T>().await?)
    }

    /// POST whose response body is ignored.
    pub async fn post_empty<B>(&self, path: &str, body: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await?;
        Ok(())
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.http.put(self.url(path)).json(body)).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(path))).await?;
        Ok(())
    }

    async fn send(&self, mut request: RequestBuilder) -> Result<Response, ApiError> {
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url());
        check_status(response).await
    }
}

/// Maps non-success statuses onto `ApiError`.
pub async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("Request failed with {}: {}", status, body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::CONFLICT => ApiError::Conflict(detail_message(&body)),
        StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(parse_validation_errors(&body)),
        _ => ApiError::Status {
            code: status.as_u16(),
            body,
        },
    })
}

fn detail_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Reads a 422 body of the form
/// `{"detail":[{"loc":["body","email"],"msg":"..."}]}` or `{"detail":"..."}`.
pub fn parse_validation_errors(body: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            errors.general.push(body.to_string());
            return errors;
        }
    };

    match value.get("detail") {
        Some(Value::Array(items)) => {
            for item in items {
                let msg = item
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or("Invalid value")
                    .to_string();
                let field = item
                    .get("loc")
                    .and_then(Value::as_array)
                    .and_then(|loc| loc.last())
                    .and_then(Value::as_str)
                    .and_then(Field::from_wire);
                match field {
                    Some(field) => errors.add(field, msg),
                    None => errors.general.push(msg),
                }
            }
        }
        Some(Value::String(msg)) => errors.general.push(msg.clone()),
        _ => errors.general.push(body.to_string()),
    }
    errors
}
