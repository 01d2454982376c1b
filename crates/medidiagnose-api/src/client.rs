//! Blocking HTTP client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use medidiagnose_core::models::{sanitize_text, AnalysisSummary, ImageUpload};
use medidiagnose_core::{ClientConfig, SessionContext};

use crate::error::{ApiError, ApiResult, SESSION_EXPIRED_REDIRECT};
use crate::wire::{encode_symptoms, ErrorBody, SymptomCheckResponse};

/// Client for the diagnosis backend and the API layer.
pub struct ApiClient {
    base_url: String,
    symptom_check_url: String,
    timeout: Duration,
    http: Client,
    session: Arc<Mutex<SessionContext>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<Mutex<SessionContext>>) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            symptom_check_url: config.symptom_check_url.clone(),
            timeout: config.request_timeout,
            http,
            session,
        })
    }

    /// Send an image with its symptoms for analysis.
    pub fn symptom_check(
        &self,
        image: &ImageUpload,
        symptoms: &[String],
        description: &str,
    ) -> ApiResult<AnalysisSummary> {
        let image_part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let form = Form::new()
            .part("image", image_part)
            .text("symptoms", encode_symptoms(symptoms)?)
            .text("description", sanitize_text(description));

        tracing::info!(
            url = %self.symptom_check_url,
            image_bytes = image.size(),
            symptoms = symptoms.len(),
            "Sending symptom check"
        );

        let response = self.send(self.http.post(&self.symptom_check_url).multipart(form))?;
        let parsed: SymptomCheckResponse = decode(response)?;
        Ok(parsed.into())
    }

    /// GET a JSON resource relative to the API base URL.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(self.http.get(self.url(path)))?;
        decode(response)
    }

    /// POST a JSON body relative to the API base URL.
    pub fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let response = self.send(self.http.post(self.url(path)).json(body))?;
        decode(response)
    }

    /// PUT a JSON body relative to the API base URL.
    pub fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let response = self.send(self.http.put(self.url(path)).json(body))?;
        decode(response)
    }

    /// PATCH a JSON body relative to the API base URL.
    pub fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let response = self.send(self.http.patch(self.url(path)).json(body))?;
        decode(response)
    }

    /// DELETE a resource. Any response body is ignored.
    pub fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(self.http.delete(self.url(path)))?;
        Ok(())
    }

    /// Upload one file as the multipart field `file`.
    pub fn upload<T: DeserializeOwned>(&self, path: &str, file: &ImageUpload) -> ApiResult<T> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| ApiError::Request(e.to_string()))?;

        tracing::debug!(path, bytes = file.size(), "Uploading file");
        let response = self.send(
            self.http
                .post(self.url(path))
                .multipart(Form::new().part("file", part)),
        )?;
        decode(response)
    }

    /// Whether the API layer answers `/health` with a success status.
    pub fn health_check(&self) -> ApiResult<()> {
        self.send(self.http.get(self.url("/health")))?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach the bearer token, send, and map transport and status failures.
    fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let token = {
            let session = self
                .session
                .lock()
                .map_err(|_| ApiError::Session("Session lock poisoned".into()))?;
            session.bearer_token().map(str::to_string)
        };
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else if e.is_connect() {
                ApiError::Transport(
                    e.url()
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| self.base_url.clone()),
                )
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Received 401, ending session");
            let mut session = self
                .session
                .lock()
                .map_err(|_| ApiError::Session("Session lock poisoned".into()))?;
            session.teardown()?;
            return Err(ApiError::Unauthorized {
                redirect: SESSION_EXPIRED_REDIRECT.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), "Request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let body = response
        .text()
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(serde_json::from_str(&body)?)
}
