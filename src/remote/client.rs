//! HTTP client wrapper for the remote document-intelligence service.

use crate::config::{Config, get_config};
use crate::remote::{
    envelope::{decode, index_id_from, read_envelope},
    types::{
        Answer, AuthRequest, AuthResponse, ClientError, Credentials, ExtractRequest,
        ExtractResponse, Failure, IndexDetails, IndicesDetailsResponse, QueryRequest,
        SessionToken, UploadOutcome, UploadRequest,
    },
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::{Duration, Instant};

/// Lightweight HTTP client for the document service operations.
pub struct DocumentClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl DocumentClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, ClientError> {
        Self::from_config(get_config())
    }

    /// Construct a client from an explicit configuration.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let mut builder =
            Client::builder().user_agent(concat!("ezdoc/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ClientError::Build)?;

        let base_url = normalize_base_url(&config.api_url).map_err(ClientError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            timeout_secs = ?config.request_timeout_secs,
            "Initialized document service client"
        );

        Ok(Self { client, base_url })
    }

    /// Normalized base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a session token.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<SessionToken, ClientError> {
        tracing::debug!(username = %credentials.username, "Authenticating");
        match self.try_authenticate(credentials).await {
            Ok(token) => {
                tracing::info!(username = %credentials.username, "Authentication successful");
                Ok(token)
            }
            Err(failure) => {
                tracing::error!(
                    username = %credentials.username,
                    error = %failure,
                    "Authentication failed"
                );
                Err(ClientError::Authentication(failure))
            }
        }
    }

    /// Upload a service-side configuration file for the authenticated account.
    pub async fn upload_config(
        &self,
        token: &SessionToken,
        path: &Path,
    ) -> Result<(), ClientError> {
        tracing::debug!(path = %path.display(), "Uploading configuration file");
        match self.try_upload_config(token, path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Configuration file uploaded");
                Ok(())
            }
            Err(failure) => {
                tracing::error!(
                    path = %path.display(),
                    error = %failure,
                    "Configuration upload failed"
                );
                Err(ClientError::Configuration(failure))
            }
        }
    }

    /// Send a local document to be indexed under `request.index_name`.
    pub async fn upload_document(
        &self,
        token: &SessionToken,
        request: &UploadRequest,
    ) -> Result<UploadOutcome, ClientError> {
        tracing::info!(
            index = %request.index_name,
            document = %request.document.display(),
            overwrite = request.options.overwrite,
            "Indexing document"
        );
        let started = Instant::now();
        match self.try_upload_document(token, request).await {
            Ok(outcome) => {
                tracing::info!(
                    index = %outcome.index,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Document indexed"
                );
                Ok(outcome)
            }
            Err(failure) => {
                tracing::error!(
                    index = %request.index_name,
                    error = %failure,
                    "Document upload failed"
                );
                Err(ClientError::Upload(failure))
            }
        }
    }

    /// Ask a natural-language question against an index.
    pub async fn extract_information(
        &self,
        token: &SessionToken,
        request: &QueryRequest,
    ) -> Result<Answer, ClientError> {
        tracing::info!(index = %request.index_name, "Extracting information");
        let started = Instant::now();
        match self.try_extract_information(token, request).await {
            Ok(answer) => {
                tracing::info!(
                    index = %request.index_name,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Information extracted"
                );
                Ok(answer)
            }
            Err(failure) => {
                tracing::error!(
                    index = %request.index_name,
                    error = %failure,
                    "Information extraction failed"
                );
                Err(ClientError::Query(failure))
            }
        }
    }

    /// List metadata for every index owned by the authenticated account.
    pub async fn get_indices_details(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<IndexDetails>, ClientError> {
        match self.try_get_indices_details(token).await {
            Ok(indices) => {
                tracing::debug!(count = indices.len(), "Fetched indices details");
                Ok(indices)
            }
            Err(failure) => {
                tracing::error!(error = %failure, "Failed to fetch indices details");
                Err(ClientError::Authorization(failure))
            }
        }
    }

    async fn try_authenticate(&self, credentials: &Credentials) -> Result<SessionToken, Failure> {
        let response = self
            .request(Method::POST, "auth", None)
            .json(&AuthRequest::from(credentials))
            .send()
            .await?;
        let value = read_envelope(response).await?;
        let AuthResponse { token } = decode(&value)?;
        if token.trim().is_empty() {
            return Err(Failure::Malformed("service returned an empty token".to_string()));
        }
        Ok(SessionToken::new(token))
    }

    async fn try_upload_config(&self, token: &SessionToken, path: &Path) -> Result<(), Failure> {
        let form = Form::new().part("file", file_part(path).await?);
        let response = self
            .request(Method::POST, "config", Some(token))
            .multipart(form)
            .send()
            .await?;
        read_envelope(response).await?;
        Ok(())
    }

    async fn try_upload_document(
        &self,
        token: &SessionToken,
        request: &UploadRequest,
    ) -> Result<UploadOutcome, Failure> {
        let options = serde_json::to_string(&request.options)
            .map_err(|err| Failure::Malformed(err.to_string()))?;
        let form = Form::new()
            .part("file", file_part(&request.document).await?)
            .text("index_name", request.index_name.clone())
            .text("options", options);

        let response = self
            .request(Method::POST, "upload_document", Some(token))
            .multipart(form)
            .send()
            .await?;
        let raw = read_envelope(response).await?;
        let index = index_id_from(&raw, &request.index_name)?;
        Ok(UploadOutcome { index, raw })
    }

    async fn try_extract_information(
        &self,
        token: &SessionToken,
        request: &QueryRequest,
    ) -> Result<Answer, Failure> {
        let body = ExtractRequest {
            query: &request.query,
            index_name: &request.index_name,
            options: Map::new(),
        };
        let response = self
            .request(Method::POST, "extract_information", Some(token))
            .json(&body)
            .send()
            .await?;
        let raw = read_envelope(response).await?;
        let ExtractResponse { answer } = decode(&raw)?;
        Ok(Answer { answer, raw })
    }

    async fn try_get_indices_details(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<IndexDetails>, Failure> {
        let response = self
            .request(Method::GET, "indices_details", Some(token))
            .send()
            .await?;
        let value: Value = read_envelope(response).await?;
        let IndicesDetailsResponse { indices_details } = decode(&value)?;
        Ok(indices_details)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SessionToken>,
    ) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let req = self.client.request(method, url);
        match token {
            Some(token) => req.bearer_auth(token.as_str()),
            None => req,
        }
    }
}

async fn file_part(path: &Path) -> Result<Part, Failure> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| Failure::LocalFile {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
