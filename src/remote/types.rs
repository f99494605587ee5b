//! Shared types used by the document service client and its helpers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Underlying cause of a failed service operation.
#[derive(Debug, Error)]
pub enum Failure {
    /// The service answered and refused the request.
    #[error("{message} ({status})")]
    Rejected {
        /// HTTP status that accompanied the refusal.
        status: StatusCode,
        /// Message reported by the service.
        message: String,
    },
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),
    /// The service responded with an error status and no readable message.
    #[error("Unexpected response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// A successful response did not carry the expected payload.
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// A local file named by the request could not be read.
    #[error("Failed to read {}", .path.display())]
    LocalFile {
        /// Path the client attempted to read.
        path: PathBuf,
        /// Filesystem error raised while reading.
        #[source]
        source: std::io::Error,
    },
}

impl Failure {
    /// HTTP status attached to the failure, when the service answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Http(err) => err.status(),
            Self::Malformed(_) | Self::LocalFile { .. } => None,
        }
    }
}

/// Errors returned by the document service client, one variant per operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client")]
    Build(#[source] reqwest::Error),
    /// Credentials were refused or the service could not be reached.
    #[error("Authentication failed")]
    Authentication(#[source] Failure),
    /// The service rejected the configuration file.
    #[error("Configuration upload failed")]
    Configuration(#[source] Failure),
    /// The document could not be indexed.
    #[error("Document upload failed")]
    Upload(#[source] Failure),
    /// The extraction query could not be answered.
    #[error("Information extraction failed")]
    Query(#[source] Failure),
    /// The token was not accepted for listing indices.
    #[error("Authorization failed")]
    Authorization(#[source] Failure),
}

impl ClientError {
    /// Underlying failure for operation errors.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Authentication(failure)
            | Self::Configuration(failure)
            | Self::Upload(failure)
            | Self::Query(failure)
            | Self::Authorization(failure) => Some(failure),
            Self::InvalidUrl(_) | Self::Build(_) => None,
        }
    }
}

/// Secret half of a credential pair.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// API key downloaded from the service console.
    ApiKey(String),
    /// Account password.
    Password(String),
}

/// Account credentials exchanged for a session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name or email.
    pub username: String,
    /// API key or password.
    pub secret: Secret,
}

impl Credentials {
    /// Credentials authenticated by API key.
    pub fn with_api_key(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::ApiKey(api_key.into()),
        }
    }

    /// Credentials authenticated by password.
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Password(password.into()),
        }
    }

    /// Pick credentials from optional parts; a password wins over an API key.
    pub fn resolve(
        username: Option<String>,
        api_key: Option<String>,
        password: Option<String>,
    ) -> Option<Self> {
        let username = username?;
        match (password, api_key) {
            (Some(password), _) => Some(Self::with_password(username, password)),
            (None, Some(api_key)) => Some(Self::with_api_key(username, api_key)),
            (None, None) => None,
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Self::Password(_) => f.write_str("Password([REDACTED])"),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.secret {
            Secret::ApiKey(_) => "api_key",
            Secret::Password(_) => "password",
        };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field(kind, &"[REDACTED]")
            .finish()
    }
}

/// Opaque session token issued by the authenticator.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value, only for transmission.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Options accompanying a document upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadOptions {
    /// Replace the embeddings already stored under the index name.
    #[serde(serialize_with = "serialize_yes_no")]
    pub overwrite: bool,
}

fn serialize_yes_no<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "yes" } else { "no" })
}

/// Parse a yes/no style flag as accepted on the command line.
pub fn parse_yes_no(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        other => Err(format!("expected yes or no, got '{other}'")),
    }
}

/// Local document to index under a named index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Path of the document on the local filesystem.
    pub document: PathBuf,
    /// Index that receives the document.
    pub index_name: String,
    /// Upload options sent alongside the document.
    pub options: UploadOptions,
}

/// Identifier of an index created by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IndexId(pub String);

impl IndexId {
    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Identifier to use for later queries.
    pub index: IndexId,
    /// Full response body returned by the service.
    pub raw: Value,
}

/// Natural-language question addressed to an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Question text.
    pub query: String,
    /// Index previously populated by an upload.
    pub index_name: String,
}

/// Answer produced by the extraction endpoint.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Generated answer text.
    pub answer: String,
    /// Full response body returned by the service.
    pub raw: Value,
}

/// Metadata the service reports for one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDetails {
    /// Name of the index.
    pub index_name: String,
    /// Remaining fields, preserved verbatim.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub(crate) username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) api_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) password: Option<&'a str>,
}

impl<'a> From<&'a Credentials> for AuthRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        let (api_key, password) = match &credentials.secret {
            Secret::ApiKey(key) => (Some(key.as_str()), None),
            Secret::Password(password) => (None, Some(password.as_str())),
        };
        Self {
            username: &credentials.username,
            api_key,
            password,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct AuthResponse {
    pub(crate) token: String,
}

#[derive(Serialize)]
pub(crate) struct ExtractRequest<'a> {
    pub(crate) query: &'a str,
    pub(crate) index_name: &'a str,
    pub(crate) options: Map<String, Value>,
}

#[derive(Deserialize)]
pub(crate) struct ExtractResponse {
    pub(crate) answer: String,
}

#[derive(Deserialize)]
pub(crate) struct IndicesDetailsResponse {
    #[serde(default)]
    pub(crate) indices_details: Vec<IndexDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overwrite_flag_is_sent_as_yes_or_no() {
        let yes = serde_json::to_value(UploadOptions { overwrite: true }).unwrap();
        let no = serde_json::to_value(UploadOptions::default()).unwrap();
        assert_eq!(yes, json!({ "overwrite": "yes" }));
        assert_eq!(no, json!({ "overwrite": "no" }));
    }

    #[test]
    fn yes_no_parser_accepts_common_spellings() {
        assert_eq!(parse_yes_no("YES"), Ok(true));
        assert_eq!(parse_yes_no("false"), Ok(false));
        assert!(parse_yes_no("maybe").is_err());
    }

    #[test]
    fn password_takes_precedence_over_api_key() {
        let creds = Credentials::resolve(
            Some("ada".into()),
            Some("key".into()),
            Some("pw".into()),
        )
        .expect("credentials");
        assert_eq!(creds.secret, Secret::Password("pw".into()));

        assert!(Credentials::resolve(None, Some("key".into()), None).is_none());
        assert!(Credentials::resolve(Some("ada".into()), None, None).is_none());
    }

    #[test]
    fn auth_body_carries_only_the_configured_secret() {
        let creds = Credentials::with_api_key("ada", "key-1");
        let body = serde_json::to_value(AuthRequest::from(&creds)).unwrap();
        assert_eq!(body, json!({ "username": "ada", "api_key": "key-1" }));
    }

    #[test]
    fn secrets_never_appear_in_debug_output() {
        let creds = Credentials::with_password("ada", "hunter2");
        let token = SessionToken::new("tok-abc");
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert!(!format!("{token:?}").contains("tok-abc"));
    }

    #[test]
    fn error_chain_names_each_cause_once() {
        let err = ClientError::Upload(Failure::LocalFile {
            path: PathBuf::from("missing.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });

        let mut chain = Vec::new();
        let mut current: Option<&dyn std::error::Error> = Some(&err);
        while let Some(error) = current {
            chain.push(error.to_string());
            current = error.source();
        }
        assert_eq!(
            chain,
            ["Document upload failed", "Failed to read missing.pdf", "no such file"]
        );
    }

    #[test]
    fn index_details_keep_unknown_fields() {
        let details: IndexDetails = serde_json::from_value(json!({
            "index_name": "handbook",
            "documents": 3
        }))
        .unwrap();
        assert_eq!(details.index_name, "handbook");
        assert_eq!(details.metadata["documents"], json!(3));
    }
}
