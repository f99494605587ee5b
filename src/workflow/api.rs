//! Transport seam between the workflow runner and the remote service.

use crate::remote::{
    Answer, ClientError, Credentials, DocumentClient, IndexDetails, QueryRequest, SessionToken,
    UploadOutcome, UploadRequest,
};
use async_trait::async_trait;
use std::path::Path;

/// Operations the workflow needs from the document service.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Exchange credentials for a session token.
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, ClientError>;

    /// Upload a service-side configuration file.
    async fn upload_config(&self, token: &SessionToken, path: &Path) -> Result<(), ClientError>;

    /// Index a local document.
    async fn upload_document(
        &self,
        token: &SessionToken,
        request: &UploadRequest,
    ) -> Result<UploadOutcome, ClientError>;

    /// Ask a question against an index.
    async fn extract_information(
        &self,
        token: &SessionToken,
        request: &QueryRequest,
    ) -> Result<Answer, ClientError>;

    /// List the indices owned by the account.
    async fn get_indices_details(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<IndexDetails>, ClientError>;
}

#[async_trait]
impl DocumentApi for DocumentClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, ClientError> {
        DocumentClient::authenticate(self, credentials).await
    }

    async fn upload_config(&self, token: &SessionToken, path: &Path) -> Result<(), ClientError> {
        DocumentClient::upload_config(self, token, path).await
    }

    async fn upload_document(
        &self,
        token: &SessionToken,
        request: &UploadRequest,
    ) -> Result<UploadOutcome, ClientError> {
        DocumentClient::upload_document(self, token, request).await
    }

    async fn extract_information(
        &self,
        token: &SessionToken,
        request: &QueryRequest,
    ) -> Result<Answer, ClientError> {
        DocumentClient::extract_information(self, token, request).await
    }

    async fn get_indices_details(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<IndexDetails>, ClientError> {
        DocumentClient::get_indices_details(self, token).await
    }
}
