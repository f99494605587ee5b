//! Description of a single workflow run.

use crate::remote::{Credentials, QueryRequest, UploadOptions, UploadRequest};
use crate::workflow::WorkflowError;
use std::path::PathBuf;

/// Steps requested for one run, in execution order.
#[derive(Debug, Clone)]
pub struct FlowPlan {
    /// Credentials exchanged for the session token.
    pub credentials: Credentials,
    /// Optional configuration file uploaded right after authentication.
    pub config_file: Option<PathBuf>,
    /// Document to index.
    pub document: Option<PathBuf>,
    /// Index shared by the upload and the query.
    pub index_name: Option<String>,
    /// Upload options.
    pub options: UploadOptions,
    /// Question to ask against the index.
    pub query: Option<String>,
    /// List the account's indices at the end of the run.
    pub inspect_indices: bool,
    /// Answer upload/extract steps from stored responses when present.
    pub reuse_cached: bool,
}

impl FlowPlan {
    /// Plan that only authenticates.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            config_file: None,
            document: None,
            index_name: None,
            options: UploadOptions::default(),
            query: None,
            inspect_indices: false,
            reuse_cached: false,
        }
    }

    /// Upload request for this plan, if a document was given.
    pub fn upload_request(&self) -> Result<Option<UploadRequest>, WorkflowError> {
        let Some(document) = &self.document else {
            return Ok(None);
        };
        let index_name = self.required_index_name("upload")?;
        Ok(Some(UploadRequest {
            document: document.clone(),
            index_name,
            options: self.options,
        }))
    }

    /// Query request for this plan, if a question was given.
    pub fn query_request(&self) -> Result<Option<QueryRequest>, WorkflowError> {
        let Some(query) = &self.query else {
            return Ok(None);
        };
        if query.trim().is_empty() {
            return Err(WorkflowError::EmptyQuery);
        }
        let index_name = self.required_index_name("extract")?;
        Ok(Some(QueryRequest {
            query: query.clone(),
            index_name,
        }))
    }

    /// Check the plan before any call is made.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        self.upload_request()?;
        self.query_request()?;
        Ok(())
    }

    fn required_index_name(&self, step: &'static str) -> Result<String, WorkflowError> {
        self.index_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or(WorkflowError::MissingIndexName { step })
    }
}
