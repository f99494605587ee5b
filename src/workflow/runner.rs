//! Sequential execution of a [`FlowPlan`].

use crate::remote::{
    Answer, ClientError, Failure, IndexDetails, IndexId, SessionToken, index_id_from,
};
use crate::store::{ResponseKind, ResponseStore};
use crate::workflow::{DocumentApi, FlowPlan, WorkflowError};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// What a completed run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowReport {
    /// Index that received the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexId>,
    /// Answer to the query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Indices owned by the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<IndexDetails>>,
}

/// Run Authenticate → Configure → Upload → Extract → Inspect, skipping steps the plan omits.
///
/// When a store is supplied, successful upload and extract responses are written to it, and
/// with `plan.reuse_cached` a stored response replaces the corresponding call.
pub async fn run_flow<A>(
    api: &A,
    store: Option<&ResponseStore>,
    plan: &FlowPlan,
) -> Result<FlowReport, WorkflowError>
where
    A: DocumentApi + ?Sized,
{
    plan.validate()?;
    let mut report = FlowReport::default();

    let token = api.authenticate(&plan.credentials).await?;

    if let Some(config_file) = &plan.config_file {
        api.upload_config(&token, config_file).await?;
    }

    if let Some(request) = plan.upload_request()? {
        ensure_readable(&request.document).await?;
        let index = match cached(store, plan, ResponseKind::Upload)? {
            Some(raw) => index_id_from(&raw, &request.index_name)
                .map_err(|source| WorkflowError::StaleCache { source })?,
            None => {
                let outcome = api.upload_document(&token, &request).await?;
                persist(store, ResponseKind::Upload, &outcome.raw)?;
                outcome.index
            }
        };
        report.index = Some(index);
    }

    if let Some(request) = plan.query_request()? {
        let answer = match cached(store, plan, ResponseKind::Extract)? {
            Some(raw) => raw
                .get("answer")
                .and_then(Value::as_str)
                .map(str::to_string),
            None => None,
        };
        let answer = match answer {
            Some(answer) => answer,
            None => {
                let Answer { answer, raw } = api.extract_information(&token, &request).await?;
                persist(store, ResponseKind::Extract, &raw)?;
                answer
            }
        };
        tracing::info!(index = %request.index_name, answer = %answer, "Answer retrieved");
        report.answer = Some(answer);
    }

    if plan.inspect_indices {
        report.indices = Some(inspect(api, &token).await?);
    }

    Ok(report)
}

async fn inspect<A>(api: &A, token: &SessionToken) -> Result<Vec<IndexDetails>, WorkflowError>
where
    A: DocumentApi + ?Sized,
{
    let indices = api.get_indices_details(token).await?;
    tracing::info!(count = indices.len(), "Listed indices");
    Ok(indices)
}

/// A stored upload response never stands in for a document that is gone.
async fn ensure_readable(document: &Path) -> Result<(), WorkflowError> {
    tokio::fs::metadata(document)
        .await
        .map_err(|source| {
            ClientError::Upload(Failure::LocalFile {
                path: document.to_path_buf(),
                source,
            })
        })?;
    Ok(())
}

fn cached(
    store: Option<&ResponseStore>,
    plan: &FlowPlan,
    kind: ResponseKind,
) -> Result<Option<Value>, WorkflowError> {
    match store {
        Some(store) if plan.reuse_cached => {
            let value = store.load(kind)?;
            if value.is_some() {
                tracing::info!(path = %store.path_for(kind).display(), "Returning stored response");
            }
            Ok(value)
        }
        _ => Ok(None),
    }
}

fn persist(
    store: Option<&ResponseStore>,
    kind: ResponseKind,
    raw: &Value,
) -> Result<(), WorkflowError> {
    if let Some(store) = store {
        let path = store.save(kind, raw)?;
        tracing::info!(path = %path.display(), "Response stored");
    }
    Ok(())
}
