//! Linear client workflow: authenticate, configure, upload, extract, inspect.

pub mod api;
pub mod plan;
pub mod runner;

pub use api::DocumentApi;
pub use plan::FlowPlan;
pub use runner::{FlowReport, run_flow};

use crate::{
    remote::{ClientError, Failure},
    store::StoreError,
};
use thiserror::Error;

/// Errors that end a workflow run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A step needs an index name and none was given.
    #[error("An index name is required for the {step} step")]
    MissingIndexName {
        /// Step that required the index name.
        step: &'static str,
    },
    /// The query text was blank.
    #[error("Query text must not be empty")]
    EmptyQuery,
    /// A service call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Stored responses could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A stored upload response no longer describes a usable index.
    #[error("Stored upload response is unusable")]
    StaleCache {
        /// Why the stored response was rejected.
        #[source]
        source: Failure,
    },
}
