//! Remote document-intelligence service integration.

pub mod client;
/// Response envelope decoding shared by every operation.
pub mod envelope;
pub mod types;

pub use client::DocumentClient;
pub use envelope::index_id_from;
pub use types::{
    Answer, ClientError, Credentials, Failure, IndexDetails, IndexId, QueryRequest, Secret,
    SessionToken, UploadOptions, UploadOutcome, UploadRequest, parse_yes_no,
};
