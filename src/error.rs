//! Error types shared by the catalog clients and the install pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while talking to a modpack catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The project, file, or page does not exist on the catalog
    #[error("not found: {0}")]
    NotFound(String),

    /// The catalog rejected the request (4xx other than 404)
    #[error("client error {status} from {url}")]
    ClientError { url: String, status: u16 },

    /// The catalog failed to answer (5xx)
    #[error("server error {status} from {url}")]
    ServerError { url: String, status: u16 },

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The page was fetched but did not have the expected structure
    #[error("could not read {detail} from {url}")]
    Markup { url: String, detail: String },

    #[error("file {file_id} in project {project_id} has no download url")]
    Unavailable { project_id: u64, file_id: u64 },

    #[error("invalid catalog url {url}: {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

/// Failures of the install pipeline that callers need to tell apart.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("there's already a folder at {0}; delete it to download the project again")]
    AlreadyExists(PathBuf),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}
