//! The interface every modpack catalog implements.
//!
//! The rest of the pipeline only sees [`Catalog`], so it does not care whether
//! records come from the search API or from scraped listing pages.

use crate::error::CatalogError;
use std::path::PathBuf;

/// Which backing catalog a run talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CatalogKind {
    /// Structured JSON search API
    Api,
    /// HTML listing pages
    Scrape,
}

impl CatalogKind {
    pub fn default_output_root(self) -> PathBuf {
        match self {
            CatalogKind::Api => PathBuf::from("modpacks"),
            CatalogKind::Scrape => PathBuf::from("download"),
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Api => write!(f, "api"),
            CatalogKind::Scrape => write!(f, "scrape"),
        }
    }
}

/// One downloadable archive belonging to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub file_id: u64,
    pub file_name: String,
    pub download_url: String,
    pub display_version: String,
    /// Lowercase hex SHA-1, when the catalog publishes one
    pub sha1: Option<String>,
}

/// A project as returned by the catalog; fetched once per run and never mutated.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: u64,
    pub slug: String,
    pub name: String,
    /// Most recent first
    pub latest_files: Vec<FileRecord>,
    pub default_file_id: u64,
}

impl ProjectRecord {
    pub fn latest_file(&self, file_id: u64) -> Option<&FileRecord> {
        self.latest_files.iter().find(|f| f.file_id == file_id)
    }
}

/// The modpack archive a run starts from.
#[derive(Debug, Clone)]
pub struct PrimaryFile {
    /// Human-readable name of the run, before sanitizing into a directory name
    pub run_name: String,
    pub file: FileRecord,
}

pub trait Catalog: Send + Sync {
    fn kind(&self) -> CatalogKind;

    /// Finds the archive to install for a user-supplied project reference.
    fn primary_file(&self, reference: &str) -> Result<PrimaryFile, CatalogError>;

    /// Resolves one manifest entry to a downloadable file.
    fn resolve_file(&self, project_id: u64, file_id: u64) -> Result<FileRecord, CatalogError>;
}
