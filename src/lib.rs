//! Resolve a CurseForge modpack, download it and every mod its manifest lists,
//! and assemble a `.minecraft` folder ready to copy into a game install.

pub mod api;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod manifest;
pub mod paths;
pub mod scrape;
pub mod util;

pub use catalog::{Catalog, CatalogKind, FileRecord, PrimaryFile, ProjectRecord};
pub use error::{CatalogError, InstallError};
