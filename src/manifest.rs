use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub minecraft: MinecraftInfo,
    #[serde(default)]
    pub files: Vec<FileReference>,
    #[serde(default)]
    pub overrides: Option<String>,
    #[serde(default)]
    pub manifest_type: Option<String>,
    #[serde(default)]
    pub manifest_version: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinecraftInfo {
    pub version: String,
    #[serde(default)]
    pub mod_loaders: Vec<ModLoader>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModLoader {
    pub id: String,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FileReference {
    #[serde(rename = "projectID")]
    pub project_id: u64,
    #[serde(rename = "fileID")]
    pub file_id: u64,
    // Carried for completeness; optional files are still downloaded.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl Manifest {
    pub fn loader_ids(&self) -> Vec<&str> {
        self.minecraft
            .mod_loaders
            .iter()
            .map(|loader| loader.id.as_str())
            .collect()
    }

    /// The overrides folder inside the extracted archive, if the manifest names one.
    pub fn overrides_dir(&self, extracted: &Path) -> Option<PathBuf> {
        self.overrides
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(|dir| extracted.join(dir))
    }
}

pub fn parse_manifest(data: &str) -> Result<Manifest> {
    serde_json::from_str(data).context("failed to parse manifest")
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    parse_manifest(&data).with_context(|| format!("bad manifest: {}", path.display()))
}
