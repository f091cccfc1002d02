use crate::catalog::{Catalog, CatalogKind, FileRecord, PrimaryFile, ProjectRecord};
use crate::error::CatalogError;
use crate::http::HttpClient;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://addons-ecs.forgesvc.net/api/v2";
pub const SEARCH_PAGE_SIZE: usize = 20;

const MINECRAFT_GAME_ID: &str = "432";
const MODPACKS_SECTION_ID: &str = "4471";
const HASH_ALGO_SHA1: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonJson {
    id: u64,
    #[serde(default)]
    name: String,
    slug: String,
    #[serde(default)]
    latest_files: Vec<AddonFileJson>,
    #[serde(default)]
    default_file_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonFileJson {
    id: u64,
    #[serde(default)]
    display_name: String,
    file_name: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    hashes: Vec<FileHashJson>,
}

#[derive(Debug, Deserialize)]
struct FileHashJson {
    value: String,
    algo: u32,
}

impl AddonFileJson {
    fn into_record(self, project_id: u64) -> Result<FileRecord, CatalogError> {
        let download_url = self
            .download_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(CatalogError::Unavailable {
                project_id,
                file_id: self.id,
            })?;
        let sha1 = self
            .hashes
            .iter()
            .find(|h| h.algo == HASH_ALGO_SHA1)
            .map(|h| h.value.to_lowercase());
        let display_version = if self.display_name.is_empty() {
            self.file_name.clone()
        } else {
            self.display_name
        };
        Ok(FileRecord {
            file_id: self.id,
            file_name: self.file_name,
            download_url,
            display_version,
            sha1,
        })
    }
}

impl AddonJson {
    /// Keeps only the latest files that can actually be downloaded.
    fn into_project(self) -> ProjectRecord {
        let id = self.id;
        let latest_files = downloadable(id, self.latest_files);
        ProjectRecord {
            id,
            slug: self.slug,
            name: self.name,
            latest_files,
            default_file_id: self.default_file_id,
        }
    }
}

fn downloadable(project_id: u64, files: Vec<AddonFileJson>) -> Vec<FileRecord> {
    files
        .into_iter()
        .filter_map(|file| match file.into_record(project_id) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!(%err, "skipping file");
                None
            }
        })
        .collect()
}

/// Catalog backed by the addon search API.
pub struct ApiCatalog {
    http: HttpClient,
    base_url: String,
}

impl ApiCatalog {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Pages through the search endpoint until a project with exactly this slug shows up.
    ///
    /// Stops with [`CatalogError::NotFound`] on the first empty page.
    pub fn resolve_project_by_slug(&self, slug: &str) -> Result<ProjectRecord, CatalogError> {
        self.search_addon(slug).map(AddonJson::into_project)
    }

    pub fn project_by_id(&self, project_id: u64) -> Result<ProjectRecord, CatalogError> {
        self.fetch_addon(project_id).map(AddonJson::into_project)
    }

    /// Every file of the project that has a download url.
    pub fn project_files(&self, project_id: u64) -> Result<Vec<FileRecord>, CatalogError> {
        Ok(downloadable(project_id, self.fetch_files(project_id)?))
    }

    fn search_addon(&self, slug: &str) -> Result<AddonJson, CatalogError> {
        let url = format!("{}/addon/search", self.base_url);
        let mut index = 0usize;
        loop {
            let query = [
                ("gameId", MINECRAFT_GAME_ID.to_string()),
                ("categoryId", "0".to_string()),
                ("searchFilter", slug.to_string()),
                ("pageSize", SEARCH_PAGE_SIZE.to_string()),
                ("index", index.to_string()),
                ("sort", "1".to_string()),
                ("sortDescending", "true".to_string()),
                ("sectionId", MODPACKS_SECTION_ID.to_string()),
            ];
            let results: Vec<AddonJson> = self.http.get_json_with_query(&url, &query)?;
            debug!(slug, index, count = results.len(), "search page");
            if results.is_empty() {
                return Err(CatalogError::NotFound(format!("project {slug}")));
            }
            if let Some(addon) = results.into_iter().find(|p| p.slug == slug) {
                return Ok(addon);
            }
            index += SEARCH_PAGE_SIZE;
        }
    }

    fn fetch_addon(&self, project_id: u64) -> Result<AddonJson, CatalogError> {
        let url = format!("{}/addon/{project_id}", self.base_url);
        self.http.get_json(&url).map_err(|err| match err {
            CatalogError::NotFound(_) => CatalogError::NotFound(format!("project {project_id}")),
            other => other,
        })
    }

    fn fetch_files(&self, project_id: u64) -> Result<Vec<AddonFileJson>, CatalogError> {
        let url = format!("{}/addon/{project_id}/files", self.base_url);
        self.http.get_json(&url)
    }

    /// Looks in the project's latest files first, then in its full file list.
    ///
    /// Only the matching entry has to be downloadable; siblings are never converted.
    fn file_in_addon(&self, addon: AddonJson, file_id: u64) -> Result<FileRecord, CatalogError> {
        let project_id = addon.id;
        let file = match addon.latest_files.into_iter().find(|f| f.id == file_id) {
            Some(file) => file,
            None => {
                debug!(project_id, file_id, "file not among latest files");
                self.fetch_files(project_id)?
                    .into_iter()
                    .find(|f| f.id == file_id)
                    .ok_or_else(|| {
                        CatalogError::NotFound(format!("file {file_id} in project {project_id}"))
                    })?
            }
        };
        file.into_record(project_id)
    }
}

impl Catalog for ApiCatalog {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Api
    }

    fn primary_file(&self, reference: &str) -> Result<PrimaryFile, CatalogError> {
        let addon = match reference.parse::<u64>() {
            Ok(id) => self.fetch_addon(id)?,
            Err(_) => self.search_addon(reference)?,
        };
        let default_file_id = addon.default_file_id;
        let file = self.file_in_addon(addon, default_file_id)?;
        Ok(PrimaryFile {
            run_name: file.display_version.clone(),
            file,
        })
    }

    fn resolve_file(&self, project_id: u64, file_id: u64) -> Result<FileRecord, CatalogError> {
        let addon = self.fetch_addon(project_id)?;
        self.file_in_addon(addon, file_id)
    }
}
