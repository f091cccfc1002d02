//! Catalog backed by the project listing web pages.
//!
//! Pages are matched with a handful of regexes rather than a DOM. Everything
//! that depends on the page markup lives in this module.

use crate::catalog::{Catalog, CatalogKind, FileRecord, PrimaryFile};
use crate::error::CatalogError;
use crate::http::HttpClient;
use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use tracing::debug;

pub const DEFAULT_SCRAPE_BASE: &str = "https://minecraft.curseforge.com";

/// CSS class carried by every file link on a project's files page.
pub const FILE_LINK_CLASS: &str = "twitch-link";

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<a\b([^>]*)>(.*?)</a\s*>"));

static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)\bclass\s*=\s*["']([^"']*)["']"#));

static HREF_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)\bhref\s*=\s*["']([^"']*)["']"#));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<div[^>]*class\s*=\s*["'][^"']*\binfo-label\b[^"']*["'][^>]*>\s*Filename\s*</div>\s*<div[^>]*class\s*=\s*["'][^"']*\binfo-data\b[^"']*["'][^>]*>(.*?)</div>"#,
    )
});

/// A file link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLink {
    pub url: String,
    pub display_version: String,
}

impl FileLink {
    /// The trailing numeric path segment of the link, e.g. `2345678` in `/files/2345678`.
    pub fn file_id(&self) -> Option<u64> {
        let path = match Url::parse(&self.url) {
            Ok(url) => url.path().to_string(),
            Err(_) => self.url.clone(),
        };
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }
}

pub struct ScrapeCatalog {
    http: HttpClient,
    base_url: String,
}

impl ScrapeCatalog {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn files_url(&self, project: &str) -> Result<String, CatalogError> {
        self.project_url(&[project, "files"])
    }

    pub fn file_url(&self, project: &str, file_id: u64) -> Result<String, CatalogError> {
        self.project_url(&[project, "files", &file_id.to_string()])
    }

    /// `<base>/projects/<segments...>`, each segment percent-encoded.
    fn project_url(&self, segments: &[&str]) -> Result<String, CatalogError> {
        let invalid = |detail: String| CatalogError::InvalidUrl {
            url: self.base_url.clone(),
            detail,
        };
        let mut url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("not a base url".to_string()))?
            .pop_if_empty()
            .push("projects")
            .extend(segments);
        Ok(url.into())
    }

    /// Returns every file link on the page in document order; element 0 is the latest.
    pub fn list_files_for_project(&self, url: &str) -> Result<Vec<FileLink>, CatalogError> {
        let html = self.http.get_text(url)?;
        let base = Url::parse(url).ok();
        let links = extract_file_links(&html, base.as_ref());
        debug!(url, count = links.len(), "scraped file links");
        Ok(links)
    }

    /// Reads the file name from a per-file detail page.
    pub fn file_details(
        &self,
        detail_url: &str,
        file_id: u64,
        display_version: Option<&str>,
    ) -> Result<FileRecord, CatalogError> {
        let html = self.http.get_text(detail_url)?;
        let file_name = extract_file_name(&html).ok_or_else(|| CatalogError::Markup {
            url: detail_url.to_string(),
            detail: "file name".to_string(),
        })?;
        let display_version = display_version
            .map(str::to_string)
            .unwrap_or_else(|| file_name.clone());
        Ok(FileRecord {
            file_id,
            download_url: format!("{}/download", detail_url.trim_end_matches('/')),
            file_name,
            display_version,
            sha1: None,
        })
    }
}

impl Catalog for ScrapeCatalog {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Scrape
    }

    fn primary_file(&self, reference: &str) -> Result<PrimaryFile, CatalogError> {
        let url = self.files_url(reference)?;
        let links = self.list_files_for_project(&url)?;
        let latest = links
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(format!("files for project {reference}")))?;
        let file_id = latest.file_id().ok_or_else(|| CatalogError::Markup {
            url: url.clone(),
            detail: format!("file id in link {}", latest.url),
        })?;
        let file = self.file_details(&latest.url, file_id, Some(&latest.display_version))?;
        Ok(PrimaryFile {
            run_name: format!("{reference} {}", latest.display_version),
            file,
        })
    }

    fn resolve_file(&self, project_id: u64, file_id: u64) -> Result<FileRecord, CatalogError> {
        let url = self.file_url(&project_id.to_string(), file_id)?;
        self.file_details(&url, file_id, None).map_err(|err| match err {
            CatalogError::NotFound(_) => {
                CatalogError::NotFound(format!("file {file_id} in project {project_id}"))
            }
            other => other,
        })
    }
}

pub fn extract_file_links(html: &str, base: Option<&Url>) -> Vec<FileLink> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let has_class = CLASS_ATTR_RE
                .captures(attrs)
                .and_then(|c| c.get(1))
                .is_some_and(|c| c.as_str().split_whitespace().any(|cls| cls == FILE_LINK_CLASS));
            if !has_class {
                return None;
            }
            let href = HREF_ATTR_RE.captures(attrs)?.get(1)?.as_str().trim();
            let url = absolutize(&html_unescape(href), base);
            let text = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            Some(FileLink {
                url,
                display_version: inner_text(text),
            })
        })
        .collect()
}

pub fn extract_file_name(html: &str) -> Option<String> {
    FILENAME_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| inner_text(m.as_str()))
        .filter(|name| !name.is_empty())
}

fn absolutize(href: &str, base: Option<&Url>) -> String {
    match base.and_then(|b| b.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}

fn inner_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    html_unescape(&collapsed)
}

fn html_unescape(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
