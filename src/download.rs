//! Streaming file downloads with a single re-rendered progress line.

use crate::catalog::FileRecord;
use crate::error::InstallError;
use crate::http::HttpClient;
use crate::util::{sanitize_filename, sha1_file};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LABEL_WIDTH: usize = 40;
const LABEL_HEAD: usize = 30;
const LABEL_TAIL: usize = 7;

const PROGRESS_TEMPLATE: &str =
    "{prefix}{msg} [{bar:40}] {percent}% | {kb_done}KB/{kb_total}KB ({kb_speed} KB/s) {eta_secs}s";

/// One file to fetch; consumed by [`Downloader::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub source_url: String,
    pub destination: PathBuf,
    /// Fixed-width text shown before the file label, e.g. `(3/120) `
    pub prefix: String,
    pub sha1: Option<String>,
}

impl DownloadTask {
    pub fn new(source_url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            destination: destination.into(),
            prefix: String::new(),
            sha1: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_sha1(mut self, sha1: Option<String>) -> Self {
        self.sha1 = sha1;
        self
    }

    pub fn label(&self) -> String {
        let name = self
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format_label(&name)
    }
}

/// Builds one task per record, in record order, each numbered `(i/total)`.
pub fn plan_downloads(records: &[FileRecord], target_dir: &Path) -> Vec<DownloadTask> {
    let total = records.len();
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            DownloadTask::new(
                record.download_url.clone(),
                target_dir.join(sanitize_filename(&record.file_name)),
            )
            .with_prefix(counter_prefix(i + 1, total))
            .with_sha1(record.sha1.clone())
        })
        .collect()
}

/// Pads a label to exactly [`LABEL_WIDTH`] characters, or shortens it to
/// the first 30 characters, `...` and the last 7.
pub fn format_label(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() > LABEL_WIDTH {
        let head: String = chars[..LABEL_HEAD].iter().collect();
        let tail: String = chars[chars.len() - LABEL_TAIL..].iter().collect();
        format!("{head}...{tail}")
    } else {
        format!("{name:<LABEL_WIDTH$}")
    }
}

/// `(index/total) ` right-padded to the width of `(total/total) `.
pub fn counter_prefix(index: usize, total: usize) -> String {
    let width = format!("({total}/{total}) ").len();
    format!("{:<width$}", format!("({index}/{total}) "))
}

pub struct Downloader<'a> {
    http: &'a HttpClient,
    show_progress: bool,
}

impl<'a> Downloader<'a> {
    pub fn new(http: &'a HttpClient, show_progress: bool) -> Self {
        Self {
            http,
            show_progress,
        }
    }

    /// Streams the task's URL into its destination, creating or replacing the file.
    pub fn download(&self, task: &DownloadTask) -> Result<u64> {
        let response = self.http.get(&task.source_url)?;
        let total = response.content_length();
        if total.is_none() {
            warn!(url = %task.source_url, "no content length; progress is indeterminate");
        }

        let bar = self.progress_bar(total);
        bar.set_prefix(task.prefix.clone());
        bar.set_message(task.label());

        let mut out = fs::File::create(&task.destination).with_context(|| {
            format!("failed to create file: {}", task.destination.display())
        })?;
        let mut reader = bar.wrap_read(response);
        let written = std::io::copy(&mut reader, &mut out)
            .with_context(|| format!("failed to download {}", task.source_url))?;
        out.flush().with_context(|| {
            format!("failed to flush file: {}", task.destination.display())
        })?;

        if total.is_none() {
            bar.set_length(bar.position());
        }
        bar.finish();
        debug!(url = %task.source_url, bytes = written, "downloaded");

        if let Some(expected) = &task.sha1 {
            verify_sha1(&task.destination, expected)?;
        }
        Ok(written)
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        let target = if self.show_progress {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(total, target);
        bar.set_style(progress_style());
        bar
    }
}

fn verify_sha1(path: &Path, expected: &str) -> Result<()> {
    let actual = sha1_file(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(InstallError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        }
        .into());
    }
    Ok(())
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("kb_done", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{}", state.pos() / 1024);
        })
        .with_key("kb_total", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{}", state.len().unwrap_or(state.pos()) / 1024);
        })
        .with_key("kb_speed", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{}", (state.per_sec() / 1024.0) as u64);
        })
        .with_key("eta_secs", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{}", state.eta().as_secs());
        })
        .progress_chars("#-")
}
