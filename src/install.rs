//! The install pipeline: resolve the modpack, fetch and unpack it, then fetch
//! every mod its manifest lists and lay out a `.minecraft` folder.

use crate::archive;
use crate::catalog::{Catalog, FileRecord};
use crate::download::{DownloadTask, Downloader, plan_downloads};
use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::manifest::{FileReference, Manifest, load_manifest};
use crate::paths::RunLayout;
use crate::util::{copy_dir_overwrite, sanitize_filename};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub output_root: PathBuf,
    pub resolve_concurrency: usize,
    pub show_progress: bool,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub run_dir: PathBuf,
    pub dot_minecraft: PathBuf,
    pub minecraft_version: String,
    pub mod_loaders: Vec<String>,
    pub mods: Vec<PathBuf>,
    pub overrides_copied: usize,
}

pub fn install(
    catalog: &dyn Catalog,
    http: &HttpClient,
    reference: &str,
    options: &InstallOptions,
) -> Result<InstallReport> {
    println!("Searching for project main file");
    let primary = catalog
        .primary_file(reference)
        .with_context(|| format!("failed to resolve project {reference}"))?;
    info!(catalog = %catalog.kind(), file_id = primary.file.file_id, "resolved primary file");

    let layout = RunLayout::new(&options.output_root, &primary.run_name);
    layout.create_run_dir()?;

    let downloader = Downloader::new(http, options.show_progress);
    let archive_path = layout.archive_path(&sanitize_filename(&primary.file.file_name));
    println!(
        "Downloading project main file v.{}",
        primary.file.display_version
    );
    let archive_task = DownloadTask::new(primary.file.download_url.clone(), archive_path.clone())
        .with_sha1(primary.file.sha1.clone());
    downloader.download(&archive_task)?;

    println!("Extracting...");
    archive::expand(&archive_path, &layout.extracted)?;
    println!("Extracted");

    let manifest = load_manifest(&layout.manifest_path())?;
    layout.create_game_dirs()?;

    println!("Generating file list...");
    let records = resolve_manifest_files(catalog, &manifest.files, options.resolve_concurrency)
        .context("failed to generate file list")?;
    println!("Generated file list!");

    let tasks = plan_downloads(&records, &layout.mods);
    println!("There's {} mods to download...", tasks.len());
    println!("Starting downloading mods...");
    let mods = run_downloads(&downloader, &tasks)?;
    println!("Finished downloading");

    println!("Finishing job...");
    let overrides_copied = copy_overrides(&manifest, &layout)?;

    let report = InstallReport {
        run_dir: layout.run_dir.clone(),
        dot_minecraft: layout.dot_minecraft.clone(),
        minecraft_version: manifest.minecraft.version.clone(),
        mod_loaders: manifest.loader_ids().into_iter().map(str::to_string).collect(),
        mods,
        overrides_copied,
    };
    print_summary(&report);
    Ok(report)
}

/// Resolves every manifest entry, a batch at a time, keeping manifest order.
///
/// The first failure in manifest order is returned.
pub fn resolve_manifest_files(
    catalog: &dyn Catalog,
    files: &[FileReference],
    concurrency: usize,
) -> Result<Vec<FileRecord>, CatalogError> {
    let mut records = Vec::with_capacity(files.len());
    for batch in files.chunks(concurrency.max(1)) {
        let results: Vec<Result<FileRecord, CatalogError>> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|file| {
                    scope.spawn(move || catalog.resolve_file(file.project_id, file.file_id))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });
        for result in results {
            let record = result?;
            debug!(file_id = record.file_id, name = %record.file_name, "resolved");
            records.push(record);
        }
    }
    Ok(records)
}

/// Runs the tasks one after another; each owns the progress line while it runs.
pub fn run_downloads(downloader: &Downloader<'_>, tasks: &[DownloadTask]) -> Result<Vec<PathBuf>> {
    let mut done = Vec::with_capacity(tasks.len());
    for task in tasks {
        downloader.download(task)?;
        done.push(task.destination.clone());
    }
    Ok(done)
}

fn copy_overrides(manifest: &Manifest, layout: &RunLayout) -> Result<usize> {
    let Some(overrides) = manifest.overrides_dir(&layout.extracted) else {
        return Ok(0);
    };
    if !overrides.is_dir() {
        info!(path = %overrides.display(), "manifest names an overrides folder the archive does not have");
        return Ok(0);
    }
    println!("Copying overrides...");
    let copied = copy_dir_overwrite(&overrides, &layout.dot_minecraft)?;
    println!("Copied overrides!");
    Ok(copied)
}

fn print_summary(report: &InstallReport) {
    println!("Finished!");
    println!(
        "Now you have to install minecraft {}",
        report.minecraft_version
    );
    if !report.mod_loaders.is_empty() {
        println!("Then you need to install mod loaders: ");
        for loader in &report.mod_loaders {
            println!("{loader}");
        }
    }
    println!(
        "After that copy everything from {}\nto your downloaded .minecraft and you're ready to go!",
        report.dot_minecraft.display()
    );
}
