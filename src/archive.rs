use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// Extracts every entry of a zip archive under `target_dir`.
pub fn expand(archive_path: &Path, target_dir: &Path) -> Result<usize> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("failed to open archive: {}", archive_path.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("failed to read archive: {}", archive_path.display()))?;
    fs::create_dir_all(target_dir)
        .with_context(|| format!("failed to create dir: {}", target_dir.display()))?;
    expand_entries(&mut zip, target_dir)
}

fn expand_entries<R: Read + Seek>(zip: &mut ZipArchive<R>, target_dir: &Path) -> Result<usize> {
    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("failed to read zip entry")?;
        let name = entry.name().replace('\\', "/");
        let rel = sanitize_rel_path(&name)?;
        let target = target_dir.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create dir: {}", target.display()))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create dir: {}", parent.display()))?;
        }
        let mut out = fs::File::create(&target)
            .with_context(|| format!("failed to write extracted file: {}", target.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract {name}"))?;
        out.flush()
            .with_context(|| format!("failed to flush {}", target.display()))?;
        written += 1;
    }
    Ok(written)
}

fn sanitize_rel_path(path: &str) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for comp in Path::new(path).components() {
        match comp {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => bail!("invalid path in archive: {}", path),
        }
    }
    if out.as_os_str().is_empty() {
        bail!("invalid empty path in archive");
    }
    Ok(out)
}
