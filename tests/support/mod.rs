#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Builds an in-memory zip; names ending in `/` become directories.
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

pub fn addon_file(id: u64, file_name: &str, url: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "displayName": file_name.trim_end_matches(".zip").trim_end_matches(".jar"),
        "fileName": file_name,
        "downloadUrl": url,
    })
}

pub fn addon(
    id: u64,
    slug: &str,
    latest_files: Vec<serde_json::Value>,
    default_file_id: u64,
) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": slug,
        "slug": slug,
        "latestFiles": latest_files,
        "defaultFileId": default_file_id,
    })
}

pub fn other_addons(count: usize, start_id: u64) -> Vec<serde_json::Value> {
    (0..count as u64)
        .map(|i| addon(start_id + i, &format!("other-pack-{}", start_id + i), vec![], 0))
        .collect()
}
