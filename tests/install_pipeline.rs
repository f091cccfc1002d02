//! Full install runs against a mock catalog and CDN.

use cmpdl::api::ApiCatalog;
use cmpdl::catalog::{Catalog, CatalogKind};
use cmpdl::error::InstallError;
use cmpdl::http::{DEFAULT_USER_AGENT, HttpClient};
use cmpdl::install::{InstallOptions, InstallReport, install};
use cmpdl::scrape::ScrapeCatalog;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{addon, addon_file, build_zip};

const MANIFEST: &str = r#"{
    "minecraft": {"version": "1.16.5", "modLoaders": [{"id": "forge-36"}]},
    "manifestType": "minecraftModpack",
    "manifestVersion": 1,
    "files": [{"projectID": 1, "fileID": 10}, {"projectID": 2, "fileID": 20}],
    "overrides": "overrides"
}"#;

async fn mount_bytes(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_catalog(manifest: &str) -> MockServer {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/addon/search"))
        .and(query_param("searchFilter", "test-pack"))
        .and(query_param("index", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([addon(
            100,
            "test-pack",
            vec![addon_file(500, "Test Pack 1.0.zip", &format!("{base}/cdn/pack.zip"))],
            500,
        )])))
        .mount(&server)
        .await;

    let archive = build_zip(&[
        ("manifest.json", manifest),
        ("overrides/", ""),
        ("overrides/options.txt", "renderDistance:8"),
        ("overrides/config/", ""),
        ("overrides/config/mod-one.cfg", "enabled=true"),
    ]);
    mount_bytes(&server, "/cdn/pack.zip", archive).await;

    mount_json(
        &server,
        "/addon/1",
        addon(1, "mod-one", vec![addon_file(10, "mod-one.jar", &format!("{base}/cdn/mod-one.jar"))], 10),
    )
    .await;
    mount_json(
        &server,
        "/addon/2",
        addon(2, "mod-two", vec![addon_file(21, "mod-two-new.jar", &format!("{base}/cdn/mod-two-new.jar"))], 21),
    )
    .await;
    mount_json(
        &server,
        "/addon/2/files",
        json!([addon_file(20, "mod-two.jar", &format!("{base}/cdn/mod-two.jar"))]),
    )
    .await;
    mount_bytes(&server, "/cdn/mod-one.jar", b"mod one bytes".to_vec()).await;
    mount_bytes(&server, "/cdn/mod-two.jar", b"mod two bytes".to_vec()).await;

    server
}

async fn run_install(base: String, output_root: PathBuf) -> anyhow::Result<InstallReport> {
    run_install_with(CatalogKind::Api, base, output_root).await
}

async fn run_install_with(
    kind: CatalogKind,
    base: String,
    output_root: PathBuf,
) -> anyhow::Result<InstallReport> {
    tokio::task::spawn_blocking(move || {
        let http = HttpClient::new(DEFAULT_USER_AGENT)?;
        let catalog: Box<dyn Catalog> = match kind {
            CatalogKind::Api => Box::new(ApiCatalog::new(http.clone(), &base)),
            CatalogKind::Scrape => Box::new(ScrapeCatalog::new(http.clone(), &base)),
        };
        let options = InstallOptions {
            output_root,
            resolve_concurrency: 4,
            show_progress: false,
        };
        install(catalog.as_ref(), &http, "test-pack", &options)
    })
    .await
    .unwrap()
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test(flavor = "multi_thread")]
async fn full_run_assembles_dot_minecraft() {
    let server = mock_catalog(MANIFEST).await;
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("modpacks");

    let report = run_install(server.uri(), root.clone()).await.unwrap();

    let run_dir = root.join("Test Pack 1.0");
    assert_eq!(report.run_dir, run_dir);
    assert!(run_dir.join("Test Pack 1.0.zip").is_file());
    assert!(run_dir.join("extracted/manifest.json").is_file());

    let mods = run_dir.join(".minecraft/mods");
    assert_eq!(sorted_names(&mods), vec!["mod-one.jar", "mod-two.jar"]);
    assert_eq!(fs::read(mods.join("mod-one.jar")).unwrap(), b"mod one bytes");
    assert_eq!(
        report.mods,
        vec![mods.join("mod-one.jar"), mods.join("mod-two.jar")]
    );

    let dot_minecraft = run_dir.join(".minecraft");
    assert_eq!(
        fs::read_to_string(dot_minecraft.join("options.txt")).unwrap(),
        "renderDistance:8"
    );
    assert_eq!(
        fs::read_to_string(dot_minecraft.join("config/mod-one.cfg")).unwrap(),
        "enabled=true"
    );
    assert_eq!(report.overrides_copied, 2);
    assert_eq!(report.minecraft_version, "1.16.5");
    assert_eq!(report.mod_loaders, vec!["forge-36".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn second_run_conflicts_on_existing_directory() {
    let server = mock_catalog(MANIFEST).await;
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("modpacks");

    run_install(server.uri(), root.clone()).await.unwrap();
    let marker = root.join("Test Pack 1.0/.minecraft/mods/mod-one.jar");
    fs::write(&marker, b"local edit").unwrap();

    let err = run_install(server.uri(), root.clone()).await.unwrap_err();

    match err.downcast_ref::<InstallError>() {
        Some(InstallError::AlreadyExists(path)) => {
            assert_eq!(path, &root.join("Test Pack 1.0"));
        }
        other => panic!("expected AlreadyExists, got {other:?} ({err:#})"),
    }
    assert_eq!(fs::read(&marker).unwrap(), b"local edit");
}

#[tokio::test(flavor = "multi_thread")]
async fn manifest_without_overrides_skips_copy() {
    let manifest = r#"{
        "minecraft": {"version": "1.12.2"},
        "files": [{"projectID": 1, "fileID": 10}]
    }"#;
    let server = mock_catalog(manifest).await;
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("modpacks");

    let report = run_install(server.uri(), root.clone()).await.unwrap();

    let dot_minecraft = root.join("Test Pack 1.0/.minecraft");
    assert_eq!(sorted_names(&dot_minecraft), vec!["mods"]);
    assert_eq!(report.overrides_copied, 0);
    assert!(report.mod_loaders.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unresolvable_mod_aborts_before_downloads() {
    let manifest = r#"{
        "minecraft": {"version": "1.16.5"},
        "files": [{"projectID": 1, "fileID": 10}, {"projectID": 9, "fileID": 90}]
    }"#;
    let server = mock_catalog(manifest).await;
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("modpacks");

    let err = run_install(server.uri(), root.clone()).await.unwrap_err();

    assert!(
        err.chain().any(|cause| cause.to_string().contains("project 9")),
        "{err:#}"
    );
    let mods = root.join("Test Pack 1.0/.minecraft/mods");
    assert!(sorted_names(&mods).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn checksum_mismatch_is_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/addon/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 100,
            "name": "Test Pack",
            "slug": "test-pack",
            "defaultFileId": 500,
            "latestFiles": [{
                "id": 500,
                "displayName": "Test Pack 1.0",
                "fileName": "pack.zip",
                "downloadUrl": format!("{base}/cdn/pack.zip"),
                "hashes": [{"value": "0000000000000000000000000000000000000000", "algo": 1}]
            }]
        }])))
        .mount(&server)
        .await;
    mount_bytes(&server, "/cdn/pack.zip", b"not what was promised".to_vec()).await;
    let tmp = tempfile::tempdir().unwrap();

    let err = run_install(base, tmp.path().join("modpacks")).await.unwrap_err();

    assert!(
        matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::ChecksumMismatch { .. })
        ),
        "{err:#}"
    );
}

fn detail_page(file_name: &str) -> String {
    format!(
        r#"<html><body>
        <div class="info-label">Filename</div>
        <div class="info-data overflow-tip">{file_name}</div>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn scrape_run_uses_listing_and_detail_pages() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/projects/test-pack/files",
        r#"<table>
            <tr><td><a class="overflow-tip twitch-link" href="/projects/test-pack/files/500">Test Pack 1.0</a></td></tr>
            <tr><td><a class="twitch-link" href="/projects/test-pack/files/400">Test Pack 0.9</a></td></tr>
        </table>"#
            .to_string(),
    )
    .await;
    mount_html(&server, "/projects/test-pack/files/500", detail_page("test-pack-1.0.zip")).await;
    let archive = build_zip(&[
        ("manifest.json", MANIFEST),
        ("overrides/", ""),
        ("overrides/options.txt", "renderDistance:8"),
    ]);
    mount_bytes(&server, "/projects/test-pack/files/500/download", archive).await;

    mount_html(&server, "/projects/1/files/10", detail_page("mod-one.jar")).await;
    mount_html(&server, "/projects/2/files/20", detail_page("mod-two.jar")).await;
    mount_bytes(&server, "/projects/1/files/10/download", b"mod one bytes".to_vec()).await;
    mount_bytes(&server, "/projects/2/files/20/download", b"mod two bytes".to_vec()).await;

    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("download");

    let report = run_install_with(CatalogKind::Scrape, server.uri(), root.clone())
        .await
        .unwrap();

    let run_dir = root.join("test-pack Test Pack 1.0");
    assert_eq!(report.run_dir, run_dir);
    assert!(run_dir.join("test-pack-1.0.zip").is_file());

    let mods = run_dir.join(".minecraft/mods");
    assert_eq!(
        report.mods,
        vec![mods.join("mod-one.jar"), mods.join("mod-two.jar")]
    );
    assert_eq!(fs::read(mods.join("mod-one.jar")).unwrap(), b"mod one bytes");
    assert_eq!(fs::read(mods.join("mod-two.jar")).unwrap(), b"mod two bytes");
    assert_eq!(
        fs::read_to_string(run_dir.join(".minecraft/options.txt")).unwrap(),
        "renderDistance:8"
    );
    assert_eq!(report.overrides_copied, 1);
}
