use assetrev::{
    FileRecord, OutputMode, RunConfig, RunError, ScanOptions, WarningKind, load_manifest, run_all,
    run_config,
};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_assets(root: &Path) {
    fs::create_dir_all(root.join("css")).unwrap();
    fs::create_dir_all(root.join("js/vendor")).unwrap();
    fs::write(root.join("css/site.css"), "body{}").unwrap();
    fs::write(root.join("css/print.css"), "@media print{}").unwrap();
    fs::write(root.join("js/app.js"), "app()").unwrap();
    fs::write(root.join("js/vendor/lib.min.js"), "lib()").unwrap();
    fs::write(root.join("README.md"), "# assets").unwrap();
}

fn options() -> ScanOptions {
    ScanOptions::new().with_channel_capacity(2).with_workers(3)
}

fn sources(records: &[FileRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.source.clone()).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_writes_filtered_manifest() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("assets");
    create_assets(&root);
    let manifest = temp.path().join("manifest.json");

    let config = RunConfig::builder()
        .root_dir(&root)
        .output_filepath(&manifest)
        .file_filter(r"\.(css|js)$")
        .build()
        .unwrap();
    let report = run_config(&config, &options()).await.unwrap();

    assert_eq!(report.records_written, 4);
    assert_eq!(report.prior_records, 0);
    assert!(!report.has_warnings());
    assert_eq!(report.directories_expected, Some(4));
    assert!(report.counts_agree());

    let records = load_manifest(&manifest).unwrap();
    let expected: BTreeSet<String> = [
        "/css/site.css",
        "/css/print.css",
        "/js/app.js",
        "/js/vendor/lib.min.js",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(sources(&records), expected);

    let lib = records
        .iter()
        .find(|r| r.source == "/js/vendor/lib.min.js")
        .unwrap();
    assert_eq!(lib.destination, format!("/js/vendor/lib.min.{}.js", lib.fingerprint));
    assert_eq!(lib.size, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_append_places_prior_records_last() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("assets");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.css"), "a").unwrap();
    fs::write(root.join("b.css"), "b").unwrap();
    let manifest = temp.path().join("manifest.json");

    let prior = FileRecord::new("/legacy.css", "/legacy.deadbeef.css", "deadbeef", 99);
    fs::write(&manifest, serde_json::to_string(&vec![prior.clone()]).unwrap()).unwrap();

    let config = RunConfig::builder()
        .root_dir(&root)
        .output_filepath(&manifest)
        .output_mode(OutputMode::Append)
        .build()
        .unwrap();
    let report = run_config(&config, &options()).await.unwrap();
    assert_eq!(report.records_written, 2);
    assert_eq!(report.prior_records, 1);

    let records = load_manifest(&manifest).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2], prior);
    assert_eq!(
        sources(&records[..2]),
        BTreeSet::from(["/a.css".to_string(), "/b.css".to_string()])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_overwrite_runs_are_idempotent() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("assets");
    create_assets(&root);
    let manifest = temp.path().join("manifest.json");
    let config = RunConfig::new(&root, &manifest);

    run_config(&config, &options()).await.unwrap();
    let first: HashSet<FileRecord> = load_manifest(&manifest).unwrap().into_iter().collect();
    run_config(&config, &options()).await.unwrap();
    let second: HashSet<FileRecord> = load_manifest(&manifest).unwrap().into_iter().collect();

    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_root_writes_empty_manifest() {
    let temp = TempDir::new().unwrap();
    let manifest = temp.path().join("manifest.json");
    let config = RunConfig::new(temp.path().join("absent"), &manifest);

    let report = run_config(&config, &options()).await.unwrap();

    assert_eq!(report.directories_expected, Some(0));
    assert_eq!(report.directories_scanned, 0);
    assert_eq!(report.warnings_of(WarningKind::NotFound), 1);
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "[\n\n]");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unwritable_manifest_fails_the_run() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("assets");
    create_assets(&root);
    let config = RunConfig::new(&root, temp.path().join("no/such/dir/manifest.json"));

    let result = run_config(&config, &options()).await;
    assert!(matches!(result, Err(RunError::Manifest(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_all_continues_after_failure() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("assets");
    create_assets(&root);
    let good = temp.path().join("good.json");

    let configs = vec![
        RunConfig::new(&root, temp.path().join("missing/bad.json")),
        RunConfig::new(&root, &good),
    ];
    let results = run_all(&configs, &options()).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_err());
    assert_eq!(results[1].as_ref().unwrap().records_written, 5);
    assert_eq!(load_manifest(&good).unwrap().len(), 5);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_unreadable_subdirectory_terminates() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path().join("assets");
    create_assets(&root);
    let locked = root.join("js/vendor");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    let readable_anyway = fs::read_dir(&locked).is_ok();

    let manifest = temp.path().join("manifest.json");
    let config = RunConfig::new(&root, &manifest);
    let report = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        run_config(&config, &options()),
    )
    .await
    .expect("run must not hang")
    .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    if readable_anyway {
        return;
    }

    assert_eq!(report.directories_expected, None);
    assert_eq!(report.directories_scanned, 3);
    assert_eq!(report.warnings_of(WarningKind::PermissionDenied), 1);
    assert_eq!(report.records_written, 4);
}
