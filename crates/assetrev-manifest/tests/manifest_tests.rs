use assetrev_manifest::{FileRecord, ManifestWriter, OutputMode, load_manifest};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn record(src: &str, crc: &str, size: u64) -> FileRecord {
    FileRecord::new(src, format!("{src}.{crc}"), crc, size)
}

async fn write(path: &Path, mode: OutputMode, records: Vec<FileRecord>) -> (u64, u64) {
    let (tx, rx) = mpsc::channel(2);
    let handle = ManifestWriter::new(path, mode).spawn(rx);
    for r in records {
        tx.send(r).await.unwrap();
    }
    drop(tx);
    let summary = handle.await.unwrap().unwrap();
    (summary.records_written, summary.prior_records)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_append_concatenates_after_fresh_records() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("manifest.json");

    let r = record("/old.css", "00000001", 10);
    write(&path, OutputMode::Overwrite, vec![r.clone()]).await;

    let s1 = record("/new.css", "00000002", 20);
    let s2 = record("/new.js", "00000003", 30);
    let counts = write(&path, OutputMode::Append, vec![s1.clone(), s2.clone()]).await;
    assert_eq!(counts, (2, 1));

    assert_eq!(load_manifest(&path).unwrap(), vec![s1, s2, r]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_append_does_not_deduplicate() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("manifest.json");
    let same = record("/a.css", "0000000a", 1);

    write(&path, OutputMode::Overwrite, vec![same.clone()]).await;
    write(&path, OutputMode::Append, vec![same.clone()]).await;
    write(&path, OutputMode::Append, vec![same.clone()]).await;

    assert_eq!(load_manifest(&path).unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_append_without_prior_manifest() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fresh.json");

    let counts = write(&path, OutputMode::Append, vec![record("/x", "00000000", 0)]).await;
    assert_eq!(counts, (1, 0));
    assert_eq!(load_manifest(&path).unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_append_over_invalid_manifest_degrades_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("manifest.json");
    fs::write(&path, "this is not json").unwrap();

    let counts = write(&path, OutputMode::Append, vec![record("/x", "00000000", 0)]).await;
    assert_eq!(counts, (1, 0));
    assert_eq!(load_manifest(&path).unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_overwrite_discards_prior_records() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("manifest.json");

    write(&path, OutputMode::Overwrite, vec![record("/a", "00000001", 1)]).await;
    write(&path, OutputMode::Overwrite, vec![record("/b", "00000002", 2)]).await;

    let records = load_manifest(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source, "/b");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_document_layout() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("manifest.json");

    write(
        &path,
        OutputMode::Overwrite,
        vec![record("/a", "00000001", 1), record("/b", "00000002", 2)],
    )
    .await;

    let expected = "[\n  {\n    \"src\": \"/a\",\n    \"dest\": \"/a.00000001\",\n    \"crc32\": \"00000001\",\n    \"size\": 1\n  },\n  {\n    \"src\": \"/b\",\n    \"dest\": \"/b.00000002\",\n    \"crc32\": \"00000002\",\n    \"size\": 2\n  }\n]";
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_append_keeps_prior_records_with_missing_fields() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("manifest.json");
    fs::write(
        &path,
        r#"[{"src": "/a", "dest": "/a.1", "crc32": "00000001", "size": 1},
            {"src": "/b", "dest": "/b.2", "crc32": "00000002"}]"#,
    )
    .unwrap();

    let fresh = record("/c", "00000003", 3);
    let counts = write(&path, OutputMode::Append, vec![fresh.clone()]).await;
    assert_eq!(counts, (1, 2));

    let records = load_manifest(&path).unwrap();
    assert_eq!(
        records,
        vec![
            fresh,
            FileRecord::new("/a", "/a.1", "00000001", 1),
            FileRecord::new("/b", "/b.2", "00000002", 0),
        ]
    );
}
