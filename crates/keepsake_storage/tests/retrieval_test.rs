//! Tests for the retrieval guard.

use keepsake_storage::{
    AllowedTypes, IngestOptions, RetrievalGuard, StorageErrorKind, Upload, ingest, resolve,
};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

/// A store at `<tmp>/store` with a secret sitting next to it at `<tmp>/secret.txt`.
fn store_with_neighbour() -> (TempDir, PathBuf, RetrievalGuard) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("store");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(temp_dir.path().join("secret.txt"), b"top secret").unwrap();
    std::fs::write(temp_dir.path().join("secret.png"), b"\x89PNG\r\n\x1a\n").unwrap();
    let guard = RetrievalGuard::new(&root, AllowedTypes::default()).unwrap();
    (temp_dir, root, guard)
}

fn kind_of(result: keepsake_error::KeepsakeResult<keepsake_storage::RetrievedFile>) -> StorageErrorKind {
    result.unwrap_err().storage_kind().cloned().unwrap()
}

#[tokio::test]
async fn test_round_trip() {
    let (_temp_dir, root, guard) = store_with_neighbour();
    let data = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n".to_vec();

    let stored = ingest(Upload::new(&data[..]), &root, &IngestOptions::default())
        .await
        .unwrap();
    let mut found = guard.resolve(&stored.file_name).await.unwrap();

    let mut bytes = Vec::new();
    found.file.read_to_end(&mut bytes).await.unwrap();
    assert_eq!(bytes, data);
    assert_eq!(found.media_type, "application/pdf");
    assert_eq!(found.len, data.len() as u64);
    assert_eq!(found.path, guard.root().join(&stored.file_name));
}

#[tokio::test]
async fn test_traversal_looks_like_missing_file() {
    let (_temp_dir, _root, guard) = store_with_neighbour();

    let missing = kind_of(guard.resolve("nope.png").await);
    assert!(missing.is_not_found());

    for attempt in [
        "../../etc/passwd",
        "../secret.txt",
        "../secret.png",
        "reports/../../secret.txt",
        "reports/../../secret.png",
        "./../secret.png",
    ] {
        let kind = kind_of(guard.resolve(attempt).await);
        assert!(kind.is_not_found(), "{attempt}: {kind}");
    }
}

#[tokio::test]
async fn test_absolute_path_rejected() {
    let (temp_dir, _root, guard) = store_with_neighbour();
    let outside = temp_dir.path().join("secret.png");

    let kind = kind_of(guard.resolve(outside.to_str().unwrap()).await);
    assert!(kind.is_not_found());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_rejected() {
    let (temp_dir, root, guard) = store_with_neighbour();
    std::os::unix::fs::symlink(temp_dir.path().join("secret.png"), root.join("link.png"))
        .unwrap();

    let kind = kind_of(guard.resolve("link.png").await);
    assert!(kind.is_not_found());
}

#[tokio::test]
async fn test_disallowed_extension() {
    let (_temp_dir, root, guard) = store_with_neighbour();
    std::fs::write(root.join("notes.txt"), b"hello").unwrap();
    std::fs::write(root.join("Makefile"), b"all:").unwrap();

    assert_eq!(
        kind_of(guard.resolve("notes.txt").await),
        StorageErrorKind::TypeNotAllowed(".txt".to_string())
    );
    assert!(matches!(
        kind_of(guard.resolve("Makefile").await),
        StorageErrorKind::TypeNotAllowed(_)
    ));
}

#[tokio::test]
async fn test_extension_case_insensitive() {
    let (_temp_dir, root, guard) = store_with_neighbour();
    std::fs::write(root.join("SCAN.PNG"), b"\x89PNG\r\n\x1a\n").unwrap();

    let found = guard.resolve("SCAN.PNG").await.unwrap();
    assert_eq!(found.media_type, "image/png");
}

#[tokio::test]
async fn test_directories_and_hidden_files_not_served() {
    let (_temp_dir, root, guard) = store_with_neighbour();
    std::fs::create_dir_all(root.join("nested.png")).unwrap();
    std::fs::write(root.join(".tmp_abc_photo.png"), b"partial").unwrap();

    assert!(kind_of(guard.resolve("nested.png").await).is_not_found());
    assert!(kind_of(guard.resolve(".tmp_abc_photo.png").await).is_not_found());
    assert!(kind_of(guard.resolve("").await).is_not_found());
    assert!(kind_of(guard.resolve(".").await).is_not_found());
}

#[tokio::test]
async fn test_one_shot_resolve() {
    let (temp_dir, root, _guard) = store_with_neighbour();
    std::fs::write(root.join("cat.gif"), b"GIF89a").unwrap();
    let table = AllowedTypes::default();

    let found = resolve("cat.gif", &root, &table).await.unwrap();
    assert_eq!(found.media_type, "image/gif");

    let missing_root = temp_dir.path().join("never-created");
    assert!(kind_of(resolve("cat.gif", &missing_root, &table).await).is_not_found());
}
