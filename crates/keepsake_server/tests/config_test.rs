//! Tests for configuration loading.

use keepsake_server::{KeepsakeConfig, prepare_store};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_file_overrides_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("keepsake.toml");
    std::fs::write(
        &path,
        r#"
upload_dir = "/srv/keepsake"
max_upload_bytes = 2048
filename_prefix = "scan_"
"#,
    )
    .unwrap();

    let config = KeepsakeConfig::from_file(&path).unwrap();
    assert_eq!(config.upload_dir(), &PathBuf::from("/srv/keepsake"));
    assert_eq!(*config.max_upload_bytes(), 2048);
    assert_eq!(config.filename_prefix(), "scan_");

    // Untouched keys keep their bundled values.
    let defaults = KeepsakeConfig::default();
    assert_eq!(config.bind(), defaults.bind());
    assert_eq!(config.chunk_size(), defaults.chunk_size());
    assert_eq!(config.allowed_types(), defaults.allowed_types());

    let options = config.ingest_options().unwrap();
    assert_eq!(*options.max_size_bytes(), 2048);
    assert_eq!(options.filename_prefix(), "scan_");
}

#[test]
fn test_invalid_values_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("keepsake.toml");
    std::fs::write(&path, "max_upload_bytes = \"lots\"\n").unwrap();

    assert!(KeepsakeConfig::from_file(&path).is_err());
}

#[test]
fn test_missing_file_rejected() {
    let temp = TempDir::new().unwrap();
    assert!(KeepsakeConfig::from_file(temp.path().join("absent.toml")).is_err());
}

#[test]
fn test_unsafe_prefix_fails_options() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("keepsake.toml");
    std::fs::write(&path, "filename_prefix = \"../\"\n").unwrap();

    let config = KeepsakeConfig::from_file(&path).unwrap();
    assert!(config.ingest_options().is_err());
}

#[test]
fn test_zero_chunk_size_fails_options() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("keepsake.toml");
    std::fs::write(&path, "chunk_size = 0\n").unwrap();

    let config = KeepsakeConfig::from_file(&path).unwrap();
    assert!(config.ingest_options().is_err());
}

#[tokio::test]
async fn test_prepare_store_creates_dir_and_sweeps() {
    let temp = TempDir::new().unwrap();
    let upload_dir = temp.path().join("nested/uploads");
    let config = KeepsakeConfig::default().with_upload_dir(&upload_dir);

    prepare_store(&config).await.unwrap();
    assert!(upload_dir.is_dir());

    std::fs::write(upload_dir.join(".tmp_deadbeef_a.pdf"), b"partial").unwrap();
    std::fs::write(upload_dir.join("kept.pdf"), b"%PDF-1.4").unwrap();

    prepare_store(&config).await.unwrap();
    let names: Vec<String> = std::fs::read_dir(&upload_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["kept.pdf".to_string()]);
}
