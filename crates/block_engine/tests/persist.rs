use std::fs;

use block_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("posts.json", b"[]").unwrap();
    assert_eq!(fs::read_to_string(&first).unwrap(), "[]");

    let second = writer.write("posts.json", b"[{}]").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "[{}]");
}

#[test]
fn nested_paths_create_directories() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let path = writer.write("sections/games/logo.png", b"png").unwrap();
    assert_eq!(path, temp.path().join("sections/games/logo.png"));
    assert!(temp.path().join("sections/games").is_dir());
}

#[test]
fn parent_and_absolute_components_are_rejected() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    for bad in ["../escape.txt", "/etc/passwd", "", "a/../../b"] {
        let err = writer.write(bad, b"x").unwrap_err();
        assert!(matches!(err, PersistError::InvalidPath(_)), "{bad:?}");
    }
}

#[test]
fn no_partial_file_when_dir_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("doc.json", b"data").is_err());
    assert!(!file_path.with_file_name("doc.json").exists());
}
