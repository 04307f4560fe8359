use std::fs;

use builder_engine::{
    ensure_output_dir, export_workspace, AtomicFileWriter, PersistError, WorkspaceFiles,
};
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
fn atomic_write_creates_subdirectories_and_replaces() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("./src/App.jsx", "hello").unwrap();
    assert_eq!(first, temp.path().join("src").join("App.jsx"));
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("src/App.jsx", "world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn writer_refuses_paths_outside_the_root() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("root"));

    let result = writer.write("../escape.txt", "x");
    assert!(matches!(result, Err(PersistError::Path(_))));
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn no_partial_file_when_root_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("doc.md", "data").is_err());
    assert!(!file_path.with_file_name("doc.md").exists());
}

#[test]
fn export_writes_every_workspace_file() {
    let temp = TempDir::new().unwrap();
    let mut files = WorkspaceFiles::new();
    files.write_file("index.html", "<h1>hi</h1>").unwrap();
    files.write_file("src/main.js", "main()").unwrap();

    let out = temp.path().join("export");
    let summary = export_workspace(&out, &files).unwrap();

    assert_eq!(summary.root, out);
    assert_eq!(summary.written.len(), 2);
    assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "<h1>hi</h1>");
    assert_eq!(fs::read_to_string(out.join("src/main.js")).unwrap(), "main()");
}
