use pmrc_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("etc").join("npmrc"));

    io::write_atomic(&path, b"registry=https://example.test/\n", 0o666).unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "registry=https://example.test/\n");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join(".npmrc");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated", 0o666).unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".npmrc"));

    io::write_atomic(&path, b"a=1", 0o600).unwrap();

    let entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec![".npmrc".to_string()]);
}

#[cfg(unix)]
#[test]
fn test_write_atomic_applies_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".npmrc"));

    io::write_atomic(&path, b"_auth=secret", 0o600).unwrap();

    let mode = fs::metadata(path.to_native()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_read_text_nonexistent_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing"));

    let err = io::read_text(&path).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_remove_file_reports_whether_removed() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join(".npmrc");
    fs::write(&file_path, "x=1").unwrap();
    let path = NormalizedPath::new(&file_path);

    assert!(io::remove_file(&path).unwrap());
    assert!(!path.exists());
    assert!(!io::remove_file(&path).unwrap());
}
