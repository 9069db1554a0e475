use codesync_fs::{FileLock, NormalizedPath, io};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("nested/dir/test.txt"));

    io::write_atomic(&path, b"hello world").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "hello world");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "original").unwrap();

    io::write_text(&NormalizedPath::new(&file_path), "updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("test.txt"));

    io::write_text(&path, "content").unwrap();

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["test.txt".to_string()]);
}

#[test]
fn test_read_text_nonexistent_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing.txt"));

    let err = io::read_text(&path).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_read_text_rejects_binary() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("blob.bin");
    fs::write(&file_path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let err = io::read_text(&NormalizedPath::new(&file_path)).unwrap_err();
    assert!(matches!(err, codesync_fs::Error::InvalidUtf8 { .. }));
    assert!(!err.is_not_found());
}

#[test]
fn test_read_tree_sorted_relative_paths() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();
    fs::create_dir_all(temp.path().join(".git")).unwrap();
    fs::write(temp.path().join("b.txt"), "b").unwrap();
    fs::write(temp.path().join("sub/a.txt"), "a").unwrap();
    fs::write(temp.path().join("sub/deeper/c.txt"), "c").unwrap();
    fs::write(temp.path().join(".git/HEAD"), "ref").unwrap();

    let tree = io::read_tree(&NormalizedPath::new(temp.path())).unwrap();

    let keys: Vec<&str> = tree.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["b.txt", "sub/a.txt", "sub/deeper/c.txt"]);
    assert_eq!(tree["sub/deeper/c.txt"], "c");
}

#[test]
fn test_concurrent_writes_never_corrupt() {
    let temp = TempDir::new().unwrap();
    let path = Arc::new(NormalizedPath::new(temp.path().join("concurrent.txt")));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|id| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..10 {
                    io::write_text(&path, &format!("writer{id}:{i}\n")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert!(content.starts_with("writer"));
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn test_file_lock_serializes_holders() {
    let temp = TempDir::new().unwrap();
    let lock_path = NormalizedPath::new(temp.path().join("locks/item.lock"));
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));

    let first = FileLock::acquire(&lock_path).unwrap();
    assert!(first.path().exists());

    let handle = {
        let lock_path = lock_path.clone();
        let log = Arc::clone(&log);
        thread::spawn(move || {
            let _guard = FileLock::acquire(&lock_path).unwrap();
            log.lock().unwrap().push("second");
        })
    };

    thread::sleep(std::time::Duration::from_millis(50));
    log.lock().unwrap().push("first");
    drop(first);
    handle.join().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}
