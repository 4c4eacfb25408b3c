use std::fs::{create_dir_all, remove_dir_all};
use std::path::PathBuf;


/// A fresh directory under the system temp dir, wiped from any previous
/// run of the same test.
pub fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("purr-launcher-test-{}-{name}", std::process::id()));
    let _ = remove_dir_all(&dir);
    create_dir_all(&dir).unwrap();
    dir
}
