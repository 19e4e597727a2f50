#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Write `content` to `name` inside a fresh temp dir. Keep the dir alive for
/// as long as the file is needed.
pub fn write_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    (dir, path)
}

/// Header `a,b,c` followed by `rows` lines of `i,2i,row<i>`.
pub fn numbered_csv_content(rows: usize) -> String {
    let mut content = String::from("a,b,c\n");
    for i in 0..rows {
        content.push_str(&format!("{},{},row{}\n", i, i * 2, i));
    }
    content
}

pub fn numbered_csv(rows: usize) -> (TempDir, PathBuf) {
    write_file("numbers.csv", &numbered_csv_content(rows))
}

/// Poll `condition` until it holds or a generous deadline passes.
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
