//! Integration tests for the farsync binary.
//!
//! These drive a real push: the binary spawns itself as `--server` and the two
//! processes talk over pipes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn farsync_bin() -> String {
    env!("CARGO_BIN_EXE_farsync").to_string()
}

/// Run with an isolated config dir so user settings can't leak in.
fn run(config_home: &Path, args: &[&str]) -> Output {
    Command::new(farsync_bin())
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("FARSYNC_CHUNK_SIZE")
        .env_remove("FARSYNC_SCAN_WINDOW_CHUNKS")
        .env_remove("FARSYNC_CONFIG")
        .output()
        .unwrap()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "farsync failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

// =============================================================================
// Local push
// =============================================================================

#[test]
fn test_push_updates_stale_copy() {
    let temp = TempDir::new().unwrap();
    let source_dir = temp.path().join("src");
    let dest_dir = temp.path().join("dest");
    fs::create_dir(&source_dir).unwrap();
    fs::create_dir(&dest_dir).unwrap();

    fs::write(source_dir.join("file.txt"), "1234567890").unwrap();
    fs::write(dest_dir.join("file.txt"), "2232567890").unwrap();

    let output = run(
        temp.path(),
        &[
            "--chunk-size",
            "5",
            source_dir.join("file.txt").to_str().unwrap(),
            dest_dir.to_str().unwrap(),
        ],
    );
    assert_success(&output);

    assert_eq!(
        fs::read_to_string(dest_dir.join("file.txt")).unwrap(),
        "1234567890"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 chunks, 1 reused, 1 sent"), "{}", stdout);
}

#[test]
fn test_push_creates_missing_destination() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("notes.md");
    let dest_dir = temp.path().join("new/dir");
    fs::write(&source, "# Notes\n\nfirst draft\n").unwrap();

    let output = run(
        temp.path(),
        &[source.to_str().unwrap(), dest_dir.to_str().unwrap()],
    );
    assert_success(&output);

    assert_eq!(
        fs::read_to_string(dest_dir.join("notes.md")).unwrap(),
        "# Notes\n\nfirst draft\n"
    );
}

#[test]
fn test_chunk_size_from_config_file() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("farsync");
    fs::create_dir(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "chunk_size = 5\n").unwrap();

    let source = temp.path().join("data.txt");
    let dest_dir = temp.path().join("dest");
    fs::create_dir(&dest_dir).unwrap();
    fs::write(&source, "1234567890").unwrap();
    fs::write(dest_dir.join("data.txt"), "67890").unwrap();

    let output = run(
        temp.path(),
        &[source.to_str().unwrap(), dest_dir.to_str().unwrap()],
    );
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 chunks, 1 reused, 1 sent"), "{}", stdout);
    assert_eq!(
        fs::read_to_string(dest_dir.join("data.txt")).unwrap(),
        "1234567890"
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_zero_chunk_size_rejected() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("a.txt");
    fs::write(&source, "x").unwrap();

    let output = run(
        temp.path(),
        &[
            "--chunk-size",
            "0",
            source.to_str().unwrap(),
            temp.path().to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("chunk_size"));
}

#[test]
fn test_missing_source_leaves_destination_alone() {
    let temp = TempDir::new().unwrap();
    let dest_dir = temp.path().join("dest");
    fs::create_dir(&dest_dir).unwrap();
    fs::write(dest_dir.join("gone.txt"), "keep").unwrap();

    let output = run(
        temp.path(),
        &[
            temp.path().join("gone.txt").to_str().unwrap(),
            dest_dir.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    assert_eq!(
        fs::read_to_string(dest_dir.join("gone.txt")).unwrap(),
        "keep"
    );
    assert_eq!(fs::read_dir(&dest_dir).unwrap().count(), 1);
}

#[test]
fn test_requires_source_and_dest() {
    let temp = TempDir::new().unwrap();
    let output = run(temp.path(), &["only-one-arg"]);
    assert!(!output.status.success());
}
