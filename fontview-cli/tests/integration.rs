use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::tempdir;

fn run_fontview(root: &Path, args: &[&str], script: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_fontview"))
        .args(args)
        .env("FONTVIEW_ROOT", root)
        .env("FONTVIEW_SYSTEM_FONT_DIR", root.join("system-fonts"))
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn fontview");

    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(script.as_bytes())
        .expect("write script");
    child.wait_with_output().expect("wait for fontview")
}

#[test]
fn creates_missing_root_and_exits_on_eof() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("nested/collection");

    let output = run_fontview(&root, &[], "");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(root.is_dir());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(empty)"), "stdout:\n{stdout}");
}

#[test]
fn lists_searches_and_reports_state() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    fs::create_dir_all(root.join("mono")).unwrap();
    fs::write(root.join("mono/Plex Mono.ttf"), b"").unwrap();
    fs::write(root.join("Readme.md"), b"").unwrap();

    let output = run_fontview(root, &[], "ls\nsearch plex\nstate\nquit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  mono/\n"), "stdout:\n{stdout}");
    assert!(!stdout.contains("Readme.md"));
    assert!(stdout.contains("== Searching: plex =="));
    assert!(stdout.contains("  mono/Plex Mono.ttf\n"));

    let json_start = stdout.find('{').expect("state json");
    let state: Value = serde_json::from_str(stdout[json_start..].trim()).expect("parse state");
    assert_eq!(state["view"]["mode"], "search");
    assert_eq!(state["view"]["query"], "plex");
    assert_eq!(state["view"]["hits"][0]["display_name"], "Plex Mono.ttf");
}

#[test]
fn startup_font_that_is_not_a_font_is_ignored() {
    let tmp = tempdir().expect("tempdir");
    let notes = tmp.path().join("notes.txt");
    fs::write(&notes, b"hello").unwrap();

    let output = run_fontview(tmp.path(), &[notes.to_str().unwrap()], "json\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no font selected"));
}

#[test]
fn unreadable_startup_font_is_reported_not_fatal() {
    let tmp = tempdir().expect("tempdir");
    let bogus = tmp.path().join("Fake.otf");
    fs::write(&bogus, b"not an sfnt").unwrap();

    let output = run_fontview(tmp.path(), &[bogus.to_str().unwrap()], "");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[error] Error: could not load font file"));
}

#[test]
fn extra_arguments_are_rejected() {
    let tmp = tempdir().expect("tempdir");
    let output = run_fontview(tmp.path(), &["a.ttf", "b.ttf"], "");
    assert!(!output.status.success());
}
