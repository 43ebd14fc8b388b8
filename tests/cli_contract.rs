use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn run_telecine(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_telecine"))
        .args(args)
        .output()
        .expect("telecine command should run")
}

fn command_available(name: &str, version_arg: &str) -> bool {
    Command::new(name)
        .arg(version_arg)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[test]
fn missing_input_fails_before_touching_the_terminal() {
    let output = run_telecine(&["/nonexistent/clip.mp4"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no such video file"),
        "stderr should name the problem, got: {stderr}"
    );
    assert!(
        output.stdout.is_empty(),
        "no escape sequences may reach stdout on a usage error"
    );
}

#[test]
fn unreadable_input_reports_a_probe_error() {
    if !command_available("ffprobe", "-version") {
        return;
    }

    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("not_a_video.mp4");
    fs::write(&path, b"this is not a video container").expect("fixture should write");

    let output = run_telecine(&[path.to_str().expect("path should be utf-8")]);
    assert!(!output.status.success());
    assert!(
        output.stdout.is_empty(),
        "probe failures must not draw anything"
    );
}

#[test]
fn help_lists_the_rendering_flags() {
    let output = run_telecine(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--hires"));
    assert!(stdout.contains("--native"));
    assert!(stdout.contains("<VIDEO>"));
}

#[test]
fn native_and_hires_are_mutually_exclusive() {
    let output = run_telecine(&["--hires", "--native", "clip.mp4"]);
    assert_eq!(output.status.code(), Some(2), "clap usage errors exit 2");
}

#[test]
fn version_includes_the_package_version() {
    let output = run_telecine(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
