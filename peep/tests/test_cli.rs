use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn peep(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_peep"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run peep")
}

fn go_available() -> bool {
    Command::new("go").arg("version").output().is_ok_and(|o| o.status.success())
}

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test-package")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_missing_target_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = peep(&[], dir.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("TARGET"));
}

#[test]
fn test_help_exits_successfully() {
    let dir = tempfile::tempdir().unwrap();
    let output = peep(&["--help"], dir.path());
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--cpu-out"));
}

#[test]
fn test_nonexistent_target() {
    let dir = tempfile::tempdir().unwrap();
    let output = peep(&["missing.go"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Target not found"));
}

#[test]
fn test_file_without_main_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lib.go"), "package main\n\nfunc helper() {}\n").unwrap();

    let output = peep(&["lib.go"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no main function found in lib.go"));
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_invalid_syntax_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("invalid.go"),
        "package main\n\nfunc main() {\n\tinvalid syntax here\n}",
    )
    .unwrap();

    let output = peep(&["--cpu", "invalid.go"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to parse invalid.go:4:"));
}

#[test]
fn test_cpu_only_single_file() {
    if !go_available() {
        eprintln!("go not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("main.go"),
        "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"profiled\")\n}\n",
    )
    .unwrap();

    let output = peep(&["--cpu", "main.go"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("profiled"));
    assert!(stdout.contains("mode: instrumented program with CPU profiling"));
    assert!(stdout.contains("saved: "));
    assert!(std::fs::metadata(dir.path().join("cpu.prof")).unwrap().len() > 0);
    assert!(!dir.path().join("mem.prof").exists());
}

#[test]
fn test_package_directory_writes_profiles_in_caller_directory() {
    if !go_available() {
        eprintln!("go not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let pkg = fixture_dir();
    let output = peep(&["--quiet", pkg.to_str().unwrap()], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Test program completed!"));
    assert!(!stdout.contains("saved:"));
    assert!(dir.path().join("cpu.prof").is_file());
    assert!(dir.path().join("mem.prof").is_file());
}
