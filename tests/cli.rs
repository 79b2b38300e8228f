//! Integration tests for the `fwb` binary.
//!
//! Everything here runs with `--dry-run` or an intentionally broken
//! configuration, so no toolchain is required.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn make_project(root: &Path, rel: &str, configs: &[&str]) {
    let dir = root.join(rel);
    fs::create_dir_all(dir.join("main")).unwrap();
    fs::write(dir.join("CMakeLists.txt"), "project(app)\n").unwrap();
    for c in configs {
        fs::write(dir.join(c), "CONFIG_X=y\n").unwrap();
    }
}

fn fwb(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fwb"))
        .arg(root)
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run fwb")
}

#[test]
fn dry_run_exits_zero_and_builds_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    make_project(tmp.path(), "light", &[]);
    make_project(tmp.path(), "switch", &[]);

    let out = fwb(tmp.path(), &["--target", "esp32h2", "--dry-run"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert!(out.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Found 2 build unit(s)"), "stdout: {stdout}");
    assert!(stdout.contains("2 skipped"), "stdout: {stdout}");
    // No build directories were created.
    assert!(!tmp.path().join("light/build_esp32h2_default").exists());
}

#[test]
fn conflicting_selection_flags_fail_before_any_build() {
    let tmp = tempfile::tempdir().unwrap();
    make_project(tmp.path(), "light", &[]);

    let out = fwb(tmp.path(), &["--pytest", "--no-pytest", "--dry-run"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("--pytest") || stderr.contains("--no-pytest"),
        "stderr: {stderr}"
    );
}

#[test]
fn out_of_range_shard_index_is_a_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    make_project(tmp.path(), "light", &[]);

    let out = fwb(
        tmp.path(),
        &["--parallel-count", "2", "--parallel-index", "3", "--dry-run"],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("out of range"), "stderr: {stderr}");
}

#[test]
fn shards_split_the_matrix_deterministically() {
    let tmp = tempfile::tempdir().unwrap();
    for i in 0..5 {
        make_project(tmp.path(), &format!("app_{i}"), &[]);
    }

    let first = fwb(
        tmp.path(),
        &[
            "--target",
            "esp32h2",
            "--parallel-count",
            "2",
            "--parallel-index",
            "1",
            "--dry-run",
        ],
    );
    let second = fwb(
        tmp.path(),
        &[
            "--target",
            "esp32h2",
            "--parallel-count",
            "2",
            "--parallel-index",
            "2",
            "--dry-run",
        ],
    );

    let out1 = String::from_utf8_lossy(&first.stdout);
    let out2 = String::from_utf8_lossy(&second.stdout);
    assert!(out1.contains("Shard 1/2 owns 3 unit(s)"), "stdout: {out1}");
    assert!(out2.contains("Shard 2/2 owns 2 unit(s)"), "stdout: {out2}");
}

#[test]
fn malformed_manifest_aborts_with_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    make_project(tmp.path(), "light", &[]);
    let manifest = tmp.path().join("rules.toml");
    fs::write(&manifest, "[[rule]\n").unwrap();

    let out = fwb(
        tmp.path(),
        &["--manifest", manifest.to_str().unwrap(), "--dry-run"],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("manifest"), "stderr: {stderr}");
}

#[test]
fn malformed_config_rule_aborts_with_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    make_project(tmp.path(), "light", &[]);

    let out = fwb(tmp.path(), &["--config", "a.*.b.*=", "--dry-run"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("config rule"), "stderr: {stderr}");
}

#[test]
fn underscore_selection_flag_spelling_is_accepted() {
    let tmp = tempfile::tempdir().unwrap();
    make_project(tmp.path(), "esp_zigbee_cli", &[]);
    make_project(tmp.path(), "light", &[]);

    // Old CI invocations spell the flag with an underscore.
    let out = fwb(
        tmp.path(),
        &["--target", "esp32h2", "--no_pytest", "--dry-run"],
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Found 1 build unit(s)"), "stdout: {stdout}");
}

#[cfg(unix)]
#[test]
fn size_info_is_collected_with_a_real_build_command() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().unwrap();
    make_project(tmp.path(), "light", &[]);

    // Stand-in build program: succeeds, and answers the size step with
    // JSON metrics.
    let script = tmp.path().join("fake-build.sh");
    fs::write(
        &script,
        "#!/bin/sh\n\
         for a in \"$@\"; do\n\
           if [ \"$a\" = size ]; then printf '{\"flash\": 4096}'; exit 0; fi\n\
         done\n\
         echo build step done\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let sink = tmp.path().join("sizes.jsonl");
    let out = fwb(
        tmp.path(),
        &[
            "--target",
            "esp32h2",
            "--build-command",
            script.to_str().unwrap(),
            "--collect-size-info",
            sink.to_str().unwrap(),
        ],
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}");

    let lines: Vec<String> = fs::read_to_string(&sink)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(lines.len(), 1, "stdout: {stdout}");
    let record: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record["app"], "light");
    assert_eq!(record["size"]["flash"], 4096);
}

#[test]
fn missing_root_is_skipped_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("no-such-dir");

    let out = fwb(&missing, &["--dry-run"]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Found 0 build unit(s)"), "stdout: {stdout}");
}
