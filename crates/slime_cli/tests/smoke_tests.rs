//! Smoke tests for the `slime` binary: flags, headless replays and script errors.

use std::process::Command;

fn cli_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_slime"))
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| serde_json::from_str(l).expect("stdout line is not JSON"))
        .collect()
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "Expected usage info in --help output");
    assert!(stdout.contains("replay"));
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("slime"), "Expected binary name in --version output");
}

#[test]
fn test_short_replay_emits_json_lines() {
    let output = cli_bin()
        .args(["--config", "/tmp/nonexistent_slime_config_12345.toml"])
        .args(["replay", "--duration", "1", "--fps", "30", "--every", "10"])
        .output()
        .expect("failed to run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["tick"], 10);
    assert_eq!(lines[2]["debug"]["current_emotion_name"], "Neutral");
    assert!(lines[2]["params"]["BreathingPulse"].is_number());
}

#[test]
fn test_replay_is_reproducible_with_seed() {
    let run = || {
        cli_bin()
            .args(["--seed", "7", "replay", "--duration", "2", "--every", "20"])
            .env("RUST_LOG", "off")
            .output()
            .expect("failed to run")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_replay_with_script() {
    let dir = std::path::PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    let path = dir.join("smoke_script.toml");
    std::fs::write(
        &path,
        "[[event]]\nat = 0.2\naction = \"preset\"\npreset = \"Excited\"\n\n[[event]]\nat = 0.5\naction = \"tap\"\nx = 0.0\ny = 0.0\n",
    )
    .unwrap();

    let output = cli_bin()
        .args(["replay", "--duration", "1", "--every", "60", "--script"])
        .arg(&path)
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["debug"]["current_emotion_name"], "Excited");
}

#[test]
fn test_bad_script_fails_cleanly() {
    let dir = std::path::PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    let path = dir.join("bad_script.toml");
    std::fs::write(&path, "[[event]]\nat = 0.0\naction = \"preset\"\npreset = \"Nope\"\n").unwrap();

    let output = cli_bin()
        .args(["replay", "--script"])
        .arg(&path)
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown emotion preset"), "stderr: {}", stderr);
}
