//! End-to-end tests for the `tonal` binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use note_stream::{write_midi, ExportOptions, NoteEvent};
use predicates::prelude::*;
use tempfile::TempDir;

const OVERRIDES: [&str; 8] = [
    "TONAL_CONFIG",
    "TONAL_PROFILE",
    "TONAL_WINDOW_BARS",
    "TONAL_HOP_BARS",
    "TONAL_CONFIDENCE_THRESHOLD",
    "TONAL_TEMPO_BPM",
    "TONAL_MIN_STABLE_WINDOWS",
    "TONAL_LOG_LEVEL",
];

/// The binary, isolated from any config on the host.
fn tonal(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tonal").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"));
    for var in OVERRIDES {
        cmd.env_remove(var);
    }
    cmd
}

/// I IV V I twice, one block chord per bar at 120 bpm in 4/4.
fn write_fixture(dir: &Path) -> PathBuf {
    let progression: [&[u8]; 4] = [&[60, 64, 67], &[65, 69, 72], &[67, 71, 74], &[60, 64, 67]];
    let notes: Vec<NoteEvent> = progression
        .iter()
        .cycle()
        .take(8)
        .enumerate()
        .flat_map(|(bar, pitches)| {
            let start = bar as f64 * 2.0;
            pitches
                .iter()
                .map(move |&p| NoteEvent::new(p, 90, start, start + 2.0, 0).unwrap())
        })
        .collect();

    let path = dir.join("cadence.mid");
    std::fs::write(&path, write_midi(&notes, &ExportOptions::default()).unwrap()).unwrap();
    path
}

#[test]
fn analyze_emits_json() {
    let dir = TempDir::new().unwrap();
    let midi = write_fixture(dir.path());

    let output = tonal(dir.path()).arg("analyze").arg(&midi).output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let analysis: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let regions = analysis["key_regions"].as_array().unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0]["tonic"], 0);
    assert_eq!(regions[0]["mode"], "major");

    let chords = analysis["chords"].as_array().unwrap();
    assert_eq!(chords.len(), 8);
    assert_eq!(chords[0]["quality"], "major");
    assert_eq!(analysis["tension"].as_array().unwrap().len(), 8);

    let cadences: Vec<&str> = analysis["cadences"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["type"].as_str())
        .collect();
    assert_eq!(cadences, vec!["HC", "PAC", "HC", "PAC"]);
}

#[test]
fn analyze_text_report() {
    let dir = TempDir::new().unwrap();
    let midi = write_fixture(dir.path());

    tonal(dir.path())
        .args(["analyze", "--format", "text"])
        .arg(&midi)
        .assert()
        .success()
        .stdout(predicate::str::contains("Key regions:"))
        .stdout(predicate::str::contains("C major"))
        .stdout(predicate::str::contains("PAC"));
}

#[test]
fn profile_flag_selects_profile() {
    let dir = TempDir::new().unwrap();
    let midi = write_fixture(dir.path());

    tonal(dir.path())
        .args(["analyze", "--profile", "temperley"])
        .arg(&midi)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key_regions\""));
}

#[test]
fn unknown_profile_fails() {
    let dir = TempDir::new().unwrap();
    let midi = write_fixture(dir.path());

    tonal(dir.path())
        .args(["analyze", "--profile", "nonesuch"])
        .arg(&midi)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown key profile"));
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().unwrap();

    tonal(dir.path())
        .args(["analyze", "absent.mid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.mid"));
}

#[test]
fn profiles_lists_builtins() {
    let dir = TempDir::new().unwrap();

    tonal(dir.path())
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("krumhansl"))
        .stdout(predicate::str::contains("temperley"))
        .stdout(predicate::str::contains("shaath"))
        .stdout(predicate::str::contains("diatonic"));
}

#[test]
fn config_shows_defaults() {
    let dir = TempDir::new().unwrap();

    tonal(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("No config files found"))
        .stdout(predicate::str::contains("[analysis]"));
}

#[test]
fn config_file_and_env_are_layered() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[analysis]\nprofile = \"temperley\"\n").unwrap();

    tonal(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("config")
        .env("TONAL_MIN_STABLE_WINDOWS", "5")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Loaded:"))
        .stdout(predicate::str::contains("profile = \"temperley\""))
        .stdout(predicate::str::contains("# Override: TONAL_MIN_STABLE_WINDOWS"))
        .stdout(predicate::str::contains("min_stable_windows = 5"));
}

#[test]
fn missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();

    tonal(dir.path())
        .args(["--config", "nope.toml", "config"])
        .assert()
        .failure();
}
