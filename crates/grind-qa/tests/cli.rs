use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn grind_qa() -> Command {
    Command::cargo_bin("grind-qa").expect("grind-qa binary")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read json")).expect("parse json")
}

fn write_grid(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let image = dir.join("grid.png");
    let truth = dir.join("grid.json");
    grind_qa()
        .args(["grid", "--width", "1000", "--height", "1000", "--rows", "5", "--cols", "5"])
        .args(["--radius", "30", "--microns-per-pixel", "10"])
        .arg("--image")
        .arg(&image)
        .arg("--truth")
        .arg(&truth)
        .assert()
        .success()
        .stdout(predicate::str::contains("25 particles"));
    (image, truth)
}

#[test]
fn grid_writes_image_and_truth() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (image, truth) = write_grid(dir.path());

    let img = image::open(&image).expect("png").to_luma8();
    assert_eq!(img.dimensions(), (1000, 1000));

    let json = read_json(&truth);
    let particles = json["particles"].as_array().expect("particles");
    assert_eq!(particles.len(), 25);
    assert_eq!(particles[6]["center"][0].as_f64(), Some(150.0));
    assert_eq!(particles[6]["center"][1].as_f64(), Some(150.0));
    let area = particles[6]["area"].as_f64().expect("area");
    assert_relative_eq!(area, 2827.433, epsilon = 1e-2);
    assert_eq!(json["calibration"]["microns_per_pixel"].as_f64(), Some(10.0));
}

#[test]
fn detect_then_score_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (image, truth) = write_grid(dir.path());
    let detections = dir.path().join("detections.json");
    let overlay = dir.path().join("overlay.png");
    let report = dir.path().join("report.json");

    grind_qa()
        .args(["detect", "--microns-per-pixel", "10", "--grind-type", "french-press"])
        .arg("--image")
        .arg(&image)
        .arg("--detections")
        .arg(&detections)
        .assert()
        .success()
        .stdout(predicate::str::contains("25 particles"));

    grind_qa()
        .args(["score", "--tolerance", "2"])
        .arg("--truth")
        .arg(&truth)
        .arg("--detections")
        .arg(&detections)
        .arg("--image")
        .arg(&image)
        .arg("--overlay")
        .arg(&overlay)
        .arg("--output")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("precision:        1.000"))
        .stdout(predicate::str::contains("recall:           1.000"));

    let json = read_json(&report);
    assert_eq!(json["correctly_detected"].as_u64(), Some(25));
    assert_eq!(json["false_positives"].as_u64(), Some(0));
    let size_err = json["avg_size_error"].as_f64().expect("size error");
    assert_relative_eq!(size_err, 0.0, epsilon = 0.5);
    let overlay_img = image::open(&overlay).expect("overlay").to_rgb8();
    assert_eq!(overlay_img.dimensions(), (1000, 1000));
}

#[test]
fn score_counts_missing_detections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, truth) = write_grid(dir.path());
    let detections = dir.path().join("partial.json");
    fs::write(
        &detections,
        r#"{"particles": [
            {"position": [50.0, 50.0], "area": 2827.0},
            {"position": [900.0, 900.0], "area": 100.0}
        ]}"#,
    )
    .expect("write detections");

    grind_qa()
        .arg("score")
        .arg("--truth")
        .arg(&truth)
        .arg("--detections")
        .arg(&detections)
        .assert()
        .success()
        .stdout(predicate::str::contains("matched:          1"))
        .stdout(predicate::str::contains("false positives:  1"))
        .stdout(predicate::str::contains("false negatives:  24"));
}

#[test]
fn scatter_is_reproducible_with_seed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = |tag: &str| {
        let truth = dir.path().join(format!("{tag}.json"));
        grind_qa()
            .args(["scatter", "--width", "400", "--height", "300", "--count", "12"])
            .args(["--min-radius", "5", "--max-radius", "15", "--seed", "99"])
            .arg("--image")
            .arg(dir.path().join(format!("{tag}.png")))
            .arg("--truth")
            .arg(&truth)
            .assert()
            .success();
        read_json(&truth)
    };
    assert_eq!(run("a"), run("b"));
}

#[test]
fn validate_runs_config_and_writes_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_dir = dir.path().join("out");
    let config = dir.path().join("config.json");
    let cfg = serde_json::json!({
        "output_dir": out_dir,
        "write_overlays": true,
        "scenarios": [
            {
                "name": "grid",
                "scene": {"layout": "grid", "width": 500, "height": 500, "rows": 3, "cols": 3,
                          "radius": 20, "microns_per_pixel": 12.0},
                "grind_type": "espresso",
                "tolerance_px": 3.0
            },
            {
                "name": "single",
                "scene": {"layout": "scatter", "width": 300, "height": 300, "count": 1,
                          "radius_range": [10, 20], "microns_per_pixel": 8.0}
            }
        ]
    });
    fs::write(&config, serde_json::to_string_pretty(&cfg).expect("json")).expect("write config");

    grind_qa()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("grid: tp=9 fp=0 fn=0"))
        .stdout(predicate::str::contains("2 scenarios, 0 failed"));

    let report = read_json(&out_dir.join("report.json"));
    assert_eq!(report["detector"], "threshold");
    assert_eq!(report["scenarios"].as_array().map(Vec::len), Some(2));
    let overlay = report["scenarios"][0]["overlay_path"].as_str().expect("overlay path");
    assert!(Path::new(overlay).exists());
}

#[test]
fn unknown_grind_type_is_rejected() {
    grind_qa()
        .args(["detect", "--image", "x.png", "--detections", "y.json"])
        .args(["--grind-type", "latte"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown grind type"));
}

#[test]
fn missing_truth_file_fails() {
    grind_qa()
        .args(["score", "--truth", "/nonexistent/t.json", "--detections", "/nonexistent/d.json"])
        .assert()
        .failure();
}
