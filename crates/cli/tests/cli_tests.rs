//! CLI integration tests

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the built binary with its config directory isolated in `home`
fn vmms(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vmms"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("VMMS_API_URL")
        .output()
        .expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = vmms(home.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("vehicle maintenance cost"), "Should show about text");
    for command in ["generate", "stats", "train", "predict", "history", "config"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = vmms(home.path(), &["--version"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("vmms"), "Should show binary name");
}

#[test]
fn test_predict_help_lists_request_fields() {
    let home = TempDir::new().unwrap();
    let output = vmms(home.path(), &["predict", "--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in ["--make", "--model-year", "--oil-level", "--brake-wear", "--fault-codes"] {
        assert!(stdout.contains(flag), "Should show {}", flag);
    }
}

#[test]
fn test_predict_rejects_unknown_make() {
    let home = TempDir::new().unwrap();
    let output = vmms(
        home.path(),
        &[
            "predict",
            "--make",
            "Lada",
            "--model-year",
            "2015",
            "--engine-type",
            "gas",
            "--mileage",
            "1000",
            "--driving-condition",
            "city",
            "--service-interval",
            "180",
            "--days-since-service",
            "10",
            "--oil-level",
            "High",
            "--tire-pressure",
            "32",
            "--brake-wear",
            "10",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Lada"));
}

#[test]
fn test_generate_then_stats() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data.csv");
    let data_arg = data.to_str().unwrap();

    let output = vmms(
        home.path(),
        &[
            "generate",
            "--samples",
            "250",
            "--fleet-size",
            "30",
            "--output",
            data_arg,
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["summary"]["rows"], 250);

    let csv = std::fs::read_to_string(&data).unwrap();
    assert!(csv.starts_with("make,model_year,engine_type,vehicle_age,mileage"));
    assert_eq!(csv.lines().count(), 251);

    let output = vmms(home.path(), &["stats", data_arg, "--format", "json"]);
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["rows"], 250);
    assert_eq!(summary["cost_by_engine_type"].as_array().unwrap().len(), 3);
}

#[test]
fn test_generate_is_reproducible_for_a_seed() {
    let home = TempDir::new().unwrap();
    let a = home.path().join("a.csv");
    let b = home.path().join("b.csv");

    for path in [&a, &b] {
        let output = vmms(
            home.path(),
            &[
                "generate",
                "--samples",
                "100",
                "--seed",
                "7",
                "--output",
                path.to_str().unwrap(),
            ],
        );
        assert!(output.status.success());
    }

    assert_eq!(
        std::fs::read_to_string(&a).unwrap(),
        std::fs::read_to_string(&b).unwrap()
    );
}

#[test]
fn test_train_writes_artifacts() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data.csv");
    let model = home.path().join("model").join("model.json");
    let sample = home.path().join("viz").join("sample.csv");

    let output = vmms(
        home.path(),
        &["generate", "--samples", "300", "--output", data.to_str().unwrap()],
    );
    assert!(output.status.success());

    let output = vmms(
        home.path(),
        &[
            "train",
            "--data",
            data.to_str().unwrap(),
            "--model-out",
            model.to_str().unwrap(),
            "--sample-out",
            sample.to_str().unwrap(),
            "--sample-rows",
            "50",
            "--trees",
            "4",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    assert_eq!(report["version"].as_str().unwrap().len(), 12);
    assert_eq!(report["metrics"]["test_rows"], 60);
    assert!(!report["feature_importances"].as_array().unwrap().is_empty());

    assert!(model.exists());
    assert!(home.path().join("model").join("model.json.sha256").exists());
    assert_eq!(std::fs::read_to_string(&sample).unwrap().lines().count(), 51);
}

#[test]
fn test_stats_on_missing_file_fails() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing.csv");
    let output = vmms(home.path(), &["stats", missing.to_str().unwrap()]);

    assert!(!output.status.success());
}

#[test]
fn test_config_persists_api_url_and_format() {
    let home = TempDir::new().unwrap();

    let output = vmms(home.path(), &["config", "set-api-url", "http://fleet.internal:9000"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let output = vmms(home.path(), &["config", "set-format", "json"]);
    assert!(output.status.success());

    // the stored format now applies without --format
    let output = vmms(home.path(), &["config", "show"]);
    assert!(output.status.success());
    let view = stdout_json(&output);
    assert_eq!(view["api_url"], "http://fleet.internal:9000");
    assert_eq!(view["default_format"], "json");
}

#[test]
fn test_config_rejects_invalid_url() {
    let home = TempDir::new().unwrap();
    let output = vmms(home.path(), &["config", "set-api-url", "not a url"]);

    assert!(!output.status.success());
    assert!(!home.path().join(".config").join("vmms").join("config.json").exists());
}

#[test]
fn test_history_against_unreachable_server_fails() {
    let home = TempDir::new().unwrap();
    let output = vmms(
        home.path(),
        &["--api-url", "http://127.0.0.1:9", "history"],
    );

    assert!(!output.status.success());
}
