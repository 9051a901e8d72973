use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with an isolated config directory and no Azure credentials.
fn bestby(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bestby").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .env_remove("AZURE_VISION_KEY")
        .env_remove("AZURE_VISION_ENDPOINT");
    cmd
}

#[test]
fn text_from_stdin() {
    let home = TempDir::new().unwrap();
    bestby(&home)
        .arg("text")
        .write_stdin("NET WT 500g\nBEST BEFORE\nDEC 25, 2024\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-12-25"))
        .stdout(predicate::str::contains("best before"));
}

#[test]
fn text_from_file_as_json() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("lines.txt");
    std::fs::write(&input, "USE BY\n31122024\nL4521\n").unwrap();

    let output = bestby(&home)
        .args(["text", "--format", "json", "--input"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["date"], "2024-12-31");
    assert_eq!(report["result"]["expiry"]["keyword"], "use by");
    assert_eq!(report["result"]["expiry"]["method"]["kind"], "concatenated");
}

#[test]
fn text_without_date_still_succeeds() {
    let home = TempDir::new().unwrap();
    bestby(&home)
        .arg("text")
        .write_stdin("organic oats\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No expiry date found"));
}

#[test]
fn config_init_get_set() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bestby.json");
    let config_arg = config.to_str().unwrap();

    bestby(&home)
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    bestby(&home)
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    bestby(&home)
        .args(["--config", config_arg, "config", "get", "ocr.provider"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"auto\""));

    bestby(&home)
        .args(["--config", config_arg, "config", "set", "extraction.whole_text_fallback", "false"])
        .assert()
        .success();

    bestby(&home)
        .args(["--config", config_arg, "config", "get", "extraction.whole_text_fallback"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));

    // The fallback is now off, so an unanchored date is ignored
    bestby(&home)
        .args(["--config", config_arg, "text"])
        .write_stdin("lot 12.08.2026\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No expiry date found"));
}

#[test]
fn config_set_rejects_invalid_provider() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bestby.json");

    bestby(&home)
        .args(["--config", config.to_str().unwrap(), "config", "set", "ocr.provider", "tesseract"])
        .assert()
        .failure();
    assert!(!config.exists());
}

#[test]
fn config_set_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bestby.json");
    let config_arg = config.to_str().unwrap();

    bestby(&home)
        .args(["--config", config_arg, "config", "set", "ocr.nope", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    assert!(!config.exists());

    // Optional keys are settable even though they are omitted while unset
    bestby(&home)
        .args(["--config", config_arg, "config", "set", "azure.endpoint", "https://example.com/"])
        .assert()
        .success();
    bestby(&home)
        .args(["--config", config_arg, "config", "get", "azure.endpoint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com/"));
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    bestby(&home)
        .args(["config", "get", "ocr.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn extract_missing_file() {
    let home = TempDir::new().unwrap();
    bestby(&home)
        .args(["extract", "does-not-exist.png", "--provider", "none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn extract_without_provider_reports_no_date() {
    let home = TempDir::new().unwrap();
    let image = home.path().join("label.png");
    std::fs::write(&image, b"not really a png").unwrap();

    bestby(&home)
        .args(["extract", "--provider", "none"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("No expiry date found"));
}

#[test]
fn batch_writes_summary() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("a.png"), b"x").unwrap();
    std::fs::write(home.path().join("b.jpg"), b"y").unwrap();
    std::fs::write(home.path().join("notes.txt"), b"z").unwrap();
    let summary = home.path().join("summary.csv");

    let pattern = format!("{}/*", home.path().display());
    bestby(&home)
        .args(["batch", &pattern, "--provider", "none", "--output"])
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    let content = std::fs::read_to_string(&summary).unwrap();
    assert!(content.starts_with("file,date,keyword,method,error,time_ms"));
    assert_eq!(content.lines().count(), 3);
}
