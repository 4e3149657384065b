use std::path::Path;
use std::process::{Command, Output};

use git2::{Repository, Signature, Time};

const WEEKLY: &str = "\
week_start,defects_reported
2024-01-01,10
2024-01-08,12
2024-01-15,8
";

fn inflow(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_inflow"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn forecast_writes_default_output_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("defect_inflow_data.csv"), WEEKLY).unwrap();

    let output = inflow(dir.path(), &["forecast", "--horizon", "3"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Total defects:"));

    let written = std::fs::read_to_string(dir.path().join("forecast_output.csv")).unwrap();
    assert_eq!(
        written,
        "period_start_date,predicted_defects\n2024-01-22,8\n2024-01-29,8\n2024-02-05,8\n"
    );
}

#[test]
fn forecast_json_uses_flags_over_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("weekly.csv"), WEEKLY).unwrap();
    std::fs::write(
        dir.path().join(".inflow.toml"),
        "[forecast]\nmethod = \"naive\"\nhorizon = 1\n",
    )
    .unwrap();

    let output = inflow(
        dir.path(),
        &[
            "forecast",
            "--data",
            "weekly.csv",
            "--method",
            "moving_average",
            "--window",
            "2",
            "--horizon",
            "2",
            "--no-export",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["method"], "moving_average");
    assert_eq!(json["forecast"].as_array().unwrap().len(), 2);
    assert_eq!(json["forecast"][0]["predicted_defects"], 10);
    assert_eq!(json["indicators"]["peak_weekly_defects"], 12.0);
    assert!(!dir.path().join("forecast_output.csv").exists());
}

#[test]
fn forecast_without_required_window_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("defect_inflow_data.csv"), WEEKLY).unwrap();

    let output = inflow(dir.path(), &["forecast", "--method", "ewma", "--alpha", "0.5"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("window_size"));
}

#[test]
fn forecast_rejects_long_horizon() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("defect_inflow_data.csv"), WEEKLY).unwrap();

    let output = inflow(dir.path(), &["forecast", "--horizon", "7"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("horizon"));
}

#[test]
fn summary_json_has_indicator_names() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("defect_inflow_data.csv"), WEEKLY).unwrap();

    let output = inflow(dir.path(), &["summary", "--format", "json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["total_defects"], 30.0);
    assert_eq!(json["average_weekly_defects"], 10.0);
    assert_eq!(json["peak_weekly_defects"], 12.0);
}

#[test]
fn churn_requires_repo_and_out() {
    let dir = tempfile::tempdir().unwrap();
    let output = inflow(dir.path(), &["churn", "--repo", "."]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--out"));
}

#[test]
fn churn_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let repo_dir = dir.path().join("repo");
    let repo = Repository::init(&repo_dir).unwrap();
    std::fs::create_dir_all(repo_dir.join("src")).unwrap();
    std::fs::write(repo_dir.join("src/app.rs"), "a\nb\nc\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("src/app.rs")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("carol", "carol@example.com", &Time::new(1_700_000_000, 0)).unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
        .unwrap();

    let output = inflow(
        dir.path(),
        &["churn", "--repo", "repo", "--out", "out/churn.json"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("src/app.rs"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("out/churn.json")).unwrap())
            .unwrap();
    assert_eq!(report["files"]["src/app.rs"]["added"], 3);
    assert_eq!(report["modules"]["src"]["total_churn"], 3);
}
