//! Binary tests for argument handling, dry runs, and live runs against a mock API.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COST_CENTERS: &str = "/enterprises/my-company/settings/billing/cost-centers";
const BUDGETS: &str = "/enterprises/my-company/settings/billing/budgets";

/// Get a Command for the binary, isolated from the caller's settings and tokens.
#[allow(deprecated)]
fn pru_budget_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pru-budget").expect("Failed to find pru-budget binary");
    cmd.current_dir(dir.path())
        .env_remove("PRU_BUDGET_CONFIG")
        .env_remove("PRU_BUDGET_API_URL")
        .env_remove("PRU_BUDGET_PRU_RATE")
        .env_remove("GH_TOKEN")
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[test]
fn test_dry_run_with_prus_prints_summary() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-prus",
            "1000",
            "--pru-rate",
            "0.04",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run complete"))
        .stdout(predicate::str::contains(
            "Cost center: octocat (id: <cost-center-id>)",
        ))
        .stdout(predicate::str::contains("Budget: $40.00 USD — hard cap"))
        .stdout(predicate::str::contains("(~1000 PRUs at $0.04/PRU)"))
        .stderr(predicate::str::contains(format!("[dry-run] POST {}", COST_CENTERS)))
        .stderr(predicate::str::contains(
            "[dry-run] POST /enterprises/my-company/settings/billing/cost-centers/<cost-center-id>/resource",
        ))
        .stderr(predicate::str::contains(format!("[dry-run] POST {}", BUDGETS)));
}

#[test]
fn test_default_rate_applies_without_flag() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-prus",
            "1000",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("$40.00 USD"));
}

#[test]
fn test_dry_run_with_usd_has_no_pru_line() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-usd",
            "50",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Budget: $50.00 USD"))
        .stdout(predicate::str::contains("PRU").not())
        .stderr(predicate::str::contains("Running step").not());
}

#[test]
fn test_verbose_enables_step_logs() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-usd",
            "50",
            "--dry-run",
            "--verbose",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Running step"));
}

#[test]
fn test_both_budget_forms_rejected() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-usd",
            "50",
            "--budget-prus",
            "1000",
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not both"))
        .stderr(predicate::str::contains("[dry-run]").not());
}

#[test]
fn test_missing_budget_rejected() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args(["--enterprise", "my-company", "--user", "octocat", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a budget is required"));
}

#[test]
fn test_zero_budget_rejected() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-usd",
            "0",
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than $0.00"));
}

#[test]
fn test_missing_user_is_usage_error() {
    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .args(["--enterprise", "my-company", "--budget-usd", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_json_summary() {
    let dir = temp_dir();
    let output = pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-prus",
            "1000",
            "--alert-recipient",
            "billing-admin",
            "--dry-run",
            "--json",
        ])
        .output()
        .expect("run");

    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(summary["dry_run"], true);
    assert_eq!(summary["cost_center_name"], "octocat");
    assert_eq!(summary["budget_amount_usd"], 40.0);
    assert_eq!(summary["budget_prus"], 1000);
    assert_eq!(summary["alert_recipient"], "billing-admin");
}

#[test]
fn test_settings_file_sets_default_rate() {
    let dir = temp_dir();
    fs::write(dir.path().join("pru-budget.toml"), "pru_rate = 0.05\n").expect("write settings");

    pru_budget_cmd(&dir)
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-prus",
            "100",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("$5.00 USD"))
        .stdout(predicate::str::contains("~100 PRUs at $0.05/PRU"));
}

#[test]
fn test_missing_gh_without_token_fails_before_network() {
    let dir = temp_dir();
    let empty_path = temp_dir();
    pru_budget_cmd(&dir)
        .env("PATH", empty_path.path())
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-usd",
            "50",
            "--no-prompt",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("`gh` was not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_live_run_against_mock_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COST_CENTERS))
        .and(body_partial_json(json!({"name": "octocat"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "cc-123"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/cc-123/resource", COST_CENTERS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Resources successfully added to the cost center.",
            "reassigned_resources": [
                {"resource_type": "User", "name": "octocat", "previous_cost_center": "Legacy"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BUDGETS))
        .and(body_partial_json(json!({
            "budget_entity_name": "cc-123",
            "budget_amount": 40.0,
            "prevent_further_usage": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"budget": {"id": "b-456"}})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .env("PRU_BUDGET_API_URL", server.uri())
        .env("GH_TOKEN", "test-token")
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-prus",
            "1000",
            "--no-prompt",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("with 1 warning(s)"))
        .stdout(predicate::str::contains("Cost center: octocat (id: cc-123)"))
        .stdout(predicate::str::contains("Budget id: b-456"))
        .stdout(predicate::str::contains("moved from cost center 'Legacy'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_live_run_aborts_without_cost_center_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COST_CENTERS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "odd"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BUDGETS))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dir = temp_dir();
    pru_budget_cmd(&dir)
        .env("PRU_BUDGET_API_URL", server.uri())
        .env("GH_TOKEN", "test-token")
        .args([
            "--enterprise",
            "my-company",
            "--user",
            "octocat",
            "--budget-usd",
            "50",
            "--no-prompt",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("create cost center"))
        .stderr(predicate::str::contains(r#"{"message":"odd"}"#));

    // Only the cost center call reached the server.
    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 1);
}
