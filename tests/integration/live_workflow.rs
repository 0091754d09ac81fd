//! Workflow runs through the real HTTP client against a mock billing API.

use pru_budget::billing::BillingClient;
use pru_budget::input::{resolve, NoPrompt, RawInput};
use pru_budget::settings::Settings;
use pru_budget::workflow::{StepOutcome, Workflow, WorkflowState};
use pru_budget::ProvisionError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COST_CENTERS: &str = "/enterprises/acme/settings/billing/cost-centers";
const BUDGETS: &str = "/enterprises/acme/settings/billing/budgets";

fn raw_input() -> RawInput {
    RawInput {
        enterprise: "acme".to_string(),
        username: "mona".to_string(),
        budget_usd: Some(25.5),
        pru_rate: 0.04,
        cost_center_name: Some("Mona's PRUs".to_string()),
        alert_recipient: Some("finance-lead".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_run_sends_expected_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COST_CENTERS))
        .and(header("authorization", "Bearer live-token"))
        .and(body_json(json!({"name": "Mona's PRUs"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "cc-9"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/cc-9/resource", COST_CENTERS)))
        .and(body_json(json!({"users": ["mona"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BUDGETS))
        .and(body_json(json!({
            "budget_type": "SkuPricing",
            "budget_product_sku": "copilot_premium_request",
            "budget_scope": "cost_center",
            "budget_entity_name": "cc-9",
            "budget_amount": 25.5,
            "prevent_further_usage": true,
            "budget_alerting": {"will_alert": true, "alert_recipients": ["finance-lead"]}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "b-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = Settings::new().with_api_url(server.uri());
    let request = resolve(raw_input(), &mut NoPrompt).expect("request");
    let client = BillingClient::live(&settings, "live-token").expect("client");

    let report = Workflow::new(&client, settings.product_sku.clone())
        .run(&request)
        .await
        .expect("report");

    assert_eq!(report.cost_center_id.as_deref(), Some("cc-9"));
    assert_eq!(report.budget_id.as_deref(), Some("b-1"));
    assert!(report.warnings.is_empty());
    assert_eq!(report.state, WorkflowState::Done);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_cost_center_conflict_stops_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COST_CENTERS))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "A cost center with this name already exists"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BUDGETS))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let settings = Settings::new().with_api_url(server.uri());
    let request = resolve(raw_input(), &mut NoPrompt).expect("request");
    let client = BillingClient::live(&settings, "live-token").expect("client");

    let err = Workflow::new(&client, settings.product_sku.clone())
        .run(&request)
        .await
        .expect_err("fatal");

    assert!(matches!(err, ProvisionError::StepFailed { .. }));
    assert!(err.raw_response().expect("raw").contains("already exists"));
}

#[tokio::test]
async fn test_budget_rejection_is_a_warning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COST_CENTERS))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "cc-9"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/cc-9/resource", COST_CENTERS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BUDGETS))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Invalid budget amount"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = Settings::new().with_api_url(server.uri());
    let request = resolve(raw_input(), &mut NoPrompt).expect("request");
    let client = BillingClient::live(&settings, "live-token").expect("client");

    let report = Workflow::new(&client, settings.product_sku.clone())
        .run(&request)
        .await
        .expect("report");

    assert_eq!(report.cost_center_id.as_deref(), Some("cc-9"));
    assert!(report.budget_id.is_none());
    assert_eq!(report.steps[2].outcome, StepOutcome::Warned);
    assert!(report.warnings[0].contains("Invalid budget amount"));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let settings = Settings::new().with_api_url(server.uri());
    let mut input = raw_input();
    input.dry_run = true;
    let request = resolve(input, &mut NoPrompt).expect("request");
    let client = BillingClient::dry_run(&settings);

    let report = Workflow::new(&client, settings.product_sku.clone())
        .run(&request)
        .await
        .expect("report");

    assert!(report.dry_run);
    assert_eq!(report.steps.len(), 3);
    assert!(report.steps.iter().all(|s| s.outcome == StepOutcome::DryRun));
}
