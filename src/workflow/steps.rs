//! The three provisioning steps, as declarative descriptors.

use serde_json::{json, Value};

use crate::billing::models::{AssignmentResponse, BudgetCreatedResponse, CostCenterCreatedResponse};
use crate::billing::{enterprise_billing_path, ApiRequest, ApiResponse};

use super::StepContext;

/// Placeholder id used in dry runs in place of the created cost center.
pub const DRY_RUN_COST_CENTER_ID: &str = "<cost-center-id>";

/// Placeholder id used in dry runs in place of the created budget.
pub const DRY_RUN_BUDGET_ID: &str = "<budget-id>";

/// What happens to the run when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run; later steps need this step's output.
    Fatal,
    /// Record a warning with the raw response and carry on.
    Warn,
}

/// Which part of the workflow a descriptor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    CreateCostCenter,
    AssignUser,
    CreateBudget,
}

/// What a step pulled out of its response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub id: Option<String>,
    /// Explicit error reported in an otherwise successful response.
    pub error: Option<String>,
    /// Notes worth surfacing even though the step succeeded.
    pub warnings: Vec<String>,
}

/// One step of the workflow.
#[derive(Clone, Copy)]
pub struct StepDescriptor {
    pub kind: StepKind,
    pub name: &'static str,
    pub policy: FailurePolicy,
    /// Whether a missing id in a live response counts as failure.
    pub yields_id: bool,
    /// Whether the step can only run once a cost center id is known.
    pub needs_cost_center: bool,
    /// Id reported for this step in dry runs.
    pub dry_run_placeholder: Option<&'static str>,
    pub build: fn(&StepContext<'_>) -> ApiRequest,
    pub extract: fn(&StepContext<'_>, &ApiResponse) -> Result<Extraction, serde_json::Error>,
}

impl std::fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Create cost center, assign user, create budget.
pub fn provisioning_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor {
            kind: StepKind::CreateCostCenter,
            name: "create cost center",
            policy: FailurePolicy::Fatal,
            yields_id: true,
            needs_cost_center: false,
            dry_run_placeholder: Some(DRY_RUN_COST_CENTER_ID),
            build: build_create_cost_center,
            extract: extract_cost_center,
        },
        StepDescriptor {
            kind: StepKind::AssignUser,
            name: "assign user",
            policy: FailurePolicy::Warn,
            yields_id: false,
            needs_cost_center: true,
            dry_run_placeholder: None,
            build: build_assign_user,
            extract: extract_assignment,
        },
        StepDescriptor {
            kind: StepKind::CreateBudget,
            name: "create budget",
            policy: FailurePolicy::Warn,
            yields_id: true,
            needs_cost_center: true,
            dry_run_placeholder: Some(DRY_RUN_BUDGET_ID),
            build: build_create_budget,
            extract: extract_budget,
        },
    ]
}

fn build_create_cost_center(ctx: &StepContext<'_>) -> ApiRequest {
    ApiRequest::post(
        format!("{}/cost-centers", enterprise_billing_path(&ctx.request.enterprise)),
        json!({ "name": ctx.request.cost_center_name }),
    )
}

fn build_assign_user(ctx: &StepContext<'_>) -> ApiRequest {
    ApiRequest::post(
        format!(
            "{}/cost-centers/{}/resource",
            enterprise_billing_path(&ctx.request.enterprise),
            ctx.cost_center_id()
        ),
        json!({ "users": [ctx.request.username] }),
    )
}

fn build_create_budget(ctx: &StepContext<'_>) -> ApiRequest {
    ApiRequest::post(
        format!("{}/budgets", enterprise_billing_path(&ctx.request.enterprise)),
        json!({
            "budget_type": "SkuPricing",
            "budget_product_sku": ctx.product_sku,
            "budget_scope": "cost_center",
            "budget_entity_name": ctx.cost_center_id(),
            "budget_amount": ctx.request.budget.amount_usd,
            "prevent_further_usage": true,
            "budget_alerting": budget_alerting(ctx.request.alert_recipient.as_deref()),
        }),
    )
}

fn budget_alerting(recipient: Option<&str>) -> Value {
    match recipient {
        Some(recipient) => json!({ "will_alert": true, "alert_recipients": [recipient] }),
        None => json!({ "will_alert": false, "alert_recipients": [] }),
    }
}

fn extract_cost_center(
    _ctx: &StepContext<'_>,
    response: &ApiResponse,
) -> Result<Extraction, serde_json::Error> {
    let parsed: CostCenterCreatedResponse = serde_json::from_value(response.json()?)?;
    Ok(Extraction {
        id: parsed.id,
        ..Default::default()
    })
}

fn extract_assignment(
    ctx: &StepContext<'_>,
    response: &ApiResponse,
) -> Result<Extraction, serde_json::Error> {
    let parsed: AssignmentResponse = serde_json::from_value(response.json()?)?;
    let warnings = parsed
        .reassigned_resources
        .iter()
        .map(|resource| {
            let who = resource.name.as_deref().unwrap_or(&ctx.request.username);
            match resource.previous_cost_center.as_deref() {
                Some(previous) => format!(
                    "{} was moved from cost center '{}' to '{}'",
                    who, previous, ctx.request.cost_center_name
                ),
                None => format!(
                    "{} was moved from a previous cost center to '{}'",
                    who, ctx.request.cost_center_name
                ),
            }
        })
        .collect();

    Ok(Extraction {
        id: None,
        error: parsed.error_message(),
        warnings,
    })
}

fn extract_budget(
    _ctx: &StepContext<'_>,
    response: &ApiResponse,
) -> Result<Extraction, serde_json::Error> {
    let parsed: BudgetCreatedResponse = serde_json::from_value(response.json()?)?;
    Ok(Extraction {
        id: parsed.budget_id().map(str::to_string),
        ..Default::default()
    })
}
