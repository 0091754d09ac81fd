//! Provisioning workflow.
//!
//! A fixed, ordered list of [`StepDescriptor`]s run by one generic runner.
//! Each step feeds the cost center id forward; nothing runs concurrently.
//!
//! State progression:
//!
//! ```text
//! Created -> CostCenterCreated(id) -> UserAssigned(id) -> BudgetCreated(budget_id) -> Done
//!    \______________________ any step may end in Failed ______________________/
//! ```
//!
//! A step that only warned does not advance the state, and a run with a
//! warned step stops at the last state it reached instead of `Done`.
//!
//! Only the cost center step is fatal. The assignment and budget steps warn
//! and continue, because the cost center already exists on the platform by
//! the time they run and nothing here rolls it back.

pub mod steps;
pub mod summary;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::billing::{ApiResponse, BillingApi};
use crate::error::{ProvisionError, ProvisionResult};
use crate::input::ProvisioningRequest;

pub use steps::{
    provisioning_steps, Extraction, FailurePolicy, StepDescriptor, StepKind, DRY_RUN_BUDGET_ID,
    DRY_RUN_COST_CENTER_ID,
};
pub use summary::ProvisioningSummary;

/// Inputs a step's request builder and extractor can see.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub request: &'a ProvisioningRequest,
    pub product_sku: &'a str,
    cost_center_id: Option<&'a str>,
}

impl<'a> StepContext<'a> {
    pub fn new(request: &'a ProvisioningRequest, product_sku: &'a str) -> Self {
        Self {
            request,
            product_sku,
            cost_center_id: None,
        }
    }

    pub fn with_cost_center_id(mut self, id: &'a str) -> Self {
        self.cost_center_id = Some(id);
        self
    }

    /// Cost center id from the first step. Only steps with
    /// `needs_cost_center` are built, and the runner checks it first.
    pub fn cost_center_id(&self) -> &'a str {
        self.cost_center_id.unwrap_or(DRY_RUN_COST_CENTER_ID)
    }
}

/// Where a run currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    Created,
    CostCenterCreated { cost_center_id: String },
    UserAssigned { cost_center_id: String },
    BudgetCreated { budget_id: Option<String> },
    Done,
    Failed { step: String },
}

/// How a single step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    /// Failed under a `Warn` policy; the run carried on.
    Warned,
    /// Described only, never sent.
    DryRun,
}

/// Record of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub name: &'static str,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningReport {
    pub dry_run: bool,
    pub cost_center_id: Option<String>,
    pub budget_id: Option<String>,
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<String>,
    pub state: WorkflowState,
}

impl ProvisioningReport {
    /// Whether every step went through without a downgraded failure.
    pub fn is_complete(&self) -> bool {
        self.state == WorkflowState::Done
    }
}

/// Runs the provisioning steps against a billing API.
pub struct Workflow<'a> {
    api: &'a dyn BillingApi,
    product_sku: String,
    steps: Vec<StepDescriptor>,
}

impl<'a> Workflow<'a> {
    /// Workflow with the standard three steps.
    pub fn new(api: &'a dyn BillingApi, product_sku: impl Into<String>) -> Self {
        Self::with_steps(api, product_sku, provisioning_steps())
    }

    pub fn with_steps(
        api: &'a dyn BillingApi,
        product_sku: impl Into<String>,
        steps: Vec<StepDescriptor>,
    ) -> Self {
        Self {
            api,
            product_sku: product_sku.into(),
            steps,
        }
    }

    /// Run every step in order.
    ///
    /// Returns an error only when a `Fatal` step fails; `Warn` failures end
    /// up in [`ProvisioningReport::warnings`].
    pub async fn run(&self, request: &ProvisioningRequest) -> ProvisionResult<ProvisioningReport> {
        let mut state = WorkflowState::Created;
        let mut cost_center_id: Option<String> = None;
        let mut budget_id: Option<String> = None;
        let mut records = Vec::with_capacity(self.steps.len());
        let mut warnings = Vec::new();

        for step in &self.steps {
            let mut ctx = StepContext::new(request, &self.product_sku);
            if let Some(id) = cost_center_id.as_deref() {
                ctx = ctx.with_cost_center_id(id);
            } else if step.needs_cost_center {
                return Err(ProvisionError::StepFailed {
                    step: step.name.to_string(),
                    reason: "no cost center id is available".to_string(),
                    raw: String::new(),
                });
            }

            info!(step = step.name, "Running step");
            let api_request = (step.build)(&ctx);
            let result = match self.api.send(&api_request).await {
                Ok(response) if response.is_dry_run() => Ok((
                    StepOutcome::DryRun,
                    step.dry_run_placeholder.map(str::to_string),
                )),
                Ok(response) => match self.check_response(step, &ctx, &response, &mut warnings) {
                    Ok(id) => Ok((StepOutcome::Succeeded, id)),
                    Err(reason) => self
                        .handle_failure(step, reason, response.body, &mut warnings)
                        .map(|()| (StepOutcome::Warned, None)),
                },
                Err(err) => {
                    let raw = err.raw_response().unwrap_or_default().to_string();
                    self.handle_failure(step, err.to_string(), raw, &mut warnings)
                        .map(|()| (StepOutcome::Warned, None))
                }
            };

            let (outcome, id) = match result {
                Ok(done) => done,
                Err(err) => {
                    state = WorkflowState::Failed {
                        step: step.name.to_string(),
                    };
                    error!(state = ?state, "Workflow aborted");
                    return Err(err);
                }
            };

            state = advance(step.kind, outcome, &state, id.clone());
            debug!(state = ?state, "Workflow advanced");
            match step.kind {
                StepKind::CreateCostCenter => cost_center_id = id.clone(),
                StepKind::CreateBudget => budget_id = id.clone(),
                StepKind::AssignUser => {}
            }
            records.push(StepRecord {
                name: step.name,
                outcome,
                id,
            });
        }

        if records.iter().all(|r| r.outcome != StepOutcome::Warned) {
            state = WorkflowState::Done;
        }

        Ok(ProvisioningReport {
            dry_run: request.dry_run,
            cost_center_id,
            budget_id,
            steps: records,
            warnings,
            state,
        })
    }

    /// Decode a live response. `Err` carries the reason the step failed.
    fn check_response(
        &self,
        step: &StepDescriptor,
        ctx: &StepContext<'_>,
        response: &ApiResponse,
        warnings: &mut Vec<String>,
    ) -> Result<Option<String>, String> {
        let extraction = (step.extract)(ctx, response)
            .map_err(|e| format!("response could not be decoded: {}", e))?;

        for note in extraction.warnings {
            warn!(step = step.name, "{}", note);
            warnings.push(note);
        }

        if let Some(error) = extraction.error {
            return Err(error);
        }
        if step.yields_id && extraction.id.is_none() {
            return Err("no id in response".to_string());
        }

        info!(step = step.name, id = ?extraction.id, "Step succeeded");
        Ok(extraction.id)
    }

    /// Apply the step's failure policy.
    fn handle_failure(
        &self,
        step: &StepDescriptor,
        reason: String,
        raw: String,
        warnings: &mut Vec<String>,
    ) -> ProvisionResult<()> {
        match step.policy {
            FailurePolicy::Fatal => Err(ProvisionError::StepFailed {
                step: step.name.to_string(),
                reason,
                raw,
            }),
            FailurePolicy::Warn => {
                let raw = if raw.trim().is_empty() { "<empty>" } else { raw.as_str() };
                let message = format!(
                    "{} did not complete ({}); continuing. Verify manually. Response: {}",
                    step.name, reason, raw
                );
                warn!(step = step.name, "{}", message);
                warnings.push(message);
                Ok(())
            }
        }
    }
}

fn advance(
    kind: StepKind,
    outcome: StepOutcome,
    state: &WorkflowState,
    id: Option<String>,
) -> WorkflowState {
    if outcome == StepOutcome::Warned {
        return state.clone();
    }
    match (kind, state) {
        (StepKind::CreateCostCenter, _) => WorkflowState::CostCenterCreated {
            cost_center_id: id.unwrap_or_default(),
        },
        (StepKind::AssignUser, WorkflowState::CostCenterCreated { cost_center_id }) => {
            WorkflowState::UserAssigned {
                cost_center_id: cost_center_id.clone(),
            }
        }
        (StepKind::AssignUser, other) => other.clone(),
        (StepKind::CreateBudget, _) => WorkflowState::BudgetCreated { budget_id: id },
    }
}
