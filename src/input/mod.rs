//! Input resolution.
//!
//! Turns raw command-line values into a validated [`ProvisioningRequest`].
//! Everything here runs before any network call, so every rejection is a
//! configuration error.

pub mod prompt;

use serde::Serialize;

use crate::error::{ProvisionError, ProvisionResult};

pub use prompt::{NamePrompt, NoPrompt, TerminalPrompt};

/// Unvalidated values as they arrive from the command line.
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    pub enterprise: String,
    pub username: String,
    pub budget_usd: Option<f64>,
    pub budget_prus: Option<u64>,
    pub pru_rate: f64,
    pub cost_center_name: Option<String>,
    pub alert_recipient: Option<String>,
    pub dry_run: bool,
}

/// How the budget amount was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetSource {
    /// Given directly in USD.
    DirectUsd,
    /// Converted from a premium request count. Kept for display only.
    Prus { units: u64, rate: f64 },
}

/// A validated, strictly positive USD budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedBudget {
    pub amount_usd: f64,
    pub source: BudgetSource,
}

impl ResolvedBudget {
    /// Amount formatted as `$40.00`.
    pub fn display_amount(&self) -> String {
        format!("${:.2}", self.amount_usd)
    }

    /// `~1000 PRUs at $0.04/PRU` when the budget came from a PRU count.
    pub fn pru_note(&self) -> Option<String> {
        match self.source {
            BudgetSource::DirectUsd => None,
            BudgetSource::Prus { units, rate } => {
                Some(format!("~{} PRUs at ${}/PRU", units, format_rate(rate)))
            }
        }
    }
}

/// Everything one provisioning run needs. Built once, then only borrowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningRequest {
    pub enterprise: String,
    pub username: String,
    pub cost_center_name: String,
    pub budget: ResolvedBudget,
    pub alert_recipient: Option<String>,
    pub dry_run: bool,
}

/// Validate raw input and build the request.
///
/// The prompt is consulted only when no cost center name was given, the run
/// is live, and the prompt reports an attended terminal.
pub fn resolve(raw: RawInput, prompt: &mut dyn NamePrompt) -> ProvisionResult<ProvisioningRequest> {
    let enterprise = require_non_empty("--enterprise", &raw.enterprise)?;
    let username = require_non_empty("--user", &raw.username)?;
    let budget = resolve_budget(raw.budget_usd, raw.budget_prus, raw.pru_rate)?;
    let cost_center_name =
        resolve_cost_center_name(raw.cost_center_name.as_deref(), &username, raw.dry_run, prompt)?;
    let alert_recipient = raw
        .alert_recipient
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    Ok(ProvisioningRequest {
        enterprise,
        username,
        cost_center_name,
        budget,
        alert_recipient,
        dry_run: raw.dry_run,
    })
}

/// Resolve the budget from exactly one of a USD amount or a PRU count.
pub fn resolve_budget(
    budget_usd: Option<f64>,
    budget_prus: Option<u64>,
    pru_rate: f64,
) -> ProvisionResult<ResolvedBudget> {
    let budget = match (budget_usd, budget_prus) {
        (Some(_), Some(_)) => {
            return Err(ProvisionError::InvalidInput(
                "use either --budget-usd or --budget-prus, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(ProvisionError::InvalidInput(
                "a budget is required: pass --budget-usd or --budget-prus".to_string(),
            ))
        }
        (Some(usd), None) => {
            if !usd.is_finite() || usd < 0.0 {
                return Err(ProvisionError::InvalidInput(format!(
                    "--budget-usd must be a non-negative amount, got {}",
                    usd
                )));
            }
            ResolvedBudget {
                amount_usd: round_cents(usd),
                source: BudgetSource::DirectUsd,
            }
        }
        (None, Some(units)) => {
            if !pru_rate.is_finite() || pru_rate < 0.0 {
                return Err(ProvisionError::InvalidInput(format!(
                    "--pru-rate must be a non-negative amount, got {}",
                    pru_rate
                )));
            }
            ResolvedBudget {
                amount_usd: prus_to_usd(units, pru_rate),
                source: BudgetSource::Prus {
                    units,
                    rate: pru_rate,
                },
            }
        }
    };

    if budget.amount_usd <= 0.0 {
        return Err(ProvisionError::InvalidInput(format!(
            "budget must be greater than $0.00, got {}",
            budget.display_amount()
        )));
    }

    Ok(budget)
}

/// `round(units * rate, 2)`.
///
/// `units` goes through `f64`, so counts above 2^53 lose precision before
/// the multiplication. Real premium request counts are far below that.
pub fn prus_to_usd(units: u64, rate: f64) -> f64 {
    round_cents(units as f64 * rate)
}

/// Round to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pick the cost center name: explicit value, prompt answer, or the username.
pub fn resolve_cost_center_name(
    explicit: Option<&str>,
    username: &str,
    dry_run: bool,
    prompt: &mut dyn NamePrompt,
) -> ProvisionResult<String> {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return Ok(name.to_string());
    }

    if dry_run || !prompt.is_attended() {
        return Ok(username.to_string());
    }

    let answer = prompt.ask(username)?;
    let answer = answer.trim();
    if answer.is_empty() {
        Ok(username.to_string())
    } else {
        Ok(answer.to_string())
    }
}

fn require_non_empty(flag: &str, value: &str) -> ProvisionResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProvisionError::InvalidInput(format!("{} is required", flag)));
    }
    Ok(value.to_string())
}

/// At least two decimals, more only when the rate needs them (`0.04`, `0.035`).
fn format_rate(rate: f64) -> String {
    let mut text = format!("{:.6}", rate);
    while text.ends_with('0') && text.len() - text.find('.').unwrap_or(0) > 3 {
        text.pop();
    }
    text
}
