//! End-of-run summary.

use owo_colors::OwoColorize;
use serde::Serialize;

use super::ProvisioningReport;
use crate::input::{BudgetSource, ProvisioningRequest};

/// What a run did, in a form that prints as text or serializes as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningSummary {
    pub dry_run: bool,
    pub enterprise: String,
    pub cost_center_name: String,
    pub cost_center_id: Option<String>,
    pub username: String,
    pub budget_amount_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_prus: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pru_rate: Option<f64>,
    pub budget_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_recipient: Option<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    budget_line: String,
}

impl ProvisioningSummary {
    pub fn new(request: &ProvisioningRequest, report: &ProvisioningReport) -> Self {
        let (budget_prus, pru_rate) = match request.budget.source {
            BudgetSource::Prus { units, rate } => (Some(units), Some(rate)),
            BudgetSource::DirectUsd => (None, None),
        };

        let mut budget_line = format!(
            "{} USD — hard cap, further usage blocked at the limit",
            request.budget.display_amount()
        );
        if let Some(note) = request.budget.pru_note() {
            budget_line.push_str(&format!(" ({})", note));
        }

        Self {
            dry_run: report.dry_run,
            enterprise: request.enterprise.clone(),
            cost_center_name: request.cost_center_name.clone(),
            cost_center_id: report.cost_center_id.clone(),
            username: request.username.clone(),
            budget_amount_usd: request.budget.amount_usd,
            budget_prus,
            pru_rate,
            budget_id: report.budget_id.clone(),
            alert_recipient: request.alert_recipient.clone(),
            warnings: report.warnings.clone(),
            budget_line,
        }
    }

    /// Plain summary lines, without color.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Cost center: {} (id: {})",
                self.cost_center_name,
                self.cost_center_id.as_deref().unwrap_or("unknown")
            ),
            format!("User: {}", self.username),
            format!("Budget: {}", self.budget_line),
            format!(
                "Budget id: {}",
                self.budget_id.as_deref().unwrap_or("not returned")
            ),
        ];
        if let Some(recipient) = &self.alert_recipient {
            lines.push(format!("Alerts: {}", recipient));
        }
        lines
    }

    /// Full text rendering, colored when `use_colors` is set.
    pub fn render(&self, use_colors: bool) -> String {
        let title = match (self.dry_run, self.warnings.is_empty()) {
            (true, _) => "Dry run complete, no changes made".to_string(),
            (false, true) => format!("Provisioned {} in {}", self.username, self.enterprise),
            (false, false) => format!(
                "Provisioned {} in {} with {} warning(s)",
                self.username,
                self.enterprise,
                self.warnings.len()
            ),
        };

        let mut out = String::new();
        if use_colors {
            if self.warnings.is_empty() {
                out.push_str(&format!("{}\n", title.green().bold()));
            } else {
                out.push_str(&format!("{}\n", title.yellow().bold()));
            }
        } else {
            out.push_str(&title);
            out.push('\n');
        }

        for line in self.lines() {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }

        for warning in &self.warnings {
            if use_colors {
                out.push_str(&format!("  {} {}\n", "Warning:".yellow(), warning));
            } else {
                out.push_str(&format!("  Warning: {}\n", warning));
            }
        }
        out
    }
}
