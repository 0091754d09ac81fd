//! Typed shapes of the billing API responses the workflow reads.
//!
//! Only the fields the workflow checks are modeled; everything else in a
//! response is ignored.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Response to `POST .../cost-centers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostCenterCreatedResponse {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A resource the platform moved out of another cost center.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReassignedResource {
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub previous_cost_center: Option<String>,
}

/// Response to `POST .../cost-centers/{id}/resource`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reassigned_resources: Vec<ReassignedResource>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub errors: Vec<Value>,
}

impl AssignmentResponse {
    /// Explicit error carried in the body, if any.
    pub fn error_message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(match error {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            });
        }
        if !self.errors.is_empty() {
            let joined = self
                .errors
                .iter()
                .map(|e| match e.get("message").and_then(Value::as_str) {
                    Some(message) => message.to_string(),
                    None => e.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Some(joined);
        }
        None
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetRef {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
}

/// Response to `POST .../budgets`. The id may be top-level or nested under `budget`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetCreatedResponse {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub budget: Option<BudgetRef>,
    #[serde(default)]
    pub message: Option<String>,
}

impl BudgetCreatedResponse {
    pub fn budget_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or_else(|| self.budget.as_ref().and_then(|b| b.id.as_deref()))
    }
}

/// Accept ids as strings or numbers; treat blank strings and null as absent.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
