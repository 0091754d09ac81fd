//! Per-user premium request budgets for GitHub Enterprise billing.
//!
//! A run creates a cost center in an enterprise, assigns one user to it, and
//! attaches a hard-capped budget for premium requests to that cost center.
//!
//! ```ignore
//! use pru_budget::billing::BillingClient;
//! use pru_budget::input::{resolve, NoPrompt, RawInput};
//! use pru_budget::settings::Settings;
//! use pru_budget::workflow::Workflow;
//!
//! let settings = Settings::default();
//! let request = resolve(raw_input, &mut NoPrompt)?;
//! let client = BillingClient::dry_run(&settings);
//! let report = Workflow::new(&client, &settings.product_sku).run(&request).await?;
//! ```

pub mod billing;
pub mod error;
pub mod input;
pub mod settings;
pub mod workflow;

pub use error::{ProvisionError, ProvisionResult};
