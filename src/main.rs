//! `pru-budget` - create a cost center, assign a user, and cap their premium requests.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pru_budget::billing::{resolve_token, BillingClient};
use pru_budget::input::{self, NamePrompt, NoPrompt, RawInput, TerminalPrompt};
use pru_budget::settings::Settings;
use pru_budget::workflow::{ProvisioningSummary, Workflow};
use pru_budget::ProvisionResult;

/// Provision a per-user premium request budget in GitHub Enterprise billing.
///
/// Creates a cost center, assigns the user to it, and attaches a budget that
/// blocks further premium request usage once the amount is reached.
#[derive(Parser, Debug)]
#[command(name = "pru-budget")]
#[command(version)]
struct Cli {
    /// Enterprise slug
    #[arg(long)]
    enterprise: String,

    /// GitHub username to assign to the cost center
    #[arg(long)]
    user: String,

    /// Budget amount in USD
    #[arg(long, value_name = "AMOUNT")]
    budget_usd: Option<f64>,

    /// Budget as a number of premium requests (converted with --pru-rate)
    #[arg(long, value_name = "COUNT")]
    budget_prus: Option<u64>,

    /// USD per premium request (defaults to the pru_rate setting)
    #[arg(long, value_name = "USD")]
    pru_rate: Option<f64>,

    /// Cost center name (defaults to the username)
    #[arg(long)]
    cost_center_name: Option<String>,

    /// Username or email to alert as the budget is consumed
    #[arg(long)]
    alert_recipient: Option<String>,

    /// Print the requests that would be sent without sending them
    #[arg(long)]
    dry_run: bool,

    /// Never prompt for a cost center name
    #[arg(long)]
    no_prompt: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Settings file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let use_colors = console::colors_enabled_stderr();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if use_colors {
                eprintln!("{} {}", "Error:".red().bold(), err);
            } else {
                eprintln!("Error: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ProvisionResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    let raw = RawInput {
        enterprise: cli.enterprise,
        username: cli.user,
        budget_usd: cli.budget_usd,
        budget_prus: cli.budget_prus,
        pru_rate: cli.pru_rate.unwrap_or(settings.pru_rate),
        cost_center_name: cli.cost_center_name,
        alert_recipient: cli.alert_recipient,
        dry_run: cli.dry_run,
    };
    let mut prompt: Box<dyn NamePrompt> = if cli.no_prompt {
        Box::new(NoPrompt)
    } else {
        Box::new(TerminalPrompt::new())
    };
    let request = input::resolve(raw, prompt.as_mut())?;

    let client = if request.dry_run {
        BillingClient::dry_run(&settings)
    } else {
        let (token, source) = resolve_token(settings.gh_hostname().as_deref())?;
        tracing::debug!(source = %source, "Resolved API token");
        BillingClient::live(&settings, token)?
    };

    let report = Workflow::new(&client, settings.product_sku.clone())
        .run(&request)
        .await?;

    let summary = ProvisioningSummary::new(&request, &report);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render(console::colors_enabled()));
    }
    Ok(())
}

/// Log filter used when `RUST_LOG` is unset.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "pru_budget=debug,warn"
    } else {
        "warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(console::colors_enabled_stderr()),
        )
        .with(filter)
        .init();
}
