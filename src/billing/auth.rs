//! Ambient credential lookup.
//!
//! The tool never stores credentials. A token comes from `GH_TOKEN`, then
//! `GITHUB_TOKEN`, then the GitHub CLI's stored session.

use std::env;
use std::fmt;
use std::io;
use std::process::Command;

use crate::error::{ProvisionError, ProvisionResult};

/// Environment variables checked for a token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

/// GitHub CLI program name.
pub const GH_PROGRAM: &str = "gh";

/// Where a token was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Env(&'static str),
    GhCli,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Env(var) => write!(f, "${}", var),
            TokenSource::GhCli => write!(f, "gh auth token"),
        }
    }
}

/// Find a token using the process environment and the `gh` CLI.
pub fn resolve_token(hostname: Option<&str>) -> ProvisionResult<(String, TokenSource)> {
    resolve_token_with(|name| env::var(name).ok(), GH_PROGRAM, hostname)
}

/// Token lookup with an injectable environment and CLI program.
pub fn resolve_token_with<F>(
    lookup: F,
    gh_program: &str,
    hostname: Option<&str>,
) -> ProvisionResult<(String, TokenSource)>
where
    F: Fn(&str) -> Option<String>,
{
    for var in TOKEN_ENV_VARS {
        if let Some(token) = lookup(var).map(|t| t.trim().to_string()) {
            if !token.is_empty() {
                tracing::debug!(source = var, "Using token from environment");
                return Ok((token, TokenSource::Env(var)));
            }
        }
    }

    let token = gh_auth_token(gh_program, hostname)?;
    tracing::debug!("Using token from gh CLI session");
    Ok((token, TokenSource::GhCli))
}

fn gh_auth_token(program: &str, hostname: Option<&str>) -> ProvisionResult<String> {
    let mut command = Command::new(program);
    command.args(["auth", "token"]);
    if let Some(host) = hostname {
        command.args(["--hostname", host]);
    }

    let output = match command.output() {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ProvisionError::DependencyMissing {
                program: program.to_string(),
                hint: "install the GitHub CLI and run `gh auth login`, or set GH_TOKEN".to_string(),
            })
        }
        Err(err) => return Err(ProvisionError::Auth(format!("failed to run {}: {}", program, err))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProvisionError::Auth(format!(
            "`{} auth token` failed: {}",
            program,
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(ProvisionError::Auth(format!(
            "`{} auth token` returned no token; run `gh auth login`",
            program
        )));
    }
    Ok(token)
}
