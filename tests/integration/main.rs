//! Integration tests for the pru-budget binary and the live workflow.

mod cli;
mod live_workflow;
