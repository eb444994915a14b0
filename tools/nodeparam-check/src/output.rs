//! Output formatting.

use std::str::FromStr;

use colored::Colorize;
use nodeparam_core::{NodeParamError, TriggerPlan};
use nodeparam_id::BuildId;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// One planned build.
#[derive(Debug, Serialize, Tabled)]
pub struct BuildRow {
    #[tabled(rename = "#")]
    pub index: usize,

    #[tabled(rename = "MODE")]
    pub mode: &'static str,

    #[tabled(rename = "NODES")]
    pub nodes: String,

    #[tabled(rename = "BUILD")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub build_id: String,
}

/// Flatten a plan into rows, pairing builds with dispatched ids when known.
pub fn plan_rows(plan: &TriggerPlan, build_ids: &[BuildId]) -> Vec<BuildRow> {
    let (mode, values) = match plan {
        TriggerPlan::Single(value) => ("single", std::slice::from_ref(value)),
        TriggerPlan::Combined(value) => ("combined", std::slice::from_ref(value)),
        TriggerPlan::Concurrent(values) => ("concurrent", values.as_slice()),
    };

    values
        .iter()
        .enumerate()
        .map(|(i, value)| BuildRow {
            index: i + 1,
            mode,
            nodes: value.nodes().join(", "),
            build_id: build_ids.get(i).map(ToString::to_string).unwrap_or_default(),
        })
        .collect()
}

/// Print planned builds in the specified format.
pub fn print_plan(rows: &[BuildRow], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No builds planned.".dimmed());
            } else {
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(e) = err.downcast_ref::<NodeParamError>() {
        let hint = match e {
            NodeParamError::NoEligibleNode { .. } => {
                Some("Every matching node is offline or excluded by the eligibility policy.")
            }
            NodeParamError::MultiSelectionNotAllowed { .. } => {
                Some("The parameter accepts one node; narrow the selection or change trigger_if_result.")
            }
            NodeParamError::UnresolvableNode { .. } => {
                Some("Check the parameter's allowed_nodes list.")
            }
            _ => None,
        };
        if let Some(hint) = hint {
            eprintln!("\n{}", format!("Hint: {hint}").yellow());
        }
    }
}
