//! nodeparam-check - resolve a node parameter selection offline.
//!
//! Loads a fixture describing a node pool and one node parameter, resolves
//! the submitted selection the way a build trigger would, and prints the
//! builds that would be queued.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use nodeparam_core::{
    descriptor, dispatch, NodeParameterDefinition, NodeParameterValue, RecordingBuildTrigger,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod fixture;
mod output;

use config::Config;
use fixture::Fixture;
use output::OutputFormat;

/// Resolve a node parameter selection against a fixture.
#[derive(Debug, Parser)]
#[command(name = "nodeparam-check")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Fixture file with `[[nodes]]` and a `[parameter]` table.
    #[arg(long)]
    fixture: PathBuf,

    /// Node name or label expression to submit. Repeat for a multi-node
    /// submission; omit to use the parameter's default nodes.
    #[arg(long = "select", value_name = "TOKEN")]
    select: Vec<String>,

    /// Output format (table or json).
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Submit the plan to a recording build trigger and show build ids.
    #[arg(long)]
    dispatch: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let fixture = Fixture::load(&cli.fixture)?;
    let registry = fixture.registry();
    let job = fixture.job()?;
    let definition = NodeParameterDefinition::from_config(fixture.parameter, descriptor())?;
    debug!(
        parameter = definition.name(),
        eligibility = %definition.eligibility(),
        policy = %definition.trigger_if_result(),
        "Loaded node parameter"
    );

    let value = submitted_value(&definition, cli.select)?;
    let plan = definition.plan(&value, &registry)?;
    info!(job = %job, builds = plan.build_count(), "Planned builds");

    let build_ids = if cli.dispatch {
        let trigger = RecordingBuildTrigger::new();
        dispatch(plan.clone(), &job, &trigger).await?
    } else {
        Vec::new()
    };

    let format = cli.format.unwrap_or(config.format);
    output::print_plan(&output::plan_rows(&plan, &build_ids), format);
    Ok(())
}

fn submitted_value(definition: &NodeParameterDefinition, mut select: Vec<String>) -> Result<NodeParameterValue> {
    match select.len() {
        0 => definition.default_value().ok_or_else(|| {
            anyhow::anyhow!(
                "no --select given and parameter '{}' has no default nodes",
                definition.name()
            )
        }),
        1 => Ok(definition.create_value(&select.remove(0))),
        _ => Ok(definition.create_value_multi(select)?),
    }
}
