//! Fixture files describing a node pool and one node parameter.

use std::path::Path;

use anyhow::{Context, Result};
use nodeparam_core::{InMemoryNodeRegistry, NodeParameterConfig, NodeSnapshot};
use nodeparam_id::JobName;
use serde::Deserialize;

/// Contents of a fixture file.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Job the builds are queued for.
    #[serde(default)]
    pub job: Option<JobName>,

    /// Nodes known to the registry, in registry order.
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,

    pub parameter: NodeParameterConfig,
}

/// Job name used when the fixture does not name one.
pub const DEFAULT_JOB: &str = "nodeparam-check";

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid fixture {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn job(&self) -> Result<JobName> {
        match &self.job {
            Some(job) => Ok(job.clone()),
            None => Ok(JobName::parse(DEFAULT_JOB)?),
        }
    }

    pub fn registry(&self) -> InMemoryNodeRegistry {
        InMemoryNodeRegistry::new(self.nodes.clone())
    }
}
