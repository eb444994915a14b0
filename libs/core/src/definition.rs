//! The node parameter definition.
//!
//! A definition is built once when a job configuration is loaded and is
//! immutable afterwards. Each build trigger turns a submission into a fresh
//! [`NodeParameterValue`]; the definition never keeps it.

use nodeparam_id::NodeName;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::descriptor::Descriptor;
use crate::eligibility::Eligibility;
use crate::error::{NodeParamError, NodeParamResult};
use crate::node::NodeRegistry;
use crate::policy::TriggerIfResult;
use crate::resolver::{AllowedNodes, NodeResolver};
use crate::trigger::{TriggerAggregator, TriggerPlan};
use crate::value::{NodeParameterValue, SubmittedSelection};

/// Build parameter selecting the node(s) a job runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeParameterDefinition {
    name: String,
    description: String,
    default_nodes: Vec<NodeName>,
    allowed_nodes: Vec<NodeName>,
    trigger_if_result: TriggerIfResult,
    eligibility: Eligibility,
    allow_multi_node_selection: bool,
    trigger_concurrent_builds: bool,
}

impl NodeParameterDefinition {
    /// Create a definition.
    ///
    /// `allowed_nodes` is copied; the caller's list is left as it was.
    /// Multi-node selection is enabled unless the policy disallows it, and
    /// concurrent builds are enabled for the concurrent-builds policies.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        default_nodes: &[NodeName],
        allowed_nodes: &[NodeName],
        trigger_if_result: impl Into<TriggerIfResult>,
        eligibility: Eligibility,
    ) -> Self {
        let trigger_if_result = trigger_if_result.into();
        let allow_multi_node_selection = !trigger_if_result.is_multi_select_disallowed();
        let trigger_concurrent_builds = trigger_if_result.is_concurrent();

        Self {
            name: name.into(),
            description: description.into(),
            default_nodes: default_nodes.to_vec(),
            allowed_nodes: allowed_nodes.to_vec(),
            trigger_if_result,
            eligibility,
            allow_multi_node_selection,
            trigger_concurrent_builds,
        }
    }

    /// Create a definition with a single default node.
    ///
    /// If `default_node` is in `allowed_nodes`, it is moved to the front of
    /// the caller's list, in place, and becomes the single default node. An
    /// absent default leaves the list untouched and is dropped, leaving no
    /// default, unless the list places no restriction on nodes.
    /// Multi-node selection and concurrent builds are always off and every
    /// node is eligible.
    ///
    /// The caller's vector is modified: do not share it with anything that
    /// expects the original order.
    #[deprecated(note = "use `NodeParameterDefinition::new` with a default node list")]
    pub fn legacy(
        name: impl Into<String>,
        description: impl Into<String>,
        default_node: &NodeName,
        allowed_nodes: &mut Vec<NodeName>,
        trigger_if_result: impl Into<TriggerIfResult>,
    ) -> Self {
        let default_nodes = match allowed_nodes.iter().position(|n| n == default_node) {
            Some(pos) => {
                let node = allowed_nodes.remove(pos);
                allowed_nodes.insert(0, node);
                vec![default_node.clone()]
            }
            None if AllowedNodes::from_list(allowed_nodes).is_all() => vec![default_node.clone()],
            None => {
                debug!(node = %default_node, "Dropping default node missing from allowed list");
                Vec::new()
            }
        };

        Self {
            name: name.into(),
            description: description.into(),
            default_nodes,
            allowed_nodes: allowed_nodes.clone(),
            trigger_if_result: trigger_if_result.into(),
            eligibility: Eligibility::All,
            allow_multi_node_selection: false,
            trigger_concurrent_builds: false,
        }
    }

    /// Create a definition from persisted configuration.
    ///
    /// Older configurations stored a single `default_value` and an
    /// `ignore_offline_nodes` flag; both are mapped onto the current fields
    /// when the current fields are absent.
    pub fn from_config(config: NodeParameterConfig, descriptor: &Descriptor) -> NodeParamResult<Self> {
        if config.name.trim().is_empty() {
            return Err(NodeParamError::Configuration(
                "node parameter name cannot be empty".to_string(),
            ));
        }

        let mut default_nodes = config.default_nodes;
        if default_nodes.is_empty() {
            if let Some(default_value) = config.default_value {
                debug!(parameter = %config.name, "Migrating single default node");
                default_nodes.push(default_value);
            }
        }

        let eligibility = match (config.eligibility, config.ignore_offline_nodes) {
            (Some(id), _) => descriptor.eligibility(&id)?,
            (None, Some(ignore_offline_nodes)) => {
                debug!(parameter = %config.name, ignore_offline_nodes, "Migrating offline-node flag");
                Eligibility::from_ignore_offline_nodes(ignore_offline_nodes)
            }
            (None, None) => descriptor.default_node_eligibility(),
        };

        Ok(Self::new(
            config.name,
            config.description,
            &default_nodes,
            &config.allowed_nodes,
            config.trigger_if_result,
            eligibility,
        ))
    }

    /// The configuration that recreates this definition.
    pub fn to_config(&self) -> NodeParameterConfig {
        NodeParameterConfig {
            name: self.name.clone(),
            description: self.description.clone(),
            default_nodes: self.default_nodes.clone(),
            allowed_nodes: self.allowed_nodes.clone(),
            trigger_if_result: self.trigger_if_result.clone(),
            eligibility: Some(self.eligibility.id().to_string()),
            default_value: None,
            ignore_offline_nodes: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_nodes(&self) -> &[NodeName] {
        &self.default_nodes
    }

    /// The allowed list exactly as configured.
    pub fn allowed_nodes(&self) -> &[NodeName] {
        &self.allowed_nodes
    }

    /// The allowed list, or "all nodes" when none is configured.
    pub fn allowed_nodes_or_all(&self) -> AllowedNodes<'_> {
        AllowedNodes::from_list(&self.allowed_nodes)
    }

    pub fn trigger_if_result(&self) -> &TriggerIfResult {
        &self.trigger_if_result
    }

    pub fn eligibility(&self) -> &Eligibility {
        &self.eligibility
    }

    pub fn allow_multi_node_selection(&self) -> bool {
        self.allow_multi_node_selection
    }

    pub fn is_trigger_concurrent_builds(&self) -> bool {
        self.trigger_concurrent_builds
    }

    /// Value for a single submitted node name or label.
    pub fn create_value(&self, submitted: &str) -> NodeParameterValue {
        NodeParameterValue::new(
            self.name.clone(),
            self.description.clone(),
            vec![submitted.to_string()],
        )
    }

    /// Value for a list of submitted node names or labels.
    pub fn create_value_multi(&self, submitted: Vec<String>) -> NodeParamResult<NodeParameterValue> {
        if !self.allow_multi_node_selection {
            warn!(
                parameter = %self.name,
                submitted = submitted.len(),
                "Rejected list submission for single-node parameter"
            );
            return Err(NodeParamError::Configuration(format!(
                "parameter '{}' does not accept multiple nodes",
                self.name
            )));
        }
        Ok(NodeParameterValue::new(
            self.name.clone(),
            self.description.clone(),
            submitted,
        ))
    }

    /// Value for a submission arriving from the trigger API.
    pub fn create_value_from_selection(
        &self,
        selection: SubmittedSelection,
    ) -> NodeParamResult<NodeParameterValue> {
        match selection {
            SubmittedSelection::Single(node) => Ok(self.create_value(&node)),
            SubmittedSelection::Multiple(nodes) => self.create_value_multi(nodes),
        }
    }

    /// Value for a JSON form submission.
    pub fn create_value_from_json(&self, json: &serde_json::Value) -> NodeParamResult<NodeParameterValue> {
        self.create_value_from_selection(SubmittedSelection::from_json(json)?)
    }

    /// Value used when a build is triggered without a selection.
    pub fn default_value(&self) -> Option<NodeParameterValue> {
        if self.default_nodes.is_empty() {
            return None;
        }
        Some(NodeParameterValue::new(
            self.name.clone(),
            self.description.clone(),
            self.default_nodes.iter().map(ToString::to_string).collect(),
        ))
    }

    /// Resolve a value to the eligible nodes it selects.
    ///
    /// Tokens are resolved against the allowed list, then each node is
    /// checked against the eligibility policy using its current state.
    pub fn resolve(
        &self,
        value: &NodeParameterValue,
        registry: &dyn NodeRegistry,
    ) -> NodeParamResult<Vec<NodeName>> {
        let resolver = NodeResolver::new(registry);
        let candidates = resolver.resolve_all(value.nodes(), self.allowed_nodes_or_all())?;

        let eligible: Vec<NodeName> = candidates
            .into_iter()
            .filter(|name| {
                let snapshot = registry.node(name);
                let eligible = self.eligibility.is_eligible(name, snapshot.as_ref());
                if !eligible {
                    debug!(
                        parameter = %self.name,
                        node = %name,
                        eligibility = %self.eligibility,
                        "Skipping ineligible node"
                    );
                }
                eligible
            })
            .collect();

        Ok(eligible)
    }

    /// Resolve a value and decide how builds are triggered for it.
    pub fn plan(
        &self,
        value: &NodeParameterValue,
        registry: &dyn NodeRegistry,
    ) -> NodeParamResult<TriggerPlan> {
        let resolved = self.resolve(value, registry)?;
        TriggerAggregator::new(self).plan(value, resolved)
    }
}

/// Persisted form of a [`NodeParameterDefinition`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParameterConfig {
    pub name: String,
    pub description: String,
    pub default_nodes: Vec<NodeName>,
    pub allowed_nodes: Vec<NodeName>,
    pub trigger_if_result: TriggerIfResult,

    /// Eligibility policy id; see [`Descriptor::eligibility`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,

    /// Single default node written by older configurations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<NodeName>,

    /// Offline-node flag written by older configurations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_offline_nodes: Option<bool>,
}
