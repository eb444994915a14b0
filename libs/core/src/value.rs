//! Parameter values created for a single build trigger.

use serde::{Deserialize, Serialize};

use crate::error::{NodeParamError, NodeParamResult};

/// Accessors every build parameter value exposes to the build engine.
pub trait ParameterValue {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// The generic string value of the parameter, if any.
    fn value(&self) -> Option<&str>;
}

/// The value of a node parameter for one build.
///
/// The node selection lives in [`NodeParameterValue::nodes`]. The generic
/// [`ParameterValue::value`] accessor reads the label field shared with label
/// parameters, which node parameters never fill in, so it returns `None`.
/// Existing consumers may depend on that, so it stays as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeParameterValue {
    name: String,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    nodes: Vec<String>,
}

impl NodeParameterValue {
    pub fn new(name: impl Into<String>, description: impl Into<String>, nodes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            label: None,
            nodes,
        }
    }

    /// The selected nodes, in submission (or resolution) order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// The node this build runs on.
    pub fn current_node(&self) -> Option<&str> {
        self.nodes.first().map(String::as_str)
    }

    /// Nodes still to run after the current one in a combined build.
    pub fn next_nodes(&self) -> &[String] {
        self.nodes.get(1..).unwrap_or(&[])
    }

    /// A copy of this value narrowed to a different node selection.
    pub fn with_nodes(&self, nodes: Vec<String>) -> Self {
        Self {
            nodes,
            ..self.clone()
        }
    }
}

impl ParameterValue for NodeParameterValue {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn value(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// A node selection as submitted by the trigger API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedSelection {
    Single(String),
    Multiple(Vec<String>),
}

impl SubmittedSelection {
    /// Interpret a submitted form value.
    ///
    /// Accepts a string, an array of strings, or an object carrying either
    /// under `"value"` (the shape posted by the build form).
    pub fn from_json(json: &serde_json::Value) -> NodeParamResult<Self> {
        match json {
            serde_json::Value::String(s) => Ok(Self::Single(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s.clone()),
                    other => Err(NodeParamError::Configuration(format!(
                        "node selection entries must be strings, got {other}"
                    ))),
                })
                .collect::<NodeParamResult<Vec<_>>>()
                .map(Self::Multiple),
            serde_json::Value::Object(map) => match map.get("value") {
                Some(inner) if !inner.is_object() => Self::from_json(inner),
                _ => Err(NodeParamError::Configuration(
                    "submitted object has no 'value' entry".to_string(),
                )),
            },
            other => Err(NodeParamError::Configuration(format!(
                "unsupported node selection {other}"
            ))),
        }
    }
}
