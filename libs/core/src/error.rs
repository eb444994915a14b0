//! Error types for node resolution and build triggering.

use nodeparam_id::IdError;
use thiserror::Error;

/// Result type for node parameter operations.
pub type NodeParamResult<T> = Result<T, NodeParamError>;

/// Errors surfaced to the caller that triggered a build.
///
/// None of these are retried here; node state can change between attempts,
/// so retrying is left to the build engine.
#[derive(Debug, Error)]
pub enum NodeParamError {
    /// The submission does not match the declared capability of the
    /// parameter (for example a list submitted to a single-node parameter).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Resolution and eligibility filtering left no node to run on.
    #[error("no eligible node to run '{parameter}' on")]
    NoEligibleNode { parameter: String },

    /// More than one node was resolved but the policy forbids fan-out.
    #[error("parameter '{parameter}' resolved to {count} nodes but multi-node selection is disallowed")]
    MultiSelectionNotAllowed { parameter: String, count: usize },

    /// A submitted token matched no node in the allowed set.
    #[error("'{token}' does not match any allowed node")]
    UnresolvableNode { token: String },

    /// A submitted token could not be parsed as a label expression.
    #[error("invalid label expression '{expression}': {reason}")]
    InvalidLabelExpression { expression: String, reason: String },

    /// A node or job name failed validation.
    #[error(transparent)]
    InvalidName(#[from] IdError),

    /// No eligibility policy is registered under this id.
    #[error("unknown node eligibility '{0}'")]
    UnknownEligibility(String),

    /// The build-trigger engine rejected a request.
    #[error("build trigger failed: {0}")]
    Trigger(String),
}

impl NodeParamError {
    /// Returns true for errors that came from the submitted selection rather
    /// than from live node state.
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::UnresolvableNode { .. }
                | Self::InvalidLabelExpression { .. }
                | Self::InvalidName(_)
        )
    }
}
