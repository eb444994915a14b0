//! Node eligibility policies.
//!
//! An eligibility policy decides whether a resolved node may receive a build
//! right now. Policies are asked once per node per resolution and see the
//! node's live state; nothing is memoized between resolutions.
//!
//! The built-in policies are closed enum variants. Plugins add their own by
//! implementing [`NodeEligibility`] and registering a factory with the
//! descriptor registry (see [`crate::descriptor`]).

use std::fmt;
use std::sync::Arc;

use nodeparam_id::NodeName;

use crate::node::NodeSnapshot;

/// Extension point for eligibility policies not built into this crate.
///
/// Implementations must be stateless (or internally synchronized): a single
/// instance is shared across concurrent resolutions.
pub trait NodeEligibility: Send + Sync + fmt::Debug {
    /// Stable identifier used in persisted configuration.
    fn id(&self) -> &str;

    /// Decide whether `name` may run a build. `node` is `None` when the
    /// registry does not know the node.
    fn is_eligible(&self, name: &NodeName, node: Option<&NodeSnapshot>) -> bool;
}

/// The eligibility policy of a node parameter.
#[derive(Debug, Clone, Default)]
pub enum Eligibility {
    /// Every node is eligible, including nodes the registry does not know.
    #[default]
    All,

    /// Only connected nodes that are not temporarily offline.
    IgnoreOffline,

    /// Every known node except those marked temporarily offline.
    IgnoreTempOffline,

    /// A policy created from a registered factory.
    Custom(Arc<dyn NodeEligibility>),
}

impl Eligibility {
    pub const ALL_ID: &'static str = "all";
    pub const IGNORE_OFFLINE_ID: &'static str = "ignore_offline";
    pub const IGNORE_TEMP_OFFLINE_ID: &'static str = "ignore_temp_offline";

    /// Identifier used in persisted configuration.
    pub fn id(&self) -> &str {
        match self {
            Self::All => Self::ALL_ID,
            Self::IgnoreOffline => Self::IGNORE_OFFLINE_ID,
            Self::IgnoreTempOffline => Self::IGNORE_TEMP_OFFLINE_ID,
            Self::Custom(policy) => policy.id(),
        }
    }

    /// Look up one of the built-in policies by id.
    pub fn builtin(id: &str) -> Option<Self> {
        match id {
            Self::ALL_ID => Some(Self::All),
            Self::IGNORE_OFFLINE_ID => Some(Self::IgnoreOffline),
            Self::IGNORE_TEMP_OFFLINE_ID => Some(Self::IgnoreTempOffline),
            _ => None,
        }
    }

    /// Map the boolean `ignore_offline_nodes` flag of older configurations.
    pub fn from_ignore_offline_nodes(ignore_offline_nodes: bool) -> Self {
        if ignore_offline_nodes {
            Self::IgnoreOffline
        } else {
            Self::All
        }
    }

    pub fn is_eligible(&self, name: &NodeName, node: Option<&NodeSnapshot>) -> bool {
        match self {
            Self::All => true,
            Self::IgnoreOffline => node.is_some_and(NodeSnapshot::is_accepting_work),
            Self::IgnoreTempOffline => node.is_some_and(|n| !n.temporarily_offline),
            Self::Custom(policy) => policy.is_eligible(name, node),
        }
    }

    /// Returns true if this is the [`Eligibility::All`] policy.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl PartialEq for Eligibility {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Eligibility {}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
