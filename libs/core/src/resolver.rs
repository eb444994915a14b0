//! Resolution of submitted tokens to concrete node names.

use nodeparam_id::NodeName;
use tracing::debug;

use crate::error::{NodeParamError, NodeParamResult};
use crate::label::LabelExpr;
use crate::node::NodeRegistry;

/// Allowed-list entry meaning "no restriction".
pub const ALL_NODES: &str = "ALL (no restriction)";

/// The set of nodes a parameter may select from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedNodes<'a> {
    /// Every node the registry knows about, evaluated lazily.
    All,

    /// The configured allowed list, in configured order.
    Listed(&'a [NodeName]),
}

impl<'a> AllowedNodes<'a> {
    /// Interpret a configured allowed list.
    ///
    /// An empty list, or one containing [`ALL_NODES`], means no restriction.
    pub fn from_list(list: &'a [NodeName]) -> Self {
        if list.is_empty() || list.iter().any(|n| n == ALL_NODES) {
            Self::All
        } else {
            Self::Listed(list)
        }
    }

    /// The configured list, if there is a restriction.
    pub fn as_list(&self) -> Option<&'a [NodeName]> {
        match self {
            Self::All => None,
            Self::Listed(list) => Some(list),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns true if `name` may be selected.
    ///
    /// `master` in an allowed list still admits the renamed built-in node.
    pub fn permits(&self, name: &NodeName) -> bool {
        match self {
            Self::All => true,
            Self::Listed(list) => list.iter().any(|allowed| {
                allowed == name
                    || (name.is_built_in() && allowed.is_legacy_controller())
            }),
        }
    }

    /// Concrete node names, asking the registry when unrestricted.
    pub fn names(&self, registry: &dyn NodeRegistry) -> Vec<NodeName> {
        match self {
            Self::All => registry.list_nodes().into_iter().map(|n| n.name).collect(),
            Self::Listed(list) => list.to_vec(),
        }
    }
}

/// Expands submitted node names and label expressions against the registry.
pub struct NodeResolver<'r> {
    registry: &'r dyn NodeRegistry,
}

impl<'r> NodeResolver<'r> {
    pub fn new(registry: &'r dyn NodeRegistry) -> Self {
        Self { registry }
    }

    /// Resolve one token to the node names it denotes within `allowed`.
    ///
    /// Lookup order: a live node with exactly this name, the legacy
    /// controller name, a label expression matching at least one allowed live
    /// node, and finally an allowed-but-absent node name. An allowed entry
    /// that is really a label therefore selects the nodes carrying it. The
    /// result is deduplicated and keeps registry order.
    pub fn resolve(&self, token: &str, allowed: AllowedNodes<'_>) -> NodeParamResult<Vec<NodeName>> {
        let token = token.trim();
        let candidates = self.candidates(token, allowed)?;

        let mut resolved: Vec<NodeName> = Vec::with_capacity(candidates.len());
        for name in candidates {
            if allowed.permits(&name) && !resolved.contains(&name) {
                resolved.push(name);
            }
        }

        debug!(token, resolved = resolved.len(), "Resolved node token");

        if resolved.is_empty() && !allowed.is_all() {
            return Err(NodeParamError::UnresolvableNode {
                token: token.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Resolve several tokens, concatenating and deduplicating the results.
    pub fn resolve_all<I, S>(&self, tokens: I, allowed: AllowedNodes<'_>) -> NodeParamResult<Vec<NodeName>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved: Vec<NodeName> = Vec::new();
        for token in tokens {
            for name in self.resolve(token.as_ref(), allowed)? {
                if !resolved.contains(&name) {
                    resolved.push(name);
                }
            }
        }
        Ok(resolved)
    }

    fn candidates(&self, token: &str, allowed: AllowedNodes<'_>) -> NodeParamResult<Vec<NodeName>> {
        let name = NodeName::parse(token)?;

        if self.registry.node(&name).is_some() {
            return Ok(vec![name]);
        }

        if name.is_legacy_controller() {
            let built_in = NodeName::built_in();
            if self.registry.node(&built_in).is_some() {
                debug!("Mapping legacy controller name to built-in node");
                return Ok(vec![built_in]);
            }
        }

        let expr = LabelExpr::parse(token);
        if let Ok(expr) = &expr {
            let matched = self.registry.nodes_by_label(expr);
            if matched.iter().any(|n| allowed.permits(n)) {
                return Ok(matched);
            }
        }

        if allowed.as_list().is_some_and(|list| list.contains(&name)) {
            return Ok(vec![name]);
        }

        expr.map(|_| Vec::new())
    }
}
