//! Name and ID definitions.

use crate::{define_id, define_name};

// =============================================================================
// Names
// =============================================================================

define_name!(
    /// Name of a worker node (agent) or of the built-in controller node.
    NodeName,
    "node name"
);

define_name!(
    /// Name of the job a node parameter belongs to.
    JobName,
    "job name"
);

impl NodeName {
    /// Reserved name of the controller node.
    pub const BUILT_IN: &'static str = "built-in";

    /// Name the controller node carried before it was renamed to `built-in`.
    pub const LEGACY_CONTROLLER: &'static str = "master";

    /// Returns the name of the built-in controller node.
    #[must_use]
    pub fn built_in() -> Self {
        Self(Self::BUILT_IN.to_string())
    }

    /// Returns true if this is the reserved controller name.
    #[must_use]
    pub fn is_built_in(&self) -> bool {
        self.0 == Self::BUILT_IN
    }

    /// Returns true if this is the pre-rename controller name.
    #[must_use]
    pub fn is_legacy_controller(&self) -> bool {
        self.0 == Self::LEGACY_CONTROLLER
    }
}

// =============================================================================
// Build engine IDs
// =============================================================================

define_id!(
    /// ID of a build queued by the build-trigger engine.
    BuildId,
    "bld"
);

define_id!(
    /// ID shared by every build queued from one trigger request.
    TriggerId,
    "trg"
);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdError;

    #[test]
    fn test_node_name_accepts_plain_names() {
        let name = NodeName::parse("agent-01").unwrap();
        assert_eq!(name.as_str(), "agent-01");
        assert_eq!(name, "agent-01");
    }

    #[test]
    fn test_node_name_rejects_empty() {
        let err = NodeName::parse("").unwrap_err();
        assert!(err.is_empty());
        assert_eq!(err.to_string(), "node name cannot be empty");
    }

    #[test]
    fn test_node_name_rejects_surrounding_whitespace() {
        let err = NodeName::parse(" agent ").unwrap_err();
        assert!(matches!(err, IdError::SurroundingWhitespace { .. }));
    }

    #[test]
    fn test_node_name_rejects_control_characters() {
        let err = NodeName::parse("agent\n2").unwrap_err();
        assert!(matches!(err, IdError::InvalidCharacter { ch: '\n', .. }));
    }

    #[test]
    fn test_node_name_allows_inner_spaces() {
        // Allowed-list tokens such as "ALL (no restriction)" go through NodeName.
        assert!(NodeName::parse("ALL (no restriction)").is_ok());
    }

    #[test]
    fn test_built_in_node() {
        let built_in = NodeName::built_in();
        assert!(built_in.is_built_in());
        assert!(!built_in.is_legacy_controller());
        assert!(NodeName::parse("master").unwrap().is_legacy_controller());
    }

    #[test]
    fn test_node_name_json_roundtrip() {
        let name = NodeName::parse("linux-agent").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"linux-agent\"");
        let parsed: NodeName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, parsed);
    }

    #[test]
    fn test_node_name_json_rejects_empty() {
        let result: Result<NodeName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_build_id_roundtrip() {
        let id = BuildId::new();
        let s = id.to_string();
        assert!(s.starts_with("bld_"));
        let parsed: BuildId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_build_id_invalid_prefix() {
        let id = TriggerId::new().to_string();
        let err = id.parse::<BuildId>().unwrap_err();
        assert!(err.is_prefix_error());
    }

    #[test]
    fn test_build_id_invalid_ulid() {
        let err = "bld_invalid".parse::<BuildId>().unwrap_err();
        assert!(matches!(err, IdError::InvalidUlid(_)));
    }

    #[test]
    fn test_id_prefixes_unique() {
        assert_ne!(BuildId::PREFIX, TriggerId::PREFIX);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_valid_names_roundtrip(s in "[A-Za-z0-9][A-Za-z0-9 ._-]{0,30}[A-Za-z0-9]") {
                let name = NodeName::parse(s.clone()).unwrap();
                prop_assert_eq!(name.as_str(), s.as_str());
                prop_assert_eq!(name.to_string().parse::<NodeName>().unwrap(), name);
            }
        }
    }
}
