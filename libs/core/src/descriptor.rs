//! Process-wide descriptor of the node parameter type.
//!
//! The descriptor carries the metadata a host UI needs (display name, help
//! page) and the table of eligibility factories. It is built once at
//! startup, optionally with extra eligibility policies registered, and is
//! read-only afterwards.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::eligibility::{Eligibility, NodeEligibility};
use crate::error::{NodeParamError, NodeParamResult};

/// Help page for the node parameter.
pub const HELP_FILE: &str = "/plugin/nodelabelparameter/nodeparam.html";

/// Display name of the node parameter type.
pub const DISPLAY_NAME: &str = "Node";

/// Creates a fresh custom eligibility policy.
pub type EligibilityFactory = fn() -> Arc<dyn NodeEligibility>;

static DESCRIPTOR: OnceLock<Descriptor> = OnceLock::new();

/// Metadata and eligibility factories for node parameters.
#[derive(Debug, Clone)]
pub struct Descriptor {
    factories: BTreeMap<String, EligibilityFactory>,
}

impl Default for Descriptor {
    fn default() -> Self {
        DescriptorBuilder::default().build()
    }
}

impl Descriptor {
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    pub fn help_file(&self) -> &'static str {
        HELP_FILE
    }

    /// Policy used for definitions that do not configure one.
    pub fn default_node_eligibility(&self) -> Eligibility {
        Eligibility::All
    }

    /// Instantiate an eligibility policy by id.
    pub fn eligibility(&self, id: &str) -> NodeParamResult<Eligibility> {
        if let Some(builtin) = Eligibility::builtin(id) {
            return Ok(builtin);
        }
        self.factories
            .get(id)
            .map(|factory| Eligibility::Custom(factory()))
            .ok_or_else(|| NodeParamError::UnknownEligibility(id.to_string()))
    }

    /// Ids of every policy this descriptor can create, built-ins first.
    pub fn eligibility_ids(&self) -> Vec<&str> {
        [
            Eligibility::ALL_ID,
            Eligibility::IGNORE_OFFLINE_ID,
            Eligibility::IGNORE_TEMP_OFFLINE_ID,
        ]
        .into_iter()
        .chain(self.factories.keys().map(String::as_str))
        .collect()
    }
}

/// Builder for a [`Descriptor`] with extra eligibility policies.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    factories: BTreeMap<String, EligibilityFactory>,
}

impl DescriptorBuilder {
    /// Register a custom eligibility policy.
    ///
    /// Built-in ids cannot be overridden; such registrations are ignored.
    pub fn register_eligibility(mut self, id: impl Into<String>, factory: EligibilityFactory) -> Self {
        let id = id.into();
        if Eligibility::builtin(&id).is_some() {
            warn!(id = %id, "Ignoring registration that shadows a built-in eligibility");
            return self;
        }
        self.factories.insert(id, factory);
        self
    }

    pub fn build(self) -> Descriptor {
        Descriptor {
            factories: self.factories,
        }
    }

    /// Install the descriptor process-wide.
    ///
    /// Fails, returning the rejected descriptor, if one was already installed
    /// or [`descriptor`] was already called.
    pub fn install(self) -> Result<&'static Descriptor, Descriptor> {
        let built = self.build();
        let custom = built.factories.len();
        DESCRIPTOR.set(built)?;
        info!(custom_eligibilities = custom, "Node parameter descriptor installed");
        Ok(descriptor())
    }
}

/// The process-wide descriptor, installing the default one on first use.
pub fn descriptor() -> &'static Descriptor {
    DESCRIPTOR.get_or_init(Descriptor::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSnapshot;
    use nodeparam_id::NodeName;

    #[derive(Debug)]
    struct NeverEligible;

    impl NodeEligibility for NeverEligible {
        fn id(&self) -> &str {
            "never"
        }

        fn is_eligible(&self, _name: &NodeName, _node: Option<&NodeSnapshot>) -> bool {
            false
        }
    }

    fn never() -> Arc<dyn NodeEligibility> {
        Arc::new(NeverEligible)
    }

    #[test]
    fn test_help_file_is_constant() {
        assert_eq!(Descriptor::default().help_file(), "/plugin/nodelabelparameter/nodeparam.html");
        assert_eq!(descriptor().help_file(), Descriptor::default().help_file());
    }

    #[test]
    fn test_default_node_eligibility_is_all() {
        let eligibility = Descriptor::default().default_node_eligibility();
        assert!(eligibility.is_all());
        assert_eq!(eligibility.id(), Eligibility::ALL_ID);
    }

    #[test]
    fn test_registered_factory() {
        let descriptor = Descriptor::builder()
            .register_eligibility("never", never)
            .build();

        let policy = descriptor.eligibility("never").unwrap();
        assert_eq!(policy.id(), "never");
        let name = NodeName::built_in();
        assert!(!policy.is_eligible(&name, None));

        assert_eq!(
            descriptor.eligibility_ids(),
            vec!["all", "ignore_offline", "ignore_temp_offline", "never"]
        );
    }

    #[test]
    fn test_builtin_ids_cannot_be_shadowed() {
        let descriptor = Descriptor::builder()
            .register_eligibility(Eligibility::ALL_ID, never)
            .build();
        assert!(descriptor.eligibility("all").unwrap().is_all());
    }

    #[test]
    fn test_unknown_eligibility() {
        let err = Descriptor::default().eligibility("nope").unwrap_err();
        assert!(matches!(err, NodeParamError::UnknownEligibility(id) if id == "nope"));
    }
}
