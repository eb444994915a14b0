//! Integration tests for node parameter definitions.
//!
//! Covers construction, value creation and the resolve-then-plan flow
//! against an in-memory registry holding the built-in node and one labelled
//! agent.

use nodeparam_core::{
    descriptor, dispatch, AllowedNodes, Eligibility, InMemoryNodeRegistry, NodeParamError,
    NodeParameterDefinition, NodeSnapshot, ParameterValue, RecordingBuildTrigger,
    TriggerIfResult, TriggerPlan,
};
use nodeparam_id::{JobName, NodeName};
use proptest::prelude::*;

const AGENT: &str = "agent-1";

fn name(s: &str) -> NodeName {
    NodeName::parse(s).unwrap()
}

fn names(list: &[&str]) -> Vec<NodeName> {
    list.iter().map(|s| name(s)).collect()
}

fn registry() -> InMemoryNodeRegistry {
    InMemoryNodeRegistry::new(vec![
        NodeSnapshot::online(NodeName::built_in()),
        NodeSnapshot::online(name(AGENT)).with_labels(["my-agent-label"]),
    ])
}

#[test]
#[allow(deprecated)]
fn test_legacy_constructor_reorders_allowed_nodes() {
    let mut allowed = names(&[AGENT, "non-existent-agent"]);
    assert_eq!(allowed[0], AGENT);

    let def = NodeParameterDefinition::legacy(
        "name",
        "description",
        &name("non-existent-agent"),
        &mut allowed,
        TriggerIfResult::MULTISELECT_DISALLOWED,
    );

    assert_eq!(allowed[0], "non-existent-agent");
    assert_eq!(def.name(), "name");
    assert_eq!(def.description(), "description");
    assert_eq!(def.trigger_if_result().as_str(), "multiSelectionDisallowed");
    assert!(!def.allow_multi_node_selection());
    assert!(!def.is_trigger_concurrent_builds());
    assert!(def.eligibility().is_all());
}

#[test]
fn test_canonical_constructor_keeps_caller_list() {
    let allowed = names(&[AGENT, "non-existent-agent"]);
    let def = NodeParameterDefinition::new(
        "name",
        "description",
        &names(&["built-in"]),
        &allowed,
        TriggerIfResult::MULTISELECT_CONCURRENT_BUILDS,
        Eligibility::All,
    );

    assert_eq!(allowed[0], AGENT);
    assert_eq!(def.allowed_nodes(), &allowed[..]);
    assert_eq!(
        def.trigger_if_result().as_str(),
        "allowMultiSelectionForConcurrentBuilds"
    );
    assert!(def.allow_multi_node_selection());
    assert!(def.is_trigger_concurrent_builds());
}

#[test]
fn test_create_value_from_string() {
    let def = NodeParameterDefinition::new(
        "name",
        "description",
        &[],
        &names(&["defaultValue"]),
        "triggerIfResult",
        Eligibility::All,
    );
    assert_eq!(def.trigger_if_result().as_str(), "triggerIfResult");
    assert!(def.allow_multi_node_selection());
    assert!(!def.is_trigger_concurrent_builds());

    let value = def.create_value("my-value");
    assert_eq!(value.name(), "name");
    assert_eq!(value.description(), "description");
    assert_eq!(value.nodes(), ["my-value".to_string()]);
    assert_eq!(value.value(), None);
}

#[test]
fn test_allowed_nodes_or_all_returns_list_verbatim() {
    for allowed in [names(&[AGENT]), names(&["built-in"])] {
        let def = NodeParameterDefinition::new(
            "name",
            "description",
            &[],
            &allowed,
            "triggerIfResult",
            Eligibility::All,
        );
        assert_eq!(def.allowed_nodes_or_all(), AllowedNodes::Listed(&allowed));
    }
}

#[test]
fn test_descriptor_metadata() {
    assert_eq!(descriptor().help_file(), "/plugin/nodelabelparameter/nodeparam.html");
    assert!(matches!(descriptor().default_node_eligibility(), Eligibility::All));
}

#[test]
fn test_label_selection_fans_out_per_node() {
    let registry = InMemoryNodeRegistry::new(vec![
        NodeSnapshot::online(name("linux-1")).with_labels(["linux"]),
        NodeSnapshot::online(name("linux-2")).with_labels(["linux"]),
        NodeSnapshot::online(name("linux-3")).with_labels(["linux"]),
        NodeSnapshot::online(name("win-1")).with_labels(["windows"]),
    ]);
    let def = NodeParameterDefinition::new(
        "NODE",
        "",
        &[],
        &[],
        TriggerIfResult::MULTISELECT_CONCURRENT_BUILDS,
        Eligibility::IgnoreOffline,
    );

    let plan = def.plan(&def.create_value("linux"), &registry).unwrap();
    assert_eq!(plan.build_count(), 3);

    registry.set_temporarily_offline(&name("linux-2"), true);
    let plan = def.plan(&def.create_value("linux"), &registry).unwrap();
    let nodes: Vec<String> = plan
        .into_values()
        .into_iter()
        .flat_map(|v| v.nodes().to_vec())
        .collect();
    assert_eq!(nodes, vec!["linux-1".to_string(), "linux-3".to_string()]);
}

#[test]
fn test_offline_only_node_has_no_eligible_target() {
    let registry = registry();
    registry.set_online(&name(AGENT), false);

    let def = NodeParameterDefinition::new(
        "NODE",
        "",
        &[],
        &names(&[AGENT]),
        TriggerIfResult::ALL_CASES,
        Eligibility::IgnoreOffline,
    );
    let err = def.plan(&def.create_value(AGENT), &registry).unwrap_err();
    assert!(matches!(err, NodeParamError::NoEligibleNode { .. }));
    assert!(!err.is_submission_error());
}

#[test]
fn test_selection_outside_allowed_list_is_rejected() {
    let registry = registry();
    let def = NodeParameterDefinition::new(
        "NODE",
        "",
        &[],
        &names(&[AGENT]),
        TriggerIfResult::ALL_CASES,
        Eligibility::All,
    );
    let err = def
        .plan(&def.create_value("built-in"), &registry)
        .unwrap_err();
    assert!(matches!(err, NodeParamError::UnresolvableNode { .. }));
    assert!(err.is_submission_error());
}

#[test]
fn test_default_value_plans_single_build() {
    let registry = registry();
    let def = NodeParameterDefinition::new(
        "NODE",
        "",
        &names(&["built-in"]),
        &[],
        TriggerIfResult::ALL_CASES,
        Eligibility::All,
    );
    let value = def.default_value().unwrap();
    let plan = def.plan(&value, &registry).unwrap();
    assert!(matches!(plan, TriggerPlan::Single(ref v) if v.current_node() == Some("built-in")));
}

#[tokio::test]
async fn test_resolve_plan_and_dispatch() {
    let registry = InMemoryNodeRegistry::new(vec![
        NodeSnapshot::online(name("a")).with_labels(["gpu"]),
        NodeSnapshot::online(name("b")).with_labels(["gpu"]),
        NodeSnapshot::online(name("c")).with_labels(["gpu"]),
    ]);
    let def = NodeParameterDefinition::new(
        "NODE",
        "",
        &[],
        &[],
        TriggerIfResult::ALLOW_MULTISELECT_CONCURRENT_BUILDS,
        Eligibility::All,
    );
    let plan = def.plan(&def.create_value("gpu"), &registry).unwrap();

    let trigger = RecordingBuildTrigger::new();
    let job = JobName::parse("train").unwrap();
    let ids = dispatch(plan, &job, &trigger).await.unwrap();

    assert_eq!(ids.len(), 3);
    let recorded: Vec<String> = trigger
        .builds()
        .into_iter()
        .filter_map(|b| b.value.current_node().map(str::to_string))
        .collect();
    assert_eq!(recorded.len(), 3);
    for node in ["a", "b", "c"] {
        assert!(recorded.iter().any(|r| r == node));
    }
}

fn node_names() -> impl Strategy<Value = Vec<NodeName>> {
    prop::collection::vec("[a-z][a-z0-9-]{0,8}", 0..8)
        .prop_map(|raw| raw.into_iter().map(|s| NodeName::parse(s).unwrap()).collect())
}

proptest! {
    #[test]
    #[allow(deprecated)]
    fn prop_legacy_default_moves_to_front(mut allowed in node_names(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!allowed.is_empty());
        let default = allowed[pick.index(allowed.len())].clone();
        let mut expected = allowed.clone();
        let pos = expected.iter().position(|n| n == &default).unwrap();
        let moved = expected.remove(pos);
        expected.insert(0, moved);

        let def = NodeParameterDefinition::legacy("NODE", "", &default, &mut allowed, "allCases");

        prop_assert!(!def.allow_multi_node_selection());
        prop_assert!(!def.is_trigger_concurrent_builds());
        prop_assert!(def.eligibility().is_all());
        prop_assert_eq!(allowed, expected);
    }

    #[test]
    fn prop_canonical_constructor_never_mutates(allowed in node_names(), policy in "[a-zA-Z]{0,12}") {
        let before = allowed.clone();
        let def = NodeParameterDefinition::new("NODE", "", &[], &allowed, policy, Eligibility::All);
        prop_assert_eq!(&allowed, &before);
        prop_assert_eq!(def.allowed_nodes().to_vec(), before);
    }

    #[test]
    fn prop_value_keeps_metadata_without_generic_value(
        param in "[A-Z][A-Z0-9_]{0,12}",
        description in "\\PC{0,40}",
        submitted in "\\PC{0,24}",
        policy in "[a-zA-Z]{0,12}",
    ) {
        let def = NodeParameterDefinition::new(param.as_str(), description.as_str(), &[], &[], policy, Eligibility::All);
        let value = def.create_value(&submitted);
        prop_assert_eq!(value.value(), None);
        prop_assert_eq!(value.name(), def.name());
        prop_assert_eq!(value.name(), param.as_str());
        prop_assert_eq!(value.description(), def.description());
        prop_assert_eq!(value.description(), description.as_str());
        prop_assert_eq!(value.nodes().to_vec(), vec![submitted.clone()]);
    }
}
