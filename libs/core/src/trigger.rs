//! Deciding how many builds a resolved selection triggers, and submitting
//! them to the build engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::future::join_all;
use nodeparam_id::{BuildId, JobName, NodeName, TriggerId};
use tracing::{debug, info, instrument, warn};

use crate::definition::NodeParameterDefinition;
use crate::error::{NodeParamError, NodeParamResult};
use crate::value::NodeParameterValue;

/// The builds to start for one trigger request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerPlan {
    /// One build on a single node.
    Single(NodeParameterValue),

    /// One build per node, submitted together.
    Concurrent(Vec<NodeParameterValue>),

    /// One build carrying every node; the build engine walks the nodes in
    /// order, consulting the policy between them.
    Combined(NodeParameterValue),
}

impl TriggerPlan {
    /// Number of builds submitted for this plan.
    pub fn build_count(&self) -> usize {
        match self {
            Self::Single(_) | Self::Combined(_) => 1,
            Self::Concurrent(values) => values.len(),
        }
    }

    pub fn into_values(self) -> Vec<NodeParameterValue> {
        match self {
            Self::Single(value) | Self::Combined(value) => vec![value],
            Self::Concurrent(values) => values,
        }
    }
}

/// Turns resolved node sets into trigger plans for one definition.
#[derive(Debug, Clone, Copy)]
pub struct TriggerAggregator<'d> {
    definition: &'d NodeParameterDefinition,
}

impl<'d> TriggerAggregator<'d> {
    pub fn new(definition: &'d NodeParameterDefinition) -> Self {
        Self { definition }
    }

    /// Plan the builds for `resolved`, the eligible nodes of `value`.
    pub fn plan(
        &self,
        value: &NodeParameterValue,
        resolved: Vec<NodeName>,
    ) -> NodeParamResult<TriggerPlan> {
        let parameter = self.definition.name();
        let count = resolved.len();
        let nodes: Vec<String> = resolved.into_iter().map(NodeName::into_string).collect();

        match count {
            0 => {
                warn!(parameter, "No eligible node for submission");
                Err(NodeParamError::NoEligibleNode {
                    parameter: parameter.to_string(),
                })
            }
            1 => Ok(TriggerPlan::Single(value.with_nodes(nodes))),
            _ if self.definition.trigger_if_result().is_multi_select_disallowed() => {
                warn!(parameter, count, "Rejected multi-node selection");
                Err(NodeParamError::MultiSelectionNotAllowed {
                    parameter: parameter.to_string(),
                    count,
                })
            }
            _ if self.definition.is_trigger_concurrent_builds() => {
                debug!(parameter, count, "Fanning out concurrent builds");
                Ok(TriggerPlan::Concurrent(
                    nodes.into_iter().map(|node| value.with_nodes(vec![node])).collect(),
                ))
            }
            _ => {
                debug!(parameter, count, "Combining nodes into one build");
                Ok(TriggerPlan::Combined(value.with_nodes(nodes)))
            }
        }
    }
}

/// The build engine that starts builds for a job.
#[async_trait]
pub trait BuildTrigger: Send + Sync {
    /// Queue one build of `job` with `value` as its node parameter.
    async fn trigger(&self, job: &JobName, value: NodeParameterValue) -> NodeParamResult<BuildId>;
}

/// A build request seen by [`RecordingBuildTrigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBuild {
    pub job: JobName,
    pub value: NodeParameterValue,
    pub build_id: BuildId,
}

/// Build trigger that records requests instead of starting builds.
pub struct RecordingBuildTrigger {
    builds: Mutex<Vec<RecordedBuild>>,
    attempts: AtomicU64,
    fail: bool,
}

impl RecordingBuildTrigger {
    pub fn new() -> Self {
        Self {
            builds: Mutex::new(Vec::new()),
            attempts: AtomicU64::new(0),
            fail: false,
        }
    }

    /// A trigger that rejects every request.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Requests accepted so far, in arrival order.
    pub fn builds(&self) -> Vec<RecordedBuild> {
        self.builds.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls, including rejected ones.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for RecordingBuildTrigger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BuildTrigger for RecordingBuildTrigger {
    async fn trigger(&self, job: &JobName, value: NodeParameterValue) -> NodeParamResult<BuildId> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NodeParamError::Trigger(format!(
                "recording trigger configured to reject builds of '{job}'"
            )));
        }

        let build_id = BuildId::new();
        debug!(job = %job, build_id = %build_id, nodes = ?value.nodes(), "Recorded build");
        self.builds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedBuild {
                job: job.clone(),
                value,
                build_id,
            });
        Ok(build_id)
    }
}

/// Submit every build of `plan` and return their ids in plan order.
///
/// All builds are submitted before any result is inspected, so a failure
/// does not stop the other submissions. Completion is not awaited.
#[instrument(skip(plan, trigger), fields(trigger_id = %TriggerId::new(), builds = plan.build_count()))]
pub async fn dispatch(
    plan: TriggerPlan,
    job: &JobName,
    trigger: &dyn BuildTrigger,
) -> NodeParamResult<Vec<BuildId>> {
    let values = plan.into_values();
    let results = join_all(values.into_iter().map(|value| trigger.trigger(job, value))).await;

    let total = results.len();
    let mut build_ids = Vec::with_capacity(total);
    let mut first_error = None;
    for result in results {
        match result {
            Ok(build_id) => build_ids.push(build_id),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }

    if let Some(e) = first_error {
        warn!(
            job = %job,
            submitted = build_ids.len(),
            failed = total - build_ids.len(),
            error = %e,
            "Build dispatch failed"
        );
        return Err(e);
    }

    info!(job = %job, builds = build_ids.len(), "Builds dispatched");
    Ok(build_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::Eligibility;
    use crate::policy::TriggerIfResult;

    fn names(list: &[&str]) -> Vec<NodeName> {
        list.iter().map(|s| NodeName::parse(*s).unwrap()).collect()
    }

    fn definition(policy: &str) -> NodeParameterDefinition {
        NodeParameterDefinition::new("NODE", "", &[], &[], policy, Eligibility::All)
    }

    fn job() -> JobName {
        JobName::parse("deploy").unwrap()
    }

    #[test]
    fn test_plan_empty_is_error() {
        for policy in [
            TriggerIfResult::ALL_CASES,
            TriggerIfResult::MULTISELECT_DISALLOWED,
            TriggerIfResult::MULTISELECT_CONCURRENT_BUILDS,
            TriggerIfResult::ALLOW_MULTISELECT_CONCURRENT_BUILDS,
        ] {
            let def = definition(policy);
            let value = def.create_value("linux");
            let err = TriggerAggregator::new(&def).plan(&value, vec![]).unwrap_err();
            assert!(matches!(err, NodeParamError::NoEligibleNode { parameter } if parameter == "NODE"));
        }
    }

    #[test]
    fn test_plan_single_node_under_every_policy() {
        for policy in [
            TriggerIfResult::ALL_CASES,
            TriggerIfResult::MULTISELECT_DISALLOWED,
            TriggerIfResult::MULTISELECT_CONCURRENT_BUILDS,
        ] {
            let def = definition(policy);
            let value = def.create_value("linux");
            let plan = TriggerAggregator::new(&def)
                .plan(&value, names(&["a"]))
                .unwrap();
            assert_eq!(plan, TriggerPlan::Single(value.with_nodes(vec!["a".to_string()])));
        }
    }

    #[test]
    fn test_plan_disallowed_rejects_several() {
        let def = definition(TriggerIfResult::MULTISELECT_DISALLOWED);
        let value = def.create_value("linux");
        let err = TriggerAggregator::new(&def)
            .plan(&value, names(&["a", "b", "c"]))
            .unwrap_err();
        assert!(matches!(err, NodeParamError::MultiSelectionNotAllowed { count: 3, .. }));
    }

    #[test]
    fn test_plan_concurrent_one_value_per_node() {
        let def = definition(TriggerIfResult::ALLOW_MULTISELECT_CONCURRENT_BUILDS);
        let value = def.create_value("linux");
        let plan = TriggerAggregator::new(&def)
            .plan(&value, names(&["a", "b", "c"]))
            .unwrap();

        assert_eq!(plan.build_count(), 3);
        let nodes: Vec<_> = plan
            .into_values()
            .iter()
            .map(|v| v.nodes().to_vec())
            .collect();
        assert_eq!(
            nodes,
            vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn test_plan_combined_carries_all_nodes() {
        let def = definition("triggerIfResult");
        let value = def.create_value("linux");
        let plan = TriggerAggregator::new(&def)
            .plan(&value, names(&["a", "b"]))
            .unwrap();

        let TriggerPlan::Combined(combined) = plan else {
            panic!("expected a combined plan");
        };
        assert_eq!(combined.current_node(), Some("a"));
        assert_eq!(combined.next_nodes(), ["b".to_string()]);
    }

    #[tokio::test]
    async fn test_dispatch_concurrent_triggers_each_node() {
        let def = definition(TriggerIfResult::MULTISELECT_CONCURRENT_BUILDS);
        let value = def.create_value("linux");
        let plan = TriggerAggregator::new(&def)
            .plan(&value, names(&["a", "b", "c"]))
            .unwrap();

        let trigger = RecordingBuildTrigger::new();
        let ids = dispatch(plan, &job(), &trigger).await.unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(trigger.attempts(), 3);
        let builds = trigger.builds();
        assert!(builds.iter().all(|b| b.job == job() && b.value.nodes().len() == 1));
        assert_eq!(builds.iter().map(|b| b.build_id).collect::<Vec<_>>(), ids);
    }

    #[tokio::test]
    async fn test_dispatch_combined_triggers_once() {
        let def = definition(TriggerIfResult::ALL_CASES);
        let value = def.create_value("linux");
        let plan = TriggerAggregator::new(&def)
            .plan(&value, names(&["a", "b", "c"]))
            .unwrap();

        let trigger = RecordingBuildTrigger::new();
        let ids = dispatch(plan, &job(), &trigger).await.unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(trigger.builds()[0].value.nodes().len(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_failure_still_attempts_every_build() {
        let def = definition(TriggerIfResult::MULTISELECT_CONCURRENT_BUILDS);
        let value = def.create_value("linux");
        let plan = TriggerAggregator::new(&def)
            .plan(&value, names(&["a", "b"]))
            .unwrap();

        let trigger = RecordingBuildTrigger::failing();
        let err = dispatch(plan, &job(), &trigger).await.unwrap_err();

        assert!(matches!(err, NodeParamError::Trigger(_)));
        assert_eq!(trigger.attempts(), 2);
        assert!(trigger.builds().is_empty());
    }
}
