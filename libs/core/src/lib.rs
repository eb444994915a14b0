//! # nodeparam-core
//!
//! Node selection for build parameters.
//!
//! A job declares a [`NodeParameterDefinition`]: which nodes may be picked,
//! which are picked by default, which nodes count as eligible right now, and
//! what happens when a selection covers several nodes. For each trigger the
//! pipeline is:
//!
//! ```text
//! submission -> create_value -> NodeResolver -> Eligibility -> TriggerAggregator -> dispatch
//! ```
//!
//! - [`NodeResolver`] expands node names and label expressions against the
//!   [`NodeRegistry`], restricted to the allowed list.
//! - [`Eligibility`] drops nodes that cannot take a build given their live
//!   state.
//! - [`TriggerAggregator`] turns what remains into a [`TriggerPlan`]: one
//!   build, one build per node, or an error.
//! - [`dispatch`] submits the plan to a [`BuildTrigger`].
//!
//! Definitions are immutable and can be shared between threads; values are
//! created per trigger.

pub mod definition;
pub mod descriptor;
pub mod eligibility;
pub mod error;
pub mod label;
pub mod node;
pub mod policy;
pub mod resolver;
pub mod trigger;
pub mod value;

pub use definition::{NodeParameterConfig, NodeParameterDefinition};
pub use descriptor::{descriptor, Descriptor, DescriptorBuilder, EligibilityFactory, HELP_FILE};
pub use eligibility::{Eligibility, NodeEligibility};
pub use error::{NodeParamError, NodeParamResult};
pub use label::LabelExpr;
pub use node::{InMemoryNodeRegistry, NodeRegistry, NodeSnapshot};
pub use policy::{BuildResult, TriggerIfResult};
pub use resolver::{AllowedNodes, NodeResolver, ALL_NODES};
pub use trigger::{
    dispatch, BuildTrigger, RecordedBuild, RecordingBuildTrigger, TriggerAggregator, TriggerPlan,
};
pub use value::{NodeParameterValue, ParameterValue, SubmittedSelection};
