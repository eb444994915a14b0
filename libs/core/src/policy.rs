//! Trigger-result policy of a node parameter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a parameter behaves when a selection resolves to several nodes.
///
/// The persisted form is the string returned by [`TriggerIfResult::as_str`].
/// Unknown strings are kept verbatim and behave like [`TriggerIfResult::AllCases`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TriggerIfResult {
    /// One combined build carries every node; follow-ups run whatever the
    /// previous result was.
    #[default]
    AllCases,

    /// Combined build; follow-ups run only after a successful build.
    Success,

    /// Combined build; follow-ups run after a successful or unstable build.
    Unstable,

    /// Selecting more than one node is rejected.
    MultiSelectDisallowed,

    /// One concurrent build per node.
    MultiSelectConcurrentBuilds,

    /// Alternate spelling of concurrent builds written by some older
    /// configuration pages; behaves exactly like `MultiSelectConcurrentBuilds`.
    AllowMultiSelectConcurrentBuilds,

    /// A value this crate does not know about.
    Other(String),
}

impl TriggerIfResult {
    pub const ALL_CASES: &'static str = "allCases";
    pub const SUCCESS: &'static str = "success";
    pub const UNSTABLE: &'static str = "unstable";
    pub const MULTISELECT_DISALLOWED: &'static str = "multiSelectionDisallowed";
    pub const MULTISELECT_CONCURRENT_BUILDS: &'static str = "allowMultiSelectionForConcurrentBuilds";
    pub const ALLOW_MULTISELECT_CONCURRENT_BUILDS: &'static str =
        "allowMultiNodeSelectionConcurrentBuilds";

    pub fn parse(s: &str) -> Self {
        match s {
            Self::ALL_CASES => Self::AllCases,
            Self::SUCCESS => Self::Success,
            Self::UNSTABLE => Self::Unstable,
            Self::MULTISELECT_DISALLOWED => Self::MultiSelectDisallowed,
            Self::MULTISELECT_CONCURRENT_BUILDS => Self::MultiSelectConcurrentBuilds,
            Self::ALLOW_MULTISELECT_CONCURRENT_BUILDS => Self::AllowMultiSelectConcurrentBuilds,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AllCases => Self::ALL_CASES,
            Self::Success => Self::SUCCESS,
            Self::Unstable => Self::UNSTABLE,
            Self::MultiSelectDisallowed => Self::MULTISELECT_DISALLOWED,
            Self::MultiSelectConcurrentBuilds => Self::MULTISELECT_CONCURRENT_BUILDS,
            Self::AllowMultiSelectConcurrentBuilds => Self::ALLOW_MULTISELECT_CONCURRENT_BUILDS,
            Self::Other(s) => s,
        }
    }

    /// Returns true if several resolved nodes fan out into concurrent builds.
    pub fn is_concurrent(&self) -> bool {
        matches!(
            self,
            Self::MultiSelectConcurrentBuilds | Self::AllowMultiSelectConcurrentBuilds
        )
    }

    /// Returns true if several resolved nodes are rejected.
    pub fn is_multi_select_disallowed(&self) -> bool {
        matches!(self, Self::MultiSelectDisallowed)
    }

    /// Decide whether the next node of a combined build runs after the
    /// previous build finished with `previous`.
    pub fn permits_next(&self, previous: BuildResult) -> bool {
        match self {
            Self::Success => previous == BuildResult::Success,
            Self::Unstable => previous.is_better_or_equal(BuildResult::Unstable),
            _ => true,
        }
    }
}

impl From<&str> for TriggerIfResult {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for TriggerIfResult {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl fmt::Display for TriggerIfResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TriggerIfResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TriggerIfResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Outcome of a finished build, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    /// Returns true if `self` is at least as good as `other`.
    pub fn is_better_or_equal(self, other: BuildResult) -> bool {
        self <= other
    }
}
