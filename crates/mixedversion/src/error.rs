//! Error types for plan construction, mutation and configuration.

use mixedversion_types::{TopologyError, Version};
use thiserror::Error;

use crate::StepId;

/// Errors raised while building a base plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// An upgrade path needs a starting version and at least one target.
    #[error("upgrade path needs at least two versions, got {0}")]
    PathTooShort(usize),

    /// Every upgrade must move to a newer release.
    #[error("upgrade path is not increasing: {from} -> {to}")]
    NonIncreasingPath { from: Version, to: Version },

    /// Invalid node count.
    #[error("invalid node count: {0} (must be between 1 and 4294967295)")]
    InvalidNodeCount(usize),

    /// Topology snapshot could not be built.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Mutator construction errors. These are fatal and surfaced immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The cluster setting name is empty.
    #[error("cluster setting name must not be empty")]
    EmptySettingName,

    /// No values to choose from.
    #[error("cluster setting {0:?} has no possible values")]
    NoPossibleValues(String),

    /// `max_changes` must be positive.
    #[error("cluster setting {0:?}: max_changes must be >= 1")]
    InvalidMaxChanges(String),
}

/// Errors a mutator can surface while generating mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutatorError {
    /// A step context referenced a node it does not know about.
    #[error("topology lookup failed: {0}")]
    Topology(#[from] TopologyError),
}

/// Errors raised while applying mutations to a plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// The anchor step of a mutation is not in the plan.
    #[error("anchor step {0} not found in plan")]
    StepNotFound(StepId),

    /// A mutator failed before its output could be applied.
    #[error("mutator {name} failed: {source}")]
    Mutator {
        name: String,
        #[source]
        source: MutatorError,
    },
}

/// Result type for plan building.
pub type Result<T, E = PlanError> = std::result::Result<T, E>;
