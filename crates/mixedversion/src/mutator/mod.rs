//! Mutators: randomized producers of plan edits.
//!
//! ## Architecture
//!
//! ```text
//! PlanBuilder → TestPlan → [Mutator] → Vec<Mutation> → apply_mutations → TestPlan
//!                              ↑
//!                           SimRng
//! ```
//!
//! A mutator never edits the plan it is given. It reads the plan, draws
//! from the random source and describes the edits it wants; applying them
//! is a separate step. Given the same seed and the same plan, a mutator
//! returns the same mutations.

mod cluster_setting;
mod preserve_downgrade;

pub use cluster_setting::{
    ClusterSettingMutator, ClusterSettingMutatorBuilder, DEFAULT_MAX_CHANGES,
};
pub use preserve_downgrade::PreserveDowngradeOptionRandomizer;

use crate::error::MutatorError;
use crate::{Mutation, SimRng, TestPlan};

/// Produces an ordered list of edits against a base plan.
pub trait Mutator: std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Generates mutations for `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`MutatorError::Topology`] if a step context references a
    /// node it has no version for.
    fn generate(&self, rng: &mut SimRng, plan: &TestPlan) -> Result<Vec<Mutation>, MutatorError>;
}
