//! # mixedversion: Randomized mutation of mixed-version upgrade test plans
//!
//! Given a linear, already valid upgrade plan, this crate injects extra
//! steps (cluster setting changes, relocated allow-upgrade steps) while
//! keeping the plan valid: settings are only touched where some node can
//! service the change, and SET/RESET sequences never contain redundant
//! consecutive operations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │ PlanBuilder  │──►│  TestPlan  │──►│   Mutator(s)  │──►│ apply_mutations  │
//! │ (base plan)  │   │ (PlanStep) │   │ (+ SimRng)    │   │ (new TestPlan)   │
//! └──────────────┘   └────────────┘   └───────────────┘   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use mixedversion::{ClusterSettingMutator, Mutator, PlanBuilder, SimRng, apply_mutations};
//!
//! let path = ["v23.1.9", "v23.2.7", "v24.1.3"]
//!     .iter()
//!     .map(|v| v.parse().unwrap())
//!     .collect();
//!
//! let mut rng = SimRng::new(12345);
//! let plan = PlanBuilder::new(path).build(&mut rng).unwrap();
//!
//! let mutator = ClusterSettingMutator::builder("kv.rangefeed.enabled", [true, false])
//!     .max_changes(5)
//!     .build()
//!     .unwrap();
//!
//! let mutations = mutator.generate(&mut rng, &plan).unwrap();
//! assert!(!mutations.is_empty());
//!
//! let mutated = apply_mutations(&plan, &mutations).unwrap();
//! assert_eq!(mutated.len(), plan.len() + mutations.len());
//! ```
//!
//! ## Key Concepts
//!
//! - **[`Step`]**: one immutable action, tagged by kind
//! - **[`PlanStep`]**: a step bound into a plan with its topology snapshot
//! - **[`Mutation`]**: insert-before, insert-after or remove, relative to an anchor
//! - **[`Mutator`]**: a deterministic producer of mutations
//! - **[`SimRng`]**: the seeded random source every decision is drawn from

mod apply;
mod builder;
mod error;
mod loader;
pub mod mutation;
pub mod mutator;
mod plan;
mod rng;
mod settings;
pub mod step;

pub use apply::{apply_mutations, mutate_plan};
pub use builder::PlanBuilder;
pub use error::{ApplyError, ConfigError, MutatorError, PlanError};
pub use loader::{CONFIG_FILE_NAME, ConfigLoader};
pub use mutation::{Mutation, MutationKind, MutationOp};
pub use mutator::{
    ClusterSettingMutator, ClusterSettingMutatorBuilder, DEFAULT_MAX_CHANGES, Mutator,
    PreserveDowngradeOptionRandomizer,
};
pub use plan::{StepLocation, TestPlan, UpgradePlan};
pub use rng::SimRng;
pub use settings::{ClusterSettingConfig, MutatorConfig};
pub use step::{PlanStep, SettingValue, Step, StepId, StepKind};

pub use mixedversion_types::{NodeId, StepContext, TopologyError, UpgradeStage, Version};
