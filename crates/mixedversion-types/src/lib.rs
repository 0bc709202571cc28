//! # mixedversion-types: Shared types for mixed-version upgrade plans
//!
//! This crate holds the read-only view of the cluster that upgrade plans
//! are generated against:
//! - Release versions ([`Version`])
//! - Node identity ([`NodeId`])
//! - Upgrade lifecycle ([`UpgradeStage`])
//! - Topology snapshots ([`StepContext`])
//!
//! # Example
//!
//! ```
//! use mixedversion_types::{NodeId, StepContext, UpgradeStage, Version};
//!
//! let old: Version = "v23.2.7".parse().unwrap();
//! let new: Version = "v24.1.3".parse().unwrap();
//!
//! let ctx = StepContext::uniform(vec![NodeId::new(1), NodeId::new(2)], old, UpgradeStage::OnStartup)
//!     .unwrap()
//!     .with_node_version(NodeId::new(2), new)
//!     .unwrap();
//!
//! assert!(ctx.has_node_at_least(&new).unwrap());
//! assert_eq!(ctx.nodes_at_least(&new).unwrap(), vec![NodeId::new(2)]);
//! ```

mod topology;
mod version;

pub use topology::{NodeId, StepContext, TopologyError, UpgradeStage};
pub use version::{Version, VersionParseError};
