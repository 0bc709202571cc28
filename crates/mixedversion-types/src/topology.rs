//! Topology snapshots: which nodes exist and what each one runs.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::Version;

/// Identifier of a node in the test cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Where in the lifecycle of an upgrade test a step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpgradeStage {
    /// Cluster is being provisioned; nothing is running yet.
    ClusterSetup,
    /// Cluster has just started on its initial version.
    OnStartup,
    /// Nodes are being restarted into a new binary.
    Upgrading,
    /// Every node runs the new binary; the cluster version is moving.
    Finalizing,
    /// The cluster version has reached the target release.
    AfterUpgradeFinished,
}

impl Display for UpgradeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ClusterSetup => "cluster-setup",
            Self::OnStartup => "on-startup",
            Self::Upgrading => "upgrading",
            Self::Finalizing => "finalizing",
            Self::AfterUpgradeFinished => "after-upgrade-finished",
        };
        f.write_str(name)
    }
}

/// The topology a step was generated against.
///
/// A snapshot is immutable: moving a node to a new binary produces a new
/// snapshot via [`with_node_version`](Self::with_node_version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContext {
    nodes: Vec<NodeId>,
    versions: BTreeMap<NodeId, Version>,
    from_version: Version,
    to_version: Version,
    stage: UpgradeStage,
}

impl StepContext {
    /// Creates a snapshot where every node runs `version`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NoNodes`] if `nodes` is empty.
    pub fn uniform(
        nodes: Vec<NodeId>,
        version: Version,
        stage: UpgradeStage,
    ) -> Result<Self, TopologyError> {
        let versions = nodes.iter().map(|node| (*node, version)).collect();
        Self::new(nodes, versions, version, version, stage)
    }

    /// Creates a snapshot from an explicit per-node version map.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NoNodes`] if `nodes` is empty and
    /// [`TopologyError::MissingVersion`] if a node has no entry in
    /// `versions`.
    pub fn new(
        mut nodes: Vec<NodeId>,
        versions: BTreeMap<NodeId, Version>,
        from_version: Version,
        to_version: Version,
        stage: UpgradeStage,
    ) -> Result<Self, TopologyError> {
        if nodes.is_empty() {
            return Err(TopologyError::NoNodes);
        }
        nodes.sort_unstable();
        nodes.dedup();

        if let Some(node) = nodes.iter().find(|node| !versions.contains_key(*node)) {
            return Err(TopologyError::MissingVersion(*node));
        }

        Ok(Self {
            nodes,
            versions,
            from_version,
            to_version,
            stage,
        })
    }

    /// Nodes in the cluster, in ascending id order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Version the current upgrade started from.
    pub fn from_version(&self) -> &Version {
        &self.from_version
    }

    /// Version the current upgrade is moving towards.
    pub fn to_version(&self) -> &Version {
        &self.to_version
    }

    pub fn stage(&self) -> UpgradeStage {
        self.stage
    }

    /// Returns the binary version `node` runs in this snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NodeNotFound`] if the node is not part of
    /// the snapshot.
    pub fn node_version(&self, node: NodeId) -> Result<&Version, TopologyError> {
        self.versions
            .get(&node)
            .ok_or(TopologyError::NodeNotFound(node))
    }

    /// Nodes running at least `min`.
    pub fn nodes_at_least(&self, min: &Version) -> Result<Vec<NodeId>, TopologyError> {
        let mut matching = Vec::new();
        for node in &self.nodes {
            if self.node_version(*node)?.at_least(min) {
                matching.push(*node);
            }
        }
        Ok(matching)
    }

    /// Returns `true` if at least one node runs `min` or newer.
    pub fn has_node_at_least(&self, min: &Version) -> Result<bool, TopologyError> {
        for node in &self.nodes {
            if self.node_version(*node)?.at_least(min) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Nodes running exactly `version`.
    pub fn nodes_in_version(&self, version: &Version) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| self.versions.get(*node) == Some(version))
            .copied()
            .collect()
    }

    /// Returns a snapshot in which `node` runs `version`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NodeNotFound`] if the node is not part of
    /// the snapshot.
    pub fn with_node_version(&self, node: NodeId, version: Version) -> Result<Self, TopologyError> {
        if !self.versions.contains_key(&node) {
            return Err(TopologyError::NodeNotFound(node));
        }
        let mut next = self.clone();
        next.versions.insert(node, version);
        Ok(next)
    }

    /// Returns a snapshot for a new upgrade `from -> to`.
    pub fn for_upgrade(&self, from: Version, to: Version, stage: UpgradeStage) -> Self {
        Self {
            from_version: from,
            to_version: to,
            stage,
            ..self.clone()
        }
    }

    /// Returns a snapshot with a different stage.
    pub fn with_stage(&self, stage: UpgradeStage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }
}

/// Errors raised by topology lookups.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The node is not part of the snapshot.
    #[error("node {0} not found in topology")]
    NodeNotFound(NodeId),

    /// A node was listed without a version.
    #[error("node {0} has no version assigned")]
    MissingVersion(NodeId),

    /// A snapshot needs at least one node.
    #[error("topology has no nodes")]
    NoNodes,
}
