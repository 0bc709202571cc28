//! Builds realistic base plans for a given upgrade path.
//!
//! The builder produces the canonical shape of a rolling upgrade: pin the
//! cluster version, restart every node into the new binary in random
//! order, let the cluster version move, and wait for it to settle. It is
//! the fixture the mutators are exercised against; deciding the content
//! of real plans is left to the test planner.

use std::sync::Arc;
use std::time::Duration;

use mixedversion_types::{NodeId, StepContext, UpgradeStage, Version};
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::step::{
    PreserveDowngradeOptionStep, RestartWithNewBinaryStep, RunHookStep, SYSTEM_VIRTUAL_CLUSTER,
    StartClusterStep, WaitForStableClusterVersionStep, WaitStep,
};
use crate::{PlanStep, SimRng, Step, StepId, TestPlan, UpgradePlan};

const DEFAULT_NODES: usize = 4;

/// Probability of a wait step between two consecutive restarts.
const WAIT_PROBABILITY: f64 = 0.5;
const MIN_WAIT_SECS: usize = 30;
const MAX_WAIT_SECS: usize = 300;

/// Builder for [`TestPlan`]s following a fixed upgrade path.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    path: Vec<Version>,
    nodes: usize,
    hooks: Vec<String>,
}

impl PlanBuilder {
    /// `path[0]` is the version the cluster starts on; every following
    /// entry is one upgrade.
    pub fn new(path: Vec<Version>) -> Self {
        Self {
            path,
            nodes: DEFAULT_NODES,
            hooks: Vec::new(),
        }
    }

    /// Sets the number of nodes in the cluster.
    pub fn nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes;
        self
    }

    /// Adds a hook that runs once per upgrade while the cluster is in a
    /// mixed-binary state.
    pub fn hook(mut self, name: impl Into<String>) -> Self {
        self.hooks.push(name.into());
        self
    }

    /// Builds the plan, drawing restart order and waits from `rng`.
    pub fn build(&self, rng: &mut SimRng) -> Result<TestPlan> {
        let node_count = match u32::try_from(self.nodes) {
            Ok(0) | Err(_) => return Err(PlanError::InvalidNodeCount(self.nodes)),
            Ok(count) => count,
        };
        if self.path.len() < 2 {
            return Err(PlanError::PathTooShort(self.path.len()));
        }
        if let Some(pair) = self.path.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PlanError::NonIncreasingPath {
                from: pair[0],
                to: pair[1],
            });
        }

        let mut last_id = 0u64;
        let mut next_id = move || {
            last_id += 1;
            StepId::new(last_id)
        };

        let node_ids: Vec<NodeId> = (1..=node_count).map(NodeId::new).collect();
        let initial = self.path[0];

        let setup_ctx = Arc::new(StepContext::uniform(
            node_ids.clone(),
            initial,
            UpgradeStage::ClusterSetup,
        )?);
        let startup_ctx = Arc::new(setup_ctx.with_stage(UpgradeStage::OnStartup));
        let setup = vec![
            PlanStep::new(
                next_id(),
                setup_ctx,
                Step::StartCluster(StartClusterStep { version: initial }),
            ),
            PlanStep::new(
                next_id(),
                Arc::clone(&startup_ctx),
                Step::WaitForStableClusterVersion(WaitForStableClusterVersionStep {
                    version: initial,
                }),
            ),
        ];

        let mut current = startup_ctx;
        let mut upgrades = Vec::with_capacity(self.path.len() - 1);
        for pair in self.path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let (upgrade, last_ctx) =
                self.build_upgrade(rng, &current, &node_ids, from, to, &mut next_id)?;
            upgrades.push(upgrade);
            current = Arc::new(last_ctx.with_stage(UpgradeStage::AfterUpgradeFinished));
        }

        let plan = TestPlan::new(setup, upgrades);
        debug!(
            upgrades = plan.upgrades.len(),
            steps = plan.len(),
            nodes = self.nodes,
            "built base plan"
        );
        Ok(plan)
    }

    fn build_upgrade(
        &self,
        rng: &mut SimRng,
        previous: &StepContext,
        node_ids: &[NodeId],
        from: Version,
        to: Version,
        next_id: &mut impl FnMut() -> StepId,
    ) -> Result<(UpgradePlan, Arc<StepContext>)> {
        let mut ctx = Arc::new(previous.for_upgrade(from, to, UpgradeStage::Upgrading));
        let mut steps = vec![PlanStep::new(
            next_id(),
            Arc::clone(&ctx),
            Step::PreserveDowngradeOption(PreserveDowngradeOptionStep {
                virtual_cluster: SYSTEM_VIRTUAL_CLUSTER.to_string(),
                version: from,
            }),
        )];

        let mut order = node_ids.to_vec();
        rng.shuffle(&mut order);

        // Each hook runs right after one of the restarts.
        let hook_slots: Vec<usize> = self
            .hooks
            .iter()
            .map(|_| rng.next_usize(order.len()))
            .collect();

        for (i, node) in order.iter().enumerate() {
            steps.push(PlanStep::new(
                next_id(),
                Arc::clone(&ctx),
                Step::RestartWithNewBinary(RestartWithNewBinaryStep {
                    node: *node,
                    version: to,
                }),
            ));
            ctx = Arc::new(ctx.with_node_version(*node, to)?);

            for (hook, slot) in self.hooks.iter().zip(&hook_slots) {
                if *slot == i {
                    steps.push(PlanStep::new(
                        next_id(),
                        Arc::clone(&ctx),
                        Step::RunHook(RunHookStep { name: hook.clone() }),
                    ));
                }
            }

            if i + 1 < order.len() && rng.next_bool_with_probability(WAIT_PROBABILITY) {
                let secs = rng.next_usize_inclusive(MIN_WAIT_SECS, MAX_WAIT_SECS);
                steps.push(PlanStep::new(
                    next_id(),
                    Arc::clone(&ctx),
                    Step::Wait(WaitStep {
                        duration: Duration::from_secs(secs as u64),
                    }),
                ));
            }
        }

        let finalizing = Arc::new(ctx.with_stage(UpgradeStage::Finalizing));
        steps.push(PlanStep::new(
            next_id(),
            Arc::clone(&finalizing),
            Step::allow_upgrade(),
        ));
        steps.push(PlanStep::new(
            next_id(),
            Arc::clone(&finalizing),
            Step::WaitForStableClusterVersion(WaitForStableClusterVersionStep { version: to }),
        ));

        Ok((UpgradePlan { from, to, steps }, finalizing))
    }
}
