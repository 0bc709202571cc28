//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use mixedversion::step::{
    PreserveDowngradeOptionStep, RestartWithNewBinaryStep, SYSTEM_VIRTUAL_CLUSTER,
    StartClusterStep,
};
use mixedversion::{
    ClusterSettingMutator, Mutation, NodeId, PlanBuilder, PlanStep, SimRng, Step, StepContext,
    StepId, TestPlan, UpgradePlan, UpgradeStage, Version,
};

/// Binary version the tests upgrade to.
pub const CURRENT_VERSION: &str = "v24.2.12";

/// Releases the tests upgrade from, oldest first.
pub const PREDECESSORS: [&str; 6] = [
    "v19.2.0", "v22.1.28", "v22.2.2", "v23.1.9", "v23.2.7", "v24.1.3",
];

pub fn v(s: &str) -> Version {
    s.parse().unwrap()
}

/// Builds a plan with `num_upgrades` upgrades ending at
/// [`CURRENT_VERSION`].
pub fn basic_plan(num_upgrades: usize, seed: u64) -> TestPlan {
    assert!((1..=PREDECESSORS.len()).contains(&num_upgrades));
    let mut path: Vec<Version> = PREDECESSORS[PREDECESSORS.len() - num_upgrades..]
        .iter()
        .map(|s| v(s))
        .collect();
    path.push(v(CURRENT_VERSION));

    PlanBuilder::new(path)
        .hook("run workload")
        .build(&mut SimRng::new(seed))
        .unwrap()
}

/// A two-node plan where only the final step sees a node on `to`:
/// pin the version, restart n1, allow the upgrade.
pub fn single_feasible_position_plan(from: Version, to: Version) -> TestPlan {
    let nodes = vec![NodeId::new(1), NodeId::new(2)];
    let setup_ctx = Arc::new(StepContext::uniform(nodes, from, UpgradeStage::OnStartup).unwrap());
    let before = Arc::new(setup_ctx.for_upgrade(from, to, UpgradeStage::Upgrading));
    let after = Arc::new(before.with_node_version(NodeId::new(1), to).unwrap());

    let setup = vec![PlanStep::new(
        StepId::new(1),
        Arc::clone(&setup_ctx),
        Step::StartCluster(StartClusterStep { version: from }),
    )];
    let steps = vec![
        PlanStep::new(
            StepId::new(2),
            Arc::clone(&before),
            Step::PreserveDowngradeOption(PreserveDowngradeOptionStep {
                virtual_cluster: SYSTEM_VIRTUAL_CLUSTER.to_string(),
                version: from,
            }),
        ),
        PlanStep::new(
            StepId::new(3),
            Arc::clone(&before),
            Step::RestartWithNewBinary(RestartWithNewBinaryStep {
                node: NodeId::new(1),
                version: to,
            }),
        ),
        PlanStep::new(StepId::new(4), after, Step::allow_upgrade()),
    ];

    TestPlan::new(setup, vec![UpgradePlan { from, to, steps }])
}

/// Checks every invariant a cluster-setting mutation sequence must hold.
pub fn check_setting_mutations(
    mutator: &ClusterSettingMutator,
    mutations: &[Mutation],
) -> Result<(), String> {
    if mutations.is_empty() || mutations.len() > mutator.max_changes() {
        return Err(format!(
            "expected 1..={} mutations, got {}",
            mutator.max_changes(),
            mutations.len()
        ));
    }

    let mut previous: Option<&Step> = None;
    for (i, mutation) in mutations.iter().enumerate() {
        check_version_requirement(mutator.min_version(), mutation)?;

        let step = mutation
            .inserted()
            .ok_or_else(|| format!("mutation {i} is not an insertion"))?;

        match step {
            Step::SetClusterSetting(set) => {
                if set.name != mutator.setting_name() || set.min_version.as_ref() != mutator.min_version() {
                    return Err(format!("mutation {i} does not carry the mutator's configuration"));
                }
                if !mutator.possible_values().contains(&set.value) {
                    return Err(format!("mutation {i} sets unknown value {}", set.value));
                }
                if let Some(Step::SetClusterSetting(prev)) = previous {
                    if prev.value == set.value {
                        return Err(format!("found two consecutive SET steps to value {}", set.value));
                    }
                }
            }
            Step::ResetClusterSetting(reset) => {
                if reset.name != mutator.setting_name() || reset.min_version.as_ref() != mutator.min_version() {
                    return Err(format!("mutation {i} does not carry the mutator's configuration"));
                }
                match previous {
                    Some(Step::SetClusterSetting(_)) => {}
                    Some(other) => {
                        return Err(format!("step prior to RESET should be SET, found {other}"));
                    }
                    None => return Err("first step cannot RESET cluster setting".to_string()),
                }
            }
            other => return Err(format!("unexpected mutation step: {other}")),
        }

        previous = Some(step);
    }
    Ok(())
}

/// At least one node in the anchor's topology can service the change.
pub fn check_version_requirement(
    min_version: Option<&Version>,
    mutation: &Mutation,
) -> Result<(), String> {
    let Some(min) = min_version else {
        return Ok(());
    };
    let ctx = &mutation.reference.context;
    let mut serviceable = Vec::new();
    for node in ctx.nodes() {
        let version = ctx.node_version(*node).map_err(|e| e.to_string())?;
        if version.at_least(min) {
            serviceable.push(*node);
        }
    }
    if serviceable.is_empty() {
        return Err(format!(
            "attempting to change setting at step {} but no node can service request",
            mutation.reference.id
        ));
    }
    Ok(())
}
