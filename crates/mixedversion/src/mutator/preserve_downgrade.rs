//! Moves the point at which each upgrade is allowed to finalize.

use tracing::{debug, warn};

use super::Mutator;
use crate::error::MutatorError;
use crate::step::AllowUpgradeStep;
use crate::{Mutation, PlanStep, SimRng, Step, TestPlan, UpgradePlan};

/// Replaces every allow-upgrade step with an equivalent one at a random
/// point of the same upgrade.
///
/// In the base plan the cluster is only allowed to upgrade once every node
/// runs the new binary. This mutator moves that point into the rolling
/// restart, to a step where some but not all nodes run the new binary, so
/// that finalization overlaps with the restarts. Only when the upgrade has
/// no such step (a single-node cluster) does the replacement land where
/// every node is already upgraded.
///
/// Output: all removals first, then one `InsertBefore` per removal, in the
/// same order. Appliers rely on this to batch the removals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveDowngradeOptionRandomizer;

impl PreserveDowngradeOptionRandomizer {
    pub fn new() -> Self {
        Self
    }

    /// Steps of `upgrade` the replacement for the allow-upgrade step at
    /// `index` may be inserted before.
    ///
    /// Allow-upgrade steps are never candidates: they are all removed in
    /// the same batch.
    fn replacement_anchors<'a>(
        upgrade: &'a UpgradePlan,
        index: usize,
    ) -> Result<Vec<&'a PlanStep>, MutatorError> {
        // Never later than the step that followed the original.
        let window_end = (index + 1).min(upgrade.steps.len() - 1);

        let mut mixed = Vec::new();
        let mut upgraded = Vec::new();
        for (i, candidate) in upgrade.steps[..=window_end].iter().enumerate() {
            if i == index || matches!(candidate.step, Step::AllowUpgrade(_)) {
                continue;
            }
            let on_target = candidate.context.nodes_at_least(&upgrade.to)?.len();
            if on_target == 0 {
                continue;
            }
            if on_target < candidate.context.nodes().len() {
                mixed.push(candidate);
            } else {
                upgraded.push(candidate);
            }
        }
        Ok(if mixed.is_empty() { upgraded } else { mixed })
    }
}

impl Mutator for PreserveDowngradeOptionRandomizer {
    fn name(&self) -> &str {
        "preserve_downgrade_option_randomizer"
    }

    fn generate(&self, rng: &mut SimRng, plan: &TestPlan) -> Result<Vec<Mutation>, MutatorError> {
        let mut removals = Vec::new();
        let mut insertions = Vec::new();

        for upgrade in &plan.upgrades {
            for (index, step) in upgrade.steps.iter().enumerate() {
                let Step::AllowUpgrade(existing) = &step.step else {
                    continue;
                };

                let anchors = Self::replacement_anchors(upgrade, index)?;
                let Some(anchor) = rng.choose(&anchors) else {
                    warn!(
                        step = %step.id,
                        from = %upgrade.from,
                        to = %upgrade.to,
                        "no step can host the allow-upgrade replacement, leaving it in place"
                    );
                    continue;
                };

                let replacement = Step::AllowUpgrade(AllowUpgradeStep {
                    virtual_cluster: existing.virtual_cluster.clone(),
                });
                removals.push(Mutation::remove(step.clone()));
                insertions.push(Mutation::insert_before((*anchor).clone(), replacement));
            }
        }

        debug!(
            mutator = self.name(),
            moved = removals.len(),
            "generated allow-upgrade mutations"
        );

        removals.append(&mut insertions);
        Ok(removals)
    }
}
