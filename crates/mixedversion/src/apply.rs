//! Applies mutations to a plan.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ApplyError;
use crate::mutator::Mutator;
use crate::{Mutation, MutationKind, PlanStep, SimRng, StepId, TestPlan};

/// Returns a copy of `plan` with `mutations` applied.
///
/// Removals are applied first, then insertions in the order given.
/// Inserted steps get fresh ids and run against the topology of their
/// anchor. Several insertions after the same anchor keep their relative
/// order.
///
/// # Errors
///
/// Returns [`ApplyError::StepNotFound`] if an anchor is not in the plan
/// (including anchors removed by the same batch).
pub fn apply_mutations(plan: &TestPlan, mutations: &[Mutation]) -> Result<TestPlan, ApplyError> {
    let mut plan = plan.clone();

    for mutation in mutations {
        if let MutationKind::Remove = mutation.kind {
            let id = mutation.reference.id;
            let location = plan.find(id).ok_or(ApplyError::StepNotFound(id))?;
            let (steps, index) = plan.section_mut(location);
            steps.remove(index);
        }
    }

    // Last step inserted after each anchor, so that later insertions land
    // behind earlier ones.
    let mut inserted_after: HashMap<StepId, StepId> = HashMap::new();

    for mutation in mutations {
        let anchor = mutation.reference.id;
        let (step, after) = match &mutation.kind {
            MutationKind::InsertBefore(step) => (step, false),
            MutationKind::InsertAfter(step) => (step, true),
            MutationKind::Remove => continue,
        };

        let location = plan.find(anchor).ok_or(ApplyError::StepNotFound(anchor))?;
        let position_of = if after {
            inserted_after.get(&anchor).copied().unwrap_or(anchor)
        } else {
            anchor
        };
        let target = plan.find(position_of).unwrap_or(location);

        let id = plan.allocate_id();
        let new_step = PlanStep::new(id, Arc::clone(&mutation.reference.context), step.clone());
        let (steps, index) = plan.section_mut(target);
        if after {
            steps.insert(index + 1, new_step);
            inserted_after.insert(anchor, id);
        } else {
            steps.insert(index, new_step);
        }
    }

    debug!(applied = mutations.len(), steps = plan.len(), "applied mutations");
    Ok(plan)
}

/// Runs each mutator against the current plan and applies its output
/// before the next mutator runs.
///
/// Every mutator draws from its own fork of `rng`, so adding a mutator
/// does not change what the ones before it generate.
pub fn mutate_plan(
    plan: &TestPlan,
    mutators: &[Box<dyn Mutator>],
    rng: &mut SimRng,
) -> Result<TestPlan, ApplyError> {
    let mut current = plan.clone();
    for mutator in mutators {
        let mut mutator_rng = rng.fork();
        let mutations = mutator
            .generate(&mut mutator_rng, &current)
            .map_err(|source| ApplyError::Mutator {
                name: mutator.name().to_string(),
                source,
            })?;
        info!(
            mutator = mutator.name(),
            mutations = mutations.len(),
            "applying mutator"
        );
        current = apply_mutations(&current, &mutations)?;
    }
    Ok(current)
}
