//! Randomized SET/RESET sequences for one cluster setting.
//!
//! The sequence is generated by walking a small state machine, one
//! transition per chosen insertion point:
//!
//! ```text
//!            SET v                 SET v' (v' != v)
//!  Start ───────────► AfterSet(v) ◄──────────────┐
//!                      │      ▲   ───────────────┘
//!                RESET │      │ SET v
//!                      ▼      │
//!                    AfterReset
//! ```
//!
//! Every emitted sequence therefore starts with a SET, never repeats a SET
//! to the same value back to back, and never RESETs twice in a row.

use mixedversion_types::Version;
use tracing::{debug, warn};

use super::Mutator;
use crate::error::{ConfigError, MutatorError};
use crate::step::{ResetClusterSettingStep, SetClusterSettingStep};
use crate::{Mutation, PlanStep, SettingValue, SimRng, Step, TestPlan};

/// Upper bound on changes when none is configured.
pub const DEFAULT_MAX_CHANGES: usize = 3;

/// Where the SET/RESET walk currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingState {
    Start,
    /// Last change set the value at this index of `possible_values`.
    AfterSet(usize),
    AfterReset,
}

/// Injects changes to a single cluster setting at random points of the
/// upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSettingMutator {
    name: String,
    possible_values: Vec<SettingValue>,
    min_version: Option<Version>,
    max_changes: usize,
}

/// Builder for [`ClusterSettingMutator`].
#[derive(Debug, Clone)]
pub struct ClusterSettingMutatorBuilder {
    name: String,
    possible_values: Vec<SettingValue>,
    min_version: Option<Version>,
    max_changes: usize,
}

impl ClusterSettingMutatorBuilder {
    /// Only change the setting at points where at least one node runs
    /// `version` or newer.
    pub fn minimum_version(mut self, version: Version) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Inclusive upper bound on the number of changes generated.
    pub fn max_changes(mut self, max_changes: usize) -> Self {
        self.max_changes = max_changes;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Fails for an empty setting name, an empty value list, or
    /// `max_changes == 0`.
    pub fn build(self) -> Result<ClusterSettingMutator, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptySettingName);
        }
        if self.possible_values.is_empty() {
            return Err(ConfigError::NoPossibleValues(self.name));
        }
        if self.max_changes == 0 {
            return Err(ConfigError::InvalidMaxChanges(self.name));
        }

        // Duplicates would let two consecutive SETs pick the same value.
        let mut possible_values = Vec::with_capacity(self.possible_values.len());
        for value in self.possible_values {
            if !possible_values.contains(&value) {
                possible_values.push(value);
            }
        }

        Ok(ClusterSettingMutator {
            name: self.name,
            possible_values,
            min_version: self.min_version,
            max_changes: self.max_changes,
        })
    }
}

impl ClusterSettingMutator {
    /// Starts building a mutator for `name` that picks values from
    /// `possible_values`.
    pub fn builder(
        name: impl Into<String>,
        possible_values: impl IntoIterator<Item = impl Into<SettingValue>>,
    ) -> ClusterSettingMutatorBuilder {
        ClusterSettingMutatorBuilder {
            name: name.into(),
            possible_values: possible_values.into_iter().map(Into::into).collect(),
            min_version: None,
            max_changes: DEFAULT_MAX_CHANGES,
        }
    }

    pub fn setting_name(&self) -> &str {
        &self.name
    }

    pub fn possible_values(&self) -> &[SettingValue] {
        &self.possible_values
    }

    pub fn min_version(&self) -> Option<&Version> {
        self.min_version.as_ref()
    }

    pub fn max_changes(&self) -> usize {
        self.max_changes
    }

    /// Steps the setting may be changed next to: every step of every
    /// upgrade whose topology can service the change.
    fn candidate_anchors<'a>(&self, plan: &'a TestPlan) -> Result<Vec<&'a PlanStep>, MutatorError> {
        let mut anchors = Vec::new();
        for step in plan.upgrades.iter().flat_map(|u| u.steps.iter()) {
            let feasible = match &self.min_version {
                Some(min) => step.context.has_node_at_least(min)?,
                None => true,
            };
            if feasible {
                anchors.push(step);
            }
        }
        Ok(anchors)
    }

    /// Takes one transition from `state`, returning the new state and the
    /// step implementing it. `None` means no legal transition exists.
    fn transition(&self, rng: &mut SimRng, state: SettingState) -> Option<(SettingState, Step)> {
        let can_reset = matches!(state, SettingState::AfterSet(_));
        let can_set = match state {
            SettingState::AfterSet(_) => self.possible_values.len() > 1,
            SettingState::Start | SettingState::AfterReset => true,
        };

        let reset = match (can_set, can_reset) {
            (false, false) => return None,
            (true, false) => false,
            (false, true) => true,
            (true, true) => rng.next_bool(),
        };

        if reset {
            let step = Step::ResetClusterSetting(ResetClusterSettingStep {
                name: self.name.clone(),
                min_version: self.min_version,
            });
            return Some((SettingState::AfterReset, step));
        }

        let index = match state {
            // Draw from every value except the current one.
            SettingState::AfterSet(current) => {
                let drawn = rng.next_usize(self.possible_values.len() - 1);
                if drawn >= current { drawn + 1 } else { drawn }
            }
            SettingState::Start | SettingState::AfterReset => {
                rng.next_usize(self.possible_values.len())
            }
        };
        let step = Step::SetClusterSetting(SetClusterSettingStep {
            name: self.name.clone(),
            value: self.possible_values[index].clone(),
            min_version: self.min_version,
        });
        Some((SettingState::AfterSet(index), step))
    }
}

impl Mutator for ClusterSettingMutator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, rng: &mut SimRng, plan: &TestPlan) -> Result<Vec<Mutation>, MutatorError> {
        let anchors = self.candidate_anchors(plan)?;
        let wanted = rng.next_usize_inclusive(1, self.max_changes);
        let slots = rng.sample_indices(anchors.len(), wanted);

        if slots.len() < wanted {
            debug!(
                setting = %self.name,
                wanted,
                feasible = anchors.len(),
                "fewer feasible positions than requested changes"
            );
        }

        let mut state = SettingState::Start;
        let mut mutations = Vec::with_capacity(slots.len());
        for slot in slots {
            let Some((next, step)) = self.transition(rng, state) else {
                warn!(setting = %self.name, "no legal setting change left, stopping early");
                break;
            };
            let anchor = anchors[slot].clone();
            let mutation = if rng.next_bool() {
                Mutation::insert_before(anchor, step)
            } else {
                Mutation::insert_after(anchor, step)
            };
            mutations.push(mutation);
            state = next;
        }

        debug!(
            setting = %self.name,
            changes = mutations.len(),
            "generated cluster setting mutations"
        );
        Ok(mutations)
    }
}
