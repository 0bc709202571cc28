//! Upgrade test plans.
//!
//! A plan is a setup section followed by one section per upgrade. Each
//! section is a flat list of top-level steps, so every insertion point a
//! mutator can pick lies between two whole steps.

use std::fmt::Write as _;

use mixedversion_types::Version;
use serde::{Deserialize, Serialize};

use crate::{PlanStep, Step, StepId, StepKind};

/// The steps that move the cluster from one release to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePlan {
    pub from: Version,
    pub to: Version,
    pub steps: Vec<PlanStep>,
}

/// Position of a step inside a [`TestPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepLocation {
    Setup(usize),
    Upgrade { upgrade: usize, index: usize },
}

/// A complete mixed-version test plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    pub setup: Vec<PlanStep>,
    pub upgrades: Vec<UpgradePlan>,
    next_id: u64,
}

impl TestPlan {
    /// Creates a plan. `next_id` must be greater than every step id used.
    pub fn new(setup: Vec<PlanStep>, upgrades: Vec<UpgradePlan>) -> Self {
        let next_id = setup
            .iter()
            .chain(upgrades.iter().flat_map(|u| u.steps.iter()))
            .map(|s| s.id.as_u64() + 1)
            .max()
            .unwrap_or(1);
        Self {
            setup,
            upgrades,
            next_id,
        }
    }

    /// Hands out a step id not yet used in this plan.
    pub fn allocate_id(&mut self) -> StepId {
        let id = StepId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Iterates all steps in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.setup
            .iter()
            .chain(self.upgrades.iter().flat_map(|u| u.steps.iter()))
    }

    /// Number of top-level steps.
    pub fn len(&self) -> usize {
        self.steps().count()
    }

    pub fn is_empty(&self) -> bool {
        self.setup.is_empty() && self.upgrades.iter().all(|u| u.steps.is_empty())
    }

    /// Locates a step by id.
    pub fn find(&self, id: StepId) -> Option<StepLocation> {
        if let Some(index) = self.setup.iter().position(|s| s.id == id) {
            return Some(StepLocation::Setup(index));
        }
        self.upgrades.iter().enumerate().find_map(|(upgrade, u)| {
            u.steps
                .iter()
                .position(|s| s.id == id)
                .map(|index| StepLocation::Upgrade { upgrade, index })
        })
    }

    /// Returns the step with the given id.
    pub fn get(&self, id: StepId) -> Option<&PlanStep> {
        self.steps().find(|s| s.id == id)
    }

    /// Number of steps of the given kind.
    pub fn count(&self, kind: StepKind) -> usize {
        self.steps().filter(|s| s.kind() == kind).count()
    }

    /// Steps that SET or RESET the named cluster setting, in plan order.
    pub fn setting_changes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PlanStep> {
        self.steps().filter(move |s| match &s.step {
            Step::SetClusterSetting(set) => set.name == name,
            Step::ResetClusterSetting(reset) => reset.name == name,
            _ => false,
        })
    }

    /// Section containing `location`, mutable.
    pub(crate) fn section_mut(&mut self, location: StepLocation) -> (&mut Vec<PlanStep>, usize) {
        match location {
            StepLocation::Setup(index) => (&mut self.setup, index),
            StepLocation::Upgrade { upgrade, index } => (&mut self.upgrades[upgrade].steps, index),
        }
    }

    /// Renders the plan as an indented tree.
    ///
    /// ```text
    /// mixed-version test plan for upgrading from "v22.2.2" to "v23.1.9":
    /// ├── start cluster at version "v22.2.2" (1)
    /// └── upgrade cluster from "v22.2.2" to "v23.1.9"
    ///    ├── prevent auto-upgrades ... (2)
    ///    ...
    /// ```
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        let first = self
            .upgrades
            .first()
            .map(|u| u.from.to_string())
            .unwrap_or_default();
        let last = self
            .upgrades
            .last()
            .map(|u| u.to.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "mixed-version test plan for upgrading from \"{first}\" to \"{last}\":"
        );

        let sections = self.setup.len() + self.upgrades.len();
        let mut position = 0;
        for step in &self.setup {
            position += 1;
            let branch = if position == sections { "└──" } else { "├──" };
            let _ = writeln!(out, "{branch} {} ({})", step.step, step.id);
        }
        for upgrade in &self.upgrades {
            position += 1;
            let is_last = position == sections;
            let branch = if is_last { "└──" } else { "├──" };
            let indent = if is_last { "   " } else { "│  " };
            let _ = writeln!(
                out,
                "{branch} upgrade cluster from \"{}\" to \"{}\"",
                upgrade.from, upgrade.to
            );
            for (i, step) in upgrade.steps.iter().enumerate() {
                let leaf = if i + 1 == upgrade.steps.len() {
                    "└──"
                } else {
                    "├──"
                };
                let _ = writeln!(out, "{indent} {leaf} {} ({})", step.step, step.id);
            }
        }
        out
    }
}
