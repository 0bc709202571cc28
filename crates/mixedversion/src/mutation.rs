//! Edit descriptors produced by mutators.

use std::fmt::{self, Display};

use serde::Serialize;

use crate::{PlanStep, Step};

/// The kind of edit a [`Mutation`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOp {
    InsertBefore,
    InsertAfter,
    Remove,
}

impl Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InsertBefore => "insert-before",
            Self::InsertAfter => "insert-after",
            Self::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// What to do at the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "step", rename_all = "snake_case")]
pub enum MutationKind {
    /// Splice the step in right before the anchor.
    InsertBefore(Step),
    /// Splice the step in right after the anchor.
    InsertAfter(Step),
    /// Delete the anchor itself.
    Remove,
}

/// One edit against a base plan.
///
/// `reference` is the anchor step as it appears in the base plan; for
/// removals the anchor is the step being deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation {
    pub reference: PlanStep,
    pub kind: MutationKind,
}

impl Mutation {
    pub fn insert_before(reference: PlanStep, step: Step) -> Self {
        Self {
            reference,
            kind: MutationKind::InsertBefore(step),
        }
    }

    pub fn insert_after(reference: PlanStep, step: Step) -> Self {
        Self {
            reference,
            kind: MutationKind::InsertAfter(step),
        }
    }

    pub fn remove(reference: PlanStep) -> Self {
        Self {
            reference,
            kind: MutationKind::Remove,
        }
    }

    pub fn op(&self) -> MutationOp {
        match self.kind {
            MutationKind::InsertBefore(_) => MutationOp::InsertBefore,
            MutationKind::InsertAfter(_) => MutationOp::InsertAfter,
            MutationKind::Remove => MutationOp::Remove,
        }
    }

    /// The step being inserted; `None` for removals.
    pub fn inserted(&self) -> Option<&Step> {
        match &self.kind {
            MutationKind::InsertBefore(step) | MutationKind::InsertAfter(step) => Some(step),
            MutationKind::Remove => None,
        }
    }
}

impl Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inserted() {
            Some(step) => write!(f, "{} {} [{}]", self.op(), self.reference.id, step),
            None => write!(f, "{} {} [{}]", self.op(), self.reference.id, self.reference.step),
        }
    }
}
