//! Mutation Plans
//!
//! A [`MutationPlan`] is the ordered list of graph operations that one write
//! performs. The engine executes the whole plan as a single transactional
//! unit: guards are evaluated in order against the state produced by the
//! preceding steps, and the first failing guard (or any engine error) rolls
//! the entire unit back.

use super::traversal::{TraversalQuery, Var};
use crate::db::{RejectionKind, Value};
use crate::models::{Label, PropertyKey, RelType};

/// What a guard requires of its query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// At least one binding must match
    Exists,
    /// No binding may match
    Absent,
}

/// Precondition evaluated inside the write unit
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    pub query: TraversalQuery,
    pub expect: Expectation,
    pub kind: RejectionKind,
    pub reason: String,
}

impl Guard {
    pub fn exists(query: TraversalQuery, kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            query,
            expect: Expectation::Exists,
            kind,
            reason: reason.into(),
        }
    }

    pub fn absent(query: TraversalQuery, kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            query,
            expect: Expectation::Absent,
            kind,
            reason: reason.into(),
        }
    }
}

/// Which nodes a step operates on
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSelector {
    /// The node created earlier in the same plan under this variable
    Created(Var),
    /// Every distinct node bound to `var` by `query`
    Matched { query: TraversalQuery, var: Var },
}

impl NodeSelector {
    pub fn matched(query: TraversalQuery, var: Var) -> Self {
        Self::Matched { query, var }
    }
}

/// Accumulated `SET` assignments for one node
///
/// Setting a key twice keeps the latest value, so rendering never needs
/// separator cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments(Vec<(PropertyKey, Value)>);

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: PropertyKey, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    /// Set only when a value was supplied
    pub fn set_opt<V: Into<Value>>(self, key: PropertyKey, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PropertyKey, Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One operation in a write plan
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Guard(Guard),
    /// Create a node; emits a row `{ id }` and binds it to `var` for later steps
    CreateNode {
        var: Var,
        label: Label,
        properties: Assignments,
    },
    SetProperties {
        target: NodeSelector,
        assignments: Assignments,
    },
    /// Create one edge for every (from, to) pair selected
    CreateEdge {
        from: NodeSelector,
        rel_type: RelType,
        to: NodeSelector,
    },
    /// Delete outgoing edges of the given types
    DeleteEdges {
        from: NodeSelector,
        rel_types: Vec<RelType>,
    },
    /// Delete nodes together with all their relationships
    DetachDelete { target: NodeSelector },
}

/// Ordered list of steps executed as one transactional unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationPlan {
    pub steps: Vec<Step>,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard(self, guard: Guard) -> Self {
        self.step(Step::Guard(guard))
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn guards(&self) -> impl Iterator<Item = &Guard> {
        self.steps.iter().filter_map(|step| match step {
            Step::Guard(guard) => Some(guard),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignments_replace_repeated_keys() {
        let assignments = Assignments::new()
            .set(PropertyKey::FirstName, "Ada")
            .set(PropertyKey::Age, 36i64)
            .set(PropertyKey::FirstName, "Augusta");

        let pairs: Vec<_> = assignments.iter().cloned().collect();
        assert_eq!(
            pairs,
            vec![
                (PropertyKey::FirstName, Value::from("Augusta")),
                (PropertyKey::Age, Value::Integer(36)),
            ]
        );
    }

    #[test]
    fn test_assignments_skip_absent_values() {
        let assignments = Assignments::new()
            .set_opt(PropertyKey::FirstName, None::<String>)
            .set_opt(PropertyKey::Age, Some(41i64));

        assert_eq!(assignments.len(), 1);
        assert!(Assignments::new().is_empty());
    }
}
