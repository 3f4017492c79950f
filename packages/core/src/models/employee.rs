//! Employee records and write inputs

use crate::db::{NodeId, Row, StoreError};
use serde::{Deserialize, Serialize};

/// Employee projection returned by the read operations
///
/// Identity is the storage-assigned [`NodeId`]; `(first_name, last_name, age)`
/// is the de-duplication key enforced on create and edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: NodeId,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
}

impl Employee {
    /// Build an employee from a row carrying `id`, `firstName`, `lastName` and `age`
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row
                .get_node_id("id")
                .ok_or_else(|| StoreError::malformed_row("id"))?,
            first_name: row
                .get_str("firstName")
                .ok_or_else(|| StoreError::malformed_row("firstName"))?
                .to_string(),
            last_name: row
                .get_str("lastName")
                .ok_or_else(|| StoreError::malformed_row("lastName"))?
                .to_string(),
            age: row
                .get_integer("age")
                .ok_or_else(|| StoreError::malformed_row("age"))?,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Role an employee holds in their department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Manager,
    Staff,
}

impl Position {
    /// Interpret the free-form position supplied on create/edit.
    ///
    /// Writes compare case-insensitively; the `position` list filter does not
    /// (see `query::predicate`).
    pub fn from_input(position: &str) -> Self {
        if position.eq_ignore_ascii_case("manager") {
            Position::Manager
        } else {
            Position::Staff
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, Position::Manager)
    }
}

/// Input for creating an employee
///
/// Every field is optional at the type level so that absent fields surface as
/// `InvalidInput` from the planner rather than as deserialization failures.
/// `first_name`, `last_name`, `age` and `department` are required; `position`
/// defaults to staff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub position: Option<String>,
    pub department: Option<String>,
}

impl NewEmployee {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: i64,
        department: impl Into<String>,
    ) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            age: Some(age),
            position: None,
            department: Some(department.into()),
        }
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }
}

/// Partial update for an existing employee
///
/// Only supplied fields change. `position` is only meaningful together with
/// `department`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub position: Option<String>,
    pub department: Option<String>,
}

impl EmployeeUpdate {
    /// Whether any part of the `(firstName, lastName, age)` key changes
    pub fn touches_identity(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some() || self.age.is_some()
    }
}
