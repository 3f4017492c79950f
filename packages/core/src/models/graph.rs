//! Graph vocabulary
//!
//! The organizational graph has a closed vocabulary: two node labels, two
//! relationship types and four node properties. Every label, relationship
//! type and property name that reaches query text comes from these enums,
//! never from caller input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Employee,
    Department,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Employee => "Employee",
            Label::Department => "Department",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type between an employee and a department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelType {
    /// `(:Employee)-[:WORKS_IN]->(:Department)`, at most one per employee
    #[serde(rename = "WORKS_IN")]
    WorksIn,
    /// `(:Employee)-[:MANAGES]->(:Department)`, at most one per department
    #[serde(rename = "MANAGES")]
    Manages,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::WorksIn => "WORKS_IN",
            RelType::Manages => "MANAGES",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored node property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    FirstName,
    LastName,
    Age,
    /// Department name (unique per department)
    Name,
}

impl PropertyKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKey::FirstName => "firstName",
            PropertyKey::LastName => "lastName",
            PropertyKey::Age => "age",
            PropertyKey::Name => "name",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
