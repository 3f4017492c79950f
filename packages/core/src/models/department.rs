//! Department views
//!
//! Departments carry no stored attributes besides their name; both views
//! here are derived from the shape of the graph.

use crate::db::{NodeId, Row, StoreError};
use serde::{Deserialize, Serialize};

/// Department listing entry with its WORKS_IN headcount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: NodeId,
    pub name: String,
    pub employee_count: i64,
}

impl Department {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row
                .get_node_id("id")
                .ok_or_else(|| StoreError::malformed_row("id"))?,
            name: row
                .get_str("name")
                .ok_or_else(|| StoreError::malformed_row("name"))?
                .to_string(),
            employee_count: row
                .get_integer("employeeCount")
                .ok_or_else(|| StoreError::malformed_row("employeeCount"))?,
        })
    }
}

/// An employee's own department: headcount plus the manager's full name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub id: NodeId,
    pub name: String,
    pub employee_count: i64,
    pub manager: String,
}

impl DepartmentSummary {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let department = Department::from_row(row)?;
        Ok(Self {
            id: department.id,
            name: department.name,
            employee_count: department.employee_count,
            manager: row
                .get_str("manager")
                .ok_or_else(|| StoreError::malformed_row("manager"))?
                .to_string(),
        })
    }
}
