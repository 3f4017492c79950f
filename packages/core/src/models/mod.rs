//! Data Models
//!
//! This module contains the data structures exchanged with callers:
//!
//! - `Employee`, `Department`, `DepartmentSummary` - read projections
//! - `NewEmployee`, `EmployeeUpdate` - write inputs
//! - `Label`, `RelType`, `PropertyKey` - the closed graph vocabulary

mod department;
mod employee;
mod graph;

pub use department::{Department, DepartmentSummary};
pub use employee::{Employee, EmployeeUpdate, NewEmployee, Position};
pub use graph::{Label, PropertyKey, RelType};
