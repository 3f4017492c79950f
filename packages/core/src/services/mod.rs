//! Business Services
//!
//! This module contains the organization operations:
//!
//! - `OrgService` - the five reads and three writes over the graph
//! - `mutation_planner` - create/edit/delete requests as guarded write plans
//! - `OrgServiceError` - caller-facing error taxonomy
//!
//! Services coordinate between the query layer and the graph store,
//! implementing business rules as guards inside single transactional units.

pub mod error;
pub mod mutation_planner;
pub mod org_service;

pub use error::{ErrorKind, OrgServiceError};
pub use org_service::OrgService;

#[cfg(test)]
mod org_service_test;
