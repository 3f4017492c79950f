//! OrgGraph Core Business Logic Layer
//!
//! This crate provides query composition, mutation planning and service
//! orchestration for an organizational graph of employees and departments.
//!
//! # Architecture
//!
//! - **Closed vocabulary**: labels, relationship types, property keys and
//!   filter fields are enums; caller input only ever becomes bound parameters
//! - **Engine-neutral queries and plans**: reads are `TraversalQuery` values,
//!   writes are guarded `MutationPlan` values
//! - **Single execution port**: `GraphStore::execute` runs one transactional
//!   unit; a failed write leaves no trace
//! - **Explicit store handle**: no global connection state
//!
//! # Modules
//!
//! - [`models`] - Employee/Department records and write inputs
//! - [`query`] - normalizer, predicate compiler, composer, Cypher rendering
//! - [`db`] - execution port and the embedded SurrealDB store
//! - [`services`] - OrgService and the mutation planner

pub mod db;
pub mod models;
pub mod query;
pub mod services;

// Re-export commonly used types
pub use db::{GraphStore, NodeId, StoreError, SurrealStore};
pub use models::*;
pub use services::*;
