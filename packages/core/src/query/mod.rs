//! Query Layer
//!
//! Everything between raw request parameters and the execution port:
//!
//! - [`filter`] - Filter/Sort Normalizer
//! - [`predicate`] - Predicate Compiler
//! - [`traversal`] - engine-neutral read queries
//! - [`mutation`] - engine-neutral write plans
//! - [`composer`] - one traversal query per read operation
//! - [`cypher`] - parameterized Cypher rendering of queries and plans
//!
//! # Query Pattern Examples
//!
//! - List employees: `MATCH (e:Employee)-[r]->(d:Department) WHERE type(r) = 'MANAGES' RETURN DISTINCT ...`
//! - Departments: `MATCH (d:Department)<-[:WORKS_IN]-(e:Employee) RETURN id(d) AS id, d.name AS name, count(DISTINCT e) AS employeeCount`
//! - Subordinates: `MATCH (m:Employee)-[:MANAGES]->(d:Department)<-[:WORKS_IN]-(s:Employee) WHERE id(m) = $p0 AND NOT (s)-[:MANAGES]->(d)`

pub mod composer;
pub mod cypher;
pub mod filter;
pub mod mutation;
pub mod predicate;
pub mod traversal;

use thiserror::Error;

pub use cypher::CompiledQuery;
pub use filter::{normalize, Field, FilterSet, ListParams, SortField};
pub use mutation::{Assignments, Expectation, Guard, MutationPlan, NodeSelector, Step};
pub use traversal::{Chain, Direction, Hop, NodePattern, Params, Predicate, ReturnItem, TraversalQuery, Var};

/// Errors raised while normalizing, compiling or composing a read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A filter value could not be converted to the field's literal type
    #[error("Invalid value for '{field}': {value:?}")]
    InvalidLiteral { field: Field, value: String },

    /// `sort` named something that is not an output column
    #[error("Unknown sort field: {0:?}")]
    UnknownSortField(String),

    /// `sort` named a column the listing does not project
    #[error("Cannot sort {listing} by '{field}'")]
    UnsupportedSort {
        field: SortField,
        listing: &'static str,
    },
}
