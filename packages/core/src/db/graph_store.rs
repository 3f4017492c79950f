//! GraphStore Trait - Graph Execution Port
//!
//! The single seam between the query/mutation layer and a graph engine. A
//! caller hands the store one [`TransactionUnit`] and receives the produced
//! rows or an error.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: engines may be embedded or remote
//! 2. **One unit, one transaction**: a read runs in a read transaction, a
//!    write plan in a single write transaction. A failed write unit leaves
//!    no partial effects.
//! 3. **Engine-neutral input**: units carry [`TraversalQuery`] and
//!    [`MutationPlan`] values, which a Cypher-speaking engine can render
//!    with `to_cypher()`
//!
//! # Examples
//!
//! ```rust,no_run
//! use orggraph_core::db::{GraphStore, SurrealStore, TransactionUnit};
//! use orggraph_core::query::composer;
//! use orggraph_core::NodeId;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SurrealStore::in_memory().await?;
//!     let rows = store
//!         .execute(TransactionUnit::Read(composer::subordinates(NodeId::new(1))))
//!         .await?;
//!     println!("{} subordinates", rows.len());
//!     Ok(())
//! }
//! ```

use super::error::StoreError;
use super::value::Row;
use crate::query::{CompiledQuery, MutationPlan, TraversalQuery};
use async_trait::async_trait;

/// One transactional unit of work
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionUnit {
    /// Runs in a read transaction; never mutates
    Read(TraversalQuery),
    /// Runs in one write transaction; all steps apply or none do
    Write(MutationPlan),
}

impl TransactionUnit {
    pub fn is_read_only(&self) -> bool {
        matches!(self, TransactionUnit::Read(_))
    }

    /// Cypher statements for this unit, in execution order
    pub fn to_cypher(&self) -> Vec<CompiledQuery> {
        match self {
            TransactionUnit::Read(query) => vec![query.to_cypher()],
            TransactionUnit::Write(plan) => plan.to_cypher(),
        }
    }
}

/// Graph execution port
///
/// Implementations must be `Send + Sync`; the service layer shares one store
/// across tasks behind an `Arc`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute one unit and return the rows it produced.
    ///
    /// Reads return their projected rows. Writes return one `{ id }` row per
    /// node created.
    async fn execute(&self, unit: TransactionUnit) -> Result<Vec<Row>, StoreError>;
}
