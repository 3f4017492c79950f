//! Database Layer
//!
//! This module is the graph execution port and the engine behind it:
//!
//! - [`GraphStore`] - the single `execute(unit) -> rows` operation
//! - [`TransactionUnit`] - one read query or one write plan
//! - [`SurrealStore`] - embedded SurrealDB engine behind the port
//! - [`Value`], [`Row`], [`NodeId`] - scalar results crossing the port
//!
//! # Architecture
//!
//! The service layer owns no connection state. A store handle is passed in
//! explicitly and every operation opens exactly one transactional unit on
//! it. `SurrealStore` renders units to SurrealQL; engines that accept
//! Cypher can render a unit with [`TransactionUnit::to_cypher`].

mod error;
mod graph_store;
mod surql;
mod surreal_store;
mod value;

pub use error::{RejectionKind, StoreError};
pub use graph_store::{GraphStore, TransactionUnit};
pub use surreal_store::SurrealStore;
pub use value::{NodeId, Row, Value};
