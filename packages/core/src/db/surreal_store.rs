//! SurrealStore - GraphStore Implementation for SurrealDB
//!
//! Runs transactional units against an embedded SurrealDB instance. Reads
//! become one `SELECT`; write plans become one `BEGIN`/`COMMIT` block so a
//! failing guard or constraint discards every earlier step.
//!
//! # Engines
//!
//! - `kv-mem` ([`SurrealStore::in_memory`]) for tests and the dev tools
//! - `kv-rocksdb` ([`SurrealStore::open`], behind the `rocksdb` feature)
//!   for a persistent graph
//!
//! # Examples
//!
//! ```rust,no_run
//! use orggraph_core::db::SurrealStore;
//! use orggraph_core::Label;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SurrealStore::in_memory().await?;
//!     store.create_department("Engineering").await?;
//!     assert_eq!(store.node_count(Label::Department).await?, 1);
//!     Ok(())
//! }
//! ```

use super::error::{RejectionKind, StoreError};
use super::graph_store::{GraphStore, TransactionUnit};
use super::surql;
use super::value::{NodeId, Row, Value};
use crate::models::{Label, PropertyKey, RelType};
use crate::query::{Assignments, MutationPlan, Step};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::{Response, Surreal};

const NAMESPACE: &str = "orggraph";
const DATABASE: &str = "org";

/// Outgoing edge as read back by [`SurrealStore::edges_from`]
#[derive(Debug, Deserialize)]
struct EdgeRecord {
    kind: String,
    target: u64,
}

/// Embedded SurrealDB graph store
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Db>,
}

impl SurrealStore {
    /// Fresh in-memory database with the schema applied
    pub async fn in_memory() -> Result<Self, StoreError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| StoreError::transaction_failed(format!("failed to start SurrealDB: {}", e)))?;
        Self::initialize(db).await
    }

    /// Open (or create) a RocksDB-backed database at `path`
    #[cfg(feature = "rocksdb")]
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        use surrealdb::engine::local::RocksDb;

        let db = Surreal::new::<RocksDb>(path.as_ref().to_path_buf())
            .await
            .map_err(|e| StoreError::transaction_failed(format!("failed to open RocksDB: {}", e)))?;
        Self::initialize(db).await
    }

    async fn initialize(db: Surreal<Db>) -> Result<Self, StoreError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| StoreError::transaction_failed(format!("failed to select database: {}", e)))?;

        let store = Self { db };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), StoreError> {
        let mut response = self.run(&surql::schema(), Vec::new()).await?;
        let errors = response.take_errors();
        if let Some(err) = errors.values().next() {
            return Err(StoreError::transaction_failed(format!(
                "failed to define schema: {}",
                err
            )));
        }
        tracing::debug!(namespace = NAMESPACE, database = DATABASE, "schema ready");
        Ok(())
    }

    /// Create a department out-of-band, returning its identifier.
    ///
    /// Departments are never created by employee writes; this is the
    /// administrative entry point. Creating an existing name returns the
    /// existing department.
    pub async fn create_department(&self, name: &str) -> Result<NodeId, StoreError> {
        if let Some(id) = self.department_id(name).await? {
            return Ok(id);
        }

        let plan = MutationPlan::new().step(Step::CreateNode {
            var: "d",
            label: Label::Department,
            properties: Assignments::new().set(PropertyKey::Name, name),
        });
        match self.execute(TransactionUnit::Write(plan)).await {
            Ok(rows) => {
                let id = rows
                    .first()
                    .and_then(|row| row.get_node_id("id"))
                    .ok_or_else(|| StoreError::malformed_row("id"))?;
                tracing::debug!(department = name, id = %id, "created department");
                Ok(id)
            }
            // lost a race against another creator of the same name
            Err(StoreError::Rejected {
                kind: RejectionKind::Conflict,
                ..
            }) => self.department_id(name).await?.ok_or_else(|| {
                StoreError::transaction_failed(format!("department {} vanished", name))
            }),
            Err(err) => Err(err),
        }
    }

    /// Identifier of the department with the given name
    pub async fn department_id(&self, name: &str) -> Result<Option<NodeId>, StoreError> {
        let mut response = self
            .run(
                "SELECT VALUE record::id(id) FROM department WHERE name = $name",
                vec![("name".to_string(), Value::from(name))],
            )
            .await?;
        let ids: Vec<u64> = take(&mut response, 0)?;
        Ok(ids.first().copied().map(NodeId::new))
    }

    pub async fn contains_node(&self, id: NodeId) -> Result<bool, StoreError> {
        let mut response = self
            .run(
                "SELECT VALUE true FROM employee, department WHERE record::id(id) = $id",
                vec![("id".to_string(), Value::from(id))],
            )
            .await?;
        let found: Vec<bool> = take(&mut response, 0)?;
        Ok(!found.is_empty())
    }

    pub async fn node_count(&self, label: Label) -> Result<usize, StoreError> {
        self.count_records(surql::node_table(label)).await
    }

    pub async fn edge_count(&self, rel_type: RelType) -> Result<usize, StoreError> {
        self.count_records(surql::edge_table(rel_type)).await
    }

    /// Outgoing edges of a node as `(type, target)` pairs
    pub async fn edges_from(&self, id: NodeId) -> Result<Vec<(RelType, NodeId)>, StoreError> {
        let text = format!(
            "SELECT record::tb(id) AS kind, record::id(out) AS target FROM {} WHERE record::id(in) = $id",
            surql::all_edge_tables()
        );
        let mut response = self
            .run(&text, vec![("id".to_string(), Value::from(id))])
            .await?;
        let records: Vec<EdgeRecord> = take(&mut response, 0)?;

        records
            .into_iter()
            .map(|record| {
                surql::rel_type_of(&record.kind)
                    .map(|rel_type| (rel_type, NodeId::new(record.target)))
                    .ok_or_else(|| StoreError::malformed_row("kind"))
            })
            .collect()
    }

    async fn count_records(&self, table: &str) -> Result<usize, StoreError> {
        let mut response = self
            .run(
                "SELECT VALUE true FROM type::table($table)",
                vec![("table".to_string(), Value::from(table))],
            )
            .await?;
        let records: Vec<bool> = take(&mut response, 0)?;
        Ok(records.len())
    }

    async fn run(&self, text: &str, params: Vec<(String, Value)>) -> Result<Response, StoreError> {
        tracing::trace!(surql = text, "sending SurrealQL");
        let mut request = self.db.query(text);
        for binding in params {
            request = request.bind(binding);
        }
        request
            .await
            .map_err(|e| StoreError::transaction_failed(e.to_string()))
    }
}

#[async_trait]
impl GraphStore for SurrealStore {
    async fn execute(&self, unit: TransactionUnit) -> Result<Vec<Row>, StoreError> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            for statement in unit.to_cypher() {
                let params: Vec<&str> = statement.params.iter().map(|(k, _)| k.as_str()).collect();
                tracing::debug!(query = %statement.text, params = ?params, "executing statement");
            }
        }

        match unit {
            TransactionUnit::Read(query) => {
                let statement = surql::render_read(&query)?;
                let mut response = self.run(&statement.text, statement.params).await?;
                let errors = response.take_errors();
                if !errors.is_empty() {
                    return Err(classify(errors, &[]));
                }
                let records: Vec<serde_json::Value> = take(&mut response, 0)?;
                records.into_iter().map(to_row).collect()
            }
            TransactionUnit::Write(plan) => {
                let statement = surql::render_write(&plan)?;
                let mut response = self.run(&statement.text, statement.params).await?;
                let errors = response.take_errors();
                if !errors.is_empty() {
                    let err = classify(errors, &statement.guards);
                    tracing::warn!(error = %err, steps = plan.len(), "write unit rolled back");
                    return Err(err);
                }

                let mut rows = Vec::with_capacity(statement.created.len());
                for index in statement.created {
                    let records: Vec<serde_json::Value> = take(&mut response, index)?;
                    for record in records {
                        rows.push(to_row(record)?);
                    }
                }
                Ok(rows)
            }
        }
    }
}

fn take<T>(response: &mut Response, index: usize) -> Result<Vec<T>, StoreError>
where
    T: serde::de::DeserializeOwned,
{
    response.take(index).map_err(|e| {
        StoreError::transaction_failed(format!("failed to read result {}: {}", index, e))
    })
}

/// Map statement errors onto a guard rejection, a uniqueness conflict or a
/// plain transaction failure
fn classify(
    errors: HashMap<usize, surrealdb::Error>,
    guards: &[(RejectionKind, String)],
) -> StoreError {
    let mut messages: Vec<(usize, String)> = errors
        .into_iter()
        .map(|(index, err)| (index, err.to_string()))
        .collect();
    messages.sort();

    let guard = messages
        .iter()
        .filter_map(|(_, message)| surql::guard_index(message))
        .find_map(|index| guards.get(index));
    if let Some((kind, reason)) = guard {
        return StoreError::rejected(*kind, reason.clone());
    }

    if let Some((_, message)) = messages
        .iter()
        .find(|(_, message)| message.contains("already contains"))
    {
        return StoreError::rejected(RejectionKind::Conflict, message.clone());
    }

    // statements after the failing one only report that they were skipped
    let context = messages
        .iter()
        .map(|(_, message)| message.as_str())
        .find(|message| !message.contains("not executed"))
        .or_else(|| messages.first().map(|(_, message)| message.as_str()))
        .unwrap_or("unknown error");
    StoreError::transaction_failed(context)
}

fn to_row(record: serde_json::Value) -> Result<Row, StoreError> {
    let fields = match record {
        serde_json::Value::Object(fields) => fields,
        _ => return Err(StoreError::malformed_row("*")),
    };

    fields
        .into_iter()
        .map(|(column, value)| {
            let value = match value {
                serde_json::Value::Null => Value::Null,
                serde_json::Value::String(text) => Value::String(text),
                serde_json::Value::Number(number) => match number.as_i64() {
                    Some(integer) => Value::Integer(integer),
                    None => return Err(StoreError::malformed_row(column)),
                },
                _ => return Err(StoreError::malformed_row(column)),
            };
            Ok((column, value))
        })
        .collect()
}
