//! SurrealQL rendering
//!
//! Translates [`TraversalQuery`] and [`MutationPlan`] values into SurrealQL
//! for [`SurrealStore`](super::SurrealStore).
//!
//! # Storage Layout
//!
//! - Each label is a node table (`employee`, `department`) whose record ids
//!   are integers drawn from the `counter:nodes` sequence
//! - Each relationship type is a `TYPE RELATION` table (`works_in`, `manages`)
//! - Unique indexes back the employee identity triple and department names
//!
//! # Pattern Evaluation
//!
//! A pattern is evaluated as a pipeline of nested `SELECT`s over binding
//! documents. Every chain start or hop adds one field to each document and
//! `SPLIT`s on it, so a document ends up holding one record link per
//! pattern variable. Predicates filter the final documents and the
//! projection reads properties through the links. Caller values only ever
//! travel as `$parameters`.

use super::error::{RejectionKind, StoreError};
use super::value::Value;
use crate::models::{Label, RelType};
use crate::query::{
    Assignments, Direction, Expectation, MutationPlan, NodeSelector, Predicate, ReturnItem, Step,
    TraversalQuery, Var,
};
use std::collections::BTreeMap;

/// Marker carried by the error a failed guard throws, followed by its index
pub(crate) const GUARD_MARKER: &str = "orggraph-guard-";

const COUNTER: &str = "counter:nodes";

const RELATIONSHIPS: [RelType; 2] = [RelType::WorksIn, RelType::Manages];

pub(crate) fn node_table(label: Label) -> &'static str {
    match label {
        Label::Employee => "employee",
        Label::Department => "department",
    }
}

pub(crate) fn edge_table(rel_type: RelType) -> &'static str {
    match rel_type {
        RelType::WorksIn => "works_in",
        RelType::Manages => "manages",
    }
}

pub(crate) fn rel_type_of(table: &str) -> Option<RelType> {
    RELATIONSHIPS
        .into_iter()
        .find(|rel_type| edge_table(*rel_type) == table)
}

/// Every relation table, comma separated, for untyped hops
pub(crate) fn all_edge_tables() -> String {
    RELATIONSHIPS
        .iter()
        .map(|rel_type| edge_table(*rel_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table and index definitions; safe to run on every start
pub(crate) fn schema() -> String {
    let mut statements = Vec::new();
    for label in [Label::Employee, Label::Department] {
        statements.push(format!(
            "DEFINE TABLE IF NOT EXISTS {} SCHEMALESS;",
            node_table(label)
        ));
    }
    for rel_type in RELATIONSHIPS {
        statements.push(format!(
            "DEFINE TABLE IF NOT EXISTS {} SCHEMALESS TYPE RELATION;",
            edge_table(rel_type)
        ));
    }
    statements.push("DEFINE TABLE IF NOT EXISTS counter SCHEMALESS;".to_string());
    statements.push(
        "DEFINE INDEX IF NOT EXISTS employee_identity ON TABLE employee \
         FIELDS firstName, lastName, age UNIQUE;"
            .to_string(),
    );
    statements.push(
        "DEFINE INDEX IF NOT EXISTS department_name ON TABLE department FIELDS name UNIQUE;"
            .to_string(),
    );
    statements.join("\n")
}

/// A rendered read: one `SELECT` returning one object per row
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReadStatement {
    pub text: String,
    pub params: Vec<(String, Value)>,
}

/// A rendered write plan wrapped in one transaction
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WriteStatement {
    pub text: String,
    pub params: Vec<(String, Value)>,
    /// Result index of each `{ id }` row, in creation order
    pub created: Vec<usize>,
    /// Kind and reason of each guard, indexed by the number it throws
    pub guards: Vec<(RejectionKind, String)>,
}

pub(crate) fn render_read(query: &TraversalQuery) -> Result<ReadStatement, StoreError> {
    let mut params = Vec::new();
    let bindings = Bindings::render(query, "", &mut params)?;
    let text = bindings.project(query)?;
    Ok(ReadStatement { text, params })
}

pub(crate) fn render_write(plan: &MutationPlan) -> Result<WriteStatement, StoreError> {
    let mut params = Vec::new();
    let mut statements: Vec<String> = Vec::new();
    let mut guards = Vec::new();
    let mut created: Vec<Var> = Vec::new();

    for (index, step) in plan.steps.iter().enumerate() {
        let prefix = format!("s{}_", index);
        match step {
            Step::Guard(guard) => {
                let source = Bindings::render(&guard.query, &prefix, &mut params)?.source;
                let failing = match guard.expect {
                    Expectation::Exists => "=",
                    Expectation::Absent => ">",
                };
                statements.push(format!(
                    "IF array::len({}) {} 0 {{ THROW \"{}{}\" }}",
                    source,
                    failing,
                    GUARD_MARKER,
                    guards.len()
                ));
                guards.push((guard.kind, guard.reason.clone()));
            }
            Step::CreateNode {
                var,
                label,
                properties,
            } => {
                statements.push(format!(
                    "LET $next_{} = (UPSERT ONLY {} SET seq = (seq OR 0) + 1 RETURN VALUE seq)",
                    var, COUNTER
                ));
                statements.push(format!(
                    "LET $created_{} = type::thing('{}', $next_{})",
                    var,
                    node_table(*label),
                    var
                ));
                let mut create = format!(
                    "CREATE type::thing('{}', $next_{})",
                    node_table(*label),
                    var
                );
                if !properties.is_empty() {
                    create.push_str(" SET ");
                    create.push_str(&assignments(properties, &prefix, &mut params).join(", "));
                }
                statements.push(create);
                created.push(*var);
            }
            Step::SetProperties {
                target,
                assignments: values,
            } => {
                let nodes = selection(target, &created, &prefix, &mut params)?;
                if !values.is_empty() {
                    statements.push(format!(
                        "FOR $node IN {} {{ UPDATE $node SET {} }}",
                        nodes,
                        assignments(values, &prefix, &mut params).join(", ")
                    ));
                }
            }
            Step::CreateEdge { from, rel_type, to } => {
                let sources = selection(from, &created, &format!("{}from_", prefix), &mut params)?;
                let targets = selection(to, &created, &format!("{}to_", prefix), &mut params)?;
                statements.push(format!(
                    "FOR $source IN {} {{ FOR $target IN {} {{ RELATE $source->{}->$target }} }}",
                    sources,
                    targets,
                    edge_table(*rel_type)
                ));
            }
            Step::DeleteEdges { from, rel_types } => {
                let nodes = selection(from, &created, &prefix, &mut params)?;
                let deletes: Vec<String> = rel_types
                    .iter()
                    .map(|rel_type| format!("DELETE {} WHERE in = $node;", edge_table(*rel_type)))
                    .collect();
                statements.push(format!("FOR $node IN {} {{ {} }}", nodes, deletes.join(" ")));
            }
            Step::DetachDelete { target } => {
                let nodes = selection(target, &created, &prefix, &mut params)?;
                let mut deletes: Vec<String> = RELATIONSHIPS
                    .iter()
                    .map(|rel_type| {
                        format!(
                            "DELETE {} WHERE in = $node OR out = $node;",
                            edge_table(*rel_type)
                        )
                    })
                    .collect();
                deletes.push("DELETE $node;".to_string());
                statements.push(format!("FOR $node IN {} {{ {} }}", nodes, deletes.join(" ")));
            }
        }
    }

    let first_row = statements.len();
    for var in &created {
        statements.push(format!("SELECT record::id(id) AS id FROM $created_{}", var));
    }

    Ok(WriteStatement {
        text: format!(
            "BEGIN TRANSACTION;\n{};\nCOMMIT TRANSACTION;",
            statements.join(";\n")
        ),
        params,
        created: (first_row..first_row + created.len()).collect(),
        guards,
    })
}

/// Which guard a thrown error came from
pub(crate) fn guard_index(message: &str) -> Option<usize> {
    let start = message.find(GUARD_MARKER)? + GUARD_MARKER.len();
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Node,
    Edge,
}

/// Binding documents for one pattern, plus where each variable lives in them
struct Bindings {
    prefix: String,
    /// Expression reading a variable's record link from a binding document
    vars: BTreeMap<Var, (String, Kind)>,
    /// Expression evaluating to the matching binding documents
    source: String,
}

impl Bindings {
    fn render(
        query: &TraversalQuery,
        prefix: &str,
        params: &mut Vec<(String, Value)>,
    ) -> Result<Self, StoreError> {
        validate(query)?;
        for (name, value) in query.params.iter() {
            params.push((format!("{}{}", prefix, name), value.clone()));
        }

        let mut bindings = Self {
            prefix: prefix.to_string(),
            vars: BTreeMap::new(),
            source: "[{}]".to_string(),
        };
        let mut hops = 0;

        for chain in &query.pattern {
            let mut current = match bindings.vars.get(chain.start.var) {
                Some((expr, Kind::Node)) => expr.clone(),
                Some((_, Kind::Edge)) => return Err(wrong_binding(chain.start.var, "node")),
                None => {
                    let field = format!("n_{}", chain.start.var);
                    bindings.source = format!(
                        "(SELECT *, (SELECT VALUE id FROM {}) AS {} FROM {} SPLIT {})",
                        node_table(chain.start.label),
                        field,
                        bindings.source,
                        field
                    );
                    bindings
                        .vars
                        .insert(chain.start.var, (field.clone(), Kind::Node));
                    field
                }
            };

            let mut chain_edges: Vec<String> = Vec::new();
            for hop in &chain.hops {
                let field = format!("h_{}", hops);
                hops += 1;

                let (near, far) = match hop.direction {
                    Direction::Outgoing => ("in", "out"),
                    Direction::Incoming => ("out", "in"),
                };
                let tables = match hop.rel_type {
                    Some(rel_type) => edge_table(rel_type).to_string(),
                    None => all_edge_tables(),
                };

                let mut conditions = vec![
                    format!("{} = $parent.{}", near, current),
                    format!("record::tb({}) = '{}'", far, node_table(hop.node.label)),
                ];
                for edge in &chain_edges {
                    conditions.push(format!("id != $parent.{}", edge));
                }

                let bound_node = match bindings.vars.get(hop.node.var) {
                    Some((expr, Kind::Node)) => {
                        conditions.push(format!("{} = $parent.{}", far, expr));
                        Some(expr.clone())
                    }
                    Some((_, Kind::Edge)) => return Err(wrong_binding(hop.node.var, "node")),
                    None => None,
                };
                if let Some(rel_var) = hop.rel_var {
                    match bindings.vars.get(rel_var) {
                        Some((expr, Kind::Edge)) => {
                            conditions.push(format!("id = $parent.{}", expr))
                        }
                        Some((_, Kind::Node)) => {
                            return Err(wrong_binding(rel_var, "relationship"))
                        }
                        None => {
                            bindings.vars.insert(rel_var, (field.clone(), Kind::Edge));
                        }
                    }
                }

                bindings.source = format!(
                    "(SELECT *, (SELECT VALUE id FROM {} WHERE {}) AS {} FROM {} SPLIT {})",
                    tables,
                    conditions.join(" AND "),
                    field,
                    bindings.source,
                    field
                );

                current = match bound_node {
                    Some(expr) => expr,
                    None => {
                        let expr = format!("{}.{}", field, far);
                        bindings.vars.insert(hop.node.var, (expr.clone(), Kind::Node));
                        expr
                    }
                };
                chain_edges.push(field);
            }
        }

        let conditions = query
            .predicates
            .iter()
            .map(|predicate| bindings.predicate(predicate))
            .collect::<Result<Vec<_>, _>>()?;
        if !conditions.is_empty() {
            bindings.source = format!(
                "(SELECT * FROM {} WHERE {})",
                bindings.source,
                conditions.join(" AND ")
            );
        }
        Ok(bindings)
    }

    fn node(&self, var: &str) -> Result<&str, StoreError> {
        match self.vars.get(var) {
            Some((expr, Kind::Node)) => Ok(expr.as_str()),
            Some((_, Kind::Edge)) => Err(wrong_binding(var, "node")),
            None => Err(StoreError::UnboundVariable(var.to_string())),
        }
    }

    fn edge(&self, var: &str) -> Result<&str, StoreError> {
        match self.vars.get(var) {
            Some((expr, Kind::Edge)) => Ok(expr.as_str()),
            Some((_, Kind::Node)) => Err(wrong_binding(var, "relationship")),
            None => Err(StoreError::UnboundVariable(var.to_string())),
        }
    }

    fn param(&self, name: &str) -> String {
        format!("${}{}", self.prefix, name)
    }

    fn predicate(&self, predicate: &Predicate) -> Result<String, StoreError> {
        let text = match predicate {
            Predicate::PropertyEquals { var, key, param } => {
                format!("{}.{} = {}", self.node(var)?, key, self.param(param))
            }
            Predicate::SameProperty { var, other, key } => {
                let (left, right) = (self.node(var)?, self.node(other)?);
                format!(
                    "({}.{} != NONE AND {}.{} = {}.{})",
                    left, key, left, key, right, key
                )
            }
            Predicate::RelationshipIs { var, rel_type } => {
                format!("record::tb({}) = '{}'", self.edge(var)?, edge_table(*rel_type))
            }
            Predicate::IdEquals { var, param } => {
                format!("record::id({}) = {}", self.node(var)?, self.param(param))
            }
            Predicate::IdNotEquals { var, param } => {
                format!("record::id({}) != {}", self.node(var)?, self.param(param))
            }
            Predicate::NotConnected { from, rel_type, to } => format!(
                "array::len((SELECT VALUE id FROM {} WHERE in = $parent.{} AND out = $parent.{})) = 0",
                edge_table(*rel_type),
                self.node(from)?,
                self.node(to)?
            ),
        };
        Ok(text)
    }

    fn column(&self, item: &ReturnItem) -> Result<String, StoreError> {
        let text = match item {
            ReturnItem::Property { var, key, alias } => {
                format!("{}.{} AS {}", self.node(var)?, key, alias)
            }
            ReturnItem::Id { var, alias } => {
                let expr = match self.vars.get(var) {
                    Some((expr, _)) => expr,
                    None => return Err(StoreError::UnboundVariable(var.to_string())),
                };
                format!("record::id({}) AS {}", expr, alias)
            }
            ReturnItem::Joined {
                var,
                keys,
                separator,
                alias,
            } => {
                let node = self.node(var)?;
                let parts: Vec<String> = keys.iter().map(|key| format!("{}.{}", node, key)).collect();
                format!(
                    "string::join({}, {}) AS {}",
                    string_literal(separator),
                    parts.join(", "),
                    alias
                )
            }
            ReturnItem::Count { var, .. } => {
                return Err(StoreError::transaction_failed(format!(
                    "count over '{}' rendered as a plain column",
                    var
                )))
            }
        };
        Ok(text)
    }

    /// The final `SELECT`: projection, de-duplication, counting and order
    fn project(&self, query: &TraversalQuery) -> Result<String, StoreError> {
        let keys: Vec<&ReturnItem> = query.returns.iter().filter(|i| !i.is_aggregate()).collect();
        let counts: Vec<&ReturnItem> = query.returns.iter().filter(|i| i.is_aggregate()).collect();
        let columns = keys
            .iter()
            .map(|item| self.column(item))
            .collect::<Result<Vec<_>, _>>()?;
        let aliases: Vec<&str> = keys.iter().map(|item| item.alias()).collect();

        let mut text = match counts.as_slice() {
            [] if columns.is_empty() => format!("SELECT VALUE {{}} FROM {}", self.source),
            [] => {
                let mut text = format!("SELECT {} FROM {}", columns.join(", "), self.source);
                if query.distinct {
                    text.push_str(&format!(" GROUP BY {}", aliases.join(", ")));
                }
                text
            }
            [ReturnItem::Count { var, alias }] => {
                let counted = self.node(var)?;
                let mut inner_columns = columns.clone();
                inner_columns.push(format!("{} AS counted", counted));
                let mut inner_groups = aliases.clone();
                inner_groups.push("counted");

                let mut outer_columns: Vec<String> = aliases.iter().map(|a| a.to_string()).collect();
                outer_columns.push(format!("count() AS {}", alias));
                let grouping = if aliases.is_empty() {
                    "GROUP ALL".to_string()
                } else {
                    format!("GROUP BY {}", aliases.join(", "))
                };

                format!(
                    "SELECT {} FROM (SELECT {} FROM {} GROUP BY {}) {}",
                    outer_columns.join(", "),
                    inner_columns.join(", "),
                    self.source,
                    inner_groups.join(", "),
                    grouping
                )
            }
            _ => {
                return Err(StoreError::transaction_failed(
                    "at most one count per query is supported",
                ))
            }
        };

        if let Some(alias) = query.order_by {
            text.push_str(&format!(" ORDER BY {} DESC", alias));
        }
        Ok(text)
    }
}

/// Record links a selector resolves to, as a SurrealQL array expression
fn selection(
    selector: &NodeSelector,
    created: &[Var],
    prefix: &str,
    params: &mut Vec<(String, Value)>,
) -> Result<String, StoreError> {
    match selector {
        NodeSelector::Created(var) => {
            if created.contains(var) {
                Ok(format!("[$created_{}]", var))
            } else {
                Err(StoreError::UnboundVariable(var.to_string()))
            }
        }
        NodeSelector::Matched { query, var } => {
            let bindings = Bindings::render(query, prefix, params)?;
            Ok(format!(
                "array::distinct((SELECT VALUE {} FROM {}))",
                bindings.node(var)?,
                bindings.source
            ))
        }
    }
}

fn assignments(
    values: &Assignments,
    prefix: &str,
    params: &mut Vec<(String, Value)>,
) -> Vec<String> {
    values
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let name = format!("{}v{}", prefix, i);
            params.push((name.clone(), value.clone()));
            format!("{} = ${}", key, name)
        })
        .collect()
}

fn string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn wrong_binding(var: &str, expected: &'static str) -> StoreError {
    StoreError::WrongBinding {
        var: var.to_string(),
        expected,
    }
}

/// Reject references to unbound variables or parameters before rendering
fn validate(query: &TraversalQuery) -> Result<(), StoreError> {
    let bound = query.bound_vars();
    let check_var = |var: &str| {
        if bound.iter().any(|b| *b == var) {
            Ok(())
        } else {
            Err(StoreError::UnboundVariable(var.to_string()))
        }
    };
    let check_param = |name: &str| {
        query
            .params
            .get(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::MissingParameter(name.to_string()))
    };

    for predicate in &query.predicates {
        match predicate {
            Predicate::PropertyEquals { var, param, .. }
            | Predicate::IdEquals { var, param }
            | Predicate::IdNotEquals { var, param } => {
                check_var(var)?;
                check_param(param)?;
            }
            Predicate::SameProperty { var, other, .. } => {
                check_var(var)?;
                check_var(other)?;
            }
            Predicate::RelationshipIs { var, .. } => check_var(var)?,
            Predicate::NotConnected { from, to, .. } => {
                check_var(from)?;
                check_var(to)?;
            }
        }
    }

    for item in &query.returns {
        match item {
            ReturnItem::Property { var, .. }
            | ReturnItem::Id { var, .. }
            | ReturnItem::Joined { var, .. }
            | ReturnItem::Count { var, .. } => check_var(var)?,
        }
    }

    if let Some(alias) = query.order_by {
        if !query.returns.iter().any(|item| item.alias() == alias) {
            return Err(StoreError::UnboundVariable(alias.to_string()));
        }
    }
    Ok(())
}
