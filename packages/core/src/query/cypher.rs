//! Cypher rendering
//!
//! Renders traversal queries and mutation plans as parameterized
//! Cypher, for engines that speak it and for debug logging. Labels,
//! relationship types and property keys come from closed enums and are the
//! only identifiers written into the text; every value is a `$parameter`.

use super::mutation::{Assignments, Guard, MutationPlan, NodeSelector, Step};
use super::traversal::{Chain, Direction, Hop, Predicate, ReturnItem, TraversalQuery};
use crate::db::Value;
use std::fmt;

/// Query text plus the values its `$parameters` refer to
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub text: String,
    pub params: Vec<(String, Value)>,
}

impl CompiledQuery {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TraversalQuery {
    pub fn to_cypher(&self) -> CompiledQuery {
        let mut params = Vec::new();
        let mut text = Clauses::of(self, "", &mut params).head();

        if !self.returns.is_empty() {
            text.push_str(" RETURN ");
            if self.distinct {
                text.push_str("DISTINCT ");
            }
            let items: Vec<String> = self.returns.iter().map(render_return).collect();
            text.push_str(&items.join(", "));
        }
        if let Some(alias) = self.order_by {
            text.push_str(&format!(" ORDER BY {} DESC", alias));
        }

        CompiledQuery { text, params }
    }
}

impl MutationPlan {
    /// One statement per step.
    ///
    /// A node created by an earlier step is referenced as `$<var>`, standing
    /// for the identifier that step returned.
    pub fn to_cypher(&self) -> Vec<CompiledQuery> {
        self.steps.iter().map(render_step).collect()
    }
}

#[derive(Default)]
struct Clauses {
    matches: Vec<String>,
    conditions: Vec<String>,
}

impl Clauses {
    fn of(query: &TraversalQuery, prefix: &str, params: &mut Vec<(String, Value)>) -> Self {
        for (name, value) in query.params.iter() {
            params.push((format!("{}{}", prefix, name), value.clone()));
        }
        Self {
            matches: query
                .pattern
                .iter()
                .map(|chain| format!("MATCH {}", render_chain(chain)))
                .collect(),
            conditions: query
                .predicates
                .iter()
                .map(|predicate| render_predicate(predicate, prefix))
                .collect(),
        }
    }

    fn selector(selector: &NodeSelector, prefix: &str, params: &mut Vec<(String, Value)>) -> Self {
        match selector {
            NodeSelector::Created(var) => Self {
                matches: vec![format!("MATCH ({})", var)],
                conditions: vec![format!("id({}) = ${}", var, var)],
            },
            NodeSelector::Matched { query, .. } => Self::of(query, prefix, params),
        }
    }

    fn merge(mut self, other: Clauses) -> Self {
        self.matches.extend(other.matches);
        self.conditions.extend(other.conditions);
        self
    }

    fn head(&self) -> String {
        let mut text = self.matches.join(" ");
        if !self.conditions.is_empty() {
            text.push_str(" WHERE ");
            text.push_str(&self.conditions.join(" AND "));
        }
        text
    }
}

fn render_chain(chain: &Chain) -> String {
    let mut text = format!("({}:{})", chain.start.var, chain.start.label);
    for hop in &chain.hops {
        text.push_str(&render_hop(hop));
    }
    text
}

fn render_hop(hop: &Hop) -> String {
    let rel = match (hop.rel_var, hop.rel_type) {
        (Some(var), Some(rel_type)) => format!("[{}:{}]", var, rel_type),
        (Some(var), None) => format!("[{}]", var),
        (None, Some(rel_type)) => format!("[:{}]", rel_type),
        (None, None) => String::new(),
    };
    let node = format!("({}:{})", hop.node.var, hop.node.label);
    match hop.direction {
        Direction::Outgoing => format!("-{}->{}", rel, node),
        Direction::Incoming => format!("<-{}-{}", rel, node),
    }
}

fn render_predicate(predicate: &Predicate, prefix: &str) -> String {
    match predicate {
        Predicate::PropertyEquals { var, key, param } => {
            format!("{}.{} = ${}{}", var, key, prefix, param)
        }
        Predicate::SameProperty { var, other, key } => {
            format!("{}.{} = {}.{}", var, key, other, key)
        }
        Predicate::RelationshipIs { var, rel_type } => format!("type({}) = '{}'", var, rel_type),
        Predicate::IdEquals { var, param } => format!("id({}) = ${}{}", var, prefix, param),
        Predicate::IdNotEquals { var, param } => format!("id({}) <> ${}{}", var, prefix, param),
        Predicate::NotConnected { from, rel_type, to } => {
            format!("NOT ({})-[:{}]->({})", from, rel_type, to)
        }
    }
}

fn render_return(item: &ReturnItem) -> String {
    match item {
        ReturnItem::Property { var, key, alias } => format!("{}.{} AS {}", var, key, alias),
        ReturnItem::Id { var, alias } => format!("id({}) AS {}", var, alias),
        ReturnItem::Joined {
            var,
            keys,
            separator,
            alias,
        } => {
            let parts: Vec<String> = keys.iter().map(|key| format!("{}.{}", var, key)).collect();
            let glue = format!(" + '{}' + ", separator);
            format!("{} AS {}", parts.join(glue.as_str()), alias)
        }
        ReturnItem::Count { var, alias } => format!("count(DISTINCT {}) AS {}", var, alias),
    }
}

fn render_guard(guard: &Guard) -> CompiledQuery {
    let mut params = Vec::new();
    let text = format!(
        "{} RETURN count(*) AS matches",
        Clauses::of(&guard.query, "", &mut params).head()
    );
    CompiledQuery { text, params }
}

fn render_assignments(
    var: &str,
    assignments: &Assignments,
    params: &mut Vec<(String, Value)>,
    separator: &str,
) -> Vec<String> {
    assignments
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let name = format!("v{}", i);
            params.push((name.clone(), value.clone()));
            format!("{}{}{}${}", var, key, separator, name)
        })
        .collect()
}

fn selector_var(selector: &NodeSelector) -> &str {
    match selector {
        NodeSelector::Created(var) | NodeSelector::Matched { var, .. } => var,
    }
}

fn render_step(step: &Step) -> CompiledQuery {
    let mut params = Vec::new();
    let text = match step {
        Step::Guard(guard) => return render_guard(guard),
        Step::CreateNode {
            var,
            label,
            properties,
        } => {
            let fields = render_assignments("", properties, &mut params, ": ");
            format!(
                "CREATE ({}:{} {{{}}}) RETURN id({}) AS id",
                var,
                label,
                fields.join(", "),
                var
            )
        }
        Step::SetProperties {
            target,
            assignments,
        } => {
            let head = Clauses::selector(target, "", &mut params).head();
            let var = format!("{}.", selector_var(target));
            let sets = render_assignments(&var, assignments, &mut params, " = ");
            format!("{} SET {}", head, sets.join(", "))
        }
        Step::CreateEdge { from, rel_type, to } => {
            let head = Clauses::selector(from, "from_", &mut params)
                .merge(Clauses::selector(to, "to_", &mut params))
                .head();
            format!(
                "{} CREATE ({})-[:{}]->({})",
                head,
                selector_var(from),
                rel_type,
                selector_var(to)
            )
        }
        Step::DeleteEdges { from, rel_types } => {
            let head = Clauses::selector(from, "", &mut params).head();
            let types: Vec<&str> = rel_types.iter().map(|t| t.as_str()).collect();
            format!(
                "{} MATCH ({})-[rel:{}]->() DELETE rel",
                head,
                selector_var(from),
                types.join("|")
            )
        }
        Step::DetachDelete { target } => {
            let head = Clauses::selector(target, "", &mut params).head();
            format!("{} DETACH DELETE {}", head, selector_var(target))
        }
    };
    CompiledQuery { text, params }
}
