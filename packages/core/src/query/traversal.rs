//! Traversal Queries
//!
//! A [`TraversalQuery`] is the engine-neutral description of one read: a
//! pattern of node and relationship bindings, predicates over those bindings,
//! a projection and an optional ordering.
//!
//! # Parameter Binding
//!
//! Caller-supplied values never appear in a query's structure. They
//! are bound in [`Params`] under generated names (`p0`, `p1`, ...) and
//! predicates reference them by name. The only tokens that reach query text
//! directly are labels, relationship types and property keys, all drawn from
//! the closed enums in [`crate::models`].
//!
//! # Pattern Semantics
//!
//! A pattern is a list of [`Chain`]s. Each chain behaves like its own `MATCH`
//! clause: chains share variables (a variable bound by an earlier chain
//! constrains later ones) and a relationship may be matched at most once
//! within a single chain.

use crate::db::{NodeId, Value};
use crate::models::{Label, PropertyKey, RelType};
use std::collections::BTreeMap;

/// Pattern variable name
pub type Var = &'static str;

/// Bound parameter values, referenced from predicates by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, Value>,
    next: usize,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under a fresh parameter name and return that name
    pub fn bind(&mut self, value: impl Into<Value>) -> String {
        let name = format!("p{}", self.next);
        self.next += 1;
        self.values.insert(name.clone(), value.into());
        name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `(var:Label)`
#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub var: Var,
    pub label: Label,
}

impl NodePattern {
    pub fn new(var: Var, label: Label) -> Self {
        Self { var, label }
    }
}

/// Direction of a hop relative to the node it starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// One relationship step in a chain
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    /// Variable binding the relationship itself, if predicates need it
    pub rel_var: Option<Var>,
    /// Required relationship type; `None` matches any type
    pub rel_type: Option<RelType>,
    pub direction: Direction,
    pub node: NodePattern,
}

/// A linear path pattern: `(a)-[..]->(b)<-[..]-(c)`
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub start: NodePattern,
    pub hops: Vec<Hop>,
}

impl Chain {
    pub fn start(var: Var, label: Label) -> Self {
        Self {
            start: NodePattern::new(var, label),
            hops: Vec::new(),
        }
    }

    /// `-[:TYPE]->(var:Label)`
    pub fn outgoing(self, rel_type: RelType, var: Var, label: Label) -> Self {
        self.hop(None, Some(rel_type), Direction::Outgoing, var, label)
    }

    /// `<-[:TYPE]-(var:Label)`
    pub fn incoming(self, rel_type: RelType, var: Var, label: Label) -> Self {
        self.hop(None, Some(rel_type), Direction::Incoming, var, label)
    }

    /// `-[rel_var]->(var:Label)` with no type restriction
    pub fn outgoing_any(self, rel_var: Var, var: Var, label: Label) -> Self {
        self.hop(Some(rel_var), None, Direction::Outgoing, var, label)
    }

    fn hop(
        mut self,
        rel_var: Option<Var>,
        rel_type: Option<RelType>,
        direction: Direction,
        var: Var,
        label: Label,
    ) -> Self {
        self.hops.push(Hop {
            rel_var,
            rel_type,
            direction,
            node: NodePattern::new(var, label),
        });
        self
    }

    /// Every variable the chain binds, in pattern order
    pub fn vars(&self) -> Vec<Var> {
        let mut vars = vec![self.start.var];
        for hop in &self.hops {
            if let Some(rel_var) = hop.rel_var {
                vars.push(rel_var);
            }
            vars.push(hop.node.var);
        }
        vars
    }
}

/// Condition restricting which bindings match
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `var.key = $param`
    PropertyEquals {
        var: Var,
        key: PropertyKey,
        param: String,
    },
    /// `var.key = other.key`
    SameProperty {
        var: Var,
        other: Var,
        key: PropertyKey,
    },
    /// `type(var) = 'TYPE'` on a bound relationship
    RelationshipIs { var: Var, rel_type: RelType },
    /// `id(var) = $param`
    IdEquals { var: Var, param: String },
    /// `id(var) <> $param`
    IdNotEquals { var: Var, param: String },
    /// `NOT (from)-[:TYPE]->(to)`
    NotConnected {
        from: Var,
        rel_type: RelType,
        to: Var,
    },
}

/// One projected column
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnItem {
    /// `var.key AS alias`
    Property {
        var: Var,
        key: PropertyKey,
        alias: &'static str,
    },
    /// `id(var) AS alias`
    Id { var: Var, alias: &'static str },
    /// String properties joined with a separator, e.g. a full name
    Joined {
        var: Var,
        keys: Vec<PropertyKey>,
        separator: &'static str,
        alias: &'static str,
    },
    /// `count(DISTINCT var) AS alias`; groups by every non-aggregate column
    Count { var: Var, alias: &'static str },
}

impl ReturnItem {
    pub fn alias(&self) -> &'static str {
        match self {
            ReturnItem::Property { alias, .. }
            | ReturnItem::Id { alias, .. }
            | ReturnItem::Joined { alias, .. }
            | ReturnItem::Count { alias, .. } => alias,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, ReturnItem::Count { .. })
    }
}

/// Complete description of one read
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalQuery {
    pub pattern: Vec<Chain>,
    pub predicates: Vec<Predicate>,
    pub returns: Vec<ReturnItem>,
    pub distinct: bool,
    /// Output column to order by; ordering is always descending
    pub order_by: Option<&'static str>,
    pub params: Params,
}

impl TraversalQuery {
    pub fn matching(chain: Chain) -> Self {
        Self {
            pattern: vec![chain],
            predicates: Vec::new(),
            returns: Vec::new(),
            distinct: false,
            order_by: None,
            params: Params::new(),
        }
    }

    /// Add another chain, evaluated as a separate `MATCH` over shared variables
    pub fn also_matching(mut self, chain: Chain) -> Self {
        self.pattern.push(chain);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    /// Bind `id(var) = id`
    pub fn where_id(mut self, var: Var, id: NodeId) -> Self {
        let param = self.params.bind(id);
        self.predicates.push(Predicate::IdEquals { var, param });
        self
    }

    /// Bind `id(var) <> id`
    pub fn where_id_not(mut self, var: Var, id: NodeId) -> Self {
        let param = self.params.bind(id);
        self.predicates.push(Predicate::IdNotEquals { var, param });
        self
    }

    /// Bind `var.key = value`
    pub fn where_property(mut self, var: Var, key: PropertyKey, value: impl Into<Value>) -> Self {
        let param = self.params.bind(value);
        self.predicates
            .push(Predicate::PropertyEquals { var, key, param });
        self
    }

    pub fn returning(mut self, item: ReturnItem) -> Self {
        self.returns.push(item);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn order_by_desc(mut self, alias: &'static str) -> Self {
        self.order_by = Some(alias);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Every variable bound anywhere in the pattern
    pub fn bound_vars(&self) -> Vec<Var> {
        let mut vars = Vec::new();
        for chain in &self.pattern {
            for var in chain.vars() {
                if !vars.contains(&var) {
                    vars.push(var);
                }
            }
        }
        vars
    }
}
