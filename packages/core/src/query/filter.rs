//! Filter/Sort Normalizer
//!
//! Turns raw key/value request parameters into a typed [`FilterSet`] and an
//! optional [`SortField`].
//!
//! - `sort` is reserved and names the output column to order by.
//! - `filter` + `value` is the legacy single-filter form; supplying only one
//!   half is partial input and makes the set unsatisfiable.
//! - Every other key is a filter field. Keys outside [`Field`], or with an
//!   empty value, are dropped (never fatal) and remembered in
//!   [`FilterSet::rejected_keys`].

use super::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SORT_KEY: &str = "sort";
pub const LEGACY_FIELD_KEY: &str = "filter";
pub const LEGACY_VALUE_KEY: &str = "value";

/// Filterable field; the complete set of names a caller may filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    Age,
    Position,
    Name,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::FirstName,
        Field::LastName,
        Field::Age,
        Field::Position,
        Field::Name,
    ];

    /// Exact, case-sensitive lookup
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Age => "age",
            Field::Position => "position",
            Field::Name => "name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output column a listing can be ordered by (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    FirstName,
    LastName,
    Age,
    Name,
    EmployeeCount,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::FirstName,
        SortField::LastName,
        SortField::Age,
        SortField::Name,
        SortField::EmployeeCount,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.alias() == name)
    }

    /// Column alias this field sorts on
    pub fn alias(&self) -> &'static str {
        match self {
            SortField::FirstName => "firstName",
            SortField::LastName => "lastName",
            SortField::Age => "age",
            SortField::Name => "name",
            SortField::EmployeeCount => "employeeCount",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// Recognized filters in the order they were supplied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<(Field, String)>,
    rejected: Vec<String>,
    partial: bool,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.push(field, value);
        self
    }

    pub fn push(&mut self, field: Field, value: impl Into<String>) {
        self.filters.push((field, value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.filters.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Keys that were dropped because they are unknown or carry no value
    pub fn rejected_keys(&self) -> &[String] {
        &self.rejected
    }

    /// `false` when the input was partial and nothing can match
    pub fn is_satisfiable(&self) -> bool {
        !self.partial
    }
}

/// Normalized parameters for a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub filters: FilterSet,
    pub sort: Option<SortField>,
}

/// Normalize raw request parameters.
///
/// Only an unrecognized `sort` value is an error; filter problems are
/// recorded on the returned set instead.
pub fn normalize<I, K, V>(params: I) -> Result<ListParams, QueryError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut filters = FilterSet::new();
    let mut sort = None;
    let mut legacy_field: Option<String> = None;
    let mut legacy_value: Option<String> = None;

    for (key, value) in params {
        let (key, value) = (key.as_ref(), value.as_ref());
        match key {
            SORT_KEY => {
                if !value.is_empty() {
                    sort = Some(
                        SortField::parse(value)
                            .ok_or_else(|| QueryError::UnknownSortField(value.to_string()))?,
                    );
                }
            }
            LEGACY_FIELD_KEY => legacy_field = Some(value.to_string()),
            LEGACY_VALUE_KEY => legacy_value = Some(value.to_string()),
            _ => match Field::parse(key) {
                Some(field) if !value.is_empty() => filters.push(field, value),
                _ => filters.rejected.push(key.to_string()),
            },
        }
    }

    match (legacy_field, legacy_value) {
        (None, None) => {}
        (Some(name), Some(value)) if !name.is_empty() && !value.is_empty() => {
            match Field::parse(&name) {
                Some(field) => filters.push(field, value),
                None => filters.rejected.push(name),
            }
        }
        _ => filters.partial = true,
    }

    Ok(ListParams { filters, sort })
}
