//! Predicate Compiler
//!
//! Converts each `(field, value)` filter into a graph [`Predicate`]:
//!
//! - `position` constrains the *type* of the relationship bound between
//!   employee and department: exactly `"manager"` selects `MANAGES`, any
//!   other value selects `WORKS_IN`.
//! - `age` is bound as an integer parameter; a non-numeric value is invalid.
//! - `firstName`/`lastName` compare the employee node, `name` the department
//!   node, by exact string equality.
//!
//! Values are always bound as parameters. Fields that have no binding in the
//! current [`Scope`] (e.g. `age` on the department listing) are skipped.

use super::filter::{Field, FilterSet};
use super::traversal::{Params, Predicate, Var};
use super::QueryError;
use crate::models::{PropertyKey, RelType};

/// The pattern variables a filter may target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub employee: Option<Var>,
    pub department: Option<Var>,
    /// Untyped relationship between `employee` and `department`
    pub relationship: Option<Var>,
}

impl Scope {
    /// Scope with only a department bound
    pub fn department(var: Var) -> Self {
        Self {
            employee: None,
            department: Some(var),
            relationship: None,
        }
    }
}

/// Relationship type selected by a `position` filter value (case-sensitive)
pub fn relationship_for_position(value: &str) -> RelType {
    if value == "manager" {
        RelType::Manages
    } else {
        RelType::WorksIn
    }
}

/// Compile a single filter, binding its value into `params`.
///
/// Returns `Ok(None)` when the field does not apply in `scope`.
pub fn compile_filter(
    field: Field,
    value: &str,
    scope: &Scope,
    params: &mut Params,
) -> Result<Option<Predicate>, QueryError> {
    let predicate = match field {
        Field::Position => scope.relationship.map(|var| Predicate::RelationshipIs {
            var,
            rel_type: relationship_for_position(value),
        }),
        Field::Age => match scope.employee {
            Some(var) => {
                let age: i64 = value.parse().map_err(|_| QueryError::InvalidLiteral {
                    field,
                    value: value.to_string(),
                })?;
                Some(Predicate::PropertyEquals {
                    var,
                    key: PropertyKey::Age,
                    param: params.bind(age),
                })
            }
            None => None,
        },
        Field::FirstName => scope
            .employee
            .map(|var| string_equals(var, PropertyKey::FirstName, value, params)),
        Field::LastName => scope
            .employee
            .map(|var| string_equals(var, PropertyKey::LastName, value, params)),
        Field::Name => scope
            .department
            .map(|var| string_equals(var, PropertyKey::Name, value, params)),
    };
    Ok(predicate)
}

/// Compile every filter in supplied order; the results combine with AND.
pub fn compile(
    filters: &FilterSet,
    scope: &Scope,
    params: &mut Params,
) -> Result<Vec<Predicate>, QueryError> {
    let mut predicates = Vec::with_capacity(filters.len());
    for (field, value) in filters.iter() {
        if let Some(predicate) = compile_filter(field, value, scope, params)? {
            predicates.push(predicate);
        }
    }
    Ok(predicates)
}

fn string_equals(var: Var, key: PropertyKey, value: &str, params: &mut Params) -> Predicate {
    Predicate::PropertyEquals {
        var,
        key,
        param: params.bind(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;

    const LISTING: Scope = Scope {
        employee: Some("e"),
        department: Some("d"),
        relationship: Some("r"),
    };

    #[test]
    fn test_position_manager_constrains_relationship_type() {
        let mut params = Params::new();
        let predicate = compile_filter(Field::Position, "manager", &LISTING, &mut params)
            .unwrap()
            .unwrap();

        assert_eq!(
            predicate,
            Predicate::RelationshipIs {
                var: "r",
                rel_type: RelType::Manages
            }
        );
        assert!(params.is_empty(), "relationship type is not a bound value");
    }

    #[test]
    fn test_position_other_values_select_works_in() {
        for value in ["engineer", "Manager", "MANAGER", "managers", " manager"] {
            let mut params = Params::new();
            let predicate = compile_filter(Field::Position, value, &LISTING, &mut params)
                .unwrap()
                .unwrap();
            assert_eq!(
                predicate,
                Predicate::RelationshipIs {
                    var: "r",
                    rel_type: RelType::WorksIn
                },
                "value {:?}",
                value
            );
        }
    }

    #[test]
    fn test_age_binds_integer_parameter() {
        let mut params = Params::new();
        let predicate = compile_filter(Field::Age, "41", &LISTING, &mut params)
            .unwrap()
            .unwrap();

        match predicate {
            Predicate::PropertyEquals { var, key, param } => {
                assert_eq!(var, "e");
                assert_eq!(key, PropertyKey::Age);
                assert_eq!(params.get(&param), Some(&Value::Integer(41)));
            }
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_age_is_invalid() {
        let mut params = Params::new();
        let err = compile_filter(Field::Age, "forty", &LISTING, &mut params).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidLiteral {
                field: Field::Age,
                value: "forty".into()
            }
        );

        let err = compile_filter(Field::Age, "41' OR '1'='1", &LISTING, &mut params).unwrap_err();
        assert!(matches!(err, QueryError::InvalidLiteral { .. }));
    }

    #[test]
    fn test_string_fields_target_their_node() {
        let mut params = Params::new();
        let first = compile_filter(Field::FirstName, "Ada", &LISTING, &mut params)
            .unwrap()
            .unwrap();
        let name = compile_filter(Field::Name, "Sales", &LISTING, &mut params)
            .unwrap()
            .unwrap();

        assert!(matches!(
            first,
            Predicate::PropertyEquals { var: "e", key: PropertyKey::FirstName, .. }
        ));
        assert!(matches!(
            name,
            Predicate::PropertyEquals { var: "d", key: PropertyKey::Name, .. }
        ));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_hostile_values_stay_in_parameters() {
        let mut params = Params::new();
        let value = "x' OR 1=1 //";
        let predicate = compile_filter(Field::LastName, value, &LISTING, &mut params)
            .unwrap()
            .unwrap();

        match predicate {
            Predicate::PropertyEquals { param, .. } => {
                assert_eq!(params.get(&param), Some(&Value::from(value)));
                assert!(!param.contains('\''));
            }
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn test_department_scope_skips_employee_fields() {
        let filters = FilterSet::new()
            .with(Field::Age, "not-a-number")
            .with(Field::Position, "manager")
            .with(Field::FirstName, "Ada")
            .with(Field::Name, "Sales");
        let mut params = Params::new();

        let predicates = compile(&filters, &Scope::department("d"), &mut params).unwrap();
        assert_eq!(predicates.len(), 1);
        assert!(matches!(
            predicates[0],
            Predicate::PropertyEquals { var: "d", key: PropertyKey::Name, .. }
        ));
    }

    #[test]
    fn test_compile_keeps_supplied_order() {
        let filters = FilterSet::new()
            .with(Field::Position, "manager")
            .with(Field::LastName, "Lovelace")
            .with(Field::Age, "36");
        let mut params = Params::new();

        let predicates = compile(&filters, &LISTING, &mut params).unwrap();
        assert!(matches!(predicates[0], Predicate::RelationshipIs { .. }));
        assert!(matches!(
            predicates[1],
            Predicate::PropertyEquals { key: PropertyKey::LastName, .. }
        ));
        assert!(matches!(
            predicates[2],
            Predicate::PropertyEquals { key: PropertyKey::Age, .. }
        ));
    }
}
