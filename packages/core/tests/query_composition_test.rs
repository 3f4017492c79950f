//! Query Composition Tests
//!
//! Integration tests for the normalizer → predicate compiler → composer
//! pipeline, checked over many filter sets rather than single examples.
//!
//! ## Test Coverage
//! - `position` always constrains relationship type
//! - `age` is numeric-only and exact-match
//! - Caller values never reach rendered query text

#[cfg(test)]
mod query_composition_tests {
    use anyhow::Result;
    use orggraph_core::db::{SurrealStore, Value};
    use orggraph_core::models::{NewEmployee, PropertyKey, RelType};
    use orggraph_core::query::{composer, normalize, Predicate, QueryError};
    use orggraph_core::services::{ErrorKind, OrgService};
    use std::sync::Arc;

    const POSITIONS: [&str; 6] = ["manager", "Manager", "staff", "", "manager ", "MANAGES"];
    const EXTRA: [(&str, &str); 4] = [
        ("firstName", "Ada"),
        ("lastName", "Lovelace"),
        ("name", "Engineering"),
        ("age", "36"),
    ];

    /// Every subset of `EXTRA`, in order, joined with the given pair
    fn filter_sets(pair: (&'static str, &'static str)) -> Vec<Vec<(&'static str, &'static str)>> {
        (0..1u32 << EXTRA.len())
            .map(|mask| {
                let mut set: Vec<_> = EXTRA
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, kv)| *kv)
                    .collect();
                set.insert((mask as usize) % (set.len() + 1), pair);
                set
            })
            .collect()
    }

    #[test]
    fn test_position_never_becomes_a_property_predicate() {
        for position in POSITIONS {
            for set in filter_sets(("position", position)) {
                let params = normalize(set.clone()).unwrap();
                let query = composer::list_employees(&params).unwrap();

                let expected = if position == "manager" {
                    RelType::Manages
                } else {
                    RelType::WorksIn
                };
                let relationship: Vec<_> = query
                    .predicates
                    .iter()
                    .filter_map(|p| match p {
                        Predicate::RelationshipIs { rel_type, .. } => Some(*rel_type),
                        _ => None,
                    })
                    .collect();

                if position.is_empty() {
                    assert!(relationship.is_empty(), "{:?}", set);
                } else {
                    assert_eq!(relationship, vec![expected], "{:?}", set);
                }
                assert!(!query.to_cypher().text.contains(".position"), "{:?}", set);
            }
        }
    }

    #[test]
    fn test_age_is_numeric_exact_match() {
        for age in ["36", "-1", "0", "9001"] {
            for set in filter_sets(("age", age)) {
                let params = normalize(set.clone()).unwrap();
                let query = composer::list_employees(&params).unwrap();
                let expected = Value::Integer(age.parse().unwrap());

                assert!(
                    query.predicates.iter().any(|p| matches!(
                        p,
                        Predicate::PropertyEquals { key: PropertyKey::Age, param, .. }
                            if query.params.get(param) == Some(&expected)
                    )),
                    "{:?}",
                    set
                );
            }
        }

        for age in ["forty", "36.5", "1e3", "36 ", "0x24", "36; DROP"] {
            for set in filter_sets(("age", age)) {
                let params = normalize(set.clone()).unwrap();
                let err = composer::list_employees(&params).unwrap_err();
                assert!(matches!(err, QueryError::InvalidLiteral { .. }), "{:?}", set);
            }
        }
    }

    #[test]
    fn test_values_are_only_parameters() {
        let hostile = [
            "x' OR '1'='1",
            "}) DETACH DELETE n //",
            "Ada\") RETURN 1 //",
        ];
        for value in hostile {
            for key in ["firstName", "lastName", "name"] {
                let params = normalize([(key, value)]).unwrap();
                for query in [
                    composer::list_employees(&params).unwrap(),
                    composer::list_departments(&params).unwrap(),
                ] {
                    let compiled = query.to_cypher();
                    assert!(!compiled.text.contains(value), "{} leaked", value);
                    assert!(compiled
                        .params
                        .iter()
                        .all(|(_, bound)| bound == &Value::from(value)));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_hostile_filters_match_nothing() -> Result<()> {
        let store = Arc::new(SurrealStore::in_memory().await?);
        store.create_department("Engineering").await?;
        let service = OrgService::new(store.clone());
        service
            .create_employee(&NewEmployee::new("Ada", "Lovelace", 36, "Engineering"))
            .await?;

        let err = service
            .list_employees([("lastName", "x' OR '1'='1")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);

        let employees = service
            .list_employees([("e.age", "36"), ("firstName) OR (1", "1")])
            .await?;
        assert_eq!(employees.len(), 1, "unknown keys are dropped, never spliced");
        Ok(())
    }
}
