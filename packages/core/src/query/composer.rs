//! Query Composer
//!
//! One traversal query per read operation, plus the small lookup
//! queries the mutation planner uses for guards and node selection.
//!
//! Every query here is assembled from fixed pattern variables, closed-enum
//! labels/types/keys and bound parameters; nothing a caller sends is
//! spliced into structure.

use super::filter::{ListParams, SortField};
use super::predicate::{self, Scope};
use super::traversal::{Chain, Params, Predicate, ReturnItem, TraversalQuery, Var};
use super::QueryError;
use crate::db::NodeId;
use crate::models::{Label, PropertyKey, RelType};

pub const EMPLOYEE: Var = "e";
pub const DEPARTMENT: Var = "d";
pub const RELATIONSHIP: Var = "r";
pub const MANAGER: Var = "m";
pub const SUBORDINATE: Var = "s";
pub const MEMBER: Var = "x";
pub const OTHER: Var = "o";

/// Output column names
pub mod columns {
    pub const ID: &str = "id";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const AGE: &str = "age";
    pub const NAME: &str = "name";
    pub const EMPLOYEE_COUNT: &str = "employeeCount";
    pub const MANAGER: &str = "manager";
}

/// Sort fields the employee listings project
pub const EMPLOYEE_SORTS: [SortField; 3] =
    [SortField::FirstName, SortField::LastName, SortField::Age];

/// Sort fields the department listing projects
pub const DEPARTMENT_SORTS: [SortField; 2] = [SortField::Name, SortField::EmployeeCount];

/// `MATCH (e:Employee)-[r]->(d:Department)` filtered by the compiled
/// predicates, one distinct row per employee.
pub fn list_employees(params: &ListParams) -> Result<TraversalQuery, QueryError> {
    let sort = check_sort(params.sort, &EMPLOYEE_SORTS, "employees")?;
    let scope = Scope {
        employee: Some(EMPLOYEE),
        department: Some(DEPARTMENT),
        relationship: Some(RELATIONSHIP),
    };
    let mut bound = Params::new();
    let predicates = predicate::compile(&params.filters, &scope, &mut bound)?;

    let query = TraversalQuery::matching(
        Chain::start(EMPLOYEE, Label::Employee).outgoing_any(
            RELATIONSHIP,
            DEPARTMENT,
            Label::Department,
        ),
    )
    .with_params(bound)
    .filters(predicates);

    Ok(ordered(employee_projection(query, EMPLOYEE).distinct(), sort))
}

/// `MATCH (d:Department)<-[:WORKS_IN]-(e:Employee)` with a per-department
/// headcount. Only department fields filter here; departments without any
/// WORKS_IN edge do not appear.
pub fn list_departments(params: &ListParams) -> Result<TraversalQuery, QueryError> {
    let sort = check_sort(params.sort, &DEPARTMENT_SORTS, "departments")?;
    let mut bound = Params::new();
    let predicates = predicate::compile(&params.filters, &Scope::department(DEPARTMENT), &mut bound)?;

    let query = TraversalQuery::matching(Chain::start(DEPARTMENT, Label::Department).incoming(
        RelType::WorksIn,
        EMPLOYEE,
        Label::Employee,
    ))
    .with_params(bound)
    .filters(predicates)
    .returning(ReturnItem::Id {
        var: DEPARTMENT,
        alias: columns::ID,
    })
    .returning(ReturnItem::Property {
        var: DEPARTMENT,
        key: PropertyKey::Name,
        alias: columns::NAME,
    })
    .returning(ReturnItem::Count {
        var: EMPLOYEE,
        alias: columns::EMPLOYEE_COUNT,
    });

    Ok(ordered(query, sort))
}

/// The department an employee works in, its full headcount and its
/// manager's name. Matches nothing when the employee has no department or
/// the department has no manager.
pub fn employee_department(employee_id: NodeId) -> TraversalQuery {
    TraversalQuery::matching(
        Chain::start(EMPLOYEE, Label::Employee)
            .outgoing(RelType::WorksIn, DEPARTMENT, Label::Department)
            .incoming(RelType::Manages, MANAGER, Label::Employee),
    )
    .also_matching(Chain::start(MEMBER, Label::Employee).outgoing(
        RelType::WorksIn,
        DEPARTMENT,
        Label::Department,
    ))
    .where_id(EMPLOYEE, employee_id)
    .returning(ReturnItem::Id {
        var: DEPARTMENT,
        alias: columns::ID,
    })
    .returning(ReturnItem::Property {
        var: DEPARTMENT,
        key: PropertyKey::Name,
        alias: columns::NAME,
    })
    .returning(ReturnItem::Count {
        var: MEMBER,
        alias: columns::EMPLOYEE_COUNT,
    })
    .returning(ReturnItem::Joined {
        var: MANAGER,
        keys: vec![PropertyKey::FirstName, PropertyKey::LastName],
        separator: " ",
        alias: columns::MANAGER,
    })
}

/// Everyone who works in the department `manager_id` manages, except
/// anyone who also manages it.
pub fn subordinates(manager_id: NodeId) -> TraversalQuery {
    let query = TraversalQuery::matching(
        Chain::start(MANAGER, Label::Employee)
            .outgoing(RelType::Manages, DEPARTMENT, Label::Department)
            .incoming(RelType::WorksIn, SUBORDINATE, Label::Employee),
    )
    .where_id(MANAGER, manager_id)
    .filter(Predicate::NotConnected {
        from: SUBORDINATE,
        rel_type: RelType::Manages,
        to: DEPARTMENT,
    });

    employee_projection(query, SUBORDINATE)
}

/// Everyone with a WORKS_IN edge to the given department
pub fn department_employees(department_id: NodeId) -> TraversalQuery {
    let query = TraversalQuery::matching(Chain::start(EMPLOYEE, Label::Employee).outgoing(
        RelType::WorksIn,
        DEPARTMENT,
        Label::Department,
    ))
    .where_id(DEPARTMENT, department_id);

    employee_projection(query, EMPLOYEE)
}

// ========== Lookups used by the mutation planner ==========

/// `(e:Employee)` with the given identifier
pub fn employee_by_id(id: NodeId) -> TraversalQuery {
    TraversalQuery::matching(Chain::start(EMPLOYEE, Label::Employee))
        .where_id(EMPLOYEE, id)
        .returning(id_column(EMPLOYEE))
}

/// `(d:Department)` with the given name
pub fn department_by_name(name: &str) -> TraversalQuery {
    TraversalQuery::matching(Chain::start(DEPARTMENT, Label::Department))
        .where_property(DEPARTMENT, PropertyKey::Name, name)
        .returning(id_column(DEPARTMENT))
}

/// `(e:Employee)` holding exactly this `(firstName, lastName, age)` key
pub fn employee_by_identity(first_name: &str, last_name: &str, age: i64) -> TraversalQuery {
    TraversalQuery::matching(Chain::start(EMPLOYEE, Label::Employee))
        .where_property(EMPLOYEE, PropertyKey::FirstName, first_name)
        .where_property(EMPLOYEE, PropertyKey::LastName, last_name)
        .where_property(EMPLOYEE, PropertyKey::Age, age)
        .returning(id_column(EMPLOYEE))
}

/// Any employee other than `id` whose identity key would equal `id`'s key
/// after applying the supplied values. Unsupplied parts compare against
/// `id`'s current value.
pub fn identity_collision(
    id: NodeId,
    first_name: Option<&str>,
    last_name: Option<&str>,
    age: Option<i64>,
) -> TraversalQuery {
    let mut query = TraversalQuery::matching(Chain::start(EMPLOYEE, Label::Employee))
        .also_matching(Chain::start(OTHER, Label::Employee))
        .where_id(EMPLOYEE, id)
        .where_id_not(OTHER, id);

    query = match first_name {
        Some(value) => query.where_property(OTHER, PropertyKey::FirstName, value),
        None => query.filter(same_as_employee(PropertyKey::FirstName)),
    };
    query = match last_name {
        Some(value) => query.where_property(OTHER, PropertyKey::LastName, value),
        None => query.filter(same_as_employee(PropertyKey::LastName)),
    };
    query = match age {
        Some(value) => query.where_property(OTHER, PropertyKey::Age, value),
        None => query.filter(same_as_employee(PropertyKey::Age)),
    };

    query.returning(id_column(OTHER))
}

/// `(m:Employee)-[:MANAGES]->(d:Department {name})`, optionally ignoring one employee
pub fn department_manager(department: &str, excluding: Option<NodeId>) -> TraversalQuery {
    let query = TraversalQuery::matching(Chain::start(MANAGER, Label::Employee).outgoing(
        RelType::Manages,
        DEPARTMENT,
        Label::Department,
    ))
    .where_property(DEPARTMENT, PropertyKey::Name, department);

    let query = match excluding {
        Some(id) => query.where_id_not(MANAGER, id),
        None => query,
    };
    query.returning(id_column(MANAGER))
}

/// Departments the given employee manages (zero or one)
pub fn departments_managed_by(employee_id: NodeId) -> TraversalQuery {
    TraversalQuery::matching(Chain::start(EMPLOYEE, Label::Employee).outgoing(
        RelType::Manages,
        DEPARTMENT,
        Label::Department,
    ))
    .where_id(EMPLOYEE, employee_id)
    .returning(id_column(DEPARTMENT))
}

fn check_sort(
    sort: Option<SortField>,
    allowed: &[SortField],
    listing: &'static str,
) -> Result<Option<SortField>, QueryError> {
    match sort {
        Some(field) if !allowed.contains(&field) => {
            Err(QueryError::UnsupportedSort { field, listing })
        }
        other => Ok(other),
    }
}

fn ordered(query: TraversalQuery, sort: Option<SortField>) -> TraversalQuery {
    match sort {
        Some(field) => query.order_by_desc(field.alias()),
        None => query,
    }
}

fn id_column(var: Var) -> ReturnItem {
    ReturnItem::Id {
        var,
        alias: columns::ID,
    }
}

fn same_as_employee(key: PropertyKey) -> Predicate {
    Predicate::SameProperty {
        var: OTHER,
        other: EMPLOYEE,
        key,
    }
}

fn employee_projection(query: TraversalQuery, var: Var) -> TraversalQuery {
    query
        .returning(id_column(var))
        .returning(ReturnItem::Property {
            var,
            key: PropertyKey::FirstName,
            alias: columns::FIRST_NAME,
        })
        .returning(ReturnItem::Property {
            var,
            key: PropertyKey::LastName,
            alias: columns::LAST_NAME,
        })
        .returning(ReturnItem::Property {
            var,
            key: PropertyKey::Age,
            alias: columns::AGE,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::normalize;
    use crate::query::traversal::Direction;

    #[test]
    fn test_list_employees_binds_untyped_relationship() {
        let query = list_employees(&ListParams::default()).unwrap();

        assert_eq!(query.pattern.len(), 1);
        let hop = &query.pattern[0].hops[0];
        assert_eq!(hop.rel_var, Some(RELATIONSHIP));
        assert_eq!(hop.rel_type, None);
        assert_eq!(hop.direction, Direction::Outgoing);
        assert!(query.distinct);
        assert!(query.predicates.is_empty());
        assert_eq!(query.order_by, None);
    }

    #[test]
    fn test_list_employees_position_filter_targets_relationship() {
        let params = normalize([("position", "manager")]).unwrap();
        let query = list_employees(&params).unwrap();

        assert_eq!(
            query.predicates,
            vec![Predicate::RelationshipIs {
                var: RELATIONSHIP,
                rel_type: RelType::Manages
            }]
        );
    }

    #[test]
    fn test_list_employees_sort_is_descending_on_column() {
        let params = normalize([("sort", "age")]).unwrap();
        let query = list_employees(&params).unwrap();
        assert_eq!(query.order_by, Some("age"));
    }

    #[test]
    fn test_list_employees_rejects_department_sort() {
        let params = normalize([("sort", "employeeCount")]).unwrap();
        let err = list_employees(&params).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnsupportedSort {
                field: SortField::EmployeeCount,
                listing: "employees"
            }
        );
    }

    #[test]
    fn test_list_departments_aggregates_headcount() {
        let params = normalize([("name", "Sales"), ("age", "x"), ("sort", "employeeCount")])
            .unwrap();
        let query = list_departments(&params).unwrap();

        assert_eq!(query.predicates.len(), 1);
        assert!(query.returns.iter().any(ReturnItem::is_aggregate));
        assert_eq!(query.order_by, Some("employeeCount"));
    }

    #[test]
    fn test_subordinates_excludes_co_managers() {
        let query = subordinates(NodeId::new(3));
        assert!(query.predicates.contains(&Predicate::NotConnected {
            from: SUBORDINATE,
            rel_type: RelType::Manages,
            to: DEPARTMENT,
        }));
        assert_eq!(query.returns.len(), 4);
    }

    #[test]
    fn test_employee_department_counts_separately() {
        let query = employee_department(NodeId::new(1));
        assert_eq!(query.pattern.len(), 2);
        assert_eq!(query.bound_vars(), vec![EMPLOYEE, DEPARTMENT, MANAGER, MEMBER]);
    }

    #[test]
    fn test_identity_collision_mixes_supplied_and_current_values() {
        let query = identity_collision(NodeId::new(5), Some("Ada"), None, None);

        let same: Vec<_> = query
            .predicates
            .iter()
            .filter(|p| matches!(p, Predicate::SameProperty { .. }))
            .collect();
        assert_eq!(same.len(), 2);
        assert!(query.predicates.contains(&Predicate::PropertyEquals {
            var: OTHER,
            key: PropertyKey::FirstName,
            param: "p2".into(),
        }));
    }
}
