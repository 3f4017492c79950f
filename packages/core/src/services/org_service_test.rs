//! Tests for OrgService
//!
//! These tests run every operation against a seeded in-memory SurrealStore:
//!
//! - Engineering: Ada Lovelace (36, manager), Grace Hopper (45), Linus Torvalds (28)
//! - Sales: Ken Thompson (52, manager), Barbara Liskov (30)
//! - Ops: nobody

#[cfg(test)]
mod tests {
    use crate::db::{NodeId, SurrealStore};
    use crate::models::{Employee, EmployeeUpdate, Label, NewEmployee, RelType};
    use crate::services::{ErrorKind, OrgService};
    use std::sync::Arc;

    struct Org {
        ada: NodeId,
        grace: NodeId,
        linus: NodeId,
        ken: NodeId,
        barbara: NodeId,
    }

    /// Helper to create a seeded service
    /// Returns (service, store, ids) - the store is shared with the service
    async fn create_test_service() -> (OrgService<SurrealStore>, Arc<SurrealStore>, Org) {
        let store = Arc::new(SurrealStore::in_memory().await.unwrap());
        for name in ["Engineering", "Sales", "Ops"] {
            store.create_department(name).await.unwrap();
        }
        let service = OrgService::new(store.clone());

        let add = |first: &str, last: &str, age: i64, department: &str| {
            NewEmployee::new(first, last, age, department)
        };
        let org = Org {
            ada: service
                .create_employee(&add("Ada", "Lovelace", 36, "Engineering").with_position("manager"))
                .await
                .unwrap(),
            grace: service
                .create_employee(&add("Grace", "Hopper", 45, "Engineering"))
                .await
                .unwrap(),
            linus: service
                .create_employee(&add("Linus", "Torvalds", 28, "Engineering"))
                .await
                .unwrap(),
            ken: service
                .create_employee(&add("Ken", "Thompson", 52, "Sales").with_position("Manager"))
                .await
                .unwrap(),
            barbara: service
                .create_employee(&add("Barbara", "Liskov", 30, "Sales"))
                .await
                .unwrap(),
        };

        (service, store, org)
    }

    fn first_names(employees: &[Employee]) -> Vec<&str> {
        let mut names: Vec<&str> = employees.iter().map(|e| e.first_name.as_str()).collect();
        names.sort();
        names
    }

    const NO_PARAMS: [(&str, &str); 0] = [];

    #[tokio::test]
    async fn test_list_employees_without_filters_returns_each_once() {
        let (service, _store, _org) = create_test_service().await;

        let employees = service.list_employees(NO_PARAMS).await.unwrap();
        assert_eq!(
            first_names(&employees),
            vec!["Ada", "Barbara", "Grace", "Ken", "Linus"]
        );
    }

    #[tokio::test]
    async fn test_position_filter_selects_relationship_type() {
        let (service, _store, _org) = create_test_service().await;

        let managers = service
            .list_employees([("position", "manager")])
            .await
            .unwrap();
        assert_eq!(first_names(&managers), vec!["Ada", "Ken"]);

        let staff = service
            .list_employees([("position", "engineer")])
            .await
            .unwrap();
        assert_eq!(staff.len(), 5, "every employee has a WORKS_IN edge");

        let capitalized = service
            .list_employees([("position", "Manager")])
            .await
            .unwrap();
        assert_eq!(capitalized.len(), 5, "filter match is case-sensitive");
    }

    #[tokio::test]
    async fn test_age_filter() {
        let (service, _store, org) = create_test_service().await;

        let employees = service.list_employees([("age", "45")]).await.unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, org.grace);

        let err = service
            .list_employees([("age", "forty-five")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_filters_combine_with_and() {
        let (service, _store, org) = create_test_service().await;

        let employees = service
            .list_employees([("name", "Sales"), ("position", "staff")])
            .await
            .unwrap();
        assert_eq!(employees.len(), 2, "Ken also WORKS_IN Sales");

        let employees = service
            .list_employees([("name", "Sales"), ("position", "manager")])
            .await
            .unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, org.ken);
    }

    #[tokio::test]
    async fn test_sort_by_age_is_descending() {
        let (service, _store, _org) = create_test_service().await;

        let employees = service.list_employees([("sort", "age")]).await.unwrap();
        let ages: Vec<i64> = employees.iter().map(|e| e.age).collect();
        assert_eq!(ages, vec![52, 45, 36, 30, 28]);
    }

    #[tokio::test]
    async fn test_unsupported_sort_is_invalid_input() {
        let (service, _store, _org) = create_test_service().await;

        for sort in ["salary", "employeeCount"] {
            let err = service.list_employees([("sort", sort)]).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "sort={}", sort);
        }
        let err = service
            .list_departments([("sort", "age")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_unknown_filter_keys_do_not_restrict() {
        let (service, _store, org) = create_test_service().await;

        let employees = service
            .list_employees([("salary", "100"), ("lastName", "Hopper")])
            .await
            .unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, org.grace);
    }

    #[tokio::test]
    async fn test_partial_legacy_filter_is_empty_result() {
        let (service, _store, _org) = create_test_service().await;

        let err = service.list_employees([("filter", "age")]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);

        let employees = service
            .list_employees([("filter", "lastName"), ("value", "Liskov")])
            .await
            .unwrap();
        assert_eq!(employees.len(), 1);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_result() {
        let (service, _store, _org) = create_test_service().await;

        let err = service
            .list_employees([("firstName", "Nobody")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_list_departments_counts_and_omits_empty_departments() {
        let (service, _store, _org) = create_test_service().await;

        let departments = service
            .list_departments([("sort", "employeeCount")])
            .await
            .unwrap();
        let summary: Vec<(&str, i64)> = departments
            .iter()
            .map(|d| (d.name.as_str(), d.employee_count))
            .collect();
        assert_eq!(summary, vec![("Engineering", 3), ("Sales", 2)]);
    }

    #[tokio::test]
    async fn test_list_departments_ignores_employee_filters() {
        let (service, _store, _org) = create_test_service().await;

        let departments = service
            .list_departments([("name", "Sales"), ("age", "not-a-number"), ("position", "manager")])
            .await
            .unwrap();
        assert_eq!(departments.len(), 1);
        assert_eq!(departments[0].employee_count, 2);
    }

    #[tokio::test]
    async fn test_employee_department_summary() {
        let (service, store, org) = create_test_service().await;

        let summary = service.employee_department(org.linus).await.unwrap();
        assert_eq!(summary.name, "Engineering");
        assert_eq!(summary.employee_count, 3);
        assert_eq!(summary.manager, "Ada Lovelace");
        assert_eq!(Some(summary.id), store.department_id("Engineering").await.unwrap());

        let summary = service.employee_department(org.ken).await.unwrap();
        assert_eq!(summary.manager, "Ken Thompson");
    }

    #[tokio::test]
    async fn test_employee_department_without_manager_is_empty() {
        let (service, _store, _org) = create_test_service().await;
        let id = service
            .create_employee(&NewEmployee::new("Dennis", "Ritchie", 40, "Ops"))
            .await
            .unwrap();

        let err = service.employee_department(id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_subordinates() {
        let (service, _store, org) = create_test_service().await;

        let subordinates = service.subordinates(org.ada).await.unwrap();
        assert_eq!(first_names(&subordinates), vec!["Grace", "Linus"]);

        let err = service.subordinates(org.grace).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_department_employees() {
        let (service, store, _org) = create_test_service().await;
        let sales = store.department_id("Sales").await.unwrap().unwrap();

        let employees = service.department_employees(sales).await.unwrap();
        assert_eq!(first_names(&employees), vec!["Barbara", "Ken"]);

        let ops = store.department_id("Ops").await.unwrap().unwrap();
        let err = service.department_employees(ops).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_create_conflicts() {
        let (service, store, _org) = create_test_service().await;

        let duplicate = NewEmployee::new("Grace", "Hopper", 45, "Sales");
        let err = service.create_employee(&duplicate).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let missing_department = NewEmployee::new("Dennis", "Ritchie", 40, "Research");
        let err = service
            .create_employee(&missing_department)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let second_manager =
            NewEmployee::new("Dennis", "Ritchie", 40, "Sales").with_position("manager");
        let err = service.create_employee(&second_manager).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(store.node_count(Label::Employee).await.unwrap(), 5);
        assert_eq!(store.edge_count(RelType::WorksIn).await.unwrap(), 5);
        assert_eq!(store.edge_count(RelType::Manages).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_with_missing_field_is_invalid_input() {
        let (service, _store, _org) = create_test_service().await;
        let input = NewEmployee {
            department: None,
            ..NewEmployee::new("Dennis", "Ritchie", 40, "Ops")
        };

        let err = service.create_employee(&input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_edit_missing_employee_is_not_found() {
        let (service, _store, _org) = create_test_service().await;
        let update = EmployeeUpdate {
            age: Some(99),
            ..Default::default()
        };

        let err = service
            .edit_employee(NodeId::new(999), &update)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_edit_missing_employee_with_position_only_is_not_found() {
        let (service, store, _org) = create_test_service().await;
        let update = EmployeeUpdate {
            position: Some("manager".into()),
            ..Default::default()
        };

        let err = service
            .edit_employee(NodeId::new(999), &update)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.edge_count(RelType::Manages).await.unwrap(), 2);

        let blank = EmployeeUpdate {
            first_name: Some("  ".into()),
            ..Default::default()
        };
        let err = service
            .edit_employee(NodeId::new(999), &blank)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_empty_edit_only_checks_existence() {
        let (service, _store, org) = create_test_service().await;
        let update = EmployeeUpdate::default();

        service.edit_employee(org.grace, &update).await.unwrap();
        let err = service
            .edit_employee(NodeId::new(999), &update)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_edit_position_without_department_is_invalid_input() {
        let (service, store, org) = create_test_service().await;
        let update = EmployeeUpdate {
            first_name: Some("Gracie".into()),
            position: Some("manager".into()),
            ..Default::default()
        };

        let err = service.edit_employee(org.grace, &update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(store.edge_count(RelType::Manages).await.unwrap(), 2);

        let employees = service
            .list_employees([("firstName", "Grace")])
            .await
            .unwrap();
        assert_eq!(employees.len(), 1, "no partial property update");
    }

    #[tokio::test]
    async fn test_edit_properties_only_keeps_relationships() {
        let (service, store, org) = create_test_service().await;
        let update = EmployeeUpdate {
            age: Some(37),
            ..Default::default()
        };

        service.edit_employee(org.ada, &update).await.unwrap();

        let employees = service.list_employees([("age", "37")]).await.unwrap();
        assert_eq!(employees[0].id, org.ada);
        assert_eq!(employees[0].first_name, "Ada");
        assert_eq!(store.edges_from(org.ada).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_into_missing_department_rolls_back() {
        let (service, store, org) = create_test_service().await;
        let update = EmployeeUpdate {
            last_name: Some("Byron".into()),
            department: Some("Research".into()),
            ..Default::default()
        };

        let err = service.edit_employee(org.ada, &update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = service
            .list_employees([("lastName", "Byron")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
        assert_eq!(store.edges_from(org.ada).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_identity_collision_is_conflict() {
        let (service, _store, org) = create_test_service().await;
        let update = EmployeeUpdate {
            first_name: Some("Grace".into()),
            last_name: Some("Hopper".into()),
            age: Some(45),
            ..Default::default()
        };
        let err = service.edit_employee(org.linus, &update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let same_values = EmployeeUpdate {
            first_name: Some("Grace".into()),
            ..Default::default()
        };
        service.edit_employee(org.grace, &same_values).await.unwrap();
    }

    #[tokio::test]
    async fn test_edit_promotes_to_manager_of_new_department() {
        let (service, store, org) = create_test_service().await;
        let ops = store.department_id("Ops").await.unwrap().unwrap();
        let update = EmployeeUpdate {
            position: Some("MANAGER".into()),
            department: Some("Ops".into()),
            ..Default::default()
        };

        service.edit_employee(org.barbara, &update).await.unwrap();

        let mut edges = store.edges_from(org.barbara).await.unwrap();
        edges.sort();
        assert_eq!(edges, vec![(RelType::WorksIn, ops), (RelType::Manages, ops)]);

        let taken = EmployeeUpdate {
            position: Some("manager".into()),
            department: Some("Ops".into()),
            ..Default::default()
        };
        let err = service.edit_employee(org.grace, &taken).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        service.edit_employee(org.barbara, &taken).await.unwrap();
        assert_eq!(store.edge_count(RelType::Manages).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_staff_keeps_department() {
        let (service, store, org) = create_test_service().await;

        service.delete_employee(org.linus).await.unwrap();

        assert!(!store.contains_node(org.linus).await.unwrap());
        assert!(store.department_id("Engineering").await.unwrap().is_some());
        let summary = service.employee_department(org.grace).await.unwrap();
        assert_eq!(summary.employee_count, 2);
    }

    #[tokio::test]
    async fn test_delete_missing_employee_is_not_found() {
        let (service, _store, org) = create_test_service().await;

        service.delete_employee(org.linus).await.unwrap();
        let err = service.delete_employee(org.linus).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
