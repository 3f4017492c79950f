//! Organization Service
//!
//! The public read and write operations over the organizational graph. Each
//! call composes one traversal query or one mutation plan and runs
//! it as exactly one transactional unit on the store handle the service was
//! built with. The service holds no other state and caches nothing.
//!
//! # Read results
//!
//! A read that legitimately matches nothing answers
//! [`OrgServiceError::EmptyResult`], as does a listing whose filter input
//! was partial (a legacy `filter` without `value`); the latter never reaches
//! the store.
//!
//! # Examples
//!
//! ```rust,no_run
//! use orggraph_core::db::SurrealStore;
//! use orggraph_core::models::NewEmployee;
//! use orggraph_core::services::OrgService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(SurrealStore::in_memory().await?);
//!     store.create_department("Engineering").await?;
//!
//!     let service = OrgService::new(store);
//!     let id = service
//!         .create_employee(&NewEmployee::new("Ada", "Lovelace", 36, "Engineering").with_position("manager"))
//!         .await?;
//!
//!     let managers = service.list_employees([("position", "manager")]).await?;
//!     assert_eq!(managers[0].id, id);
//!     Ok(())
//! }
//! ```

use super::error::OrgServiceError;
use super::mutation_planner;
use crate::db::{GraphStore, NodeId, Row, StoreError, TransactionUnit};
use crate::models::{Department, DepartmentSummary, Employee, EmployeeUpdate, NewEmployee};
use crate::query::{composer, normalize, ListParams, MutationPlan, TraversalQuery};
use std::sync::Arc;

/// Organization operations over a [`GraphStore`]
pub struct OrgService<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> Clone for OrgService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GraphStore> OrgService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The store handle every operation runs against
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ========== Reads ==========

    /// List employees matching raw key/value filter parameters.
    ///
    /// Recognized keys are `firstName`, `lastName`, `age`, `position`,
    /// `name` (the employee's department) and `sort`.
    pub async fn list_employees<I, K, V>(&self, params: I) -> Result<Vec<Employee>, OrgServiceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params = normalize(params)?;
        self.list_employees_with(&params).await
    }

    /// List employees for already-normalized parameters
    pub async fn list_employees_with(
        &self,
        params: &ListParams,
    ) -> Result<Vec<Employee>, OrgServiceError> {
        if !params.filters.is_satisfiable() {
            tracing::debug!("list_employees: partial filter input, skipping store");
            return Err(OrgServiceError::empty_result("list_employees"));
        }
        log_rejected("list_employees", params);

        let query = composer::list_employees(params)?;
        let rows = self.read("list_employees", query).await?;
        Ok(rows.iter().map(Employee::from_row).collect::<Result<_, _>>()?)
    }

    /// List departments with their headcounts.
    ///
    /// Only `name` filters apply; `sort` may be `name` or `employeeCount`.
    pub async fn list_departments<I, K, V>(
        &self,
        params: I,
    ) -> Result<Vec<Department>, OrgServiceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params = normalize(params)?;
        self.list_departments_with(&params).await
    }

    pub async fn list_departments_with(
        &self,
        params: &ListParams,
    ) -> Result<Vec<Department>, OrgServiceError> {
        if !params.filters.is_satisfiable() {
            tracing::debug!("list_departments: partial filter input, skipping store");
            return Err(OrgServiceError::empty_result("list_departments"));
        }
        log_rejected("list_departments", params);

        let query = composer::list_departments(params)?;
        let rows = self.read("list_departments", query).await?;
        Ok(rows.iter().map(Department::from_row).collect::<Result<_, _>>()?)
    }

    /// The employee's department with headcount and manager name
    pub async fn employee_department(
        &self,
        employee_id: NodeId,
    ) -> Result<DepartmentSummary, OrgServiceError> {
        let rows = self
            .read("employee_department", composer::employee_department(employee_id))
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| OrgServiceError::empty_result("employee_department"))?;
        Ok(DepartmentSummary::from_row(row)?)
    }

    /// Employees working in the department `manager_id` manages, excluding its managers
    pub async fn subordinates(&self, manager_id: NodeId) -> Result<Vec<Employee>, OrgServiceError> {
        let rows = self
            .read("subordinates", composer::subordinates(manager_id))
            .await?;
        Ok(rows.iter().map(Employee::from_row).collect::<Result<_, _>>()?)
    }

    pub async fn department_employees(
        &self,
        department_id: NodeId,
    ) -> Result<Vec<Employee>, OrgServiceError> {
        let rows = self
            .read(
                "department_employees",
                composer::department_employees(department_id),
            )
            .await?;
        Ok(rows.iter().map(Employee::from_row).collect::<Result<_, _>>()?)
    }

    // ========== Writes ==========

    /// Create an employee and return its storage-assigned identifier
    pub async fn create_employee(&self, input: &NewEmployee) -> Result<NodeId, OrgServiceError> {
        let plan = mutation_planner::plan_create(input)?;
        let rows = self.write("create_employee", plan).await?;

        let id = rows
            .first()
            .and_then(|row| row.get_node_id("id"))
            .ok_or_else(|| StoreError::malformed_row("id"))?;
        tracing::info!("Created employee {}", id);
        Ok(id)
    }

    /// Apply an [`EmployeeUpdate`]. An unknown `id` is `NotFound` even when
    /// the update itself is invalid.
    pub async fn edit_employee(
        &self,
        id: NodeId,
        update: &EmployeeUpdate,
    ) -> Result<(), OrgServiceError> {
        let plan = match mutation_planner::plan_edit(id, update) {
            Ok(plan) => plan,
            Err(err) => {
                self.ensure_employee(id).await?;
                return Err(err);
            }
        };
        self.write("edit_employee", plan).await?;
        tracing::info!("Updated employee {}", id);
        Ok(())
    }

    /// Delete an employee; a manager takes their department with them
    pub async fn delete_employee(&self, id: NodeId) -> Result<(), OrgServiceError> {
        self.write("delete_employee", mutation_planner::plan_delete(id))
            .await?;
        tracing::info!("Deleted employee {}", id);
        Ok(())
    }

    async fn ensure_employee(&self, id: NodeId) -> Result<(), OrgServiceError> {
        let rows = self
            .store
            .execute(TransactionUnit::Read(composer::employee_by_id(id)))
            .await?;
        if rows.is_empty() {
            return Err(OrgServiceError::not_found(format!(
                "employee {} does not exist",
                id
            )));
        }
        Ok(())
    }

    async fn read(
        &self,
        operation: &'static str,
        query: TraversalQuery,
    ) -> Result<Vec<Row>, OrgServiceError> {
        let rows = self.store.execute(TransactionUnit::Read(query)).await?;
        tracing::debug!("{}: {} rows", operation, rows.len());
        if rows.is_empty() {
            return Err(OrgServiceError::empty_result(operation));
        }
        Ok(rows)
    }

    async fn write(
        &self,
        operation: &'static str,
        plan: MutationPlan,
    ) -> Result<Vec<Row>, OrgServiceError> {
        tracing::debug!("{}: executing plan with {} steps", operation, plan.len());
        self.store
            .execute(TransactionUnit::Write(plan))
            .await
            .map_err(|err| {
                tracing::debug!("{} failed: {}", operation, err);
                OrgServiceError::from(err)
            })
    }
}

fn log_rejected(operation: &str, params: &ListParams) {
    let rejected = params.filters.rejected_keys();
    if !rejected.is_empty() {
        tracing::debug!("{}: ignoring unknown filter keys {:?}", operation, rejected);
    }
}
