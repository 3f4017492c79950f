//! Seed loading and the derived-view report
//!
//! A seed file names the departments to create out-of-band and the
//! employees to add through `OrgService`, in order:
//!
//! ```json
//! {
//!   "departments": ["Engineering"],
//!   "employees": [
//!     { "firstName": "Ada", "lastName": "Lovelace", "age": 36,
//!       "position": "manager", "department": "Engineering" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use orggraph_core::models::{Department, DepartmentSummary, Employee, NewEmployee};
use orggraph_core::services::{ErrorKind, OrgService, OrgServiceError};
use orggraph_core::SurrealStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const SAMPLE_ORG: &str = include_str!("../seed/sample-org.json");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub employees: Vec<NewEmployee>,
}

impl SeedFile {
    /// The built-in sample organization
    pub fn sample() -> Result<Self> {
        serde_json::from_str(SAMPLE_ORG).context("built-in sample org is not valid JSON")
    }

    /// Read a seed file, or the sample when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => return Self::sample(),
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse seed file {}", path.display()))
    }
}

/// Outcome of applying a seed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOutcome {
    pub created: usize,
    /// Employees the service refused, with the reason
    pub rejected: Vec<String>,
}

/// Create the seed's departments, then add its employees one by one.
///
/// A refused employee is recorded and skipped; store failures abort.
pub async fn apply(
    service: &OrgService<SurrealStore>,
    store: &Arc<SurrealStore>,
    seed: &SeedFile,
) -> Result<SeedOutcome> {
    for name in &seed.departments {
        store
            .create_department(name)
            .await
            .with_context(|| format!("failed to create department {}", name))?;
    }

    let mut outcome = SeedOutcome::default();
    for employee in &seed.employees {
        match service.create_employee(employee).await {
            Ok(id) => {
                tracing::debug!("Seeded employee {} as {}", describe(employee), id);
                outcome.created += 1;
            }
            Err(err) if err.kind() == ErrorKind::Store => return Err(err.into()),
            Err(err) => {
                tracing::warn!("Skipping {}: {}", describe(employee), err);
                outcome.rejected.push(format!("{}: {}", describe(employee), err));
            }
        }
    }
    Ok(outcome)
}

/// A manager and the people who report to them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub manager: Employee,
    pub department: Option<DepartmentSummary>,
    pub subordinates: Vec<Employee>,
}

/// Every derived view over the current graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgReport {
    pub departments: Vec<Department>,
    pub employees_by_age: Vec<Employee>,
    pub teams: Vec<Team>,
}

pub async fn report(service: &OrgService<SurrealStore>) -> Result<OrgReport> {
    let departments =
        or_empty(service.list_departments([("sort", "employeeCount")]).await)?;
    let employees_by_age = or_empty(service.list_employees([("sort", "age")]).await)?;
    let managers = or_empty(service.list_employees([("position", "manager")]).await)?;

    let mut teams = Vec::with_capacity(managers.len());
    for manager in managers {
        let department = match service.employee_department(manager.id).await {
            Ok(summary) => Some(summary),
            Err(err) if err.kind() == ErrorKind::EmptyResult => None,
            Err(err) => return Err(err.into()),
        };
        let subordinates = or_empty(service.subordinates(manager.id).await)?;
        teams.push(Team {
            manager,
            department,
            subordinates,
        });
    }

    Ok(OrgReport {
        departments,
        employees_by_age,
        teams,
    })
}

/// Treat `EmptyResult` as an empty listing
fn or_empty<T>(result: Result<Vec<T>, OrgServiceError>) -> Result<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(err) if err.kind() == ErrorKind::EmptyResult => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

fn describe(employee: &NewEmployee) -> String {
    format!(
        "{} {}",
        employee.first_name.as_deref().unwrap_or("?"),
        employee.last_name.as_deref().unwrap_or("?")
    )
}
