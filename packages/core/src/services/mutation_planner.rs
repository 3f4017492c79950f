//! Mutation Planner
//!
//! Turns create/edit/delete requests into [`MutationPlan`]s. Input problems
//! the planner can see on its own (missing fields, position without
//! department) fail here as `InvalidInput`; everything that depends on
//! graph state is a guard inside the plan, so the check and the write share
//! one transactional unit.
//!
//! Guards always come before the first mutating step.

use super::error::OrgServiceError;
use crate::db::{NodeId, RejectionKind};
use crate::models::{EmployeeUpdate, Label, NewEmployee, Position, PropertyKey, RelType};
use crate::query::composer::{self, DEPARTMENT, EMPLOYEE};
use crate::query::{Assignments, Guard, MutationPlan, NodeSelector, Step};

/// Plan for creating an employee.
///
/// Requires `firstName`, `lastName`, `age` and `department`. Fails with
/// `Conflict` (at execution) if the department is missing, the identity
/// triple is taken, or the employee would become a second manager.
pub fn plan_create(input: &NewEmployee) -> Result<MutationPlan, OrgServiceError> {
    let first_name = required("firstName", &input.first_name)?;
    let last_name = required("lastName", &input.last_name)?;
    let age = input
        .age
        .ok_or_else(|| OrgServiceError::invalid_input("missing required field 'age'"))?;
    let department = required("department", &input.department)?;
    let position = input
        .position
        .as_deref()
        .map(Position::from_input)
        .unwrap_or(Position::Staff);

    let mut plan = MutationPlan::new()
        .guard(department_exists(department))
        .guard(Guard::absent(
            composer::employee_by_identity(first_name, last_name, age),
            RejectionKind::Conflict,
            format!(
                "employee {} {} (age {}) already exists",
                first_name, last_name, age
            ),
        ));
    if position.is_manager() {
        plan = plan.guard(manager_slot_free(department, None));
    }

    let properties = Assignments::new()
        .set(PropertyKey::FirstName, first_name)
        .set(PropertyKey::LastName, last_name)
        .set(PropertyKey::Age, age);

    plan = plan
        .step(Step::CreateNode {
            var: EMPLOYEE,
            label: Label::Employee,
            properties,
        })
        .step(Step::CreateEdge {
            from: NodeSelector::Created(EMPLOYEE),
            rel_type: RelType::WorksIn,
            to: department_named(department),
        });
    if position.is_manager() {
        plan = plan.step(Step::CreateEdge {
            from: NodeSelector::Created(EMPLOYEE),
            rel_type: RelType::Manages,
            to: department_named(department),
        });
    }

    Ok(plan)
}

/// Plan for editing an employee.
///
/// Property updates run first, for supplied fields only. A supplied
/// `department` replaces all WORKS_IN/MANAGES edges with a new WORKS_IN
/// edge, plus MANAGES when `position` says manager. `position` alone is
/// `InvalidInput`; the service checks the employee exists before
/// reporting it.
pub fn plan_edit(id: NodeId, update: &EmployeeUpdate) -> Result<MutationPlan, OrgServiceError> {
    if update.position.is_some() && update.department.is_none() {
        return Err(OrgServiceError::invalid_input(
            "position requires a department",
        ));
    }
    let first_name = optional("firstName", &update.first_name)?;
    let last_name = optional("lastName", &update.last_name)?;
    let department = optional("department", &update.department)?;
    let manager = update
        .position
        .as_deref()
        .map(Position::from_input)
        .map_or(false, |position| position.is_manager());

    let mut plan = MutationPlan::new().guard(Guard::exists(
        composer::employee_by_id(id),
        RejectionKind::NotFound,
        format!("employee {} does not exist", id),
    ));
    if update.touches_identity() {
        plan = plan.guard(Guard::absent(
            composer::identity_collision(id, first_name, last_name, update.age),
            RejectionKind::Conflict,
            format!("another employee already has the identity requested for {}", id),
        ));
    }
    if let Some(department) = department {
        plan = plan.guard(department_exists(department));
        if manager {
            plan = plan.guard(manager_slot_free(department, Some(id)));
        }
    }

    let assignments = Assignments::new()
        .set_opt(PropertyKey::FirstName, first_name)
        .set_opt(PropertyKey::LastName, last_name)
        .set_opt(PropertyKey::Age, update.age);
    if !assignments.is_empty() {
        plan = plan.step(Step::SetProperties {
            target: employee(id),
            assignments,
        });
    }

    if let Some(department) = department {
        plan = plan
            .step(Step::DeleteEdges {
                from: employee(id),
                rel_types: vec![RelType::WorksIn, RelType::Manages],
            })
            .step(Step::CreateEdge {
                from: employee(id),
                rel_type: RelType::WorksIn,
                to: department_named(department),
            });
        if manager {
            plan = plan.step(Step::CreateEdge {
                from: employee(id),
                rel_type: RelType::Manages,
                to: department_named(department),
            });
        }
    }

    Ok(plan)
}

/// Plan for deleting an employee, cascading to the department they manage.
///
/// The managed-department step selects nothing for non-managers, so the
/// same plan covers both cases.
pub fn plan_delete(id: NodeId) -> MutationPlan {
    MutationPlan::new()
        .guard(Guard::exists(
            composer::employee_by_id(id),
            RejectionKind::NotFound,
            format!("employee {} does not exist", id),
        ))
        .step(Step::DetachDelete {
            target: NodeSelector::matched(composer::departments_managed_by(id), DEPARTMENT),
        })
        .step(Step::DetachDelete {
            target: employee(id),
        })
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, OrgServiceError> {
    optional(field, value)?
        .ok_or_else(|| OrgServiceError::invalid_input(format!("missing required field '{}'", field)))
}

/// Supplied strings must not be blank
fn optional<'a>(field: &str, value: &'a Option<String>) -> Result<Option<&'a str>, OrgServiceError> {
    match value.as_deref() {
        Some(text) if text.trim().is_empty() => Err(OrgServiceError::invalid_input(format!(
            "field '{}' must not be blank",
            field
        ))),
        other => Ok(other),
    }
}

fn employee(id: NodeId) -> NodeSelector {
    NodeSelector::matched(composer::employee_by_id(id), EMPLOYEE)
}

fn department_named(name: &str) -> NodeSelector {
    NodeSelector::matched(composer::department_by_name(name), DEPARTMENT)
}

fn department_exists(name: &str) -> Guard {
    Guard::exists(
        composer::department_by_name(name),
        RejectionKind::Conflict,
        format!("department '{}' does not exist", name),
    )
}

fn manager_slot_free(department: &str, excluding: Option<NodeId>) -> Guard {
    Guard::absent(
        composer::department_manager(department, excluding),
        RejectionKind::Conflict,
        format!("department '{}' already has a manager", department),
    )
}
