use std::collections::{HashSet, VecDeque};

use crate::database::{models::Employee, store::EmployeeStore};
use crate::error::AppError;

/// Read-only walks over the manager tree. Walks track visited employees and stop at a
/// depth limit.
pub struct Hierarchy<'a, E> {
    employees: &'a E,
    depth_limit: usize,
}

impl<'a, E: EmployeeStore> Hierarchy<'a, E> {
    pub fn new(employees: &'a E, depth_limit: usize) -> Self {
        Self {
            employees,
            depth_limit,
        }
    }

    /// The direct manager, or `None` for the organization head.
    pub async fn manager_of(&self, employee: &Employee) -> Result<Option<Employee>, AppError> {
        let Some(manager_id) = employee.manager_id.as_deref() else {
            return Ok(None);
        };

        if manager_id == employee.id {
            log::warn!("Employee {} is recorded as their own manager", employee.id);
            return Ok(None);
        }

        let manager = self
            .employees
            .find_employee(manager_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Manager {}", manager_id)))?;

        Ok(Some(manager))
    }

    /// Every direct and indirect report of `root_id`, breadth first. The root itself is not
    /// included.
    pub async fn subtree(&self, root_id: &str) -> Result<Vec<Employee>, AppError> {
        let mut visited: HashSet<String> = HashSet::from([root_id.to_string()]);
        let mut queue: VecDeque<(String, usize)> = VecDeque::from([(root_id.to_string(), 0)]);
        let mut result = Vec::new();

        while let Some((manager_id, depth)) = queue.pop_front() {
            if depth >= self.depth_limit {
                log::warn!(
                    "Stopped walking reports of {} at depth {}",
                    manager_id,
                    depth
                );
                continue;
            }

            for report in self.employees.direct_reports(&manager_id).await? {
                if !visited.insert(report.id.clone()) {
                    log::warn!(
                        "Cycle in manager tree: {} reached again under {}",
                        report.id,
                        manager_id
                    );
                    continue;
                }
                queue.push_back((report.id.clone(), depth + 1));
                result.push(report);
            }
        }

        log::debug!("Subtree of {} has {} employee(s)", root_id, result.len());
        Ok(result)
    }
}
