//! An in-process store with the same transactional contract as the Postgres repositories.
//! Writes are staged per transaction and applied on commit.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::{
    models::{Employee, Leave, Organization},
    store::{EmployeeStore, LeaveFilter, LeaveStore, LeaveTransaction},
};
use crate::error::AppError;

#[derive(Debug, Default)]
struct MemoryState {
    organizations: HashMap<Uuid, Organization>,
    employees: BTreeMap<String, Employee>,
    leaves: HashMap<Uuid, Leave>,
    // Remaining staged writes allowed before a write fails; `None` disables the fault.
    writes_before_failure: Option<usize>,
    employee_reads_fail: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_organization(&self, organization: Organization) {
        let mut state = self.state.write().await;
        state.organizations.insert(organization.id, organization);
    }

    pub async fn add_employee(&self, employee: Employee) {
        let mut state = self.state.write().await;
        state.employees.insert(employee.id.clone(), employee);
    }

    /// Inserts a leave directly, bypassing transactions. Used to seed history.
    pub async fn add_leave(&self, leave: Leave) {
        let mut state = self.state.write().await;
        state.leaves.insert(leave.id, leave);
    }

    pub async fn remove_leave(&self, id: Uuid) -> Option<Leave> {
        let mut state = self.state.write().await;
        state.leaves.remove(&id)
    }

    pub async fn leave_count(&self) -> usize {
        self.state.read().await.leaves.len()
    }

    /// Makes the write after the next `n` successful ones fail with a database error.
    pub async fn fail_after_writes(&self, n: usize) {
        self.state.write().await.writes_before_failure = Some(n);
    }

    /// Makes every employee lookup by id fail with a database error.
    pub async fn fail_employee_reads(&self) {
        self.state.write().await.employee_reads_fail = true;
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.writes_before_failure = None;
        state.employee_reads_fail = false;
    }
}

impl EmployeeStore for InMemoryStore {
    async fn find_employee(&self, id: &str) -> Result<Option<Employee>, AppError> {
        let state = self.state.read().await;
        if state.employee_reads_fail {
            return Err(AppError::DatabaseError(sqlx::Error::Protocol(
                "injected read failure".to_string(),
            )));
        }
        Ok(state.employees.get(id).cloned())
    }

    async fn direct_reports(&self, manager_id: &str) -> Result<Vec<Employee>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .employees
            .values()
            .filter(|e| e.manager_id.as_deref() == Some(manager_id))
            .cloned()
            .collect())
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }

    async fn employees_in_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Employee>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .employees
            .values()
            .filter(|e| e.organization_id == organization_id)
            .cloned()
            .collect())
    }
}

impl LeaveStore for InMemoryStore {
    type Transaction = MemoryTransaction;

    async fn find_leave(&self, id: Uuid) -> Result<Option<Leave>, AppError> {
        Ok(self.state.read().await.leaves.get(&id).cloned())
    }

    async fn find_leaves(&self, filter: &LeaveFilter) -> Result<Vec<Leave>, AppError> {
        let state = self.state.read().await;
        let mut leaves: Vec<Leave> = state
            .leaves
            .values()
            .filter(|leave| filter.matches(leave))
            .cloned()
            .collect();
        leaves.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(leaves)
    }

    async fn begin(&self) -> Result<MemoryTransaction, AppError> {
        Ok(MemoryTransaction {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum StagedWrite {
    Upsert(Leave),
    Delete(Uuid),
}

#[derive(Debug)]
pub struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    staged: Vec<StagedWrite>,
}

impl MemoryTransaction {
    async fn check_fault(&self) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state.writes_before_failure {
            Some(0) => Err(AppError::DatabaseError(sqlx::Error::Protocol(
                "injected write failure".to_string(),
            ))),
            Some(n) => {
                state.writes_before_failure = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// The leave as this transaction sees it, staged writes included.
    async fn visible(&self, id: Uuid) -> Option<Leave> {
        let staged = self.staged.iter().rev().find_map(|write| match write {
            StagedWrite::Upsert(leave) if leave.id == id => Some(Some(leave.clone())),
            StagedWrite::Delete(deleted) if *deleted == id => Some(None),
            _ => None,
        });

        match staged {
            Some(leave) => leave,
            None => self.state.read().await.leaves.get(&id).cloned(),
        }
    }
}

impl LeaveTransaction for MemoryTransaction {
    async fn insert_leave(&mut self, leave: &Leave) -> Result<Leave, AppError> {
        self.check_fault().await?;
        if self.visible(leave.id).await.is_some() {
            return Err(AppError::DatabaseError(sqlx::Error::Protocol(format!(
                "duplicate leave id {}",
                leave.id
            ))));
        }
        self.staged.push(StagedWrite::Upsert(leave.clone()));
        Ok(leave.clone())
    }

    async fn update_leave(&mut self, leave: &Leave) -> Result<Leave, AppError> {
        self.check_fault().await?;
        let existing = self
            .visible(leave.id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Leave {}", leave.id)))?;

        let updated = Leave {
            owner_id: existing.owner_id,
            created_at: existing.created_at,
            ..leave.clone()
        };
        self.staged.push(StagedWrite::Upsert(updated.clone()));
        Ok(updated)
    }

    async fn delete_leave(&mut self, id: Uuid) -> Result<(), AppError> {
        self.check_fault().await?;
        if self.visible(id).await.is_none() {
            return Err(AppError::NotFound(format!("Leave {}", id)));
        }
        self.staged.push(StagedWrite::Delete(id));
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        for write in self.staged {
            match write {
                StagedWrite::Upsert(leave) => {
                    state.leaves.insert(leave.id, leave);
                }
                StagedWrite::Delete(id) => {
                    state.leaves.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        log::debug!("Discarding {} staged write(s)", self.staged.len());
        Ok(())
    }
}
