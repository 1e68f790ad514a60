use chrono::{Days, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::database::{
    models::{Employee, Leave, LeaveRequestInput, LeaveType},
    store::{EmployeeStore, LeaveFilter, LeaveStore, LeaveTransaction},
};
use crate::error::AppError;
use crate::services::{
    balance::{BalanceCalculator, BalanceSummary},
    calendar::DateRange,
    conflicts::{Conflict, ConflictDetector},
    hierarchy::Hierarchy,
    notifier::Notifier,
    validator::{LeaveValidator, ValidationOutcome},
};

/// A pending leave waiting on a manager, with what it collides with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReview {
    pub leave: Leave,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug)]
enum LeaveWrite {
    Insert(Leave),
    Update(Leave),
    Delete(Uuid),
}

/// Create, edit, delete, approve and reject leaves. Every transition validates, writes inside
/// one transaction, and only after commit sends a best-effort notification.
#[derive(Clone)]
pub struct LeaveService<E, L, N> {
    employees: E,
    leaves: L,
    notifier: N,
    depth_limit: usize,
}

impl<E: EmployeeStore, L: LeaveStore, N: Notifier> LeaveService<E, L, N> {
    pub fn new(employees: E, leaves: L, notifier: N, config: &Config) -> Self {
        Self {
            employees,
            leaves,
            notifier,
            depth_limit: config.hierarchy_depth_limit,
        }
    }

    pub fn validator(&self) -> LeaveValidator<'_, E, L> {
        LeaveValidator::new(&self.employees, &self.leaves)
    }

    pub fn balances(&self) -> BalanceCalculator<'_, E, L> {
        BalanceCalculator::new(&self.employees, &self.leaves)
    }

    pub fn conflict_detector(&self) -> ConflictDetector<'_, E, L> {
        ConflictDetector::new(&self.employees, &self.leaves, self.depth_limit)
    }

    pub async fn validate(
        &self,
        request: &LeaveRequestInput,
        owner_id: &str,
        leave_id: Option<Uuid>,
        today: NaiveDate,
    ) -> Result<ValidationOutcome, AppError> {
        self.validator()
            .validate(request, owner_id, leave_id, today)
            .await
    }

    pub async fn remaining_pto(
        &self,
        employee_id: &str,
        year: i32,
        exclude_leave_id: Option<Uuid>,
    ) -> Result<i64, AppError> {
        self.balances()
            .remaining_pto(employee_id, year, exclude_leave_id)
            .await
    }

    pub async fn balance_summary(
        &self,
        employee_id: &str,
        year: i32,
    ) -> Result<BalanceSummary, AppError> {
        self.balances().summary(employee_id, year).await
    }

    pub async fn conflicts(&self, leave: &Leave) -> Result<Vec<Conflict>, AppError> {
        self.conflict_detector().conflicts_for_leave(leave).await
    }

    pub async fn get_leave(&self, leave_id: Uuid) -> Result<Leave, AppError> {
        self.leaves
            .find_leave(leave_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Leave {}", leave_id)))
    }

    /// New leaves start pending, except for the organization head whose leaves are approved
    /// on the spot.
    pub async fn create_leave(
        &self,
        owner_id: &str,
        input: LeaveRequestInput,
        today: NaiveDate,
    ) -> Result<Leave, AppError> {
        self.validate(&input, owner_id, None, today)
            .await?
            .into_result()?;

        let owner = self.find_employee(owner_id).await?;
        let mut leave = Leave::new(&owner.id, input);
        if owner.is_head() {
            leave.approve(&owner.id);
        }

        let created = self.commit_one(LeaveWrite::Insert(leave)).await?;
        log::info!(
            "Created {} leave {} for {} ({} to {})",
            created.leave_type,
            created.id,
            owner.id,
            created.start_date,
            created.end_date
        );

        self.notify_manager(
            &owner,
            "New leave request",
            &format!(
                "{} requested {} from {} to {}.",
                owner.name, created.leave_type, created.start_date, created.end_date
            ),
        )
        .await;

        Ok(created)
    }

    /// Edits dates, type or description. The edit goes back to review unless the owner heads
    /// the organization.
    pub async fn update_leave(
        &self,
        leave_id: Uuid,
        input: LeaveRequestInput,
        today: NaiveDate,
    ) -> Result<Leave, AppError> {
        let existing = self.get_leave(leave_id).await?;

        self.validate(&input, &existing.owner_id, Some(leave_id), today)
            .await?
            .into_result()?;

        let owner = self.find_employee(&existing.owner_id).await?;
        let mut leave = Leave {
            leave_type: input.leave_type,
            start_date: input.start_date,
            end_date: input.end_date,
            description: input.description,
            ..existing
        };
        leave.reset_review();
        if owner.is_head() {
            leave.approve(&owner.id);
        }

        let updated = self.commit_one(LeaveWrite::Update(leave)).await?;
        log::info!("Updated leave {} for {}", updated.id, owner.id);

        self.notify_manager(
            &owner,
            "Leave request changed",
            &format!(
                "{} changed a leave request to {} from {} to {}.",
                owner.name, updated.leave_type, updated.start_date, updated.end_date
            ),
        )
        .await;

        Ok(updated)
    }

    /// Approved leaves can only be deleted while entirely in the future.
    pub async fn delete_leave(&self, leave_id: Uuid, today: NaiveDate) -> Result<Leave, AppError> {
        let existing = self.get_leave(leave_id).await?;

        if existing.is_bank_holiday() {
            return Err(AppError::invalid_input("Bank holidays cannot be deleted"));
        }
        if existing.is_approved() && (existing.start_date < today || existing.end_date < today) {
            return Err(AppError::invalid_input(
                "Cannot delete an approved leave that has already started",
            ));
        }

        self.commit_writes(vec![LeaveWrite::Delete(existing.id)])
            .await?;
        log::info!("Deleted leave {} of {}", existing.id, existing.owner_id);

        match self.employees.find_employee(&existing.owner_id).await {
            Ok(Some(owner)) => {
                self.notify_manager(
                    &owner,
                    "Leave request withdrawn",
                    &format!(
                        "{} withdrew the {} leave from {} to {}.",
                        owner.name, existing.leave_type, existing.start_date, existing.end_date
                    ),
                )
                .await
            }
            Ok(None) => {}
            Err(err) => log::warn!("Could not look up owner {}: {}", existing.owner_id, err),
        }

        Ok(existing)
    }

    /// Approves a pending leave. Paid time off is re-checked against the current balance.
    pub async fn approve_leave(
        &self,
        leave_id: Uuid,
        reviewer_id: &str,
    ) -> Result<Leave, AppError> {
        let mut leave = self.get_leave(leave_id).await?;
        let reviewer = self.find_employee(reviewer_id).await?;

        if leave.is_bank_holiday() {
            return Err(AppError::invalid_input(
                "Bank holidays are approved by the system",
            ));
        }
        if leave.is_rejected() {
            return Err(AppError::invalid_input("Cannot approve a rejected leave"));
        }
        if leave.is_approved() {
            return Err(AppError::invalid_input("Leave is already approved"));
        }

        if leave.leave_type == LeaveType::PaidTimeOff {
            if let Some(rejection) = self
                .validator()
                .check_balance(&leave.owner_id, leave.range(), Some(leave.id))
                .await?
            {
                return Err(rejection.into());
            }
        }

        leave.approve(&reviewer.id);
        let approved = self.commit_one(LeaveWrite::Update(leave)).await?;
        log::info!("Leave {} approved by {}", approved.id, reviewer.id);

        self.notify(
            &approved.owner_id,
            "Leave approved",
            &format!(
                "{} approved your leave from {} to {}.",
                reviewer.name, approved.start_date, approved.end_date
            ),
        )
        .await;

        Ok(approved)
    }

    /// Rejects a pending leave, or an approved one that has not started yet.
    pub async fn reject_leave(
        &self,
        leave_id: Uuid,
        reviewer_id: &str,
        today: NaiveDate,
    ) -> Result<Leave, AppError> {
        let mut leave = self.get_leave(leave_id).await?;
        let reviewer = self.find_employee(reviewer_id).await?;

        if leave.is_bank_holiday() {
            return Err(AppError::invalid_input("Bank holidays cannot be rejected"));
        }
        if leave.is_rejected() {
            return Err(AppError::invalid_input("Leave is already rejected"));
        }
        if leave.is_approved() && leave.start_date < today {
            return Err(AppError::invalid_input(
                "Cannot reject an approved leave that has already started",
            ));
        }

        leave.reject(&reviewer.id);
        let rejected = self.commit_one(LeaveWrite::Update(leave)).await?;
        log::info!("Leave {} rejected by {}", rejected.id, reviewer.id);

        self.notify(
            &rejected.owner_id,
            "Leave rejected",
            &format!(
                "{} rejected your leave from {} to {}.",
                reviewer.name, rejected.start_date, rejected.end_date
            ),
        )
        .await;

        Ok(rejected)
    }

    /// Pending leaves of the manager's direct reports, each with its conflicts.
    pub async fn pending_reviews(&self, manager_id: &str) -> Result<Vec<PendingReview>, AppError> {
        let manager = self.find_employee(manager_id).await?;
        let detector = self.conflict_detector();
        let mut reviews = Vec::new();

        for report in self.employees.direct_reports(&manager.id).await? {
            let pending = self
                .leaves
                .find_leaves(&LeaveFilter::owned_by(&report.id).pending())
                .await?;

            for leave in pending {
                let conflicts = detector.conflicts_for_leave(&leave).await?;
                reviews.push(PendingReview { leave, conflicts });
            }
        }

        Ok(reviews)
    }

    /// Books a single-day, system-approved bank holiday for everyone in the organization based
    /// in `country`. Employees who already have a bank holiday that day are skipped. All rows
    /// are written in one transaction.
    pub async fn record_bank_holiday(
        &self,
        organization_id: Uuid,
        country: &str,
        date: NaiveDate,
        description: &str,
    ) -> Result<Vec<Leave>, AppError> {
        self.employees
            .find_organization(organization_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization {}", organization_id)))?;

        let next_day = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::invalid_input(format!("Date {} is out of range", date)))?;
        let day = DateRange::new(date, next_day);

        let mut writes = Vec::new();
        for employee in self
            .employees
            .employees_in_organization(organization_id)
            .await?
        {
            if !employee.country.eq_ignore_ascii_case(country) {
                continue;
            }

            let existing = self
                .leaves
                .find_leaves(
                    &LeaveFilter::owned_by(&employee.id)
                        .of_type(LeaveType::BankHoliday)
                        .overlapping(day),
                )
                .await?;
            if !existing.is_empty() {
                continue;
            }

            let mut leave = Leave::new(
                &employee.id,
                LeaveRequestInput {
                    leave_type: LeaveType::BankHoliday,
                    start_date: day.start,
                    end_date: day.end,
                    description: Some(description.to_string()),
                },
            );
            leave.approve(&employee.id);
            writes.push(LeaveWrite::Insert(leave));
        }

        let created = self.commit_writes(writes).await?;
        log::info!(
            "Recorded bank holiday {} ({}) for {} employee(s) in {}",
            date,
            description,
            created.len(),
            country
        );

        Ok(created)
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Employee, AppError> {
        self.employees
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {}", employee_id)))
    }

    async fn commit_one(&self, write: LeaveWrite) -> Result<Leave, AppError> {
        self.commit_writes(vec![write])
            .await?
            .pop()
            .ok_or_else(|| AppError::internal_server_error_message("Write returned no leave"))
    }

    /// Applies the writes in one transaction; any failure rolls all of them back.
    async fn commit_writes(&self, writes: Vec<LeaveWrite>) -> Result<Vec<Leave>, AppError> {
        let mut tx = self.leaves.begin().await?;

        match apply_writes(&mut tx, writes).await {
            Ok(written) => {
                tx.commit().await?;
                Ok(written)
            }
            Err(err) => {
                log::warn!("Transaction failed with error: {}, rolling back", err);
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!(
                        "Rollback failed after error (orig: {}, rollback: {})",
                        err,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    async fn notify_manager(&self, owner: &Employee, subject: &str, body: &str) {
        let hierarchy = Hierarchy::new(&self.employees, self.depth_limit);
        match hierarchy.manager_of(owner).await {
            Ok(Some(manager)) => self.notify(manager.email(), subject, body).await,
            Ok(None) => {}
            Err(err) => log::warn!("Could not look up manager of {}: {}", owner.id, err),
        }
    }

    async fn notify(&self, to: &str, subject: &str, body: &str) {
        if let Err(err) = self.notifier.send(to, subject, body).await {
            log::warn!("Failed to notify {} ({}): {}", to, subject, err);
        }
    }
}

async fn apply_writes<T: LeaveTransaction>(
    tx: &mut T,
    writes: Vec<LeaveWrite>,
) -> Result<Vec<Leave>, AppError> {
    let mut written = Vec::new();
    for write in writes {
        match write {
            LeaveWrite::Insert(leave) => written.push(tx.insert_leave(&leave).await?),
            LeaveWrite::Update(leave) => written.push(tx.update_leave(&leave).await?),
            LeaveWrite::Delete(id) => tx.delete_leave(id).await?,
        }
    }
    Ok(written)
}
