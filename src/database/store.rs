use std::future::Future;

use uuid::Uuid;

use crate::database::models::{Employee, Leave, LeaveType, Organization};
use crate::error::AppError;
use crate::services::calendar::DateRange;

/// Query over the leaves table. Every `Some` field narrows the result; `None` leaves
/// that dimension unfiltered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveFilter {
    pub owner_id: Option<String>,
    pub leave_type: Option<LeaveType>,
    pub approved: Option<bool>,
    pub rejected: Option<bool>,
    /// Leaves with at least one day inside this calendar year.
    pub touches_year: Option<i32>,
    /// Leaves colliding with this range (see `DateRange::overlaps`).
    pub overlapping: Option<DateRange>,
    pub exclude_id: Option<Uuid>,
}

impl LeaveFilter {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }

    pub fn of_type(mut self, leave_type: LeaveType) -> Self {
        self.leave_type = Some(leave_type);
        self
    }

    pub fn approved(mut self) -> Self {
        self.approved = Some(true);
        self
    }

    pub fn pending(mut self) -> Self {
        self.approved = Some(false);
        self.rejected = Some(false);
        self
    }

    pub fn in_year(mut self, year: i32) -> Self {
        self.touches_year = Some(year);
        self
    }

    pub fn overlapping(mut self, range: DateRange) -> Self {
        self.overlapping = Some(range);
        self
    }

    pub fn excluding(mut self, leave_id: Option<Uuid>) -> Self {
        self.exclude_id = leave_id;
        self
    }

    /// Applies the filter to a leave already in memory.
    pub fn matches(&self, leave: &Leave) -> bool {
        if let Some(owner_id) = &self.owner_id {
            if &leave.owner_id != owner_id {
                return false;
            }
        }
        if let Some(leave_type) = self.leave_type {
            if leave.leave_type != leave_type {
                return false;
            }
        }
        if let Some(approved) = self.approved {
            if leave.is_approved() != approved {
                return false;
            }
        }
        if let Some(rejected) = self.rejected {
            if leave.is_rejected() != rejected {
                return false;
            }
        }
        if let Some(year) = self.touches_year {
            if leave.range().clip_to_year(year).is_none() {
                return false;
            }
        }
        if let Some(range) = &self.overlapping {
            if !range.overlaps(&leave.range()) {
                return false;
            }
        }
        if let Some(exclude_id) = self.exclude_id {
            if leave.id == exclude_id {
                return false;
            }
        }
        true
    }
}

/// Read access to employees and the manager tree.
pub trait EmployeeStore: Send + Sync {
    fn find_employee(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Employee>, AppError>> + Send;

    /// Employees whose manager is `manager_id`, ordered by id.
    fn direct_reports(
        &self,
        manager_id: &str,
    ) -> impl Future<Output = Result<Vec<Employee>, AppError>> + Send;

    fn find_organization(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Organization>, AppError>> + Send;

    fn employees_in_organization(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Employee>, AppError>> + Send;
}

/// Read access to leaves plus the entry point for writes.
pub trait LeaveStore: Send + Sync {
    type Transaction: LeaveTransaction;

    fn find_leave(&self, id: Uuid) -> impl Future<Output = Result<Option<Leave>, AppError>> + Send;

    /// Matching leaves ordered by start date.
    fn find_leaves(
        &self,
        filter: &LeaveFilter,
    ) -> impl Future<Output = Result<Vec<Leave>, AppError>> + Send;

    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, AppError>> + Send;
}

/// Writes staged inside one transaction. Nothing is visible to readers until `commit`.
pub trait LeaveTransaction: Send + Sized {
    fn insert_leave(&mut self, leave: &Leave)
    -> impl Future<Output = Result<Leave, AppError>> + Send;

    /// Overwrites the mutable columns (type, dates, description, review fields).
    fn update_leave(&mut self, leave: &Leave)
    -> impl Future<Output = Result<Leave, AppError>> + Send;

    fn delete_leave(&mut self, id: Uuid) -> impl Future<Output = Result<(), AppError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn rollback(self) -> impl Future<Output = Result<(), AppError>> + Send;
}
