use serde::Serialize;
use uuid::Uuid;

use crate::database::{
    models::{Employee, LeaveType},
    store::{EmployeeStore, LeaveFilter, LeaveStore},
};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub employee_id: String,
    pub year: i32,
    pub allotment: i64,
    pub used: i64,
    pub remaining: i64,
}

/// Computes paid-time-off balances from approved leave history.
pub struct BalanceCalculator<'a, E, L> {
    employees: &'a E,
    leaves: &'a L,
}

impl<'a, E: EmployeeStore, L: LeaveStore> BalanceCalculator<'a, E, L> {
    pub fn new(employees: &'a E, leaves: &'a L) -> Self {
        Self { employees, leaves }
    }

    /// Allotment minus the business days already taken in `year`, optionally ignoring one leave
    /// (the one being edited). Not clamped: a negative result means the year is overdrawn.
    pub async fn remaining_pto(
        &self,
        employee_id: &str,
        year: i32,
        exclude_leave_id: Option<Uuid>,
    ) -> Result<i64, AppError> {
        let employee = self.find_employee(employee_id).await?;
        let used = self.days_used(&employee, year, exclude_leave_id).await?;

        Ok(i64::from(employee.annual_pto) - used)
    }

    pub async fn summary(&self, employee_id: &str, year: i32) -> Result<BalanceSummary, AppError> {
        let employee = self.find_employee(employee_id).await?;
        let used = self.days_used(&employee, year, None).await?;
        let allotment = i64::from(employee.annual_pto);

        Ok(BalanceSummary {
            employee_id: employee.id,
            year,
            allotment,
            used,
            remaining: allotment - used,
        })
    }

    /// Business days of approved paid time off that fall inside `year`. A leave crossing
    /// New Year only contributes the part inside `year`.
    pub async fn days_used(
        &self,
        employee: &Employee,
        year: i32,
        exclude_leave_id: Option<Uuid>,
    ) -> Result<i64, AppError> {
        let filter = LeaveFilter::owned_by(&employee.id)
            .of_type(LeaveType::PaidTimeOff)
            .approved()
            .in_year(year)
            .excluding(exclude_leave_id);

        let used = self
            .leaves
            .find_leaves(&filter)
            .await?
            .iter()
            .filter_map(|leave| leave.range().clip_to_year(year))
            .map(|range| range.business_days())
            .sum();

        Ok(used)
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Employee, AppError> {
        self.employees
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {}", employee_id)))
    }
}
