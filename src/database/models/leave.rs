use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use crate::services::calendar::DateRange;

/// A leave row. `end_date` is exclusive: a Monday to Wednesday leave is stored with a
/// Thursday end so that adjacent bookings never share a day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Leave {
    pub id: Uuid,
    pub owner_id: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
    pub approved_by: Option<String>,
    pub rejected_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What a caller submits when creating or editing a leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestInput {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "camelCase")]
    pub enum LeaveType {
        SickLeave => "sickLeave",
        PaidTimeOff => "paidTimeOff",
        UnpaidTimeOff => "unpaidTimeOff",
        BankHoliday => "bankHoliday",
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl Leave {
    pub fn new(owner_id: impl Into<String>, input: LeaveRequestInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            leave_type: input.leave_type,
            start_date: input.start_date,
            end_date: input.end_date,
            description: input.description,
            approved_by: None,
            rejected_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.approved_by.is_some()
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected_by.is_some()
    }

    pub fn is_bank_holiday(&self) -> bool {
        self.leave_type == LeaveType::BankHoliday
    }

    pub fn status(&self) -> LeaveStatus {
        if self.is_rejected() {
            LeaveStatus::Rejected
        } else if self.is_approved() {
            LeaveStatus::Approved
        } else {
            LeaveStatus::Pending
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Sets the approver and clears any rejection.
    pub fn approve(&mut self, approver_id: impl Into<String>) {
        self.approved_by = Some(approver_id.into());
        self.rejected_by = None;
    }

    /// Sets the rejecter and clears any approval.
    pub fn reject(&mut self, rejecter_id: impl Into<String>) {
        self.rejected_by = Some(rejecter_id.into());
        self.approved_by = None;
    }

    /// Puts the leave back into review.
    pub fn reset_review(&mut self) {
        self.approved_by = None;
        self.rejected_by = None;
    }
}
