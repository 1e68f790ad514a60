use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::database::{
    models::{LeaveRequestInput, LeaveType},
    store::{EmployeeStore, LeaveStore},
};
use crate::error::AppError;
use crate::services::{balance::BalanceCalculator, calendar::DateRange};

/// Why a leave request is not allowed. The message is shown to the requester as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Bank holidays cannot be modified")]
    BankHolidayImmutable,

    #[error("Cannot update rejected leave")]
    UpdateRejected,

    #[error("An approved leave cannot be moved to a past date")]
    ApprovedLeaveInPast,

    #[error("A bank holiday cannot span more than one day")]
    BankHolidayTooLong,

    #[error("Bank holidays are created by the system and cannot be requested")]
    BankHolidayRequested,

    #[error("Leave cannot start or end on a past date")]
    PastDate,

    #[error("End date cannot be before start date")]
    EndBeforeStart,

    #[error(
        "Insufficient paid time off for {year}: {requested} days requested, {available} available"
    )]
    InsufficientBalance {
        requested: i64,
        available: i64,
        year: i32,
    },
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::InsufficientBalance {
                requested,
                available,
                year,
            } => AppError::InsufficientBalance {
                requested,
                available,
                year,
            },
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Rejection),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn into_result(self) -> Result<(), Rejection> {
        match self {
            ValidationOutcome::Valid => Ok(()),
            ValidationOutcome::Invalid(rejection) => Err(rejection),
        }
    }
}

/// Decides whether a leave may be created or edited. Read-only: safe to call on every
/// keystroke of a form.
pub struct LeaveValidator<'a, E, L> {
    employees: &'a E,
    leaves: &'a L,
}

impl<'a, E: EmployeeStore, L: LeaveStore> LeaveValidator<'a, E, L> {
    pub fn new(employees: &'a E, leaves: &'a L) -> Self {
        Self { employees, leaves }
    }

    /// Runs the checks in order and reports the first failure. `leave_id` selects the update
    /// path. Missing leaves or owners and store failures are errors, not outcomes.
    pub async fn validate(
        &self,
        request: &LeaveRequestInput,
        owner_id: &str,
        leave_id: Option<Uuid>,
        today: NaiveDate,
    ) -> Result<ValidationOutcome, AppError> {
        let range = DateRange::new(request.start_date, request.end_date);

        match leave_id {
            Some(id) => {
                let existing = self
                    .leaves
                    .find_leave(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Leave {}", id)))?;

                if existing.is_bank_holiday() {
                    return Ok(Rejection::BankHolidayImmutable.into());
                }
                if existing.is_rejected() {
                    return Ok(Rejection::UpdateRejected.into());
                }
                if existing.is_approved() && request.start_date < today {
                    return Ok(Rejection::ApprovedLeaveInPast.into());
                }
                if request.leave_type == LeaveType::BankHoliday {
                    if range.len_days() > 1 {
                        return Ok(Rejection::BankHolidayTooLong.into());
                    }
                    // only the system turns a day into a bank holiday
                    return Ok(Rejection::BankHolidayRequested.into());
                }
            }
            None => {
                if request.leave_type == LeaveType::BankHoliday {
                    return Ok(Rejection::BankHolidayRequested.into());
                }
            }
        }

        if request.start_date < today || request.end_date < today {
            return Ok(Rejection::PastDate.into());
        }

        if request.end_date < request.start_date {
            return Ok(Rejection::EndBeforeStart.into());
        }

        if self.employees.find_employee(owner_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Employee {}", owner_id)));
        }

        if request.leave_type == LeaveType::PaidTimeOff {
            if let Some(rejection) = self.check_balance(owner_id, range, leave_id).await? {
                return Ok(rejection.into());
            }
        }

        Ok(ValidationOutcome::Valid)
    }

    /// Checks that every calendar year the range touches has enough paid time off left for
    /// the business days requested in it.
    pub async fn check_balance(
        &self,
        owner_id: &str,
        range: DateRange,
        leave_id: Option<Uuid>,
    ) -> Result<Option<Rejection>, AppError> {
        let balances = BalanceCalculator::new(self.employees, self.leaves);

        for year in range.years() {
            let Some(part) = range.clip_to_year(year) else {
                continue;
            };
            let requested = part.business_days();
            if requested == 0 {
                continue;
            }

            let available = balances.remaining_pto(owner_id, year, leave_id).await?;
            if requested > available {
                log::debug!(
                    "Balance check failed for {}: {} requested, {} available in {}",
                    owner_id,
                    requested,
                    available,
                    year
                );
                return Ok(Some(Rejection::InsufficientBalance {
                    requested,
                    available,
                    year,
                }));
            }
        }

        Ok(None)
    }
}

impl From<Rejection> for ValidationOutcome {
    fn from(rejection: Rejection) -> Self {
        ValidationOutcome::Invalid(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryStore;
    use crate::database::models::{Employee, Leave};
    use chrono::Days;
    use pretty_assertions::assert_eq;

    const OWNER: &str = "ada@example.com";

    // A Friday
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 1).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveRequestInput {
        LeaveRequestInput {
            leave_type,
            start_date: start,
            end_date: end,
            description: None,
        }
    }

    async fn store(allotment: i32) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_employee(Employee {
                id: OWNER.to_string(),
                name: "Ada".to_string(),
                country: "GB".to_string(),
                annual_pto: allotment,
                manager_id: Some("boss@example.com".to_string()),
                organization_id: Uuid::nil(),
                is_admin: false,
            })
            .await;
        store
    }

    async fn seed(store: &InMemoryStore, request: LeaveRequestInput) -> Leave {
        let leave = Leave::new(OWNER, request);
        store.add_leave(leave.clone()).await;
        leave
    }

    async fn validate(
        store: &InMemoryStore,
        request: &LeaveRequestInput,
        leave_id: Option<Uuid>,
    ) -> ValidationOutcome {
        LeaveValidator::new(store, store)
            .validate(request, OWNER, leave_id, today())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_paid_time_off() {
        let store = store(15).await;
        let req = request(LeaveType::PaidTimeOff, date(2030, 3, 4), date(2030, 3, 6));

        assert_eq!(validate(&store, &req, None).await, ValidationOutcome::Valid);
    }

    #[tokio::test]
    async fn test_start_yesterday_is_past_date() {
        let store = store(15).await;
        let yesterday = today() - Days::new(1);
        let req = request(LeaveType::SickLeave, yesterday, date(2030, 3, 6));

        let outcome = validate(&store, &req, None).await;
        assert_eq!(outcome, ValidationOutcome::Invalid(Rejection::PastDate));
        assert!(Rejection::PastDate.to_string().contains("past date"));
    }

    #[tokio::test]
    async fn test_leave_starting_today_is_allowed() {
        let store = store(15).await;
        let req = request(LeaveType::UnpaidTimeOff, today(), today());

        assert!(validate(&store, &req, None).await.is_valid());
    }

    #[tokio::test]
    async fn test_end_before_start() {
        let store = store(15).await;
        let req = request(LeaveType::SickLeave, date(2030, 3, 6), date(2030, 3, 4));

        assert_eq!(
            validate(&store, &req, None).await,
            ValidationOutcome::Invalid(Rejection::EndBeforeStart)
        );
    }

    #[tokio::test]
    async fn test_insufficient_balance_names_counts() {
        let store = store(5).await;
        // Two full work weeks: Monday 4th to Monday 18th
        let req = request(LeaveType::PaidTimeOff, date(2030, 3, 4), date(2030, 3, 18));

        let outcome = validate(&store, &req, None).await;
        let expected = Rejection::InsufficientBalance {
            requested: 10,
            available: 5,
            year: 2030,
        };
        assert_eq!(outcome, ValidationOutcome::Invalid(expected.clone()));

        let message = expected.to_string();
        assert!(message.contains("10"));
        assert!(message.contains("5"));
        assert!(message.contains("2030"));
    }

    #[tokio::test]
    async fn test_unpaid_leave_ignores_balance() {
        let store = store(0).await;
        let req = request(LeaveType::UnpaidTimeOff, date(2030, 3, 4), date(2030, 3, 18));

        assert!(validate(&store, &req, None).await.is_valid());
    }

    #[tokio::test]
    async fn test_creating_bank_holiday_is_rejected() {
        let store = store(15).await;
        let req = request(LeaveType::BankHoliday, date(2030, 3, 4), date(2030, 3, 5));

        assert_eq!(
            validate(&store, &req, None).await,
            ValidationOutcome::Invalid(Rejection::BankHolidayRequested)
        );
    }

    #[tokio::test]
    async fn test_updating_rejected_leave() {
        let store = store(15).await;
        let req = request(LeaveType::SickLeave, date(2030, 3, 4), date(2030, 3, 5));
        let mut leave = Leave::new(OWNER, req.clone());
        leave.reject("boss@example.com");
        store.add_leave(leave.clone()).await;

        let outcome = validate(&store, &req, Some(leave.id)).await;
        assert_eq!(outcome, ValidationOutcome::Invalid(Rejection::UpdateRejected));
        assert!(
            Rejection::UpdateRejected
                .to_string()
                .to_lowercase()
                .contains("cannot update rejected")
        );
    }

    #[tokio::test]
    async fn test_updating_bank_holiday() {
        let store = store(15).await;
        let holiday = seed(
            &store,
            request(LeaveType::BankHoliday, date(2030, 3, 4), date(2030, 3, 5)),
        )
        .await;
        let req = request(LeaveType::SickLeave, date(2030, 3, 4), date(2030, 3, 5));

        assert_eq!(
            validate(&store, &req, Some(holiday.id)).await,
            ValidationOutcome::Invalid(Rejection::BankHolidayImmutable)
        );
    }

    #[tokio::test]
    async fn test_update_cannot_turn_leave_into_bank_holiday() {
        let store = store(15).await;
        let leave = seed(
            &store,
            request(LeaveType::SickLeave, date(2030, 3, 4), date(2030, 3, 5)),
        )
        .await;

        let too_long = request(LeaveType::BankHoliday, date(2030, 3, 4), date(2030, 3, 6));
        assert_eq!(
            validate(&store, &too_long, Some(leave.id)).await,
            ValidationOutcome::Invalid(Rejection::BankHolidayTooLong)
        );

        let one_day = request(LeaveType::BankHoliday, date(2030, 3, 4), date(2030, 3, 5));
        assert_eq!(
            validate(&store, &one_day, Some(leave.id)).await,
            ValidationOutcome::Invalid(Rejection::BankHolidayRequested)
        );
    }

    #[tokio::test]
    async fn test_approved_leave_cannot_move_into_past() {
        let store = store(15).await;
        let mut leave = Leave::new(
            OWNER,
            request(LeaveType::SickLeave, date(2030, 3, 4), date(2030, 3, 5)),
        );
        leave.approve("boss@example.com");
        store.add_leave(leave.clone()).await;

        let req = request(LeaveType::SickLeave, date(2030, 2, 25), date(2030, 3, 5));
        assert_eq!(
            validate(&store, &req, Some(leave.id)).await,
            ValidationOutcome::Invalid(Rejection::ApprovedLeaveInPast)
        );
    }

    #[tokio::test]
    async fn test_update_excludes_own_balance() {
        let store = store(5).await;
        let mut leave = Leave::new(
            OWNER,
            request(LeaveType::PaidTimeOff, date(2030, 3, 4), date(2030, 3, 11)),
        );
        leave.approve("boss@example.com");
        store.add_leave(leave.clone()).await;

        // Same five days again: only fits if the leave does not count against itself
        let req = request(LeaveType::PaidTimeOff, date(2030, 3, 4), date(2030, 3, 11));
        assert!(validate(&store, &req, Some(leave.id)).await.is_valid());
        assert!(!validate(&store, &req, None).await.is_valid());
    }

    #[tokio::test]
    async fn test_missing_leave_and_owner_are_errors() {
        let store = store(15).await;
        let validator = LeaveValidator::new(&store, &store);
        let req = request(LeaveType::SickLeave, date(2030, 3, 4), date(2030, 3, 5));

        let err = validator
            .validate(&req, OWNER, Some(Uuid::new_v4()), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = validator
            .validate(&req, "ghost@example.com", None, today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_year_split_checks_each_year() {
        // Saturday 28 Dec 2030 to Friday 3 Jan 2031: two days in each year
        let req = request(LeaveType::PaidTimeOff, date(2030, 12, 28), date(2031, 1, 3));
        let range = DateRange::new(req.start_date, req.end_date);
        let first = range.clip_to_year(2030).unwrap().business_days();
        let second = range.clip_to_year(2031).unwrap().business_days();
        assert_eq!((first, second), (2, 2));
        assert_eq!(first + second, range.business_days());

        let store = store(2).await;
        assert!(validate(&store, &req, None).await.is_valid());

        // Use one day of 2031 so that only the second half fails
        let mut taken = Leave::new(
            OWNER,
            request(LeaveType::PaidTimeOff, date(2031, 2, 3), date(2031, 2, 4)),
        );
        taken.approve("boss@example.com");
        store.add_leave(taken).await;

        assert_eq!(
            validate(&store, &req, None).await,
            ValidationOutcome::Invalid(Rejection::InsufficientBalance {
                requested: 2,
                available: 1,
                year: 2031,
            })
        );
    }

    #[test]
    fn test_rejection_maps_to_app_error() {
        let err: AppError = Rejection::InsufficientBalance {
            requested: 10,
            available: 5,
            year: 2030,
        }
        .into();
        assert!(matches!(
            err,
            AppError::InsufficientBalance {
                requested: 10,
                available: 5,
                year: 2030
            }
        ));

        let err: AppError = Rejection::PastDate.into();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m.contains("past date")));
    }
}
