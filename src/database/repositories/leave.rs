use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{Leave, LeaveType},
    store::{LeaveFilter, LeaveStore},
    transaction::PgLeaveTransaction,
    utils::sql,
};
use crate::error::AppError;
use crate::services::calendar::first_day_of_year;

const LEAVE_COLUMNS: &str = r#"
    SELECT
        id,
        owner_id,
        leave_type,
        start_date,
        end_date,
        description,
        approved_by,
        rejected_by,
        created_at
    FROM
        leaves
"#;

// Typed bind values for the dynamically built WHERE clause
enum FilterValue<'a> {
    Str(&'a str),
    Type(LeaveType),
    Date(NaiveDate),
    Id(Uuid),
}

#[derive(Clone)]
pub struct LeaveRepository {
    pool: PgPool,
}

impl LeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the WHERE clause for `filter` with `?` placeholders and the values to bind, in order.
fn build_conditions(filter: &LeaveFilter) -> Result<(Vec<String>, Vec<FilterValue<'_>>), AppError> {
    let mut conditions = Vec::new();
    let mut args = Vec::new();

    if let Some(owner_id) = filter.owner_id.as_deref() {
        conditions.push("owner_id = ?".to_string());
        args.push(FilterValue::Str(owner_id));
    }

    if let Some(leave_type) = filter.leave_type {
        conditions.push("leave_type = ?".to_string());
        args.push(FilterValue::Type(leave_type));
    }

    if let Some(approved) = filter.approved {
        conditions.push(if approved {
            "approved_by IS NOT NULL".to_string()
        } else {
            "approved_by IS NULL".to_string()
        });
    }

    if let Some(rejected) = filter.rejected {
        conditions.push(if rejected {
            "rejected_by IS NOT NULL".to_string()
        } else {
            "rejected_by IS NULL".to_string()
        });
    }

    if let Some(year) = filter.touches_year {
        let (year_start, next_year_start) = first_day_of_year(year)
            .zip(first_day_of_year(year + 1))
            .ok_or_else(|| AppError::invalid_input(format!("Year {} is out of range", year)))?;
        conditions.push("start_date < ? AND end_date > ?".to_string());
        args.push(FilterValue::Date(next_year_start));
        args.push(FilterValue::Date(year_start));
    }

    if let Some(range) = &filter.overlapping {
        conditions.push(
            r#"(
                (? >= start_date AND ? < end_date)
                OR (? > start_date AND ? <= end_date)
                OR (? < start_date AND ? > end_date)
            )"#
            .to_string(),
        );
        args.push(FilterValue::Date(range.start));
        args.push(FilterValue::Date(range.start));
        args.push(FilterValue::Date(range.end));
        args.push(FilterValue::Date(range.end));
        args.push(FilterValue::Date(range.start));
        args.push(FilterValue::Date(range.end));
    }

    if let Some(exclude_id) = filter.exclude_id {
        conditions.push("id <> ?".to_string());
        args.push(FilterValue::Id(exclude_id));
    }

    Ok((conditions, args))
}

impl LeaveStore for LeaveRepository {
    type Transaction = PgLeaveTransaction;

    async fn find_leave(&self, id: Uuid) -> Result<Option<Leave>, AppError> {
        let query = format!("{} WHERE id = ?", LEAVE_COLUMNS);
        let leave = sqlx::query_as::<_, Leave>(&sql(&query))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(leave)
    }

    async fn find_leaves(&self, filter: &LeaveFilter) -> Result<Vec<Leave>, AppError> {
        let (conditions, args) = build_conditions(filter)?;

        let mut query = LEAVE_COLUMNS.to_string();
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY start_date, created_at");

        let query = sql(&query);
        let mut prepared = sqlx::query_as::<_, Leave>(&query);
        for arg in args {
            prepared = match arg {
                FilterValue::Str(s) => prepared.bind(s),
                FilterValue::Type(t) => prepared.bind(t),
                FilterValue::Date(d) => prepared.bind(d),
                FilterValue::Id(id) => prepared.bind(id),
            };
        }

        let leaves = prepared.fetch_all(&self.pool).await?;

        Ok(leaves)
    }

    async fn begin(&self) -> Result<PgLeaveTransaction, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgLeaveTransaction::new(tx))
    }
}
