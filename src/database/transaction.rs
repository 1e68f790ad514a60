use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{models::Leave, store::LeaveTransaction, utils::sql};
use crate::error::AppError;

/// A Postgres transaction carrying leave writes.
#[derive(Debug)]
pub struct PgLeaveTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgLeaveTransaction {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

impl LeaveTransaction for PgLeaveTransaction {
    async fn insert_leave(&mut self, leave: &Leave) -> Result<Leave, AppError> {
        let inserted = sqlx::query_as::<_, Leave>(&sql(r#"
            INSERT INTO
                leaves (
                    id,
                    owner_id,
                    leave_type,
                    start_date,
                    end_date,
                    description,
                    approved_by,
                    rejected_by,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                owner_id,
                leave_type,
                start_date,
                end_date,
                description,
                approved_by,
                rejected_by,
                created_at
        "#))
        .bind(leave.id)
        .bind(&leave.owner_id)
        .bind(leave.leave_type)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.description)
        .bind(&leave.approved_by)
        .bind(&leave.rejected_by)
        .bind(leave.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(inserted)
    }

    async fn update_leave(&mut self, leave: &Leave) -> Result<Leave, AppError> {
        let updated = sqlx::query_as::<_, Leave>(&sql(r#"
            UPDATE
                leaves
            SET
                leave_type = ?,
                start_date = ?,
                end_date = ?,
                description = ?,
                approved_by = ?,
                rejected_by = ?
            WHERE
                id = ?
            RETURNING
                id,
                owner_id,
                leave_type,
                start_date,
                end_date,
                description,
                approved_by,
                rejected_by,
                created_at
        "#))
        .bind(leave.leave_type)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.description)
        .bind(&leave.approved_by)
        .bind(&leave.rejected_by)
        .bind(leave.id)
        .fetch_optional(&mut *self.tx)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Leave {}", leave.id)))
    }

    async fn delete_leave(&mut self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(&sql("DELETE FROM leaves WHERE id = ?"))
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Leave {}", id)));
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::from)
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await.map_err(AppError::from)
    }
}
