use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{Employee, Organization},
    store::EmployeeStore,
    utils::sql,
};
use crate::error::AppError;

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EmployeeStore for EmployeeRepository {
    async fn find_employee(&self, id: &str) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&sql(r#"
            SELECT
                id,
                name,
                country,
                annual_pto,
                manager_id,
                organization_id,
                is_admin
            FROM
                employees
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn direct_reports(&self, manager_id: &str) -> Result<Vec<Employee>, AppError> {
        let employees = sqlx::query_as::<_, Employee>(&sql(r#"
            SELECT
                id,
                name,
                country,
                annual_pto,
                manager_id,
                organization_id,
                is_admin
            FROM
                employees
            WHERE
                manager_id = ?
            ORDER BY
                id
        "#))
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<_, Organization>(&sql(r#"
            SELECT
                id,
                name,
                created_at
            FROM
                organizations
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn employees_in_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Employee>, AppError> {
        let employees = sqlx::query_as::<_, Employee>(&sql(r#"
            SELECT
                id,
                name,
                country,
                annual_pto,
                manager_id,
                organization_id,
                is_admin
            FROM
                employees
            WHERE
                organization_id = ?
            ORDER BY
                id
        "#))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }
}
