use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An employee. The id is unique across organizations (an e-mail address) and doubles as
/// the notification address.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub country: String,
    pub annual_pto: i32,
    pub manager_id: Option<String>,
    pub organization_id: Uuid,
    pub is_admin: bool,
}

impl Employee {
    /// The organization head is the only employee without a manager.
    pub fn is_head(&self) -> bool {
        self.manager_id.is_none()
    }

    pub fn email(&self) -> &str {
        &self.id
    }
}
