use serde::{Deserialize, Serialize};

use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: String,
    pub role_id: u8,
    /// Direct manager; approves this user's leave when set.
    pub manager_id: Option<u64>,
    pub is_active: bool,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub manager_id: Option<u64>,
}
