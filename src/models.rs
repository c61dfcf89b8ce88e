use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Admin-created account.
#[derive(Deserialize, ToSchema)]
pub struct UserReq {
    #[schema(example = "anna.rossi")]
    pub username: String,
    pub password: String,
    #[schema(example = "Anna Rossi")]
    pub full_name: String,
    #[schema(example = "anna.rossi@example.com")]
    pub email: Option<String>,
    pub role: Role,
    /// Direct manager; approves this user's leave
    pub manager_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserCreated {
    pub id: u64,
    pub username: String,
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
pub struct Profile {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    #[schema(example = json!(["leave.create", "leave.view_own"]))]
    pub permissions: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "anna.rossi")]
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
