use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow, ToSchema)]
pub struct LeaveBalance {
    pub user_id: u64,
    pub year: i32,
    #[schema(value_type = String, example = "26")]
    pub base_days: Decimal,
    #[schema(value_type = String, example = "2")]
    pub bonus_days: Decimal,
    pub note: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    pub fn entitled(&self) -> Decimal {
        self.base_days + self.bonus_days
    }
}

/// Entitlement against consumption for one user and year.
///
/// `remaining` only ever subtracts approved days.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[schema(example = json!({
    "user_id": 7,
    "year": 2024,
    "entitled": "26",
    "used": "10",
    "pending": "5",
    "remaining": "16",
    "configured": true
}))]
pub struct BalanceSummary {
    pub user_id: u64,
    pub year: i32,
    #[schema(value_type = String)]
    pub entitled: Decimal,
    #[schema(value_type = String)]
    pub used: Decimal,
    #[schema(value_type = String)]
    pub pending: Decimal,
    #[schema(value_type = String)]
    pub remaining: Decimal,
    pub configured: bool,
}

impl BalanceSummary {
    pub fn new(user_id: u64, year: i32, balance: Option<&LeaveBalance>, used: i64, pending: i64) -> Self {
        let entitled = balance.map(LeaveBalance::entitled).unwrap_or_default();
        let used = Decimal::from(used);
        BalanceSummary {
            user_id,
            year,
            entitled,
            used,
            pending: Decimal::from(pending),
            remaining: entitled - used,
            configured: balance.is_some(),
        }
    }
}

/// One row of the yearly overview.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct UserBalance {
    pub username: String,
    pub full_name: String,
    pub balance: BalanceSummary,
}
