use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::ServiceError;
use crate::model::leave_balance::{BalanceSummary, LeaveBalance, UserBalance};
use crate::model::leave_request::LeaveStatus;
use crate::repository::balance_repo::BalanceRepository;
use crate::repository::leave_repo::LeaveRepository;
use crate::repository::user_repo::UserRepository;
use crate::service::calendar::validate_year;

/// Upper bound for a single allotment field.
pub const MAX_DAYS: Decimal = Decimal::from_parts(366, 0, 0, false, 0);

fn validate_days(label: &str, days: Decimal) -> Result<Decimal, ServiceError> {
    if days < Decimal::ZERO || days > MAX_DAYS {
        return Err(ServiceError::validation(format!(
            "{label} must be between 0 and {MAX_DAYS}"
        )));
    }
    Ok(days.round_dp(1))
}

pub struct BalanceLedger {
    balances: Arc<dyn BalanceRepository>,
    leaves: Arc<dyn LeaveRepository>,
    users: Arc<dyn UserRepository>,
}

impl BalanceLedger {
    pub fn new(
        balances: Arc<dyn BalanceRepository>,
        leaves: Arc<dyn LeaveRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { balances, leaves, users }
    }

    /// Entitlement minus approved days; pending days are reported but never subtracted.
    pub async fn balance(&self, user_id: u64, year: i32) -> Result<BalanceSummary, ServiceError> {
        validate_year(year)?;
        let row = self.balances.find(user_id, year).await?;
        let totals = self.leaves.totals_by_status(user_id, year).await?;
        let days = |status: LeaveStatus| totals.get(&status).map(|t| t.days).unwrap_or(0);

        Ok(BalanceSummary::new(
            user_id,
            year,
            row.as_ref(),
            days(LeaveStatus::Approved),
            days(LeaveStatus::Pending),
        ))
    }

    pub async fn set_balance(
        &self,
        user_id: u64,
        year: i32,
        base_days: Decimal,
        bonus_days: Decimal,
        note: Option<&str>,
    ) -> Result<LeaveBalance, ServiceError> {
        validate_year(year)?;
        let base_days = validate_days("base_days", base_days)?;
        let bonus_days = validate_days("bonus_days", bonus_days)?;
        if self.users.find(user_id).await?.is_none() {
            return Err(ServiceError::NotFound("user"));
        }

        let note = note.map(str::trim).filter(|n| !n.is_empty());
        let saved = self
            .balances
            .upsert(user_id, year, base_days, bonus_days, note)
            .await?;
        info!(user_id, year, base = %base_days, bonus = %bonus_days, "Leave balance set");
        Ok(saved)
    }

    /// Gives every active user without a row for `year` the default allotment.
    /// Returns how many rows were created.
    pub async fn init_year(&self, year: i32, default_days: Decimal) -> Result<u64, ServiceError> {
        validate_year(year)?;
        let default_days = validate_days("default_days", default_days)?;

        let mut created = 0;
        for user in self.users.list_active().await? {
            if self.balances.find(user.id, year).await?.is_some() {
                continue;
            }
            self.balances
                .upsert(user.id, year, default_days, Decimal::ZERO, Some("Automatic initialization"))
                .await?;
            created += 1;
        }
        info!(year, created, "Leave balances initialized");
        Ok(created)
    }

    pub async fn balances_for_year(&self, year: i32) -> Result<Vec<UserBalance>, ServiceError> {
        validate_year(year)?;
        let mut overview = Vec::new();
        for user in self.users.list_active().await? {
            let balance = self.balance(user.id, year).await?;
            overview.push(UserBalance {
                username: user.username,
                full_name: user.full_name,
                balance,
            });
        }
        Ok(overview)
    }
}
