use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_balance::{BalanceSummary, LeaveBalance, UserBalance};
use crate::model::permission::Permission;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct BalanceYear {
    /// Defaults to the current year
    pub year: Option<i32>,
}

impl BalanceYear {
    fn or_current(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SetBalanceReq {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(value_type = String, example = "26")]
    pub base_days: Decimal,
    #[schema(value_type = String, example = "2")]
    #[serde(default)]
    pub bonus_days: Decimal,
    #[schema(example = "seniority bonus")]
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct InitYearReq {
    #[schema(example = 2025)]
    pub year: i32,
    /// Falls back to the configured default allotment
    #[schema(value_type = Option<String>, example = "26")]
    pub default_days: Option<Decimal>,
}

#[utoipa::path(
    get,
    path = "/api/v1/balance",
    params(BalanceYear),
    responses(
        (status = 200, description = "Own balance for the year", body = BalanceSummary),
        (status = 400, description = "Year out of range")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn my_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<BalanceYear>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::BudgetViewOwn)?;
    let summary = state.balances.balance(auth.user_id, query.or_current()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/balance/all",
    params(BalanceYear),
    responses(
        (status = 200, description = "Balance of every active user", body = [UserBalance]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn all_balances(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<BalanceYear>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::BudgetViewAll)?;
    let overview = state.balances.balances_for_year(query.or_current()).await?;
    Ok(HttpResponse::Ok().json(overview))
}

#[utoipa::path(
    get,
    path = "/api/v1/balance/{user_id}",
    params(("user_id" = u64, Path, description = "User ID"), BalanceYear),
    responses(
        (status = 200, description = "The user's balance for the year", body = BalanceSummary),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn user_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    query: web::Query<BalanceYear>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::BudgetViewAll)?;
    let summary = state
        .balances
        .balance(path.into_inner(), query.or_current())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    put,
    path = "/api/v1/balance/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body = SetBalanceReq,
    responses(
        (status = 200, description = "Allotment stored", body = LeaveBalance),
        (status = 400, description = "Negative or oversized day counts"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn set_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<SetBalanceReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::BudgetEdit)?;
    let user_id = path.into_inner();
    let saved = state
        .balances
        .set_balance(
            user_id,
            payload.year,
            payload.base_days,
            payload.bonus_days,
            payload.note.as_deref(),
        )
        .await?;
    state
        .audit
        .record(
            Some(auth.user_id),
            "balance_set",
            Some(format!(
                "user_id={user_id} year={} base={} bonus={}",
                saved.year, saved.base_days, saved.bonus_days
            )),
            auth.ip.clone(),
        )
        .await;
    Ok(HttpResponse::Ok().json(saved))
}

#[utoipa::path(
    post,
    path = "/api/v1/balance/init",
    request_body = InitYearReq,
    responses(
        (status = 200, description = "Rows created for users without one", body = Object, example = json!({
            "year": 2025,
            "created": 12
        })),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn init_year(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<InitYearReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::BudgetEdit)?;
    let days = payload.default_days.unwrap_or(state.default_leave_days);
    let created = state.balances.init_year(payload.year, days).await?;
    state
        .audit
        .record(
            Some(auth.user_id),
            "balances_initialized",
            Some(format!("year={} days={days} created={created}", payload.year)),
            auth.ip.clone(),
        )
        .await;
    Ok(HttpResponse::Ok().json(json!({ "year": payload.year, "created": created })))
}
