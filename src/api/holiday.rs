use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::holiday::{Holiday, HolidayDraft, ProjectedHoliday};
use crate::model::permission::Permission;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct HolidayReq {
    #[schema(example = "Festa del Patrono")]
    pub name: String,
    #[schema(example = "2024-06-24", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// Repeat on the same month/day every year
    #[serde(default)]
    pub recurring: bool,
    pub note: Option<String>,
}

impl From<HolidayReq> for HolidayDraft {
    fn from(req: HolidayReq) -> Self {
        HolidayDraft {
            name: req.name,
            date: req.date,
            recurring: req.recurring,
            note: req.note,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct SeedParam {
    /// Anchor year for the inserted rules; defaults to the current year
    pub year: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/holidays",
    responses(
        (status = 200, description = "Every holiday rule, newest date first", body = [Holiday]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn list_holidays(auth: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::HolidaysView)?;
    Ok(HttpResponse::Ok().json(state.calendar.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/holidays/year/{year}",
    params(("year" = i32, Path, description = "Year to project the rules onto")),
    responses(
        (status = 200, description = "Holidays falling in the year", body = [ProjectedHoliday]),
        (status = 400, description = "Year out of range")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn holidays_for_year(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::HolidaysView)?;
    let holidays = state.calendar.holidays_for_year(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/v1/holidays",
    request_body = HolidayReq,
    responses(
        (status = 201, description = "Holiday added", body = Holiday),
        (status = 400, description = "Empty name or year out of range"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn create_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<HolidayReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::HolidaysEdit)?;
    let holiday = state
        .calendar
        .add(&payload.into_inner().into(), auth.user_id)
        .await?;
    state
        .audit
        .record(
            Some(auth.user_id),
            "holiday_created",
            Some(format!("id={} date={}", holiday.id, holiday.date)),
            auth.ip.clone(),
        )
        .await;
    Ok(HttpResponse::Created().json(holiday))
}

#[utoipa::path(
    put,
    path = "/api/v1/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday ID")),
    request_body = HolidayReq,
    responses(
        (status = 200, description = "Holiday updated", body = Holiday),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn update_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<HolidayReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::HolidaysEdit)?;
    let id = path.into_inner();
    let holiday = state.calendar.update(id, &payload.into_inner().into()).await?;
    state
        .audit
        .record(Some(auth.user_id), "holiday_updated", Some(format!("id={id}")), auth.ip.clone())
        .await;
    Ok(HttpResponse::Ok().json(holiday))
}

#[utoipa::path(
    delete,
    path = "/api/v1/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 204, description = "Holiday deleted"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::HolidaysEdit)?;
    let id = path.into_inner();
    state.calendar.delete(id).await?;
    state
        .audit
        .record(Some(auth.user_id), "holiday_deleted", Some(format!("id={id}")), auth.ip.clone())
        .await;
    Ok(HttpResponse::NoContent().finish())
}

/// Adds the Italian national holidays as recurring rules.
#[utoipa::path(
    post,
    path = "/api/v1/holidays/national",
    params(SeedParam),
    responses(
        (status = 201, description = "Rules inserted; already covered dates are skipped", body = [Holiday]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn seed_national(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<SeedParam>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::HolidaysEdit)?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let inserted = state.calendar.seed_national(year, auth.user_id).await?;
    state
        .audit
        .record(
            Some(auth.user_id),
            "holidays_seeded",
            Some(format!("year={year} inserted={}", inserted.len())),
            auth.ip.clone(),
        )
        .await;
    Ok(HttpResponse::Created().json(inserted))
}
