use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::{Attendance, MonthSummary};
use crate::model::permission::Permission;
use crate::service::attendance::ManualAttendance;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Default, ToSchema)]
pub struct ClockReq {
    #[schema(example = "client visit")]
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
    /// Another user's month; needs attendance.view_all
    pub user_id: Option<u64>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = ClockReq,
    responses(
        (status = 200, description = "Checked in successfully", body = Attendance),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "already checked in today",
            "code": "validation"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: Option<web::Json<ClockReq>>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::AttendanceClock)?;
    let note = payload.and_then(|p| p.into_inner().note);
    let day = state
        .attendance
        .check_in(auth.user_id, Local::now().naive_local(), note.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(day))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/check-out",
    request_body = ClockReq,
    responses(
        (status = 200, description = "Checked out; hours and overtime computed", body = Attendance),
        (status = 400, description = "No check-in found for today"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: Option<web::Json<ClockReq>>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::AttendanceClock)?;
    let note = payload.and_then(|p| p.into_inner().note);
    let day = state
        .attendance
        .check_out(auth.user_id, Local::now().naive_local(), note.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(day))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's record, or null before check-in", body = Attendance)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::AttendanceClock)?;
    let day = state
        .attendance
        .today(auth.user_id, Local::now().date_naive())
        .await?;
    Ok(HttpResponse::Ok().json(day))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance/month",
    params(MonthQuery),
    responses(
        (status = 200, description = "Days present and hours for the month", body = MonthSummary),
        (status = 400, description = "Invalid year or month"),
        (status = 403, description = "Another user's month without attendance.view_all")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn month(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    if user_id == auth.user_id {
        auth.require(Permission::AttendanceClock)?;
    } else {
        auth.require(Permission::AttendanceViewAll)?;
    }
    let summary = state
        .attendance
        .month_summary(user_id, query.year, query.month)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Manager correction of one user's day.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/manual",
    request_body = ManualAttendance,
    responses(
        (status = 200, description = "Record stored", body = Attendance),
        (status = 400, description = "check_out before check_in"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn set_manual(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<ManualAttendance>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::AttendanceEdit)?;
    let day = state.attendance.set_manual(&payload).await?;
    state
        .audit
        .record(
            Some(auth.user_id),
            "attendance_set",
            Some(format!("user_id={} date={}", day.user_id, day.date)),
            auth.ip.clone(),
        )
        .await;
    Ok(HttpResponse::Ok().json(day))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{self, authed};
    use crate::model::role::Role;
    use crate::repository::memory::MemoryStore;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn clocking_in_twice_is_rejected() {
        let store = MemoryStore::new();
        let anna = store.add_user("anna", Role::Employee, None);
        let app = test::init_service(App::new().configure(testing::app(&store))).await;
        let token = testing::token(anna, "anna", Role::Employee);

        let req = authed(test::TestRequest::post().uri("/api/v1/attendance/check-in"), &token);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = authed(test::TestRequest::post().uri("/api/v1/attendance/check-in"), &token);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = authed(test::TestRequest::get().uri("/api/v1/attendance/today"), &token);
        let day: Value = test::call_and_read_body_json(&app, req.to_request()).await;
        assert!(day["check_in"].is_string());
    }

    #[actix_web::test]
    async fn manual_entries_need_attendance_edit() {
        let store = MemoryStore::new();
        let boss = store.add_user("boss", Role::Manager, None);
        let anna = store.add_user("anna", Role::Employee, Some(boss));
        let app = test::init_service(App::new().configure(testing::app(&store))).await;
        let body = json!({
            "user_id": anna,
            "date": "2024-03-05",
            "check_in": "09:00:00",
            "check_out": "18:30:00"
        });

        let token = testing::token(anna, "anna", Role::Employee);
        let req = authed(test::TestRequest::put().uri("/api/v1/attendance/manual"), &token).set_json(&body);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let token = testing::token(boss, "boss", Role::Manager);
        let req = authed(test::TestRequest::put().uri("/api/v1/attendance/manual"), &token).set_json(&body);
        let day: Value = test::call_and_read_body_json(&app, req.to_request()).await;
        assert_eq!(day["hours_worked"], 9.5);
        assert_eq!(day["overtime_hours"], 1.5);

        let uri = format!("/api/v1/attendance/month?year=2024&month=3&user_id={anna}");
        let req = authed(test::TestRequest::get().uri(&uri), &token);
        let summary: Value = test::call_and_read_body_json(&app, req.to_request()).await;
        assert_eq!(summary["days_present"], 1);
    }
}
