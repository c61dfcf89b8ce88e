use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::{LeavePage, LeaveQuery, LeaveRequest, LeaveStatus, MonthCalendar, YearSummary};
use crate::model::permission::Permission;
use crate::service::leave::LeaveInput;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 7)]
    /// Filter by user ID (ignored for employees)
    pub user_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Items per page, at most 100
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct YearParam {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// Another user's summary; needs leave.view_all
    pub user_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct MonthParam {
    pub year: i32,
    pub month: u32,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct DecisionReq {
    #[schema(example = "Enjoy your holidays")]
    pub comment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AttachmentReq {
    #[schema(example = "uploads/leave/12/certificate.pdf")]
    pub attachment_ref: String,
}

/// File a leave request; working days are computed server side.
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = LeaveInput,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates, overlap, missing medical code or no working days"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<LeaveInput>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveCreate)?;
    let leave = state.leaves.create(&auth.actor(), &payload).await?;
    Ok(HttpResponse::Created().json(leave))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the pending request to edit")),
    request_body = LeaveInput,
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Leave request not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn edit_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<LeaveInput>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveCreate)?;
    let leave = state
        .leaves
        .edit(&auth.actor(), path.into_inner(), &payload)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/attachment",
    params(("leave_id" = u64, Path, description = "ID of the pending request")),
    request_body = AttachmentReq,
    responses(
        (status = 200, description = "Attachment linked", body = LeaveRequest),
        (status = 409, description = "Leave request not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn attach_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<AttachmentReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveCreate)?;
    let leave = state
        .leaves
        .attach(&auth.actor(), path.into_inner(), &payload.attachment_ref)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/withdraw",
    params(("leave_id" = u64, Path, description = "ID of the pending request to withdraw")),
    responses(
        (status = 200, description = "Leave withdrawn", body = LeaveRequest),
        (status = 409, description = "Leave request not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveCreate)?;
    let leave = state.leaves.withdraw(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve leave (manager/admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed",
            "code": "already_processed"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: Option<web::Json<DecisionReq>>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveApprove)?;
    let comment = payload.and_then(|p| p.into_inner().comment);
    let leave = state
        .leaves
        .approve(&auth.actor(), path.into_inner(), comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave (manager/admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Leave request not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: Option<web::Json<DecisionReq>>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveReject)?;
    let comment = payload.and_then(|p| p.into_inner().comment);
    let leave = state
        .leaves
        .reject(&auth.actor(), path.into_inner(), comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to delete")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveDelete)?;
    state.leaves.delete(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request not found",
            "code": "not_found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveViewOwn)?;
    let leave = state.leaves.get(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint; employees only see their own
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeavePage),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveViewOwn)?;
    let query = LeaveQuery {
        user_id: query.user_id,
        status: query.status,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(0),
    };
    let page = state.leaves.list(&auth.actor(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/summary",
    params(YearParam),
    responses(
        (status = 200, description = "Requests and days per status", body = YearSummary),
        (status = 403, description = "Another user's summary without leave.view_all")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_summary(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<YearParam>,
) -> Result<HttpResponse, ApiError> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    if user_id == auth.user_id {
        auth.require(Permission::LeaveViewOwn)?;
    } else {
        auth.require(Permission::LeaveViewAll)?;
    }
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let summary = state.leaves.summary(user_id, year).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/calendar",
    params(MonthParam),
    responses(
        (status = 200, description = "Absences by date", body = MonthCalendar),
        (status = 400, description = "Invalid year or month"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_calendar(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<MonthParam>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::LeaveViewAll)?;
    let calendar = state.leaves.month_calendar(query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(calendar))
}
