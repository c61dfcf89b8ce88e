use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::notification::Notification;
use crate::model::permission::Permission;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct ListParams {
    /// Defaults to 20, at most 200
    pub limit: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(ListParams),
    responses((status = 200, description = "Own notifications, newest first", body = [Notification])),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::NotificationsView)?;
    let list = state.notifier.list(auth.user_id, query.limit).await?;
    Ok(HttpResponse::Ok().json(list))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/count",
    responses((status = 200, description = "Unread count", body = Object, example = json!({"unread": 3}))),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn unread_count(auth: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::NotificationsView)?;
    let unread = state.notifier.unread_count(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "unread": unread })))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = u64, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Missing, someone else's, or already read")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_read(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::NotificationsView)?;
    state.notifier.mark_read(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    responses((status = 200, description = "Number marked", body = Object, example = json!({"updated": 4}))),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_read(auth: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::NotificationsView)?;
    let updated = state.notifier.mark_all_read(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    params(("id" = u64, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn delete_notification(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::NotificationsView)?;
    state.notifier.delete(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications",
    responses((status = 200, description = "Number deleted", body = Object, example = json!({"deleted": 4}))),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn delete_all(auth: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::NotificationsView)?;
    let deleted = state.notifier.delete_all(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": deleted })))
}
