use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::audit::AuditEntry;
use crate::model::permission::Permission;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct AuditParams {
    pub page: Option<u64>,
    /// Defaults to 50, at most 100
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AuditPage {
    pub data: Vec<AuditEntry>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/audit",
    params(AuditParams),
    responses(
        (status = 200, description = "Audit entries, newest first", body = AuditPage),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Audit"
)]
pub async fn list_audit(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<AuditParams>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::AuditView)?;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
    let (data, total) = state.audit.list(page, per_page).await?;
    Ok(HttpResponse::Ok().json(AuditPage {
        data,
        page,
        per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{self, authed};
    use crate::model::role::Role;
    use crate::repository::memory::MemoryStore;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn withdrawals_are_audited_for_admins() {
        let store = MemoryStore::new();
        let admin = store.add_user("root", Role::Admin, None);
        let anna = store.add_user("anna", Role::Employee, None);
        let app = test::init_service(App::new().configure(testing::app(&store))).await;
        let anna_token = testing::token(anna, "anna", Role::Employee);

        let req = authed(test::TestRequest::post().uri("/api/v1/leave"), &anna_token).set_json(json!({
            "start_date": "2024-03-04",
            "end_date": "2024-03-04",
            "leave_type": "vacation"
        }));
        let created: Value = test::call_and_read_body_json(&app, req.to_request()).await;
        let uri = format!("/api/v1/leave/{}/withdraw", created["id"]);
        let req = authed(test::TestRequest::put().uri(&uri), &anna_token);
        let withdrawn: Value = test::call_and_read_body_json(&app, req.to_request()).await;
        assert_eq!(withdrawn["status"], "rejected");

        let req = authed(test::TestRequest::get().uri("/api/v1/audit"), &anna_token);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let token = testing::token(admin, "root", Role::Admin);
        let req = authed(test::TestRequest::get().uri("/api/v1/audit?per_page=1"), &token);
        let page: Value = test::call_and_read_body_json(&app, req.to_request()).await;
        assert_eq!(page["total"], 2);
        assert_eq!(page["data"][0]["action"], "leave_withdrawn");
    }
}
