use crate::api::attendance::ClockReq;
use crate::api::audit::AuditPage;
use crate::api::balance::{InitYearReq, SetBalanceReq};
use crate::api::holiday::HolidayReq;
use crate::api::leave_request::{AttachmentReq, DecisionReq, LeaveFilter};
use crate::model::attendance::{Attendance, AttendanceKind, MonthSummary};
use crate::model::audit::AuditEntry;
use crate::model::holiday::{Holiday, ProjectedHoliday};
use crate::model::leave_balance::{BalanceSummary, LeaveBalance, UserBalance};
use crate::model::leave_request::{
    CalendarEntry, LeavePage, LeaveRequest, LeaveStatus, LeaveType, MonthCalendar, StatusTotals,
    YearSummary,
};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::role::Role;
use crate::models::{LoginReqDto, Profile, TokenPair, UserCreated, UserReq};
use crate::service::attendance::ManualAttendance;
use crate::service::leave::LeaveInput;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

/// Registers the `bearer_auth` scheme the protected paths refer to.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Portal API",
        version = "1.0.0",
        description = r#"
## Leave Portal

Backend of an HR leave-management portal.

### 🔹 Key Features
- **Leave requests**
  - File, edit, attach documents and withdraw while pending
  - Managers and admins approve or reject; every step notifies the people involved
- **Holiday calendar**
  - Fixed and recurring holidays drive the working-day count of each request
- **Leave balance**
  - Yearly allotment per user against approved and pending days
- **Attendance**
  - Daily check-in/check-out with worked and overtime hours
- **Notifications** and an **audit log**

### 🔐 Security
Endpoints under `/api/v1` need a **JWT Bearer** access token from `/auth/login`.
Each endpoint checks one permission of the caller's role.

### 📦 Errors
Failures answer `{"message": ..., "code": ...}`; acting on a request that is
no longer pending answers 409 with code `already_processed`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::create_user,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::edit_leave,
        crate::api::leave_request::attach_leave,
        crate::api::leave_request::withdraw_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::leave_summary,
        crate::api::leave_request::leave_calendar,

        crate::api::balance::my_balance,
        crate::api::balance::all_balances,
        crate::api::balance::user_balance,
        crate::api::balance::set_balance,
        crate::api::balance::init_year,

        crate::api::holiday::list_holidays,
        crate::api::holiday::holidays_for_year,
        crate::api::holiday::create_holiday,
        crate::api::holiday::update_holiday,
        crate::api::holiday::delete_holiday,
        crate::api::holiday::seed_national,

        crate::api::notification::list_notifications,
        crate::api::notification::unread_count,
        crate::api::notification::mark_read,
        crate::api::notification::mark_all_read,
        crate::api::notification::delete_notification,
        crate::api::notification::delete_all,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::month,
        crate::api::attendance::set_manual,

        crate::api::audit::list_audit
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            UserReq,
            UserCreated,
            Profile,
            Role,
            LeaveInput,
            LeaveFilter,
            DecisionReq,
            AttachmentReq,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            LeavePage,
            StatusTotals,
            YearSummary,
            CalendarEntry,
            MonthCalendar,
            LeaveBalance,
            BalanceSummary,
            UserBalance,
            SetBalanceReq,
            InitYearReq,
            Holiday,
            ProjectedHoliday,
            HolidayReq,
            Notification,
            NotificationKind,
            Attendance,
            AttendanceKind,
            MonthSummary,
            ManualAttendance,
            ClockReq,
            AuditEntry,
            AuditPage
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and logout"),
        (name = "Users", description = "Account administration"),
        (name = "Leave", description = "Leave request lifecycle"),
        (name = "Balance", description = "Yearly leave allotments"),
        (name = "Holidays", description = "Company holiday calendar"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Attendance", description = "Daily attendance clocking"),
        (name = "Audit", description = "Audit log of privileged actions"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_scope() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/v1/leave/{leave_id}/approve",
            "/api/v1/balance/init",
            "/api/v1/holidays/national",
            "/api/v1/notifications/read-all",
            "/api/v1/attendance/manual",
            "/api/v1/audit",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn day_counts_are_documented_as_strings() {
        let doc: serde_json::Value =
            serde_json::from_str(&ApiDoc::openapi().to_json().unwrap()).unwrap();
        let schemas = &doc["components"]["schemas"];
        assert_eq!(schemas["BalanceSummary"]["properties"]["remaining"]["type"], "string");
        assert_eq!(schemas["LeaveBalance"]["properties"]["base_days"]["type"], "string");
        assert_eq!(schemas["SetBalanceReq"]["properties"]["base_days"]["type"], "string");
    }
}
