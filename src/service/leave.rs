use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::model::leave_request::{
    CalendarEntry, LeaveAction, LeaveDraft, LeavePage, LeaveQuery, LeaveRequest, LeaveStatus,
    LeaveType, MonthCalendar, YearSummary, transition,
};
use crate::model::notification::{NewNotification, NotificationKind};
use crate::model::permission::Permission;
use crate::model::role::Role;
use crate::model::user::User;
use crate::repository::leave_repo::LeaveRepository;
use crate::repository::user_repo::UserRepository;
use crate::service::Actor;
use crate::service::audit::AuditTrail;
use crate::service::calendar::{HolidayCalendar, validate_year};
use crate::service::notifier::Notifier;

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;
const MAX_NOTE_LEN: usize = 1000;
const MAX_ATTACHMENT_REF_LEN: usize = 255;
const MAX_MEDICAL_CODE_LEN: usize = 64;

/// Fields an employee submits when filing or editing a request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveInput {
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "vacation")]
    pub leave_type: LeaveType,
    #[schema(example = "family trip")]
    pub note: Option<String>,
    /// Required for sickness, ignored otherwise.
    #[schema(example = "INPS-123456")]
    pub medical_code: Option<String>,
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct LeaveService {
    leaves: Arc<dyn LeaveRepository>,
    users: Arc<dyn UserRepository>,
    calendar: Arc<HolidayCalendar>,
    notifier: Arc<Notifier>,
    audit: Arc<AuditTrail>,
}

impl LeaveService {
    pub fn new(
        leaves: Arc<dyn LeaveRepository>,
        users: Arc<dyn UserRepository>,
        calendar: Arc<HolidayCalendar>,
        notifier: Arc<Notifier>,
        audit: Arc<AuditTrail>,
    ) -> Self {
        Self {
            leaves,
            users,
            calendar,
            notifier,
            audit,
        }
    }

    /// Validates `input` for `owner` and computes its working days.
    async fn prepare(
        &self,
        owner: u64,
        input: &LeaveInput,
        exclude_id: Option<u64>,
    ) -> Result<LeaveDraft, ServiceError> {
        let (start, end) = (input.start_date, input.end_date);
        if start > end {
            return Err(ServiceError::validation("start_date cannot be after end_date"));
        }
        validate_year(start.year())?;
        validate_year(end.year())?;

        let medical_code = if input.leave_type.requires_medical_code() {
            Some(clean(input.medical_code.as_deref()).ok_or_else(|| {
                ServiceError::validation("medical_code is required for sickness leave")
            })?)
        } else {
            None
        };
        if medical_code.as_ref().is_some_and(|c| c.chars().count() > MAX_MEDICAL_CODE_LEN) {
            return Err(ServiceError::validation(format!(
                "medical_code must be at most {MAX_MEDICAL_CODE_LEN} characters"
            )));
        }

        let note = clean(input.note.as_deref());
        if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_LEN) {
            return Err(ServiceError::validation(format!(
                "note must be at most {MAX_NOTE_LEN} characters"
            )));
        }

        let clashing = self.leaves.find_holding(owner, start, end, exclude_id).await?;
        if let Some(other) = clashing
            .iter()
            .find(|l| l.holds_period() && l.overlaps(start, end))
        {
            return Err(ServiceError::validation(format!(
                "overlaps leave request {} ({} to {})",
                other.id, other.start_date, other.end_date
            )));
        }

        let total_days = self.calendar.working_days(start, end).await?;
        if total_days == 0 {
            return Err(ServiceError::validation(
                "the selected range contains no working days",
            ));
        }

        Ok(LeaveDraft {
            start_date: start,
            end_date: end,
            total_days,
            leave_type: input.leave_type,
            note,
            medical_code,
        })
    }

    async fn user(&self, user_id: u64) -> Result<User, ServiceError> {
        self.users
            .find(user_id)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    /// The direct manager when set and active, otherwise every active admin.
    async fn approvers(&self, requester: &User) -> Result<Vec<User>, ServiceError> {
        if let Some(manager_id) = requester.manager_id {
            if let Some(manager) = self.users.find(manager_id).await?.filter(|m| m.is_active) {
                return Ok(vec![manager]);
            }
        }
        Ok(self
            .users
            .active_with_role(Role::Admin)
            .await?
            .into_iter()
            .filter(|admin| admin.id != requester.id)
            .collect())
    }

    async fn notify_approvers(
        &self,
        requester: &User,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) {
        let approvers = match self.approvers(requester).await {
            Ok(approvers) => approvers,
            Err(e) => {
                warn!(error = %e, user_id = requester.id, "Failed to resolve approvers");
                return;
            }
        };
        for approver in approvers {
            self.notifier
                .notify_quietly(NewNotification {
                    user_id: approver.id,
                    kind,
                    title: title.to_string(),
                    message: Some(message.clone()),
                })
                .await;
        }
    }

    /// A request owned by `owner` that still accepts `action`. Anything else,
    /// including someone else's request, reads as already processed.
    async fn owned(
        &self,
        id: u64,
        owner: u64,
        action: LeaveAction,
    ) -> Result<(LeaveRequest, LeaveStatus), ServiceError> {
        let leave = self
            .leaves
            .find(id)
            .await?
            .filter(|l| l.user_id == owner)
            .ok_or(ServiceError::AlreadyProcessed)?;
        let next = transition(leave.status, action)?;
        Ok((leave, next))
    }

    async fn reload(&self, id: u64) -> Result<LeaveRequest, ServiceError> {
        self.leaves
            .find(id)
            .await?
            .ok_or(ServiceError::NotFound("leave request"))
    }

    pub async fn create(&self, actor: &Actor, input: &LeaveInput) -> Result<LeaveRequest, ServiceError> {
        let requester = self.user(actor.user_id).await?;
        let draft = self.prepare(requester.id, input, None).await?;
        let id = self.leaves.insert(requester.id, &draft).await?;
        info!(
            leave_id = id,
            user_id = requester.id,
            total_days = draft.total_days,
            "Leave request created"
        );

        self.notifier
            .notify_quietly(NewNotification {
                user_id: requester.id,
                kind: NotificationKind::LeaveCreated,
                title: "Leave request submitted".to_string(),
                message: Some(format!(
                    "Your {} request from {} to {} ({} working days) is awaiting approval.",
                    draft.leave_type, draft.start_date, draft.end_date, draft.total_days
                )),
            })
            .await;
        self.notify_approvers(
            &requester,
            NotificationKind::LeaveSubmitted,
            "New leave request to review",
            format!(
                "{} requested {} from {} to {} ({} working days).",
                requester.full_name, draft.leave_type, draft.start_date, draft.end_date, draft.total_days
            ),
        )
        .await;
        self.audit
            .record(
                Some(actor.user_id),
                "leave_created",
                Some(format!("id={id} days={}", draft.total_days)),
                actor.ip.clone(),
            )
            .await;

        self.reload(id).await
    }

    pub async fn edit(&self, actor: &Actor, id: u64, input: &LeaveInput) -> Result<LeaveRequest, ServiceError> {
        let (current, next) = self.owned(id, actor.user_id, LeaveAction::Edit).await?;
        let draft = self.prepare(current.user_id, input, Some(id)).await?;
        if !self
            .leaves
            .update_draft(id, actor.user_id, current.status, &draft)
            .await?
        {
            return Err(ServiceError::AlreadyProcessed);
        }
        info!(leave_id = id, status = %next, total_days = draft.total_days, "Leave request edited");
        self.audit
            .record(
                Some(actor.user_id),
                "leave_updated",
                Some(format!("id={id} days={}", draft.total_days)),
                actor.ip.clone(),
            )
            .await;

        self.reload(id).await
    }

    pub async fn attach(&self, actor: &Actor, id: u64, attachment_ref: &str) -> Result<LeaveRequest, ServiceError> {
        let reference = attachment_ref.trim();
        if reference.is_empty() || reference.chars().count() > MAX_ATTACHMENT_REF_LEN {
            return Err(ServiceError::validation(format!(
                "attachment_ref must be 1 to {MAX_ATTACHMENT_REF_LEN} characters"
            )));
        }
        let (current, _) = self.owned(id, actor.user_id, LeaveAction::Attach).await?;
        if !self
            .leaves
            .set_attachment(id, actor.user_id, current.status, reference)
            .await?
        {
            return Err(ServiceError::AlreadyProcessed);
        }
        info!(leave_id = id, "Attachment linked to leave request");

        self.reload(id).await
    }

    /// The owner takes back a pending request; it lands in `rejected`.
    pub async fn withdraw(&self, actor: &Actor, id: u64) -> Result<LeaveRequest, ServiceError> {
        let (current, next) = self.owned(id, actor.user_id, LeaveAction::Withdraw).await?;
        if !self
            .leaves
            .set_status(id, Some(actor.user_id), current.status, next, None)
            .await?
        {
            return Err(ServiceError::AlreadyProcessed);
        }
        info!(leave_id = id, user_id = actor.user_id, "Leave request withdrawn");

        match self.users.find(current.user_id).await {
            Ok(Some(requester)) => {
                self.notify_approvers(
                    &requester,
                    NotificationKind::LeaveWithdrawn,
                    "Leave request withdrawn",
                    format!(
                        "{} withdrew the request from {} to {}.",
                        requester.full_name, current.start_date, current.end_date
                    ),
                )
                .await
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, leave_id = id, "Failed to load requester"),
        }
        self.audit
            .record(
                Some(actor.user_id),
                "leave_withdrawn",
                Some(format!("id={id}")),
                actor.ip.clone(),
            )
            .await;

        self.reload(id).await
    }

    pub async fn approve(&self, actor: &Actor, id: u64, comment: Option<&str>) -> Result<LeaveRequest, ServiceError> {
        self.decide(actor, id, LeaveAction::Approve, comment).await
    }

    pub async fn reject(&self, actor: &Actor, id: u64, comment: Option<&str>) -> Result<LeaveRequest, ServiceError> {
        self.decide(actor, id, LeaveAction::Reject, comment).await
    }

    async fn decide(
        &self,
        actor: &Actor,
        id: u64,
        action: LeaveAction,
        comment: Option<&str>,
    ) -> Result<LeaveRequest, ServiceError> {
        let current = self
            .leaves
            .find(id)
            .await?
            .ok_or(ServiceError::AlreadyProcessed)?;
        let next = transition(current.status, action)?;
        let comment = clean(comment);

        if !self
            .leaves
            .set_status(id, None, current.status, next, comment.as_deref())
            .await?
        {
            return Err(ServiceError::AlreadyProcessed);
        }
        info!(leave_id = id, decided_by = actor.user_id, status = %next, "Leave request decided");

        let (kind, title, label) = match next {
            LeaveStatus::Approved => (NotificationKind::LeaveApproved, "Leave request approved", "Note"),
            _ => (NotificationKind::LeaveRejected, "Leave request rejected", "Reason"),
        };
        let mut message = format!(
            "Your request from {} to {} was {}.",
            current.start_date, current.end_date, next
        );
        if let Some(comment) = &comment {
            message.push_str(&format!(" {label}: {comment}"));
        }

        self.notifier
            .notify_quietly(NewNotification {
                user_id: current.user_id,
                kind,
                title: title.to_string(),
                message: Some(message.clone()),
            })
            .await;
        match self.users.find(current.user_id).await {
            Ok(Some(requester)) => {
                self.notifier
                    .email_quietly(requester.email.as_deref(), title, &message)
                    .await
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, leave_id = id, "Failed to load requester for email"),
        }
        self.audit
            .record(
                Some(actor.user_id),
                kind.as_ref(),
                Some(format!("id={id} user_id={}", current.user_id)),
                actor.ip.clone(),
            )
            .await;

        self.reload(id).await
    }

    pub async fn delete(&self, actor: &Actor, id: u64) -> Result<(), ServiceError> {
        if !self.leaves.delete(id).await? {
            return Err(ServiceError::NotFound("leave request"));
        }
        info!(leave_id = id, deleted_by = actor.user_id, "Leave request deleted");
        self.audit
            .record(Some(actor.user_id), "leave_deleted", Some(format!("id={id}")), actor.ip.clone())
            .await;
        Ok(())
    }

    /// Owners see their own requests; view-all holders see any.
    pub async fn get(&self, actor: &Actor, id: u64) -> Result<LeaveRequest, ServiceError> {
        self.leaves
            .find(id)
            .await?
            .filter(|l| l.user_id == actor.user_id || actor.can(Permission::LeaveViewAll))
            .ok_or(ServiceError::NotFound("leave request"))
    }

    pub async fn list(&self, actor: &Actor, query: &LeaveQuery) -> Result<LeavePage, ServiceError> {
        let mut query = query.clone();
        if !actor.can(Permission::LeaveViewAll) {
            query.user_id = Some(actor.user_id);
        }
        query.page = query.page.max(1);
        query.per_page = match query.per_page {
            0 => DEFAULT_PER_PAGE,
            n => n.min(MAX_PER_PAGE),
        };

        let (data, total) = self.leaves.list(&query).await?;
        Ok(LeavePage {
            data,
            page: query.page,
            per_page: query.per_page,
            total,
        })
    }

    pub async fn summary(&self, user_id: u64, year: i32) -> Result<YearSummary, ServiceError> {
        validate_year(year)?;
        let totals = self.leaves.totals_by_status(user_id, year).await?;
        let of = |status: LeaveStatus| totals.get(&status).copied().unwrap_or_default();
        Ok(YearSummary {
            user_id,
            year,
            pending: of(LeaveStatus::Pending),
            approved: of(LeaveStatus::Approved),
            rejected: of(LeaveStatus::Rejected),
        })
    }

    /// Approved and pending requests overlapping the month, listed under each date they cover.
    pub async fn month_calendar(&self, year: i32, month: u32) -> Result<MonthCalendar, ServiceError> {
        validate_year(year)?;
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ServiceError::validation("month must be between 1 and 12"))?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| ServiceError::validation("month is out of range"))?;

        let requests = self
            .leaves
            .in_range(first, last, &[LeaveStatus::Approved, LeaveStatus::Pending])
            .await?;

        let mut names: HashMap<u64, String> = HashMap::new();
        let mut days: BTreeMap<NaiveDate, Vec<CalendarEntry>> = BTreeMap::new();
        for request in requests {
            if !names.contains_key(&request.user_id) {
                let name = self
                    .users
                    .find(request.user_id)
                    .await?
                    .map(|u| u.full_name)
                    .unwrap_or_default();
                names.insert(request.user_id, name);
            }
            let full_name = names.get(&request.user_id).cloned().unwrap_or_default();

            let to = request.end_date.min(last);
            for day in request.start_date.max(first).iter_days().take_while(|d| *d <= to) {
                days.entry(day).or_default().push(CalendarEntry {
                    request_id: request.id,
                    user_id: request.user_id,
                    full_name: full_name.clone(),
                    leave_type: request.leave_type,
                    status: request.status,
                });
            }
        }

        Ok(MonthCalendar { year, month, days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::HolidayDraft;
    use crate::repository::memory::MemoryStore;
    use crate::service::notifier::LogMailer;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        calendar: Arc<HolidayCalendar>,
        service: LeaveService,
        admin: Actor,
        manager: Actor,
        employee: Actor,
    }

    fn actor(user_id: u64, role: Role) -> Actor {
        Actor {
            user_id,
            role,
            ip: Some("127.0.0.1".into()),
        }
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let admin = store.add_user("admin", Role::Admin, None);
        let manager = store.add_user("marco", Role::Manager, None);
        let employee = store.add_user("anna", Role::Employee, Some(manager));

        let calendar = Arc::new(HolidayCalendar::new(store.clone()));
        let notifier = Arc::new(Notifier::new(store.clone(), Arc::new(LogMailer)));
        let audit = Arc::new(AuditTrail::new(store.clone()));
        let service = LeaveService::new(store.clone(), store.clone(), calendar.clone(), notifier, audit);

        Fixture {
            store,
            calendar,
            service,
            admin: actor(admin, Role::Admin),
            manager: actor(manager, Role::Manager),
            employee: actor(employee, Role::Employee),
        }
    }

    fn vacation(start: NaiveDate, end: NaiveDate) -> LeaveInput {
        LeaveInput {
            start_date: start,
            end_date: end,
            leave_type: LeaveType::Vacation,
            note: None,
            medical_code: None,
        }
    }

    fn kinds(store: &MemoryStore, user_id: u64) -> Vec<NotificationKind> {
        store.notifications_of(user_id).iter().map(|n| n.kind).collect()
    }

    #[actix_web::test]
    async fn create_counts_working_days_and_notifies() {
        let f = fixture();
        f.calendar
            .add(
                &HolidayDraft {
                    name: "Capodanno".into(),
                    date: d(2024, 1, 1),
                    recurring: false,
                    note: None,
                },
                f.admin.user_id,
            )
            .await
            .unwrap();

        let leave = f
            .service
            .create(&f.employee, &vacation(d(2024, 1, 1), d(2024, 1, 5)))
            .await
            .unwrap();
        assert_eq!(leave.total_days, 4);
        assert_eq!(leave.status, LeaveStatus::Pending);

        assert_eq!(kinds(&f.store, f.employee.user_id), vec![NotificationKind::LeaveCreated]);
        assert_eq!(kinds(&f.store, f.manager.user_id), vec![NotificationKind::LeaveSubmitted]);
        // the manager is the approver, admins stay out of it
        assert!(kinds(&f.store, f.admin.user_id).is_empty());
        assert!(f.store.audit_actions().contains(&"leave_created".to_string()));
    }

    #[actix_web::test]
    async fn requests_without_a_manager_go_to_admins() {
        let f = fixture();
        f.service
            .create(&f.manager, &vacation(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();
        assert_eq!(kinds(&f.store, f.admin.user_id), vec![NotificationKind::LeaveSubmitted]);
    }

    #[actix_web::test]
    async fn inactive_manager_falls_back_to_admins() {
        let f = fixture();
        f.store.deactivate(f.manager.user_id);
        f.service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();
        assert_eq!(kinds(&f.store, f.admin.user_id), vec![NotificationKind::LeaveSubmitted]);
    }

    #[actix_web::test]
    async fn invalid_input_is_rejected() {
        let f = fixture();
        let inverted = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 8), d(2024, 3, 4)))
            .await
            .unwrap_err();
        assert!(matches!(inverted, ServiceError::Validation(_)));

        // Sat..Sun
        let weekend = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 9), d(2024, 3, 10)))
            .await
            .unwrap_err();
        assert!(matches!(weekend, ServiceError::Validation(_)));

        let mut sick = vacation(d(2024, 3, 4), d(2024, 3, 4));
        sick.leave_type = LeaveType::Sickness;
        sick.medical_code = Some("  ".into());
        let missing_code = f.service.create(&f.employee, &sick).await.unwrap_err();
        assert!(matches!(missing_code, ServiceError::Validation(_)));

        sick.medical_code = Some("C".repeat(65));
        let long_code = f.service.create(&f.employee, &sick).await.unwrap_err();
        assert!(matches!(long_code, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn medical_code_is_kept_for_sickness_only() {
        let f = fixture();
        let mut sick = vacation(d(2024, 3, 4), d(2024, 3, 4));
        sick.leave_type = LeaveType::Sickness;
        sick.medical_code = Some(" ABC123 ".into());
        let leave = f.service.create(&f.employee, &sick).await.unwrap();
        assert_eq!(leave.medical_code.as_deref(), Some("ABC123"));

        let mut permit = vacation(d(2024, 3, 5), d(2024, 3, 5));
        permit.leave_type = LeaveType::Permit;
        permit.medical_code = Some("ignored".into());
        let leave = f.service.create(&f.employee, &permit).await.unwrap();
        assert_eq!(leave.medical_code, None);
    }

    #[actix_web::test]
    async fn overlapping_requests_are_rejected_until_the_first_is_rejected() {
        let f = fixture();
        let first = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 8)))
            .await
            .unwrap();

        let clash = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 8), d(2024, 3, 12)))
            .await
            .unwrap_err();
        assert!(matches!(clash, ServiceError::Validation(_)));

        // other users are unaffected
        f.service
            .create(&f.manager, &vacation(d(2024, 3, 4), d(2024, 3, 8)))
            .await
            .unwrap();

        f.service.reject(&f.manager, first.id, Some("busy week")).await.unwrap();
        f.service
            .create(&f.employee, &vacation(d(2024, 3, 8), d(2024, 3, 12)))
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn approving_twice_reports_already_processed() {
        let f = fixture();
        let leave = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 8)))
            .await
            .unwrap();

        let approved = f.service.approve(&f.manager, leave.id, Some("  enjoy ")).await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.admin_comment.as_deref(), Some("enjoy"));

        let again = f.service.approve(&f.admin, leave.id, None).await.unwrap_err();
        assert!(matches!(again, ServiceError::AlreadyProcessed));
        let rejected = f.service.reject(&f.admin, leave.id, None).await.unwrap_err();
        assert!(matches!(rejected, ServiceError::AlreadyProcessed));

        let stored = f.service.get(&f.admin, leave.id).await.unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);

        let inbox = f.store.notifications_of(f.employee.user_id);
        let approval = inbox
            .iter()
            .find(|n| n.kind == NotificationKind::LeaveApproved)
            .unwrap();
        assert!(approval.message.as_deref().unwrap().contains("Note: enjoy"));
        assert!(f.store.audit_actions().contains(&"leave_approved".to_string()));
    }

    #[actix_web::test]
    async fn deciding_a_missing_request_reports_already_processed() {
        let f = fixture();
        let err = f.service.approve(&f.manager, 999, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyProcessed));
    }

    #[actix_web::test]
    async fn withdraw_is_owner_only_and_pending_only() {
        let f = fixture();
        let leave = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 8)))
            .await
            .unwrap();

        let foreign = f.service.withdraw(&f.manager, leave.id).await.unwrap_err();
        assert!(matches!(foreign, ServiceError::AlreadyProcessed));

        let withdrawn = f.service.withdraw(&f.employee, leave.id).await.unwrap();
        assert_eq!(withdrawn.status, LeaveStatus::Rejected);
        assert!(kinds(&f.store, f.manager.user_id).contains(&NotificationKind::LeaveWithdrawn));
        assert!(f.store.audit_actions().contains(&"leave_withdrawn".to_string()));

        let approved = f
            .service
            .create(&f.employee, &vacation(d(2024, 4, 1), d(2024, 4, 2)))
            .await
            .unwrap();
        f.service.approve(&f.manager, approved.id, None).await.unwrap();
        let late = f.service.withdraw(&f.employee, approved.id).await.unwrap_err();
        assert!(matches!(late, ServiceError::AlreadyProcessed));
    }

    #[actix_web::test]
    async fn edit_recomputes_days_and_ignores_itself_for_overlap() {
        let f = fixture();
        let leave = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();

        let mut wider = vacation(d(2024, 3, 4), d(2024, 3, 8));
        wider.note = Some("longer".into());
        let edited = f.service.edit(&f.employee, leave.id, &wider).await.unwrap();
        assert_eq!(edited.total_days, 5);
        assert_eq!(edited.note.as_deref(), Some("longer"));

        let foreign = f.service.edit(&f.manager, leave.id, &wider).await.unwrap_err();
        assert!(matches!(foreign, ServiceError::AlreadyProcessed));

        f.service.approve(&f.manager, leave.id, None).await.unwrap();
        let late = f.service.edit(&f.employee, leave.id, &wider).await.unwrap_err();
        assert!(matches!(late, ServiceError::AlreadyProcessed));
    }

    #[actix_web::test]
    async fn attachments_only_while_pending() {
        let f = fixture();
        let leave = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();

        let blank = f.service.attach(&f.employee, leave.id, "   ").await.unwrap_err();
        assert!(matches!(blank, ServiceError::Validation(_)));

        let attached = f
            .service
            .attach(&f.employee, leave.id, "uploads/cert.pdf")
            .await
            .unwrap();
        assert_eq!(attached.attachment_ref.as_deref(), Some("uploads/cert.pdf"));

        f.service.reject(&f.manager, leave.id, None).await.unwrap();
        let late = f
            .service
            .attach(&f.employee, leave.id, "uploads/other.pdf")
            .await
            .unwrap_err();
        assert!(matches!(late, ServiceError::AlreadyProcessed));
    }

    #[actix_web::test]
    async fn employees_only_see_their_own_requests() {
        let f = fixture();
        let own = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();
        let other = f
            .service
            .create(&f.manager, &vacation(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();

        let everything = LeaveQuery::default();
        let page = f.service.list(&f.employee, &everything).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id, own.id);
        assert_eq!(page.per_page, DEFAULT_PER_PAGE);

        let page = f.service.list(&f.admin, &everything).await.unwrap();
        assert_eq!(page.total, 2);

        let pending_of_manager = LeaveQuery {
            user_id: Some(f.manager.user_id),
            status: Some(LeaveStatus::Pending),
            page: 1,
            per_page: 500,
        };
        let page = f.service.list(&f.admin, &pending_of_manager).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);

        let far_away = LeaveQuery {
            page: u64::MAX,
            per_page: 100,
            ..LeaveQuery::default()
        };
        let page = f.service.list(&f.admin, &far_away).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 2);

        assert!(matches!(
            f.service.get(&f.employee, other.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert_eq!(f.service.get(&f.manager, own.id).await.unwrap().id, own.id);
    }

    #[actix_web::test]
    async fn summary_groups_by_status() {
        let f = fixture();
        let a = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 8)))
            .await
            .unwrap();
        f.service
            .create(&f.employee, &vacation(d(2024, 4, 1), d(2024, 4, 2)))
            .await
            .unwrap();
        f.service.approve(&f.manager, a.id, None).await.unwrap();

        let summary = f.service.summary(f.employee.user_id, 2024).await.unwrap();
        assert_eq!(summary.approved.requests, 1);
        assert_eq!(summary.approved.days, 5);
        assert_eq!(summary.pending.days, 2);
        assert_eq!(summary.rejected.requests, 0);
    }

    #[actix_web::test]
    async fn month_calendar_lists_each_covered_date() {
        let f = fixture();
        // Thu 2024-02-29 .. Mon 2024-03-04
        let spanning = f
            .service
            .create(&f.employee, &vacation(d(2024, 2, 29), d(2024, 3, 4)))
            .await
            .unwrap();
        let rejected = f
            .service
            .create(&f.manager, &vacation(d(2024, 3, 4), d(2024, 3, 4)))
            .await
            .unwrap();
        f.service.reject(&f.admin, rejected.id, None).await.unwrap();

        let calendar = f.service.month_calendar(2024, 3).await.unwrap();
        let dates: Vec<NaiveDate> = calendar.days.keys().copied().collect();
        assert_eq!(dates, vec![d(2024, 3, 1), d(2024, 3, 2), d(2024, 3, 3), d(2024, 3, 4)]);
        let entries = &calendar.days[&d(2024, 3, 4)];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].request_id, spanning.id);
        assert_eq!(entries[0].full_name, "anna");

        assert!(matches!(
            f.service.month_calendar(2024, 13).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[actix_web::test]
    async fn delete_removes_or_reports_missing() {
        let f = fixture();
        let leave = f
            .service
            .create(&f.employee, &vacation(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();
        f.service.delete(&f.admin, leave.id).await.unwrap();
        assert!(matches!(
            f.service.delete(&f.admin, leave.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
