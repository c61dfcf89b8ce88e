//! In-memory repositories for tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::model::attendance::{Attendance, AttendanceEntry, AttendanceKind};
use crate::model::audit::{AuditEntry, NewAuditEntry};
use crate::model::holiday::{Holiday, HolidayDraft};
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{
    LeaveDraft, LeaveQuery, LeaveRequest, LeaveStatus, StatusTotals,
};
use crate::model::notification::{NewNotification, Notification};
use crate::model::role::Role;
use crate::model::user::{NewUser, User};
use crate::repository::attendance_repo::AttendanceRepository;
use crate::repository::audit_repo::AuditRepository;
use crate::repository::balance_repo::BalanceRepository;
use crate::repository::holiday_repo::HolidayRepository;
use crate::repository::leave_repo::LeaveRepository;
use crate::repository::notification_repo::NotificationRepository;
use crate::repository::repo_error::RepositoryError;
use crate::repository::page_offset;
use crate::repository::user_repo::UserRepository;

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<User>,
    refresh_tokens: HashMap<String, (u64, bool)>,
    leaves: Vec<LeaveRequest>,
    balances: Vec<LeaveBalance>,
    holidays: Vec<Holiday>,
    notifications: Vec<Notification>,
    attendance: Vec<Attendance>,
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Every repository trait over one shared set of tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an active user and returns its id.
    pub fn add_user(&self, username: &str, role: Role, manager_id: Option<u64>) -> u64 {
        let mut t = self.tables.write().unwrap();
        let id = t.id();
        t.users.push(User {
            id,
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            password: String::new(),
            full_name: username.to_string(),
            role_id: role.id(),
            manager_id,
            is_active: true,
        });
        id
    }

    pub fn set_password_hash(&self, user_id: u64, hash: &str) {
        let mut t = self.tables.write().unwrap();
        if let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) {
            user.password = hash.to_string();
        }
    }

    pub fn deactivate(&self, user_id: u64) {
        let mut t = self.tables.write().unwrap();
        if let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = false;
        }
    }

    pub fn notifications_of(&self, user_id: u64) -> Vec<Notification> {
        let t = self.tables.read().unwrap();
        t.notifications.iter().filter(|n| n.user_id == user_id).cloned().collect()
    }

    pub fn audit_actions(&self) -> Vec<String> {
        let t = self.tables.read().unwrap();
        t.audit.iter().map(|a| a.action.clone()).collect()
    }

    pub fn holiday_count(&self) -> usize {
        self.tables.read().unwrap().holidays.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find(&self, id: u64) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert(&self, user: &NewUser) -> Result<u64, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let taken = t.users.iter().any(|u| {
            u.username == user.username || (user.email.is_some() && u.email == user.email)
        });
        if taken {
            return Err(RepositoryError::Duplicate);
        }
        let id = t.id();
        t.users.push(User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            role_id: user.role.id(),
            manager_id: user.manager_id,
            is_active: true,
        });
        Ok(id)
    }

    async fn touch_last_login(&self, _id: u64) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn active_with_role(&self, role: Role) -> Result<Vec<User>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.users
            .iter()
            .filter(|u| u.is_active && u.role_id == role.id())
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<User>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.users.iter().filter(|u| u.is_active).cloned().collect())
    }

    async fn store_refresh_token(&self, user_id: u64, jti: &str, _expires_at: i64) -> Result<(), RepositoryError> {
        let mut t = self.tables.write().unwrap();
        t.refresh_tokens.insert(jti.to_string(), (user_id, false));
        Ok(())
    }

    async fn consume_refresh_token(&self, jti: &str) -> Result<Option<u64>, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        match t.refresh_tokens.get_mut(jti) {
            Some((user_id, revoked)) if !*revoked => {
                *revoked = true;
                Ok(Some(*user_id))
            }
            _ => Ok(None),
        }
    }

    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), RepositoryError> {
        let mut t = self.tables.write().unwrap();
        if let Some((_, revoked)) = t.refresh_tokens.get_mut(jti) {
            *revoked = true;
        }
        Ok(())
    }
}

#[async_trait]
impl LeaveRepository for MemoryStore {
    async fn insert(&self, user_id: u64, draft: &LeaveDraft) -> Result<u64, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let id = t.id();
        let now = Utc::now();
        t.leaves.push(LeaveRequest {
            id,
            user_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            total_days: draft.total_days,
            leave_type: draft.leave_type,
            status: LeaveStatus::Pending,
            note: draft.note.clone(),
            admin_comment: None,
            medical_code: draft.medical_code.clone(),
            attachment_ref: None,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn find_holding(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<u64>,
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.leaves
            .iter()
            .filter(|l| l.user_id == user_id && l.holds_period() && l.overlaps(start, end))
            .filter(|l| Some(l.id) != exclude_id)
            .cloned()
            .collect())
    }

    async fn update_draft(
        &self,
        id: u64,
        owner_id: u64,
        from: LeaveStatus,
        draft: &LeaveDraft,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let Some(leave) = t
            .leaves
            .iter_mut()
            .find(|l| l.id == id && l.user_id == owner_id && l.status == from)
        else {
            return Ok(false);
        };
        leave.start_date = draft.start_date;
        leave.end_date = draft.end_date;
        leave.total_days = draft.total_days;
        leave.leave_type = draft.leave_type;
        leave.note = draft.note.clone();
        leave.medical_code = draft.medical_code.clone();
        leave.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_attachment(
        &self,
        id: u64,
        owner_id: u64,
        from: LeaveStatus,
        attachment_ref: &str,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let Some(leave) = t
            .leaves
            .iter_mut()
            .find(|l| l.id == id && l.user_id == owner_id && l.status == from)
        else {
            return Ok(false);
        };
        leave.attachment_ref = Some(attachment_ref.to_string());
        leave.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_status(
        &self,
        id: u64,
        owner_id: Option<u64>,
        from: LeaveStatus,
        to: LeaveStatus,
        comment: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let Some(leave) = t.leaves.iter_mut().find(|l| {
            l.id == id && l.status == from && owner_id.is_none_or(|owner| l.user_id == owner)
        }) else {
            return Ok(false);
        };
        leave.status = to;
        leave.admin_comment = comment.map(str::to_string);
        leave.updated_at = Utc::now();
        Ok(true)
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), RepositoryError> {
        let t = self.tables.read().unwrap();
        let mut matching: Vec<LeaveRequest> = t
            .leaves
            .iter()
            .filter(|l| query.user_id.is_none_or(|u| l.user_id == u))
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matching.len() as i64;
        let offset = page_offset(query.page, query.per_page) as usize;
        let page = matching
            .into_iter()
            .skip(offset)
            .take(query.per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn totals_by_status(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<HashMap<LeaveStatus, StatusTotals>, RepositoryError> {
        let t = self.tables.read().unwrap();
        let mut totals: HashMap<LeaveStatus, StatusTotals> = HashMap::new();
        for leave in t
            .leaves
            .iter()
            .filter(|l| l.user_id == user_id && l.start_date.year() == year)
        {
            let entry = totals.entry(leave.status).or_default();
            entry.requests += 1;
            entry.days += i64::from(leave.total_days);
        }
        Ok(totals)
    }

    async fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let t = self.tables.read().unwrap();
        let mut found: Vec<LeaveRequest> = t
            .leaves
            .iter()
            .filter(|l| l.overlaps(start, end) && statuses.contains(&l.status))
            .cloned()
            .collect();
        found.sort_by_key(|l| (l.start_date, l.id));
        Ok(found)
    }

    async fn delete(&self, id: u64) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let before = t.leaves.len();
        t.leaves.retain(|l| l.id != id);
        Ok(t.leaves.len() < before)
    }
}

#[async_trait]
impl BalanceRepository for MemoryStore {
    async fn find(&self, user_id: u64, year: i32) -> Result<Option<LeaveBalance>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.balances
            .iter()
            .find(|b| b.user_id == user_id && b.year == year)
            .cloned())
    }

    async fn upsert(
        &self,
        user_id: u64,
        year: i32,
        base_days: Decimal,
        bonus_days: Decimal,
        note: Option<&str>,
    ) -> Result<LeaveBalance, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let balance = LeaveBalance {
            user_id,
            year,
            base_days,
            bonus_days,
            note: note.map(str::to_string),
            updated_at: Utc::now(),
        };
        t.balances.retain(|b| !(b.user_id == user_id && b.year == year));
        t.balances.push(balance.clone());
        Ok(balance)
    }
}

#[async_trait]
impl HolidayRepository for MemoryStore {
    async fn insert(&self, draft: &HolidayDraft, created_by: Option<u64>) -> Result<u64, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let id = t.id();
        t.holidays.push(Holiday {
            id,
            name: draft.name.clone(),
            date: draft.date,
            recurring: draft.recurring,
            note: draft.note.clone(),
            created_by,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update(&self, id: u64, draft: &HolidayDraft) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let Some(holiday) = t.holidays.iter_mut().find(|h| h.id == id) else {
            return Ok(false);
        };
        holiday.name = draft.name.clone();
        holiday.date = draft.date;
        holiday.recurring = draft.recurring;
        holiday.note = draft.note.clone();
        Ok(true)
    }

    async fn delete(&self, id: u64) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let before = t.holidays.len();
        t.holidays.retain(|h| h.id != id);
        Ok(t.holidays.len() < before)
    }

    async fn find(&self, id: u64) -> Result<Option<Holiday>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.holidays.iter().find(|h| h.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Holiday>, RepositoryError> {
        let t = self.tables.read().unwrap();
        let mut all = t.holidays.clone();
        all.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn rules_for_year(&self, year: i32) -> Result<Vec<Holiday>, RepositoryError> {
        let t = self.tables.read().unwrap();
        let mut rules: Vec<Holiday> = t
            .holidays
            .iter()
            .filter(|h| h.recurring || h.date.year() == year)
            .cloned()
            .collect();
        rules.sort_by_key(|h| (h.date.month(), h.date.day(), h.id));
        Ok(rules)
    }

    async fn has_recurring(&self, month: u32, day: u32) -> Result<bool, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.holidays
            .iter()
            .any(|h| h.recurring && h.date.month() == month && h.date.day() == day))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn create_notification(&self, notification: &NewNotification) -> Result<u64, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let id = t.id();
        t.notifications.push(Notification {
            id,
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get_user_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let t = self.tables.read().unwrap();
        let mut mine: Vec<Notification> = t
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        mine.truncate(limit as usize);
        Ok(mine)
    }

    async fn unread_count(&self, user_id: u64) -> Result<i64, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_as_read(&self, notification_id: u64, user_id: u64) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        match t
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id && !n.is_read)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_as_read(&self, user_id: u64) -> Result<u64, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let mut changed = 0;
        for n in t
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_notification(&self, notification_id: u64, user_id: u64) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let before = t.notifications.len();
        t.notifications
            .retain(|n| !(n.id == notification_id && n.user_id == user_id));
        Ok(t.notifications.len() < before)
    }

    async fn delete_all(&self, user_id: u64) -> Result<u64, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let before = t.notifications.len();
        t.notifications.retain(|n| n.user_id != user_id);
        Ok((before - t.notifications.len()) as u64)
    }
}

#[async_trait]
impl AttendanceRepository for MemoryStore {
    async fn find_day(&self, user_id: u64, date: NaiveDate) -> Result<Option<Attendance>, RepositoryError> {
        let t = self.tables.read().unwrap();
        Ok(t.attendance
            .iter()
            .find(|a| a.user_id == user_id && a.date == date)
            .cloned())
    }

    async fn insert_check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: NaiveTime,
        note: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        if t.attendance.iter().any(|a| a.user_id == user_id && a.date == date) {
            return Err(RepositoryError::Duplicate);
        }
        let id = t.id();
        t.attendance.push(Attendance {
            id,
            user_id,
            date,
            check_in: Some(at),
            check_out: None,
            hours_worked: None,
            overtime_hours: 0.0,
            kind: AttendanceKind::Regular,
            note: note.map(str::to_string),
        });
        Ok(id)
    }

    async fn set_check_in(&self, id: u64, at: NaiveTime, note: Option<&str>) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let Some(row) = t
            .attendance
            .iter_mut()
            .find(|a| a.id == id && a.check_in.is_none())
        else {
            return Ok(false);
        };
        row.check_in = Some(at);
        if let Some(note) = note {
            row.note = Some(note.to_string());
        }
        Ok(true)
    }

    async fn set_check_out(
        &self,
        id: u64,
        at: NaiveTime,
        hours_worked: f64,
        overtime_hours: f64,
        note: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let Some(row) = t.attendance.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        row.check_out = Some(at);
        row.hours_worked = Some(hours_worked);
        row.overtime_hours = overtime_hours;
        if let Some(note) = note {
            row.note = Some(note.to_string());
        }
        Ok(true)
    }

    async fn month(&self, user_id: u64, year: i32, month: u32) -> Result<Vec<Attendance>, RepositoryError> {
        let t = self.tables.read().unwrap();
        let mut rows: Vec<Attendance> = t
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id && a.date.year() == year && a.date.month() == month)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.date);
        Ok(rows)
    }

    async fn upsert(&self, entry: &AttendanceEntry) -> Result<Attendance, RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let existing = t
            .attendance
            .iter()
            .find(|a| a.user_id == entry.user_id && a.date == entry.date)
            .map(|a| a.id);
        let id = match existing {
            Some(id) => id,
            None => t.id(),
        };
        let row = Attendance {
            id,
            user_id: entry.user_id,
            date: entry.date,
            check_in: entry.check_in,
            check_out: entry.check_out,
            hours_worked: entry.hours_worked,
            overtime_hours: entry.overtime_hours,
            kind: entry.kind,
            note: entry.note.clone(),
        };
        t.attendance.retain(|a| a.id != id);
        t.attendance.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn insert(&self, entry: &NewAuditEntry) -> Result<(), RepositoryError> {
        let mut t = self.tables.write().unwrap();
        let id = t.id();
        t.audit.push(AuditEntry {
            id,
            user_id: entry.user_id,
            action: entry.action.clone(),
            detail: entry.detail.clone(),
            ip: entry.ip.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<AuditEntry>, i64), RepositoryError> {
        let t = self.tables.read().unwrap();
        let total = t.audit.len() as i64;
        let offset = page_offset(page, per_page) as usize;
        let entries = t
            .audit
            .iter()
            .rev()
            .skip(offset)
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok((entries, total))
    }
}
