use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::auth::lockout::{LoginAttemptStore, MokaAttemptStore};
use crate::config::Config;
use crate::repository::attendance_repo::{AttendanceRepository, AttendanceRepositoryImpl};
use crate::repository::audit_repo::{AuditRepository, AuditRepositoryImpl};
use crate::repository::balance_repo::{BalanceRepository, BalanceRepositoryImpl};
use crate::repository::holiday_repo::{HolidayRepository, HolidayRepositoryImpl};
use crate::repository::leave_repo::{LeaveRepository, LeaveRepositoryImpl};
use crate::repository::notification_repo::{NotificationRepository, NotificationRepositoryImpl};
use crate::repository::user_repo::{UserRepository, UserRepositoryImpl};
use crate::service::attendance::AttendanceService;
use crate::service::audit::AuditTrail;
use crate::service::balance::BalanceLedger;
use crate::service::calendar::HolidayCalendar;
use crate::service::leave::LeaveService;
use crate::service::notifier::{LogMailer, Mailer, Notifier};

pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub leaves: Arc<dyn LeaveRepository>,
    pub balances: Arc<dyn BalanceRepository>,
    pub holidays: Arc<dyn HolidayRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl Repositories {
    pub fn mysql(pool: MySqlPool) -> Self {
        Self {
            users: Arc::new(UserRepositoryImpl::new(pool.clone())),
            leaves: Arc::new(LeaveRepositoryImpl::new(pool.clone())),
            balances: Arc::new(BalanceRepositoryImpl::new(pool.clone())),
            holidays: Arc::new(HolidayRepositoryImpl::new(pool.clone())),
            notifications: Arc::new(NotificationRepositoryImpl::new(pool.clone())),
            attendance: Arc::new(AttendanceRepositoryImpl::new(pool.clone())),
            audit: Arc::new(AuditRepositoryImpl::new(pool)),
        }
    }

    #[cfg(test)]
    pub fn memory(store: &crate::repository::memory::MemoryStore) -> Self {
        let store = Arc::new(store.clone());
        Self {
            users: store.clone(),
            leaves: store.clone(),
            balances: store.clone(),
            holidays: store.clone(),
            notifications: store.clone(),
            attendance: store.clone(),
            audit: store,
        }
    }
}

/// Everything a handler needs, shared across workers.
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub lockout: Arc<dyn LoginAttemptStore>,
    pub leaves: LeaveService,
    pub balances: BalanceLedger,
    pub calendar: Arc<HolidayCalendar>,
    pub notifier: Arc<Notifier>,
    pub attendance: AttendanceService,
    pub audit: Arc<AuditTrail>,
    pub default_leave_days: Decimal,
}

impl AppState {
    pub fn new(repos: Repositories, config: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let calendar = Arc::new(HolidayCalendar::new(repos.holidays));
        let notifier = Arc::new(Notifier::new(repos.notifications, mailer));
        let audit = Arc::new(AuditTrail::new(repos.audit));

        Self {
            leaves: LeaveService::new(
                repos.leaves.clone(),
                repos.users.clone(),
                calendar.clone(),
                notifier.clone(),
                audit.clone(),
            ),
            balances: BalanceLedger::new(repos.balances, repos.leaves, repos.users.clone()),
            attendance: AttendanceService::new(repos.attendance, repos.users.clone()),
            lockout: Arc::new(MokaAttemptStore::new(
                config.login_max_failures,
                config.lockout_window(),
            )),
            users: repos.users,
            calendar,
            notifier,
            audit,
            default_leave_days: config.default_leave_days,
        }
    }

    pub fn mysql(pool: MySqlPool, config: &Config) -> Self {
        Self::new(Repositories::mysql(pool), config, Arc::new(LogMailer))
    }
}
