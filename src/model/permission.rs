//! Role → permitted actions. Every mutation and every privileged read goes
//! through [`Role::can`]; route guards never match on roles directly.

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

use super::role::Role;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Display, AsRefStr, EnumIter)]
pub enum Permission {
    #[strum(serialize = "users.create")]
    UsersCreate,

    #[strum(serialize = "leave.create")]
    LeaveCreate,
    #[strum(serialize = "leave.view_own")]
    LeaveViewOwn,
    #[strum(serialize = "leave.view_all")]
    LeaveViewAll,
    #[strum(serialize = "leave.approve")]
    LeaveApprove,
    #[strum(serialize = "leave.reject")]
    LeaveReject,
    #[strum(serialize = "leave.delete")]
    LeaveDelete,

    #[strum(serialize = "budget.view_own")]
    BudgetViewOwn,
    #[strum(serialize = "budget.view_all")]
    BudgetViewAll,
    #[strum(serialize = "budget.edit")]
    BudgetEdit,

    #[strum(serialize = "holidays.view")]
    HolidaysView,
    #[strum(serialize = "holidays.edit")]
    HolidaysEdit,

    #[strum(serialize = "notifications.view")]
    NotificationsView,

    #[strum(serialize = "attendance.clock")]
    AttendanceClock,
    #[strum(serialize = "attendance.view_all")]
    AttendanceViewAll,
    #[strum(serialize = "attendance.edit")]
    AttendanceEdit,

    #[strum(serialize = "audit.view")]
    AuditView,
}

const EVERYONE: &[Role] = &[Role::Admin, Role::Manager, Role::Employee];
const MANAGERS: &[Role] = &[Role::Admin, Role::Manager];
const ADMINS: &[Role] = &[Role::Admin];

impl Permission {
    /// Roles allowed to perform this action.
    pub fn allowed_roles(self) -> &'static [Role] {
        use Permission::*;
        match self {
            UsersCreate => ADMINS,

            LeaveCreate | LeaveViewOwn => EVERYONE,
            LeaveViewAll | LeaveApprove | LeaveReject | LeaveDelete => MANAGERS,

            BudgetViewOwn => EVERYONE,
            BudgetViewAll => MANAGERS,
            BudgetEdit => ADMINS,

            HolidaysView | HolidaysEdit => MANAGERS,

            NotificationsView => EVERYONE,

            AttendanceClock => EVERYONE,
            AttendanceViewAll | AttendanceEdit => MANAGERS,

            AuditView => ADMINS,
        }
    }
}

impl Role {
    pub fn can(self, permission: Permission) -> bool {
        permission.allowed_roles().contains(&self)
    }
}

/// Every permission granted to `role`, in declaration order.
pub fn permissions_for(role: Role) -> Vec<Permission> {
    Permission::iter().filter(|p| role.can(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_cannot_decide_leave() {
        assert!(Role::Employee.can(Permission::LeaveCreate));
        assert!(!Role::Employee.can(Permission::LeaveApprove));
        assert!(!Role::Employee.can(Permission::LeaveReject));
        assert!(Role::Manager.can(Permission::LeaveApprove));
        assert!(Role::Admin.can(Permission::LeaveReject));
    }

    #[test]
    fn budget_edit_is_admin_only() {
        assert!(Role::Admin.can(Permission::BudgetEdit));
        assert!(!Role::Manager.can(Permission::BudgetEdit));
        assert!(Role::Manager.can(Permission::BudgetViewAll));
    }

    #[test]
    fn admin_holds_every_permission() {
        assert_eq!(permissions_for(Role::Admin).len(), Permission::iter().count());
    }

    #[test]
    fn permission_names_are_dotted() {
        assert_eq!(Permission::LeaveViewAll.to_string(), "leave.view_all");
        let employee: Vec<String> = permissions_for(Role::Employee)
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            employee,
            vec![
                "leave.create",
                "leave.view_own",
                "budget.view_own",
                "notifications.view",
                "attendance.clock"
            ]
        );
    }
}
