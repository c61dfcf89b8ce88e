pub mod attendance;
pub mod audit;
pub mod balance;
pub mod calendar;
pub mod leave;
pub mod notifier;

use crate::error::ServiceError;
use crate::model::permission::Permission;
use crate::model::role::Role;

/// Who is performing a service call.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
    pub ip: Option<String>,
}

impl Actor {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.can(permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(permission))
        }
    }
}
