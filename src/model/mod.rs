pub mod attendance;
pub mod audit;
pub mod holiday;
pub mod leave_balance;
pub mod leave_request;
pub mod notification;
pub mod permission;
pub mod role;
pub mod user;
