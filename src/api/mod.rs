pub mod attendance;
pub mod audit;
pub mod balance;
pub mod holiday;
pub mod leave_request;
pub mod notification;

#[cfg(test)]
pub mod testing;
