pub mod auth;
pub mod handlers;
pub mod jwt;
pub mod lockout;
pub mod middleware;
pub mod password;
