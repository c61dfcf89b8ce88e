//! Shared setup for handler tests: the real routes over in-memory repositories.

use std::sync::Arc;

use actix_web::{test::TestRequest, web};

use crate::auth::jwt::generate_access_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::repository::memory::MemoryStore;
use crate::routes;
use crate::service::notifier::LogMailer;
use crate::state::{AppState, Repositories};

pub const SECRET: &str = "test-secret";

pub fn config() -> Config {
    Config::from_lookup(|key| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".into()),
        "DATABASE_URL" => Some("mysql://unused".into()),
        "JWT_SECRET" => Some(SECRET.into()),
        _ => None,
    })
    .unwrap()
}

/// Registers config, state and every route; pass to `App::configure`.
pub fn app(store: &MemoryStore) -> impl FnOnce(&mut web::ServiceConfig) {
    let config = config();
    let state = AppState::new(Repositories::memory(store), &config, Arc::new(LogMailer));
    move |cfg| {
        cfg.app_data(web::Data::new(config.clone()));
        cfg.app_data(web::Data::new(state));
        routes::configure(cfg, config);
    }
}

pub fn token(user_id: u64, username: &str, role: Role) -> String {
    generate_access_token(user_id, username, role.id(), SECRET, 600).unwrap()
}

/// The rate limiter keys on the peer address, so every test request needs one.
pub fn public(req: TestRequest) -> TestRequest {
    req.peer_addr("127.0.0.1:40000".parse().unwrap())
}

pub fn authed(req: TestRequest, token: &str) -> TestRequest {
    public(req).insert_header(("Authorization", format!("Bearer {token}")))
}
