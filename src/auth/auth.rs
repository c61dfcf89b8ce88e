use crate::config::Config;
use crate::error::ApiError;
use crate::model::{permission::Permission, role::Role};
use crate::models::TokenType;
use crate::service::Actor;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use super::jwt::verify_token;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    pub ip: Option<String>,
}

/// Extracts the token from an `Authorization: Bearer ...` header value.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, &'static str> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;

    header
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must start with Bearer")
}

/// Validates an access token and resolves its role.
pub fn authenticate(token: &str, config: &Config, ip: Option<String>) -> Result<AuthUser, &'static str> {
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| "Invalid or expired token")?;
    if claims.token_type != TokenType::Access {
        return Err("Access token required");
    }
    let role = Role::from_id(claims.role).ok_or("Invalid role")?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        ip,
    })
}

/// The socket peer, or the hop appended by a trusted reverse proxy.
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    let trust_proxy = req
        .app_data::<Data<Config>>()
        .is_some_and(|config| config.trust_proxy);

    if trust_proxy {
        // only the last entry was written by our proxy
        let forwarded = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.rsplit(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }

    req.peer_addr().map(|addr| addr.ip().to_string())
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            tracing::error!("Config missing from app data");
            return ready(Err(ApiError::Internal));
        };

        let user = bearer_token(req)
            .and_then(|token| authenticate(token, config, client_ip(req)))
            .map_err(|_| ApiError::Unauthorized);
        ready(user)
    }
}

impl AuthUser {
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        Ok(self.actor().require(permission)?)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
            ip: self.ip.clone(),
        }
    }
}
