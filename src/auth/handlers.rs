use crate::{
    auth::{
        auth::{AuthUser, bearer_token, client_ip},
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        lockout::attempt_key,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::ApiError,
    model::{
        permission::{Permission, permissions_for},
        user::NewUser,
    },
    models::{LoginReqDto, Profile, TokenPair, TokenType, UserCreated, UserReq},
    repository::repo_error::RepositoryError,
    state::AppState,
};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, error, info, instrument, warn};

const MAX_USERNAME_LEN: usize = 50;
const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 100;

fn issue_tokens(user_id: u64, username: &str, role: u8, config: &Config) -> Result<(String, String, String, usize), ApiError> {
    let access_token = generate_access_token(
        user_id,
        username,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        ApiError::Internal
    })?;

    let (refresh_token, claims) = generate_refresh_token(
        user_id,
        username,
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign refresh token");
        ApiError::Internal
    })?;

    Ok((access_token, refresh_token, claims.jti, claims.exp))
}

async fn store_refresh(state: &AppState, user_id: u64, jti: &str, exp: usize) -> Result<(), ApiError> {
    state
        .users
        .store_refresh_token(user_id, jti, exp as i64)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store refresh token");
            ApiError::Internal
        })
}

/// Issues an access/refresh token pair. Repeated failures for the same
/// username and address lock further attempts for the lockout window.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Authenticated", body = TokenPair),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Locked after too many failures")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(req, state, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    req: HttpRequest,
    user: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::BadRequest("Username or password required".into()));
    }

    // 2️⃣ Lockout check
    let ip = client_ip(&req);
    let key = attempt_key(&user.username, ip.as_deref().unwrap_or("unknown"));
    if let Some(minutes) = state.lockout.locked_for(&key).await {
        info!(minutes, "Login refused: locked");
        return Err(ApiError::Locked(minutes));
    }

    // 3️⃣ Fetch user
    debug!("Fetching user from database");
    let db_user = state
        .users
        .find_by_username(user.username.trim())
        .await
        .map_err(|e| {
            error!(error = %e, "Database error while fetching user");
            ApiError::Internal
        })?
        .filter(|u| u.is_active && u.role().is_some());

    // 4️⃣ Verify password
    let verified = db_user.filter(|u| verify_password(&user.password, &u.password).is_ok());
    let Some(db_user) = verified else {
        info!("Invalid credentials");
        state
            .audit
            .record(None, "login_failed", Some(format!("username={}", user.username)), ip.clone())
            .await;
        if let Some(minutes) = state.lockout.record_failure(&key).await {
            warn!(minutes, "Too many failed logins, locking");
            return Err(ApiError::Locked(minutes));
        }
        return Err(ApiError::Unauthorized);
    };
    state.lockout.clear(&key).await;
    debug!(user_id = db_user.id, "Password verified");

    // 5️⃣ Generate and store tokens
    let (access_token, refresh_token, jti, exp) =
        issue_tokens(db_user.id, &db_user.username, db_user.role_id, &config)?;
    debug!(user_id = db_user.id, jti = %jti, "Storing refresh token");
    store_refresh(&state, db_user.id, &jti, exp).await?;

    // 6️⃣ Update last_login_at (non-fatal)
    if let Err(e) = state.users.touch_last_login(db_user.id).await {
        error!(error = %e, "Failed to update last_login_at");
    }
    state.audit.record(Some(db_user.id), "login", None, ip).await;

    info!("Login successful");
    Ok(HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token,
    }))
}

/// Rotates a refresh token: the presented one is revoked and a new pair issued.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, expired or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&req).map_err(|_| ApiError::Unauthorized)?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| ApiError::Unauthorized)?;
    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized);
    }

    // 🔥 revoke old refresh token; a second use finds it revoked
    let owner = state
        .users
        .consume_refresh_token(&claims.jti)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to revoke refresh token");
            ApiError::Internal
        })?;
    let Some(user_id) = owner else {
        info!(jti = %claims.jti, "Refresh token unknown or already used");
        return Err(ApiError::Unauthorized);
    };

    // role may have changed since the token was issued
    let user = state
        .users
        .find(user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error while fetching user");
            ApiError::Internal
        })?
        .filter(|u| u.is_active)
        .ok_or(ApiError::Unauthorized)?;

    let (access_token, refresh_token, jti, exp) =
        issue_tokens(user.id, &user.username, user.role_id, &config)?;
    store_refresh(&state, user.id, &jti, exp).await?;

    Ok(HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token,
    }))
}

/// Revokes the presented refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Ok(token) = bearer_token(&req) else {
        return HttpResponse::NoContent().finish();
    };
    let Ok(claims) = verify_token(token, &config.jwt_secret) else {
        return HttpResponse::NoContent().finish();
    };

    // only refresh tokens can logout
    if claims.token_type == TokenType::Refresh {
        if let Err(e) = state.users.revoke_refresh_token(&claims.jti).await {
            error!(error = %e, "Failed to revoke refresh token");
        }
    }

    HttpResponse::NoContent().finish()
}

/// The caller's identity and the permissions its role grants.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = Profile),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(Profile {
        user_id: auth.user_id,
        username: auth.username,
        role: auth.role,
        permissions: permissions_for(auth.role)
            .into_iter()
            .map(|p| p.to_string())
            .collect(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = UserReq,
    responses(
        (status = 201, description = "User created", body = UserCreated),
        (status = 400, description = "Missing fields"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Username or email already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    body: web::Json<UserReq>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require(Permission::UsersCreate)?;

    let username = body.username.trim().to_lowercase();
    let full_name = body.full_name.trim();
    if username.is_empty() || body.password.is_empty() || full_name.is_empty() {
        return Err(ApiError::BadRequest(
            "username, password and full_name must not be empty".into(),
        ));
    }
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if full_name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "full_name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if email.is_some_and(|e| e.chars().count() > MAX_EMAIL_LEN) {
        return Err(ApiError::BadRequest(format!(
            "email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }

    if let Some(manager_id) = body.manager_id {
        let manager = state.users.find(manager_id).await.map_err(|e| {
            error!(error = %e, "Database error while fetching manager");
            ApiError::Internal
        })?;
        if manager.is_none() {
            return Err(ApiError::NotFound("manager not found".into()));
        }
    }

    let password_hash = hash_password(&body.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Internal
    })?;

    let new_user = NewUser {
        username: username.clone(),
        email: email.map(str::to_string),
        password_hash,
        full_name: full_name.to_string(),
        role: body.role,
        manager_id: body.manager_id,
    };

    let id = match state.users.insert(&new_user).await {
        Ok(id) => id,
        Err(RepositoryError::Duplicate) => {
            return Err(ApiError::Conflict("Username or email already taken".into()));
        }
        Err(e) => {
            error!(error = %e, "Failed to register user");
            return Err(ApiError::Internal);
        }
    };
    info!(user_id = id, username = %username, role = %body.role, "User created");
    state
        .audit
        .record(Some(auth.user_id), "user_created", Some(format!("id={id} username={username}")), auth.ip.clone())
        .await;

    Ok(HttpResponse::Created().json(UserCreated {
        id,
        username,
        role: body.role,
    }))
}
