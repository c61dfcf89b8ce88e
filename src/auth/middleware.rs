use crate::auth::auth::{authenticate, bearer_token, client_ip};
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::debug;

fn unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    debug!(path = req.path(), reason = message, "Rejected unauthenticated request");
    let resp = HttpResponse::Unauthorized().json(json!({"message": message, "code": "unauthorized"}));
    req.into_response(resp.map_into_boxed_body())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    let http = req.request();
    let auth_user = match bearer_token(http)
        .and_then(|token| authenticate(token, &config, client_ip(http)))
    {
        Ok(user) => user,
        Err(message) => return Ok(unauthorized(req, message)),
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
