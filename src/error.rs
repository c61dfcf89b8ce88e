use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use thiserror::Error;

use crate::model::leave_request::InvalidTransition;
use crate::model::permission::Permission;
use crate::repository::repo_error::RepositoryError;

/// Failures of the service layer, independent of HTTP.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("leave request not found or already processed")]
    AlreadyProcessed,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("missing permission {0}")]
    Forbidden(Permission),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(_: InvalidTransition) -> Self {
        ServiceError::AlreadyProcessed
    }
}

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "Unauthorized")]
    Unauthorized,
    #[display(fmt = "Missing permission: {}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "Leave request not found or already processed")]
    AlreadyProcessed,
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Too many failed attempts, retry in {} minutes", _0)]
    Locked(u64),
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl std::error::Error for ApiError {}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "validation",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::AlreadyProcessed => "already_processed",
            ApiError::Conflict(_) => "conflict",
            ApiError::Locked(_) => "locked",
            ApiError::Internal => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyProcessed | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Locked(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string(),
            "code": self.code(),
        }))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => ApiError::BadRequest(message),
            ServiceError::AlreadyProcessed => ApiError::AlreadyProcessed,
            ServiceError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            ServiceError::Forbidden(permission) => ApiError::Forbidden(permission.to_string()),
            ServiceError::Repository(e) => {
                tracing::error!(error = %e, "Persistence failure");
                ApiError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn already_processed_is_a_conflict_with_a_stable_code() {
        let err = ApiError::from(ServiceError::AlreadyProcessed);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], "already_processed");
        assert_eq!(value["message"], "Leave request not found or already processed");
    }

    #[test]
    fn persistence_errors_hide_their_details() {
        let err = ApiError::from(ServiceError::Repository(RepositoryError::Corrupt(
            "status 'x'".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn invalid_transitions_surface_as_already_processed() {
        use crate::model::leave_request::{LeaveAction, LeaveStatus, transition};

        let err: ServiceError = transition(LeaveStatus::Approved, LeaveAction::Approve)
            .unwrap_err()
            .into();
        assert!(matches!(err, ServiceError::AlreadyProcessed));
    }
}
