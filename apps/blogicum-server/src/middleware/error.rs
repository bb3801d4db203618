//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt;

use blogicum_core::error::{DomainError, RepoError};
use blogicum_shared::ErrorResponse;

/// Path of the login endpoint anonymous users are sent to.
pub const LOGIN_PATH: &str = "/api/auth/login/";

/// Characters escaped in the `next` query value; path separators stay readable.
const NEXT_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden,
    Conflict(String),
    Internal(String),
    Validation(String),
    /// Soft refusal answered with `302 Found` to the given location.
    Redirect(String),
}

impl AppError {
    /// Redirect to the login page, remembering where the user was headed.
    pub fn login_required(next: &str) -> Self {
        AppError::Redirect(format!(
            "{LOGIN_PATH}?next={}",
            utf8_percent_encode(next, NEXT_ESCAPE)
        ))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Redirect(location) => write!(f, "Redirect to {}", location),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Redirect(_) => StatusCode::FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::Redirect(location) => {
                return HttpResponse::Found()
                    .insert_header((header::LOCATION, location.as_str()))
                    .finish();
            }
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized(detail),
            AppError::Forbidden => ErrorResponse::forbidden(),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Validation(detail) => ErrorResponse::validation_failed(detail),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} {} not found", entity_type, key))
            }
            DomainError::Validation(e) => AppError::Validation(e.to_string()),
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Unauthenticated => {
                AppError::Unauthorized("Authentication required".to_string())
            }
            DomainError::InvalidCredentials => {
                AppError::Unauthorized("Invalid username or password".to_string())
            }
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::Repository(e) => e.into(),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_core::input::ValidationError;

    #[test]
    fn test_login_redirect_keeps_next_path() {
        let response = AppError::login_required("/api/posts/create/").error_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/auth/login/?next=/api/posts/create/"
        );
    }

    #[test]
    fn test_login_redirect_escapes_next_path() {
        let response = AppError::login_required("/api/profile/a&b c/").error_response();

        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/auth/login/?next=/api/profile/a%26b%20c/"
        );
    }

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::not_found("post", "x"), StatusCode::NOT_FOUND),
            (
                DomainError::Validation(ValidationError::PublishDateInPast),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (DomainError::Duplicate("taken".into()), StatusCode::CONFLICT),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden, StatusCode::FORBIDDEN),
            (
                DomainError::Repository(RepoError::Query("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }
}
