use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::i18n::{message, Locale, MessageKey};
use common::types::Failure;
use service::errors::{ErrorKind, ServiceError};
use service::session::RequestContext;
use thiserror::Error;
use tracing::{error, warn};

/// A service failure bound to the locale it must be reported in.
#[derive(Debug)]
pub struct ApiError {
    pub error: ServiceError,
    pub locale: Locale,
}

impl ApiError {
    pub fn new(error: ServiceError, locale: Locale) -> Self { Self { error, locale } }

    pub fn bad_body(rejection: JsonRejection, locale: Locale) -> Self {
        Self::new(ServiceError::Validation(rejection.body_text()), locale)
    }

    pub fn bad_path(_rejection: PathRejection, locale: Locale) -> Self {
        Self::new(ServiceError::not_found("resource"), locale)
    }

    fn status(&self) -> StatusCode {
        match self.error.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Localized text safe to show to the caller.
    pub fn public_message(&self) -> String {
        let key = match (&self.error, self.error.kind()) {
            (ServiceError::InvalidCredentials, _) => MessageKey::InvalidCredentials,
            (_, ErrorKind::Validation) => MessageKey::Validation,
            (_, ErrorKind::Unauthenticated) => MessageKey::Unauthenticated,
            (_, ErrorKind::Forbidden) => MessageKey::Forbidden,
            (_, ErrorKind::NotFound) => MessageKey::NotFound,
            (_, ErrorKind::Conflict) => MessageKey::Conflict,
            (_, ErrorKind::Internal) => MessageKey::Internal,
        };
        let text = message(key, self.locale);
        match &self.error {
            ServiceError::Validation(detail) => format!("{text}: {detail}"),
            _ => text.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.error.code(), error = %self.error, "request failed");
        } else {
            warn!(code = self.error.code(), status = status.as_u16(), error = %self.error, "request rejected");
        }
        (status, Json(Failure::new(self.public_message()))).into_response()
    }
}

/// Attach the request locale to a service result.
pub trait Localized<T> {
    fn localized(self, ctx: &RequestContext) -> Result<T, ApiError>;
}

impl<T> Localized<T> for Result<T, ServiceError> {
    fn localized(self, ctx: &RequestContext) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(e, ctx.locale))
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
