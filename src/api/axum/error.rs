use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::OrganizerError;
use crate::api::ErrorResponse;

/// converts `OrganizerError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub OrganizerError);

impl From<OrganizerError> for AppError {
    fn from(err: OrganizerError) -> Self {
        Self(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            OrganizerError::NotFound => StatusCode::NOT_FOUND,
            OrganizerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            OrganizerError::BadRequest(_) | OrganizerError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            OrganizerError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            OrganizerError::RandomSource(_)
            | OrganizerError::DatabaseError(_)
            | OrganizerError::MailError(_)
            | OrganizerError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.is_internal() {
            log::error!(target: "organizer", "msg=\"request failed\", error=\"{}\"", self.0);
        }

        let status = self.status();
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}
