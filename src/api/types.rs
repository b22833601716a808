use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::{Deregistered, EventOverview, Registered};
use crate::{
    Event, EventId, EventRegistrationId, OrganizerError, SecretString, TimeScale, User,
};

// Request DTOs. Every field defaults to empty so a missing field reaches
// the action and is reported as a bad request.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfirmLoginQuery {
    pub token: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfirmLoginRequest {
    pub token: String,
    pub csrf: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventQuery {
    pub id: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub csrf: String,
    pub event: String,
    pub message: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct DeregisterRequest {
    pub csrf: String,
    pub subscription_id: String,
}

macro_rules! redacted_debug {
    ($name:ident { $($field:ident),* }) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &"[REDACTED]"))*
                    .finish_non_exhaustive()
            }
        }
    };
}

redacted_debug!(ConfirmLoginQuery { token });
redacted_debug!(ConfirmLoginRequest { token, csrf });
redacted_debug!(RegisterRequest { csrf });
redacted_debug!(DeregisterRequest { csrf });

// Response DTOs

#[derive(Debug, Serialize)]
pub struct LandingView {
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginSentView {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ConfirmLoginView {
    pub token: SecretString,
    pub csrf: SecretString,
}

redacted_debug!(ConfirmLoginView { token, csrf });

#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub id: EventId,
    pub title: String,
    pub repeats_every: i64,
    pub repeats_scale: TimeScale,
    pub min_participants: Option<i64>,
    pub max_participants: Option<i64>,
    pub number_of_participants: i64,
    pub full: bool,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        EventSummary {
            full: event.is_full(),
            id: event.id,
            title: event.title,
            repeats_every: event.repeats_every,
            repeats_scale: event.repeats_scale,
            min_participants: event.min_participants,
            max_participants: event.max_participants,
            number_of_participants: event.number_of_participants,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventsView {
    pub user: String,
    pub events: Vec<EventSummary>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantView {
    pub display_name: String,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub summary: EventSummary,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct EventView {
    pub event: EventDetail,
    pub participants: Vec<ParticipantView>,
    pub subscription_id: Option<EventRegistrationId>,
    pub csrf: SecretString,
}

impl std::fmt::Debug for EventView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventView")
            .field("event", &self.event)
            .field("participants", &self.participants)
            .field("subscription_id", &self.subscription_id)
            .field("csrf", &"[REDACTED]")
            .finish()
    }
}

impl From<EventOverview> for EventView {
    fn from(overview: EventOverview) -> Self {
        let participants = overview
            .participants
            .iter()
            .map(|(user, registration)| ParticipantView {
                display_name: user.display_name().to_owned(),
                message: registration.message.clone(),
            })
            .collect();
        let description = overview.event.description.clone();
        let created_at = overview.event.created_at;

        EventView {
            event: EventDetail {
                summary: EventSummary::from(overview.event),
                description,
                created_at,
            },
            participants,
            subscription_id: overview.own_registration,
            csrf: overview.csrf.value().clone(),
        }
    }
}

#[derive(Serialize)]
pub struct RegisteredView {
    pub event: EventId,
    pub subscription_id: EventRegistrationId,
    pub participant: ParticipantView,
    pub csrf: SecretString,
}

redacted_debug!(RegisteredView { csrf });

impl RegisteredView {
    pub fn new(user: &User, registered: Registered) -> Self {
        RegisteredView {
            event: registered.registration.event,
            subscription_id: registered.registration.id,
            participant: ParticipantView {
                display_name: user.display_name().to_owned(),
                message: registered.registration.message,
            },
            csrf: registered.csrf.value().clone(),
        }
    }
}

#[derive(Serialize)]
pub struct DeregisteredView {
    pub event: EventId,
    pub csrf: SecretString,
}

redacted_debug!(DeregisteredView { csrf });

impl From<Deregistered> for DeregisteredView {
    fn from(done: Deregistered) -> Self {
        DeregisteredView {
            event: done.event,
            csrf: done.csrf.value().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&OrganizerError> for ErrorResponse {
    fn from(err: &OrganizerError) -> Self {
        let code = match err {
            OrganizerError::NotFound => "NOT_FOUND",
            OrganizerError::Unauthorized(_) => "UNAUTHORIZED",
            OrganizerError::BadRequest(_) => "BAD_REQUEST",
            OrganizerError::Validation(_) => "VALIDATION_ERROR",
            OrganizerError::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            OrganizerError::RandomSource(_)
            | OrganizerError::DatabaseError(_)
            | OrganizerError::MailError(_)
            | OrganizerError::ConfigurationError(_) => "INTERNAL_ERROR",
        };

        // rejection reasons and infrastructure detail stay in the logs
        let error = match err {
            OrganizerError::Unauthorized(_) => "Unauthorized".to_owned(),
            err if err.is_internal() => "Internal server error".to_owned(),
            err => err.to_string(),
        };

        ErrorResponse {
            error,
            code: code.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rejection, ValidationError};

    #[test]
    fn test_error_response_hides_detail() {
        let unauthorized = ErrorResponse::from(&OrganizerError::Unauthorized(Rejection::Expired));
        assert_eq!(unauthorized.error, "Unauthorized");
        assert_eq!(unauthorized.code, "UNAUTHORIZED");

        let internal = ErrorResponse::from(&OrganizerError::DatabaseError(
            "no such table: users".to_owned(),
        ));
        assert_eq!(internal.error, "Internal server error");
        assert_eq!(internal.code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_response_keeps_validation_message() {
        let response =
            ErrorResponse::from(&OrganizerError::Validation(ValidationError::TitleEmpty));
        assert_eq!(response.code, "VALIDATION_ERROR");
        assert!(response.error.starts_with("Validation error"));
    }

    #[test]
    fn test_request_debug_is_redacted() {
        let request = ConfirmLoginRequest {
            token: "login-value".to_owned(),
            csrf: "csrf-value".to_owned(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("login-value"));
        assert!(!debug.contains("csrf-value"));
    }
}
