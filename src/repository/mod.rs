//! Repository traits and data types.
//!
//! This module defines the storage abstractions used by the actions.
//! Implement these traits to use your own database or storage backend.
//!
//! # Traits
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`UserRepository`] | User lookup and creation |
//! | [`EventRepository`] | Event lookup, creation and listing |
//! | [`RegistrationRepository`] | Idempotent registration upsert and soft deletion |
//!
//! # Mock Implementations
//!
//! Enable the `mocks` feature for in-memory implementations useful for testing:
//!
//! - [`MockUserRepository`]
//! - [`MockEventRepository`]
//! - [`MockRegistrationRepository`]

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        /// Parses a form or query value. Malformed input is a bad request.
        impl ::std::str::FromStr for $name {
            type Err = $crate::OrganizerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self).map_err(|_| {
                    $crate::OrganizerError::bad_request(concat!("malformed ", stringify!($name)))
                })
            }
        }
    };
}

mod event;
mod registration;
mod user;

#[cfg(any(test, feature = "mocks"))]
mod event_mock;
#[cfg(any(test, feature = "mocks"))]
mod registration_mock;
#[cfg(any(test, feature = "mocks"))]
mod user_mock;

pub use event::Event;
pub use event::EventId;
pub use event::EventRepository;
pub use event::NewEvent;
pub use event::TimeScale;
pub use registration::EventRegistration;
pub use registration::EventRegistrationId;
pub use registration::RegistrationRepository;
pub use registration::stored_message;
pub use user::User;
pub use user::UserId;
pub use user::UserRepository;

#[cfg(any(test, feature = "mocks"))]
pub use event_mock::MockEventRepository;
#[cfg(any(test, feature = "mocks"))]
pub use registration_mock::MockRegistrationRepository;
#[cfg(any(test, feature = "mocks"))]
pub use user_mock::MockUserRepository;
