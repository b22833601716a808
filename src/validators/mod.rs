pub mod email;
pub mod event;

pub use email::validate_email;
pub use event::{EventForm, MAX_MESSAGE_LENGTH, validate_message};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    TitleEmpty,
    TitleTooLong,
    DescriptionTooLong,
    MessageTooLong,
    IntervalNotPositive,
    ParticipantsNegative,
    ParticipantsRange,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Invalid email format"),
            Self::TitleEmpty => write!(f, "Title cannot be empty"),
            Self::TitleTooLong => write!(f, "Title is too long (max 200 characters)"),
            Self::DescriptionTooLong => write!(f, "Description is too long (max 4000 characters)"),
            Self::MessageTooLong => write!(f, "Message is too long (max 512 characters)"),
            Self::IntervalNotPositive => write!(f, "Repeat interval must be at least 1"),
            Self::ParticipantsNegative => write!(f, "Participant limits cannot be negative"),
            Self::ParticipantsRange => {
                write!(f, "Minimum participants cannot exceed maximum participants")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
