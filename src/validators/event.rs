//! Validation of the event creation form and registration messages.

use serde::Deserialize;

use super::ValidationError;
use crate::{NewEvent, OrganizerError, TimeScale, UserId};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 4000;
pub const MAX_MESSAGE_LENGTH: usize = 512;

/// Raw fields of the event creation form.
///
/// Checkboxes (`repeats`, `min_part`, `max_part`) are ticked when their value
/// is `on`; the associated number fields are only read when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub repeats: String,
    pub every: String,
    pub scale: String,
    pub min_part: String,
    pub min_part_num: String,
    pub max_part: String,
    pub max_part_num: String,
}

fn ticked(checkbox: &str) -> bool {
    checkbox == "on"
}

fn number(field: &str, value: &str) -> Result<i64, OrganizerError> {
    value.trim().parse::<i64>().map_err(|_| {
        OrganizerError::BadRequest(format!("invalid value for field {field}: must be a number"))
    })
}

impl EventForm {
    /// Parses and validates the form into an event owned by `created_by`.
    ///
    /// # Errors
    ///
    /// `OrganizerError::BadRequest` for unparsable numbers or an unknown
    /// scale, `OrganizerError::Validation` for values out of range.
    pub fn into_new_event(self, created_by: UserId) -> Result<NewEvent, OrganizerError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ValidationError::TitleEmpty.into());
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ValidationError::TitleTooLong.into());
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::DescriptionTooLong.into());
        }

        let (repeats_every, repeats_scale) = if ticked(&self.repeats) {
            let every = number("every", &self.every)?;
            let scale = self.scale.parse::<TimeScale>().map_err(|_| {
                OrganizerError::bad_request(
                    "invalid value for field scale: must be one of never, daily, weekly, monthly, or yearly",
                )
            })?;
            if scale != TimeScale::Never && every < 1 {
                return Err(ValidationError::IntervalNotPositive.into());
            }
            (every, scale)
        } else {
            (0, TimeScale::Never)
        };

        let min_participants = ticked(&self.min_part)
            .then(|| number("min_part_num", &self.min_part_num))
            .transpose()?;
        let max_participants = ticked(&self.max_part)
            .then(|| number("max_part_num", &self.max_part_num))
            .transpose()?;

        if min_participants.is_some_and(|n| n < 0) || max_participants.is_some_and(|n| n < 0) {
            return Err(ValidationError::ParticipantsNegative.into());
        }
        if let (Some(min), Some(max)) = (min_participants, max_participants) {
            if min > max {
                return Err(ValidationError::ParticipantsRange.into());
            }
        }

        Ok(NewEvent {
            created_by,
            title,
            description: self.description,
            repeats_every,
            repeats_scale,
            min_participants,
            max_participants,
        })
    }
}

pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::MessageTooLong);
    }
    Ok(())
}
