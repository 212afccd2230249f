// Raw form input and its validation into storable booking fields

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use crate::booking::{window_end, BookingFields, ResourceType};

// Accepted local formats for the start field (datetime-local inputs and friends)
const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    MissingName,

    #[error("Duration is required")]
    MissingDuration,

    #[error("Duration must be a whole number of minutes, got {0:?}")]
    InvalidDuration(String),

    #[error("Duration must be between 1 and {max} minutes, got {minutes}")]
    DurationOutOfRange { minutes: i64, max: u32 },

    #[error("Start time is required")]
    MissingStart,

    #[error("Start time {0:?} is not a valid date and time")]
    InvalidStart(String),
}

// What the user typed, before any checking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    pub name: String,
    pub duration: String,
    pub start: String,
    pub resource: ResourceType,
}

impl BookingForm {
    pub fn new(
        name: impl Into<String>,
        duration: impl Into<String>,
        start: impl Into<String>,
        resource: ResourceType,
    ) -> Self {
        Self {
            name: name.into(),
            duration: duration.into(),
            start: start.into(),
            resource,
        }
    }

    // Back to an empty form with the default resource selected
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn validate(&self, max_duration_minutes: u32) -> Result<BookingFields, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        let duration_minutes = parse_duration(&self.duration, max_duration_minutes)?;

        let raw_start = self.start.trim();
        if raw_start.is_empty() {
            return Err(ValidationError::MissingStart);
        }
        let start = parse_start(raw_start)?;
        if window_end(start, duration_minutes).is_none() {
            return Err(ValidationError::InvalidStart(raw_start.to_string()));
        }

        Ok(BookingFields {
            name: name.to_string(),
            resource: self.resource,
            start,
            duration_minutes,
        })
    }
}

fn parse_duration(raw: &str, max: u32) -> Result<u32, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingDuration);
    }

    let minutes: i64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidDuration(raw.to_string()))?;

    if minutes <= 0 || minutes > i64::from(max) {
        return Err(ValidationError::DurationOutOfRange { minutes, max });
    }

    // bounded by `max` above
    Ok(minutes as u32)
}

// Local wall-clock input is interpreted in the host's timezone.
// Explicit offsets (RFC 3339) are taken as given.
pub fn parse_start(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ValidationError::InvalidStart(raw.to_string()))?;

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(ValidationError::InvalidStart(raw.to_string())),
    }
}
