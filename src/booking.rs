// Booking data model and the time-derived status classifier

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, Fields};

// The two resources a booking can be scoped to
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Toilet,
    Bath,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Toilet => "toilet",
            ResourceType::Bath => "bath",
        };
        f.pad(name)
    }
}

// Status of a booking relative to "now". Never stored, always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Active,
    Pending,
    Expired,
}

// Colour hint for whatever renders the status chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Warning,
    Error,
}

impl BookingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Pending => "pending",
            BookingStatus::Expired => "expired",
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            BookingStatus::Active => StatusTone::Success,
            BookingStatus::Pending => StatusTone::Warning,
            BookingStatus::Expired => StatusTone::Error,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

// End of [start, start + duration], or None past the representable range
pub fn window_end(start: DateTime<Utc>, duration_minutes: u32) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
}

// Classify [start, start + duration] against `now`.
// Both ends of the active window are inclusive: `now == end` is still Active.
// A window running past the representable range never expires.
pub fn classify(start: DateTime<Utc>, duration_minutes: u32, now: DateTime<Utc>) -> BookingStatus {
    let end = window_end(start, duration_minutes).unwrap_or(DateTime::<Utc>::MAX_UTC);

    if now >= start && now <= end {
        BookingStatus::Active
    } else if now < start {
        BookingStatus::Pending
    } else {
        BookingStatus::Expired
    }
}

// Fields persisted in the store document. Field names follow the stored layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFields {
    pub name: String,
    #[serde(rename = "type")]
    pub resource: ResourceType,
    #[serde(rename = "startDateTime")]
    pub start: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
}

impl BookingFields {
    pub fn end(&self) -> DateTime<Utc> {
        window_end(self.start, self.duration_minutes).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            // a struct always serializes to an object
            other => Err(serde::ser::Error::custom(format!(
                "booking serialized to non-object: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub resource: ResourceType,
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl Booking {
    pub fn new(id: impl Into<String>, fields: BookingFields) -> Self {
        Self {
            id: id.into(),
            name: fields.name,
            resource: fields.resource,
            start: fields.start,
            duration_minutes: fields.duration_minutes,
        }
    }

    // Decode a store document into a booking.
    // Documents come from any client, so the window is range-checked too.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: BookingFields =
            serde_json::from_value(serde_json::Value::Object(doc.fields.clone()))?;

        if fields.duration_minutes == 0 {
            return Err(serde::de::Error::custom("booking duration must be positive"));
        }
        if window_end(fields.start, fields.duration_minutes).is_none() {
            return Err(serde::de::Error::custom(format!(
                "booking starting {} for {} minutes ends out of range",
                fields.start, fields.duration_minutes
            )));
        }

        Ok(Self::new(doc.id.clone(), fields))
    }

    pub fn end(&self) -> DateTime<Utc> {
        window_end(self.start, self.duration_minutes).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> BookingStatus {
        classify(self.start, self.duration_minutes, now)
    }
}
