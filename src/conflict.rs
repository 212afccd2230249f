// Overlap detection between a candidate booking and the live set.
// Intervals are half-open [start, end), so back-to-back bookings never collide.

use chrono::{DateTime, Utc};

use crate::booking::{Booking, BookingFields};

pub fn overlaps(
    new_start: DateTime<Utc>,
    new_end: DateTime<Utc>,
    existing_start: DateTime<Utc>,
    existing_end: DateTime<Utc>,
) -> bool {
    new_start < existing_end && new_end > existing_start
}

// First booking of the same resource type whose interval intersects the candidate
pub fn find_conflict<'a, I>(candidate: &BookingFields, existing: I) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    let new_start = candidate.start;
    let new_end = candidate.end();

    existing
        .into_iter()
        .filter(|b| b.resource == candidate.resource)
        .find(|b| overlaps(new_start, new_end, b.start, b.end()))
}

pub fn has_conflict<'a, I>(candidate: &BookingFields, existing: I) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    find_conflict(candidate, existing).is_some()
}
