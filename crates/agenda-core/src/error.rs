use thiserror::Error;

/// Why a raw event was left out of the normalized set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidEventError {
    #[error("event has no date")]
    MissingDate,

    #[error("unparseable event date: {raw:?}")]
    UnparseableDate { raw: String },

    #[error("invalid event time {raw:?}; expected HH:MM")]
    InvalidTime { raw: String },

    #[error("event has no capacity")]
    MissingCapacity,

    #[error("negative capacity: {capacity}")]
    NegativeCapacity { capacity: i64 },

    #[error("capacity {capacity} is too large")]
    CapacityTooLarge { capacity: i64 },

    #[error("negative attendee count: {attendees}")]
    NegativeAttendees { attendees: i64 },

    #[error("attendees ({attendees}) exceed capacity ({capacity})")]
    AttendeesExceedCapacity { attendees: i64, capacity: i64 },

    /// The record could not be read as an event at all, e.g. a field of the
    /// wrong JSON type.
    #[error("malformed event record: {reason}")]
    Malformed { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid view mode {raw:?}; expected one of day, week, month, year")]
pub struct InvalidViewModeError {
    pub raw: String,
}

impl InvalidViewModeError {
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self { raw: raw.into() }
    }
}

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("no event with id {0:?}")]
    UnknownEvent(String),

    #[error("event source failed: {0:#}")]
    Source(#[from] anyhow::Error),
}

impl CalendarError {
    pub fn unknown_event<S: Into<String>>(id: S) -> Self {
        Self::UnknownEvent(id.into())
    }
}
