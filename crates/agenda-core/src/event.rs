use agenda_shared::{CenterId, RawEvent};
use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AgendaConfig, CategoryConfig, StatusThresholds};
use crate::date::CalendarDate;
use crate::error::InvalidEventError;

const TIME_FORMAT: &str = "%H:%M";
const DEFAULT_TIME: &str = "00:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTag {
    Critical,
    Pending,
    Confirmed,
}

impl StatusTag {
    pub fn from_occupancy(attendees: u32, capacity: u32, thresholds: StatusThresholds) -> Self {
        let ratio = if capacity == 0 {
            0.0
        } else {
            f64::from(attendees) / f64::from(capacity)
        };

        if ratio > thresholds.critical_above {
            Self::Critical
        } else if ratio > thresholds.confirmed_above {
            Self::Confirmed
        } else {
            Self::Pending
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

/// An event with a resolved date and validated occupancy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: CalendarDate,
    pub time: String,
    pub category: String,
    pub kind: String,
    pub location: String,
    pub center: Option<CenterId>,
    pub capacity: u32,
    pub attendees: u32,
    pub price: f64,
    pub published: bool,
    pub status: StatusTag,
}

impl CalendarEvent {
    pub fn available_spots(&self) -> u32 {
        self.capacity.saturating_sub(self.attendees)
    }
}

/// Ordered category -> visual type rules. First match wins.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<(Regex, String)>,
    fallback: String,
}

impl CategoryTable {
    pub fn from_config(config: &CategoryConfig) -> anyhow::Result<Self> {
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .with_context(|| format!("invalid category pattern {:?}", rule.pattern))
                    .map(|regex| (regex, rule.kind.clone()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            fallback: config.fallback.clone(),
        })
    }

    pub fn kind_for(&self, category: &str) -> &str {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(category))
            .map(|(_, kind)| kind.as_str())
            .unwrap_or(&self.fallback)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    /// Position in the raw input list.
    pub index: usize,
    pub id: Option<String>,
    pub error: InvalidEventError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub events: Vec<CalendarEvent>,
    pub skipped: Vec<SkippedEvent>,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    categories: CategoryTable,
    thresholds: StatusThresholds,
}

impl Normalizer {
    pub fn new(categories: CategoryTable, thresholds: StatusThresholds) -> Self {
        Self {
            categories,
            thresholds,
        }
    }

    pub fn from_config(config: &AgendaConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            CategoryTable::from_config(&config.categories)?,
            config.status,
        ))
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    #[tracing::instrument(skip_all, fields(total = raw_events.len()))]
    pub fn normalize_all(&self, raw_events: &[RawEvent]) -> NormalizeReport {
        collect_report(
            raw_events
                .iter()
                .map(|raw| (raw.id.clone(), self.normalize(raw))),
        )
    }

    /// Like [`Normalizer::normalize_all`], for records that have not been
    /// typed yet. A record that does not fit [`RawEvent`] is skipped as
    /// malformed instead of failing the batch.
    #[tracing::instrument(skip_all, fields(total = records.len()))]
    pub fn normalize_records(&self, records: &[Value]) -> NormalizeReport {
        collect_report(records.iter().map(|record| {
            let id = record
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string);
            let outcome = RawEvent::deserialize(record)
                .map_err(|err| InvalidEventError::Malformed {
                    reason: err.to_string(),
                })
                .and_then(|raw| self.normalize(&raw));
            (id, outcome)
        }))
    }

    pub fn normalize(&self, raw: &RawEvent) -> Result<CalendarEvent, InvalidEventError> {
        let (date, stamp_time) = parse_event_date(raw.date.as_deref())?;
        let time = match raw.time.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => parse_event_time(value)?,
            _ => stamp_time.unwrap_or_else(|| DEFAULT_TIME.to_string()),
        };

        let raw_capacity = raw.capacity.ok_or(InvalidEventError::MissingCapacity)?;
        if raw_capacity < 0 {
            return Err(InvalidEventError::NegativeCapacity {
                capacity: raw_capacity,
            });
        }
        let capacity = u32::try_from(raw_capacity).map_err(|_| {
            InvalidEventError::CapacityTooLarge {
                capacity: raw_capacity,
            }
        })?;

        let attendees = match (raw.attendees, raw.available_spots) {
            (Some(attendees), _) => attendees,
            (None, Some(spots)) => raw_capacity - spots.clamp(0, raw_capacity),
            (None, None) => 0,
        };
        if attendees < 0 {
            return Err(InvalidEventError::NegativeAttendees { attendees });
        }
        let attendees = u32::try_from(attendees)
            .ok()
            .filter(|count| *count <= capacity)
            .ok_or(InvalidEventError::AttendeesExceedCapacity {
                attendees,
                capacity: raw_capacity,
            })?;

        let center = raw.center.as_deref().and_then(|key| {
            let center = CenterId::from_key(key);
            if center.is_none() {
                warn!(center = %key, "unknown center; leaving unassigned");
            }
            center
        });

        Ok(CalendarEvent {
            id: raw
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title: raw.title.clone().unwrap_or_default(),
            date,
            time,
            category: raw.category.clone(),
            kind: self.categories.kind_for(&raw.category).to_string(),
            location: raw.location.clone().unwrap_or_default(),
            center,
            capacity,
            attendees,
            price: raw.price.unwrap_or(0.0),
            published: raw.published.unwrap_or(true),
            status: StatusTag::from_occupancy(attendees, capacity, self.thresholds),
        })
    }
}

fn collect_report(
    outcomes: impl Iterator<Item = (Option<String>, Result<CalendarEvent, InvalidEventError>)>,
) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for (index, (id, outcome)) in outcomes.enumerate() {
        match outcome {
            Ok(event) => report.events.push(event),
            Err(error) => {
                warn!(index, ?id, %error, "skipping invalid event");
                report.skipped.push(SkippedEvent { index, id, error });
            }
        }
    }

    debug!(
        normalized = report.events.len(),
        skipped = report.skipped.len(),
        "events normalized"
    );
    report
}

/// Returns the calendar date and, for timestamps, the HH:MM part.
fn parse_event_date(
    raw: Option<&str>,
) -> Result<(CalendarDate, Option<String>), InvalidEventError> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(InvalidEventError::MissingDate);
    }

    if let Some(date) = CalendarDate::parse(trimmed) {
        return Ok((date, None));
    }

    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        let naive = stamp.naive_local();
        return Ok((
            CalendarDate::from(naive.date()),
            Some(naive.format(TIME_FORMAT).to_string()),
        ));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok((
                CalendarDate::from(naive.date()),
                Some(naive.format(TIME_FORMAT).to_string()),
            ));
        }
    }

    Err(InvalidEventError::UnparseableDate {
        raw: trimmed.to_string(),
    })
}

fn parse_event_time(raw: &str) -> Result<String, InvalidEventError> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map(|time| time.format(TIME_FORMAT).to_string())
        .map_err(|_| InvalidEventError::InvalidTime {
            raw: raw.to_string(),
        })
}
