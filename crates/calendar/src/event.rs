use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use registrar_core::{CalendarEventId, DomainError, DomainResult, UserId};

registrar_core::labelled_enum! {
    pub enum EventType {
        Holiday => "holiday",
        Exam => "exam",
        Deadline => "deadline",
        Event => "event",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: CalendarEventId,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// `None` for seeded events.
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitCalendarEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub event_type: EventType,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp.
///
/// Accepts RFC 3339 with `Z` or a numeric offset, a naive date-time (taken as
/// UTC, `T` or space separated) and a bare date (midnight UTC).
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl SubmitCalendarEvent {
    /// Checks run in order: required fields, type, start date, end date.
    /// The end date is not compared with the start date.
    pub fn validate(self, creator: Option<UserId>, now: DateTime<Utc>) -> DomainResult<CalendarEventDraft> {
        if !present(&self.title) || !present(&self.start_date) || !present(&self.event_type) {
            return Err(DomainError::validation("title, startDate, and type are required"));
        }

        let event_type = self
            .event_type
            .as_deref()
            .and_then(EventType::parse)
            .ok_or_else(|| DomainError::validation("Invalid event type"))?;

        let start_date = self
            .start_date
            .as_deref()
            .and_then(parse_datetime)
            .ok_or_else(|| DomainError::validation("Invalid startDate format"))?;

        let end_date = match self.end_date.as_deref().filter(|v| !v.trim().is_empty()) {
            None => None,
            Some(raw) => Some(parse_datetime(raw).ok_or_else(|| DomainError::validation("Invalid endDate format"))?),
        };

        Ok(CalendarEventDraft {
            title: self.title.unwrap_or_default(),
            description: self.description,
            start_date,
            end_date,
            event_type,
            created_by: creator,
            created_at: now,
        })
    }
}

impl CalendarEventDraft {
    pub fn into_event(self, id: CalendarEventId) -> CalendarEvent {
        CalendarEvent {
            id,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            event_type: self.event_type,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}
