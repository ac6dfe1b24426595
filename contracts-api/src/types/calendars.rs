//! Calendar events (holidays, cut-off windows)

use crate::validation::{require_non_empty, require_utc, TzDateTime};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A dated event on a named calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event id
    pub id: String,

    /// Calendar the event belongs to
    pub calendar_id: String,

    /// Event start
    pub start_datetime: TzDateTime,

    /// Event end, exclusive
    pub end_datetime: TzDateTime,
}

impl CalendarEvent {
    /// Validated constructor
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        start_datetime: TzDateTime,
        end_datetime: TzDateTime,
    ) -> Result<Self> {
        let event = Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            start_datetime,
            end_datetime,
        };
        event.validate()?;
        Ok(event)
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.id, "id", "CalendarEvent")?;
        require_non_empty(&self.calendar_id, "calendar_id", "CalendarEvent")?;
        let start = require_utc(&self.start_datetime, "start_datetime", "CalendarEvent")?;
        let end = require_utc(&self.end_datetime, "end_datetime", "CalendarEvent")?;
        if end <= start {
            return Err(Error::invalid(format!(
                "'end_datetime' of CalendarEvent '{}' must be after 'start_datetime'.",
                self.id
            )));
        }
        Ok(())
    }

    /// Check if `at` falls in `[start, end)`
    pub fn contains(&self, at: &TzDateTime) -> bool {
        let instant = at.instant();
        self.start_datetime.instant() <= instant && instant < self.end_datetime.instant()
    }
}

/// Calendar events ordered by start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarEvents {
    events: Vec<CalendarEvent>,
}

impl CalendarEvents {
    /// Validated constructor; events are sorted by start
    pub fn new(mut events: Vec<CalendarEvent>) -> Result<Self> {
        for event in &events {
            event.validate()?;
        }
        events.sort_by_key(|e| e.start_datetime.instant());
        Ok(Self { events })
    }

    /// Events in start order
    pub fn all(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Events covering `at`
    pub fn active_at(&self, at: &TzDateTime) -> Result<Vec<&CalendarEvent>> {
        require_utc(at, "at", "CalendarEvents")?;
        Ok(self.events.iter().filter(|e| e.contains(at)).collect())
    }

    /// Events of a single calendar
    pub fn for_calendar<'a>(&'a self, calendar_id: &'a str) -> impl Iterator<Item = &'a CalendarEvent> + 'a {
        self.events.iter().filter(move |e| e.calendar_id == calendar_id)
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if there are no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> TzDateTime {
        TzDateTime::utc(2024, 12, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_event_requires_end_after_start() {
        assert!(CalendarEvent::new("xmas", "BANK_HOLIDAYS", day(25), day(25)).is_err());
        assert!(CalendarEvent::new("xmas", "BANK_HOLIDAYS", day(25), day(26)).is_ok());
    }

    #[test]
    fn test_active_at() {
        let events = CalendarEvents::new(vec![
            CalendarEvent::new("boxing", "BANK_HOLIDAYS", day(26), day(27)).unwrap(),
            CalendarEvent::new("xmas", "BANK_HOLIDAYS", day(25), day(26)).unwrap(),
        ])
        .unwrap();

        assert_eq!(events.all()[0].id, "xmas");
        let active = events.active_at(&TzDateTime::utc(2024, 12, 25, 12, 0, 0).unwrap()).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "xmas");
        assert_eq!(events.active_at(&day(26)).unwrap()[0].id, "boxing");
        assert!(events.active_at(&day(27)).unwrap().is_empty());
        assert_eq!(events.for_calendar("BANK_HOLIDAYS").count(), 2);
    }

    #[test]
    fn test_active_at_rejects_naive() {
        let events = CalendarEvents::default();
        assert!(events.active_at(&TzDateTime::naive(2024, 1, 1, 0, 0, 0).unwrap()).is_err());
    }
}
