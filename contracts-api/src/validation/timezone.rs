//! Timezone-aware datetimes and the UTC policy
//!
//! Every datetime crossing the contract boundary must carry a named IANA zone,
//! and that zone must be `UTC`. Naive values and fixed offsets can still be
//! represented so that host data is preserved exactly, but they never pass
//! [`require_utc`].

use crate::{Error, Result};
use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A datetime as supplied by a contract author or the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TzDateTimeRepr", try_from = "TzDateTimeRepr")]
pub enum TzDateTime {
    /// No timezone information
    Naive(NaiveDateTime),
    /// Fixed UTC offset without a zone name
    FixedOffset(DateTime<FixedOffset>),
    /// Named IANA zone
    Zoned(DateTime<Tz>),
}

impl TzDateTime {
    /// UTC datetime in the named `UTC` zone
    pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Result<Self> {
        let naive = naive_from_parts(year, month, day, hour, minute, second)?;
        Ok(TzDateTime::Zoned(Tz::UTC.from_utc_datetime(&naive)))
    }

    /// Datetime in an arbitrary named zone, from local wall-clock parts
    pub fn in_zone(
        zone: Tz,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self> {
        let naive = naive_from_parts(year, month, day, hour, minute, second)?;
        zone.from_local_datetime(&naive)
            .earliest()
            .map(TzDateTime::Zoned)
            .ok_or_else(|| Error::invalid(format!("{} does not exist in zone {}", naive, zone.name())))
    }

    /// Naive datetime without zone information
    pub fn naive(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Result<Self> {
        naive_from_parts(year, month, day, hour, minute, second).map(TzDateTime::Naive)
    }

    /// Current time in the named `UTC` zone
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Point on the UTC timeline used for ordering.
    ///
    /// Naive values are read as if they were UTC.
    pub fn instant(&self) -> NaiveDateTime {
        match self {
            TzDateTime::Naive(dt) => *dt,
            TzDateTime::FixedOffset(dt) => dt.naive_utc(),
            TzDateTime::Zoned(dt) => dt.naive_utc(),
        }
    }

    /// The value as `DateTime<Utc>` if it satisfies the UTC policy
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            TzDateTime::Zoned(dt) if dt.timezone() == Tz::UTC => Some(dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// IANA zone name, if any
    pub fn zone_name(&self) -> Option<&'static str> {
        match self {
            TzDateTime::Zoned(dt) => Some(dt.timezone().name()),
            _ => None,
        }
    }

    /// Check if the value carries any timezone information
    pub fn is_aware(&self) -> bool {
        !matches!(self, TzDateTime::Naive(_))
    }

    /// Add a duration, keeping the same timezone representation
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        match self {
            TzDateTime::Naive(dt) => dt.checked_add_signed(duration).map(TzDateTime::Naive),
            TzDateTime::FixedOffset(dt) => dt.checked_add_signed(duration).map(TzDateTime::FixedOffset),
            TzDateTime::Zoned(dt) => dt.checked_add_signed(duration).map(TzDateTime::Zoned),
        }
    }

    /// Start of the same calendar day, keeping the timezone representation
    pub fn start_of_day(&self) -> Option<Self> {
        match self {
            TzDateTime::Naive(dt) => dt.date().and_hms_opt(0, 0, 0).map(TzDateTime::Naive),
            TzDateTime::FixedOffset(dt) => dt
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .and_then(|n| dt.timezone().from_local_datetime(&n).earliest())
                .map(TzDateTime::FixedOffset),
            TzDateTime::Zoned(dt) => dt
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .and_then(|n| dt.timezone().from_local_datetime(&n).earliest())
                .map(TzDateTime::Zoned),
        }
    }
}

fn naive_from_parts(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| {
            Error::invalid(format!(
                "Invalid datetime {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ))
        })
}

impl fmt::Display for TzDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TzDateTime::Naive(dt) => write!(f, "{}", dt),
            TzDateTime::FixedOffset(dt) => write!(f, "{}", dt.to_rfc3339()),
            TzDateTime::Zoned(dt) => write!(f, "{}[{}]", dt.to_rfc3339(), dt.timezone().name()),
        }
    }
}

impl From<DateTime<Utc>> for TzDateTime {
    fn from(dt: DateTime<Utc>) -> Self {
        TzDateTime::Zoned(dt.with_timezone(&Tz::UTC))
    }
}

impl From<DateTime<Tz>> for TzDateTime {
    fn from(dt: DateTime<Tz>) -> Self {
        TzDateTime::Zoned(dt)
    }
}

impl From<DateTime<FixedOffset>> for TzDateTime {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        TzDateTime::FixedOffset(dt)
    }
}

impl From<NaiveDateTime> for TzDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        TzDateTime::Naive(dt)
    }
}

/// Wire representation. Zoned and fixed-offset values carry the UTC instant
/// so decoding never hits a DST gap.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TzDateTimeRepr {
    Naive { local: NaiveDateTime },
    FixedOffset { utc: NaiveDateTime, offset_seconds: i32 },
    Zoned { utc: NaiveDateTime, zone: Tz },
}

impl From<TzDateTime> for TzDateTimeRepr {
    fn from(value: TzDateTime) -> Self {
        match value {
            TzDateTime::Naive(local) => TzDateTimeRepr::Naive { local },
            TzDateTime::FixedOffset(dt) => TzDateTimeRepr::FixedOffset {
                utc: dt.naive_utc(),
                offset_seconds: dt.offset().fix().local_minus_utc(),
            },
            TzDateTime::Zoned(dt) => TzDateTimeRepr::Zoned {
                utc: dt.naive_utc(),
                zone: dt.timezone(),
            },
        }
    }
}

impl TryFrom<TzDateTimeRepr> for TzDateTime {
    type Error = String;

    fn try_from(repr: TzDateTimeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            TzDateTimeRepr::Naive { local } => Ok(TzDateTime::Naive(local)),
            TzDateTimeRepr::FixedOffset { utc, offset_seconds } => {
                let offset = FixedOffset::east_opt(offset_seconds)
                    .ok_or_else(|| format!("offset {}s is out of range", offset_seconds))?;
                Ok(TzDateTime::FixedOffset(offset.from_utc_datetime(&utc)))
            }
            TzDateTimeRepr::Zoned { utc, zone } => Ok(TzDateTime::Zoned(zone.from_utc_datetime(&utc))),
        }
    }
}

/// Enforce the UTC policy on a datetime field.
///
/// Checks run in order: timezone present, timezone is a named zone, zone is `UTC`.
pub fn require_utc(value: &TzDateTime, field: &str, type_name: &str) -> Result<DateTime<Utc>> {
    match value {
        TzDateTime::Naive(_) => Err(Error::invalid(format!(
            "'{}' of {} is not timezone aware.",
            field, type_name
        ))),
        TzDateTime::FixedOffset(dt) => Err(Error::invalid(format!(
            "'{}' of {} must have timezone of type ZoneInfo, currently {}.",
            field,
            type_name,
            dt.offset()
        ))),
        TzDateTime::Zoned(dt) => {
            if dt.timezone() != Tz::UTC {
                return Err(Error::invalid(format!(
                    "'{}' of {} must have timezone UTC, currently {}.",
                    field,
                    type_name,
                    dt.timezone().name()
                )));
            }
            Ok(dt.with_timezone(&Utc))
        }
    }
}

/// [`require_utc`] for optional fields
pub fn require_optional_utc(
    value: Option<&TzDateTime>,
    field: &str,
    type_name: &str,
) -> Result<Option<DateTime<Utc>>> {
    value.map(|dt| require_utc(dt, field, type_name)).transpose()
}
