use std::ops::RangeInclusive;
use std::str::FromStr;

use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, Time,
};

use crate::LookupError;

// The years a filter value may fall in. Anything outside of this range cannot
// be written back out as RFC 3339.
const YEARS: RangeInclusive<i32> = 1..=9999;

/// A point in time parsed from a filter value.
///
/// Accepts RFC 3339 timestamps with an offset, as well as naive ISO 8601
/// dates and date/times, which are assumed to be in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl FromStr for Timestamp {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let dt = OffsetDateTime::parse(s, &Rfc3339)
            .ok()
            .or_else(|| parse_naive_date_time(s).map(PrimitiveDateTime::assume_utc))
            .or_else(|| {
                Date::parse(s, format_description!("[year]-[month]-[day]"))
                    .ok()
                    .map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT).assume_utc())
            })
            .ok_or_else(|| {
                LookupError::InvalidValue(format!("String does not contain a date: '{}'", s))
            })?;
        if !YEARS.contains(&dt.year()) {
            return Err(LookupError::InvalidValue(format!(
                "year {} is out of range",
                dt.year()
            )));
        }
        Ok(Self(dt))
    }
}

// Naive date/times may use either a "T" or a space as the separator, and may
// omit seconds.
fn parse_naive_date_time(s: &str) -> Option<PrimitiveDateTime> {
    let normalized = s.replacen(' ', "T", 1);
    let s = normalized.as_str();
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    })
    .ok()
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl From<Timestamp> for OffsetDateTime {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(dt: OffsetDateTime) -> Self {
        Self(dt)
    }
}
