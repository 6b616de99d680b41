/// Exchange timezone conversion and local-time parsing
use chrono::{DateTime, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::{ClockError, Result};
use crate::types::LocalDateTime;

/// Resolve an IANA timezone name such as `America/New_York`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| ClockError::UnknownTimezone(name.to_string()))
}

/// Convert a UTC instant to exchange wall-clock components
pub fn to_exchange_local(now: DateTime<Utc>, tz: Tz) -> LocalDateTime {
    LocalDateTime::from_datetime(&now.with_timezone(&tz))
}

/// Parse `"Wed 09:45"` or `"Wednesday 09:45:30"` as an exchange-local instant
pub fn parse_local_instant(input: &str) -> Result<LocalDateTime> {
    let invalid = || ClockError::InvalidLocalTime(format!("expected \"<weekday> HH:MM[:SS]\", got \"{}\"", input));

    let mut parts = input.split_whitespace();
    let (Some(day), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let weekday = day.parse::<Weekday>().map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|_| invalid())?;

    LocalDateTime::new(weekday, time.hour(), time.minute(), time.second())
}
