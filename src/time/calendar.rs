/// Weekly calendar classification in the exchange timezone
use chrono::Weekday;
use serde::Serialize;

use crate::error::{ClockError, Result};
use crate::time::session::SessionDefinition;
use crate::types::{LocalDateTime, MINUTES_PER_DAY};

const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

/// Convert a decimal hour in [0, 24) to the nearest minute of the day
///
/// Hours just below 24 that would round to midnight stay on 23:59.
pub fn hour_to_minute(hour: f64) -> Option<u32> {
    if !hour.is_finite() || !(0.0..24.0).contains(&hour) {
        return None;
    }

    let minute = (hour * 60.0).round() as u32;
    Some(minute.min(MINUTES_PER_DAY - 1))
}

fn minute_of_week(weekday: Weekday, minute_of_day: u32) -> u32 {
    weekday.num_days_from_sunday() * MINUTES_PER_DAY + minute_of_day
}

/// Exchange-wide closure window, `[start, end)` on the weekly clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketClosureWindow {
    start_day: Weekday,
    start_minute: u32,
    end_day: Weekday,
    end_minute: u32,
}

impl MarketClosureWindow {
    /// Friday 17:00 through Sunday 18:00
    pub fn weekend() -> Self {
        MarketClosureWindow {
            start_day: Weekday::Fri,
            start_minute: 17 * 60,
            end_day: Weekday::Sun,
            end_minute: 18 * 60,
        }
    }

    pub fn new(start_day: Weekday, start_hour: f64, end_day: Weekday, end_hour: f64) -> Result<Self> {
        let start_minute = hour_to_minute(start_hour).ok_or_else(|| {
            ClockError::InvalidClosureWindow(format!("start_hour {} outside [0, 24)", start_hour))
        })?;
        let end_minute = hour_to_minute(end_hour).ok_or_else(|| {
            ClockError::InvalidClosureWindow(format!("end_hour {} outside [0, 24)", end_hour))
        })?;

        if start_day == end_day && start_minute == end_minute {
            return Err(ClockError::InvalidClosureWindow(
                "start and end are the same instant".to_string(),
            ));
        }

        Ok(MarketClosureWindow { start_day, start_minute, end_day, end_minute })
    }

    /// Whether the weekly instant falls inside the closure
    pub fn contains(&self, weekday: Weekday, minute_of_day: u32) -> bool {
        let now = minute_of_week(weekday, minute_of_day);
        let start = minute_of_week(self.start_day, self.start_minute);
        let end = minute_of_week(self.end_day, self.end_minute);

        if start < end {
            now >= start && now < end
        } else {
            // Wraps past Saturday midnight
            now >= start || now < end
        }
    }

    /// Minute of the day the closure begins, if it begins on `weekday`
    pub fn starts_on(&self, weekday: Weekday) -> Option<u32> {
        (self.start_day == weekday).then_some(self.start_minute)
    }

    /// Minute of the day the closure ends, if it ends on `weekday`
    pub fn ends_on(&self, weekday: Weekday) -> Option<u32> {
        (self.end_day == weekday).then_some(self.end_minute)
    }

    /// Total length of the closure in minutes
    pub fn duration_minutes(&self) -> u32 {
        let start = minute_of_week(self.start_day, self.start_minute);
        let end = minute_of_week(self.end_day, self.end_minute);
        (end + MINUTES_PER_WEEK - start) % MINUTES_PER_WEEK
    }
}

impl Default for MarketClosureWindow {
    fn default() -> Self {
        MarketClosureWindow::weekend()
    }
}

/// Classifier output for one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayClassification {
    pub weekday: Weekday,
    pub decimal_time: f64,
    pub is_market_closed: bool,
}

pub fn classify(now: &LocalDateTime, closure: &MarketClosureWindow) -> DayClassification {
    DayClassification {
        weekday: now.weekday(),
        decimal_time: now.decimal_time(),
        is_market_closed: closure.contains(now.weekday(), now.minute_of_day()),
    }
}

/// Weekend closure check against the default Friday-to-Sunday window
pub fn is_market_closed(now: &LocalDateTime) -> bool {
    MarketClosureWindow::weekend().contains(now.weekday(), now.minute_of_day())
}

pub fn is_valid_session_day(session: &SessionDefinition, weekday: Weekday) -> bool {
    session.valid_days().contains(weekday)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(weekday: Weekday, hour: u32, minute: u32) -> LocalDateTime {
        LocalDateTime::new(weekday, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_weekend_closure_boundaries() {
        assert!(!is_market_closed(&at(Weekday::Fri, 16, 59)));
        assert!(is_market_closed(&at(Weekday::Fri, 17, 0)));
        assert!(is_market_closed(&at(Weekday::Sat, 0, 0)));
        assert!(is_market_closed(&at(Weekday::Sat, 12, 0)));
        assert!(is_market_closed(&at(Weekday::Sun, 0, 0)));
        assert!(is_market_closed(&at(Weekday::Sun, 17, 59)));
        assert!(!is_market_closed(&at(Weekday::Sun, 18, 0)));
        assert!(!is_market_closed(&at(Weekday::Mon, 0, 0)));
    }

    #[test]
    fn test_closure_matches_weekday_rule() {
        // Fri >= 17, all Saturday, Sun < 18
        for day in 0..7 {
            let weekday = crate::types::weekday_from_sunday(day);
            for minute in 0..MINUTES_PER_DAY {
                let now = at(weekday, minute / 60, minute % 60);
                let decimal = now.decimal_time();
                let expected = (weekday == Weekday::Fri && decimal >= 17.0)
                    || weekday == Weekday::Sat
                    || (weekday == Weekday::Sun && decimal < 18.0);
                assert_eq!(is_market_closed(&now), expected, "{}", now);
            }
        }
    }

    #[test]
    fn test_non_wrapping_window() {
        let closure = MarketClosureWindow::new(Weekday::Mon, 12.0, Weekday::Mon, 13.5).unwrap();
        assert!(!closure.contains(Weekday::Mon, 11 * 60 + 59));
        assert!(closure.contains(Weekday::Mon, 12 * 60));
        assert!(closure.contains(Weekday::Mon, 13 * 60 + 29));
        assert!(!closure.contains(Weekday::Mon, 13 * 60 + 30));
        assert_eq!(closure.duration_minutes(), 90);
    }

    #[test]
    fn test_weekend_duration() {
        // Fri 17:00 -> Sun 18:00 is 49 hours
        assert_eq!(MarketClosureWindow::weekend().duration_minutes(), 49 * 60);
    }

    #[test]
    fn test_invalid_window() {
        assert!(MarketClosureWindow::new(Weekday::Fri, 24.0, Weekday::Sun, 18.0).is_err());
        assert!(MarketClosureWindow::new(Weekday::Fri, -1.0, Weekday::Sun, 18.0).is_err());
        assert!(MarketClosureWindow::new(Weekday::Fri, f64::NAN, Weekday::Sun, 18.0).is_err());
        assert!(MarketClosureWindow::new(Weekday::Fri, 17.0, Weekday::Fri, 17.0).is_err());
    }

    #[test]
    fn test_hour_to_minute() {
        assert_eq!(hour_to_minute(0.0), Some(0));
        assert_eq!(hour_to_minute(9.5), Some(570));
        assert_eq!(hour_to_minute(23.99), Some(1439));
        assert_eq!(hour_to_minute(23.995), Some(1439));
        assert_eq!(hour_to_minute(23.999), Some(1439));
        assert_eq!(hour_to_minute(1.15), Some(69));
        assert_eq!(hour_to_minute(24.0), None);
    }

    #[test]
    fn test_classify() {
        let c = classify(&at(Weekday::Wed, 9, 45), &MarketClosureWindow::weekend());
        assert_eq!(c.weekday, Weekday::Wed);
        assert_eq!(c.decimal_time, 9.75);
        assert!(!c.is_market_closed);
    }

    #[test]
    fn test_valid_session_day() {
        let asia = SessionDefinition::asia_range();
        assert!(is_valid_session_day(&asia, Weekday::Sun));
        assert!(is_valid_session_day(&asia, Weekday::Thu));
        assert!(!is_valid_session_day(&asia, Weekday::Fri));
        assert!(!is_valid_session_day(&asia, Weekday::Sat));

        let london = SessionDefinition::london_killzone();
        assert!(!is_valid_session_day(&london, Weekday::Sun));
        assert!(is_valid_session_day(&london, Weekday::Fri));
    }
}
