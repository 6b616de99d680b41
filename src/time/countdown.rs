/// Countdown to the next open/close transition of a session
use tracing::warn;

use crate::time::calendar::MarketClosureWindow;
use crate::time::session::{is_open_at, SessionDefinition};
use crate::types::{
    LocalDateTime, SessionStatus, SECONDS_PER_DAY, SECONDS_PER_MINUTE, SECONDS_PER_WEEK,
};

/// Day-steps the next-open search may take; every session recurs at least weekly
pub const MAX_SCAN_DAYS: u32 = 7;

/// Seconds until an open session closes
///
/// The close is the earliest of the session end, an early close active today,
/// and the start of the market closure if it begins later today.
pub fn seconds_until_close(
    session: &SessionDefinition,
    now: &LocalDateTime,
    closure: &MarketClosureWindow,
) -> u32 {
    let minute_of_day = now.minute_of_day();
    let mut target = session.end_minute();

    if let Some(early) = session.early_close_on(now.weekday()) {
        target = target.min(early);
    }
    if let Some(closure_start) = closure.starts_on(now.weekday()) {
        if closure_start > minute_of_day {
            target = target.min(closure_start);
        }
    }

    (target * SECONDS_PER_MINUTE).saturating_sub(now.second_of_day())
}

/// Seconds until a closed session next opens
///
/// Candidates are the session start on each day plus the end of the market
/// closure; the first one at which the session resolves as open wins.
/// Returns `None` only for a session that can never open under `closure`.
pub fn seconds_until_open(
    session: &SessionDefinition,
    now: &LocalDateTime,
    closure: &MarketClosureWindow,
) -> Option<u32> {
    let minute_of_day = now.minute_of_day();
    let mut day = now.weekday();

    for step in 0..=MAX_SCAN_DAYS {
        let mut candidates: Vec<u32> = std::iter::once(session.start_minute())
            .chain(closure.ends_on(day))
            .filter(|minute| step > 0 || *minute > minute_of_day)
            .collect();
        candidates.sort_unstable();

        if let Some(minute) = candidates
            .into_iter()
            .find(|minute| is_open_at(session, day, *minute, closure))
        {
            let target = step * SECONDS_PER_DAY + minute * SECONDS_PER_MINUTE;
            return Some(target - now.second_of_day());
        }

        day = day.succ();
    }

    None
}

/// Human-readable countdown: `"Closes in 2h 14m"`, `"Opens in 1d 3h"`
pub fn format_countdown(is_open: bool, seconds: u32) -> String {
    let prefix = if is_open { "Closes in" } else { "Opens in" };
    let days = seconds / SECONDS_PER_DAY;
    let hours = (seconds / 3600) % 24;
    let minutes = (seconds / 60) % 60;

    if days > 0 {
        format!("{} {}d {}h", prefix, days, hours)
    } else {
        format!("{} {}h {}m", prefix, hours, minutes)
    }
}

/// Build the status for a session whose open state is already resolved
pub fn calculate(
    session: &SessionDefinition,
    is_open: bool,
    now: &LocalDateTime,
    closure: &MarketClosureWindow,
) -> SessionStatus {
    let seconds = if is_open {
        seconds_until_close(session, now, closure)
    } else {
        seconds_until_open(session, now, closure).unwrap_or_else(|| {
            warn!(
                "Session {} has no opening within {} days of {}",
                session.name(),
                MAX_SCAN_DAYS,
                now
            );
            SECONDS_PER_WEEK
        })
    };

    SessionStatus {
        is_open,
        seconds_until_transition: seconds,
        label: format_countdown(is_open, seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::session::resolve;
    use crate::types::{weekday_from_sunday, WeekdaySet, MINUTES_PER_DAY};
    use chrono::Weekday;

    fn at(weekday: Weekday, hour: u32, minute: u32, second: u32) -> LocalDateTime {
        LocalDateTime::new(weekday, hour, minute, second).unwrap()
    }

    fn status(session: &SessionDefinition, now: LocalDateTime) -> SessionStatus {
        let closure = MarketClosureWindow::weekend();
        let is_open = resolve(session, &now, &closure);
        calculate(session, is_open, &now, &closure)
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(true, 2 * 3600 + 14 * 60 + 59), "Closes in 2h 14m");
        assert_eq!(format_countdown(false, 86_400 + 3 * 3600 + 59 * 60), "Opens in 1d 3h");
        assert_eq!(format_countdown(false, 59), "Opens in 0h 0m");
        assert_eq!(format_countdown(true, 0), "Closes in 0h 0m");
        assert_eq!(format_countdown(false, 2 * 86_400), "Opens in 2d 0h");
    }

    #[test]
    fn test_ny_killzone_open_midweek() {
        let s = status(&SessionDefinition::ny_killzone(), at(Weekday::Wed, 9, 45, 0));
        assert!(s.is_open);
        assert_eq!(s.seconds_until_transition, 15 * 60);
        assert!(s.label.starts_with("Closes in"));
        assert_eq!(s.label, "Closes in 0h 15m");
    }

    #[test]
    fn test_london_from_saturday_opens_monday() {
        let now = at(Weekday::Sat, 3, 0, 0);
        let s = status(&SessionDefinition::london_killzone(), now);
        assert!(!s.is_open);
        // Sat 03:00 -> Mon 02:00
        assert_eq!(s.seconds_until_transition, 47 * 3600);
        assert_eq!(now.advance(s.seconds_until_transition), at(Weekday::Mon, 2, 0, 0));
        assert_eq!(s.label, "Opens in 1d 23h");
    }

    #[test]
    fn test_post_trade_friday() {
        let post = SessionDefinition::post_trade();

        let open = status(&post, at(Weekday::Fri, 16, 59, 0));
        assert!(open.is_open);
        assert_eq!(open.seconds_until_transition, 60);

        let closed = status(&post, at(Weekday::Fri, 17, 0, 0));
        assert!(!closed.is_open);
        let next = at(Weekday::Fri, 17, 0, 0).advance(closed.seconds_until_transition);
        assert_eq!(next, at(Weekday::Mon, 16, 0, 0));
    }

    #[test]
    fn test_post_trade_thursday_closes_at_end() {
        let s = status(&SessionDefinition::post_trade(), at(Weekday::Thu, 17, 0, 0));
        assert!(s.is_open);
        assert_eq!(s.seconds_until_transition, 3 * 3600);
    }

    #[test]
    fn test_asia_closes_at_midnight() {
        let asia = SessionDefinition::asia_range();

        let s = status(&asia, at(Weekday::Sun, 23, 59, 0));
        assert!(s.is_open);
        assert_eq!(s.seconds_until_transition, 60);

        let s = status(&asia, at(Weekday::Thu, 20, 0, 0));
        assert!(s.is_open);
        assert_eq!(s.label, "Closes in 4h 0m");
    }

    #[test]
    fn test_asia_after_midnight_opens_same_evening() {
        let s = status(&SessionDefinition::asia_range(), at(Weekday::Mon, 0, 1, 0));
        assert!(!s.is_open);
        assert_eq!(s.seconds_until_transition, 20 * 3600 - 60);
        assert_eq!(s.label, "Opens in 19h 59m");
    }

    #[test]
    fn test_asia_sunday_reopen_sequence() {
        let asia = SessionDefinition::asia_range();

        let s = status(&asia, at(Weekday::Sun, 17, 59, 0));
        assert!(!s.is_open);
        assert_eq!(s.label, "Opens in 2h 1m");

        let s = status(&asia, at(Weekday::Sun, 18, 0, 0));
        assert!(!s.is_open);
        assert_eq!(s.seconds_until_transition, 2 * 3600);

        let s = status(&asia, at(Weekday::Fri, 20, 0, 0));
        assert!(!s.is_open);
        assert_eq!(s.label, "Opens in 2d 0h");

        let s = status(&asia, at(Weekday::Sat, 12, 0, 0));
        assert!(!s.is_open);
        assert_eq!(
            at(Weekday::Sat, 12, 0, 0).advance(s.seconds_until_transition),
            at(Weekday::Sun, 20, 0, 0)
        );
    }

    #[test]
    fn test_countdown_counts_seconds() {
        let s = status(&SessionDefinition::ny_killzone(), at(Weekday::Mon, 6, 59, 30));
        assert!(!s.is_open);
        assert_eq!(s.seconds_until_transition, 30);
    }

    #[test]
    fn test_monotonic_countdown_while_open() {
        let ny = SessionDefinition::ny_killzone();
        let start = at(Weekday::Tue, 7, 0, 0);
        let first = status(&ny, start);
        assert!(first.is_open);

        for elapsed in [1, 59, 60, 3599, 10_799] {
            let s = status(&ny, start.advance(elapsed));
            assert!(s.is_open);
            assert_eq!(s.seconds_until_transition, first.seconds_until_transition - elapsed);
        }
    }

    #[test]
    fn test_session_cut_by_closure() {
        // Friday afternoon session loses its tail to the weekend closure
        let session = SessionDefinition::new("Afternoon", 15.0, 19.0, WeekdaySet::WEEKDAYS, vec![]).unwrap();
        let s = status(&session, at(Weekday::Fri, 16, 0, 0));
        assert!(s.is_open);
        assert_eq!(s.seconds_until_transition, 3600);
    }

    #[test]
    fn test_session_opens_when_closure_ends() {
        // Sunday session already under way when the market reopens at 18:00
        let session = SessionDefinition::new(
            "SundayOpen",
            17.0,
            22.0,
            WeekdaySet::from_days(&[Weekday::Sun]),
            vec![],
        )
        .unwrap();
        let s = status(&session, at(Weekday::Sun, 17, 30, 0));
        assert!(!s.is_open);
        assert_eq!(s.seconds_until_transition, 30 * 60);
    }

    #[test]
    fn test_every_minute_of_week_transitions() {
        let closure = MarketClosureWindow::weekend();
        for session in SessionDefinition::builtins() {
            for day in 0..7 {
                let weekday = weekday_from_sunday(day);
                for minute in 0..MINUTES_PER_DAY {
                    for second in [0, 59] {
                        let now = at(weekday, minute / 60, minute % 60, second);
                        let s = status(&session, now);

                        if !s.is_open {
                            assert!(seconds_until_open(&session, &now, &closure).is_some());
                            assert!(s.seconds_until_transition > 0);
                        }
                        assert!(s.seconds_until_transition <= SECONDS_PER_WEEK);

                        let after = status(&session, now.advance(s.seconds_until_transition));
                        assert_ne!(after.is_open, s.is_open, "{} at {}", session.name(), now);
                    }
                }
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let now = at(Weekday::Wed, 3, 12, 44);
        for session in SessionDefinition::builtins() {
            assert_eq!(status(&session, now), status(&session, now));
        }
    }
}
