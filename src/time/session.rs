/// Session definitions and open/closed resolution
use chrono::Weekday;
use serde::Serialize;

use crate::error::{ClockError, Result};
use crate::time::calendar::{classify, hour_to_minute, MarketClosureWindow};
use crate::types::{
    EarlyCloseConfig, LocalDateTime, SessionConfig, WeekdaySet, MINUTES_PER_DAY,
};

pub const ASIA_RANGE: &str = "AsiaRange";
pub const LONDON_KILLZONE: &str = "LondonKillzone";
pub const NY_KILLZONE: &str = "NYKillzone";
pub const POST_TRADE: &str = "PostTrade";

/// Session closes early at `close_minute` on any day in `days`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EarlyClose {
    days: WeekdaySet,
    close_minute: u32,
}

impl EarlyClose {
    pub fn new(days: WeekdaySet, close_hour: f64) -> Result<Self> {
        if days.is_empty() {
            return Err(ClockError::ConfigError("early close has no days".to_string()));
        }
        let close_minute = hour_to_minute(close_hour).ok_or_else(|| {
            ClockError::ConfigError(format!("early close hour {} outside [0, 24)", close_hour))
        })?;

        Ok(EarlyClose { days, close_minute })
    }

    pub fn days(&self) -> WeekdaySet {
        self.days
    }

    pub fn close_minute(&self) -> u32 {
        self.close_minute
    }

    pub fn close_hour(&self) -> f64 {
        self.close_minute as f64 / 60.0
    }

    pub fn applies_on(&self, weekday: Weekday) -> bool {
        self.days.contains(weekday)
    }
}

const POST_TRADE_EARLY_CLOSES: [EarlyClose; 1] = [EarlyClose {
    days: WeekdaySet::FRIDAY,
    close_minute: 17 * 60,
}];

/// Per-session override table
const OVERRIDE_TABLE: &[(&str, &[EarlyClose])] = &[(POST_TRADE, &POST_TRADE_EARLY_CLOSES)];

/// Built-in early closes for a session name
pub fn overrides_for(name: &str) -> &'static [EarlyClose] {
    OVERRIDE_TABLE
        .iter()
        .find(|(session, _)| *session == name)
        .map(|(_, rules)| *rules)
        .unwrap_or(&[])
}

/// A named recurring daily trading window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefinition {
    name: String,
    start_minute: u32,
    /// Exclusive; 1440 (next midnight) when the session spans midnight
    end_minute: u32,
    spans_midnight: bool,
    valid_days: WeekdaySet,
    early_closes: Vec<EarlyClose>,
}

impl SessionDefinition {
    /// Checks name, days and hour ranges
    ///
    /// Whether the session can ever open depends on the closure it runs under;
    /// `SessionClock::new` checks that against its own window, direct callers
    /// use `ensure_can_open`.
    pub fn new(
        name: impl Into<String>,
        start_hour: f64,
        end_hour: f64,
        valid_days: WeekdaySet,
        early_closes: Vec<EarlyClose>,
    ) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| ClockError::InvalidSession {
            name: name.clone(),
            reason,
        };

        if name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if valid_days.is_empty() {
            return Err(invalid("valid_days is empty".to_string()));
        }
        let start_minute = hour_to_minute(start_hour)
            .ok_or_else(|| invalid(format!("start_hour {} outside [0, 24)", start_hour)))?;
        let end_minute = hour_to_minute(end_hour)
            .ok_or_else(|| invalid(format!("end_hour {} outside [0, 24)", end_hour)))?;

        Ok(Self::from_minutes(&name, start_minute, end_minute, valid_days, early_closes))
    }

    fn from_minutes(
        name: &str,
        start_minute: u32,
        end_minute: u32,
        valid_days: WeekdaySet,
        early_closes: Vec<EarlyClose>,
    ) -> Self {
        let spans_midnight = end_minute <= start_minute;
        SessionDefinition {
            name: name.to_string(),
            start_minute,
            end_minute: if spans_midnight { MINUTES_PER_DAY } else { end_minute },
            spans_midnight,
            valid_days,
            early_closes,
        }
    }

    /// Asia range, 20:00 to midnight, Sunday through Thursday
    pub fn asia_range() -> Self {
        Self::from_minutes(ASIA_RANGE, 20 * 60, 0, WeekdaySet::SUN_TO_THU, Vec::new())
    }

    /// London killzone, 02:00 to 05:00, Monday through Friday
    pub fn london_killzone() -> Self {
        Self::from_minutes(LONDON_KILLZONE, 2 * 60, 5 * 60, WeekdaySet::WEEKDAYS, Vec::new())
    }

    /// New York killzone, 07:00 to 10:00, Monday through Friday
    pub fn ny_killzone() -> Self {
        Self::from_minutes(NY_KILLZONE, 7 * 60, 10 * 60, WeekdaySet::WEEKDAYS, Vec::new())
    }

    /// Post-trade review, 16:00 to 20:00, Monday through Friday, closing 17:00 on Friday
    pub fn post_trade() -> Self {
        Self::from_minutes(
            POST_TRADE,
            16 * 60,
            20 * 60,
            WeekdaySet::WEEKDAYS,
            overrides_for(POST_TRADE).to_vec(),
        )
    }

    pub fn builtins() -> Vec<SessionDefinition> {
        vec![
            Self::asia_range(),
            Self::london_killzone(),
            Self::ny_killzone(),
            Self::post_trade(),
        ]
    }

    /// Fails when no valid day lets the session open at its start or at the end of `closure`
    pub fn ensure_can_open(&self, closure: &MarketClosureWindow) -> Result<()> {
        let opens = self.valid_days.iter().any(|day| {
            std::iter::once(self.start_minute)
                .chain(closure.ends_on(day))
                .any(|minute| is_open_at(self, day, minute, closure))
        });

        if opens {
            Ok(())
        } else {
            Err(ClockError::InvalidSession {
                name: self.name.clone(),
                reason: "session never opens outside the market closure".to_string(),
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_minute(&self) -> u32 {
        self.start_minute
    }

    /// Exclusive close minute; 1440 for midnight-spanning sessions
    pub fn end_minute(&self) -> u32 {
        self.end_minute
    }

    pub fn start_hour(&self) -> f64 {
        self.start_minute as f64 / 60.0
    }

    /// 24.0 for midnight-spanning sessions, never 0
    pub fn end_hour(&self) -> f64 {
        self.end_minute as f64 / 60.0
    }

    pub fn spans_midnight(&self) -> bool {
        self.spans_midnight
    }

    pub fn valid_days(&self) -> WeekdaySet {
        self.valid_days
    }

    pub fn early_closes(&self) -> &[EarlyClose] {
        &self.early_closes
    }

    /// Earliest early-close minute active on `weekday`
    pub fn early_close_on(&self, weekday: Weekday) -> Option<u32> {
        self.early_closes
            .iter()
            .filter(|rule| rule.applies_on(weekday))
            .map(|rule| rule.close_minute)
            .min()
    }
}

impl TryFrom<&SessionConfig> for SessionDefinition {
    type Error = ClockError;

    fn try_from(config: &SessionConfig) -> Result<Self> {
        let early_closes = match &config.early_close {
            Some(rules) => rules
                .iter()
                .map(|rule| EarlyClose::new(rule.days, rule.close_hour))
                .collect::<Result<Vec<_>>>()
                .map_err(|e| ClockError::InvalidSession {
                    name: config.name.clone(),
                    reason: e.to_string(),
                })?,
            None => overrides_for(&config.name).to_vec(),
        };

        SessionDefinition::new(
            config.name.clone(),
            config.start_hour,
            config.end_hour,
            config.valid_days,
            early_closes,
        )
    }
}

impl From<&SessionDefinition> for SessionConfig {
    fn from(session: &SessionDefinition) -> Self {
        SessionConfig {
            name: session.name.clone(),
            start_hour: session.start_hour(),
            end_hour: if session.spans_midnight { 0.0 } else { session.end_hour() },
            valid_days: session.valid_days,
            early_close: Some(
                session
                    .early_closes
                    .iter()
                    .map(|rule| EarlyCloseConfig {
                        days: rule.days,
                        close_hour: rule.close_hour(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Open/closed at a weekly instant under `closure`
pub fn is_open_at(
    session: &SessionDefinition,
    weekday: Weekday,
    minute_of_day: u32,
    closure: &MarketClosureWindow,
) -> bool {
    let market_closed = closure.contains(weekday, minute_of_day);
    is_open_on(session, weekday, minute_of_day, market_closed)
}

fn is_open_on(session: &SessionDefinition, weekday: Weekday, minute_of_day: u32, market_closed: bool) -> bool {
    if market_closed || !session.valid_days.contains(weekday) {
        return false;
    }

    let in_window = if session.spans_midnight {
        minute_of_day >= session.start_minute
    } else {
        session.start_minute <= minute_of_day && minute_of_day < session.end_minute
    };
    if !in_window {
        return false;
    }

    match session.early_close_on(weekday) {
        Some(close_minute) => minute_of_day < close_minute,
        None => true,
    }
}

/// Resolve whether `session` is open at `now` under `closure`
pub fn resolve(session: &SessionDefinition, now: &LocalDateTime, closure: &MarketClosureWindow) -> bool {
    let day = classify(now, closure);
    is_open_on(session, day.weekday, now.minute_of_day(), day.is_market_closed)
}

/// Resolve against the default weekend closure
pub fn is_open(session: &SessionDefinition, now: &LocalDateTime) -> bool {
    resolve(session, now, &MarketClosureWindow::weekend())
}
