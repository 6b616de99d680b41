/// Core type definitions for the session clock
use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ClockError, Result};

pub const SECONDS_PER_MINUTE: u32 = 60;
pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const SECONDS_PER_DAY: u32 = 86_400;
pub const SECONDS_PER_WEEK: u32 = 7 * SECONDS_PER_DAY;

/// Map a Sunday-based day index (0=Sunday..6=Saturday) to a weekday
pub fn weekday_from_sunday(index: u32) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Set of weekdays stored as a bitmask, bit 0 = Sunday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);
    /// Monday to Friday
    pub const WEEKDAYS: WeekdaySet = WeekdaySet(0b0011_1110);
    /// Sunday to Thursday
    pub const SUN_TO_THU: WeekdaySet = WeekdaySet(0b0001_1111);
    pub const FRIDAY: WeekdaySet = WeekdaySet(0b0010_0000);
    pub const ALL: WeekdaySet = WeekdaySet(0b0111_1111);

    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in days {
            set.insert(*day);
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 & Self::ALL.0 == 0
    }

    pub fn len(&self) -> usize {
        (self.0 & Self::ALL.0).count_ones() as usize
    }

    /// Days in the set, Sunday first
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (0..7).map(weekday_from_sunday).filter(move |day| self.contains(*day))
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }
}

impl From<Vec<Weekday>> for WeekdaySet {
    fn from(days: Vec<Weekday>) -> Self {
        WeekdaySet::from_days(&days)
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

/// Wall-clock instant already resolved to the exchange timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LocalDateTime {
    weekday: Weekday,
    hour: u32,
    minute: u32,
    second: u32,
}

impl LocalDateTime {
    pub fn new(weekday: Weekday, hour: u32, minute: u32, second: u32) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(ClockError::InvalidLocalTime(format!(
                "{:02}:{:02}:{:02} is not a valid time of day",
                hour, minute, second
            )));
        }

        Ok(LocalDateTime { weekday, hour, minute, second })
    }

    /// Decompose a zoned date-time; the zone is expected to be the exchange zone
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        LocalDateTime {
            weekday: dt.weekday(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second().min(59),
        }
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    /// `hour + minute / 60`, in [0, 24)
    pub fn decimal_time(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0
    }

    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn second_of_day(&self) -> u32 {
        self.minute_of_day() * SECONDS_PER_MINUTE + self.second
    }

    /// Move forward by `seconds`, wrapping at the end of the week
    pub fn advance(&self, seconds: u32) -> Self {
        let start = self.weekday.num_days_from_sunday() * SECONDS_PER_DAY + self.second_of_day();
        let total = ((start as u64 + seconds as u64) % SECONDS_PER_WEEK as u64) as u32;
        let second_of_day = total % SECONDS_PER_DAY;

        LocalDateTime {
            weekday: weekday_from_sunday(total / SECONDS_PER_DAY),
            hour: second_of_day / 3600,
            minute: (second_of_day / 60) % 60,
            second: second_of_day % 60,
        }
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            self.weekday, self.hour, self.minute, self.second
        )
    }
}

/// Open/closed state of one session at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub is_open: bool,
    pub seconds_until_transition: u32,
    pub label: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_exchange_timezone")]
    pub exchange_timezone: String,

    #[serde(default = "default_tick_interval_sec")]
    pub tick_interval_sec: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Exchange-wide closure; weekend Fri 17:00 - Sun 18:00 when absent
    #[serde(default)]
    pub closure: Option<ClosureConfig>,

    #[serde(default = "default_sessions")]
    pub sessions: Vec<SessionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureConfig {
    pub start_day: Weekday,
    pub start_hour: f64,
    pub end_day: Weekday,
    pub end_hour: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    pub start_hour: f64,
    pub end_hour: f64,
    pub valid_days: WeekdaySet,
    /// Falls back to the built-in override table for the session name when absent
    #[serde(default)]
    pub early_close: Option<Vec<EarlyCloseConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyCloseConfig {
    pub days: WeekdaySet,
    pub close_hour: f64,
}

fn default_exchange_timezone() -> String {
    "America/New_York".to_string()
}

fn default_tick_interval_sec() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sessions() -> Vec<SessionConfig> {
    crate::time::SessionDefinition::builtins()
        .iter()
        .map(SessionConfig::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            exchange_timezone: default_exchange_timezone(),
            tick_interval_sec: default_tick_interval_sec(),
            log_level: default_log_level(),
            closure: None,
            sessions: default_sessions(),
        }
    }
}
