pub mod calendar;
pub mod session;
pub mod countdown;
pub mod clock;

pub use calendar::{classify, is_market_closed, is_valid_session_day, DayClassification, MarketClosureWindow};
pub use session::{is_open, resolve, EarlyClose, SessionDefinition};
pub use countdown::{format_countdown, seconds_until_close, seconds_until_open};
pub use clock::{evaluate_session, SessionClock, SessionSnapshot};
