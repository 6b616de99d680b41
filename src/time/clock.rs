/// Session table evaluation at a single instant
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{ClockError, Result};
use crate::time::calendar::MarketClosureWindow;
use crate::time::countdown;
use crate::time::session::{resolve, SessionDefinition};
use crate::types::{LocalDateTime, SessionStatus};

/// Status of one named session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub status: SessionStatus,
}

/// Evaluate one session against the weekend closure
pub fn evaluate_session(session: &SessionDefinition, now: LocalDateTime) -> SessionStatus {
    evaluate_with_closure(session, now, &MarketClosureWindow::weekend())
}

pub fn evaluate_with_closure(
    session: &SessionDefinition,
    now: LocalDateTime,
    closure: &MarketClosureWindow,
) -> SessionStatus {
    let is_open = resolve(session, &now, closure);
    countdown::calculate(session, is_open, &now, closure)
}

/// Fixed session table sharing one closure window
#[derive(Debug, Clone)]
pub struct SessionClock {
    sessions: Vec<SessionDefinition>,
    closure: MarketClosureWindow,
}

impl SessionClock {
    pub fn new(sessions: Vec<SessionDefinition>, closure: MarketClosureWindow) -> Result<Self> {
        if sessions.is_empty() {
            return Err(ClockError::ConfigError("no sessions configured".to_string()));
        }

        let mut names = HashSet::new();
        for session in &sessions {
            if !names.insert(session.name()) {
                return Err(ClockError::DuplicateSession(session.name().to_string()));
            }
            session.ensure_can_open(&closure)?;
        }

        Ok(SessionClock { sessions, closure })
    }

    /// The four built-in sessions under the weekend closure
    pub fn standard() -> Self {
        SessionClock {
            sessions: SessionDefinition::builtins(),
            closure: MarketClosureWindow::weekend(),
        }
    }

    pub fn sessions(&self) -> &[SessionDefinition] {
        &self.sessions
    }

    pub fn closure(&self) -> &MarketClosureWindow {
        &self.closure
    }

    pub fn session(&self, name: &str) -> Option<&SessionDefinition> {
        self.sessions.iter().find(|s| s.name() == name)
    }

    pub fn is_market_closed(&self, now: &LocalDateTime) -> bool {
        self.closure.contains(now.weekday(), now.minute_of_day())
    }

    pub fn evaluate_session(&self, session: &SessionDefinition, now: LocalDateTime) -> SessionStatus {
        evaluate_with_closure(session, now, &self.closure)
    }

    /// Status of every session, in table order
    pub fn evaluate(&self, now: LocalDateTime) -> Vec<SessionSnapshot> {
        self.sessions
            .iter()
            .map(|session| SessionSnapshot {
                name: session.name().to_string(),
                status: self.evaluate_session(session, now),
            })
            .collect()
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        SessionClock::standard()
    }
}
