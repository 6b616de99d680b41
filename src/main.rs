/// Main entry point for the session clock
use std::collections::HashMap;

use chrono_tz::Tz;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use session_clock::{
    config::{load_or_default, ConfigSource},
    error::Result,
    time::{SessionClock, SessionSnapshot},
    utils::to_exchange_local,
    Config, LocalDateTime,
};

/// Application state
pub struct ClockApp {
    config: Config,
    clock: SessionClock,
    timezone: Tz,
    last_open: HashMap<String, bool>,
}

impl ClockApp {
    pub fn new(config_path: &str) -> Result<Self> {
        let (config, source) = load_or_default(config_path)?;

        // Initialize logging
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("session_clock={},warn", config.log_level)));
        tracing_subscriber::fmt().with_env_filter(filter).init();

        match &source {
            ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
            ConfigSource::Defaults => warn!("{} not found - using built-in sessions", config_path),
        }

        let clock = config.build_clock()?;
        let timezone = config.timezone()?;
        info!(
            "Tracking {} sessions in {} (tick {}s)",
            clock.sessions().len(),
            timezone,
            config.tick_interval_sec
        );

        Ok(ClockApp {
            config,
            clock,
            timezone,
            last_open: HashMap::new(),
        })
    }

    /// Poll the clock until Ctrl+C
    pub async fn run(&mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(self.config.tick_interval_sec));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = to_exchange_local(chrono::Utc::now(), self.timezone);
                    self.tick(now);
                }
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Failed to listen for Ctrl+C: {}", e);
                    }
                    info!("Ctrl+C received - stopping session clock");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Evaluate, log transitions and redraw
    fn tick(&mut self, now: LocalDateTime) {
        let snapshots = self.clock.evaluate(now);

        for snapshot in &snapshots {
            let previous = self.last_open.insert(snapshot.name.clone(), snapshot.status.is_open);
            match previous {
                Some(was_open) if was_open != snapshot.status.is_open => {
                    let state = if snapshot.status.is_open { "opened" } else { "closed" };
                    info!("{} {} at {}", snapshot.name, state, now);
                }
                None => debug!("{} initial state open={}", snapshot.name, snapshot.status.is_open),
                _ => {}
            }
        }

        render(now, self.clock.is_market_closed(&now), &snapshots);
    }
}

fn render(now: LocalDateTime, market_closed: bool, snapshots: &[SessionSnapshot]) {
    let market = if market_closed { "CLOSED (weekend)" } else { "OPEN" };
    println!("\n🕒 {}  |  Market: {}", now, market);
    for snapshot in snapshots {
        let icon = if snapshot.status.is_open { "🟢" } else { "⚪" };
        println!("   {} {:<16} {}", icon, snapshot.name, snapshot.status.label);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| "config.toml".to_string());

    let mut app = ClockApp::new(&config_path)?;

    app.run().await?;

    Ok(())
}
