/// Print a one-off snapshot of every session
///
/// Usage: show_sessions [--at "<weekday> HH:MM[:SS]"] [--json]
use session_clock::config::load_or_default;
use session_clock::utils::{parse_local_instant, to_exchange_local};

fn main() -> anyhow::Result<()> {
    let mut at = None;
    let mut json = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--at" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--at needs a value such as \"Wed 09:45\""))?;
                at = Some(parse_local_instant(&value)?);
            }
            other => anyhow::bail!("unknown argument: {}", other),
        }
    }

    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| "config.toml".to_string());
    let (config, _) = load_or_default(&config_path)?;
    let clock = config.build_clock()?;

    let now = match at {
        Some(now) => now,
        None => to_exchange_local(chrono::Utc::now(), config.timezone()?),
    };
    let snapshots = clock.evaluate(now);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    println!("🕒 Market Sessions - {} ({})", now, config.exchange_timezone);
    println!("=========================================\n");

    if clock.is_market_closed(&now) {
        println!("⛔ Market closed for the weekend\n");
    }

    for snapshot in &snapshots {
        let icon = if snapshot.status.is_open { "🟢" } else { "⚪" };
        println!("   {} {:<16} {}", icon, snapshot.name, snapshot.status.label);
    }

    let open = snapshots.iter().filter(|s| s.status.is_open).count();
    println!("\n📈 {} of {} sessions open", open, snapshots.len());

    Ok(())
}
