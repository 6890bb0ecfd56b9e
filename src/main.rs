//! a11y-mux - Accessibility Event Multiplexer
//!
//! Fans one platform accessibility stream out to prioritized delegates,
//! named callbacks, key observers, and gesture listeners.

use a11y_mux::app::cli::{Cli, Commands, ConfigAction};
use a11y_mux::app::config::Config;
use a11y_mux::app::simulate;
use a11y_mux::event::EventKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Simulate {
            events,
            delegates,
            step_delay_ms,
        } => {
            run_simulate(events, delegates, step_delay_ms, &config)?;
        }
        Commands::Events => {
            run_events();
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn run_simulate(
    events: Option<usize>,
    delegates: Option<usize>,
    step_delay_ms: Option<u64>,
    config: &Config,
) -> anyhow::Result<()> {
    let mut sim = config.simulate.clone();
    if let Some(events) = events {
        sim.event_count = events;
    }
    if let Some(delegates) = delegates {
        sim.delegate_count = delegates;
    }
    if let Some(delay) = step_delay_ms {
        sim.step_delay_ms = delay;
    }

    info!(
        events = sim.event_count,
        delegates = sim.delegate_count,
        "starting simulation"
    );
    let report = simulate::run(&config.service, &sim)?;

    println!("Simulation complete:");
    println!("  accessibility events fed: {}", report.events_fed);
    println!("  delegate invocations:     {}", report.delegate_hits);
    println!("  events consumed:          {}", report.events_consumed);
    println!("  named callback hits:      {}", report.callback_hits);
    println!(
        "  key events fed/swallowed: {}/{}",
        report.keys_fed, report.keys_swallowed
    );
    println!("  gestures fed:             {}", report.gestures_fed);
    println!(
        "  shutdown:                 {}",
        if report.clean_shutdown { "clean" } else { "timed out" }
    );
    Ok(())
}

fn run_events() {
    println!("Known event kind names:");
    for kind in EventKind::all() {
        println!("  {:<28} 0x{:08X}", kind.name(), kind.code());
    }
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            println!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}
