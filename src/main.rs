use anyhow::{anyhow, Context, Result};
use clap::Parser;
use daytrip::config::{load_config, validate_config};
use daytrip::{Itinerary, PlanReport, Planner};
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Command, ConfigArgs, PlanArgs, RootArgs};

fn main() -> Result<()> {
    init_logging();
    let args = RootArgs::parse();
    match args.command {
        Command::Plan(args) => cmd_plan(args),
        Command::Config(args) => cmd_config(args),
    }
}

/// Log to stderr so stdout stays machine-readable; `RUST_LOG` overrides.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn cmd_plan(args: PlanArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    validate_config(&config).context("validate config")?;
    let prompt = match args.prompt {
        Some(prompt) => prompt,
        None => read_prompt_from_stdin()?,
    };

    let planner = Planner::from_config(&config);
    let report = planner.plan_with_report(&prompt)?;

    if args.json {
        let text = if args.report {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string_pretty(&report.itinerary)
        };
        let text = text.context("serialize itinerary")?;
        println!("{text}");
        return Ok(());
    }

    print_itinerary(&report.itinerary);
    if args.report {
        print_report(&report);
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let text = serde_json::to_string_pretty(&config).context("serialize config")?;
    println!("{text}");
    Ok(())
}

fn read_prompt_from_stdin() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(anyhow!("no prompt given; pass one as an argument or pipe it on stdin"));
    }
    let mut prompt = String::new();
    stdin
        .lock()
        .read_to_string(&mut prompt)
        .context("read prompt from stdin")?;
    Ok(prompt)
}

fn print_itinerary(itinerary: &Itinerary) {
    println!("Day trip in {} (until {})", itinerary.city(), itinerary.end_time());
    println!();
    println!("Stops:");
    for (index, destination) in itinerary.destinations().iter().enumerate() {
        let weather = match destination.weather.describe() {
            Some(label) => format!("{} ({label})", destination.weather),
            None => destination.weather.to_string(),
        };
        let location = destination
            .coordinate
            .map(|at| format!("{:.5}, {:.5}", at.latitude, at.longitude))
            .unwrap_or_else(|| "not located".to_string());
        println!(
            "  {}. {} | {} | {} | weather {}",
            index + 1,
            destination.name,
            destination.address,
            location,
            weather
        );
    }
    if !itinerary.timeline().is_empty() {
        println!();
        println!("Timeline:");
        for entry in itinerary.timeline() {
            println!(
                "  -> {}: {} in transit, stay {}, weather {}",
                entry.destination, entry.transit_time, entry.dwell_time, entry.weather
            );
        }
    }
    println!();
    println!("Total distance: {} km", itinerary.total_distance_km());
}

fn print_report(report: &PlanReport) {
    println!();
    println!("Outcome: {}", report.outcome());
    for degradation in &report.degradations {
        println!("  {degradation}");
    }
}
