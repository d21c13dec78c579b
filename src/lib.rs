pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod matchmaking;
pub mod output;
pub mod pairing;
pub mod rating;
pub mod season;
pub mod services;
pub mod store;
pub mod tournament;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use log::info;
use std::path::Path;

use crate::cli::Cli;
use crate::config::settings::EngineConfig;
use crate::pairing::TournamentFormat;
use crate::services::processing::ProcessingService;
use crate::services::simulation::{SimulationService, SimulationSettings};

pub fn interpret() -> Cli {
    Cli::parse()
}

fn open(config_path: Option<&Path>, store: &Path) -> Result<ProcessingService> {
    let config = EngineConfig::load(config_path)?;
    ProcessingService::open(config, store)
        .with_context(|| format!("Could not open snapshot store {}", store.display()))
}

pub fn handle_process(config_path: Option<&Path>, store: &Path, events: &Path) -> Result<()> {
    let mut service = open(config_path, store)?;
    let report = service.run(events)?;
    println!("{}", output::processing(&report));
    Ok(())
}

pub fn handle_standings(config_path: Option<&Path>, store: &Path, limit: Option<usize>) -> Result<()> {
    let service = open(config_path, store)?;
    let mut ladder = service.ranking().ladder();
    if let Some(limit) = limit {
        ladder.truncate(limit);
    }
    println!("{}", output::ladder(&ladder));
    Ok(())
}

pub fn handle_quality(config_path: Option<&Path>, store: &Path, a: &str, b: &str) -> Result<()> {
    let mut service = open(config_path, store)?;
    let quality = service.ranking_mut().get_match_quality(a, b, None)?;
    println!("{}", output::quality(a, b, &quality));
    Ok(())
}

pub fn handle_rollover(config_path: Option<&Path>, store: &Path, force: bool) -> Result<()> {
    let mut service = open(config_path, store)?;
    let now = Utc::now();
    let season = service.ranking().season();
    if !force && !season.is_over(now) {
        println!(
            "Season {} still has {} days left, use --force to close it now",
            season.number,
            season.days_remaining(now)
        );
        return Ok(());
    }
    let archive = service.roll_over(now)?;
    println!("{}", output::archive(&archive));
    Ok(())
}

pub fn handle_decay(config_path: Option<&Path>, store: &Path) -> Result<()> {
    let mut service = open(config_path, store)?;
    let reports = service.decay(Utc::now())?;
    info!("  → Decay charged to {} competitors", reports.len());
    println!("{}", output::decay(&reports));
    Ok(())
}

pub fn handle_simulate(
    config_path: Option<&Path>,
    players: usize,
    rounds: u32,
    format: TournamentFormat,
    seed: u64,
) -> Result<()> {
    let config = EngineConfig::load(config_path)?;
    let settings = SimulationSettings {
        players,
        rounds,
        format,
        seed,
    };
    let report = SimulationService::new(config, settings)?.run()?;
    println!("{}", output::simulation(&report));
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "arena_rating", &mut std::io::stdout());
    Ok(())
}
