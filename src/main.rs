use anyhow::Result;

use arena_rating::cli::{Cli, Command};
use arena_rating::{
    handle_completions, handle_decay, handle_process, handle_quality, handle_rollover, handle_simulate,
    handle_standings, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let cli = interpret();
    execute_command(&cli)
}

fn execute_command(cli: &Cli) -> Result<()> {
    let config = cli.config.as_deref();
    let store = cli.store.as_path();
    match &cli.command {
        Command::Process { events } => handle_process(config, store, events),
        Command::Standings { limit } => handle_standings(config, store, *limit),
        Command::Quality { a, b } => handle_quality(config, store, a, b),
        Command::Rollover { force } => handle_rollover(config, store, *force),
        Command::Decay => handle_decay(config, store),
        Command::Simulate {
            players,
            rounds,
            format,
            seed,
        } => handle_simulate(config, *players, *rounds, *format, *seed),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
