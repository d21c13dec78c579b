use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::pairing::TournamentFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "arena-rating: skill ratings and tournament pairings")]
pub struct Cli {
    /// Snapshot directory holding ratings, season and archives
    #[arg(long, global = true, default_value = "data")]
    pub store: PathBuf,

    /// JSON file overriding engine defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Rate a file of match outcome events (JSON array or one event per line)
    Process {
        #[arg(short, long)]
        events: PathBuf,
    },
    /// Show the ladder ranked by conservative estimate
    Standings {
        /// Only show the top N
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Score a potential match between two rated competitors
    Quality { a: String, b: String },
    /// Close the current season: archive, reward and soft-reset every rating
    Rollover {
        /// Roll over even if the season has not ended yet
        #[arg(long)]
        force: bool,
    },
    /// Charge inactivity decay
    Decay,
    /// Play a seeded demo tournament and print the results
    Simulate {
        #[arg(long, default_value_t = 8)]
        players: usize,
        #[arg(long, default_value_t = 3)]
        rounds: u32,
        /// swiss, single-elimination, double-elimination or round-robin
        #[arg(long, default_value = "swiss")]
        format: TournamentFormat,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_and_simulate_defaults() {
        let cli = Cli::parse_from(["arena_rating", "simulate", "--format", "round-robin", "--store", "/tmp/x"]);
        assert_eq!(cli.store, PathBuf::from("/tmp/x"));
        assert_eq!(
            cli.command,
            Command::Simulate {
                players: 8,
                rounds: 3,
                format: TournamentFormat::RoundRobin,
                seed: 42,
            }
        );
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["arena_rating", "simulate", "--format", "ladder"]).is_err());
    }
}
