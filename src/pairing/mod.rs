pub mod elimination;
pub mod round_robin;
pub mod scorer;
pub mod seeding;
pub mod swiss;

use std::fmt;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::settings::SeedingMethod;
use crate::errors::EngineError;
use crate::rating::CompetitorId;
use crate::tournament::TournamentContext;

pub use scorer::PairingScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    Swiss,
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &str {
        match self {
            TournamentFormat::Swiss => "swiss",
            TournamentFormat::SingleElimination => "single-elimination",
            TournamentFormat::DoubleElimination => "double-elimination",
            TournamentFormat::RoundRobin => "round-robin",
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "swiss" => Ok(TournamentFormat::Swiss),
            "single-elimination" | "single" => Ok(TournamentFormat::SingleElimination),
            "double-elimination" | "double" => Ok(TournamentFormat::DoubleElimination),
            "round-robin" | "roundrobin" => Ok(TournamentFormat::RoundRobin),
            other => Err(EngineError::invalid_config(format!(
                "unsupported tournament format '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bracket {
    #[default]
    Main,
    Winners,
    Losers,
    GrandFinal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PairingStatus {
    Pending,
    /// `winner` is `None` for a draw.
    Completed { winner: Option<CompetitorId> },
    Bye,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    pub player1: CompetitorId,
    /// `None` is a bye.
    pub player2: Option<CompetitorId>,
    pub round: u32,
    pub table: u32,
    pub quality: Option<f64>,
    pub status: PairingStatus,
    #[serde(default)]
    pub bracket: Bracket,
}

impl Pairing {
    pub fn matched(player1: &str, player2: &str, round: u32, quality: f64, bracket: Bracket) -> Self {
        Self {
            player1: player1.to_string(),
            player2: Some(player2.to_string()),
            round,
            table: 0,
            quality: Some(quality),
            status: PairingStatus::Pending,
            bracket,
        }
    }

    pub fn bye(player: &str, round: u32, bracket: Bracket) -> Self {
        Self {
            player1: player.to_string(),
            player2: None,
            round,
            table: 0,
            quality: None,
            status: PairingStatus::Bye,
            bracket,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn involves(&self, competitor: &str) -> bool {
        self.player1 == competitor || self.player2.as_deref() == Some(competitor)
    }

    pub fn competitors(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.player1.as_str()).chain(self.player2.as_deref())
    }

    /// Who advances from this pairing, if it is decided.
    pub fn winner(&self) -> Option<&str> {
        match &self.status {
            PairingStatus::Bye => Some(self.player1.as_str()),
            PairingStatus::Completed { winner } => winner.as_deref(),
            PairingStatus::Pending => None,
        }
    }

    /// The decided loser of a played pairing.
    pub fn loser(&self) -> Option<&str> {
        let winner = self.winner()?;
        let opponent = self.player2.as_deref()?;
        if winner == self.player1 {
            Some(opponent)
        } else {
            Some(self.player1.as_str())
        }
    }
}

/// One round's pairings plus anyone who could not be placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingOutcome {
    pub pairings: Vec<Pairing>,
    pub unpaired: Vec<CompetitorId>,
}

impl PairingOutcome {
    pub fn empty(unpaired: Vec<CompetitorId>) -> Self {
        Self {
            pairings: Vec::new(),
            unpaired,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unpaired.is_empty()
    }

    fn number_tables(&mut self) {
        for (index, pairing) in self.pairings.iter_mut().enumerate() {
            pairing.table = index as u32 + 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PairingOptions {
    pub avoid_rematches: Option<f64>,
    pub seeding: Option<SeedingMethod>,
    /// RNG seed for random seeding.
    pub seed: u64,
}

/// Pairs `round` for whatever format `context` runs.
pub fn generate(
    context: &TournamentContext,
    round: u32,
    available: &[CompetitorId],
    options: &PairingOptions,
    scorer: &mut PairingScorer<'_>,
) -> PairingOutcome {
    let available = dedup_preserving_order(available);
    if available.len() < 2 {
        warn!(
            "Tournament {} round {}: {} available, nothing to pair",
            context.id,
            round,
            available.len()
        );
        return PairingOutcome::empty(available);
    }

    let mut outcome = match context.format {
        TournamentFormat::Swiss => swiss::pair_round(context, round, &available, options, scorer),
        TournamentFormat::SingleElimination | TournamentFormat::DoubleElimination => {
            elimination::pair_round(context, round, &available, options, scorer)
        }
        TournamentFormat::RoundRobin => round_robin::pair_round(context, round, &available, scorer),
    };
    outcome.number_tables();

    info!(
        "Tournament {} round {} ({}): {} pairings",
        context.id,
        round,
        context.format,
        outcome.pairings.len()
    );
    if !outcome.is_complete() {
        warn!(
            "Tournament {} round {}: unpaired {:?}",
            context.id, round, outcome.unpaired
        );
    }
    outcome
}

fn dedup_preserving_order(ids: &[CompetitorId]) -> Vec<CompetitorId> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
