use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const MIRROR_MATCH_SCORE: f64 = 0.7;
pub const UNKNOWN_MATCHUP_SCORE: f64 = 0.5;

const STANDARD_ARCHETYPES: [&str; 6] = ["Aggro", "Control", "Midrange", "Combo", "Tempo", "Ramp"];

// Row archetype's historical win rate against the column archetype.
const STANDARD_WIN_RATES: [[f64; 6]; 6] = [
    [0.50, 0.65, 0.55, 0.70, 0.45, 0.75],
    [0.35, 0.50, 0.60, 0.40, 0.55, 0.45],
    [0.45, 0.40, 0.50, 0.65, 0.60, 0.50],
    [0.30, 0.60, 0.35, 0.50, 0.40, 0.80],
    [0.55, 0.45, 0.40, 0.60, 0.50, 0.65],
    [0.25, 0.55, 0.50, 0.20, 0.35, 0.50],
];

/// Static matchup table keyed by `(archetype, opponent archetype)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeMatrix {
    win_rates: HashMap<String, HashMap<String, f64>>,
}

impl Default for ArchetypeMatrix {
    fn default() -> Self {
        let mut matrix = Self::empty();
        for (row, archetype) in STANDARD_ARCHETYPES.iter().enumerate() {
            for (col, opponent) in STANDARD_ARCHETYPES.iter().enumerate() {
                matrix.insert(archetype, opponent, STANDARD_WIN_RATES[row][col]);
            }
        }
        matrix
    }
}

impl ArchetypeMatrix {
    pub fn empty() -> Self {
        Self {
            win_rates: HashMap::new(),
        }
    }

    pub fn insert(&mut self, archetype: &str, opponent: &str, win_rate: f64) {
        self.win_rates
            .entry(archetype.to_string())
            .or_default()
            .insert(opponent.to_string(), win_rate.clamp(0.0, 1.0));
    }

    /// Win rate of `archetype` against `opponent`, falling back to the
    /// complement of the reverse entry.
    pub fn win_rate(&self, archetype: &str, opponent: &str) -> Option<f64> {
        self.lookup(archetype, opponent)
            .or_else(|| self.lookup(opponent, archetype).map(|rate| 1.0 - rate))
    }

    fn lookup(&self, archetype: &str, opponent: &str) -> Option<f64> {
        self.win_rates.get(archetype)?.get(opponent).copied()
    }

    /// 1 for a perfectly balanced matchup, near 0 for a lopsided one.
    pub fn matchup_score(&self, archetype: Option<&str>, opponent: Option<&str>) -> f64 {
        let (Some(archetype), Some(opponent)) = (archetype, opponent) else {
            return UNKNOWN_MATCHUP_SCORE;
        };
        if archetype == opponent {
            return MIRROR_MATCH_SCORE;
        }
        match self.win_rate(archetype, opponent) {
            Some(rate) => (1.0 - 2.0 * (rate - 0.5).abs()).clamp(0.0, 1.0),
            None => UNKNOWN_MATCHUP_SCORE,
        }
    }
}
