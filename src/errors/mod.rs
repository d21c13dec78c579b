use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::rating::CompetitorId;

/// Domain errors surfaced by the rating and pairing engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("tournament {tournament_id}: need at least 2 competitors, got {available}")]
    InsufficientCompetitors {
        tournament_id: String,
        round: Option<u32>,
        available: usize,
    },

    #[error("unknown competitor {competitor_id}{}", describe_scope(.tournament_id))]
    UnknownCompetitor {
        competitor_id: CompetitorId,
        tournament_id: Option<String>,
    },

    #[error("no opponent found for {competitor_id} after {elapsed:?} (range {final_range})")]
    MatchmakingTimeout {
        competitor_id: CompetitorId,
        elapsed: Duration,
        final_range: f64,
    },

    #[error("invalid format configuration: {reason}")]
    InvalidFormatConfiguration { reason: String },
}

fn describe_scope(tournament_id: &Option<String>) -> String {
    match tournament_id {
        Some(id) => format!(" in tournament {id}"),
        None => String::new(),
    }
}

impl EngineError {
    pub fn unknown(competitor_id: &str) -> Self {
        EngineError::UnknownCompetitor {
            competitor_id: competitor_id.to_string(),
            tournament_id: None,
        }
    }

    pub fn unknown_in(competitor_id: &str, tournament_id: &str) -> Self {
        EngineError::UnknownCompetitor {
            competitor_id: competitor_id.to_string(),
            tournament_id: Some(tournament_id.to_string()),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        EngineError::InvalidFormatConfiguration {
            reason: reason.into(),
        }
    }

    /// A timed-out search can succeed later once the queue changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::MatchmakingTimeout { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

pub fn read_context(path: &Path) -> String {
    format!("Failed to read {}", path.display())
}

pub fn write_context(path: &Path) -> String {
    format!("Failed to write {}", path.display())
}

pub fn parse_context(path: &Path, json: &str) -> String {
    format!(
        "Failed to parse JSON from {}. First 200 chars: {}",
        path.display(),
        json.chars().take(200).collect::<String>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_competitor_message_includes_tournament() {
        let err = EngineError::unknown_in("alice", "spring-open");
        assert_eq!(
            err.to_string(),
            "unknown competitor alice in tournament spring-open"
        );
        assert_eq!(EngineError::unknown("bob").to_string(), "unknown competitor bob");
    }

    #[test]
    fn test_only_timeouts_are_retryable() {
        let timeout = EngineError::MatchmakingTimeout {
            competitor_id: "a".into(),
            elapsed: Duration::from_secs(300),
            final_range: 500.0,
        };
        assert!(timeout.is_retryable());
        assert!(!EngineError::invalid_config("weights").is_retryable());
    }
}
