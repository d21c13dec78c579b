pub mod context;
pub mod records;
pub mod standings;

pub use context::{Round, TournamentContext};
pub use records::ScoreRecord;
pub use standings::{RankedCompetitor, StandingRow, compare_ratings, rank_ratings, score_table};
