pub mod achievements;
pub mod events;

pub use achievements::Achievement;
pub use events::{CompetitorResult, MatchMetrics, MatchOutcomeEvent, MatchResultSummary};
