pub mod archetypes;
pub mod cache;
pub mod clock;
pub mod quality;
pub mod search;

pub use archetypes::ArchetypeMatrix;
pub use cache::{QualityCache, QualityKey};
pub use clock::{CancellationToken, Clock, SystemClock, VirtualClock};
pub use quality::{MatchPreferences, MatchQuality, MatchQualityScorer, QualityBreakdown, QualityContext};
pub use search::{OpponentSearch, SearchOutcome, SearchState, run_search};
