pub mod bayesian;
pub mod competitor;
pub mod probability;
pub mod tiers;
pub mod types;
pub mod weighting;

pub use bayesian::{Belief, RatingUpdate, update, win_probability};
pub use competitor::CompetitorRating;
pub use tiers::{Classification, ConfidenceBand, Tier, Transition, classify, detect_transition};
pub use types::{
    ArchetypeRecord, CompetitorId, MatchRecord, MatchStage, Outcome, Playstyle,
    PlaystyleObservation, RatingValue, RecentResult,
};
pub use weighting::{DynamicWeight, WeightContext, calculate_dynamic_weight, calculate_weight};
