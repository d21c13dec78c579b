pub mod settings;

pub use settings::{
    EngineConfig, PairingSettings, PlaystyleSettings, QualitySettings, QualityWeights,
    RatingSettings, SearchSettings, SeasonSettings, SeedingMethod, TierRange, TierSettings,
    TimeWeightingSettings, TraitPreference, UncertaintyPolicy, WeightSettings,
};
