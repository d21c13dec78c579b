pub mod processing;
pub mod ranking;
pub mod simulation;

pub use processing::{ProcessingReport, ProcessingService, load_events};
pub use ranking::RankingService;
pub use simulation::{SimulationReport, SimulationService, SimulationSettings};
