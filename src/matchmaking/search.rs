use std::time::Duration;

use log::{debug, info, warn};

use super::clock::{CancellationToken, Clock};
use super::quality::{MatchQuality, MatchQualityScorer, QualityContext};
use crate::config::settings::SearchSettings;
use crate::errors::{EngineError, EngineResult};
use crate::rating::{CompetitorId, CompetitorRating};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Searching { range: f64 },
    Matched { opponent: CompetitorId, quality: MatchQuality },
    TimedOut { elapsed: Duration, range: f64 },
    Cancelled,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Searching { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Matched {
        opponent: CompetitorId,
        quality: MatchQuality,
        elapsed: Duration,
    },
    Cancelled,
}

/// Open-queue opponent search for one competitor.
///
/// The acceptable mean gap starts at `initial_range` and widens by
/// `range_step` every `expansion_interval` up to `max_range`. Each poll picks
/// the best in-range candidate whose quality clears the threshold; once
/// `max_duration` has passed without one the search times out.
#[derive(Debug, Clone)]
pub struct OpponentSearch {
    seeker: CompetitorId,
    settings: SearchSettings,
    started_at: Duration,
    state: SearchState,
    polls: u32,
}

impl OpponentSearch {
    pub fn begin(seeker: &str, settings: SearchSettings, clock: &dyn Clock) -> Self {
        let range = settings.initial_range;
        Self {
            seeker: seeker.to_string(),
            settings,
            started_at: clock.elapsed(),
            state: SearchState::Searching { range },
            polls: 0,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn seeker(&self) -> &str {
        &self.seeker
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn elapsed(&self, clock: &dyn Clock) -> Duration {
        clock.elapsed().saturating_sub(self.started_at)
    }

    pub fn range_at(&self, elapsed: Duration) -> f64 {
        let interval = self.settings.expansion_interval().as_millis().max(1);
        let expansions = (elapsed.as_millis() / interval) as f64;
        (self.settings.initial_range + self.settings.range_step * expansions)
            .min(self.settings.max_range)
    }

    pub fn poll(
        &mut self,
        seeker: &CompetitorRating,
        pool: &[CompetitorRating],
        scorer: &MatchQualityScorer<'_>,
        clock: &dyn Clock,
        token: &CancellationToken,
    ) -> &SearchState {
        if self.state.is_terminal() {
            return &self.state;
        }
        self.polls += 1;

        if token.is_cancelled() {
            info!("Search for {} cancelled after {} polls", self.seeker, self.polls);
            self.state = SearchState::Cancelled;
            return &self.state;
        }

        let elapsed = self.elapsed(clock);
        let range = self.range_at(elapsed);
        debug!("Search poll {} for {}: range {:.0}", self.polls, self.seeker, range);

        self.state = match self.best_candidate(seeker, pool, scorer, range, clock) {
            Some((opponent, quality)) => {
                info!("  → {} matched with {} (quality {:.3})", self.seeker, opponent, quality.score);
                SearchState::Matched { opponent, quality }
            }
            None if elapsed >= self.settings.max_duration() => {
                warn!("Search for {} timed out after {:?}", self.seeker, elapsed);
                SearchState::TimedOut { elapsed, range }
            }
            None => SearchState::Searching { range },
        };
        &self.state
    }

    fn best_candidate(
        &self,
        seeker: &CompetitorRating,
        pool: &[CompetitorRating],
        scorer: &MatchQualityScorer<'_>,
        range: f64,
        clock: &dyn Clock,
    ) -> Option<(CompetitorId, MatchQuality)> {
        let context = QualityContext::at(clock.now());
        pool.iter()
            .filter(|candidate| candidate.id != self.seeker)
            .filter(|candidate| (candidate.mean() - seeker.mean()).abs() <= range)
            .map(|candidate| (candidate, scorer.score(seeker, candidate, &context)))
            .filter(|(_, quality)| quality.score >= self.settings.quality_threshold)
            .max_by(|(x, qx), (y, qy)| {
                qx.score
                    .total_cmp(&qy.score)
                    .then_with(|| y.id.cmp(&x.id))
            })
            .map(|(candidate, quality)| (candidate.id.clone(), quality))
    }

    pub fn into_outcome(self, clock: &dyn Clock) -> EngineResult<Option<SearchOutcome>> {
        let elapsed = self.elapsed(clock);
        match self.state {
            SearchState::Searching { .. } => Ok(None),
            SearchState::Matched { opponent, quality } => Ok(Some(SearchOutcome::Matched {
                opponent,
                quality,
                elapsed,
            })),
            SearchState::Cancelled => Ok(Some(SearchOutcome::Cancelled)),
            SearchState::TimedOut { elapsed, range } => Err(EngineError::MatchmakingTimeout {
                competitor_id: self.seeker,
                elapsed,
                final_range: range,
            }),
        }
    }
}

// Floor for the wait between polls so a zero interval still moves the clock.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polls `search` every `poll_interval` until it finishes, waiting on
/// `clock`. `snapshot` is called before each poll to read the current seeker
/// and queue.
pub async fn run_search<F>(
    mut search: OpponentSearch,
    mut snapshot: F,
    scorer: &MatchQualityScorer<'_>,
    clock: &dyn Clock,
    token: &CancellationToken,
) -> EngineResult<SearchOutcome>
where
    F: FnMut() -> EngineResult<(CompetitorRating, Vec<CompetitorRating>)>,
{
    let interval = search.settings.poll_interval().max(MIN_POLL_INTERVAL);
    loop {
        let (seeker, pool) = snapshot()?;
        if search.poll(&seeker, &pool, scorer, clock, token).is_terminal() {
            break;
        }
        clock.sleep(interval).await;
    }
    match search.into_outcome(clock)? {
        Some(outcome) => Ok(outcome),
        None => Ok(SearchOutcome::Cancelled),
    }
}
