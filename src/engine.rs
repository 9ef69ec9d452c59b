use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::CacheEntry;
use crate::error::{LeaderboardError, LeaderboardResult};
use crate::leader::LeaderTracker;
use crate::models::{LeaderChange, Leaderboard, LeaderboardResponse, SheetBatch};
use crate::normalize::{normalize_sheet, task_from_row};
use crate::period::classify_tasks;
use crate::scoring::{aggregate_period, period_stats, rank_performers};
use crate::source::SheetSource;
use crate::trend::compute_trend;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub sheet_names: Vec<String>,
    pub primary_sheet: String,
    pub separator: String,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sheet_names: vec!["Master".to_string()],
            primary_sheet: "Master".to_string(),
            separator: " - ".to_string(),
            cache_ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Runs the whole pipeline over one fetched batch.
pub fn build_leaderboard(
    batch: &SheetBatch,
    primary_sheet: &str,
    separator: &str,
    now: NaiveDateTime,
) -> Leaderboard {
    let rows = match batch.get(primary_sheet) {
        Some(table) if table.len() > 1 => normalize_sheet(table),
        _ => {
            warn!(sheet = primary_sheet, "primary sheet missing or has no data rows");
            Vec::new()
        }
    };

    let buckets = classify_tasks(rows.iter().map(task_from_row), now);
    let current = aggregate_period(&buckets.current);
    let previous = aggregate_period(&buckets.previous);
    let performers = rank_performers(&buckets.current, now, separator);
    let stats = period_stats(&current, buckets.current.len(), &performers, now);

    Leaderboard {
        performers,
        stats,
        trend: compute_trend(&current, &previous),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Cached,
    Computed,
}

#[derive(Debug, Clone)]
pub struct LeaderboardRead {
    pub payload: Arc<Leaderboard>,
    pub freshness: Freshness,
    pub leader_change: Option<LeaderChange>,
}

impl LeaderboardRead {
    pub fn leader_changed(&self) -> bool {
        self.leader_change.is_some()
    }

    pub fn to_response(&self) -> LeaderboardResponse<'_> {
        LeaderboardResponse {
            performers: &self.payload.performers,
            stats: &self.payload.stats,
            trend: &self.payload.trend,
            leader_changed: self.leader_changed(),
        }
    }
}

type Outcome = LeaderboardResult<Arc<Leaderboard>>;

struct InFlight {
    id: u64,
    outcome: watch::Receiver<Option<Outcome>>,
}

#[derive(Default)]
struct EngineState {
    entry: Option<CacheEntry>,
    leader: LeaderTracker,
    in_flight: Option<InFlight>,
    // signal of computation `id`, handed to the first reader that claims it
    pending_signal: Option<(u64, LeaderChange)>,
    next_id: u64,
}

struct Inner {
    source: Arc<dyn SheetSource>,
    settings: EngineSettings,
    state: Mutex<EngineState>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn compute(&self, now: NaiveDateTime) -> LeaderboardResult<Leaderboard> {
        let settings = &self.settings;
        info!(ranges = ?settings.sheet_names, "fetching fresh sheet data");

        let fetch = self.source.fetch(&settings.sheet_names);
        let batch = match tokio::time::timeout(settings.fetch_timeout, fetch).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(LeaderboardError::SourceUnavailable {
                    reason: format!("fetch timed out after {:?}", settings.fetch_timeout),
                })
            }
        };

        if batch.values().all(Vec::is_empty) {
            return Err(LeaderboardError::SourceUnavailable {
                reason: "no rows in any requested range".to_string(),
            });
        }

        Ok(build_leaderboard(
            &batch,
            &settings.primary_sheet,
            &settings.separator,
            now,
        ))
    }

    async fn recompute(
        self: Arc<Self>,
        id: u64,
        now: NaiveDateTime,
        outcome_tx: watch::Sender<Option<Outcome>>,
    ) {
        let result = self.compute(now).await;

        let outcome = {
            let mut state = self.lock_state();
            if state.in_flight.as_ref().is_some_and(|flight| flight.id == id) {
                state.in_flight = None;
            }

            match result {
                Ok(board) => {
                    let change = state.leader.observe(&board.performers, now);
                    let entry = CacheEntry::new(board, now);
                    let payload = Arc::clone(&entry.payload);
                    state.entry = Some(entry);
                    state.pending_signal = change.map(|change| (id, change));
                    info!(
                        performers = payload.performers.len(),
                        leader = payload.leader().map(|p| p.id.as_str()),
                        "leaderboard recomputed"
                    );
                    Ok(payload)
                }
                Err(err) => {
                    warn!(error = %err, "leaderboard recomputation failed, keeping previous entry");
                    Err(err)
                }
            }
        };

        outcome_tx.send_replace(Some(outcome));
    }
}

/// Owns the cached leaderboard and the leader state. Clones share both.
#[derive(Clone)]
pub struct LeaderboardEngine {
    inner: Arc<Inner>,
}

impl LeaderboardEngine {
    pub fn new(source: Arc<dyn SheetSource>, settings: EngineSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                settings,
                state: Mutex::new(EngineState::default()),
            }),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    pub fn last_computed_at(&self) -> Option<NaiveDateTime> {
        self.inner
            .lock_state()
            .entry
            .as_ref()
            .map(|entry| entry.computed_at)
    }

    pub fn current_leader(&self) -> Option<String> {
        self.inner.lock_state().leader.current().map(str::to_string)
    }

    /// Forces the next read to recompute. A computation already in flight
    /// is joined rather than restarted.
    pub fn invalidate(&self) {
        self.inner.lock_state().entry = None;
        info!("leaderboard cache invalidated");
    }

    pub async fn refresh(&self, now: NaiveDateTime) -> LeaderboardResult<LeaderboardRead> {
        self.invalidate();
        self.get_leaderboard(now).await
    }

    /// Serves the cached payload while fresh. Otherwise joins or starts the
    /// single recomputation; it keeps running if this caller goes away.
    pub async fn get_leaderboard(&self, now: NaiveDateTime) -> LeaderboardResult<LeaderboardRead> {
        let (id, mut outcome_rx) = {
            let mut state = self.inner.lock_state();

            if let Some(entry) = state
                .entry
                .as_ref()
                .filter(|entry| entry.is_fresh(now, self.inner.settings.cache_ttl))
            {
                debug!(computed_at = %entry.computed_at, "serving leaderboard from cache");
                return Ok(LeaderboardRead {
                    payload: Arc::clone(&entry.payload),
                    freshness: Freshness::Cached,
                    leader_change: None,
                });
            }

            // a closed channel means the task died without reporting
            let joinable = state
                .in_flight
                .as_ref()
                .filter(|flight| flight.outcome.has_changed().is_ok())
                .map(|flight| (flight.id, flight.outcome.clone()));

            match joinable {
                Some((id, outcome_rx)) => {
                    debug!(computation = id, "joining in-flight recomputation");
                    (id, outcome_rx)
                }
                None => {
                    let id = state.next_id;
                    state.next_id += 1;
                    let (outcome_tx, outcome_rx) = watch::channel(None);
                    state.in_flight = Some(InFlight {
                        id,
                        outcome: outcome_rx.clone(),
                    });
                    tokio::spawn(Arc::clone(&self.inner).recompute(id, now, outcome_tx));
                    (id, outcome_rx)
                }
            }
        };

        let outcome = match outcome_rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        let payload = outcome.ok_or(LeaderboardError::Interrupted)??;

        let leader_change = {
            let mut state = self.inner.lock_state();
            match state.pending_signal.take() {
                Some((signal_id, change)) if signal_id == id => Some(change),
                other => {
                    state.pending_signal = other;
                    None
                }
            }
        };

        Ok(LeaderboardRead {
            payload,
            freshness: Freshness::Computed,
            leader_change,
        })
    }
}
