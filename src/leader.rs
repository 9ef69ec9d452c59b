use chrono::NaiveDateTime;
use tracing::info;
use uuid::Uuid;

use crate::models::{LeaderChange, RankedPerformer};

/// Remembers who held rank 0 after the last fresh computation.
#[derive(Debug, Default)]
pub struct LeaderTracker {
    previous: Option<String>,
}

impl LeaderTracker {
    pub fn current(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Compares the new top performer with the stored one, then stores it.
    /// Only fires when both exist and differ.
    pub fn observe(
        &mut self,
        performers: &[RankedPerformer],
        now: NaiveDateTime,
    ) -> Option<LeaderChange> {
        let next = performers.first().map(|p| p.id.clone());

        let change = match (self.previous.as_ref(), next.as_ref()) {
            (Some(previous), Some(current)) if previous != current => {
                info!(%previous, %current, "new leader detected");
                Some(LeaderChange {
                    id: Uuid::new_v4(),
                    previous: previous.clone(),
                    current: current.clone(),
                    detected_at: now,
                })
            }
            _ => None,
        };

        self.previous = next;
        change
    }
}
