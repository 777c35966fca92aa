//! Hot/cold chunk record cache with retention timers.
//!
//! Records live in the hot map while their chunk is active. Leaving every ring
//! starts a timer; once `retention_seconds` pass without the chunk coming back,
//! a sweep moves the record to cold storage or drops it. Cold records are
//! restored without rebuilding and are evicted oldest-first under capacity
//! pressure or when their own retention runs out.
use std::collections::HashMap;
use std::sync::Arc;

use crate::stream::chunk::ChunkId;
use crate::stream::config::StreamConfig;
use crate::stream::placement::ChunkRecord;

/// Lifecycle state of a chunk key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChunkState {
    Unbuilt,
    Queued,
    Hot,
    /// Hot, but outside every ring since the given time.
    Evicting {
        since: f64,
    },
    Cold,
}

struct HotEntry {
    record: Arc<ChunkRecord>,
    leaving_since: Option<f64>,
}

struct ColdEntry {
    record: Arc<ChunkRecord>,
    stored_at: f64,
    stamp: u64,
}

/// Chunks touched by one [`ChunkCache::sweep`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepReport {
    pub moved_to_cold: Vec<ChunkId>,
    pub discarded: Vec<ChunkId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.moved_to_cold.is_empty() && self.discarded.is_empty()
    }
}

pub struct ChunkCache {
    hot: HashMap<ChunkId, HotEntry>,
    cold: HashMap<ChunkId, ColdEntry>,
    retention_seconds: f64,
    cold_retention_seconds: Option<f64>,
    cold_capacity: usize,
    next_stamp: u64,
}

impl ChunkCache {
    pub fn new(
        retention_seconds: f64,
        cold_retention_seconds: Option<f64>,
        cold_capacity: usize,
    ) -> Self {
        Self {
            hot: HashMap::new(),
            cold: HashMap::new(),
            retention_seconds: retention_seconds.max(0.0),
            cold_retention_seconds,
            cold_capacity,
            next_stamp: 0,
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(
            config.retention_seconds,
            config.cold_retention_seconds,
            config.cold_capacity,
        )
    }

    /// Updates retention settings; takes effect on the next sweep.
    pub fn set_policy(
        &mut self,
        retention_seconds: f64,
        cold_retention_seconds: Option<f64>,
        cold_capacity: usize,
    ) {
        self.retention_seconds = retention_seconds.max(0.0);
        self.cold_retention_seconds = cold_retention_seconds;
        self.cold_capacity = cold_capacity;
    }

    fn cold_enabled(&self) -> bool {
        self.cold_capacity > 0 && self.cold_retention_seconds != Some(0.0)
    }

    pub fn hot(&self, id: ChunkId) -> Option<&Arc<ChunkRecord>> {
        self.hot.get(&id).map(|e| &e.record)
    }

    pub fn cold(&self, id: ChunkId) -> Option<&Arc<ChunkRecord>> {
        self.cold.get(&id).map(|e| &e.record)
    }

    pub fn contains_hot(&self, id: ChunkId) -> bool {
        self.hot.contains_key(&id)
    }

    pub fn contains_cold(&self, id: ChunkId) -> bool {
        self.cold.contains_key(&id)
    }

    pub fn hot_len(&self) -> usize {
        self.hot.len()
    }

    pub fn cold_len(&self) -> usize {
        self.cold.len()
    }

    pub fn hot_ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.hot.keys().copied()
    }

    /// State as seen by the cache; `Queued` and `Unbuilt` are indistinguishable here.
    pub fn state_of(&self, id: ChunkId) -> ChunkState {
        if let Some(entry) = self.hot.get(&id) {
            return match entry.leaving_since {
                Some(since) => ChunkState::Evicting { since },
                None => ChunkState::Hot,
            };
        }
        if self.cold.contains_key(&id) {
            return ChunkState::Cold;
        }
        ChunkState::Unbuilt
    }

    /// Stores a freshly built record as hot and active.
    pub fn insert_hot(&mut self, record: Arc<ChunkRecord>) {
        let id = record.id;
        self.cold.remove(&id);
        self.hot.insert(
            id,
            HotEntry {
                record,
                leaving_since: None,
            },
        );
    }

    /// Starts the eviction timer. Returns `false` if the chunk is not hot or
    /// the timer was already running.
    pub fn mark_leaving(&mut self, id: ChunkId, now: f64) -> bool {
        match self.hot.get_mut(&id) {
            Some(entry) if entry.leaving_since.is_none() => {
                entry.leaving_since = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Cancels a running eviction timer. Returns `true` if one was cancelled.
    pub fn keep(&mut self, id: ChunkId) -> bool {
        match self.hot.get_mut(&id) {
            Some(entry) => entry.leaving_since.take().is_some(),
            None => false,
        }
    }

    /// Moves a cold record back into the hot map without rebuilding it.
    pub fn restore_from_cold(&mut self, id: ChunkId) -> Option<Arc<ChunkRecord>> {
        let entry = self.cold.remove(&id)?;
        let record = entry.record.clone();
        self.hot.insert(
            id,
            HotEntry {
                record: entry.record,
                leaving_since: None,
            },
        );
        Some(record)
    }

    /// Applies retention timers at time `now`.
    pub fn sweep(&mut self, now: f64) -> SweepReport {
        let mut report = SweepReport::default();

        let mut expired: Vec<ChunkId> = self
            .hot
            .iter()
            .filter_map(|(id, e)| {
                let since = e.leaving_since?;
                (now - since >= self.retention_seconds).then_some(*id)
            })
            .collect();
        expired.sort_unstable();

        let cold_enabled = self.cold_enabled();
        for id in expired {
            let Some(entry) = self.hot.remove(&id) else {
                continue;
            };
            if cold_enabled {
                let stamp = self.next_stamp;
                self.next_stamp += 1;
                self.cold.insert(
                    id,
                    ColdEntry {
                        record: entry.record,
                        stored_at: now,
                        stamp,
                    },
                );
                report.moved_to_cold.push(id);
            } else {
                report.discarded.push(id);
            }
        }

        if let Some(limit) = self.cold_retention_seconds {
            let mut stale: Vec<ChunkId> = self
                .cold
                .iter()
                .filter(|(_, e)| now - e.stored_at >= limit)
                .map(|(id, _)| *id)
                .collect();
            stale.sort_unstable();
            for id in stale {
                self.cold.remove(&id);
                report.discarded.push(id);
            }
        }

        while self.cold.len() > self.cold_capacity {
            let Some(oldest) = self
                .cold
                .iter()
                .min_by_key(|(_, e)| e.stamp)
                .map(|(id, _)| *id)
            else {
                break;
            };
            self.cold.remove(&oldest);
            report.discarded.push(oldest);
        }

        report
    }

    pub fn clear(&mut self) {
        self.hot.clear();
        self.cold.clear();
    }
}
