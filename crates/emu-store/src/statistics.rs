//! Process-lifetime cache of per-cluster summary statistics.
//!
//! The cache is populated once from a bulk query. Global extrema per property
//! are computed lazily by a full scan and memoized; the memo slots are cleared
//! only when a load actually inserts rows.

use emu_core::models::{ClusterId, ClusterStat, Property, RawRecord};
use emu_core::parser::RecordParser;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global minimum and maximum of one property across all clusters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Extrema {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Result of a `load_once` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows were parsed and inserted
    Loaded { inserted: usize, skipped: usize },

    /// The cache already held entries; nothing was parsed
    AlreadyLoaded,
}

#[derive(Debug, Default)]
struct StatsState {
    entries: HashMap<ClusterId, ClusterStat>,
    extrema: [Option<Extrema>; 6],
}

/// Cluster-id to [`ClusterStat`] cache with memoized global extrema
#[derive(Debug, Default)]
pub struct StatisticsCache {
    state: RwLock<StatsState>,
    scans: AtomicUsize,
}

impl StatisticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StatsState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StatsState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse bulk rows and insert them by cluster id.
    ///
    /// A no-op when the cache already holds at least one entry. Malformed rows
    /// are skipped. When rows are inserted, every memoized extremum is cleared.
    pub fn load_once(&self, parser: &RecordParser, rows: &[RawRecord]) -> LoadOutcome {
        let mut state = self.write();
        if !state.entries.is_empty() {
            tracing::debug!("Statistics already loaded, skipping reload");
            return LoadOutcome::AlreadyLoaded;
        }

        let batch = parser.parse_cluster_stats(rows);
        let skipped = batch.skipped;
        let mut inserted = 0;
        for stat in batch.items {
            if state.entries.insert(stat.id, stat).is_none() {
                inserted += 1;
            }
        }

        if inserted > 0 {
            state.extrema = [None; 6];
        }

        tracing::info!(inserted, skipped, "Loaded cluster statistics");
        LoadOutcome::Loaded { inserted, skipped }
    }

    pub fn is_loaded(&self) -> bool {
        !self.read().entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    pub fn stat_for(&self, id: ClusterId) -> Option<ClusterStat> {
        self.read().entries.get(&id).cloned()
    }

    /// All cached stats ordered by cluster id
    pub fn all(&self) -> Vec<ClusterStat> {
        let mut stats: Vec<ClusterStat> = self.read().entries.values().cloned().collect();
        stats.sort_by_key(|s| s.id);
        stats
    }

    /// Largest `max` of a property across all clusters
    pub fn global_max(&self, property: Property) -> Option<f64> {
        self.extrema(property).max
    }

    /// Smallest `min` of a property across all clusters
    pub fn global_min(&self, property: Property) -> Option<f64> {
        self.extrema(property).min
    }

    /// Memoized extrema of one property.
    ///
    /// An empty cache is never memoized, so a later load is still observed.
    pub fn extrema(&self, property: Property) -> Extrema {
        let slot = property.index();
        {
            let state = self.read();
            if let Some(extrema) = state.extrema[slot] {
                return extrema;
            }
            if state.entries.is_empty() {
                return Extrema::default();
            }
        }

        let mut state = self.write();
        if let Some(extrema) = state.extrema[slot] {
            return extrema;
        }
        let extrema = self.scan(&state.entries, property);
        state.extrema[slot] = Some(extrema);
        extrema
    }

    /// Number of full scans performed so far
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    fn scan(&self, entries: &HashMap<ClusterId, ClusterStat>, property: Property) -> Extrema {
        self.scans.fetch_add(1, Ordering::Relaxed);

        let mut extrema = Extrema::default();
        for stat in entries.values() {
            let stats = stat.get(property);
            if let Some(min) = stats.min {
                extrema.min = Some(extrema.min.map_or(min, |m| m.min(min)));
            }
            if let Some(max) = stats.max {
                extrema.max = Some(extrema.max.map_or(max, |m| m.max(max)));
            }
        }

        tracing::debug!(%property, min = ?extrema.min, max = ?extrema.max, "Scanned statistics");
        extrema
    }
}
