//! Label-keyed series storage shared by the metric kinds.

use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;

use super::desc::LabelValues;

/// Series of one metric, each behind its own lock.
///
/// Updates to an existing series only take the shard read lock plus the
/// series' mutex. A scrape holds each shard's read lock just long enough to
/// clone keys and `Arc`s, then copies one series at a time under its mutex,
/// so a writer waits at most for the copy of its own series.
#[derive(Debug)]
pub(crate) struct SeriesMap<T> {
    map: DashMap<LabelValues, Arc<Mutex<T>>>,
}

impl<T: Clone> SeriesMap<T> {
    pub(crate) fn new() -> Self {
        SeriesMap {
            map: DashMap::new(),
        }
    }

    /// Applies `update` to the series for `key`, creating it with `init` first.
    /// The whole update is one transition under the series' mutex.
    pub(crate) fn update(
        &self,
        key: LabelValues,
        init: impl FnOnce() -> T,
        update: impl FnOnce(&mut T),
    ) {
        // The shard guard must be released before `entry` takes the write lock.
        let existing = self.map.get(&key).map(|cell| Arc::clone(&cell));
        let cell = match existing {
            Some(cell) => cell,
            None => Arc::clone(
                &*self
                    .map
                    .entry(key)
                    .or_insert_with(|| Arc::new(Mutex::new(init()))),
            ),
        };
        update(&mut lock(&cell));
    }

    pub(crate) fn get(&self, key: &LabelValues) -> Option<T> {
        let cell = self.map.get(key).map(|cell| Arc::clone(&cell))?;
        let value = lock(&cell).clone();
        Some(value)
    }

    /// Copies out every series, sorted by label values.
    pub(crate) fn sorted(&self) -> Vec<(LabelValues, T)> {
        let cells: Vec<(LabelValues, Arc<Mutex<T>>)> = self
            .map
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut series: Vec<(LabelValues, T)> = cells
            .into_iter()
            .map(|(key, cell)| {
                let value = lock(&cell).clone();
                (key, value)
            })
            .collect();
        series.sort_by(|a, b| a.0.cmp(&b.0));
        series
    }
}

// Updates are plain arithmetic and cannot leave a series half written, so a
// poisoned lock still guards a consistent value.
fn lock<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
