//! In-memory workspace index
//!
//! Maps each file to its current [`FileIndexEntry`]. Entries are shared as
//! `Arc`s and replaced wholesale, so a reader holding an entry never sees it
//! change underneath it.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::entry::{FileId, FileIndexEntry, Stamp};

/// Current state of one file key
#[derive(Debug, Clone)]
enum Slot {
    Live(Arc<FileIndexEntry>),
    /// The file was forgotten at this stamp. Builds stamped earlier lose.
    Forgotten(Stamp),
}

impl Slot {
    fn stamp(&self) -> Stamp {
        match self {
            Slot::Live(entry) => entry.last_updated(),
            Slot::Forgotten(stamp) => *stamp,
        }
    }

    fn live(&self) -> Option<&Arc<FileIndexEntry>> {
        match self {
            Slot::Live(entry) => Some(entry),
            Slot::Forgotten(_) => None,
        }
    }
}

/// Result of publishing an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// First entry for this file
    Inserted,
    /// An older entry was replaced
    Replaced,
    /// Dropped: the slot already holds a newer entry or a newer forget
    Stale,
}

/// Workspace-wide index of file summaries
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    slots: DashMap<FileId, Slot>,
    clock: AtomicU64,
    /// Every tombstone written by `remove`, oldest first. A record may outlive
    /// its tombstone when the file is re-indexed; purging skips those.
    tombstones: Mutex<BTreeSet<(Stamp, FileId)>>,
}

impl WorkspaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a fresh stamp from the index clock
    pub fn next_stamp(&self) -> Stamp {
        Stamp::new(self.clock.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Latest stamp handed out so far
    pub fn current_stamp(&self) -> Stamp {
        Stamp::new(self.clock.load(Ordering::SeqCst))
    }

    /// Publish `entry` for `file`, last-write-wins by stamp
    pub fn put(&self, file: FileId, entry: Arc<FileIndexEntry>) -> PutOutcome {
        match self.slots.entry(file) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().stamp() >= entry.last_updated() {
                    return PutOutcome::Stale;
                }
                let was_live = occupied.get().live().is_some();
                occupied.insert(Slot::Live(entry));
                if was_live {
                    PutOutcome::Replaced
                } else {
                    PutOutcome::Inserted
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Live(entry));
                PutOutcome::Inserted
            }
        }
    }

    /// Current entry for `file`, if any
    pub fn get(&self, file: &FileId) -> Option<Arc<FileIndexEntry>> {
        self.slots
            .get(file)
            .and_then(|slot| slot.live().cloned())
    }

    pub fn contains(&self, file: &FileId) -> bool {
        self.get(file).is_some()
    }

    /// Forget `file`. Returns whether a live entry was removed.
    ///
    /// A tombstone stamped now stays behind so that builds started before
    /// this call cannot resurrect the file.
    pub fn remove(&self, file: &FileId) -> bool {
        let stamp = self.next_stamp();
        let was_live = match self.slots.entry(file.clone()) {
            Entry::Occupied(mut occupied) => {
                let was_live = occupied.get().live().is_some();
                occupied.insert(Slot::Forgotten(stamp));
                was_live
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Forgotten(stamp));
                false
            }
        };
        self.tombstones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((stamp, file.clone()));
        was_live
    }

    /// Every live entry.
    ///
    /// Each entry is observed atomically; entries updated while the scan runs
    /// may show up with either their old or new value.
    pub fn snapshot_all(&self) -> Vec<(FileId, Arc<FileIndexEntry>)> {
        self.slots
            .iter()
            .filter_map(|slot| {
                slot.value()
                    .live()
                    .map(|entry| (slot.key().clone(), Arc::clone(entry)))
            })
            .collect()
    }

    pub fn files(&self) -> Vec<FileId> {
        self.slots
            .iter()
            .filter(|slot| slot.value().live().is_some())
            .map(|slot| slot.key().clone())
            .collect()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().live().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop tombstones older than `stamp`. Returns how many were dropped.
    ///
    /// Only safe when no build stamped before `stamp` is still running.
    pub fn purge_tombstones_before(&self, stamp: Stamp) -> usize {
        let expired = {
            let mut tombstones = self.tombstones.lock().unwrap_or_else(PoisonError::into_inner);
            match tombstones.first() {
                Some((oldest, _)) if *oldest < stamp => {}
                _ => return 0,
            }
            let newer = tombstones.split_off(&(stamp, FileId::new("")));
            std::mem::replace(&mut *tombstones, newer)
        };

        expired
            .into_iter()
            .filter(|(at, file)| {
                self.slots
                    .remove_if(file, |_, slot| {
                        matches!(slot, Slot::Forgotten(current) if current == at)
                    })
                    .is_some()
            })
            .count()
    }

    /// Number of tombstone records waiting to be purged
    pub fn pending_tombstones(&self) -> usize {
        self.tombstones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forget every file
    pub fn clear(&self) {
        let files: Vec<FileId> = self.slots.iter().map(|slot| slot.key().clone()).collect();
        for file in files {
            self.remove(&file);
        }
    }
}
