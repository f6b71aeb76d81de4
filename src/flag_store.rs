//! A thread-safe in-memory storage for the currently active flag set. [`FlagStore`] provides
//! concurrent access for readers (flag evaluation) and writers (refresh, poller thread).
use std::sync::{Arc, PoisonError, RwLock};

use crate::flags::{FeatureFlag, FlagSet};

/// `FlagStore` provides a `Sync` storage for flag definitions.
///
/// The [`FlagSet`] itself is immutable and can only be replaced completely, so readers observe
/// either the complete old set or the complete new one.
#[derive(Debug, Default)]
pub struct FlagStore {
    flags: RwLock<Arc<FlagSet>>,
}

impl FlagStore {
    pub fn new(flags: FlagSet) -> Self {
        FlagStore {
            flags: RwLock::new(Arc::new(flags)),
        }
    }

    /// Get the currently active flag set.
    pub fn snapshot(&self) -> Arc<FlagSet> {
        // The lock only guards an Arc swap, so a poisoned lock still holds a complete set.
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        flags.clone()
    }

    /// Look up a single flag. `None` means the flag is unknown.
    pub fn get(&self, key: &str) -> Option<Arc<FeatureFlag>> {
        self.snapshot().get(key).cloned()
    }

    /// Replace the whole flag set, returning the previous one.
    pub fn replace_all(&self, flags: FlagSet) -> Arc<FlagSet> {
        // Constructing new value before requesting the lock to minimize lock span.
        let new_value = Arc::new(flags);

        let mut slot = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, new_value)
    }

    /// Drop all flags, returning the previous set.
    pub fn clear(&self) -> Arc<FlagSet> {
        self.replace_all(FlagSet::empty())
    }
}
