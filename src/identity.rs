//! Page identity allocation.
//!
//! Ids are drawn from a monotonic counter, so an id is never reissued even
//! after release. The live set tracks which ids are currently in circulation.

use crate::error::RouterError;
use crate::types::PageId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct PageIdAllocator {
    next: AtomicU64,
    live: Mutex<HashSet<PageId>>,
}

impl PageIdAllocator {
    pub fn new() -> Self {
        Self {
            // 0 is the sentinel
            next: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Issue a fresh page id.
    pub fn allocate(&self) -> Result<PageId, RouterError> {
        let raw = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map_err(|_| RouterError::InvariantViolation("page id space exhausted".to_string()))?;
        let id = PageId::from_raw(raw);
        self.live.lock().insert(id);
        Ok(id)
    }

    /// Issue a fresh page id that goes back on drop unless kept.
    pub fn reserve(&self) -> Result<ReservedPageId<'_>, RouterError> {
        Ok(ReservedPageId {
            allocator: self,
            id: self.allocate()?,
            kept: false,
        })
    }

    /// Take an id out of circulation. Returns whether it was live.
    pub fn release(&self, id: PageId) -> bool {
        self.live.lock().remove(&id)
    }

    pub fn is_live(&self, id: PageId) -> bool {
        self.live.lock().contains(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

/// A page id tied to the operation that allocated it.
#[must_use = "a reserved id is released when dropped"]
pub struct ReservedPageId<'a> {
    allocator: &'a PageIdAllocator,
    id: PageId,
    kept: bool,
}

impl ReservedPageId<'_> {
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Hand the id on; whoever records it now owns its release.
    pub fn keep(mut self) -> PageId {
        self.kept = true;
        self.id
    }
}

impl Drop for ReservedPageId<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.allocator.release(self.id);
        }
    }
}

impl Default for PageIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
