//! Ordered route stack owned by one execution context.

use crate::error::RouteError;
use crate::types::{Arguments, PageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One navigable page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub page_id: PageId,
    pub entry_point: String,
    pub settings: Arguments,
    pub created_at: DateTime<Utc>,
    /// Router-wide push order; the highest live value is the global front.
    pub sequence: u64,
}

impl RouteEntry {
    pub fn new(page_id: PageId, entry_point: impl Into<String>, settings: Arguments) -> Self {
        Self {
            page_id,
            entry_point: entry_point.into(),
            settings,
            created_at: Utc::now(),
            sequence: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Route stack; the last element is front-most.
#[derive(Debug, Clone, Default)]
pub struct RouteStack {
    entries: Vec<RouteEntry>,
}

impl RouteStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RouteEntry) -> Result<(), RouteError> {
        if self.contains(entry.page_id) {
            return Err(RouteError::DuplicatePageId(entry.page_id));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<RouteEntry> {
        self.entries.pop()
    }

    /// Remove every entry above `page_id`, leaving it front-most.
    ///
    /// Returns the removed entries, front-most first.
    pub fn pop_to(&mut self, page_id: PageId) -> Result<Vec<RouteEntry>, RouteError> {
        let index = self
            .position(page_id)
            .ok_or(RouteError::NotFound(page_id))?;
        let mut removed = self.entries.split_off(index + 1);
        removed.reverse();
        Ok(removed)
    }

    pub fn remove(&mut self, page_id: PageId) -> Option<RouteEntry> {
        let index = self.position(page_id)?;
        Some(self.entries.remove(index))
    }

    /// Swap the settings of `page_id` in place.
    pub fn replace(&mut self, page_id: PageId, settings: Arguments) -> bool {
        match self.entries.iter_mut().find(|e| e.page_id == page_id) {
            Some(entry) => {
                entry.settings = settings;
                true
            }
            None => false,
        }
    }

    pub fn top(&self) -> Option<&RouteEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, page_id: PageId) -> bool {
        self.position(page_id).is_some()
    }

    pub fn position(&self, page_id: PageId) -> Option<usize> {
        self.entries.iter().position(|e| e.page_id == page_id)
    }

    pub fn get(&self, page_id: PageId) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.page_id == page_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// Drop all entries, returning them bottom first.
    pub fn drain(&mut self) -> Vec<RouteEntry> {
        std::mem::take(&mut self.entries)
    }
}
