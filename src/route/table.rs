//! Route table: every context's stack plus the page registry, kept in lock-step.

use crate::error::RouteError;
use crate::route::registry::PageRegistry;
use crate::route::stack::{RouteEntry, RouteStack};
use crate::types::{Arguments, ContextKey, PageId};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct RouteTable {
    stacks: BTreeMap<ContextKey, RouteStack>,
    registry: PageRegistry,
    next_sequence: u64,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_context(&mut self, key: ContextKey) {
        self.stacks.entry(key).or_default();
    }

    /// Drop a context's stack, unregistering its pages.
    pub fn remove_context(&mut self, key: ContextKey) -> Vec<RouteEntry> {
        let entries = self
            .stacks
            .remove(&key)
            .map(|mut stack| stack.drain())
            .unwrap_or_default();
        for entry in &entries {
            self.registry.unregister(entry.page_id);
        }
        entries
    }

    pub fn has_context(&self, key: ContextKey) -> bool {
        self.stacks.contains_key(&key)
    }

    /// Append `entry` to `key`'s stack.
    ///
    /// The page id must be unique across all stacks. The entry is stamped with
    /// the next push sequence.
    pub fn push(&mut self, key: ContextKey, mut entry: RouteEntry) -> Result<(), RouteError> {
        if self.registry.contains(entry.page_id) {
            return Err(RouteError::DuplicatePageId(entry.page_id));
        }
        let stack = self
            .stacks
            .get_mut(&key)
            .ok_or(RouteError::UnknownContext(key))?;
        self.next_sequence += 1;
        entry.sequence = self.next_sequence;
        let page_id = entry.page_id;
        stack.push(entry)?;
        self.registry.register(page_id, key)?;
        Ok(())
    }

    /// Pop the front-most entry of `key`'s stack.
    pub fn pop(&mut self, key: ContextKey) -> Option<RouteEntry> {
        let entry = self.stacks.get_mut(&key)?.pop()?;
        self.registry.unregister(entry.page_id);
        Some(entry)
    }

    /// Remove every entry above `page_id` in its stack.
    pub fn pop_to(&mut self, page_id: PageId) -> Result<Vec<RouteEntry>, RouteError> {
        let key = self
            .registry
            .owner_of(page_id)
            .ok_or(RouteError::NotFound(page_id))?;
        let stack = self
            .stacks
            .get_mut(&key)
            .ok_or(RouteError::UnknownContext(key))?;
        let removed = stack.pop_to(page_id)?;
        for entry in &removed {
            self.registry.unregister(entry.page_id);
        }
        Ok(removed)
    }

    pub fn remove(&mut self, page_id: PageId) -> Option<RouteEntry> {
        let key = self.registry.owner_of(page_id)?;
        let entry = self.stacks.get_mut(&key)?.remove(page_id)?;
        self.registry.unregister(page_id);
        Some(entry)
    }

    pub fn replace(&mut self, page_id: PageId, settings: Arguments) -> bool {
        let Some(key) = self.registry.owner_of(page_id) else {
            return false;
        };
        self.stacks
            .get_mut(&key)
            .map_or(false, |stack| stack.replace(page_id, settings))
    }

    pub fn owner_of(&self, page_id: PageId) -> Option<ContextKey> {
        self.registry.owner_of(page_id)
    }

    /// See [`PageRegistry::last_route_holder`].
    pub fn last_route_holder(&self, page_id: PageId) -> Option<ContextKey> {
        self.registry
            .last_route_holder(page_id, self.stacks.iter().map(|(k, s)| (*k, s)))
    }

    /// Globally front-most entry and its context.
    pub fn front(&self) -> Option<(ContextKey, &RouteEntry)> {
        let key = self.last_route_holder(PageId::NONE)?;
        let top = self.stacks.get(&key)?.top()?;
        Some((key, top))
    }

    pub fn top(&self, key: ContextKey) -> Option<&RouteEntry> {
        self.stacks.get(&key)?.top()
    }

    pub fn stack(&self, key: ContextKey) -> Option<&RouteStack> {
        self.stacks.get(&key)
    }

    pub fn depth(&self, key: ContextKey) -> usize {
        self.stacks.get(&key).map_or(0, RouteStack::len)
    }

    pub fn get(&self, page_id: PageId) -> Option<&RouteEntry> {
        let key = self.registry.owner_of(page_id)?;
        self.stacks.get(&key)?.get(page_id)
    }

    pub fn contains(&self, page_id: PageId) -> bool {
        self.registry.contains(page_id)
    }

    pub fn page_count(&self) -> usize {
        self.registry.len()
    }

    /// Check that the registry matches the stacks exactly.
    pub fn is_consistent(&self) -> bool {
        match PageRegistry::rebuild(self.stacks.iter().map(|(k, s)| (*k, s))) {
            Ok(rebuilt) => {
                rebuilt.len() == self.registry.len()
                    && self.stacks.iter().all(|(key, stack)| {
                        stack
                            .iter()
                            .all(|e| self.registry.owner_of(e.page_id) == Some(*key))
                    })
            }
            Err(_) => false,
        }
    }
}
