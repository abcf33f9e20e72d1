//! Page registry: page id to owning context.
//!
//! The registry is an index over the route stacks and can always be rebuilt
//! from them; the stacks are authoritative.

use crate::error::RouteError;
use crate::route::stack::RouteStack;
use crate::types::{ContextKey, PageId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PageRegistry {
    owners: HashMap<PageId, ContextKey>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from the authoritative stacks.
    pub fn rebuild<'a, I>(stacks: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (ContextKey, &'a RouteStack)>,
    {
        let mut registry = Self::new();
        for (key, stack) in stacks {
            for entry in stack.iter() {
                registry.register(entry.page_id, key)?;
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, page_id: PageId, context: ContextKey) -> Result<(), RouteError> {
        if self.owners.contains_key(&page_id) {
            return Err(RouteError::DuplicatePageId(page_id));
        }
        self.owners.insert(page_id, context);
        Ok(())
    }

    pub fn unregister(&mut self, page_id: PageId) -> Option<ContextKey> {
        self.owners.remove(&page_id)
    }

    pub fn owner_of(&self, page_id: PageId) -> Option<ContextKey> {
        self.owners.get(&page_id).copied()
    }

    pub fn contains(&self, page_id: PageId) -> bool {
        self.owners.contains_key(&page_id)
    }

    /// Resolve the context that holds `page_id`.
    ///
    /// For the sentinel this is the context whose front-most entry was pushed
    /// most recently across all stacks.
    pub fn last_route_holder<'a, I>(&self, page_id: PageId, stacks: I) -> Option<ContextKey>
    where
        I: IntoIterator<Item = (ContextKey, &'a RouteStack)>,
    {
        if !page_id.is_none() {
            return self.owner_of(page_id);
        }
        stacks
            .into_iter()
            .filter_map(|(key, stack)| stack.top().map(|top| (top.sequence, key)))
            .max_by_key(|(sequence, _)| *sequence)
            .map(|(_, key)| key)
    }

    /// Page ids owned by `context`.
    pub fn pages_of(&self, context: ContextKey) -> Vec<PageId> {
        let mut pages: Vec<PageId> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == context)
            .map(|(page, _)| *page)
            .collect();
        pages.sort();
        pages
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
