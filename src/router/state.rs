//! Coordinator state guarded by the router lock.

use crate::channel::Operation;
use crate::dispatch::{PendingTable, RouteEffect};
use crate::engine::ContextHandle;
use crate::error::RouterError;
use crate::route::RouteTable;
use crate::stats::DispatchStats;
use crate::types::{Arguments, ContextKey, PageId};
use std::collections::{BTreeMap, HashMap};
use tokio::task::JoinHandle;

#[derive(Default)]
pub(crate) struct RouterState {
    pub contexts: BTreeMap<ContextKey, ContextHandle>,
    /// Entry point (after single-context folding) to its live context
    pub entry_points: HashMap<String, ContextKey>,
    pub routes: RouteTable,
    pub pending: PendingTable,
    /// Inbound pump task per context
    pub pumps: HashMap<ContextKey, JoinHandle<()>>,
    pub stats: DispatchStats,
    next_context: u64,
}

impl RouterState {
    pub fn next_context_key(&mut self) -> ContextKey {
        self.next_context += 1;
        ContextKey::from_raw(self.next_context)
    }

    pub fn ready_context(&self, entry_point: &str) -> Option<ContextKey> {
        let key = self.entry_points.get(entry_point)?;
        self.contexts
            .get(key)
            .filter(|handle| handle.is_ready())
            .map(ContextHandle::key)
    }

    /// Find the context and concrete page a command targets.
    ///
    /// The sentinel resolves to the globally front-most page, except for
    /// operations that must name a page.
    pub fn resolve_target(
        &self,
        operation: Operation,
        page_id: PageId,
    ) -> Result<(ContextKey, PageId), RouterError> {
        if page_id.is_none() {
            if operation.requires_concrete_page() {
                return Err(RouterError::InvalidPageId);
            }
            return self
                .routes
                .front()
                .map(|(key, entry)| (key, entry.page_id))
                .ok_or(RouterError::NoSuchPage(PageId::NONE));
        }
        self.routes
            .owner_of(page_id)
            .map(|key| (key, page_id))
            .ok_or(RouterError::NoSuchPage(page_id))
    }

    pub fn sync_pending_stat(&mut self) {
        self.stats.pending = self.pending.len();
    }
}

/// Bookkeeping a non-push command applies once confirmed.
pub(crate) fn effect_for(
    operation: Operation,
    page_id: PageId,
    arguments: Option<&Arguments>,
) -> RouteEffect {
    match operation {
        Operation::Pop => RouteEffect::Pop(page_id),
        Operation::PopTo => RouteEffect::PopTo(page_id),
        Operation::Remove => RouteEffect::Remove(page_id),
        Operation::Replace => RouteEffect::Replace(page_id, arguments.cloned().unwrap_or_default()),
        Operation::MaybePop => RouteEffect::MaybePop(page_id),
        Operation::Push | Operation::Notify | Operation::CanPop => RouteEffect::None,
    }
}
