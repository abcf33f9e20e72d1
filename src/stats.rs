//! Dispatch statistics

/// Counters kept by the router
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands written to a control channel
    pub dispatched: usize,
    /// Calls fulfilled with a reply value
    pub completed: usize,
    /// Calls failed (resolution miss, send failure, context gone, bad reply)
    pub failed: usize,
    /// Replies with no matching pending call
    pub dropped_replies: usize,
    /// Calls currently waiting for a reply
    pub pending: usize,
    /// Contexts that reached Ready
    pub contexts_created: usize,
    /// Contexts that reached Destroyed
    pub contexts_destroyed: usize,
    /// Page ids currently issued
    pub live_pages: usize,
}
