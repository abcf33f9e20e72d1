//! Navigation Router
//!
//! The coordinator that ties page identity, route stacks, execution contexts
//! and the command relay together. All mutable state sits behind one lock;
//! commands are written to control channels without waiting, and each caller
//! gets a [`Completion`] that the matching reply (or the context's teardown)
//! fulfils later on the context's inbound pump task.
//!
//! Route stacks record only what contexts confirm: a push is appended when its
//! reply is `true`, a pop removes the page when its reply is `true`, and so
//! on. A non-main context whose stack drains with no calls outstanding is torn
//! down.

use crate::back::{BackDecision, BackNavigationResolver, HostNavigator, IgnoreReason};
use crate::channel::{InboundMessage, Operation};
use crate::config::RouterConfig;
use crate::dispatch::Completion;
use crate::engine::{ContextState, EngineLauncher};
use crate::error::RouterError;
use crate::identity::PageIdAllocator;
use crate::route::RouteEntry;
use crate::stats::DispatchStats;
use crate::types::{Arguments, ContextKey, FromReply, PageId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

mod lifecycle;
mod relay;
mod state;

use relay::PushCommand;
use state::{effect_for, RouterState};

/// Argument key naming the entry point of a pushed page.
pub const ENTRY_POINT_KEY: &str = "entrypoint";

const EVENT_CAPACITY: usize = 64;

/// Context lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEvent {
    pub key: ContextKey,
    pub entry_point: String,
    pub is_main: bool,
    pub state: ContextState,
}

/// Snapshot of a live context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub key: ContextKey,
    pub entry_point: String,
    pub is_main: bool,
    pub state: ContextState,
    pub depth: usize,
}

/// What a back press turned into.
#[derive(Debug)]
pub enum BackOutcome {
    Ignored(IgnoreReason),
    /// The host's `maybePop` was invoked.
    DelegatedToHost,
    /// A `pop` was sent for the front-most page.
    Popping {
        page_id: PageId,
        completion: Completion<bool>,
    },
}

pub(crate) struct Shared {
    config: RouterConfig,
    launcher: Arc<dyn EngineLauncher>,
    host: Arc<dyn HostNavigator>,
    allocator: PageIdAllocator,
    resolver: BackNavigationResolver,
    state: Mutex<RouterState>,
    /// Serializes context creation so an entry point gets one context
    creation: tokio::sync::Mutex<()>,
    events: broadcast::Sender<ContextEvent>,
}

/// Cloneable handle to the router.
#[derive(Clone)]
pub struct Router {
    shared: Arc<Shared>,
}

impl Router {
    pub fn new(
        config: RouterConfig,
        launcher: Arc<dyn EngineLauncher>,
        host: Arc<dyn HostNavigator>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let resolver = BackNavigationResolver::new(&config.back);
        info!(
            main_entry_point = %config.main_entry_point,
            multi_context = config.multi_context,
            "Router initialized"
        );
        Self {
            shared: Arc::new(Shared {
                config,
                launcher,
                host,
                allocator: PageIdAllocator::new(),
                resolver,
                state: Mutex::new(RouterState::default()),
                creation: tokio::sync::Mutex::new(()),
                events,
            }),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.shared.config
    }

    /// Subscribe to context lifecycle transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.shared.events.subscribe()
    }

    // -- context lifecycle ------------------------------------------------

    /// Ready context for `entry_point`, created on first use.
    pub async fn get_context(&self, entry_point: &str) -> Result<ContextKey, RouterError> {
        self.shared.get_context(entry_point).await
    }

    /// Whether `page_id` (or, for a page the router does not know, the
    /// context `entry_point` would get) belongs to the main context.
    pub fn is_main_context(&self, page_id: PageId, entry_point: &str) -> bool {
        if !self.shared.config.multi_context {
            return true;
        }
        let state = self.shared.state.lock();
        if let Some(handle) = state
            .routes
            .owner_of(page_id)
            .and_then(|key| state.contexts.get(&key))
        {
            return handle.is_main();
        }
        entry_point == self.shared.config.main_entry_point
    }

    /// Whether closing the host container of `page_id` should also destroy
    /// its context.
    pub fn should_destroy_context_with_host(
        &self,
        page_id: PageId,
        entry_point: &str,
    ) -> Result<bool, RouterError> {
        if page_id.is_none() {
            return Err(RouterError::InvalidPageId);
        }
        Ok(!self.is_main_context(page_id, entry_point))
    }

    /// Host-initiated teardown of a non-main context.
    pub fn teardown_context(&self, key: ContextKey) -> Result<(), RouterError> {
        let destroyed = {
            let mut state = self.shared.state.lock();
            let handle = state
                .contexts
                .get(&key)
                .ok_or(RouterError::ContextGone(key))?;
            if handle.is_main() {
                error!(context = %key, "Refusing to tear down the main context");
                return Err(RouterError::InvariantViolation(
                    "the main context cannot be torn down".to_string(),
                ));
            }
            self.shared.destroy_locked(&mut state, key, false)
        };
        self.shared.release_engine(destroyed);
        Ok(())
    }

    // -- host operations --------------------------------------------------

    /// Push a new page onto the context for `entry_point`.
    ///
    /// Returns the allocated page id; it is recorded once the context
    /// confirms the push.
    pub async fn push(
        &self,
        entry_point: &str,
        arguments: Option<Arguments>,
    ) -> (PageId, Completion<bool>) {
        let (responder, completion) = Completion::<bool>::channel();
        let reserved = match self.shared.allocator.reserve() {
            Ok(reserved) => reserved,
            Err(err) => {
                responder.fail(err);
                return (PageId::NONE, completion);
            }
        };
        let page_id = reserved.id();
        let entry = RouteEntry::new(page_id, entry_point, arguments.clone().unwrap_or_default());
        let mut push = PushCommand {
            entry,
            arguments,
            responder,
        };

        // A fresh context can be torn down between lookup and send; look again once.
        // Until the push is sent, dropping `reserved` (including on
        // cancellation) releases the page id.
        let mut last_key = None;
        for _ in 0..2 {
            let key = match self.shared.get_context(entry_point).await {
                Ok(key) => key,
                Err(err) => {
                    push.responder.fail(err);
                    return (page_id, completion);
                }
            };
            last_key = Some(key);
            push = match self.shared.send_push(key, push) {
                Ok(()) => {
                    reserved.keep();
                    return (page_id, completion);
                }
                Err(unsent) => unsent,
            };
            debug!(context = %key, "Context went away before push, retrying");
        }

        let err = match last_key {
            Some(key) => RouterError::ContextGone(key),
            None => RouterError::InvariantViolation("push without a context".to_string()),
        };
        push.responder.fail(err);
        (page_id, completion)
    }

    /// Push with the entry point taken from `arguments["entrypoint"]`,
    /// defaulting to the main entry point.
    pub async fn on_push(&self, arguments: Option<Arguments>) -> Completion<bool> {
        let entry_point = arguments
            .as_ref()
            .and_then(|args| args.get(ENTRY_POINT_KEY))
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.shared.config.main_entry_point.clone());
        let (_, completion) = self.push(&entry_point, arguments).await;
        completion
    }

    pub fn on_notify(&self, page_id: PageId, arguments: Option<Arguments>) -> Completion<bool> {
        self.dispatch(Operation::Notify, page_id, arguments)
    }

    pub fn on_maybe_pop(&self, page_id: PageId, arguments: Option<Arguments>) -> Completion<i64> {
        self.dispatch(Operation::MaybePop, page_id, arguments)
    }

    pub fn on_pop(&self, page_id: PageId, arguments: Option<Arguments>) -> Completion<bool> {
        self.dispatch(Operation::Pop, page_id, arguments)
    }

    pub fn on_pop_to(&self, page_id: PageId, arguments: Option<Arguments>) -> Completion<bool> {
        self.dispatch(Operation::PopTo, page_id, arguments)
    }

    pub fn on_remove(&self, page_id: PageId, arguments: Option<Arguments>) -> Completion<bool> {
        self.dispatch(Operation::Remove, page_id, arguments)
    }

    pub fn on_replace(&self, page_id: PageId, arguments: Option<Arguments>) -> Completion<bool> {
        self.dispatch(Operation::Replace, page_id, arguments)
    }

    pub fn on_can_pop(&self, page_id: PageId, arguments: Option<Arguments>) -> Completion<bool> {
        self.dispatch(Operation::CanPop, page_id, arguments)
    }

    /// Hardware back press.
    pub fn on_back_pressed(&self) -> Result<BackOutcome, RouterError> {
        let front = {
            let state = self.shared.state.lock();
            state
                .routes
                .front()
                .map(|(key, entry)| (entry.page_id, state.routes.depth(key)))
        };

        match self.shared.resolver.resolve(front.map(|(_, depth)| depth))? {
            BackDecision::Ignore(reason) => Ok(BackOutcome::Ignored(reason)),
            BackDecision::DelegateToHost => {
                info!("Back press delegated to host maybePop");
                self.shared.host.maybe_pop();
                Ok(BackOutcome::DelegatedToHost)
            }
            BackDecision::PopWithin => {
                let Some((page_id, _)) = front else {
                    return Err(RouterError::InvariantViolation(
                        "back press resolved without a front page".to_string(),
                    ));
                };
                info!(page_id = page_id.as_u64(), "Back press pops within context");
                Ok(BackOutcome::Popping {
                    page_id,
                    completion: self.dispatch(Operation::Pop, page_id, None),
                })
            }
        }
    }

    /// Feed a message from `key`'s control channel.
    ///
    /// Launchers normally deliver through the inbound half of the engine
    /// link; this entry point serves transports that call in directly.
    pub fn handle_inbound(&self, key: ContextKey, message: InboundMessage) {
        self.shared.handle_inbound(key, message);
    }

    /// Enable or disable back-press handling from the host side.
    pub fn set_back_disabled(&self, disabled: bool) {
        self.shared.resolver.set_disabled(disabled);
    }

    pub fn is_back_disabled(&self) -> bool {
        self.shared.resolver.is_disabled()
    }

    // -- queries ----------------------------------------------------------

    pub fn owner_of(&self, page_id: PageId) -> Option<ContextKey> {
        self.shared.state.lock().routes.owner_of(page_id)
    }

    /// Context holding `page_id`; the sentinel gives the front-most context.
    pub fn last_route_holder(&self, page_id: PageId) -> Option<ContextKey> {
        self.shared.state.lock().routes.last_route_holder(page_id)
    }

    pub fn front_page(&self) -> Option<PageId> {
        self.shared
            .state
            .lock()
            .routes
            .front()
            .map(|(_, entry)| entry.page_id)
    }

    pub fn routes_of(&self, key: ContextKey) -> Vec<RouteEntry> {
        self.shared
            .state
            .lock()
            .routes
            .stack(key)
            .map(|stack| stack.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn route(&self, page_id: PageId) -> Option<RouteEntry> {
        self.shared.state.lock().routes.get(page_id).cloned()
    }

    /// State of a live context; `None` once destroyed.
    pub fn context_state(&self, key: ContextKey) -> Option<ContextState> {
        self.shared
            .state
            .lock()
            .contexts
            .get(&key)
            .map(|handle| handle.state())
    }

    pub fn contexts(&self) -> Vec<ContextInfo> {
        let state = self.shared.state.lock();
        state
            .contexts
            .values()
            .map(|handle| ContextInfo {
                key: handle.key(),
                entry_point: handle.entry_point().to_string(),
                is_main: handle.is_main(),
                state: handle.state(),
                depth: state.routes.depth(handle.key()),
            })
            .collect()
    }

    pub fn pending_for(&self, key: ContextKey) -> usize {
        self.shared.state.lock().pending.count_for(key)
    }

    pub fn stats(&self) -> DispatchStats {
        let mut stats = self.shared.state.lock().stats.clone();
        stats.live_pages = self.shared.allocator.live_count();
        stats
    }

    fn dispatch<T: FromReply>(
        &self,
        operation: Operation,
        page_id: PageId,
        arguments: Option<Arguments>,
    ) -> Completion<T> {
        let (responder, completion) = Completion::<T>::channel();
        let mut state = self.shared.state.lock();
        match state.resolve_target(operation, page_id) {
            Ok((key, target)) => {
                let effect = effect_for(operation, target, arguments.as_ref());
                self.shared.send_locked(
                    &mut state, key, operation, target, arguments, effect, responder,
                );
            }
            Err(err) => {
                debug!(
                    operation = %operation,
                    page_id = page_id.as_u64(),
                    error = %err,
                    "Command target did not resolve"
                );
                state.stats.failed += 1;
                responder.fail(err);
            }
        }
        completion
    }
}
