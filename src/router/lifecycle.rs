//! Context lifecycle: creation on demand, teardown, and the inbound pump.

use super::state::RouterState;
use super::{ContextEvent, Shared};
use crate::channel::InboundMessage;
use crate::engine::{ContextHandle, ContextSpec, ContextState};
use crate::error::RouterError;
use crate::types::ContextKey;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

impl Shared {
    /// Entry point a context is keyed by; single-context mode folds all of
    /// them onto the main entry point.
    pub(crate) fn context_entry_point<'a>(&'a self, entry_point: &'a str) -> &'a str {
        if self.config.multi_context {
            entry_point
        } else {
            &self.config.main_entry_point
        }
    }

    /// Return the Ready context for `entry_point`, creating it if needed.
    pub(crate) async fn get_context(
        self: &Arc<Self>,
        entry_point: &str,
    ) -> Result<ContextKey, RouterError> {
        let entry_point = self.context_entry_point(entry_point).to_string();
        let existing = self.state.lock().ready_context(&entry_point);
        if let Some(key) = existing {
            return Ok(key);
        }

        let _creation = self.creation.lock().await;
        let reservation = {
            let mut state = self.state.lock();
            if let Some(key) = state.ready_context(&entry_point) {
                return Ok(key);
            }
            let key = state.next_context_key();
            let is_main = entry_point == self.config.main_entry_point;
            state
                .contexts
                .insert(key, ContextHandle::new(key, entry_point.clone(), is_main));
            state.entry_points.insert(entry_point.clone(), key);
            CreationReservation::new(
                self,
                ContextSpec {
                    key,
                    entry_point: entry_point.clone(),
                    is_main,
                },
            )
        };
        let spec = reservation.spec().clone();
        self.emit(&spec, ContextState::Creating);
        info!(
            context = %spec.key,
            entry_point = %spec.entry_point,
            is_main = spec.is_main,
            "Creating context"
        );

        // Dropping this future during attach drops the reservation, which
        // withdraws the Creating handle.
        let link = match self.launcher.attach(&spec).await {
            Ok(link) => link,
            Err(err) => {
                warn!(
                    context = %spec.key,
                    entry_point = %spec.entry_point,
                    error = %err,
                    "Context launch failed"
                );
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        let attached = state
            .contexts
            .get_mut(&spec.key)
            .map_or(false, |handle| handle.attach(link.outbound));
        if !attached {
            drop(state);
            return Err(RouterError::ContextGone(spec.key));
        }
        reservation.confirm();
        state.routes.add_context(spec.key);
        state.stats.contexts_created += 1;
        let pump = Self::spawn_pump(Arc::downgrade(self), spec.key, link.inbound);
        state.pumps.insert(spec.key, pump);
        drop(state);

        self.emit(&spec, ContextState::Ready);
        info!(context = %spec.key, entry_point = %spec.entry_point, "Context ready");
        Ok(spec.key)
    }

    /// Remove a handle whose creation never completed.
    fn withdraw_creation(&self, spec: &ContextSpec) {
        let removed = {
            let mut state = self.state.lock();
            let creating = state
                .contexts
                .get(&spec.key)
                .map_or(false, |handle| handle.state() == ContextState::Creating);
            if creating {
                state.contexts.remove(&spec.key);
            }
            if state.entry_points.get(&spec.entry_point) == Some(&spec.key) {
                state.entry_points.remove(&spec.entry_point);
            }
            creating
        };
        if removed {
            debug!(context = %spec.key, entry_point = %spec.entry_point, "Context creation withdrawn");
            self.emit(spec, ContextState::Destroyed);
        }
    }

    /// Tear down a non-main context that has nothing left to do.
    ///
    /// Returns the key to hand to [`Shared::release_engine`] once the lock is
    /// released.
    #[must_use]
    pub(crate) fn maybe_teardown_locked(
        &self,
        state: &mut RouterState,
        key: ContextKey,
    ) -> Option<ContextKey> {
        let idle = match state.contexts.get(&key) {
            Some(handle) => {
                !handle.is_main()
                    && handle.is_ready()
                    && state.routes.depth(key) == 0
                    && state.pending.count_for(key) == 0
            }
            None => false,
        };
        if !idle {
            return None;
        }
        self.destroy_locked(state, key, false)
    }

    /// Destroying -> Destroyed: fail pending calls, drop routes and release
    /// the channel.
    ///
    /// `forced` is for engines that detached on their own and also applies to
    /// the main context. Returns the key when the context was destroyed; the
    /// caller passes it to [`Shared::release_engine`] after dropping the lock.
    #[must_use]
    pub(crate) fn destroy_locked(
        &self,
        state: &mut RouterState,
        key: ContextKey,
        forced: bool,
    ) -> Option<ContextKey> {
        let Some(handle) = state.contexts.get_mut(&key) else {
            return None;
        };
        let started = if forced {
            handle.state() != ContextState::Destroyed
        } else {
            handle.begin_teardown()
        };
        if !started {
            return None;
        }
        let spec = ContextSpec {
            key,
            entry_point: handle.entry_point().to_string(),
            is_main: handle.is_main(),
        };
        self.emit(&spec, ContextState::Destroying);
        info!(context = %key, entry_point = %spec.entry_point, forced, "Destroying context");

        for call in state.pending.drain_for(key) {
            self.fail_call(state, call, RouterError::ContextGone(key));
        }
        for entry in state.routes.remove_context(key) {
            self.allocator.release(entry.page_id);
        }

        if let Some(mut handle) = state.contexts.remove(&key) {
            if forced {
                handle.mark_detached();
            } else {
                handle.finish_teardown();
            }
        }
        if state.entry_points.get(&spec.entry_point) == Some(&key) {
            state.entry_points.remove(&spec.entry_point);
        }
        if let Some(pump) = state.pumps.remove(&key) {
            pump.abort();
        }
        state.stats.contexts_destroyed += 1;
        state.sync_pending_stat();

        self.emit(&spec, ContextState::Destroyed);
        info!(context = %key, "Context destroyed");
        Some(key)
    }

    /// Tell the launcher a destroyed context is gone. Call without the state
    /// lock; the launcher may call back into the router.
    pub(crate) fn release_engine(&self, destroyed: Option<ContextKey>) {
        if let Some(key) = destroyed {
            self.launcher.detach(key);
        }
    }

    pub(crate) fn handle_inbound(&self, key: ContextKey, message: InboundMessage) {
        match message {
            InboundMessage::Reply(reply) => self.handle_reply(key, reply),
            InboundMessage::BackButton { flag } => {
                debug!(context = %key, flag = ?flag, "Back button flag");
                self.resolver.apply_flag(flag);
            }
        }
    }

    /// The engine closed its side of the control channel.
    fn handle_detached(&self, key: ContextKey) {
        let destroyed = {
            let mut state = self.state.lock();
            let Some(handle) = state.contexts.get(&key) else {
                return;
            };
            if handle.is_main() {
                error!(context = %key, "Main context detached while the host is running");
            } else {
                warn!(context = %key, "Context detached");
            }
            self.destroy_locked(&mut state, key, true)
        };
        self.release_engine(destroyed);
    }

    fn spawn_pump(
        shared: Weak<Self>,
        key: ContextKey,
        mut inbound: mpsc::UnboundedReceiver<InboundMessage>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(message) = inbound.recv().await {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                shared.handle_inbound(key, message);
            }
            if let Some(shared) = shared.upgrade() {
                shared.handle_detached(key);
            }
        })
    }

    fn emit(&self, spec: &ContextSpec, state: ContextState) {
        // No subscribers is fine.
        let _ = self.events.send(ContextEvent {
            key: spec.key,
            entry_point: spec.entry_point.clone(),
            is_main: spec.is_main,
            state,
        });
    }
}

/// A Creating handle that is withdrawn on drop unless confirmed.
struct CreationReservation<'a> {
    shared: &'a Shared,
    spec: ContextSpec,
    confirmed: bool,
}

impl<'a> CreationReservation<'a> {
    fn new(shared: &'a Shared, spec: ContextSpec) -> Self {
        Self {
            shared,
            spec,
            confirmed: false,
        }
    }

    fn spec(&self) -> &ContextSpec {
        &self.spec
    }

    fn confirm(mut self) {
        self.confirmed = true;
    }
}

impl Drop for CreationReservation<'_> {
    fn drop(&mut self) {
        if !self.confirmed {
            self.shared.withdraw_creation(&self.spec);
        }
    }
}
