//! Command relay: write commands to control channels and route replies back.

use super::state::RouterState;
use super::Shared;
use crate::channel::{ControlReply, ControlRequest, Operation};
use crate::dispatch::{PendingCall, Responder, RouteEffect};
use crate::error::RouterError;
use crate::route::RouteEntry;
use crate::types::{Arguments, ContextKey, PageId};
use tracing::{debug, warn};

/// A push waiting for a Ready context.
pub(crate) struct PushCommand {
    pub entry: RouteEntry,
    pub arguments: Option<Arguments>,
    pub responder: Responder,
}

impl Shared {
    /// Send `push` to `key` if the context is Ready, else hand it back.
    pub(crate) fn send_push(&self, key: ContextKey, push: PushCommand) -> Result<(), PushCommand> {
        let mut state = self.state.lock();
        if !state.contexts.get(&key).map_or(false, |h| h.is_ready()) {
            return Err(push);
        }
        let page_id = push.entry.page_id;
        self.send_locked(
            &mut state,
            key,
            Operation::Push,
            page_id,
            push.arguments,
            RouteEffect::Push(push.entry),
            push.responder,
        );
        Ok(())
    }

    /// Send a command and register its pending call. Failures go to `responder`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn send_locked(
        &self,
        state: &mut RouterState,
        key: ContextKey,
        operation: Operation,
        page_id: PageId,
        arguments: Option<Arguments>,
        effect: RouteEffect,
        responder: Responder,
    ) {
        debug_assert_eq!(operation.reply_shape(), responder.shape());
        let correlation_id = state.pending.next_correlation_id();
        let request = ControlRequest {
            operation,
            page_id,
            arguments,
            correlation_id,
        };

        let sent = match state.contexts.get(&key) {
            Some(handle) => handle.send(request),
            None => Err(RouterError::ContextGone(key)),
        };

        match sent {
            Ok(()) => {
                debug!(
                    operation = %operation,
                    page_id = page_id.as_u64(),
                    context = %key,
                    correlation_id = correlation_id.as_u64(),
                    "Dispatched command"
                );
                state.pending.insert(PendingCall::new(
                    correlation_id,
                    key,
                    operation,
                    page_id,
                    effect,
                    responder,
                ));
                state.stats.dispatched += 1;
                state.sync_pending_stat();
            }
            Err(err) => {
                warn!(
                    operation = %operation,
                    page_id = page_id.as_u64(),
                    context = %key,
                    error = %err,
                    "Failed to dispatch command"
                );
                self.discard_effect(&effect);
                state.stats.failed += 1;
                responder.fail(err);
            }
        }
    }

    /// Deliver a reply to its pending call, exactly once.
    pub(crate) fn handle_reply(&self, key: ContextKey, reply: ControlReply) {
        let mut state = self.state.lock();

        let Some(call) = state.pending.take(reply.correlation_id) else {
            debug!(
                context = %key,
                correlation_id = reply.correlation_id.as_u64(),
                "Dropping reply with no pending call"
            );
            state.stats.dropped_replies += 1;
            return;
        };

        if call.context != key {
            debug!(
                context = %key,
                expected_context = %call.context,
                correlation_id = reply.correlation_id.as_u64(),
                "Dropping reply from the wrong context"
            );
            state.pending.insert(call);
            state.stats.dropped_replies += 1;
            return;
        }

        let operation = call.operation;
        let page_id = call.page_id;
        let expected = call.expected_shape();
        let (effect, responder) = call.into_parts();
        let value = reply.result;

        if value.shape() != expected {
            warn!(
                operation = %operation,
                context = %key,
                expected = %expected,
                actual = %value.shape(),
                "Reply has the wrong shape"
            );
            self.discard_effect(&effect);
            state.stats.failed += 1;
            responder.complete(value);
        } else if effect.confirmed_by(value) {
            match self.apply_effect(&mut state, key, effect) {
                Ok(()) => {
                    state.stats.completed += 1;
                    responder.complete(value);
                }
                Err(err) => {
                    warn!(
                        operation = %operation,
                        page_id = page_id.as_u64(),
                        context = %key,
                        error = %err,
                        "Confirmed command could not be recorded"
                    );
                    state.stats.failed += 1;
                    responder.fail(err);
                }
            }
        } else {
            self.discard_effect(&effect);
            state.stats.completed += 1;
            responder.complete(value);
        }

        debug!(
            operation = %operation,
            page_id = page_id.as_u64(),
            context = %key,
            correlation_id = reply.correlation_id.as_u64(),
            "Reply delivered"
        );
        state.sync_pending_stat();
        let destroyed = self.maybe_teardown_locked(&mut state, key);
        drop(state);
        self.release_engine(destroyed);
    }

    /// Fail a pending call without a reply.
    pub(crate) fn fail_call(&self, state: &mut RouterState, call: PendingCall, err: RouterError) {
        debug!(
            operation = %call.operation,
            context = %call.context,
            correlation_id = call.correlation_id.as_u64(),
            error = %err,
            "Failing pending call"
        );
        self.discard_effect(&call.effect);
        state.stats.failed += 1;
        call.fail(err);
    }

    fn apply_effect(
        &self,
        state: &mut RouterState,
        key: ContextKey,
        effect: RouteEffect,
    ) -> Result<(), RouterError> {
        match effect {
            RouteEffect::Push(entry) => {
                state.routes.push(key, entry)?;
            }
            RouteEffect::Pop(page_id)
            | RouteEffect::MaybePop(page_id)
            | RouteEffect::Remove(page_id) => {
                if let Some(entry) = state.routes.remove(page_id) {
                    self.allocator.release(entry.page_id);
                }
            }
            RouteEffect::PopTo(page_id) => {
                for entry in state.routes.pop_to(page_id)? {
                    self.allocator.release(entry.page_id);
                }
            }
            RouteEffect::Replace(page_id, settings) => {
                if !state.routes.replace(page_id, settings) {
                    return Err(RouterError::NoSuchPage(page_id));
                }
            }
            RouteEffect::None => {}
        }
        Ok(())
    }

    /// A push that will never be recorded gives its page id back.
    fn discard_effect(&self, effect: &RouteEffect) {
        if let RouteEffect::Push(entry) = effect {
            self.allocator.release(entry.page_id);
        }
    }
}
