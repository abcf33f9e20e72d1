//! Command dispatch bookkeeping
//!
//! Every command sent to a context is tracked as a [`PendingCall`] keyed by a
//! fresh [`CorrelationId`]. The call is taken out of the table exactly once:
//! either by the matching reply or by the teardown of its context. Callers
//! hold the other end as a [`Completion`], which resolves to the typed value.

use crate::channel::Operation;
use crate::error::RouterError;
use crate::route::RouteEntry;
use crate::types::{Arguments, ContextKey, CorrelationId, FromReply, PageId, ReplyShape, ReplyValue};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

type Fulfil = Box<dyn FnOnce(Result<ReplyValue, RouterError>) + Send>;

/// Result handle for a dispatched command.
///
/// Resolves once, when the reply arrives or the target context goes away.
#[must_use = "a completion does nothing unless awaited or checked"]
pub struct Completion<T> {
    receiver: oneshot::Receiver<Result<T, RouterError>>,
}

impl<T: FromReply> Completion<T> {
    /// Build a completion and the type-erased sender that fulfils it.
    pub(crate) fn channel() -> (Responder, Self) {
        let (tx, receiver) = oneshot::channel::<Result<T, RouterError>>();
        let fulfil: Fulfil = Box::new(move |outcome| {
            let typed = outcome.and_then(|value| {
                T::from_reply(value).ok_or(RouterError::ReplyShapeMismatch {
                    expected: T::SHAPE,
                    actual: value.shape(),
                })
            });
            // Receiver may already be gone; the caller stopped listening.
            let _ = tx.send(typed);
        });
        (
            Responder {
                shape: T::SHAPE,
                fulfil,
            },
            Self { receiver },
        )
    }

    /// A completion that has already failed.
    pub fn failed(err: RouterError) -> Self {
        let (responder, completion) = Self::channel();
        responder.fail(err);
        completion
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T, RouterError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver.poll_unpin(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(RouterError::InvariantViolation(
                    "completion dropped without a result".to_string(),
                ))
            })
        })
    }
}

/// Sending side of a [`Completion`].
pub struct Responder {
    shape: ReplyShape,
    fulfil: Fulfil,
}

impl Responder {
    pub fn shape(&self) -> ReplyShape {
        self.shape
    }

    pub fn complete(self, value: ReplyValue) {
        (self.fulfil)(Ok(value));
    }

    pub fn fail(self, err: RouterError) {
        (self.fulfil)(Err(err));
    }
}

/// Route bookkeeping applied when a command is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteEffect {
    Push(RouteEntry),
    Pop(PageId),
    PopTo(PageId),
    Remove(PageId),
    Replace(PageId, Arguments),
    /// `maybePop` popped the front-most entry when the reply is 1.
    MaybePop(PageId),
    None,
}

impl RouteEffect {
    /// Whether `value` confirms that the context carried out the change.
    pub fn confirmed_by(&self, value: ReplyValue) -> bool {
        match self {
            RouteEffect::None => false,
            RouteEffect::MaybePop(_) => value == ReplyValue::Int(1),
            _ => value == ReplyValue::Bool(true),
        }
    }
}

/// An outstanding command.
pub struct PendingCall {
    pub correlation_id: CorrelationId,
    pub context: ContextKey,
    pub operation: Operation,
    pub page_id: PageId,
    pub effect: RouteEffect,
    responder: Responder,
}

impl PendingCall {
    pub fn new(
        correlation_id: CorrelationId,
        context: ContextKey,
        operation: Operation,
        page_id: PageId,
        effect: RouteEffect,
        responder: Responder,
    ) -> Self {
        Self {
            correlation_id,
            context,
            operation,
            page_id,
            effect,
            responder,
        }
    }

    pub fn expected_shape(&self) -> ReplyShape {
        self.responder.shape()
    }

    pub fn into_parts(self) -> (RouteEffect, Responder) {
        (self.effect, self.responder)
    }

    pub fn fail(self, err: RouterError) {
        self.responder.fail(err);
    }
}

/// Table of outstanding calls.
#[derive(Default)]
pub struct PendingTable {
    next_id: u64,
    calls: HashMap<CorrelationId, PendingCall>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_correlation_id(&mut self) -> CorrelationId {
        self.next_id += 1;
        CorrelationId::from_raw(self.next_id)
    }

    pub fn insert(&mut self, call: PendingCall) {
        self.calls.insert(call.correlation_id, call);
    }

    /// Remove the call for `id`, if it is still outstanding.
    pub fn take(&mut self, id: CorrelationId) -> Option<PendingCall> {
        self.calls.remove(&id)
    }

    pub fn count_for(&self, context: ContextKey) -> usize {
        self.calls.values().filter(|c| c.context == context).count()
    }

    /// Remove every call targeting `context`, oldest first.
    pub fn drain_for(&mut self, context: ContextKey) -> Vec<PendingCall> {
        let mut ids: Vec<CorrelationId> = self
            .calls
            .values()
            .filter(|c| c.context == context)
            .map(|c| c.correlation_id)
            .collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.calls.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Drop for PendingTable {
    fn drop(&mut self) {
        for (_, call) in self.calls.drain() {
            debug!(
                correlation_id = call.correlation_id.as_u64(),
                context = %call.context,
                "Failing pending call on router shutdown"
            );
            let context = call.context;
            call.fail(RouterError::ContextGone(context));
        }
    }
}
