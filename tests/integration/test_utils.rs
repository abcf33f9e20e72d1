//! Shared test utilities for integration tests
//!
//! An in-memory [`EngineLauncher`] whose engines are either driven by hand from
//! the test (manual mode) or answer every command with a scripted reply (auto
//! mode), plus a host navigator that records `maybePop` calls.

use async_trait::async_trait;
use navrelay::channel::{BackButtonFlag, ControlRequest, InboundMessage, Operation};
use navrelay::engine::{ContextSpec, EngineLauncher, EngineLink};
use navrelay::types::{ContextKey, ReplyValue};
use navrelay::{HostNavigator, Router, RouterConfig, RouterError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Scripted engine behaviour: `None` leaves the command unanswered.
pub type Script = Arc<dyn Fn(&ControlRequest) -> Option<ReplyValue> + Send + Sync>;

/// Confirms every command; `maybePop` reports that it popped.
pub fn confirm_all() -> Script {
    Arc::new(|request: &ControlRequest| {
        Some(match request.operation {
            Operation::MaybePop => ReplyValue::Int(1),
            _ => ReplyValue::Bool(true),
        })
    })
}

/// Engine side of one context, driven by the test.
pub struct FakeEngine {
    pub spec: ContextSpec,
    requests: mpsc::UnboundedReceiver<ControlRequest>,
    replies: mpsc::UnboundedSender<InboundMessage>,
}

impl FakeEngine {
    /// Next command the router sent to this engine.
    pub async fn recv(&mut self) -> ControlRequest {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("timed out waiting for a command")
            .expect("control channel closed")
    }

    pub fn reply(&self, request: &ControlRequest, value: ReplyValue) {
        self.send(InboundMessage::reply(request.correlation_id, value));
    }

    pub fn send(&self, message: InboundMessage) {
        self.replies.send(message).expect("router inbound closed");
    }

    pub fn back_button(&self, flag: BackButtonFlag) {
        self.send(InboundMessage::BackButton { flag });
    }

    /// Close the engine's side, as a crashed or exited engine would.
    pub fn close(self) {
        drop(self.replies);
    }
}

#[derive(Default)]
pub struct FakeLauncher {
    script: Option<Script>,
    engines: Mutex<HashMap<ContextKey, FakeEngine>>,
    attached: Mutex<Vec<ContextSpec>>,
    detached: Mutex<Vec<ContextKey>>,
    failing: Mutex<HashSet<String>>,
    stalled: Mutex<HashSet<String>>,
    /// Every command seen by auto-reply engines
    log: Arc<Mutex<Vec<(ContextKey, ControlRequest)>>>,
}

impl FakeLauncher {
    /// Engines wait for the test to answer.
    pub fn manual() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engines answer every command through `script`.
    pub fn auto(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Some(script),
            ..Self::default()
        })
    }

    pub fn fail_entry_point(&self, entry_point: &str) {
        self.failing.lock().insert(entry_point.to_string());
    }

    /// Attach for `entry_point` never completes.
    pub fn stall_entry_point(&self, entry_point: &str) {
        self.stalled.lock().insert(entry_point.to_string());
    }

    /// Take the manual engine for `key`.
    pub fn take_engine(&self, key: ContextKey) -> FakeEngine {
        self.engines
            .lock()
            .remove(&key)
            .expect("no manual engine for context")
    }

    pub fn attached(&self) -> Vec<ContextSpec> {
        self.attached.lock().clone()
    }

    pub fn detached(&self) -> Vec<ContextKey> {
        self.detached.lock().clone()
    }

    pub fn log(&self) -> Vec<(ContextKey, ControlRequest)> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn attach(&self, spec: &ContextSpec) -> Result<EngineLink, RouterError> {
        if self.failing.lock().contains(&spec.entry_point) {
            return Err(RouterError::Launch(format!(
                "engine for {} refused to start",
                spec.entry_point
            )));
        }
        let stalled = self.stalled.lock().contains(&spec.entry_point);
        if stalled {
            std::future::pending::<()>().await;
        }
        self.attached.lock().push(spec.clone());

        let (link, requests, replies) = EngineLink::pair();
        match &self.script {
            Some(script) => {
                let script = Arc::clone(script);
                let log = Arc::clone(&self.log);
                let key = spec.key;
                let mut requests = requests;
                tokio::spawn(async move {
                    while let Some(request) = requests.recv().await {
                        log.lock().push((key, request.clone()));
                        if let Some(value) = script(&request) {
                            if replies
                                .send(InboundMessage::reply(request.correlation_id, value))
                                .is_err()
                            {
                                return;
                            }
                        }
                    }
                });
            }
            None => {
                self.engines.lock().insert(
                    spec.key,
                    FakeEngine {
                        spec: spec.clone(),
                        requests,
                        replies,
                    },
                );
            }
        }
        Ok(link)
    }

    fn detach(&self, key: ContextKey) {
        self.detached.lock().push(key);
    }
}

#[derive(Default)]
pub struct RecordingHost {
    maybe_pops: AtomicUsize,
}

impl RecordingHost {
    pub fn maybe_pops(&self) -> usize {
        self.maybe_pops.load(Ordering::SeqCst)
    }
}

impl HostNavigator for RecordingHost {
    fn maybe_pop(&self) {
        self.maybe_pops.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn router_with(
    config: RouterConfig,
    launcher: &Arc<FakeLauncher>,
) -> (Router, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    let router = Router::new(config, launcher.clone(), host.clone());
    (router, host)
}

pub fn router(launcher: &Arc<FakeLauncher>) -> (Router, Arc<RecordingHost>) {
    router_with(RouterConfig::default(), launcher)
}

/// Let spawned pump tasks run until `condition` holds.
pub async fn settle(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never held");
}
