//! Back-navigation resolver.
//!
//! Decides what a hardware back press does: nothing (disabled or debounced),
//! a host-level `maybePop`, or a `pop` inside the front-most context.

use crate::channel::BackButtonFlag;
use crate::config::BackConfig;
use crate::error::RouterError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Host-level navigation that lives outside the router.
pub trait HostNavigator: Send + Sync {
    /// Ask the host to pop its front-most container if the page allows it.
    fn maybe_pop(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Disabled,
    Debounced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackDecision {
    Ignore(IgnoreReason),
    /// Stack too shallow to pop within the context.
    DelegateToHost,
    /// Pop the front-most page inside its context.
    PopWithin,
}

pub struct BackNavigationResolver {
    debounce: Duration,
    pop_threshold: usize,
    disabled: AtomicBool,
    last_accepted: Mutex<Option<Instant>>,
}

impl BackNavigationResolver {
    pub fn new(config: &BackConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            pop_threshold: config.pop_threshold,
            disabled: AtomicBool::new(false),
            last_accepted: Mutex::new(None),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    pub fn apply_flag(&self, flag: BackButtonFlag) {
        info!(flag = ?flag, "Back button handling toggled");
        self.set_disabled(flag == BackButtonFlag::Disable);
    }

    /// Run the decision for one back press.
    ///
    /// `front_depth` is the route count of the front-most context, or `None`
    /// when no context holds a route.
    pub fn resolve(&self, front_depth: Option<usize>) -> Result<BackDecision, RouterError> {
        if self.is_disabled() {
            debug!("Back press ignored: disabled");
            return Ok(BackDecision::Ignore(IgnoreReason::Disabled));
        }

        {
            let now = Instant::now();
            let mut last = self.last_accepted.lock();
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.debounce {
                    debug!("Back press ignored: debounced");
                    return Ok(BackDecision::Ignore(IgnoreReason::Debounced));
                }
            }
            *last = Some(now);
        }

        let depth = front_depth.ok_or_else(|| {
            error!("Back press with no front-most context; host container is not associated");
            RouterError::InvariantViolation("no front-most context for back press".to_string())
        })?;

        if depth <= self.pop_threshold {
            Ok(BackDecision::DelegateToHost)
        } else {
            Ok(BackDecision::PopWithin)
        }
    }
}
