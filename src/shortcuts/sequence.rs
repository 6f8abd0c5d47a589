//! Multi-key sequence capture.
//!
//! A `SequenceStateMachine` owns the pending keys of one capture scope
//! (page, modal, ...) and turns key events into commits and cancellations.
//! All transitions, including the timeout, run on the caller's thread in the
//! order events are fed in.
//!
//! ```text
//! Idle --key extends a pattern--> Accumulating --exact, nothing longer--> Committed -> Idle
//!                                      |  ^
//!                                      |  +-- key still viable / Backspace (re-arm)
//!                                      +-- Escape / no match / timeout --> Cancelled -> Idle
//! ```

use smallvec::SmallVec;
use tracing::debug;

use crate::config::{EnterPolicy, SequenceConfig, TimeoutPolicy};

use super::keymap::{Keymap, SharedKeymap};
use super::matcher::{evaluate, pending_display, CapturedValue, Captures, MatchSet};
use super::timer::{TimeoutClock, TimerToken};
use super::types::{normalize_key_event, KeyCombination, KeyEvent, Platform};

/// Why a sequence ended without dispatching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    Escape,
    NoMatch,
    Timeout,
    EnterWithoutMatch,
    Reset,
}

/// What caused a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitTrigger {
    /// Exact match with no longer pattern pending.
    Terminal,
    Enter,
    Timeout,
}

/// A dispatched action.
#[derive(Clone, Debug, PartialEq)]
pub struct Commit {
    pub action_id: String,
    pub pattern_id: String,
    pub params: Captures,
    pub trigger: CommitTrigger,
}

impl Commit {
    /// First captured placeholder value, if any.
    pub fn param(&self) -> Option<f64> {
        self.params.first().map(CapturedValue::as_f64)
    }
}

/// Result of feeding one event to the state machine.
#[derive(Clone, Debug, PartialEq)]
pub enum SequenceStep {
    /// Not part of any sequence; the host should handle the key normally.
    Ignored,
    /// Consumed without changing the pending keys.
    Waiting,
    /// Pending keys changed.
    Progress { display: String },
    Committed(Commit),
    Cancelled(CancelReason),
}

/// Snapshot of an in-flight sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingState {
    pub keys: Vec<KeyCombination>,
    pub deadline_ms: Option<u64>,
    /// Some pattern is still strictly longer than the pending keys.
    pub awaiting: bool,
}

/// Receives engine events. Presentation lives on the other side of this trait.
pub trait SequenceListener {
    fn on_commit(&mut self, commit: &Commit);

    fn on_progress(&mut self, _pending_display: &str) {}

    fn on_cancel(&mut self, _reason: CancelReason) {}

    /// The pending keys plus the rejected key matched nothing.
    fn on_no_match(&mut self, _attempted_display: &str) {}
}

/// Listener that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SequenceListener for NoopListener {
    fn on_commit(&mut self, _commit: &Commit) {}
}

pub struct SequenceStateMachine {
    keymap: SharedKeymap,
    config: SequenceConfig,
    platform: Platform,
    pending: Vec<KeyCombination>,
    clock: TimeoutClock,
    listener: Box<dyn SequenceListener>,
}

impl SequenceStateMachine {
    pub fn new(keymap: SharedKeymap, config: SequenceConfig) -> Self {
        Self {
            keymap,
            config,
            platform: Platform::current(),
            pending: Vec::new(),
            clock: TimeoutClock::new(),
            listener: Box::new(NoopListener),
        }
    }

    pub fn with_listener(mut self, listener: impl SequenceListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_keys(&self) -> &[KeyCombination] {
        &self.pending
    }

    pub fn pending_state(&self) -> Option<PendingState> {
        if self.pending.is_empty() {
            return None;
        }
        let keymap = self.keymap.load();
        let awaiting = evaluate(&keymap, &self.pending).has_continuation();
        Some(PendingState {
            keys: self.pending.clone(),
            deadline_ms: self.clock.deadline(),
            awaiting,
        })
    }

    /// Token and deadline of the armed timer, for hosts that schedule callbacks.
    pub fn armed_timer(&self) -> Option<(TimerToken, u64)> {
        if self.pending.is_empty() {
            return None;
        }
        self.clock.deadline().map(|d| (self.clock.token(), d))
    }

    /// Feed one key event.
    ///
    /// A key arriving after the deadline first runs the timeout transition,
    /// then is processed as if the machine were idle. Only the step for the
    /// key itself is returned; the timeout's commit or cancel reaches the
    /// listener. Hosts that act on return values call `poll_timeout(now)`
    /// before feeding the key.
    pub fn handle_key(&mut self, event: &KeyEvent) -> SequenceStep {
        let now = event.timestamp_ms;
        if !self.pending.is_empty() && self.clock.is_due(now) {
            self.fire_timeout();
        }

        let Some(combo) = normalize_key_event(event) else {
            return if self.pending.is_empty() {
                SequenceStep::Ignored
            } else {
                SequenceStep::Waiting
            };
        };

        let keymap = self.keymap.load();
        if self.pending.is_empty() {
            return self.start(&keymap, combo, now);
        }

        if combo.is_plain("escape") {
            return self.cancel(CancelReason::Escape);
        }

        let mut candidate = self.pending.clone();
        candidate.push(combo);
        let set = evaluate(&keymap, &candidate);

        // Backspace and Enter are control keys unless a pattern binds them here.
        if set.is_empty() {
            match candidate.last() {
                Some(k) if k.is_plain("backspace") => return self.backspace(now),
                Some(k) if k.is_plain("enter") => return self.enter(&keymap, now),
                _ => {}
            }
            let attempted = pending_display(&candidate, self.platform);
            debug!(attempted = %attempted, "Sequence has no match");
            self.listener.on_no_match(&attempted);
            return self.cancel(CancelReason::NoMatch);
        }

        if set.is_terminal() {
            return self.commit_best(&keymap, &set, CommitTrigger::Terminal);
        }

        self.pending = candidate;
        self.progress(now)
    }

    /// Run the timeout transition if the deadline has passed.
    pub fn poll_timeout(&mut self, now_ms: u64) -> Option<SequenceStep> {
        if self.pending.is_empty() || !self.clock.is_due(now_ms) {
            return None;
        }
        Some(self.fire_timeout())
    }

    /// Timer callback from the host. Stale tokens are ignored.
    pub fn on_timer(&mut self, token: TimerToken) -> Option<SequenceStep> {
        if self.pending.is_empty()
            || !self.clock.is_current(token)
            || self.clock.deadline().is_none()
        {
            return None;
        }
        Some(self.fire_timeout())
    }

    /// Drop any in-flight sequence.
    pub fn reset(&mut self) -> Option<SequenceStep> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.cancel(CancelReason::Reset))
    }

    fn start(&mut self, keymap: &Keymap, combo: KeyCombination, now: u64) -> SequenceStep {
        let keys = vec![combo];
        let set = evaluate(keymap, &keys);
        if set.is_empty() {
            return SequenceStep::Ignored;
        }
        if set.is_terminal() {
            return self.commit_best(keymap, &set, CommitTrigger::Terminal);
        }
        self.pending = keys;
        debug!(key = %self.pending[0].to_canonical_string(), "Sequence started");
        self.progress(now)
    }

    fn backspace(&mut self, now: u64) -> SequenceStep {
        // The first key stays; Escape is the way out of a sequence.
        if self.pending.len() > 1 {
            self.pending.pop();
        }
        self.progress(now)
    }

    fn enter(&mut self, keymap: &Keymap, now: u64) -> SequenceStep {
        let set = evaluate(keymap, &self.pending);
        if set.best_exact(keymap).is_some() {
            return self.commit_best(keymap, &set, CommitTrigger::Enter);
        }
        match self.config.enter_without_match {
            EnterPolicy::Ignore => {
                self.clock.arm(now, self.config.timeout_ms);
                SequenceStep::Waiting
            }
            EnterPolicy::Cancel => self.cancel(CancelReason::EnterWithoutMatch),
        }
    }

    fn fire_timeout(&mut self) -> SequenceStep {
        let keymap = self.keymap.load();
        match self.config.on_timeout {
            TimeoutPolicy::CommitExact => {
                let set = evaluate(&keymap, &self.pending);
                if set.best_exact(&keymap).is_some() {
                    return self.commit_best(&keymap, &set, CommitTrigger::Timeout);
                }
                self.cancel(CancelReason::Timeout)
            }
            TimeoutPolicy::Cancel => self.cancel(CancelReason::Timeout),
        }
    }

    fn progress(&mut self, now: u64) -> SequenceStep {
        self.clock.arm(now, self.config.timeout_ms);
        let display = pending_display(&self.pending, self.platform);
        self.listener.on_progress(&display);
        SequenceStep::Progress { display }
    }

    fn commit_best(
        &mut self,
        keymap: &Keymap,
        set: &MatchSet<'_>,
        trigger: CommitTrigger,
    ) -> SequenceStep {
        let Some(best) = set.best_exact(keymap) else {
            return self.cancel(CancelReason::NoMatch);
        };
        let commit = Commit {
            action_id: best.action_id.to_string(),
            pattern_id: best.entry.id.clone(),
            params: best.params.clone(),
            trigger,
        };
        self.pending.clear();
        self.clock.disarm();
        debug!(
            action = %commit.action_id,
            pattern = %commit.pattern_id,
            trigger = ?trigger,
            params = ?commit.params.as_slice(),
            "Sequence committed"
        );
        self.listener.on_commit(&commit);
        SequenceStep::Committed(commit)
    }

    fn cancel(&mut self, reason: CancelReason) -> SequenceStep {
        self.pending.clear();
        self.clock.disarm();
        debug!(reason = ?reason, "Sequence cancelled");
        self.listener.on_cancel(reason);
        SequenceStep::Cancelled(reason)
    }
}

/// Params as plain numbers, for callers that only want `f64`s.
pub fn params_as_f64(params: &[CapturedValue]) -> SmallVec<[f64; 2]> {
    params.iter().map(CapturedValue::as_f64).collect()
}
