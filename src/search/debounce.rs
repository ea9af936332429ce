use std::pin::Pin;
use tokio::time::{sleep_until, Duration, Instant, Sleep};

/// Quiet period used when none is configured.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    /// A timer is armed; the latest input has not settled yet.
    Pending,
}

/// Coalesces a burst of inputs into one settled value.
///
/// Each [`push`](Self::push) re-arms a single owned timer. When the timer
/// runs out without another push, [`settled`](Self::settled) resolves with
/// the last pushed value. Dropping the debouncer, or calling
/// [`cancel`](Self::cancel), releases the timer so nothing settles later.
pub struct Debouncer {
    quiet_period: Duration,
    raw: String,
    settled: String,
    timer: Option<Pin<Box<Sleep>>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            raw: String::new(),
            settled: String::new(),
            timer: None,
        }
    }

    /// Records the latest input and restarts the quiet period.
    pub fn push(&mut self, value: impl Into<String>) {
        self.raw = value.into();
        let deadline = Instant::now() + self.quiet_period;
        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().reset(deadline),
            None => self.timer = Some(Box::pin(sleep_until(deadline))),
        }
    }

    /// Latest input, settled or not.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Value of the most recent settlement.
    pub fn settled_value(&self) -> &str {
        &self.settled
    }

    pub fn state(&self) -> DebounceState {
        if self.timer.is_some() {
            DebounceState::Pending
        } else {
            DebounceState::Idle
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Drops the pending timer. The current input will not settle.
    pub fn cancel(&mut self) {
        if self.timer.take().is_some() {
            tracing::debug!(raw = %self.raw, "Debounce timer cancelled");
        }
    }

    /// Settles the current input immediately and returns it.
    pub fn flush(&mut self) -> String {
        self.timer = None;
        self.settled.clone_from(&self.raw);
        self.settled.clone()
    }

    /// Resolves once the pending input settles.
    ///
    /// Never resolves while idle, which makes it safe to poll unconditionally
    /// from a `select!` loop. Cancel-safe: dropping the future leaves the
    /// timer armed.
    pub async fn settled(&mut self) -> String {
        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().await,
            None => std::future::pending::<()>().await,
        }
        self.timer = None;
        self.settled.clone_from(&self.raw);
        self.settled.clone()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
