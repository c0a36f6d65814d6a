use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Nothing was popped or finished within the idle timeout.
    Idle,
    /// The page budget ran out.
    BudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Idle => write!(f, "frontier idle"),
            StopReason::BudgetExhausted => write!(f, "page budget exhausted"),
        }
    }
}

/// Decides when a crawl is over and broadcasts that decision exactly once.
#[derive(Debug)]
pub struct Termination {
    signal: watch::Sender<Option<StopReason>>,
    in_flight: AtomicUsize,
    last_activity: Mutex<Instant>,
    idle_timeout: Duration,
}

impl Termination {
    pub fn new(idle_timeout: Duration) -> Self {
        let (signal, _) = watch::channel(None);
        Self {
            signal,
            in_flight: AtomicUsize::new(0),
            last_activity: Mutex::new(Instant::now()),
            idle_timeout,
        }
    }

    /// Records the stop reason. Only the first call wins; returns whether this one did.
    pub fn fire(&self, reason: StopReason) -> bool {
        self.signal.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        })
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.signal.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.reason().is_some()
    }

    pub fn subscribe(&self) -> StopSignal {
        StopSignal {
            rx: self.signal.subscribe(),
        }
    }

    /// Marks the frontier as active now.
    pub fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Marks one entry as being processed until the guard drops.
    pub fn begin(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        InFlight { termination: self }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// True when no entry is being processed and the frontier has been quiet for the
    /// whole idle timeout.
    pub fn is_idle(&self) -> bool {
        if self.in_flight() > 0 {
            return false;
        }
        let last = *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last.elapsed() >= self.idle_timeout
    }

    /// How often the idle check runs.
    pub fn poll_interval(&self) -> Duration {
        (self.idle_timeout / 4).clamp(Duration::from_millis(5), Duration::from_millis(250))
    }
}

/// Drop guard returned by [`Termination::begin`]. Dropping it, even while unwinding,
/// ends the entry.
#[must_use]
pub struct InFlight<'a> {
    termination: &'a Termination,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.termination.touch();
        self.termination.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Receiving side of the stop broadcast. Every subscriber sees the same reason.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<Option<StopReason>>,
}

impl StopSignal {
    /// Resolves once the crawl has stopped. `None` means the crawl state was dropped
    /// without ever stopping.
    pub async fn stopped(&mut self) -> Option<StopReason> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        }
    }
}
