//! Fetch cycle: the request/result/error state machine for one polled resource.
//!
//! ## Policy
//!
//! - `refresh()` never cancels or de-duplicates an in-flight request. Overlapping
//!   completions are stored in completion order (last write wins).
//! - A failure keeps the previous value (stale but available) and is only logged.
//! - Every completion bumps a revision counter so a presentation layer can
//!   re-render on change instead of polling state.

use crate::gateway::FetchError;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

pub type LoadFuture<T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send>>;
type Loader<T> = Box<dyn Fn() -> LoadFuture<T> + Send + Sync>;
type OnReady<T> = Box<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Point-in-time copy of a cycle's state.
#[derive(Debug, Clone)]
pub struct FetchSnapshot<T> {
    pub status: FetchStatus,
    pub value: Option<Arc<T>>,
    pub busy: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct CycleState<T> {
    status: FetchStatus,
    value: Option<Arc<T>>,
    in_flight: usize,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

pub struct FetchCycle<T> {
    name: &'static str,
    loader: Loader<T>,
    on_ready: Option<OnReady<T>>,
    state: Mutex<CycleState<T>>,
    revision: watch::Sender<u64>,
}

impl<T: Send + Sync + 'static> FetchCycle<T> {
    pub fn new<F, Fut>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let (revision, _) = watch::channel(0);
        Self {
            name,
            loader: Box::new(move || -> LoadFuture<T> { Box::pin(loader()) }),
            on_ready: None,
            state: Mutex::new(CycleState {
                status: FetchStatus::Idle,
                value: None,
                in_flight: 0,
                last_updated: None,
                last_error: None,
            }),
            revision,
        }
    }

    /// Derived-state step, run synchronously after each successful store.
    ///
    /// Runs under the cycle's state lock, so it must not call back into the cycle.
    pub fn on_ready(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Box::new(f));
        self
    }

    fn lock(&self) -> MutexGuard<'_, CycleState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue one request and record its outcome.
    ///
    /// The error is returned for callers that want it, but the cycle has
    /// already logged it and kept its previous value.
    pub async fn refresh(&self) -> Result<Arc<T>, FetchError> {
        let in_flight = InFlight::enter(self);
        debug!("{}: fetching", self.name);

        let result = (self.loader)().await;

        let outcome = {
            let mut st = self.lock();
            match result {
                Ok(value) => {
                    let value = Arc::new(value);
                    st.value = Some(Arc::clone(&value));
                    st.status = FetchStatus::Ready;
                    st.last_updated = Some(Utc::now());
                    st.last_error = None;
                    if let Some(derive) = &self.on_ready {
                        derive(&value);
                    }
                    Ok(value)
                }
                Err(e) => {
                    warn!("{}: fetch failed: {}", self.name, e);
                    st.status = FetchStatus::Failed;
                    st.last_error = Some(e.to_string());
                    Err(e)
                }
            }
        };

        drop(in_flight);
        self.revision.send_modify(|r| *r += 1);
        outcome
    }

    pub fn snapshot(&self) -> FetchSnapshot<T> {
        let st = self.lock();
        FetchSnapshot {
            status: st.status,
            value: st.value.clone(),
            busy: st.in_flight > 0,
            last_updated: st.last_updated,
            last_error: st.last_error.clone(),
        }
    }

    pub fn value(&self) -> Option<Arc<T>> {
        self.lock().value.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().in_flight > 0
    }

    /// Completion counter; changes once per finished request.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

/// Counts one request as in flight until dropped, so a refresh future that is
/// cancelled mid-request (an aborted scheduler task, a timeout) still clears
/// the busy flag.
struct InFlight<'a, T> {
    cycle: &'a FetchCycle<T>,
}

impl<'a, T> InFlight<'a, T> {
    fn enter(cycle: &'a FetchCycle<T>) -> Self {
        let mut st = cycle.state.lock().unwrap_or_else(PoisonError::into_inner);
        st.in_flight += 1;
        st.status = FetchStatus::Loading;
        Self { cycle }
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let abandoned = {
            let mut st = self.cycle.state.lock().unwrap_or_else(PoisonError::into_inner);
            st.in_flight = st.in_flight.saturating_sub(1);
            // A completed request has already moved the status off Loading.
            let abandoned = st.in_flight == 0 && st.status == FetchStatus::Loading;
            if abandoned {
                st.status = if st.value.is_some() {
                    FetchStatus::Ready
                } else {
                    FetchStatus::Idle
                };
            }
            abandoned
        };
        if abandoned {
            debug!("{}: request abandoned", self.cycle.name);
            self.cycle.revision.send_modify(|r| *r += 1);
        }
    }
}

/// One-shot readiness: resolves every waiter once the owning widget has
/// finished its initial load.
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

impl ReadySignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Returns `false` if the signal had already fired.
    pub fn mark(&self) -> bool {
        self.tx.send_if_modified(|ready| !std::mem::replace(ready, true))
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}
