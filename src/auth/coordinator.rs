//! Single-flight coordination of access-token refreshes.
//!
//! Any number of protected requests can observe a 401 at roughly the same
//! time; exactly one of them may perform the refresh call. The rest park on
//! a FIFO queue of oneshot channels and are woken, in enqueue order, once
//! the refresh settles. The `Idle`/`Refreshing` gate and the queue live
//! behind one mutex, so the decision "start a refresh or join the one in
//! flight" is atomic.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::api::error::{ApiError, RefreshFailed};
use crate::auth::session::{Session, SessionHandle};
use crate::auth::store::TokenStore;

/// Hook into the hosting UI's navigation.
///
/// The pipeline signals a hard redirect to the login surface when a refresh
/// fails terminally, unless the user is already looking at it. The UI layer
/// supplies the implementation; the pipeline never renders anything itself.
pub trait Navigator: Send + Sync {
    /// True when the login surface is already the current location.
    fn at_login(&self) -> bool;
    /// Hard redirect to the login surface.
    fn go_to_login(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    Idle,
    Refreshing,
}

/// A caller parked behind the in-flight refresh. Settled exactly once:
/// with the new token on success, or the shared failure on any other
/// outcome.
type Waiter = oneshot::Sender<Result<String, RefreshFailed>>;

struct Inner {
    state: RefreshState,
    queue: VecDeque<Waiter>,
}

pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
    store: Arc<dyn TokenStore>,
    session: SessionHandle,
    navigator: Option<Arc<dyn Navigator>>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn TokenStore>,
        session: SessionHandle,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: RefreshState::Idle,
                queue: VecDeque::new(),
            }),
            store,
            session,
            navigator,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Recover the guard if a holder panicked; Inner stays consistent
        // because all mutation happens at single transition points.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Recover from an authorization-rejected response.
    ///
    /// If a refresh is already in flight, the caller is queued behind it and
    /// resumed when it settles. Otherwise `refresh` is invoked exactly once.
    /// Returns the new access token (already persisted to the store) so the
    /// caller can replay its original request.
    pub async fn recover<F, Fut>(&self, refresh: F) -> Result<String, RefreshFailed>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ApiError>>,
    {
        // The lock scope must close before any await so the future stays
        // Send; Some means we joined the flight already in progress.
        let queued = {
            let mut inner = self.lock();
            if inner.state == RefreshState::Refreshing {
                let (tx, rx) = oneshot::channel();
                inner.queue.push_back(tx);
                Some(rx)
            } else {
                inner.state = RefreshState::Refreshing;
                None
            }
        };

        if let Some(rx) = queued {
            debug!("Refresh already in flight, queueing request");
            return match rx.await {
                Ok(outcome) => outcome,
                // The refreshing future was dropped before settling us.
                Err(_) => Err(RefreshFailed("refresh abandoned before settling".into())),
            };
        }

        // From here the state must return to Idle on every exit path,
        // including cancellation of this future mid-refresh.
        let guard = ResetGuard {
            coordinator: self,
            settled: false,
        };

        match refresh().await {
            Ok(token) => {
                self.store.set(&token);
                let waiters = guard.settle();
                debug!(waiters = waiters.len(), "Token refresh succeeded");
                for waiter in waiters {
                    let _ = waiter.send(Ok(token.clone()));
                }
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, terminating session");
                let failure = RefreshFailed(e.to_string());
                self.store.clear();
                let waiters = guard.settle();
                for waiter in waiters {
                    let _ = waiter.send(Err(failure.clone()));
                }
                self.session.replace(Session::anonymous());
                if let Some(ref navigator) = self.navigator {
                    if !navigator.at_login() {
                        navigator.go_to_login();
                    }
                }
                Err(failure)
            }
        }
    }
}

/// Returns the coordinator to `Idle` and drains the queue exactly once,
/// whether the refresh settled normally or the driving future was dropped.
struct ResetGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl<'a> ResetGuard<'a> {
    fn settle(mut self) -> Vec<Waiter> {
        self.settled = true;
        self.coordinator.reset()
    }
}

impl Drop for ResetGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let waiters = self.coordinator.reset();
            for waiter in waiters {
                let _ = waiter.send(Err(RefreshFailed("refresh cancelled".into())));
            }
        }
    }
}

impl RefreshCoordinator {
    fn reset(&self) -> Vec<Waiter> {
        let mut inner = self.lock();
        inner.state = RefreshState::Idle;
        inner.queue.drain(..).collect()
    }
}
