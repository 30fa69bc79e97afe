//! Application lifecycle controller.
//!
//! Owns the listener and the store handle, and orders their startup and
//! shutdown:
//!
//! ```text
//! Created ──run()──▶ Running ──stop(deadline)──▶ ShuttingDown ──▶ Stopped
//! ```
//!
//! `run` opens the store before binding, so an unreachable database never
//! exposes a listener. `stop` stops accepting immediately, waits for in-flight
//! requests up to the deadline, and closes the store whether or not the
//! deadline was met.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time;
use tracing::{info, info_span, warn, Instrument, Span};

use crate::config::AppConfig;
use crate::http::RequestTracker;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::startup;
use crate::net::{bind_listener, ListenerError};
use crate::store::{ConfigRepository, RepositoryError, StoreConnector};

/// Lifecycle phase of an [`App`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to open configuration store: {0}")]
    Database(#[source] RepositoryError),

    #[error(transparent)]
    Bind(#[from] ListenerError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("in-flight requests did not finish within {deadline:?}")]
    ShutdownTimeout { deadline: Duration },
}

/// Triggers a latch when dropped, so every exit from `run` is observed.
struct TriggerOnDrop<'a>(&'a Shutdown);

impl Drop for TriggerOnDrop<'_> {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

/// The running service: one listener, one store, one-shot lifecycle.
pub struct App {
    config: AppConfig,
    connector: Arc<dyn StoreConnector>,
    span: Span,
    state: watch::Sender<LifecycleState>,
    started: AtomicBool,
    /// Closes the listener and starts graceful drain.
    stop_accepting: Shutdown,
    /// Abandons the drain once the deadline has passed.
    force_close: Shutdown,
    run_finished: Shutdown,
    store: Mutex<Option<Arc<dyn ConfigRepository>>>,
    local_addr: OnceLock<SocketAddr>,
    tracker: RequestTracker,
}

impl App {
    /// Create a controller in the `Created` state.
    ///
    /// All logging from the controller and the services it builds happens
    /// inside `span`.
    pub fn new(config: AppConfig, connector: Arc<dyn StoreConnector>, span: Span) -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        Self {
            config,
            connector,
            span,
            state,
            started: AtomicBool::new(false),
            stop_accepting: Shutdown::new(),
            force_close: Shutdown::new(),
            run_finished: Shutdown::new(),
            store: Mutex::new(None),
            local_addr: OnceLock::new(),
            tracker: RequestTracker::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Wait until the controller leaves `Created`, returning the state it moved to.
    ///
    /// A fatal startup error yields `Stopped` rather than `Running`.
    pub async fn wait_until_running(&self) -> LifecycleState {
        let mut rx = self.state.subscribe();
        let reached = rx
            .wait_for(|state| *state != LifecycleState::Created)
            .await
            .map(|state| *state);
        reached.unwrap_or_else(|_| self.state())
    }

    /// Address the listener is bound to, once `run` has bound it.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Number of requests currently being handled.
    pub fn in_flight(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Open the store, bind the listener and serve until stopped.
    ///
    /// Can be called once. Returns when `stop` has closed the listener, or
    /// with an error if startup fails. If `stop` was requested before the
    /// listener is bound, returns `Ok` without serving.
    pub async fn run(&self) -> Result<(), LifecycleError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(LifecycleError::InvalidState {
                operation: "run",
                state: self.state(),
            });
        }

        let span = info_span!(parent: &self.span, "run");
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> Result<(), LifecycleError> {
        let _finished = TriggerOnDrop(&self.run_finished);

        if self.stop_accepting.is_triggered() {
            info!("Stop requested before startup, not serving");
            return Ok(());
        }

        let repository = match startup::open_store(self.connector.as_ref(), &self.config.database).await {
            Ok(repository) => repository,
            Err(err) => {
                self.state.send_replace(LifecycleState::Stopped);
                return Err(LifecycleError::Database(err));
            }
        };

        if self.stop_accepting.is_triggered() {
            info!("Stop requested while opening the store, not serving");
            repository.close().await;
            return Ok(());
        }

        let listener = match bind_listener(&self.config.listener).await {
            Ok(listener) => listener,
            Err(err) => {
                repository.close().await;
                self.state.send_replace(LifecycleState::Stopped);
                return Err(err.into());
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => {
                repository.close().await;
                self.state.send_replace(LifecycleState::Stopped);
                return Err(LifecycleError::Serve(err));
            }
        };
        let _ = self.local_addr.set(local_addr);

        *self.store.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&repository));
        let router =
            startup::build_app_router(&self.config, repository, &self.span, self.tracker.clone());

        let promoted = self.state.send_if_modified(|state| {
            if *state == LifecycleState::Created {
                *state = LifecycleState::Running;
                true
            } else {
                false
            }
        });
        if !promoted {
            info!("Stop requested during startup, not serving");
            self.release_store().await;
            return Ok(());
        }

        info!(address = %local_addr, "Accepting connections");

        let server = axum::serve(listener, router)
            .with_graceful_shutdown(self.stop_accepting.subscribe().recv())
            .into_future();

        let outcome = tokio::select! {
            result = server => result.map_err(LifecycleError::Serve),
            _ = self.force_close.subscribe().recv() => {
                warn!(in_flight = self.tracker.active_count(), "Abandoning in-flight requests");
                Ok(())
            }
        };

        match outcome {
            Ok(()) => {
                info!("Listener closed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Server failed");
                self.release_store().await;
                self.state.send_replace(LifecycleState::Stopped);
                Err(err)
            }
        }
    }

    /// Stop accepting, drain in-flight requests up to `deadline`, then close the store.
    ///
    /// The store is closed even when the deadline elapses; in that case the
    /// result is [`LifecycleError::ShutdownTimeout`].
    pub async fn stop(&self, deadline: Duration) -> Result<(), LifecycleError> {
        let mut previous = LifecycleState::Created;
        self.state.send_if_modified(|state| {
            previous = *state;
            match state {
                LifecycleState::Created | LifecycleState::Running => {
                    *state = LifecycleState::ShuttingDown;
                    true
                }
                _ => false,
            }
        });

        match previous {
            LifecycleState::Stopped => return Ok(()),
            LifecycleState::ShuttingDown => {
                return Err(LifecycleError::InvalidState {
                    operation: "stop",
                    state: previous,
                })
            }
            LifecycleState::Created | LifecycleState::Running => {}
        }

        let span = info_span!(
            parent: &self.span,
            "stop",
            deadline_ms = deadline.as_millis() as u64
        );
        self.stop_inner(deadline).instrument(span).await
    }

    async fn stop_inner(&self, deadline: Duration) -> Result<(), LifecycleError> {
        info!(in_flight = self.tracker.active_count(), "Stopping, no longer accepting connections");
        self.stop_accepting.trigger();

        let mut timed_out = false;
        if self.started.load(Ordering::SeqCst)
            && time::timeout(deadline, self.run_finished.subscribe().recv())
                .await
                .is_err()
        {
            timed_out = true;
            warn!(
                in_flight = self.tracker.active_count(),
                "Shutdown deadline elapsed before in-flight requests finished"
            );
            self.force_close.trigger();

            // `run` may still be inside startup; let it finish so the store it
            // opens is closed before this returns.
            let grace = Duration::from_secs(self.config.timeouts.store_close_secs);
            if time::timeout(grace, self.run_finished.subscribe().recv())
                .await
                .is_err()
            {
                warn!(grace_secs = grace.as_secs(), "Run did not finish after forced close");
            }
        }

        self.release_store().await;
        self.state.send_replace(LifecycleState::Stopped);

        if timed_out {
            Err(LifecycleError::ShutdownTimeout { deadline })
        } else {
            info!("Stopped");
            Ok(())
        }
    }

    /// Close the store if it is still held. Only the first caller closes it.
    async fn release_store(&self) {
        let repository = self
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(repository) = repository else {
            return;
        };

        let grace = Duration::from_secs(self.config.timeouts.store_close_secs);
        match time::timeout(grace, repository.close()).await {
            Ok(()) => info!("Configuration store closed"),
            Err(_) => warn!(grace_secs = grace.as_secs(), "Configuration store close timed out"),
        }
    }
}
