//! # Zoo Checkout Runtime
//!
//! The [`Store`](store::Store) owns the checkout state and is the only place
//! where reducers run and effects execute.
//!
//! - Every action (user interaction, timer tick, network result) is reduced
//!   one at a time while the state lock is held, so the checkout behaves as a
//!   single cooperative event queue.
//! - Effects run in spawned tasks and feed their resulting actions back
//!   through [`Store::send`](store::Store::send).
//! - Effects registered with `Effect::Cancellable` can be aborted by id; the
//!   store keeps the abort handles so a torn-down timer cannot fire again.
//!
//! ## Example
//!
//! ```ignore
//! use zoo_checkout_runtime::Store;
//!
//! let store = Store::new(initial_state, reducer, environment);
//! store.send(Action::DoSomething).await?;
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, join_all};
use tokio::sync::{Mutex, broadcast};
use tokio::task::AbortHandle;
use zoo_checkout_core::effect::{Effect, EffectId};
use zoo_checkout_core::reducer::Reducer;

pub use error::StoreError;
pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a matching action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

/// Default capacity of the action broadcast channel.
///
/// Countdown ticks are broadcast once per second, so observers that only
/// care about a terminal action can lag behind without losing it.
const BROADCAST_CAPACITY: usize = 64;

/// Decrements the pending-effect counter when dropped (also on abort)
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A registered cancellable effect
struct Registration {
    generation: u64,
    handle: AbortHandle,
}

/// Abort handles of running cancellable effects, keyed by effect id
#[derive(Default)]
struct Cancellations {
    next_generation: AtomicU64,
    running: StdMutex<HashMap<EffectId, Registration>>,
}

impl Cancellations {
    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn register(&self, id: EffectId, generation: u64, handle: AbortHandle) {
        let previous = match self.running.lock() {
            Ok(mut running) => running.insert(id.clone(), Registration { generation, handle }),
            Err(poisoned) => poisoned
                .into_inner()
                .insert(id.clone(), Registration { generation, handle }),
        };
        if let Some(previous) = previous {
            tracing::trace!(effect_id = %id, "Replacing running cancellable effect");
            previous.handle.abort();
        }
    }

    fn cancel(&self, id: &EffectId) -> bool {
        let removed = match self.running.lock() {
            Ok(mut running) => running.remove(id),
            Err(poisoned) => poisoned.into_inner().remove(id),
        };
        removed.is_some_and(|registration| {
            registration.handle.abort();
            true
        })
    }

    /// Forget a registration once its task has finished on its own
    fn finished(&self, id: &EffectId, generation: u64) {
        let mut running = match self.running.lock() {
            Ok(running) => running,
            Err(poisoned) => poisoned.into_inner(),
        };
        if running.get(id).is_some_and(|r| r.generation == generation) {
            running.remove(id);
        }
    }

    fn cancel_all(&self) -> usize {
        let drained: Vec<Registration> = match self.running.lock() {
            Ok(mut running) => running.drain().map(|(_, r)| r).collect(),
            Err(poisoned) => poisoned.into_inner().drain().map(|(_, r)| r).collect(),
        };
        for registration in &drained {
            registration.handle.abort();
        }
        drained.len()
    }

    fn is_running(&self, id: &EffectId) -> bool {
        match self.running.lock() {
            Ok(running) => running.contains_key(id),
            Err(poisoned) => poisoned.into_inner().contains_key(id),
        }
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        AbortHandle, Arc, AtomicBool, AtomicUsize, BROADCAST_CAPACITY, BoxFuture, Cancellations,
        Duration, Effect, EffectId, FutureExt, Mutex, Ordering, PendingGuard, Reducer, broadcast,
        join_all,
    };
    use crate::error::StoreError;

    /// The Store - runtime coordinator for one checkout session
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<Mutex<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        cancellations: Arc<Cancellations>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast after it has been reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                cancellations: Arc::clone(&self.cancellations),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (action_broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);

            Self {
                state: Arc::new(Mutex::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                cancellations: Arc::new(Cancellations::default()),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the state lock (actions are reduced one at a time)
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Starts executing the returned effects
        ///
        /// `send()` returns once effects have been started, not completed.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store has shut down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shut down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let effects = {
                let mut state = self.state.lock().await;
                self.reducer.reduce(&mut state, action, &self.environment)
            };

            tracing::trace!("Reducer returned {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect);
            }

            Ok(())
        }

        /// Send an action and wait for an effect-produced action matching `predicate`
        ///
        /// The matching action has already been reduced when it is returned, so
        /// reading state afterwards observes its result.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before `timeout`
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store has shut down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe before sending so a fast effect cannot be missed
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to every action produced by effects (after it was reduced)
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.lock().await;
            f(&state)
        }

        /// Whether a cancellable effect is currently registered under `id`
        #[must_use]
        pub fn is_running(&self, id: &EffectId) -> bool {
            self.cancellations.is_running(id)
        }

        /// Number of effects that have been started and not yet finished
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Shut the store down
        ///
        /// Aborts every cancellable effect (timers), then waits for the remaining
        /// effects to finish so in-flight requests still deliver their result.
        /// Only then are new actions rejected.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// after `timeout`.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            let cancelled = self.cancellations.cancel_all();
            tracing::debug!(cancelled, "Aborted cancellable effects");

            let poll_interval = Duration::from_millis(10);
            let result = tokio::time::timeout(timeout, async {
                while self.pending_effects.load(Ordering::Acquire) > 0 {
                    tokio::time::sleep(poll_interval).await;
                }
            })
            .await;

            self.shutdown.store(true, Ordering::Release);

            match result {
                Ok(()) => {
                    tracing::info!("All effects completed, shutdown successful");
                    Ok(())
                },
                Err(_) => {
                    let pending = self.pending_effects.load(Ordering::Acquire);
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    Err(StoreError::ShutdownTimeout(pending))
                },
            }
        }

        fn track(&self) -> PendingGuard {
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            PendingGuard(Arc::clone(&self.pending_effects))
        }

        fn spawn(&self, effect: Effect<A>) -> AbortHandle {
            let guard = self.track();
            let store = self.clone();
            tokio::spawn(async move {
                let _guard = guard;
                store.run(effect).await;
            })
            .abort_handle()
        }

        /// Execute an effect without waiting for it
        fn execute_effect(&self, effect: Effect<A>) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Cancel(id) => {
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                    if self.cancellations.cancel(&id) {
                        tracing::debug!(effect_id = %id, "Cancelled effect");
                    }
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect);
                    }
                },
                Effect::Cancellable { id, effect } => {
                    metrics::counter!("store.effects.executed", "type" => "cancellable")
                        .increment(1);
                    let generation = self.cancellations.next_generation();
                    let guard = self.track();
                    let store = self.clone();
                    let task_id = id.clone();
                    let handle = tokio::spawn(async move {
                        let _guard = guard;
                        store.run(*effect).await;
                        store.cancellations.finished(&task_id, generation);
                    })
                    .abort_handle();
                    self.cancellations.register(id, generation, handle);
                },
                effect @ (Effect::Delay { .. } | Effect::Future(_) | Effect::Sequential(_)) => {
                    let _ = self.spawn(effect);
                },
            }
        }

        /// Drive an effect to completion inside a spawned task
        fn run(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();
            async move {
                match effect {
                    Effect::Delay { duration, action } => {
                        metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    },
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future")
                            .increment(1);
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Sequential(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "sequential")
                            .increment(1);
                        for effect in effects {
                            store.run(effect).await;
                        }
                    },
                    Effect::Parallel(effects) => {
                        join_all(effects.into_iter().map(|e| store.run(e))).await;
                    },
                    other @ (Effect::None | Effect::Cancel(_) | Effect::Cancellable { .. }) => {
                        store.execute_effect(other);
                    },
                }
            }
            .boxed()
        }

        async fn feed_back(&self, action: A) {
            let observed = action.clone();
            match self.send(action).await {
                Ok(()) => {
                    // No receivers is not an error
                    let _ = self.action_broadcast.send(observed);
                },
                Err(error) => {
                    tracing::warn!(%error, "Dropped action produced by effect");
                },
            }
        }
    }
}
