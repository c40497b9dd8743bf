//! # Authstate Runtime
//!
//! Runtime implementation for the authstate reducer architecture.
//!
//! This crate provides the [`Store`] that owns a piece of state, runs the
//! reducer for every action, publishes each new state to observers and
//! executes the effects the reducer returns.
//!
//! ## Core Components
//!
//! - **Store**: owns state, serializes reductions, publishes state changes
//! - **Effect Executor**: runs effect descriptions and feeds produced actions back
//! - **`EffectHandle`**: lets a caller await the effects started by one action
//!
//! ## Example
//!
//! ```ignore
//! use authstate_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Observe every state the store publishes
//! let mut states = store.subscribe();
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // The new state is visible as soon as send() returns
//! let value = store.state(|s| s.some_field).await;
//! ```

use authstate_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a terminal action or for effects to finish
        #[error("Timeout waiting for action")]
        Timeout,

        /// The reply channel of a waiting caller closed before a match arrived
        #[error("Action reply channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use authstate_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(128)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 128);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for slow action observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    ///
    /// A capacity of zero is raised to one, since the broadcast channel
    /// cannot be created empty.
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] so a caller can wait until the effects
/// started by its action have finished, including the reduction of any
/// action those effects fed back into the store.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new handle together with the tracking context used by the executor
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut last_handle = EffectHandle::completed();
    /// for action in actions {
    ///     last_handle = store.send(action).await?;
    /// }
    /// last_handle.wait().await;
    /// ```
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running for this action
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracking context is gone, so nothing is left running.
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            self.notifier.send_replace(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// The counter is decremented even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
    };
    use tokio::sync::{broadcast, oneshot, watch, Mutex};

    /// A caller of [`Store::send_and_wait_for`] waiting for its result
    struct Waiter<A> {
        matches: Box<dyn Fn(&A) -> bool + Send + Sync>,
        reply: oneshot::Sender<A>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, so reductions never interleave)
    /// 2. State publication (a `watch` channel updated on every reduction)
    /// 3. Reducer and environment
    /// 4. Effect execution, feeding produced actions back into the reducer
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
        state: Arc<RwLock<S>>,
        state_publisher: Arc<watch::Sender<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Broadcast of every action produced by an effect, sent after that
        /// action has been reduced.
        action_broadcast: broadcast::Sender<A>,
        /// Request-response callers, resolved without going through the
        /// lossy broadcast.
        waiters: Arc<Mutex<Vec<Waiter<A>>>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (state_publisher, _) = watch::channel(initial_state.clone());

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                state_publisher: Arc::new(state_publisher),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
                waiters: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Waits for pending effects to complete (with timeout)
        ///
        /// Actions produced by effects that are already running are still
        /// reduced, so their results are not lost.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Whether [`Store::shutdown`] has been called
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Publishes the new state to every [`Store::subscribe`] receiver
        /// 4. Starts the returned effects
        ///
        /// The publication happens before the write lock is released, so
        /// observers see states in exactly the order they were reduced, and
        /// a reader never sees a state older than the one this call produced.
        ///
        /// Effects run in spawned tasks; `send()` returns once they are
        /// started. Await the returned [`EffectHandle`] to wait for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            Ok(self.dispatch(action).await)
        }

        /// Reduce an action and start its effects, ignoring the shutdown flag
        ///
        /// Used for actions produced by effects that were already running
        /// when shutdown began, so their results still land in state.
        async fn dispatch(&self, action: A) -> EffectHandle
        where
            R: Clone,
            E: Clone,
        {
            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                self.state_publisher.send_replace((*state).clone());

                tracing::trace!(effects = effects.len(), "Reducer completed");
                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            handle
        }

        /// Send an action and wait for a matching result action
        ///
        /// Designed for request-response callers: registers a waiter, sends
        /// the action, then returns the first effect-produced action matching
        /// `predicate`. Waiters are resolved after the matching action is
        /// reduced, so the store state already reflects the returned action.
        ///
        /// Each waiter gets its own reply channel. Unlike
        /// [`Store::subscribe_actions`], no amount of concurrent traffic can
        /// make a waiter miss its result.
        ///
        /// With `timeout = None` the call waits until a match arrives.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: timeout expired before a matching action
        /// - [`StoreError::ChannelClosed`]: the reply channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Option<Duration>,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool + Send + Sync + 'static,
        {
            // Register BEFORE sending to avoid missing a fast result
            let (reply, rx) = oneshot::channel();
            self.waiters.lock().await.push(Waiter {
                matches: Box::new(predicate),
                reply,
            });

            // On failure the receiver is dropped and the waiter pruned later
            self.send(action).await?;

            let wait = async { rx.await.map_err(|_| StoreError::ChannelClosed) };

            match timeout {
                Some(limit) => tokio::time::timeout(limit, wait)
                    .await
                    .map_err(|_| StoreError::Timeout)?,
                None => wait.await,
            }
        }

        /// Hand `action` to every waiter it matches, dropping abandoned waiters
        async fn resolve_waiters(&self, action: A) {
            let mut waiters = self.waiters.lock().await;
            let mut index = 0;

            while index < waiters.len() {
                if waiters[index].reply.is_closed() {
                    waiters.swap_remove(index);
                } else if (waiters[index].matches)(&action) {
                    let waiter = waiters.swap_remove(index);
                    let _ = waiter.reply.send(action.clone());
                } else {
                    index += 1;
                }
            }
        }

        /// Number of callers waiting in [`Store::send_and_wait_for`]
        pub async fn waiting(&self) -> usize {
            self.waiters
                .lock()
                .await
                .iter()
                .filter(|waiter| !waiter.reply.is_closed())
                .count()
        }

        /// Subscribe to state changes
        ///
        /// The receiver starts at the current state and is updated on every
        /// reduction before the `send()` that caused it returns.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<S> {
            self.state_publisher.subscribe()
        }

        /// Subscribe to every action produced by effects
        ///
        /// Actions sent directly via `send` are not broadcast. A receiver
        /// that falls more than the configured capacity behind skips actions.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let signed_in = store.state(|s| s.is_authenticated).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Execute an effect with tracking
        ///
        /// Reducer panics propagate; effect failures are logged and never
        /// halt the store. [`DecrementGuard`] keeps the counters right even
        /// when an effect task panics.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking);
                        let _pending_guard = pending_guard;

                        let Some(action) = fut.await else {
                            tracing::trace!("Effect::Future completed with no action");
                            return;
                        };

                        // Reduce first, then tell observers: anyone waiting on this
                        // action must find the state already updated.
                        let _ = store.dispatch(action.clone()).await;
                        store.resolve_waiters(action.clone()).await;
                        let _ = store.action_broadcast.send(action);
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking);
                        let _pending_guard = pending_guard;

                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                state_publisher: Arc::clone(&self.state_publisher),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
                waiters: Arc::clone(&self.waiters),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use authstate_core::{smallvec, SmallVec};

    #[derive(Debug, Clone, PartialEq)]
    struct TestState {
        value: i32,
        log: Vec<&'static str>,
    }

    impl TestState {
        const fn new() -> Self {
            Self {
                value: 0,
                log: Vec::new(),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        NoOp,
        ProduceEffect,
        ProduceParallelEffects,
        ProduceSequentialEffects,
        Record(&'static str),
        Slow,
        Done,
        Echo(u32),
        Echoed(u32),
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.value -= 1;
                    smallvec![Effect::None]
                },
                TestAction::NoOp | TestAction::Done => smallvec![Effect::None],
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async { Some(TestAction::Increment) }))]
                },
                TestAction::ProduceParallelEffects => smallvec![Effect::merge(vec![
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                ])],
                TestAction::ProduceSequentialEffects => smallvec![Effect::chain(vec![
                    Effect::Future(Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(TestAction::Record("first"))
                    })),
                    Effect::Future(Box::pin(async { Some(TestAction::Record("second")) })),
                ])],
                TestAction::Record(entry) => {
                    state.log.push(entry);
                    smallvec![Effect::None]
                },
                TestAction::Echo(n) => {
                    smallvec![Effect::Future(Box::pin(async move { Some(TestAction::Echoed(n)) }))]
                },
                TestAction::Echoed(_) => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Slow => smallvec![Effect::Future(Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Some(TestAction::Done)
                }))],
            }
        }
    }

    fn store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState::new(), TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_store_creation() {
        let store = store();
        assert_eq!(store.state(|s| s.value).await, 0);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn test_send_action() {
        let store = store();

        tokio_test::assert_ok!(store.send(TestAction::Increment).await);
        tokio_test::assert_ok!(store.send(TestAction::Increment).await);
        tokio_test::assert_ok!(store.send(TestAction::Decrement).await);

        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_state_published_before_send_returns() {
        let store = store();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap_or(true));

        let _ = store.send(TestAction::Increment).await;

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().value, 1);
    }

    #[tokio::test]
    async fn test_every_reduction_is_published() {
        let store = store();
        let mut rx = store.subscribe();

        let _ = store.send(TestAction::NoOp).await;

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().value, 0);
    }

    #[tokio::test]
    async fn test_effect_feedback_completes_before_handle() {
        let store = store();

        let mut handle = tokio_test::assert_ok!(store.send(TestAction::ProduceEffect).await);
        tokio_test::assert_ok!(handle.wait_with_timeout(Duration::from_secs(1)).await);

        assert_eq!(store.state(|s| s.value).await, 1);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn test_parallel_effects() {
        let store = store();

        let mut handle =
            tokio_test::assert_ok!(store.send(TestAction::ProduceParallelEffects).await);
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 3);
    }

    #[tokio::test]
    async fn test_sequential_effects_keep_order() {
        let store = store();

        let mut handle =
            tokio_test::assert_ok!(store.send(TestAction::ProduceSequentialEffects).await);
        handle.wait().await;

        assert_eq!(store.state(|s| s.log.clone()).await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_completed_handle_returns_immediately() {
        let mut handle = EffectHandle::completed();
        tokio_test::assert_ok!(handle.wait_with_timeout(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_send_and_wait_for_sees_updated_state() {
        let store = store();

        let action = store
            .send_and_wait_for(
                TestAction::ProduceEffect,
                |a| matches!(a, TestAction::Increment),
                Some(Duration::from_secs(1)),
            )
            .await;

        assert_eq!(action, Ok(TestAction::Increment));
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_send_and_wait_for_times_out() {
        let store = store();

        let result = store
            .send_and_wait_for(
                TestAction::Slow,
                |a| matches!(a, TestAction::Done),
                Some(Duration::from_millis(10)),
            )
            .await;

        assert_eq!(result, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn test_send_and_wait_for_without_timeout() {
        let store = store();

        let result = store
            .send_and_wait_for(TestAction::Slow, |a| matches!(a, TestAction::Done), None)
            .await;

        assert_eq!(result, Ok(TestAction::Done));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_send_and_wait_for_beyond_broadcast_capacity() {
        let store = Store::with_config(
            TestState::new(),
            TestReducer,
            TestEnv,
            StoreConfig::default().with_broadcast_capacity(1),
        );

        let tasks: Vec<_> = (0..200)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .send_and_wait_for(
                            TestAction::Echo(n),
                            move |a| *a == TestAction::Echoed(n),
                            None,
                        )
                        .await
                        == Ok(TestAction::Echoed(n))
                })
            })
            .collect();

        let results = tokio_test::assert_ok!(
            tokio::time::timeout(Duration::from_secs(5), futures::future::join_all(tasks)).await
        );
        for result in results {
            assert!(matches!(result, Ok(true)));
        }
        assert_eq!(store.state(|s| s.value).await, 200);
        assert_eq!(store.waiting().await, 0);
    }

    #[tokio::test]
    async fn test_timed_out_waiter_is_not_waiting() {
        let store = store();

        let result = store
            .send_and_wait_for(
                TestAction::Slow,
                |a| matches!(a, TestAction::Done),
                Some(Duration::from_millis(10)),
            )
            .await;

        assert_eq!(result, Err(StoreError::Timeout));
        assert_eq!(store.waiting().await, 0);
    }

    #[tokio::test]
    async fn test_waiter_after_shutdown_is_not_waiting() {
        let store = store();
        tokio_test::assert_ok!(store.shutdown(Duration::from_secs(1)).await);

        let result = store
            .send_and_wait_for(TestAction::ProduceEffect, |_| true, None)
            .await;

        assert_eq!(result, Err(StoreError::ShutdownInProgress));
        assert_eq!(store.waiting().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_actions_only_sees_effect_actions() {
        let store = store();
        let mut rx = store.subscribe_actions();

        let _ = store.send(TestAction::Increment).await;
        let mut handle = tokio_test::assert_ok!(store.send(TestAction::ProduceEffect).await);
        handle.wait().await;

        assert_eq!(rx.try_recv().ok(), Some(TestAction::Increment));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = store();

        tokio_test::assert_ok!(store.shutdown(Duration::from_secs(1)).await);
        assert!(store.is_shutting_down());

        let result = store.send(TestAction::Increment).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_times_out_with_running_effects() {
        let store = store();

        let _ = store.send(TestAction::Slow).await;
        let result = store.shutdown(Duration::from_millis(20)).await;

        assert_eq!(result, Err(StoreError::ShutdownTimeout(1)));
    }

    #[tokio::test]
    async fn test_shutdown_lets_running_effects_finish() {
        let store = store();

        let _ = store.send(TestAction::ProduceSequentialEffects).await;
        tokio_test::assert_ok!(store.shutdown(Duration::from_secs(1)).await);

        assert_eq!(store.state(|s| s.log.clone()).await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_concurrent_sends_serialize() {
        let store = store();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.send(TestAction::Increment).await.is_ok() })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            assert!(matches!(task, Ok(true)));
        }

        assert_eq!(store.state(|s| s.value).await, 20);
    }

    #[test]
    fn test_store_config_builder() {
        let config = StoreConfig::default()
            .with_broadcast_capacity(0)
            .with_shutdown_timeout(Duration::from_secs(2));

        assert_eq!(config.broadcast_capacity, 1);
        assert_eq!(config.default_shutdown_timeout, Duration::from_secs(2));
    }
}
