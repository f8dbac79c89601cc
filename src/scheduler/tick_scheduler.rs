//! Periodic tick scheduler driving subscriber callbacks at a fixed interval
//!
//! The scheduler owns one background loop task per armed period. On every
//! firing it invokes the registered tick callbacks in registration order and
//! routes callback failures through the active [`ErrorPolicy`]. Tick cycles
//! never overlap: a firing that lands while the previous cycle is still
//! executing is skipped, not queued.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::SchedulerError;
use crate::events::{CallbackRegistry, ErrorCallback, SubscriptionId, TickCallback};
use crate::metrics::{TickMetrics, TickStats};
use crate::policy::ErrorPolicy;

/// Recent-duration window used for slow-cycle detection
const METRICS_WINDOW: usize = 5;

/// Lifecycle state of a [`TickScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, trigger never armed
    Created,
    /// Trigger armed, ticks firing
    Running,
    /// Trigger disarmed, can be re-armed with `start`
    Stopped,
    /// Trigger released; terminal
    Disposed,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Created => write!(f, "created"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Stopped => write!(f, "stopped"),
            SchedulerState::Disposed => write!(f, "disposed"),
        }
    }
}

/// Outcome of one tick cycle
#[derive(Debug, PartialEq, Eq)]
enum CycleOutcome {
    Continue,
    Halt,
}

/// State shared between the control surface and the loop task
struct Inner {
    interval: Duration,
    state: StdMutex<SchedulerState>,
    policy: StdMutex<ErrorPolicy>,
    tick_subscribers: CallbackRegistry<TickCallback>,
    error_subscribers: CallbackRegistry<ErrorCallback>,
    stats: StdMutex<TickStats>,
}

impl Inner {
    fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: SchedulerState) {
        *self.state.lock().unwrap() = state;
    }

    fn ensure_not_disposed(&self) -> Result<(), SchedulerError> {
        if self.state() == SchedulerState::Disposed {
            return Err(SchedulerError::Disposed);
        }
        Ok(())
    }

    /// Running -> Stopped; a no-op from any other state so the policy-driven
    /// halt cannot re-enter after an external `stop`/`dispose` already won
    fn transition_to_stopped(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == SchedulerState::Running {
            *state = SchedulerState::Stopped;
        }
    }

    fn policy(&self) -> ErrorPolicy {
        *self.policy.lock().unwrap()
    }

    /// Notify error subscribers in registration order.
    ///
    /// A panic raised by a subscriber is a defect in the subscriber and is
    /// not caught here; it unwinds through the loop task.
    fn notify_error(&self, err: &anyhow::Error) {
        for callback in self.error_subscribers.snapshot() {
            callback(err);
        }
    }

    fn record_cycle_start(&self, started: Instant) {
        let mut stats = self.stats.lock().unwrap();
        stats.last_start = Some(started);
    }

    fn record_cycle_end(&self, duration: Duration, failures: u64) {
        let mut stats = self.stats.lock().unwrap();
        stats.last_completion = Some(Instant::now());
        stats.total_cycles += 1;
        stats.total_failures += failures;
        stats.total_duration += duration;
        stats.metrics.record(duration);

        if stats.metrics.is_consistently_slow() {
            warn!(
                "⚠️ Tick cycles consistently slow (average {:?})",
                stats.metrics.average()
            );
        }
    }
}

/// Handle to the currently armed loop task, if any
struct LoopControl {
    stop_tx: Option<watch::Sender<bool>>,
    loop_handle: Option<JoinHandle<()>>,
}

/// Periodic callback scheduler.
///
/// Created inert; `start` arms the trigger to fire immediately and then every
/// `interval` until `stop` or `dispose`. All control operations are safe to
/// call from any task, concurrently with an in-flight tick.
pub struct TickScheduler {
    inner: Arc<Inner>,
    control: Mutex<LoopControl>,
}

impl TickScheduler {
    /// Create a scheduler with the trigger inert; firing begins only on `start`.
    ///
    /// Returns [`SchedulerError::ZeroInterval`] for a zero duration: the
    /// interval must stay positive for the lifetime of the instance.
    pub fn new(interval: Duration) -> Result<Self, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let slow_threshold = interval;
        let inner = Arc::new(Inner {
            interval,
            state: StdMutex::new(SchedulerState::Created),
            policy: StdMutex::new(ErrorPolicy::default()),
            tick_subscribers: CallbackRegistry::new(),
            error_subscribers: CallbackRegistry::new(),
            stats: StdMutex::new(TickStats::new(TickMetrics::new(
                METRICS_WINDOW,
                slow_threshold,
            ))),
        });

        Ok(Self {
            inner,
            control: Mutex::new(LoopControl {
                stop_tx: None,
                loop_handle: None,
            }),
        })
    }

    /// Arm the trigger: first tick fires immediately, then every interval.
    ///
    /// Calling `start` while already running re-arms and resets the phase;
    /// it is not an error. On a disposed scheduler this fails with
    /// [`SchedulerError::Disposed`].
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut control = self.control.lock().await;
        self.inner.ensure_not_disposed()?;

        // Re-arm: wind down any existing loop before spawning a fresh one so
        // two loops never run cycles concurrently.
        Self::disarm(&mut control).await;

        let (stop_tx, stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_loop(inner, stop_rx));

        control.stop_tx = Some(stop_tx);
        control.loop_handle = Some(handle);
        self.inner.set_state(SchedulerState::Running);

        info!("▶️ Scheduler started (interval {:?})", self.inner.interval);
        Ok(())
    }

    /// Disarm the trigger; no further ticks fire until the next `start`.
    ///
    /// Idempotent: stopping an already stopped (or never started) scheduler
    /// has no effect. Waits for an in-flight tick cycle to finish, so no tick
    /// callback runs after this returns. If the loop task died from a
    /// panicking subscriber, the panic is observed and logged here. On a
    /// disposed scheduler this fails with [`SchedulerError::Disposed`].
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let mut control = self.control.lock().await;
        self.inner.ensure_not_disposed()?;

        Self::disarm(&mut control).await;
        self.inner.transition_to_stopped();

        debug!("⏸ Scheduler stopped");
        Ok(())
    }

    /// Permanently disarm and release the trigger.
    ///
    /// Idempotent: only the first call releases the loop task; repeated calls
    /// are no-ops. After this returns no tick callback is ever invoked again,
    /// and `start`/`stop`/`set_policy` fail with [`SchedulerError::Disposed`].
    /// If the loop task died from a panicking subscriber, the panic is
    /// observed and logged here.
    pub async fn dispose(&self) {
        let mut control = self.control.lock().await;
        if self.inner.state() == SchedulerState::Disposed {
            debug!("Scheduler already disposed");
            return;
        }

        Self::disarm(&mut control).await;
        self.inner.set_state(SchedulerState::Disposed);

        info!("🛑 Scheduler disposed");
    }

    /// Update the error-handling policy; effective for the next failure handled.
    pub fn set_policy(&self, policy: ErrorPolicy) -> Result<(), SchedulerError> {
        // Hold the state lock across the write so a concurrent dispose
        // cannot land between the check and the update.
        let state = self.inner.state.lock().unwrap();
        if *state == SchedulerState::Disposed {
            return Err(SchedulerError::Disposed);
        }
        *self.inner.policy.lock().unwrap() = policy;
        debug!("Error policy set to {}", policy);
        Ok(())
    }

    /// Register a tick callback, invoked on every tick in registration order
    pub fn on_tick(&self, callback: TickCallback) -> SubscriptionId {
        self.inner.tick_subscribers.subscribe(callback)
    }

    /// Register an error callback, notified with each failure the policy reports
    pub fn on_error(&self, callback: ErrorCallback) -> SubscriptionId {
        self.inner.error_subscribers.subscribe(callback)
    }

    /// Remove a tick subscription; returns false if the id was not registered
    pub fn remove_tick_subscriber(&self, id: SubscriptionId) -> bool {
        self.inner.tick_subscribers.unsubscribe(id)
    }

    /// Remove an error subscription; returns false if the id was not registered
    pub fn remove_error_subscriber(&self, id: SubscriptionId) -> bool {
        self.inner.error_subscribers.unsubscribe(id)
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.state()
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.inner.policy()
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Snapshot of cumulative tick statistics
    pub fn stats(&self) -> TickStats {
        self.inner.stats.lock().unwrap().clone()
    }

    pub fn tick_subscriber_count(&self) -> usize {
        self.inner.tick_subscribers.subscriber_count()
    }

    pub fn error_subscriber_count(&self) -> usize {
        self.inner.error_subscribers.subscriber_count()
    }

    /// Signal the current loop task and wait for it to wind down
    async fn disarm(control: &mut LoopControl) {
        if let Some(stop_tx) = control.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Some(handle) = control.loop_handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("❌ Tick loop task panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        // Finalizer backstop for schedulers dropped without dispose
        let control = self.control.get_mut();
        if let Some(handle) = control.loop_handle.take() {
            handle.abort();
        }
    }
}

/// Marks the scheduler stopped when the loop task exits, including an exit
/// by unwinding. Without this a loop killed by a panicking subscriber would
/// leave the state reading `Running` while nothing fires.
struct LoopGuard {
    inner: Arc<Inner>,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.inner.transition_to_stopped();
    }
}

/// Loop task: one per `start`. Exits on the stop signal or when the policy
/// halts the scheduler after a failure.
async fn run_loop(inner: Arc<Inner>, mut stop_rx: watch::Receiver<bool>) {
    let _guard = LoopGuard {
        inner: Arc::clone(&inner),
    };
    let mut ticker = time::interval(inner.interval);
    // Firings that land while a cycle is still running are skipped, never
    // queued; the next tick re-aligns to the interval.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        // The cycle runs outside the select: once begun it completes before
        // any stop request is observed.
        if run_cycle(&inner).await == CycleOutcome::Halt {
            inner.transition_to_stopped();
            info!("⏹ Scheduler stopped by error policy");
            break;
        }
    }
}

/// Invoke every tick subscriber in registration order, applying the active
/// policy to each failure before moving on to the next subscriber.
async fn run_cycle(inner: &Inner) -> CycleOutcome {
    let started = Instant::now();
    inner.record_cycle_start(started);

    let callbacks = inner.tick_subscribers.snapshot();
    debug!("⏰ Tick: {} subscriber(s)", callbacks.len());

    let mut outcome = CycleOutcome::Continue;
    let mut failures = 0;
    for callback in callbacks {
        if let Err(err) = callback().await {
            failures += 1;
            // Policy is read per failure, so set_policy takes effect for the
            // very next failure even within the same cycle.
            match inner.policy() {
                ErrorPolicy::Ignore => {
                    debug!("Tick callback failed (ignored): {}", err);
                }
                ErrorPolicy::LogAndContinue => {
                    error!("❌ Tick callback failed: {}", err);
                    inner.notify_error(&err);
                }
                ErrorPolicy::Stop => {
                    error!("❌ Tick callback failed, stopping scheduler: {}", err);
                    inner.notify_error(&err);
                    outcome = CycleOutcome::Halt;
                    break;
                }
            }
        }
    }

    let duration = started.elapsed();
    inner.record_cycle_end(duration, failures);

    if duration > inner.interval {
        warn!(
            "⚠️ Tick cycle took {:?} (longer than interval {:?})",
            duration, inner.interval
        );
    }

    outcome
}
