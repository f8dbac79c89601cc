//! Shared fixtures for scheduler integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tick_scheduler::{ErrorCallback, TickCallback};

/// Tick callback that increments a counter and succeeds
pub fn counting_tick(counter: Arc<AtomicUsize>) -> TickCallback {
    Arc::new(move || {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    })
}

/// Tick callback that increments a counter and always fails
pub fn failing_tick(counter: Arc<AtomicUsize>) -> TickCallback {
    Arc::new(move || {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("tick callback failed"))
        })
    })
}

/// Tick callback that fails only on its n-th invocation (1-based)
pub fn fail_on_nth_tick(counter: Arc<AtomicUsize>, n: usize) -> TickCallback {
    Arc::new(move || {
        let counter = counter.clone();
        Box::pin(async move {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if call == n {
                Err(anyhow!("failure on invocation {}", call))
            } else {
                Ok(())
            }
        })
    })
}

/// Tick callback that sleeps for `duration` before completing, tracking the
/// maximum number of concurrently executing invocations
pub fn slow_tick(
    duration: Duration,
    ticks: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
) -> TickCallback {
    let in_flight = Arc::new(AtomicUsize::new(0));
    Arc::new(move || {
        let ticks = ticks.clone();
        let in_flight = in_flight.clone();
        let max_in_flight = max_in_flight.clone();
        Box::pin(async move {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(duration).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            ticks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    })
}

/// Error callback that increments a counter
pub fn counting_error(counter: Arc<AtomicUsize>) -> ErrorCallback {
    Arc::new(move |_err| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// Error callback that records each failure's message
pub fn recording_error(messages: Arc<Mutex<Vec<String>>>) -> ErrorCallback {
    Arc::new(move |err| {
        messages.lock().unwrap().push(err.to_string());
    })
}
