//! Periodic tick scheduler with configurable error handling
//!
//! A [`TickScheduler`] invokes registered callbacks at a fixed interval on a
//! background tokio task, routing callback failures through a configurable
//! [`ErrorPolicy`], with explicit start/stop/dispose lifecycle control.

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod policy;
pub mod scheduler;

pub use error::SchedulerError;
pub use events::{BoxTickFuture, ErrorCallback, SubscriptionId, TickCallback};
pub use metrics::{TickMetrics, TickStats};
pub use policy::ErrorPolicy;
pub use scheduler::{SchedulerState, TickScheduler};
