//! Periodic tick scheduling with configurable error handling

pub mod tick_scheduler;

pub use tick_scheduler::{SchedulerState, TickScheduler};
