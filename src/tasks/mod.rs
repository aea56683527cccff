//! Background Tasks Module
//!
//! Contains background tasks that run alongside request handling.
//!
//! # Tasks
//! - Cache refresh: rotates the cached data set on the strategy's schedule

mod refresh;

pub use refresh::{Clock, RefreshScheduler, SchedulerHandle, SchedulerState};
