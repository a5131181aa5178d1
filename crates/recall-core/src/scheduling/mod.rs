//! Next-due scheduling.
//!
//! Interval policies are pluggable so the queue builder and status updater
//! never change when the policy does.

mod interval;

pub use interval::{
    ExponentialInterval, FixedInterval, FsrsInterval, IntervalConfig, IntervalInput,
    IntervalPolicy, IntervalStrategy,
};
