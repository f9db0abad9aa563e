//! Sync pipeline.
//!
//! - `SyncEngine`: one full discovery-and-persist run
//! - `schedule::start`: periodic runs of an engine until stopped
//! - `ThrottlePolicy`: pacing between remote calls

pub mod diff;
pub mod schedule;
pub mod sync;
pub mod throttle;

pub use diff::{Diff, calculate_diff};
pub use schedule::{RunHook, ScheduleOptions, SchedulerHandle, start as start_scheduler};
pub use sync::SyncEngine;
pub use throttle::ThrottlePolicy;
