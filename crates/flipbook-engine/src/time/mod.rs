//! Time subsystem.
//!
//! Turns a host's irregular frame pump into elapsed-time steps.
//! Intended usage:
//! - inject a [`FramePump`] (and an [`IntervalTimer`] when measuring FPS)
//!   into one [`FrameScheduler`] per update loop
//! - forward the `step_time` received in `on_tick` to time-driven state such
//!   as sprite animations
//!
//! [`ManualHost`] and [`HostClock`] provide a deterministic host for tests and
//! a real-time one for headless programs.

mod fps;
mod host;
mod host_clock;
mod scheduler;

pub use fps::{FpsHook, FPS_WINDOW};
pub use host::{FrameCallback, FramePump, IntervalCallback, IntervalId, IntervalTimer, ManualHost};
pub use host_clock::HostClock;
pub use scheduler::{FrameScheduler, HookFn, SchedulerBuilder, SchedulerOptions, TickFn};
