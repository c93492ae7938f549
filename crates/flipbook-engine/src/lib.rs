//! Flipbook engine crate.
//!
//! This crate owns the animation-timing core used by game hosts: a tick
//! scheduler fed by an injected frame pump, and sprite-sheet resources with an
//! asynchronous load lifecycle and frame/layer pixel math.

pub mod error;
pub mod image;
pub mod logging;
pub mod sprite;
pub mod time;

pub use error::{Error, ErrorKind, Result};
