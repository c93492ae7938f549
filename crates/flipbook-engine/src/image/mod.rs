//! Image acquisition.
//!
//! Sprites talk to images only through [`ImageResource`], a one-attempt-at-a-time
//! decode handle supplied by the host. [`DecodeQueue`] is the cooperative host
//! implementation: decodes complete when the host loop calls
//! [`DecodeQueue::process`].

mod queue;

pub use queue::{decode_file, Decoder, DecodeQueue, QueuedImage};

use crate::error::Error;

/// Pixel dimensions of a decoded image.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Completion of one decode attempt.
pub type DecodeCallback = Box<dyn FnOnce(Result<ImageDimensions, Error>)>;

/// Decodable image handle.
///
/// Contract:
/// - `set_src` starts a new decode attempt and invalidates the previous
///   attempt; an invalidated attempt never calls its callback.
/// - the callback of a live attempt is called exactly once, possibly before
///   `set_src` returns.
/// - `dimensions` is `Some` only after a successful decode of the current
///   source.
pub trait ImageResource {
    fn set_src(&mut self, src: &str, on_settled: DecodeCallback);

    fn dimensions(&self) -> Option<ImageDimensions>;

    /// Invalidates the current attempt without starting another.
    fn abort(&mut self) {}
}
