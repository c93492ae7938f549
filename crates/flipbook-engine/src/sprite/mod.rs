//! Sprite sheets.
//!
//! A [`SpriteResource`] pairs an image with animation options. The image is a
//! grid of tiles of one [`TileSize`]: columns are image frames, rows are layers.
//! Call [`SpriteResource::update`] with each scheduler step to play the
//! animation, and the `*_px` queries to find the tile to draw.

mod load;
mod manifest;
mod options;
mod resource;

pub use load::{LoadHandle, LoadOutcome};
pub use manifest::SpriteManifest;
pub use options::{
    FramesSpec, Numeric, OptionsPatch, SizeSpec, SpriteOptions, Throttle, TileSize, DEFAULT_FPS,
};
pub use resource::{FrameEdge, ReadyState, SpriteResource};
