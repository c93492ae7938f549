use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::load::{LoadHandle, LoadOutcome};
use super::options::{OptionsPatch, SpriteOptions, TileSize};
use crate::error::{Error, Result};
use crate::image::{ImageDimensions, ImageResource};

/// Load lifecycle of a sprite's image.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ReadyState {
    /// Nothing in flight; a source may or may not be set.
    Pending,
    Loading,
    Ready,
    /// The current source failed to decode.
    Error,
}

/// Where inside a frame [`SpriteResource::skip_to_frame`] lands.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FrameEdge {
    #[default]
    Start,
    /// Just before the frame rolls over.
    End,
}

#[derive(Debug, Copy, Clone)]
enum Axis {
    Frame,
    Layer,
}

struct LoadState {
    ready_state: ReadyState,
    // Bumped per load and per cancel; completions from older attempts are dropped.
    attempt: u64,
    dimensions: Option<ImageDimensions>,
    error: Option<Error>,
    handle: Option<LoadHandle>,
}

impl LoadState {
    fn new() -> Self {
        Self {
            ready_state: ReadyState::Pending,
            attempt: 0,
            dimensions: None,
            error: None,
            handle: None,
        }
    }
}

/// A sprite sheet: one image, its animation configuration, and playback state.
///
/// The sheet is a grid of equally sized tiles. Columns are image frames
/// (x axis), rows are layers (y axis). The `frames` option lists the image
/// frames to play, in order.
pub struct SpriteResource {
    src: String,
    options: SpriteOptions,
    image: Box<dyn ImageResource>,
    load: Rc<RefCell<LoadState>>,
    frame_index: usize,
    frame_accumulator: f64,
    frame_duration: f64,
}

impl fmt::Debug for SpriteResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteResource")
            .field("src", &self.src)
            .field("ready_state", &self.ready_state())
            .field("options", &self.options)
            .field("frame_index", &self.frame_index)
            .field("frame_accumulator", &self.frame_accumulator)
            .finish_non_exhaustive()
    }
}

impl SpriteResource {
    /// Validates `options` over the defaults, then sets `src`, which starts
    /// loading unless the options are lazy.
    pub fn new(
        src: &str,
        options: OptionsPatch,
        image: impl ImageResource + 'static,
    ) -> Result<Self> {
        let options = SpriteOptions::default().merged(options)?;
        Ok(Self::with_options(src, options, image))
    }

    pub fn with_options(
        src: &str,
        options: SpriteOptions,
        image: impl ImageResource + 'static,
    ) -> Self {
        let mut sprite = Self {
            src: String::new(),
            options,
            image: Box::new(image),
            load: Rc::new(RefCell::new(LoadState::new())),
            frame_index: 0,
            frame_accumulator: 0.0,
            frame_duration: 0.0,
        };
        sprite.init_animation();
        sprite.set_src(src);
        sprite
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn ready_state(&self) -> ReadyState {
        self.load.borrow().ready_state
    }

    pub fn options(&self) -> &SpriteOptions {
        &self.options
    }

    pub fn size(&self) -> Option<TileSize> {
        self.options.size()
    }

    pub fn has_animation(&self) -> bool {
        self.options.has_animation()
    }

    /// Position in the `frames` play order.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_accumulator(&self) -> f64 {
        self.frame_accumulator
    }

    pub fn frame_duration(&self) -> Option<f64> {
        self.has_animation().then_some(self.frame_duration)
    }

    /// The decode failure of the current source, if any.
    pub fn load_error(&self) -> Option<Error> {
        self.load.borrow().error.clone()
    }

    pub fn image_dimensions(&self) -> Option<ImageDimensions> {
        self.load.borrow().dimensions
    }

    /// Tile columns in the image, once both the image and tile size are known.
    pub fn image_frame_count(&self) -> Option<usize> {
        let (dims, size) = self.image_dimensions().zip(self.size())?;
        Some((f64::from(dims.width) / size.width).ceil() as usize)
    }

    /// Tile rows in the image, once both the image and tile size are known.
    pub fn image_layer_count(&self) -> Option<usize> {
        let (dims, size) = self.image_dimensions().zip(self.size())?;
        Some((f64::from(dims.height) / size.height).ceil() as usize)
    }

    // ── source & loading ──────────────────────────────────────────────────

    /// Points the sprite at a new image.
    ///
    /// Empty or unchanged sources are ignored. A load in flight is cancelled
    /// with reason `"src change"` and the sprite returns to `Pending`; it then
    /// starts loading the new source unless lazy.
    pub fn set_src(&mut self, src: &str) -> &mut Self {
        if src.is_empty() || src == self.src {
            return self;
        }

        if self.ready_state() == ReadyState::Loading {
            self.cancel_load("src change");
        }

        {
            let mut load = self.load.borrow_mut();
            load.ready_state = ReadyState::Pending;
            load.dimensions = None;
            load.error = None;
            if load.handle.as_ref().is_some_and(LoadHandle::is_settled) {
                load.handle = None;
            }
        }

        log::debug!("sprite source set to '{src}'");
        self.src = src.to_string();

        if !self.options.lazy() {
            self.load();
        }

        self
    }

    /// Starts decoding the current source. No-op unless `Pending` with a
    /// source set.
    pub fn load(&mut self) {
        if self.src.is_empty() {
            log::debug!("sprite has no source to load");
            return;
        }

        let attempt = {
            let mut load = self.load.borrow_mut();
            if load.ready_state != ReadyState::Pending {
                return;
            }
            load.attempt += 1;
            load.ready_state = ReadyState::Loading;
            load.handle.get_or_insert_with(LoadHandle::new);
            load.attempt
        };

        log::debug!("loading sprite image '{}'", self.src);

        let state = Rc::downgrade(&self.load);
        let src = self.src.clone();
        self.image.set_src(
            &self.src,
            Box::new(move |outcome| settle(&state, attempt, &src, outcome)),
        );
    }

    /// Handle on the current load.
    ///
    /// All calls share one handle until the load settles or is cancelled. A
    /// handle taken before loading starts is settled by the next load.
    pub fn ready(&self) -> LoadHandle {
        self.load
            .borrow_mut()
            .handle
            .get_or_insert_with(LoadHandle::new)
            .clone()
    }

    /// Abandons the load in flight, rejecting its handle with
    /// [`Error::SpriteCancelLoad`]. Returns whether a load was cancelled.
    pub fn cancel_load(&mut self, reason: impl Into<String>) -> bool {
        let handle = {
            let mut load = self.load.borrow_mut();
            if load.ready_state != ReadyState::Loading {
                log::debug!("image was not loading (ready state {:?})", load.ready_state);
                return false;
            }
            load.ready_state = ReadyState::Pending;
            load.attempt += 1;
            load.handle.take()
        };

        self.image.abort();

        let reason = reason.into();
        log::debug!("image loading of '{}' cancelled: {reason}", self.src);

        if let Some(handle) = handle {
            handle.settle(Err(Error::SpriteCancelLoad { reason }));
        }
        true
    }

    // ── options ───────────────────────────────────────────────────────────

    /// Validates and applies `patch`. On error the current options are kept.
    pub fn set_options(&mut self, patch: OptionsPatch) -> Result<&mut Self> {
        if patch.is_empty() {
            return Ok(self);
        }

        self.options = self.options.merged(patch)?;
        self.init_animation();
        Ok(self)
    }

    fn init_animation(&mut self) {
        match self.options.frame_duration() {
            Some(duration) => {
                self.frame_duration = duration;
                if self.frame_index >= self.options.frames().len() {
                    self.frame_index = 0;
                }
                self.frame_accumulator = self.frame_accumulator.rem_euclid(duration);
            }
            None => {
                self.frame_duration = 0.0;
                self.frame_index = 0;
                self.frame_accumulator = 0.0;
            }
        }
    }

    // ── playback ──────────────────────────────────────────────────────────

    /// Advances the animation by `step_time` milliseconds, after throttling.
    ///
    /// Steps spanning several frame durations advance several frames, so
    /// playback stays on schedule after a pause or a slow tick.
    pub fn update(&mut self, step_time: f64) {
        if !self.has_animation() {
            return;
        }

        let credited = (self.options.throttle())(step_time);
        if !credited.is_finite() {
            log::warn!("throttle returned {credited} for step {step_time}; step ignored");
            return;
        }

        self.frame_accumulator += credited.max(0.0);

        if self.frame_accumulator >= self.frame_duration {
            let advanced = (self.frame_accumulator / self.frame_duration).floor() as usize;
            let len = self.options.frames().len();

            self.frame_accumulator %= self.frame_duration;
            self.frame_index = (self.frame_index + advanced % len) % len;
        }
    }

    /// Jumps to position `frame` of the play order.
    ///
    /// `frame == frames.len()` wraps to the first frame; anything beyond is
    /// out of bounds. Sprites without animation only validate the index.
    pub fn skip_to_frame(&mut self, frame: usize, edge: FrameEdge) -> Result<()> {
        let len = self.options.frames().len();
        if frame > len {
            return Err(Error::out_of_bounds(format!(
                "frame {frame} does not exist ({len} frames)"
            )));
        }

        if !self.has_animation() {
            return Ok(());
        }

        self.frame_index = if frame == len { 0 } else { frame };
        self.frame_accumulator = match edge {
            FrameEdge::Start => 0.0,
            FrameEdge::End => (self.frame_duration - 1.0).max(0.0),
        };
        Ok(())
    }

    // ── pixel math ────────────────────────────────────────────────────────

    /// X offset of the current animation frame, 0 when not animated.
    pub fn current_frame_px(&self) -> f64 {
        match (self.has_animation(), self.size()) {
            (true, Some(size)) => f64::from(self.options.frames()[self.frame_index]) * size.width,
            _ => 0.0,
        }
    }

    /// X offset of position `frame` (default: current) of the play order.
    /// Without a `frames` option positions are image frames.
    pub fn get_frame_px(&self, frame: Option<usize>) -> Result<f64> {
        self.ensure_not_failed()?;

        let frame = frame.unwrap_or(self.frame_index);
        let frames = self.options.frames();
        let image_frame = if frames.is_empty() {
            frame
        } else {
            let mapped = frames.get(frame).ok_or_else(|| {
                Error::out_of_bounds(format!("frame {frame} does not exist"))
            })?;
            *mapped as usize
        };

        self.px(Axis::Frame, image_frame)
    }

    /// X offset of image frame (column) `frame`, defaulting to the current
    /// animation position used as an image frame.
    pub fn get_image_frame_px(&self, frame: Option<usize>) -> Result<f64> {
        self.px(Axis::Frame, frame.unwrap_or(self.frame_index))
    }

    /// Y offset of layer (row) `layer`.
    pub fn get_layer_px(&self, layer: usize) -> Result<f64> {
        self.px(Axis::Layer, layer)
    }

    fn ensure_not_failed(&self) -> Result<()> {
        if self.ready_state() == ReadyState::Error {
            return Err(Error::Sprite(format!("image '{}' failed to load", self.src)));
        }
        Ok(())
    }

    fn px(&self, axis: Axis, index: usize) -> Result<f64> {
        self.ensure_not_failed()?;

        let size = self
            .size()
            .ok_or_else(|| Error::Sprite("tile size is not configured".to_string()))?;

        let (count, dimension, label) = match axis {
            Axis::Frame => (self.image_frame_count(), size.width, "frame"),
            Axis::Layer => (self.image_layer_count(), size.height, "layer"),
        };

        if count.is_some_and(|count| index >= count) {
            return Err(Error::out_of_bounds(format!("{label} {index} does not exist")));
        }

        Ok(index as f64 * dimension)
    }
}

fn settle(state: &Weak<RefCell<LoadState>>, attempt: u64, src: &str, outcome: LoadOutcome) {
    let Some(state) = state.upgrade() else {
        return;
    };

    let handle = {
        let mut load = state.borrow_mut();
        if load.attempt != attempt || load.ready_state != ReadyState::Loading {
            log::trace!("ignoring stale completion for '{src}'");
            return;
        }

        match &outcome {
            Ok(dims) => {
                load.ready_state = ReadyState::Ready;
                load.dimensions = Some(*dims);
                log::debug!("sprite image '{src}' ready ({}x{})", dims.width, dims.height);
            }
            Err(e) => {
                load.ready_state = ReadyState::Error;
                load.error = Some(e.clone());
                log::warn!("sprite image load failed: {e}");
            }
        }

        load.handle.clone()
    };

    if let Some(handle) = handle {
        handle.settle(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::image::{DecodeCallback, DecodeQueue};
    use crate::sprite::SizeSpec;

    fn queue() -> DecodeQueue {
        DecodeQueue::new(|src| match src {
            "hero.png" => Ok(ImageDimensions::new(64, 32)),
            "villain.png" => Ok(ImageDimensions::new(96, 64)),
            other => Err(format!("cannot decode {other}")),
        })
    }

    fn animated(fps: f64, frames: u32) -> OptionsPatch {
        OptionsPatch::new()
            .fps(fps)
            .frames(frames)
            .size(SizeSpec::dimensions(32u32, 16u32))
    }

    fn cancel_reason(outcome: Option<LoadOutcome>) -> String {
        match outcome {
            Some(Err(Error::SpriteCancelLoad { reason })) => reason,
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    /// Completes decodes before `set_src` returns.
    struct InstantImage(ImageDimensions);

    impl ImageResource for InstantImage {
        fn set_src(&mut self, _src: &str, on_settled: DecodeCallback) {
            on_settled(Ok(self.0));
        }

        fn dimensions(&self) -> Option<ImageDimensions> {
            Some(self.0)
        }
    }

    // ── loading ───────────────────────────────────────────────────────────

    #[test]
    fn loads_on_construction() {
        let queue = queue();
        let sprite = SpriteResource::new("hero.png", animated(10.0, 4), queue.image()).unwrap();
        assert_eq!(sprite.ready_state(), ReadyState::Loading);

        let handle = sprite.ready();
        queue.process();

        assert_eq!(sprite.ready_state(), ReadyState::Ready);
        assert_eq!(pollster::block_on(handle), Ok(ImageDimensions::new(64, 32)));
        assert_eq!(sprite.image_frame_count(), Some(4));
        assert_eq!(sprite.image_layer_count(), Some(1));
    }

    #[test]
    fn lazy_sprite_waits_for_load() {
        let queue = queue();
        let mut sprite =
            SpriteResource::new("hero.png", OptionsPatch::new().lazy(true), queue.image()).unwrap();

        let early = sprite.ready();
        assert_eq!(sprite.ready_state(), ReadyState::Pending);
        assert_eq!(queue.pending(), 0);

        sprite.load();
        assert_eq!(sprite.ready_state(), ReadyState::Loading);
        assert!(sprite.ready().same_load(&early));

        queue.process();
        assert_eq!(early.outcome(), Some(Ok(ImageDimensions::new(64, 32))));
    }

    #[test]
    fn load_is_noop_unless_pending() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", OptionsPatch::new(), queue.image()).unwrap();

        sprite.load();
        sprite.load();
        assert_eq!(queue.pending(), 1);

        queue.process();
        sprite.load();
        assert_eq!(queue.pending(), 0);
        assert_eq!(sprite.ready_state(), ReadyState::Ready);
    }

    #[test]
    fn synchronous_completion_is_supported() {
        let sprite = SpriteResource::new(
            "hero.png",
            OptionsPatch::new(),
            InstantImage(ImageDimensions::new(8, 8)),
        )
        .unwrap();

        assert_eq!(sprite.ready_state(), ReadyState::Ready);
        assert_eq!(sprite.ready().outcome(), Some(Ok(ImageDimensions::new(8, 8))));
    }

    #[test]
    fn empty_source_never_loads() {
        let queue = queue();
        let mut sprite = SpriteResource::new("", OptionsPatch::new(), queue.image()).unwrap();
        sprite.load();

        assert_eq!(sprite.src(), "");
        assert_eq!(sprite.ready_state(), ReadyState::Pending);
        assert_eq!(queue.pending(), 0);
    }

    // ── cancellation ──────────────────────────────────────────────────────

    #[test]
    fn src_change_cancels_in_flight_load() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", OptionsPatch::new(), queue.image()).unwrap();
        let first = sprite.ready();

        sprite.set_src("villain.png");

        assert_eq!(cancel_reason(first.outcome()), "src change");
        assert_eq!(sprite.ready_state(), ReadyState::Loading);

        let second = sprite.ready();
        assert!(!second.same_load(&first));

        assert_eq!(queue.process(), 1);
        assert_eq!(sprite.ready_state(), ReadyState::Ready);
        assert_eq!(second.outcome(), Some(Ok(ImageDimensions::new(96, 64))));
    }

    #[test]
    fn src_change_passes_through_pending() {
        let queue = queue();
        let mut sprite =
            SpriteResource::new("hero.png", OptionsPatch::new().lazy(true), queue.image()).unwrap();
        sprite.load();
        let first = sprite.ready();

        sprite.set_src("villain.png");
        assert_eq!(sprite.ready_state(), ReadyState::Pending);
        assert!(first.outcome().is_some_and(|o| o.is_err_and(|e| e.is_cancellation())));

        sprite.load();
        assert_eq!(sprite.ready_state(), ReadyState::Loading);
    }

    #[test]
    fn explicit_cancel_returns_to_pending() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", OptionsPatch::new(), queue.image()).unwrap();
        let handle = sprite.ready();

        assert!(sprite.cancel_load("user abort"));
        assert_eq!(sprite.ready_state(), ReadyState::Pending);
        assert_eq!(cancel_reason(Some(pollster::block_on(handle))), "user abort");

        // The aborted decode is never delivered.
        assert_eq!(queue.process(), 0);
        assert_eq!(sprite.ready_state(), ReadyState::Pending);
        assert_eq!(sprite.load_error(), None);

        assert!(!sprite.cancel_load("again"));
    }

    #[test]
    fn same_src_is_ignored() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", OptionsPatch::new(), queue.image()).unwrap();
        let handle = sprite.ready();

        sprite.set_src("hero.png");
        sprite.set_src("");

        assert!(!handle.is_settled());
        assert_eq!(queue.pending(), 1);
    }

    // ── failure ───────────────────────────────────────────────────────────

    #[test]
    fn decode_failure_is_local_and_recoverable() {
        let queue = queue();
        let mut sprite = SpriteResource::new("broken.png", animated(10.0, 4), queue.image()).unwrap();
        let handle = sprite.ready();
        queue.process();

        assert_eq!(sprite.ready_state(), ReadyState::Error);
        assert_eq!(sprite.load_error().map(|e| e.kind()), Some(ErrorKind::ImageDecode));
        assert_eq!(pollster::block_on(handle).unwrap_err().kind(), ErrorKind::ImageDecode);
        assert_eq!(sprite.get_frame_px(Some(0)).unwrap_err().kind(), ErrorKind::Sprite);
        assert_eq!(sprite.get_layer_px(0).unwrap_err().kind(), ErrorKind::Sprite);

        sprite.set_src("hero.png");
        queue.process();
        assert_eq!(sprite.ready_state(), ReadyState::Ready);
        assert_eq!(sprite.load_error(), None);
        assert_eq!(sprite.get_frame_px(Some(1)), Ok(16.0));
    }

    // ── options ───────────────────────────────────────────────────────────

    #[test]
    fn rejected_options_leave_sprite_untouched() {
        let queue = queue();
        let mut sprite =
            SpriteResource::new("hero.png", OptionsPatch::new().fps(5.0), queue.image()).unwrap();

        let err = sprite
            .set_options(OptionsPatch::new().fps(10.0).frames(3u32))
            .unwrap_err();

        assert!(err.to_string().contains("animation requires tile size"));
        assert_eq!(sprite.options().fps(), 5.0);
        assert_eq!(sprite.ready_state(), ReadyState::Loading);
    }

    #[test]
    fn shrinking_frames_resets_position() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", animated(10.0, 4), queue.image()).unwrap();
        sprite.skip_to_frame(3, FrameEdge::Start).unwrap();

        sprite.set_options(OptionsPatch::new().frames(2u32)).unwrap();
        assert_eq!(sprite.frame_index(), 0);

        sprite.set_options(OptionsPatch::new().fps(0.0)).unwrap();
        assert!(!sprite.has_animation());
        assert_eq!(sprite.frame_duration(), None);
    }

    // ── playback ──────────────────────────────────────────────────────────

    #[test]
    fn large_step_advances_many_frames() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", animated(10.0, 4), queue.image()).unwrap();
        assert_eq!(sprite.frame_duration(), Some(100.0));

        sprite.update(950.0);

        assert_eq!(sprite.frame_index(), 1);
        assert_eq!(sprite.frame_accumulator(), 50.0);
    }

    #[test]
    fn zero_steps_never_advance() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", animated(10.0, 4), queue.image()).unwrap();
        sprite.update(40.0);

        for _ in 0..100 {
            sprite.update(0.0);
        }
        assert_eq!(sprite.frame_index(), 0);
        assert_eq!(sprite.frame_accumulator(), 40.0);
    }

    #[test]
    fn playback_stays_in_range() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", animated(30.0, 5), queue.image()).unwrap();
        let duration = sprite.frame_duration().unwrap();

        let steps = [0.0, 16.6, 16.7, 33.4, 1.0, 250.0, 0.5, 1000.0, 99.9, 12345.6, 33.3333];
        for step in steps.iter().cycle().take(500) {
            sprite.update(*step);
            assert!(sprite.frame_index() < 5);
            assert!((0.0..duration).contains(&sprite.frame_accumulator()));
        }
    }

    #[test]
    fn throttle_scales_credited_time() {
        let queue = queue();
        let mut sprite = SpriteResource::new(
            "hero.png",
            animated(10.0, 4).throttle(|t| t / 2.0),
            queue.image(),
        )
        .unwrap();

        sprite.update(150.0);
        assert_eq!(sprite.frame_index(), 0);
        sprite.update(50.0);
        assert_eq!(sprite.frame_index(), 1);
        assert_eq!(sprite.frame_accumulator(), 0.0);
    }

    #[test]
    fn still_sprite_ignores_updates() {
        let queue = queue();
        let mut sprite =
            SpriteResource::new("hero.png", OptionsPatch::new().frames(1u32), queue.image()).unwrap();

        sprite.update(5000.0);
        assert_eq!(sprite.frame_index(), 0);
        assert_eq!(sprite.frame_accumulator(), 0.0);
        assert_eq!(sprite.current_frame_px(), 0.0);
    }

    #[test]
    fn skip_to_frame_start_and_end() {
        let queue = queue();
        let mut sprite = SpriteResource::new("hero.png", animated(10.0, 4), queue.image()).unwrap();

        sprite.skip_to_frame(2, FrameEdge::End).unwrap();
        assert_eq!(sprite.frame_index(), 2);
        assert_eq!(sprite.frame_accumulator(), 99.0);

        sprite.update(1.0);
        assert_eq!(sprite.frame_index(), 3);

        sprite.skip_to_frame(4, FrameEdge::Start).unwrap();
        assert_eq!(sprite.frame_index(), 0);
        assert_eq!(sprite.frame_accumulator(), 0.0);

        let err = sprite.skip_to_frame(5, FrameEdge::Start).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpriteOutOfBounds);
    }

    // ── pixel math ────────────────────────────────────────────────────────

    #[test]
    fn frame_offsets_use_tile_width() {
        let queue = queue();
        let sprite = SpriteResource::new("hero.png", animated(10.0, 4), queue.image()).unwrap();

        assert_eq!(sprite.get_frame_px(Some(3)), Ok(48.0));
        assert_eq!(sprite.get_frame_px(None), Ok(0.0));
        assert_eq!(sprite.get_layer_px(2), Ok(64.0));
    }

    #[test]
    fn frame_offsets_follow_play_order() {
        let queue = queue();
        let mut sprite = SpriteResource::new(
            "hero.png",
            OptionsPatch::new().fps(10.0).frames([3u32, 1]).size(16u32),
            queue.image(),
        )
        .unwrap();

        assert_eq!(sprite.get_frame_px(Some(0)), Ok(48.0));
        assert_eq!(sprite.get_image_frame_px(Some(0)), Ok(0.0));
        assert_eq!(sprite.current_frame_px(), 48.0);

        sprite.update(100.0);
        assert_eq!(sprite.current_frame_px(), 16.0);
        assert_eq!(sprite.get_frame_px(Some(2)).unwrap_err().kind(), ErrorKind::SpriteOutOfBounds);
    }

    #[test]
    fn offsets_are_bounded_once_image_is_known() {
        let queue = queue();
        let sprite = SpriteResource::new("hero.png", animated(10.0, 4), queue.image()).unwrap();

        // Unknown extent: anything goes.
        assert_eq!(sprite.get_image_frame_px(Some(10)), Ok(160.0));

        queue.process();
        assert_eq!(sprite.get_image_frame_px(Some(3)), Ok(48.0));
        assert_eq!(
            sprite.get_image_frame_px(Some(4)).unwrap_err().kind(),
            ErrorKind::SpriteOutOfBounds
        );
        assert_eq!(sprite.get_layer_px(0), Ok(0.0));
        assert_eq!(sprite.get_layer_px(1).unwrap_err().kind(), ErrorKind::SpriteOutOfBounds);
    }

    #[test]
    fn offsets_need_tile_size() {
        let queue = queue();
        let sprite = SpriteResource::new("hero.png", OptionsPatch::new(), queue.image()).unwrap();
        assert_eq!(sprite.get_layer_px(0).unwrap_err().kind(), ErrorKind::Sprite);
    }
}
