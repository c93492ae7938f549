use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde_json::Value;

use crate::error::{Error, Result};

/// Maps a tick's step time to the time credited to the animation.
pub type Throttle = Rc<dyn Fn(f64) -> f64>;

/// Input fed to a throttle when it is validated.
const THROTTLE_PROBE: f64 = 10.0;

pub const DEFAULT_FPS: f64 = 30.0;

/// Pixel size of one tile (frame) in a sprite sheet.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TileSize {
    pub height: f64,
    pub width: f64,
}

impl TileSize {
    pub fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }

    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }
}

/// Validated sprite configuration.
///
/// Values are immutable; [`SpriteOptions::merged`] produces a new value or
/// fails without touching the original.
#[derive(Clone)]
pub struct SpriteOptions {
    fps: f64,
    frames: Vec<u32>,
    lazy: bool,
    size: Option<TileSize>,
    throttle: Throttle,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            frames: Vec::new(),
            lazy: false,
            size: None,
            throttle: Rc::new(|step_time| step_time),
        }
    }
}

impl fmt::Debug for SpriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteOptions")
            .field("fps", &self.fps)
            .field("frames", &self.frames)
            .field("lazy", &self.lazy)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl SpriteOptions {
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Playback order as image frame indices.
    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn lazy(&self) -> bool {
        self.lazy
    }

    pub fn size(&self) -> Option<TileSize> {
        self.size
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Animated iff playback has a rate and more than one frame to cycle.
    pub fn has_animation(&self) -> bool {
        self.fps > 0.0 && self.frames.len() > 1
    }

    /// Milliseconds per animation frame, when animated.
    pub fn frame_duration(&self) -> Option<f64> {
        self.has_animation().then(|| 1000.0 / self.fps)
    }

    /// Validates `patch` against `self` and returns the merged options.
    pub fn merged(&self, patch: OptionsPatch) -> Result<SpriteOptions> {
        let mut next = self.clone();

        if let Some(lazy) = patch.lazy {
            next.lazy = lazy;
        }

        if let Some(fps) = patch.fps {
            let value = fps.resolve("fps")?;
            if value < 0.0 {
                return Err(Error::option(format!(
                    "'fps' option must not be negative ({value})"
                )));
            }
            if value > 0.0 && !(1000.0 / value).is_finite() {
                return Err(Error::option(format!(
                    "'fps' option is too small to derive a frame duration ({value})"
                )));
            }
            next.fps = value;
        }

        if let Some(frames) = patch.frames {
            next.frames = frames.expand()?;
        }

        if let Some(size) = patch.size {
            next.size = Some(size.resolve()?);
        }

        if let Some(throttle) = patch.throttle {
            probe_throttle(&throttle)?;
            next.throttle = throttle;
        }

        if next.has_animation() && next.size.is_none() {
            return Err(Error::option("animation requires tile size ('size' option)"));
        }

        Ok(next)
    }
}

fn probe_throttle(throttle: &Throttle) -> Result<()> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| throttle(THROTTLE_PROBE)));

    match outcome {
        Ok(value) if value.is_finite() => Ok(()),
        Ok(value) => Err(Error::option(format!(
            "'throttle' must return a finite number (returned {value} for {THROTTLE_PROBE})"
        ))),
        Err(_) => Err(Error::option(format!(
            "'throttle' panicked when called with {THROTTLE_PROBE}"
        ))),
    }
}

/// A numeric option as supplied by code or a config file: a number, a numeral
/// string, or (for sizes) a `"<n>px"` string.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn resolve(&self, name: &str) -> Result<f64> {
        let value = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(text) => text.trim().parse::<f64>().ok(),
        };

        value
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::option(format!("'{name}' option must be a number ({self})")))
    }

    fn resolve_px(&self, name: &str) -> Result<f64> {
        let value = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(text) => {
                let text = text.trim();
                text.strip_suffix("px").unwrap_or(text).trim().parse::<f64>().ok()
            }
        };

        match value {
            Some(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(Error::option(format!("invalid '{name}' ({self})"))),
        }
    }

    fn from_json(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Numeric::Number)
                .ok_or_else(|| Error::option(format!("'{name}' option must be a number ({n})"))),
            Value::String(s) => Ok(Numeric::Text(s.clone())),
            other => Err(Error::option(format!("'{name}' option must be a number ({other})"))),
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Number(n) => write!(f, "{n}"),
            Numeric::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl From<u32> for Numeric {
    fn from(value: u32) -> Self {
        Numeric::Number(f64::from(value))
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

impl From<String> for Numeric {
    fn from(value: String) -> Self {
        Numeric::Text(value)
    }
}

/// Animation frames: a count `n` meaning `0..n`, or an explicit play order.
#[derive(Debug, Clone, PartialEq)]
pub enum FramesSpec {
    Count(i64),
    Sequence(Vec<i64>),
}

impl FramesSpec {
    fn expand(&self) -> Result<Vec<u32>> {
        match self {
            FramesSpec::Count(n) => {
                let n = u32::try_from(*n)
                    .map_err(|_| Error::option(format!("invalid 'frames' count ({n})")))?;
                Ok((0..n).collect())
            }
            FramesSpec::Sequence(seq) => {
                let mut seen = HashSet::with_capacity(seq.len());
                seq.iter()
                    .enumerate()
                    .map(|(i, &frame)| {
                        let frame = u32::try_from(frame).map_err(|_| {
                            Error::option(format!("invalid 'frames' (index {i} in {seq:?})"))
                        })?;
                        if !seen.insert(frame) {
                            return Err(Error::option(format!(
                                "duplicate frame {frame} in 'frames' ({seq:?})"
                            )));
                        }
                        Ok(frame)
                    })
                    .collect()
            }
        }
    }

    fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(FramesSpec::Count)
                .ok_or_else(|| Error::option(format!("invalid 'frames' count ({n})"))),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_i64().ok_or_else(|| {
                        Error::option(format!("invalid 'frames' (index {i} in {value})"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(FramesSpec::Sequence),
            other => Err(Error::option(format!("invalid 'frames' ({other})"))),
        }
    }
}

impl From<u32> for FramesSpec {
    fn from(count: u32) -> Self {
        FramesSpec::Count(i64::from(count))
    }
}

impl From<Vec<u32>> for FramesSpec {
    fn from(frames: Vec<u32>) -> Self {
        FramesSpec::Sequence(frames.into_iter().map(i64::from).collect())
    }
}

impl<const N: usize> From<[u32; N]> for FramesSpec {
    fn from(frames: [u32; N]) -> Self {
        FramesSpec::Sequence(frames.into_iter().map(i64::from).collect())
    }
}

/// Tile size input: one value for both axes, or each axis separately.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeSpec {
    Uniform(Numeric),
    Dimensions { height: Numeric, width: Numeric },
}

impl SizeSpec {
    pub fn dimensions(height: impl Into<Numeric>, width: impl Into<Numeric>) -> Self {
        SizeSpec::Dimensions {
            height: height.into(),
            width: width.into(),
        }
    }

    fn resolve(&self) -> Result<TileSize> {
        let invalid = || Error::option(format!("invalid 'size' option ({self:?})"));

        match self {
            SizeSpec::Uniform(side) => side.resolve_px("size").map(TileSize::square),
            SizeSpec::Dimensions { height, width } => {
                let height = height.resolve_px("size.height").map_err(|_| invalid())?;
                let width = width.resolve_px("size.width").map_err(|_| invalid())?;
                Ok(TileSize::new(height, width))
            }
        }
    }

    fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(_) | Value::String(_) => {
                Numeric::from_json("size", value).map(SizeSpec::Uniform)
            }
            Value::Object(map) => {
                let axis = |name: &str| {
                    map.get(name)
                        .ok_or_else(|| Error::option(format!("invalid 'size' option ({value})")))
                        .and_then(|v| Numeric::from_json("size", v))
                };
                Ok(SizeSpec::Dimensions {
                    height: axis("height")?,
                    width: axis("width")?,
                })
            }
            other => Err(Error::option(format!("invalid 'size' option ({other})"))),
        }
    }
}

impl From<Numeric> for SizeSpec {
    fn from(side: Numeric) -> Self {
        SizeSpec::Uniform(side)
    }
}

impl From<f64> for SizeSpec {
    fn from(side: f64) -> Self {
        SizeSpec::Uniform(side.into())
    }
}

impl From<u32> for SizeSpec {
    fn from(side: u32) -> Self {
        SizeSpec::Uniform(side.into())
    }
}

impl From<&str> for SizeSpec {
    fn from(side: &str) -> Self {
        SizeSpec::Uniform(side.into())
    }
}

impl From<TileSize> for SizeSpec {
    fn from(size: TileSize) -> Self {
        SizeSpec::dimensions(size.height, size.width)
    }
}

/// A partial options update. Unset fields keep their current value.
#[derive(Clone, Default)]
pub struct OptionsPatch {
    pub fps: Option<Numeric>,
    pub frames: Option<FramesSpec>,
    pub lazy: Option<bool>,
    pub size: Option<SizeSpec>,
    pub throttle: Option<Throttle>,
}

impl fmt::Debug for OptionsPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsPatch")
            .field("fps", &self.fps)
            .field("frames", &self.frames)
            .field("lazy", &self.lazy)
            .field("size", &self.size)
            .field("throttle", &self.throttle.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl OptionsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fps(mut self, fps: impl Into<Numeric>) -> Self {
        self.fps = Some(fps.into());
        self
    }

    pub fn frames(mut self, frames: impl Into<FramesSpec>) -> Self {
        self.frames = Some(frames.into());
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = Some(lazy);
        self
    }

    pub fn size(mut self, size: impl Into<SizeSpec>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn throttle(mut self, throttle: impl Fn(f64) -> f64 + 'static) -> Self {
        self.throttle = Some(Rc::new(throttle));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fps.is_none()
            && self.frames.is_none()
            && self.lazy.is_none()
            && self.size.is_none()
            && self.throttle.is_none()
    }

    /// Reads the recognized keys of a JSON object. `null` values are treated
    /// as absent and unknown keys are ignored.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::option(format!("options must be an object ({value})")));
        };

        let mut patch = OptionsPatch::new();

        for (key, value) in map.iter().filter(|(_, v)| !v.is_null()) {
            match key.as_str() {
                "fps" => patch.fps = Some(Numeric::from_json("fps", value)?),
                "frames" => patch.frames = Some(FramesSpec::from_json(value)?),
                "lazy" => patch.lazy = Some(truthy(value)),
                "size" => patch.size = Some(SizeSpec::from_json(value)?),
                "throttle" => {
                    return Err(Error::option(format!(
                        "'throttle' must be a function ({value})"
                    )));
                }
                _ => log::trace!("ignoring unrecognized sprite option '{key}'"),
            }
        }

        Ok(patch)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
