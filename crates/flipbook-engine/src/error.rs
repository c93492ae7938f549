use std::fmt;

/// Discriminant of [`Error`], for callers that branch on the failure class.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    ArgumentType,
    OptionType,
    FramePumpUnavailable,
    Sprite,
    SpriteOption,
    SpriteOutOfBounds,
    SpriteSrcType,
    SpriteCancelLoad,
    ImageDecode,
}

/// Engine error.
///
/// Scheduler construction errors are fatal configuration faults. Sprite errors
/// are local to the sprite that raised them and never put the scheduler or
/// other sprites at risk.
///
/// The type is `Clone` because one load outcome is handed to every awaiter of
/// the same [`LoadHandle`](crate::sprite::LoadHandle).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A required constructor argument is missing.
    ArgumentType(String),
    /// A scheduler option cannot be honoured with the facilities supplied.
    OptionType(String),
    /// No frame pump was injected into the scheduler.
    FramePumpUnavailable,
    /// Generic sprite failure.
    Sprite(String),
    /// A sprite option failed validation.
    SpriteOption(String),
    /// A frame or layer index outside the sprite sheet.
    SpriteOutOfBounds(String),
    /// A sprite source that is not a string.
    SpriteSrcType(String),
    /// The in-flight image load was cancelled.
    SpriteCancelLoad { reason: String },
    /// The image could not be decoded.
    ImageDecode { src: String, message: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ArgumentType(_) => ErrorKind::ArgumentType,
            Error::OptionType(_) => ErrorKind::OptionType,
            Error::FramePumpUnavailable => ErrorKind::FramePumpUnavailable,
            Error::Sprite(_) => ErrorKind::Sprite,
            Error::SpriteOption(_) => ErrorKind::SpriteOption,
            Error::SpriteOutOfBounds(_) => ErrorKind::SpriteOutOfBounds,
            Error::SpriteSrcType(_) => ErrorKind::SpriteSrcType,
            Error::SpriteCancelLoad { .. } => ErrorKind::SpriteCancelLoad,
            Error::ImageDecode { .. } => ErrorKind::ImageDecode,
        }
    }

    /// True when the error only signals that a load was abandoned.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::SpriteCancelLoad { .. })
    }

    pub(crate) fn option(msg: impl Into<String>) -> Self {
        Error::SpriteOption(msg.into())
    }

    pub(crate) fn out_of_bounds(msg: impl Into<String>) -> Self {
        Error::SpriteOutOfBounds(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ArgumentType(msg) => write!(f, "invalid argument: {msg}"),
            Error::OptionType(msg) => write!(f, "invalid scheduler option: {msg}"),
            Error::FramePumpUnavailable => {
                write!(f, "no frame pump available; inject one through SchedulerOptions")
            }
            Error::Sprite(msg) => write!(f, "sprite error: {msg}"),
            Error::SpriteOption(msg) => write!(f, "invalid sprite option: {msg}"),
            Error::SpriteOutOfBounds(msg) => write!(f, "sprite index out of bounds: {msg}"),
            Error::SpriteSrcType(msg) => write!(f, "invalid sprite source: {msg}"),
            Error::SpriteCancelLoad { reason } => {
                write!(f, "sprite image loading cancelled ({reason})")
            }
            Error::ImageDecode { src, message } => {
                write!(f, "failed to decode image '{src}': {message}")
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = std::result::Result<T, E>;
