use serde_json::Value;

use super::options::OptionsPatch;
use super::resource::SpriteResource;
use crate::error::{Error, Result};
use crate::image::ImageResource;

/// Sprite description read from JSON.
///
/// ```json
/// { "src": "hero.png", "fps": 12, "frames": [0, 1, 2, 1], "size": { "height": 32, "width": 16 } }
/// ```
///
/// `src` may be omitted or `null`; every other recognized key is an option.
#[derive(Debug, Clone, Default)]
pub struct SpriteManifest {
    pub src: String,
    pub options: OptionsPatch,
}

impl SpriteManifest {
    pub fn from_json(value: &Value) -> Result<Self> {
        let src = match value.get("src") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(src)) => src.clone(),
            Some(other) => {
                return Err(Error::SpriteSrcType(format!(
                    "'src' must be a string ({other})"
                )));
            }
        };

        let options = OptionsPatch::from_json(value)?;
        Ok(Self { src, options })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::option(format!("invalid sprite manifest: {e}")))?;
        Self::from_json(&value)
    }

    pub fn into_sprite(self, image: impl ImageResource + 'static) -> Result<SpriteResource> {
        SpriteResource::new(&self.src, self.options, image)
    }
}
