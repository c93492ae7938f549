use std::path::Path;

use image::{ImageFormat, ImageResult, Rgba, RgbaImage};

pub const SAMPLE_FRAMES: u32 = 4;
pub const SAMPLE_TILE: u32 = 32;

const PALETTE: [[u8; 3]; 4] = [
    [0xe0, 0x4f, 0x5f],
    [0xf2, 0xb1, 0x34],
    [0x4f, 0xb4, 0x77],
    [0x3d, 0x7e, 0xc7],
];

/// Writes a horizontal strip of `frames` square tiles as PNG.
///
/// Each tile has its own background and a white bar whose row moves with the
/// frame number, so playback is easy to eyeball.
pub fn write_strip(path: &Path, frames: u32, tile: u32) -> ImageResult<()> {
    let frames = frames.max(1);
    let tile = tile.max(4);
    let bar = tile / 4;

    let mut sheet = RgbaImage::new(frames * tile, tile);
    for (x, y, pixel) in sheet.enumerate_pixels_mut() {
        let frame = x / tile;
        let bar_top = (frame * bar) % (tile - bar + 1);

        *pixel = if (bar_top..bar_top + bar).contains(&y) {
            Rgba([0xff, 0xff, 0xff, 0xff])
        } else {
            let [r, g, b] = PALETTE[frame as usize % PALETTE.len()];
            Rgba([r, g, b, 0xff])
        };
    }

    sheet.save_with_format(path, ImageFormat::Png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_has_one_tile_per_frame() {
        let dir = std::env::temp_dir().join(format!("flipbook-sample-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("strip.png");

        write_strip(&path, 3, 8).unwrap();

        let sheet = image::open(&path).unwrap().to_rgba8();
        assert_eq!(sheet.dimensions(), (24, 8));
        assert_ne!(sheet.get_pixel(0, 7), sheet.get_pixel(8, 7));
        std::fs::remove_dir_all(&dir).ok();
    }
}
