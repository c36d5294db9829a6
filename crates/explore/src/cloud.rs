//! Frequency-cloud rendering.
//!
//! [`CloudRenderer`] turns a word → weight map into a pixel buffer. The
//! bundled [`BitmapCloudRenderer`] draws words with a 5×7 bitmap font, larger
//! for heavier words, packed left to right in weight order. Output depends
//! only on the input map, canvas size and background.
use std::io::Cursor;

use fxhash::hash64;
use image::{ImageFormat, Rgb, RgbImage};

use crate::error::ExploreError;

/// Rendered cloud as raw RGB pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudImage {
    image: RgbImage,
}

impl CloudImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Row-major RGB bytes.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn to_png(&self) -> Result<Vec<u8>, ExploreError> {
        let mut out = Cursor::new(Vec::new());
        self.image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| ExploreError::Render(e.to_string()))?;
        Ok(out.into_inner())
    }
}

pub trait CloudRenderer: Send + Sync {
    /// `words` arrive in descending weight order with unique keys.
    fn render(&self, words: &[(String, f64)]) -> Result<CloudImage, ExploreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapCloudRenderer {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
}

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const MAX_SCALE: u32 = 6;
const MARGIN: u32 = 8;

impl BitmapCloudRenderer {
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Self {
        Self {
            width,
            height,
            background,
        }
    }

    fn scale_for(weight: f64, max: f64) -> u32 {
        if !(weight.is_finite() && max.is_finite()) || max <= 0.0 || weight <= 0.0 {
            return 1;
        }
        (1.0 + (MAX_SCALE - 1) as f64 * (weight / max)).round().clamp(1.0, MAX_SCALE as f64) as u32
    }

    /// Colour derived from the word, darkened against light backgrounds.
    fn colour_for(&self, word: &str) -> Rgb<u8> {
        let h = hash64(word.as_bytes());
        let light = self.background.iter().map(|c| *c as u32).sum::<u32>() > 3 * 128;
        let channel = |shift: u32| {
            let v = ((h >> shift) & 0x7f) as u8;
            if light {
                v
            } else {
                v + 0x80
            }
        };
        Rgb([channel(0), channel(8), channel(16)])
    }

    fn draw_word(&self, image: &mut RgbImage, word: &str, x: u32, y: u32, scale: u32, colour: Rgb<u8>) {
        for (i, ch) in word.chars().enumerate() {
            let origin_x = x + i as u32 * (GLYPH_W + 1) * scale;
            let rows = glyph(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let px = origin_x + col * scale + dx;
                            let py = y + row as u32 * scale + dy;
                            if px < image.width() && py < image.height() {
                                image.put_pixel(px, py, colour);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl CloudRenderer for BitmapCloudRenderer {
    fn render(&self, words: &[(String, f64)]) -> Result<CloudImage, ExploreError> {
        if self.width == 0 || self.height == 0 {
            return Err(ExploreError::Render("canvas must not be empty".into()));
        }
        let mut image = RgbImage::from_pixel(self.width, self.height, Rgb(self.background));
        let max = words
            .iter()
            .map(|(_, w)| *w)
            .filter(|w| w.is_finite())
            .fold(0.0f64, f64::max);

        let mut x = MARGIN;
        let mut y = MARGIN;
        let mut line_height = 0;
        for (word, weight) in words {
            let mut scale = Self::scale_for(*weight, max);
            let chars = word.chars().count() as u32;
            // Shrink words that cannot fit on any line.
            while scale > 1 && chars * (GLYPH_W + 1) * scale > self.width.saturating_sub(2 * MARGIN) {
                scale -= 1;
            }
            let w = chars * (GLYPH_W + 1) * scale;
            let h = (GLYPH_H + 1) * scale;

            if x + w > self.width.saturating_sub(MARGIN) && x > MARGIN {
                x = MARGIN;
                y += line_height;
                line_height = 0;
            }
            if y + h > self.height.saturating_sub(MARGIN) {
                continue;
            }
            self.draw_word(&mut image, word, x, y, scale, self.colour_for(word));
            x += w + (GLYPH_W + 1) * scale;
            line_height = line_height.max(h);
        }
        Ok(CloudImage { image })
    }
}

/// 5×7 glyph rows, most significant of the low five bits on the left.
fn glyph(ch: char) -> [u8; 7] {
    match ch.to_uppercase().next().unwrap_or(ch) {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        'Æ' => [0x0F, 0x14, 0x14, 0x1F, 0x14, 0x14, 0x17],
        'Ø' => [0x0F, 0x13, 0x15, 0x15, 0x15, 0x19, 0x1E],
        'Å' => [0x04, 0x00, 0x0E, 0x11, 0x1F, 0x11, 0x11],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ' ' => [0x00; 7],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}
