use image::GrayImage;

use super::{GlyphMetrics, GlyphSource, blend_ink};

/// Fixed-cell glyph source: every character is `width × height` and renders as a solid block.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceFont {
    width: u32,
    height: u32,
}

impl MonospaceFont {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl GlyphSource for MonospaceFont {
    fn measure(&self, _ch: char) -> GlyphMetrics {
        GlyphMetrics {
            width: self.width,
            height: self.height,
        }
    }

    fn draw(&self, ch: char, x: u32, y: u32, page: &mut GrayImage) {
        if ch.is_whitespace() {
            return;
        }
        // one pixel of gutter so neighbouring cells stay separable
        let inset = u32::from(self.width > 2 && self.height > 2);
        for dy in inset..self.height - inset {
            for dx in inset..self.width - inset {
                blend_ink(page, x as i64 + dx as i64, y as i64 + dy as i64, 255);
            }
        }
    }
}
