mod monospace;
mod truetype;

use image::GrayImage;

pub use monospace::MonospaceFont;
pub use truetype::{TrueTypeFont, load_font};

/// Pixel size of one character cell as the layout engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub width: u32,
    pub height: u32,
}

/// Something that can measure characters and draw them onto a greyscale page.
///
/// Layout only ever talks to fonts through this trait, so a fixed-cell source can
/// stand in for a real font wherever exact pixel positions matter.
pub trait GlyphSource {
    fn measure(&self, ch: char) -> GlyphMetrics;

    /// Draws `ch` with its cell's top-left corner at `(x, y)`. Ink outside the page is dropped.
    fn draw(&self, ch: char, x: u32, y: u32, page: &mut GrayImage);

    /// Advance of a whole run, left to right with no kerning.
    fn measure_text(&self, text: &str) -> GlyphMetrics {
        text.chars().fold(
            GlyphMetrics {
                width: 0,
                height: 0,
            },
            |acc, ch| {
                let glyph = self.measure(ch);
                GlyphMetrics {
                    width: acc.width.saturating_add(glyph.width),
                    height: acc.height.max(glyph.height),
                }
            },
        )
    }
}

/// Darkens `page` at `(x, y)` by `coverage` (0 = untouched, 255 = solid black).
pub(crate) fn blend_ink(page: &mut GrayImage, x: i64, y: i64, coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= page.width() || y >= page.height() {
        return;
    }
    let pixel = page.get_pixel_mut(x, y);
    let current = pixel.0[0] as u32;
    pixel.0[0] = (current * (255 - coverage as u32) / 255) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn measure_text_sums_widths_and_keeps_tallest() {
        let font = MonospaceFont::new(7, 12);
        let metrics = font.measure_text("abc ");
        assert_eq!(metrics.width, 28);
        assert_eq!(metrics.height, 12);
        assert_eq!(font.measure_text("").width, 0);
    }

    #[test]
    fn blend_ink_ignores_out_of_page_pixels() {
        let mut page = GrayImage::from_pixel(4, 4, Luma([255]));
        blend_ink(&mut page, -1, 0, 255);
        blend_ink(&mut page, 4, 0, 255);
        blend_ink(&mut page, 1, 1, 255);
        assert_eq!(page.get_pixel(1, 1).0[0], 0);
        assert_eq!(page.pixels().filter(|p| p.0[0] == 0).count(), 1);
    }
}
