use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use ttf_parser::{Face, GlyphId, OutlineBuilder, name_id};

use super::{GlyphMetrics, GlyphSource, blend_ink};

/// A TrueType/OpenType face scaled to a fixed pixel size.
#[derive(Clone)]
pub struct TrueTypeFont {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    space_advance: u16,
    ascender: i16,
    descender: i16,
    size_px: f32,
    family: Option<String>,
}

impl std::fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("size_px", &self.size_px)
            .finish()
    }
}

impl TrueTypeFont {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    fn scale(&self) -> f32 {
        self.size_px / self.units_per_em.max(1) as f32
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.face_index).ok()
    }

    fn line_height_px(&self) -> u32 {
        let units = (self.ascender as i32 - self.descender as i32).max(1) as f32;
        (units * self.scale()).ceil().max(1.0) as u32
    }

    fn advance_px(&self, ch: char) -> u32 {
        let advance = match self.face() {
            Some(face) if ch != ' ' => face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .unwrap_or(self.space_advance),
            _ => self.space_advance,
        };
        (advance as f32 * self.scale()).round().max(1.0) as u32
    }
}

pub fn load_font(path: &Path, size_px: f32) -> Result<TrueTypeFont> {
    if !(size_px > 0.0) {
        return Err(anyhow!("font size must be positive (got {})", size_px));
    }
    let data =
        std::fs::read(path).with_context(|| format!("failed to read font: {}", path.display()))?;
    load_font_from_data(data, size_px)
        .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
}

fn load_font_from_data(data: Vec<u8>, size_px: f32) -> Result<TrueTypeFont> {
    let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
    let data = Arc::new(data);
    for index in 0..count {
        let Ok(face) = Face::parse(&data, index) else {
            continue;
        };
        let units_per_em = face.units_per_em().max(1);
        let space_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(units_per_em / 2);
        return Ok(TrueTypeFont {
            family: extract_family_name(&face),
            units_per_em,
            space_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            face_index: index,
            size_px,
            data: Arc::clone(&data),
        });
    }
    Err(anyhow!("no usable face in font data"))
}

impl GlyphSource for TrueTypeFont {
    fn measure(&self, ch: char) -> GlyphMetrics {
        GlyphMetrics {
            width: self.advance_px(ch),
            height: self.line_height_px(),
        }
    }

    fn draw(&self, ch: char, x: u32, y: u32, page: &mut GrayImage) {
        if ch.is_whitespace() {
            return;
        }
        let Some(face) = self.face() else {
            return;
        };
        let Some(glyph) = face.glyph_index(ch) else {
            return;
        };
        let cell = self.measure(ch);
        // room for overhangs left/right of the advance and below the descender
        let pad = cell.height / 2 + 1;
        let Some(mut pixmap) = Pixmap::new(cell.width + pad * 2, cell.height + pad * 2) else {
            return;
        };
        let scale = self.scale();
        let baseline = pad as f32 + self.ascender as f32 * scale;
        let Some(path) = glyph_path(&face, glyph, scale, pad as f32, baseline) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

        let stride = pixmap.width() as usize;
        let left = x as i64 - pad as i64;
        let top = y as i64 - pad as i64;
        for (offset, pixel) in pixmap.pixels().iter().enumerate() {
            let px = (offset % stride) as i64;
            let py = (offset / stride) as i64;
            blend_ink(page, left + px, top + py, pixel.alpha());
        }
    }
}

fn glyph_path(
    face: &Face<'_>,
    glyph: GlyphId,
    scale: f32,
    origin_x: f32,
    baseline: f32,
) -> Option<tiny_skia::Path> {
    let mut sink = PathSink {
        builder: PathBuilder::new(),
        scale,
        origin_x,
        baseline,
    };
    face.outline_glyph(glyph, &mut sink)?;
    sink.builder.finish()
}

/// Maps font units (y up, origin on the baseline) to pixmap pixels (y down).
struct PathSink {
    builder: PathBuilder,
    scale: f32,
    origin_x: f32,
    baseline: f32,
}

impl PathSink {
    fn px(&self, x: f32) -> f32 {
        self.origin_x + x * self.scale
    }

    fn py(&self, y: f32) -> f32 {
        self.baseline - y * self.scale
    }
}

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = (self.px(x1), self.py(y1));
        let (x, y) = (self.px(x), self.py(y));
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = (self.px(x1), self.py(y1));
        let (x2, y2) = (self.px(x2), self.py(y2));
        let (x, y) = (self.px(x), self.py(y));
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::path::PathBuf;

    fn system_font() -> Option<PathBuf> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/Library/Fonts/Arial.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let err = load_font(Path::new("/nonexistent/font.ttf"), 25.0).unwrap_err();
        assert!(err.to_string().contains("failed to read font"));
    }

    #[test]
    fn garbage_font_data_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"definitely not a font").expect("write");
        let err = load_font(&path, 25.0).unwrap_err();
        assert!(err.to_string().contains("failed to parse font"));
    }

    #[test]
    fn non_positive_size_is_rejected() {
        assert!(load_font(Path::new("whatever.ttf"), 0.0).is_err());
    }

    #[test]
    fn system_font_measures_and_draws() {
        let Some(path) = system_font() else {
            return;
        };
        let font = load_font(&path, 25.0).expect("load font");
        let wide = font.measure('W');
        let narrow = font.measure('i');
        assert!(wide.width > narrow.width);
        assert_eq!(wide.height, narrow.height);
        assert_eq!(font.measure('\u{10FFFF}').width, font.measure(' ').width);

        let mut page = GrayImage::from_pixel(100, 60, Luma([255]));
        font.draw('W', 10, 10, &mut page);
        assert!(page.pixels().any(|p| p.0[0] < 128));
    }
}
