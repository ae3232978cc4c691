use image::{GrayImage, Luma};
use serde::Serialize;
use tracing::debug;

use crate::font::GlyphSource;

const BACKGROUND: Luma<u8> = Luma([255]);

/// Page size and the top-left position every line and page starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    pub start_x: u32,
    pub start_y: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            start_x: 20,
            start_y: 20,
        }
    }
}

/// One drawn character in image coordinates (origin top-left, y down).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedCharacter {
    pub ch: char,
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
    pub page: usize,
}

/// A finalized greyscale page.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub image: GrayImage,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub pages: Vec<Page>,
    pub placed: Vec<PlacedCharacter>,
}

/// Turns every line break into a space so the whole text is one token stream.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Splits on spaces and gives each word back its trailing space.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize_text(text)
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(|word| format!("{} ", word))
        .collect()
}

pub fn word_fits_in_line(page_width: u32, x: u32, word_width: u32) -> bool {
    page_width as i64 - x as i64 - word_width as i64 > 0
}

/// Leaves room for the line after the new one, so descenders of the last line are never clipped.
pub fn newline_fits_in_page(page_height: u32, y: u32, word_height: u32) -> bool {
    page_height as i64 - y as i64 - 2 * word_height as i64 > 0
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    x: u32,
    y: u32,
}

struct LayoutState<'a, G: GlyphSource + ?Sized> {
    font: &'a G,
    geometry: PageGeometry,
    cursor: Cursor,
    page_index: usize,
    current: GrayImage,
    pages: Vec<Page>,
    placed: Vec<PlacedCharacter>,
}

impl<'a, G: GlyphSource + ?Sized> LayoutState<'a, G> {
    fn new(font: &'a G, geometry: PageGeometry) -> Self {
        Self {
            font,
            geometry,
            cursor: Cursor {
                x: geometry.start_x,
                y: geometry.start_y,
            },
            page_index: 0,
            current: blank_page(geometry),
            pages: Vec::new(),
            placed: Vec::new(),
        }
    }

    fn line_is_empty(&self) -> bool {
        self.cursor.x == self.geometry.start_x
    }

    fn place_token(&mut self, token: &str) {
        let size = self.font.measure_text(token);
        if !self.line_is_empty()
            && !word_fits_in_line(self.geometry.width, self.cursor.x, size.width)
        {
            if newline_fits_in_page(self.geometry.height, self.cursor.y, size.height) {
                self.cursor.x = self.geometry.start_x;
                self.cursor.y = self.cursor.y.saturating_add(size.height);
            } else {
                self.break_page();
            }
        }
        for ch in token.chars() {
            self.place_char(ch);
        }
    }

    fn place_char(&mut self, ch: char) {
        let glyph = self.font.measure(ch);
        let Cursor { x, y } = self.cursor;
        self.font.draw(ch, x, y, &mut self.current);
        if !ch.is_whitespace() {
            self.placed.push(PlacedCharacter {
                ch,
                x0: x,
                y0: y,
                x1: x.saturating_add(glyph.width),
                y1: y.saturating_add(glyph.height),
                page: self.page_index,
            });
        }
        self.cursor.x = self.cursor.x.saturating_add(glyph.width);
    }

    fn break_page(&mut self) {
        debug!(
            "page {} full; continuing on page {}",
            self.page_index,
            self.page_index + 1
        );
        self.finalize_page();
        self.page_index += 1;
        self.cursor = Cursor {
            x: self.geometry.start_x,
            y: self.geometry.start_y,
        };
    }

    fn finalize_page(&mut self) {
        let image = std::mem::replace(&mut self.current, blank_page(self.geometry));
        self.pages.push(Page {
            index: self.page_index,
            image,
        });
    }

    fn finish(mut self) -> Layout {
        let last = std::mem::replace(&mut self.current, GrayImage::new(0, 0));
        self.pages.push(Page {
            index: self.page_index,
            image: last,
        });
        Layout {
            pages: self.pages,
            placed: self.placed,
        }
    }
}

fn blank_page(geometry: PageGeometry) -> GrayImage {
    GrayImage::from_pixel(geometry.width, geometry.height, BACKGROUND)
}

/// Lays `tokens` out left to right, wrapping lines and pages as they fill up.
///
/// Words are never split: a token wider than an empty line is still drawn from
/// `start_x` and simply runs past the right edge.
pub fn layout<G: GlyphSource + ?Sized>(
    tokens: &[String],
    geometry: PageGeometry,
    font: &G,
) -> Layout {
    let mut state = LayoutState::new(font, geometry);
    for token in tokens {
        state.place_token(token);
    }
    let layout = state.finish();
    debug!(
        "laid out {} characters on {} page(s)",
        layout.placed.len(),
        layout.pages.len()
    );
    layout
}
