use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::TrainingError;
use crate::layout::PlacedCharacter;

/// One box-file record, in tesseract coordinates (origin bottom-left, y up).
///
/// `y0` comes from the glyph's top edge and `y1` from its bottom edge, so `y0 > y1`
/// for any glyph with height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxLine {
    pub ch: char,
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
    pub page: usize,
}

impl fmt::Display for BoxLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.ch, self.x0, self.y0, self.x1, self.y1, self.page
        )
    }
}

impl FromStr for BoxLine {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut chars = line.chars();
        let ch = chars.next().ok_or_else(|| anyhow!("empty box line"))?;
        let rest = chars.as_str();
        let fields: Vec<&str> = rest.split(' ').filter(|f| !f.is_empty()).collect();
        if !rest.starts_with(' ') || fields.len() != 5 {
            return Err(anyhow!("malformed box line: {:?}", line));
        }
        let number = |idx: usize| -> Result<u32> {
            fields[idx]
                .parse::<u32>()
                .with_context(|| format!("invalid coordinate in box line: {:?}", line))
        };
        Ok(BoxLine {
            ch,
            x0: number(0)?,
            y0: number(1)?,
            x1: number(2)?,
            y1: number(3)?,
            page: fields[4]
                .parse::<usize>()
                .with_context(|| format!("invalid page in box line: {:?}", line))?,
        })
    }
}

pub fn to_tesseract_y(page_height: u32, y: u32) -> u32 {
    page_height.saturating_sub(y)
}

/// Converts placed characters to box records, keeping their order.
pub fn emit(placed: &[PlacedCharacter], page_height: u32) -> Result<Vec<BoxLine>> {
    placed
        .iter()
        .map(|glyph| -> Result<BoxLine> {
            if matches!(glyph.ch, '\n' | '\r') {
                return Err(TrainingError::MalformedGlyph(glyph.ch).into());
            }
            Ok(BoxLine {
                ch: glyph.ch,
                x0: glyph.x0,
                y0: to_tesseract_y(page_height, glyph.y0),
                x1: glyph.x1,
                y1: to_tesseract_y(page_height, glyph.y1),
                page: glyph.page,
            })
        })
        .collect()
}

/// Serializes records one per line, each terminated by `\n`.
pub fn render(lines: &[BoxLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    out
}

pub fn parse(content: &str) -> Result<Vec<BoxLine>> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(BoxLine::from_str)
        .collect()
}

pub fn write_boxfile(path: &Path, lines: &[BoxLine]) -> Result<()> {
    std::fs::write(path, render(lines).as_bytes())
        .with_context(|| format!("failed to write boxfile: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(ch: char, x0: u32, y0: u32, x1: u32, y1: u32, page: usize) -> PlacedCharacter {
        PlacedCharacter {
            ch,
            x0,
            y0,
            x1,
            y1,
            page,
        }
    }

    #[test]
    fn flips_y_without_reordering_corners() {
        let lines = emit(&[placed('a', 20, 20, 35, 49, 2)], 600).expect("emit");
        assert_eq!(lines[0].to_string(), "a 20 580 35 551 2");
        assert!(lines[0].y0 > lines[0].y1);
    }

    #[test]
    fn rejects_line_breaks() {
        let err = emit(&[placed('\n', 0, 0, 1, 1, 0)], 10).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrainingError>(),
            Some(TrainingError::MalformedGlyph('\n'))
        ));
    }

    #[test]
    fn render_terminates_every_record() {
        let lines = emit(
            &[placed('é', 0, 0, 10, 10, 0), placed('漢', 10, 0, 20, 10, 0)],
            100,
        )
        .expect("emit");
        let text = render(&lines);
        assert_eq!(text, "é 0 100 10 90 0\n漢 10 100 20 90 0\n");
        assert!(!text.contains("\n\n"));
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn parses_records_back() {
        let line: BoxLine = "# 1 2 3 4 5".parse().expect("parse");
        assert_eq!(
            line,
            BoxLine {
                ch: '#',
                x0: 1,
                y0: 2,
                x1: 3,
                y1: 4,
                page: 5
            }
        );
        let utf8: BoxLine = "ß 10 20 30 40 0".parse().expect("parse");
        assert_eq!(utf8.ch, 'ß');
        assert!("ab 1 2 3 4 5".parse::<BoxLine>().is_err());
        assert!("a 1 2 3 4".parse::<BoxLine>().is_err());
        assert!("a 1 2 x 4 0".parse::<BoxLine>().is_err());
        assert!("".parse::<BoxLine>().is_err());
    }

    #[test]
    fn writes_utf8_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("eng.test.exp0.box");
        let lines = emit(&[placed('ü', 1, 2, 3, 4, 0)], 10).expect("emit");
        write_boxfile(&path, &lines).expect("write");
        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(bytes, "ü 1 8 3 6 0\n".as_bytes());
        assert_eq!(parse(&String::from_utf8(bytes).expect("utf8")).expect("parse"), lines);
    }
}
