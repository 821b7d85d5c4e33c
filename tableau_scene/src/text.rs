// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-line text content for [`NodeKind::Text`](crate::NodeKind::Text) nodes.

use kurbo::{Point, Size};

use crate::backend::{DrawingApi, Font, TextAlign, TextStyle};
use crate::paint::Color;

/// A block of text with explicit line breaks and optional word wrapping.
#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    /// The string to show. Lines break at `\r\n`, `\r`, `\n` and `<br>`.
    pub text: String,
    /// Font.
    pub font: Font,
    /// Fill or outline color.
    pub color: Color,
    /// Anchoring of each line.
    pub align: TextAlign,
    /// Stroke glyphs instead of filling them.
    pub outline: bool,
    /// Maximum rendered width of any line.
    pub max_width: f64,
    /// Wrap lines longer than this.
    pub wrap_width: Option<f64>,
    /// Extra space between lines.
    pub line_spacing: f64,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: Font::default(),
            color: Color::BLACK,
            align: TextAlign::Start,
            outline: false,
            max_width: 10_000.0,
            wrap_width: None,
            line_spacing: 0.0,
        }
    }
}

/// The result of [`Text::layout`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    /// Each line with the y offset of its top.
    pub lines: Vec<(String, f64)>,
    /// Block size.
    pub size: Size,
}

impl Text {
    /// Text with default styling.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Break the text into positioned lines using `api` for measurement.
    pub fn layout(&self, api: &dyn DrawingApi) -> TextLayout {
        let mut lines = Vec::new();
        if self.text.is_empty() {
            return TextLayout {
                lines,
                size: Size::ZERO,
            };
        }
        let line_height = api.font_metrics(&self.font).height + self.line_spacing;
        let mut width = self.wrap_width.unwrap_or(0.0);
        let mut y = 0.0;
        let mut push = |s: String, lines: &mut Vec<(String, f64)>| {
            lines.push((s, y));
            y += line_height;
        };

        for line in explicit_lines(&self.text) {
            let measured = api.measure_text(line, &self.font);
            let wrap = match self.wrap_width {
                Some(wrap) if measured >= wrap => wrap,
                _ => {
                    width = width.max(measured);
                    push(line.to_owned(), &mut lines);
                    continue;
                }
            };
            let mut current = String::new();
            for token in tokens(line) {
                if !current.is_empty()
                    && api.measure_text(&format!("{current}{token}"), &self.font) > wrap
                {
                    push(core::mem::take(&mut current), &mut lines);
                }
                current.push_str(token);
            }
            push(current, &mut lines);
        }

        TextLayout {
            lines,
            size: Size::new(width, y),
        }
    }

    /// Lay out and draw the text. Returns the block size.
    pub fn draw(&self, api: &mut dyn DrawingApi) -> Size {
        let layout = self.layout(api);
        let x = match self.align {
            TextAlign::Start => 0.0,
            TextAlign::Center => layout.size.width * 0.5,
            TextAlign::End => layout.size.width,
        };
        let style = TextStyle {
            font: self.font.clone(),
            color: self.color,
            align: self.align,
            outline: self.outline,
            max_width: self.max_width,
        };
        for (line, y) in &layout.lines {
            api.fill_text(line, Point::new(x, *y), &style);
        }
        layout.size
    }
}

/// Split at `\r\n`, `\r`, `\n` and `<br>` tags (`<br/>`, `<br />` included).
fn explicit_lines(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let (mut start, mut i) = (0, 0);
    while i < bytes.len() {
        let skip = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
            b'\r' | b'\n' => 1,
            b'<' if text[i..].starts_with("<br") => {
                let rest = &bytes[i + 3..];
                let tag = rest.iter().take_while(|b| matches!(b, b' ' | b'/')).count();
                if rest.get(tag) == Some(&b'>') { 3 + tag + 1 } else { 0 }
            }
            _ => 0,
        };
        if skip == 0 {
            i += 1;
            continue;
        }
        out.push(&text[start..i]);
        i += skip;
        start = i;
    }
    out.push(&text[start..]);
    out
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum CharClass {
    Word,
    Other,
    Wide,
}

fn class_of(c: char) -> CharClass {
    if u32::from(c) > 0xff {
        CharClass::Wide
    } else if c.is_ascii_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Other
    }
}

/// Wrap candidates: runs of word characters, runs of other characters, and single
/// characters outside Latin-1.
fn tokens(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev: Option<CharClass> = None;
    for (i, c) in line.char_indices() {
        let class = class_of(c);
        if let Some(p) = prev {
            if p != class || class == CharClass::Wide {
                out.push(&line[start..i]);
                start = i;
            }
        }
        prev = Some(class);
    }
    if start < line.len() {
        out.push(&line[start..]);
    }
    out
}
