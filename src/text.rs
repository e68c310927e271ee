//! # Text Layout
//!
//! Line breaking and measurement for cell paragraphs.
//!
//! A paragraph is first split at its explicit breaks; each resulting line is
//! then wrapped greedily at UAX#14 break opportunities to fit the cell. A
//! word wider than the cell is broken between characters. Widths come from
//! the [`FontContext`], so the standard faces use their AFM metrics and the
//! embedded font its own advances.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::content::{Inline, Paragraph};
use crate::font::{FontContext, FontFace};
use crate::style::Color;

/// A character with everything needed to draw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyledChar {
    pub ch: char,
    pub face: FontFace,
    pub size: f64,
    pub color: Color,
}

/// One wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub chars: Vec<StyledChar>,
    /// X offset of each character from the line start.
    pub char_positions: Vec<f64>,
    /// Width without trailing spaces.
    pub width: f64,
    /// Baseline-to-baseline height.
    pub height: f64,
    /// Largest font size on the line.
    pub font_size: f64,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.ch).collect()
    }
}

/// A line between two explicit breaks, before wrapping.
struct HardLine {
    chars: Vec<StyledChar>,
    leading: f64,
    font_size: f64,
}

/// Wrap a paragraph to `max_width`.
///
/// Every explicit break starts a new line, so a paragraph with `n` breaks
/// yields at least `n + 1` lines; empty lines keep the height of the text
/// before them.
pub fn wrap_paragraph(paragraph: &Paragraph, fonts: &FontContext, max_width: f64) -> Vec<TextLine> {
    let mut lines = Vec::new();
    for hard in hard_lines(paragraph, fonts) {
        if hard.chars.is_empty() {
            lines.push(TextLine {
                chars: Vec::new(),
                char_positions: Vec::new(),
                width: 0.0,
                height: hard.leading,
                font_size: hard.font_size,
            });
            continue;
        }
        lines.extend(break_line(&hard, fonts, max_width));
    }
    lines
}

/// Total height of wrapped lines.
pub fn lines_height(lines: &[TextLine]) -> f64 {
    lines.iter().map(|l| l.height).sum()
}

fn hard_lines(paragraph: &Paragraph, fonts: &FontContext) -> Vec<HardLine> {
    if paragraph.runs.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut current = HardLine {
        chars: Vec::new(),
        leading: 0.0,
        font_size: 0.0,
    };
    let (mut last_leading, mut last_size) = first_metrics(paragraph);

    for run in &paragraph.runs {
        match run {
            Inline::Text { text, style } => {
                let face = fonts.face(style.font);
                current.leading = current.leading.max(style.leading);
                current.font_size = current.font_size.max(style.size);
                last_leading = style.leading;
                last_size = style.size;
                current.chars.extend(text.chars().map(|ch| StyledChar {
                    ch,
                    face,
                    size: style.size,
                    color: style.color,
                }));
            }
            Inline::Break => {
                if current.chars.is_empty() {
                    current.leading = last_leading;
                    current.font_size = last_size;
                }
                let next = HardLine {
                    chars: Vec::new(),
                    leading: 0.0,
                    font_size: 0.0,
                };
                out.push(std::mem::replace(&mut current, next));
            }
        }
    }
    if current.chars.is_empty() {
        current.leading = last_leading;
        current.font_size = last_size;
    }
    out.push(current);
    out
}

fn first_metrics(paragraph: &Paragraph) -> (f64, f64) {
    paragraph
        .runs
        .iter()
        .find_map(|r| match r {
            Inline::Text { style, .. } => Some((style.leading, style.size)),
            Inline::Break => None,
        })
        .unwrap_or((0.0, 0.0))
}

/// Break opportunities indexed by char position: `true` when a line may
/// start at that character.
fn break_opportunities(text: &str) -> Vec<bool> {
    let char_count = text.chars().count();
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    let mut result = vec![false; char_count];
    for (byte_offset, opp) in linebreaks(text) {
        let idx = byte_to_char[byte_offset];
        if idx < char_count && matches!(opp, BreakOpportunity::Allowed | BreakOpportunity::Mandatory) {
            result[idx] = true;
        }
    }
    result
}

fn break_line(hard: &HardLine, fonts: &FontContext, max_width: f64) -> Vec<TextLine> {
    let chars = &hard.chars;
    let widths: Vec<f64> = chars
        .iter()
        .map(|c| fonts.char_width(c.face, c.ch, c.size))
        .collect();
    let plain: String = chars.iter().map(|c| c.ch).collect();
    let breaks = break_opportunities(&plain);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break: Option<usize> = None;

    for i in 0..chars.len() {
        if i > line_start && breaks[i] {
            last_break = Some(i);
        }
        let w = widths[i];
        // spaces may hang past the edge
        if line_width + w > max_width && i > line_start && chars[i].ch != ' ' {
            let end = match last_break {
                Some(bp) if bp > line_start => bp,
                _ => i,
            };
            lines.push(make_line(hard, &chars[line_start..end], &widths[line_start..end]));
            line_start = end;
            line_width = widths[line_start..=i].iter().sum();
            last_break = None;
            continue;
        }
        line_width += w;
    }
    if line_start < chars.len() {
        lines.push(make_line(hard, &chars[line_start..], &widths[line_start..]));
    }
    lines
}

fn make_line(hard: &HardLine, chars: &[StyledChar], widths: &[f64]) -> TextLine {
    let mut positions = Vec::with_capacity(chars.len());
    let mut x = 0.0;
    for &w in widths {
        positions.push(x);
        x += w;
    }

    let mut width = x;
    let mut i = chars.len();
    while i > 0 && chars[i - 1].ch == ' ' {
        i -= 1;
        width -= widths[i];
    }

    TextLine {
        chars: chars.to_vec(),
        char_positions: positions,
        width,
        height: hard.leading,
        font_size: hard.font_size,
    }
}
