//! Text fitting
//!
//! Wraps text greedily by words and shrinks the font in fixed steps until the
//! block fits its rectangle or the minimum size is reached.

use crate::Rect;
use pdf_core::{Align, TextMeasure};
use serde::{Deserialize, Serialize};

/// Sizes and padding used when fitting text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitOptions {
    /// Starting font size in points
    pub max_size: f32,
    /// Smallest font size tried
    pub min_size: f32,
    /// Amount the size shrinks per attempt
    pub step: f32,
    /// Total horizontal and vertical padding, split evenly between both sides
    pub padding: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_size: 12.0,
            min_size: 6.0,
            step: 0.5,
            padding: 4.0,
        }
    }
}

/// Text broken into lines at a chosen size
#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
    pub lines: Vec<String>,
    pub font_size: f32,
    /// Number of size reductions applied
    pub reductions: u32,
    /// Still too wide or too tall at the final size
    pub overflows: bool,
}

/// One line of fitted text with its anchor and baseline (top-origin)
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl FittedText {
    /// Anchor and baseline for every line
    ///
    /// The first baseline sits one font size below the padded top edge and
    /// each further line one font size lower. Blocks are never centered
    /// vertically.
    pub fn place(&self, rect: &Rect, align: Align, padding: f64) -> Vec<PlacedLine> {
        let inset = padding / 2.0;
        let x = match align {
            Align::Left => rect.x + inset,
            Align::Center => rect.x + rect.width / 2.0,
            Align::Right => rect.x + rect.width - inset,
        };
        let size = self.font_size as f64;

        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| PlacedLine {
                text: line.clone(),
                x,
                y: rect.y + inset + size * (i + 1) as f64,
            })
            .collect()
    }
}

/// Fit `text` into `rect`
///
/// Empty or whitespace-only text yields no lines. Reaching the minimum size
/// is not an error: the block is returned as is with `overflows` set.
pub fn fit_text(
    text: &str,
    rect: &Rect,
    measure: &(impl TextMeasure + ?Sized),
    options: &FitOptions,
) -> FittedText {
    let usable_width = rect.width - options.padding;
    let usable_height = rect.height - options.padding;

    let mut font_size = options.max_size;
    let mut reductions = 0;

    if text.trim().is_empty() {
        return FittedText {
            lines: Vec::new(),
            font_size,
            reductions,
            overflows: false,
        };
    }

    loop {
        let lines = wrap_words(text, usable_width, |s| measure.text_width(s, font_size));
        let widest = lines
            .iter()
            .map(|line| measure.text_width(line, font_size))
            .fold(0.0, f64::max);
        let too_tall = lines.len() as f64 * font_size as f64 > usable_height;
        let too_wide = widest > usable_width;

        if !(too_tall || too_wide) || font_size <= options.min_size || options.step <= 0.0 {
            return FittedText {
                lines,
                font_size,
                reductions,
                overflows: too_tall || too_wide,
            };
        }

        font_size = (font_size - options.step).max(options.min_size);
        reductions += 1;
    }
}

/// Greedy word wrap
///
/// Words join the current line while it stays within `max_width`. A word
/// wider than `max_width` on its own is never split: it gets a line to
/// itself. Explicit newlines always break.
pub fn wrap_words(text: &str, max_width: f64, width_of: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{current} {word}");
            if width_of(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_core::StandardFont;
    use pretty_assertions::assert_eq;

    /// Every character is exactly one font size wide
    struct Square;

    impl TextMeasure for Square {
        fn text_width(&self, text: &str, font_size: f32) -> f64 {
            text.chars().count() as f64 * font_size as f64
        }
    }

    fn rect(width: f64, height: f64) -> Rect {
        Rect::new(10.0, 20.0, width, height)
    }

    #[test]
    fn test_short_text_fits_at_max_size() {
        let fitted = fit_text("Pens", &rect(104.0, 24.0), &Square, &FitOptions::default());
        assert_eq!(fitted.lines, vec!["Pens"]);
        assert_eq!(fitted.font_size, 12.0);
        assert_eq!(fitted.reductions, 0);
        assert!(!fitted.overflows);
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let fitted = fit_text("   ", &rect(100.0, 20.0), &Square, &FitOptions::default());
        assert!(fitted.lines.is_empty());
        assert!(!fitted.overflows);
    }

    #[test]
    fn test_shrinks_until_it_fits() {
        // 8 chars need 8 * size <= 96 - 4  ->  size <= 11.5
        let fitted = fit_text("abcdefgh", &rect(96.0, 24.0), &Square, &FitOptions::default());
        assert_eq!(fitted.lines, vec!["abcdefgh"]);
        assert_eq!(fitted.font_size, 11.5);
        assert_eq!(fitted.reductions, 1);
    }

    #[test]
    fn test_wraps_then_shrinks_height() {
        // Two lines of "aa bb" at 10pt are 20pt tall; usable height 20
        let fitted = fit_text("aa bb", &rect(40.0, 24.0), &Square, &FitOptions::default());
        assert_eq!(fitted.lines, vec!["aa", "bb"]);
        assert_eq!(fitted.font_size, 10.0);
        assert!(!fitted.overflows);
    }

    #[test]
    fn test_terminates_at_floor_within_twelve_reductions() {
        let long = "word ".repeat(200);
        let fitted = fit_text(&long, &rect(50.0, 10.0), &Square, &FitOptions::default());
        assert_eq!(fitted.font_size, 6.0);
        assert_eq!(fitted.reductions, 12);
        assert!(fitted.overflows);
        assert!(!fitted.lines.is_empty());
    }

    #[test]
    fn test_non_empty_text_always_has_lines() {
        let texts = ["x", "a b c", "Supercalifragilisticexpialidocious", "12.50", "line\nbreak"];
        let rects = [rect(1.0, 1.0), rect(30.0, 12.0), rect(400.0, 40.0), rect(0.0, 0.0)];
        for text in texts {
            for r in &rects {
                let fitted = fit_text(text, r, &StandardFont::Helvetica, &FitOptions::default());
                assert!(!fitted.lines.is_empty(), "{text:?} in {r:?}");
                assert!(fitted.reductions <= 12);
                assert!(fitted.font_size >= 6.0);
            }
        }
    }

    #[test]
    fn test_over_wide_word_is_not_split() {
        // Accepted edge case: the long word keeps its own line and overflows
        let fitted = fit_text(
            "a Pneumonoultramicroscopic b",
            &rect(60.0, 100.0),
            &Square,
            &FitOptions::default(),
        );
        assert!(fitted.lines.contains(&"Pneumonoultramicroscopic".to_string()));
        assert_eq!(fitted.font_size, 6.0);
        assert!(fitted.overflows);
    }

    #[test]
    fn test_wrap_words_greedy() {
        let lines = wrap_words("one two three four", 9.0, |s| s.len() as f64);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert!(wrap_words("", 10.0, |s| s.len() as f64).is_empty());
        assert_eq!(
            wrap_words("a\n\nb", 10.0, |s| s.len() as f64),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_place_lines() {
        let fitted = FittedText {
            lines: vec!["one".to_string(), "two".to_string()],
            font_size: 10.0,
            reductions: 0,
            overflows: false,
        };
        let r = Rect::new(100.0, 200.0, 80.0, 30.0);

        let left = fitted.place(&r, Align::Left, 4.0);
        assert_eq!(left[0], PlacedLine { text: "one".into(), x: 102.0, y: 212.0 });
        assert_eq!(left[1].y, 222.0);

        assert_eq!(fitted.place(&r, Align::Center, 4.0)[0].x, 140.0);
        assert_eq!(fitted.place(&r, Align::Right, 4.0)[0].x, 178.0);
    }
}
