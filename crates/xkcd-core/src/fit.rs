//! Search for the largest legible rendering of a text inside a box.
//!
//! The search first picks a word wrap whose rendered shape is at least as wide
//! as the box, then grows the font size until the wrapped text overflows.

use thiserror::Error;

/// Font growth factor between two attempted sizes.
pub const DEFAULT_GROWTH: f64 = 1.2;

/// Target area in pixels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BoxSize {
    pub width: u32,
    pub height: u32,
}

impl BoxSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Measured extent of a (possibly multi-line) text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FontMetrics {
    pub width: u32,
    pub height: u32,
    /// Distance from the top of the first line to its baseline.
    pub character_height: u32,
}

impl FontMetrics {
    fn ratio(self) -> f64 {
        if self.height == 0 {
            return f64::INFINITY;
        }
        f64::from(self.width) / f64::from(self.height)
    }

    fn fits(self, bounds: BoxSize) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }
}

/// Result of a successful fit search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextFit {
    pub lines: Vec<String>,
    pub font_size: u32,
    pub width: u32,
    pub height: u32,
    pub character_height: u32,
}

/// Measures text; lines are separated by `\n`.
pub trait TextMetrics {
    fn measure(&self, text: &str, font_size: u32) -> FontMetrics;
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum FitError {
    #[error("text is empty")]
    EmptyText,
    #[error("target box {width}x{height} has no area")]
    DegenerateBox { width: u32, height: u32 },
    #[error("no font size from {start} fits the target box")]
    NoFittingSize { start: u32 },
}

/// Greedy word wrap at `width` characters. Words longer than `width` get a
/// line of their own instead of being split.
pub fn wrap(words: &[&str], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in words {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(core::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wraps of a text with pairwise distinct line counts, from most to fewest
/// lines. See [`unique_wraps`].
#[derive(Clone, Debug)]
pub struct UniqueWraps<'a> {
    words: Vec<&'a str>,
    width: usize,
    max_width: usize,
    last_count: Option<usize>,
}

/// Tries every wrap width from 1 to the length of `text` and yields a wrap
/// only when its line count was not seen before.
pub fn unique_wraps(text: &str) -> UniqueWraps<'_> {
    UniqueWraps {
        words: text.split_whitespace().collect(),
        width: 1,
        max_width: text.chars().count(),
        last_count: None,
    }
}

impl Iterator for UniqueWraps<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        // Line count never grows with the width, so comparing with the last
        // emitted count is enough to keep counts distinct.
        while self.width <= self.max_width {
            let lines = wrap(&self.words, self.width);
            self.width += 1;
            if self.last_count != Some(lines.len()) {
                self.last_count = Some(lines.len());
                return Some(lines);
            }
        }
        None
    }
}

/// Picks the first wrap whose rendered aspect ratio reaches the box ratio.
///
/// Falls back to the single-line wrap when none does. This is a heuristic:
/// very tall boxes may end up with a single long line.
pub fn best_wrap<M>(
    metrics: &M,
    bounds: BoxSize,
    text: &str,
    font_size: u32,
) -> Result<Vec<String>, FitError>
where
    M: TextMetrics + ?Sized,
{
    if bounds.is_degenerate() {
        return Err(FitError::DegenerateBox {
            width: bounds.width,
            height: bounds.height,
        });
    }

    let expected = bounds.ratio();
    let mut chosen = None;
    for lines in unique_wraps(text) {
        let rendered = metrics.measure(&lines.join("\n"), font_size);
        let wide_enough = rendered.ratio() / expected >= 1.0;
        chosen = Some(lines);
        if wide_enough {
            break;
        }
    }
    chosen.ok_or(FitError::EmptyText)
}

/// Strictly increasing font sizes below `stop`.
///
/// The accumulator is fractional; each step multiplies it by the growth factor
/// and adds one instead when the integer part would not change.
#[derive(Clone, Debug)]
pub struct FontSizes {
    current: f64,
    stop: f64,
    factor: f64,
}

pub fn font_sizes(start: u32, stop: u32, factor: f64) -> FontSizes {
    FontSizes {
        current: f64::from(start),
        stop: f64::from(stop),
        factor,
    }
}

impl Iterator for FontSizes {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.current >= self.stop {
            return None;
        }
        let size = self.current.trunc();
        let mut next = self.current * self.factor;
        if next.trunc() <= size {
            next = self.current + 1.0;
        }
        self.current = next;
        Some(size as u32)
    }
}

/// Finds the largest font size at which `text` fits `bounds`.
///
/// Sizes start at `start_size` and stay below the box height. The first size
/// that overflows ends the search.
pub fn fit_text<M>(
    metrics: &M,
    text: &str,
    bounds: BoxSize,
    start_size: u32,
) -> Result<TextFit, FitError>
where
    M: TextMetrics + ?Sized,
{
    if text.trim().is_empty() {
        return Err(FitError::EmptyText);
    }
    let lines = best_wrap(metrics, bounds, text, start_size)?;
    let wrapped = lines.join("\n");

    let mut best: Option<(u32, FontMetrics)> = None;
    for font_size in font_sizes(start_size, bounds.height, DEFAULT_GROWTH) {
        let measured = metrics.measure(&wrapped, font_size);
        if !measured.fits(bounds) {
            break;
        }
        best = Some((font_size, measured));
    }

    let (font_size, measured) = best.ok_or(FitError::NoFittingSize { start: start_size })?;
    Ok(TextFit {
        lines,
        font_size,
        width: measured.width,
        height: measured.height,
        character_height: measured.character_height,
    })
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    const PYTHON: &str = "Python! I learned it last night! Everything is so simple!";

    /// Every glyph is half the font size wide, every line one font size high.
    struct MonoMetrics;

    impl TextMetrics for MonoMetrics {
        fn measure(&self, text: &str, font_size: u32) -> FontMetrics {
            let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
            let lines = text.lines().count() as u32;
            FontMetrics {
                width: longest * font_size / 2,
                height: lines * font_size,
                character_height: font_size * 3 / 4,
            }
        }
    }

    struct ScriptedMetrics<'a> {
        answers: &'a [FontMetrics],
        cursor: Cell<usize>,
    }

    impl<'a> ScriptedMetrics<'a> {
        fn new(answers: &'a [FontMetrics]) -> Self {
            Self {
                answers,
                cursor: Cell::new(0),
            }
        }
    }

    impl TextMetrics for ScriptedMetrics<'_> {
        fn measure(&self, _text: &str, _font_size: u32) -> FontMetrics {
            let index = self.cursor.get();
            self.cursor.set(index + 1);
            self.answers[index]
        }
    }

    const fn metrics(width: u32, height: u32, character_height: u32) -> FontMetrics {
        FontMetrics {
            width,
            height,
            character_height,
        }
    }

    #[test]
    fn unique_wraps_of_known_sentence() {
        let wraps: Vec<Vec<String>> = unique_wraps(PYTHON).collect();
        let expected: Vec<Vec<&str>> = vec![
            vec![
                "Python!", "I", "learned", "it", "last", "night!", "Everything", "is", "so",
                "simple!",
            ],
            vec![
                "Python!", "I", "learned", "it", "last", "night!", "Everything", "is so",
                "simple!",
            ],
            vec![
                "Python!", "I", "learned", "it last", "night!", "Everything", "is so", "simple!",
            ],
            vec![
                "Python! I", "learned", "it last", "night!", "Everything", "is so", "simple!",
            ],
            vec![
                "Python! I", "learned it", "last night!", "Everything", "is so", "simple!",
            ],
            vec![
                "Python! I", "learned it", "last night!", "Everything is", "so simple!",
            ],
            vec!["Python! I learned", "it last night!", "Everything is so", "simple!"],
            vec!["Python! I learned it", "last night! Everything", "is so simple!"],
            vec!["Python! I learned it last", "night! Everything is so simple!"],
            vec![PYTHON],
        ];
        assert_eq!(wraps, expected);
    }

    #[test]
    fn wraps_keep_words_whole_and_in_order() {
        let words: Vec<&str> = PYTHON.split_whitespace().collect();
        let mut previous = usize::MAX;
        for lines in unique_wraps(PYTHON) {
            assert!(lines.len() < previous);
            previous = lines.len();
            let rejoined = lines.join(" ");
            assert_eq!(rejoined.split_whitespace().collect::<Vec<_>>(), words);
        }
    }

    #[test]
    fn single_word_has_one_wrap() {
        let wraps: Vec<_> = unique_wraps("Python!").collect();
        assert_eq!(wraps, vec![vec!["Python!".to_string()]]);
    }

    #[test]
    fn font_sizes_grow_strictly() {
        assert_eq!(
            font_sizes(1, 10, 1.0).collect::<Vec<_>>(),
            [1, 2, 3, 4, 5, 6, 7, 8, 9]
        );
        assert_eq!(
            font_sizes(1, 15, 1.5).collect::<Vec<_>>(),
            [1, 2, 3, 4, 6, 10]
        );
        assert_eq!(font_sizes(2, 20, 2.0).collect::<Vec<_>>(), [2, 4, 8, 16]);
        assert_eq!(font_sizes(12, 12, 1.2).count(), 0);
    }

    #[test]
    fn best_wrap_takes_first_wide_enough_variant() {
        let mut answers = vec![metrics(1, 2, 0); 7];
        answers.push(metrics(1, 1, 0));
        let scripted = ScriptedMetrics::new(&answers);

        let lines = best_wrap(&scripted, BoxSize::new(1, 1), PYTHON, 12).unwrap();
        assert_eq!(
            lines,
            ["Python! I learned it", "last night! Everything", "is so simple!"]
        );
    }

    #[test]
    fn best_wrap_falls_back_to_single_line() {
        let answers = vec![metrics(1, 100, 0); 10];
        let scripted = ScriptedMetrics::new(&answers);

        let lines = best_wrap(&scripted, BoxSize::new(10, 1), PYTHON, 12).unwrap();
        assert_eq!(lines, [PYTHON]);
    }

    #[test]
    fn zero_height_measurement_counts_as_wide() {
        let answers = [metrics(0, 0, 0)];
        let scripted = ScriptedMetrics::new(&answers);
        let lines = best_wrap(&scripted, BoxSize::new(4, 1), "a b", 12).unwrap();
        assert_eq!(lines, ["a", "b"]);
    }

    #[test]
    fn keeps_largest_size_before_overflow() {
        let answers = [
            // wrap selection
            metrics(1, 1, 1),
            // sizes 1, 2, 3
            metrics(1, 1, 1),
            metrics(2, 2, 2),
            metrics(3, 3, 3),
        ];
        let scripted = ScriptedMetrics::new(&answers);

        let fit = fit_text(&scripted, "a", BoxSize::new(4, 4), 1).unwrap();
        assert_eq!(
            fit,
            TextFit {
                lines: vec!["a".to_string()],
                font_size: 3,
                width: 3,
                height: 3,
                character_height: 3,
            }
        );
    }

    #[test]
    fn fit_never_exceeds_box_and_next_size_overflows() {
        let bounds = BoxSize::new(390, 290);
        let fit = fit_text(&MonoMetrics, PYTHON, bounds, 12).unwrap();
        assert!(fit.width <= bounds.width && fit.height <= bounds.height);

        let next = font_sizes(12, bounds.height, DEFAULT_GROWTH)
            .find(|size| *size > fit.font_size);
        if let Some(next) = next {
            let bigger = MonoMetrics.measure(&fit.lines.join("\n"), next);
            assert!(bigger.width > bounds.width || bigger.height > bounds.height);
        }
    }

    #[test]
    fn too_small_box_fails_instead_of_overflowing() {
        assert_eq!(
            fit_text(&MonoMetrics, "Everything", BoxSize::new(8, 20), 12),
            Err(FitError::NoFittingSize { start: 12 })
        );
    }

    #[test]
    fn rejects_empty_text_and_degenerate_box() {
        assert_eq!(
            fit_text(&MonoMetrics, "  ", BoxSize::new(10, 10), 1),
            Err(FitError::EmptyText)
        );
        assert_eq!(
            fit_text(&MonoMetrics, "hi", BoxSize::new(10, 0), 1),
            Err(FitError::DegenerateBox {
                width: 10,
                height: 0
            })
        );
    }
}
