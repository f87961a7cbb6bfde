//! Greedy word wrap against measured widths.

use crate::fonts::FontId;
use crate::measure::TextMeasurer;
use crate::shaping::shape;

/// One wrapped line.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedLine {
    /// Logical-order text, words joined by single spaces.
    pub logical: String,
    /// Shaped display-order text, ready to draw.
    pub display: String,
    /// Measured width of `display`.
    pub width: f32,
}

/// Word wrapper bound to one measurer.
#[derive(Clone, Copy)]
pub struct LineWrapper<'a> {
    measurer: &'a dyn TextMeasurer,
}

impl core::fmt::Debug for LineWrapper<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LineWrapper").finish_non_exhaustive()
    }
}

impl<'a> LineWrapper<'a> {
    pub fn new(measurer: &'a dyn TextMeasurer) -> Self {
        Self { measurer }
    }

    /// Wrap `text` into display-order lines no wider than `max_width`.
    ///
    /// A single word wider than `max_width` is emitted alone and overflows.
    pub fn wrap(
        &self,
        text: &str,
        max_width: f32,
        font: FontId,
        size_pt: f32,
        rtl: bool,
    ) -> Vec<String> {
        self.wrap_measured(text, max_width, font, size_pt, rtl)
            .into_iter()
            .map(|line| line.display)
            .collect()
    }

    /// Like [`wrap`](Self::wrap), keeping logical text and widths.
    pub fn wrap_measured(
        &self,
        text: &str,
        max_width: f32,
        font: FontId,
        size_pt: f32,
        rtl: bool,
    ) -> Vec<WrappedLine> {
        let mut lines = Vec::new();
        let mut current: Option<WrappedLine> = None;

        for word in text.split_whitespace() {
            let candidate = match &current {
                Some(line) => format!("{} {}", line.logical, word),
                None => word.to_string(),
            };
            let display = shape(&candidate, rtl);
            let width = self.measurer.measure_text(&display, font, size_pt);

            if width <= max_width || current.is_none() {
                current = Some(WrappedLine {
                    logical: candidate,
                    display,
                    width,
                });
                continue;
            }

            if let Some(done) = current.take() {
                lines.push(done);
            }
            let display = shape(word, rtl);
            let width = self.measurer.measure_text(&display, font, size_pt);
            current = Some(WrappedLine {
                logical: word.to_string(),
                display,
                width,
            });
        }

        lines.extend(current);
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One page unit per character.
    struct CharCount;

    impl TextMeasurer for CharCount {
        fn measure_text(&self, text: &str, _font: FontId, _size_pt: f32) -> f32 {
            text.chars().count() as f32
        }
    }

    fn wrap(text: &str, max_width: f32) -> Vec<String> {
        LineWrapper::new(&CharCount).wrap(text, max_width, FontId::SansRegular, 11.0, false)
    }

    #[test]
    fn breaks_greedily() {
        assert_eq!(
            wrap("the cat sat on the mat", 7.0),
            vec!["the cat", "sat on", "the mat"]
        );
    }

    #[test]
    fn long_word_overflows_on_its_own_line() {
        assert_eq!(
            wrap("a extraordinarily b", 5.0),
            vec!["a", "extraordinarily", "b"]
        );
    }

    #[test]
    fn empty_and_blank_input_yield_no_lines() {
        assert!(wrap("", 10.0).is_empty());
        assert!(wrap(" \t\n ", 10.0).is_empty());
    }

    #[test]
    fn measured_lines_carry_logical_text() {
        let lines = LineWrapper::new(&CharCount).wrap_measured(
            "\u{0628}\u{0628} \u{0628}",
            2.0,
            FontId::NaskhRegular,
            11.0,
            true,
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].logical, "\u{0628}\u{0628}");
        assert_eq!(lines[0].display, "\u{FE90}\u{FE91}");
        assert_eq!(lines[1].width, 1.0);
    }
}
