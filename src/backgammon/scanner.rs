//! Cursor-based token scanning over an immutable document.
//!
//! XG exports have no grammar worth parsing: every value is found by locating a marker and
//! slicing up to a terminator. [`Scanner`] never mutates a shared offset; each step takes the
//! offset to start from and reports where the next step may start.

use super::error::XgError;
use std::str::FromStr;

/// A matched marker: byte range of the marker and which candidate matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub start: usize,
    pub end: usize,
    pub candidate: usize,
}

/// A value sliced out between a start marker and a terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub value: &'a str,
    /// Offset of the terminator that ended the value.
    pub value_end: usize,
    /// Offset just past that terminator.
    pub next: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    text: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn find(&self, token: &str, from: usize) -> Option<usize> {
        self.text
            .get(from..)
            .and_then(|rest| rest.find(token))
            .map(|idx| idx + from)
    }

    /// Last occurrence of `ch` strictly before `before`.
    pub fn rfind_char(&self, ch: char, before: usize) -> Option<usize> {
        self.text.get(..before).and_then(|head| head.rfind(ch))
    }

    /// Ordered vocabulary lookup: the first candidate (in list order) present after `from` wins.
    pub fn find_first_of(&self, candidates: &[&str], from: usize) -> Option<Hit> {
        candidates
            .iter()
            .enumerate()
            .find_map(|(candidate, token)| {
                self.find(token, from).map(|start| Hit {
                    start,
                    end: start + token.len(),
                    candidate,
                })
            })
    }

    /// Positional lookup: whichever candidate occurs earliest after `from` wins.
    pub fn find_earliest(&self, candidates: &[&str], from: usize) -> Option<Hit> {
        candidates
            .iter()
            .enumerate()
            .filter_map(|(candidate, token)| {
                self.find(token, from).map(|start| Hit {
                    start,
                    end: start + token.len(),
                    candidate,
                })
            })
            .min_by_key(|hit| (hit.start, hit.candidate))
    }

    pub fn expect_first_of(
        &self,
        field: &'static str,
        candidates: &[&'static str],
        from: usize,
    ) -> Result<Hit, XgError> {
        self.find_first_of(candidates, from)
            .ok_or_else(|| XgError::format(field, candidates))
    }

    pub fn expect_earliest(
        &self,
        field: &'static str,
        candidates: &[&'static str],
        from: usize,
    ) -> Result<Hit, XgError> {
        self.find_earliest(candidates, from)
            .ok_or_else(|| XgError::format(field, candidates))
    }

    /// Slice from `start` up to the earliest of `terminators`.
    pub fn until(
        &self,
        field: &'static str,
        start: usize,
        terminators: &[&'static str],
    ) -> Result<Field<'a>, XgError> {
        let end = self.expect_earliest(field, terminators, start)?;
        Ok(Field {
            value: &self.text[start..end.start],
            value_end: end.start,
            next: end.end,
        })
    }

    /// Locate one of `starts` (ordered vocabulary) after `from`, then slice up to the earliest
    /// of `terminators`.
    pub fn field(
        &self,
        field: &'static str,
        starts: &[&'static str],
        terminators: &[&'static str],
        from: usize,
    ) -> Result<Field<'a>, XgError> {
        let start = self.expect_first_of(field, starts, from)?;
        self.until(field, start.end, terminators)
    }

    /// Like [`Scanner::field`] but `None` when no start marker is present.
    pub fn optional_field(
        &self,
        field: &'static str,
        starts: &[&'static str],
        terminators: &[&'static str],
        from: usize,
    ) -> Result<Option<Field<'a>>, XgError> {
        match self.find_first_of(starts, from) {
            Some(start) => self.until(field, start.end, terminators).map(Some),
            None => Ok(None),
        }
    }

    /// Text between the last `open` before `marker_start` and `marker_start`.
    pub fn preceding_cell(
        &self,
        field: &'static str,
        open: char,
        marker_start: usize,
    ) -> Result<&'a str, XgError> {
        let open_idx = self
            .rfind_char(open, marker_start)
            .ok_or_else(|| XgError::format(field, &[">"]))?;
        Ok(&self.text[open_idx + open.len_utf8()..marker_start])
    }
}

/// Strict numeric parse of a sliced field; surrounding whitespace is the only slack.
pub fn parse_number<T: FromStr>(field: &'static str, text: &str) -> Result<T, XgError> {
    text.trim()
        .parse::<T>()
        .map_err(|_| XgError::numeric(field, text))
}

/// Parse a percentage such as `"12.5"` into a fraction (`0.125`).
pub fn parse_percentage(field: &'static str, text: &str) -> Result<f32, XgError> {
    parse_number::<f32>(field, text).map(|pct| pct / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL_CLOSE: &str = "</td>";

    #[test]
    fn test_find_from_offset_skips_earlier_matches() {
        let scanner = Scanner::new("a>XGID=1<b>XGID=2<");
        assert_eq!(scanner.find(">XGID=", 0), Some(1));
        assert_eq!(scanner.find(">XGID=", 2), Some(10));
        assert_eq!(scanner.find(">XGID=", 11), None);
        assert_eq!(scanner.find(">XGID=", 500), None);
    }

    #[test]
    fn test_find_first_of_prefers_list_order() {
        let scanner = Scanner::new("No redouble: 1 No double: 2");
        let hit = scanner
            .find_first_of(&["No double:", "No redouble:"], 0)
            .unwrap();
        assert_eq!(hit.candidate, 0);
        assert_eq!(hit.start, 15);
    }

    #[test]
    fn test_find_earliest_prefers_position() {
        let scanner = Scanner::new("0.250 (+0.1)</td>");
        let hit = scanner.find_earliest(&[CELL_CLOSE, " ("], 0).unwrap();
        assert_eq!(hit.candidate, 1);
        assert_eq!(hit.start, 5);
    }

    #[test]
    fn test_field_falls_back_to_second_vocabulary() {
        let scanner = Scanner::new("<td>No redouble:</td><td>+0.412</td>");
        let field = scanner
            .field(
                "no double equity",
                &["No double:</td><td>", "No redouble:</td><td>"],
                &[CELL_CLOSE, " ("],
                0,
            )
            .unwrap();
        assert_eq!(field.value, "+0.412");
        assert_eq!(field.next, scanner.len());
    }

    #[test]
    fn test_field_missing_start_is_format_error() {
        let scanner = Scanner::new("<td>nothing here</td>");
        let err = scanner
            .field("analysis depth", &[">Analyzed in "], &[CELL_CLOSE], 0)
            .unwrap_err();
        assert!(matches!(err, XgError::Format { field: "analysis depth", .. }));
    }

    #[test]
    fn test_optional_field_absent_is_none() {
        let scanner = Scanner::new("Games rolled");
        let field = scanner
            .optional_field("dice seed", &["Dice Seed:"], &["<"], 0)
            .unwrap();
        assert!(field.is_none());
    }

    #[test]
    fn test_preceding_cell_slices_back_to_markup() {
        let text = "<td>Alice vs. Bob</td>";
        let scanner = Scanner::new(text);
        let vs = scanner.find(" vs. ", 0).unwrap();
        assert_eq!(scanner.preceding_cell("bottom", '>', vs).unwrap(), "Alice");
    }

    #[test]
    fn test_parse_number_is_strict() {
        assert_eq!(parse_number::<u32>("length", " 7 ").unwrap(), 7);
        assert!(parse_number::<u32>("length", "7a").is_err());
        assert_eq!(parse_number::<f32>("equity", "+0.250").unwrap(), 0.25);
        assert!((parse_percentage("threshold", "12.5").unwrap() - 0.125).abs() < 1e-6);
    }
}
