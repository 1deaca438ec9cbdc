use super::checker::extract_checker_play_decision;
use super::codec::{DecisionKind, PositionCodec};
use super::cube::extract_cube_decision;
use super::error::XgError;
use super::scanner::Scanner;
use super::types::GameRecord;

/// Marks the start of every embedded position identifier in a game document.
pub const DECISION_ANCHOR: &str = ">XGID=";

/// Splits a game body into decision segments, one per anchor, in document order.
///
/// Each segment runs from its anchor up to the next anchor or the end of the document.
pub struct DecisionSegments<'a> {
    scanner: Scanner<'a>,
    cursor: Option<usize>,
}

impl<'a> DecisionSegments<'a> {
    pub fn new(text: &'a str, from: usize) -> Self {
        let scanner = Scanner::new(text);
        Self {
            cursor: scanner.find(DECISION_ANCHOR, from),
            scanner,
        }
    }
}

impl<'a> Iterator for DecisionSegments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor?;
        let next = self
            .scanner
            .find(DECISION_ANCHOR, start + DECISION_ANCHOR.len());
        self.cursor = next;
        let end = next.unwrap_or(self.scanner.len());
        Some(&self.scanner.text()[start..end])
    }
}

/// Identifier text between the anchor's `>` and the next `<`, plus the offset after it.
pub fn raw_identifier(segment: &str) -> Result<(&str, usize), XgError> {
    let scanner = Scanner::new(segment);
    let field = scanner.until("position identifier", 1, &["<"])?;
    Ok((field.value, field.value_end))
}

/// Decode one segment and append the resulting decision to `game`.
pub fn dispatch_decision(
    segment: &str,
    game: &mut GameRecord,
    codec: &dyn PositionCodec,
) -> Result<(), XgError> {
    let (raw, identifier_end) = raw_identifier(segment)?;
    let position = codec.decode(raw)?;
    let move_number = game.last_move_number() + 1;

    if game.decision_count() == 0 && codec.is_starting_position(&position) {
        game.is_from_beginning = true;
    }

    match position.kind {
        DecisionKind::Cube => {
            let decision = extract_cube_decision(segment, identifier_end, position, move_number)?;
            game.cube_decisions.push(decision);
        }
        DecisionKind::CheckerPlay => {
            let decision = extract_checker_play_decision(position, move_number);
            game.checker_play_decisions.push(decision);
        }
    }
    Ok(())
}

pub fn extract_decisions(
    text: &str,
    body_start: usize,
    game: &mut GameRecord,
    codec: &dyn PositionCodec,
) -> Result<(), XgError> {
    for segment in DecisionSegments::new(text, body_start) {
        dispatch_decision(segment, game, codec)?;
    }
    Ok(())
}
