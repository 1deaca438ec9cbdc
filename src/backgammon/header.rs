//! Match summary (`game0.htm`) and per-game header extraction.

use super::decision::DECISION_ANCHOR;
use super::error::XgError;
use super::scanner::{Scanner, parse_number};
use super::types::MatchRecord;

const VS_TOKEN: &str = " vs. ";
const MATCH_LENGTH_MARKER: &str = " point match, ";
const UNLIMITED_MARKER: &str = ">Unlimited Game, ";
const MATCH_LENGTH_VOCABULARY: [&str; 2] = [MATCH_LENGTH_MARKER, UNLIMITED_MARKER];
const GAME_TITLE_OPEN: &str = "<title>Game ";
const GAME_TITLE_CLOSE: &str = "</title>";
const SCORE_MARKER: &str = ", Score is";
const BOTTOM_SCORE_TERMINATORS: [&str; 1] = [","];
const TOP_SCORE_TERMINATORS: [&str; 2] = [" ", "<"];
const CRAWFORD_MARKER: &str = " Crawford<";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchHeader {
    pub bottom_player_name: String,
    pub top_player_name: String,
    pub match_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameHeader {
    pub game_number: u32,
    pub bottom_player_needs: i32,
    pub top_player_needs: i32,
    pub is_crawford: bool,
    /// Offset where decision scanning may begin.
    pub body_start: usize,
}

/// Points still needed: fixed-length matches count down, unlimited sessions count up.
pub fn needs(match_length: u32, raw_score: i32) -> Result<i32, XgError> {
    if match_length == 0 {
        return Ok(raw_score);
    }
    i32::try_from(match_length)
        .ok()
        .and_then(|length| length.checked_sub(raw_score))
        .ok_or_else(|| XgError::numeric("player needs", &raw_score.to_string()))
}

/// A raw score is never negative and stays below the length of a fixed-length match.
fn check_score(field: &'static str, match_length: u32, raw_score: i32) -> Result<(), XgError> {
    let in_range = match u32::try_from(raw_score) {
        Ok(score) => match_length == 0 || score < match_length,
        Err(_) => false,
    };
    if in_range {
        Ok(())
    } else if match_length == 0 {
        Err(XgError::integrity(field, "a non-negative score", raw_score))
    } else {
        Err(XgError::integrity(
            field,
            format!("a score from 0 to {}", match_length - 1),
            raw_score,
        ))
    }
}

pub fn parse_match_header(text: &str) -> Result<MatchHeader, XgError> {
    let scanner = Scanner::new(text);
    let ((bottom_player_name, top_player_name), next) = player_names(&scanner)?;
    let (match_length, _) = match_length(&scanner, next, true)?;

    Ok(MatchHeader {
        bottom_player_name,
        top_player_name,
        match_length,
    })
}

fn player_names(scanner: &Scanner<'_>) -> Result<((String, String), usize), XgError> {
    let vs = scanner
        .find(VS_TOKEN, 0)
        .ok_or_else(|| XgError::format("player names", &[VS_TOKEN]))?;
    let bottom = scanner.preceding_cell("bottom player name", '>', vs)?;

    let top_start = vs + VS_TOKEN.len();
    let top = scanner.until("top player name", top_start, &["<"])?;

    if bottom.trim().is_empty() {
        return Err(XgError::format("bottom player name", &[VS_TOKEN]));
    }
    if top.value.trim().is_empty() {
        return Err(XgError::format("top player name", &[VS_TOKEN]));
    }

    Ok(((bottom.to_string(), top.value.to_string()), top.value_end))
}

/// Locate the match length from `from`. With `unlimited_anywhere`, the unlimited-session
/// marker is accepted at any position in the document.
fn match_length(
    scanner: &Scanner<'_>,
    from: usize,
    unlimited_anywhere: bool,
) -> Result<(u32, usize), XgError> {
    if let Some(marker) = scanner.find(MATCH_LENGTH_MARKER, from) {
        let raw = scanner.preceding_cell("match length", '>', marker)?;
        let length = parse_number::<u32>("match length", raw)?;
        if i32::try_from(length).is_err() {
            return Err(XgError::numeric("match length", raw));
        }
        return Ok((length, marker + MATCH_LENGTH_MARKER.len()));
    }

    let unlimited_from = if unlimited_anywhere { 0 } else { from };
    match scanner.find(UNLIMITED_MARKER, unlimited_from) {
        Some(marker) => Ok((0, (marker + UNLIMITED_MARKER.len()).max(from))),
        None => Err(XgError::format("match length", &MATCH_LENGTH_VOCABULARY)),
    }
}

pub fn parse_game_header(
    text: &str,
    expected_game_number: u32,
    match_record: &MatchRecord,
) -> Result<GameHeader, XgError> {
    let scanner = Scanner::new(text);

    let (game_number, next) = game_number(&scanner)?;
    if game_number != expected_game_number {
        return Err(XgError::integrity(
            "game number",
            expected_game_number,
            game_number,
        ));
    }

    let (length, next) = match_length(&scanner, next, false)?;
    if length != match_record.match_length {
        return Err(XgError::integrity(
            "match length",
            match_record.match_length,
            length,
        ));
    }

    let ((bottom_score, top_score), next) = raw_scores(&scanner, match_record, next)?;
    check_score("bottom player score", length, bottom_score)?;
    check_score("top player score", length, top_score)?;
    let (is_crawford, body_start) = crawford(&scanner, next);

    Ok(GameHeader {
        game_number,
        bottom_player_needs: needs(length, bottom_score)?,
        top_player_needs: needs(length, top_score)?,
        is_crawford,
        body_start,
    })
}

fn game_number(scanner: &Scanner<'_>) -> Result<(u32, usize), XgError> {
    let field = scanner.field("game number", &[GAME_TITLE_OPEN], &[GAME_TITLE_CLOSE], 0)?;
    let number = parse_number::<u32>("game number", field.value)?;
    Ok((number, field.next))
}

fn raw_scores(
    scanner: &Scanner<'_>,
    match_record: &MatchRecord,
    from: usize,
) -> Result<((i32, i32), usize), XgError> {
    let score = scanner.expect_first_of("score", &[SCORE_MARKER], from)?;

    let (bottom, next) = player_score(
        scanner,
        "bottom player score",
        &match_record.bottom_player_name,
        &BOTTOM_SCORE_TERMINATORS,
        score.end,
    )?;
    let (top, next) = player_score(
        scanner,
        "top player score",
        &match_record.top_player_name,
        &TOP_SCORE_TERMINATORS,
        next,
    )?;

    Ok(((bottom, top), next))
}

fn player_score(
    scanner: &Scanner<'_>,
    field: &'static str,
    player_name: &str,
    terminators: &[&'static str],
    from: usize,
) -> Result<(i32, usize), XgError> {
    let token = format!("/> {player_name}: ");
    let start = scanner
        .find(&token, from)
        .ok_or_else(|| XgError::format(field, &["/> {player}: "]))?;
    let value = scanner.until(field, start + token.len(), terminators)?;
    let score = parse_number::<i32>(field, value.value)?;
    Ok((score, value.value_end))
}

/// The Crawford marker only counts inside the header, before the first decision.
fn crawford(scanner: &Scanner<'_>, from: usize) -> (bool, usize) {
    let header_end = scanner
        .find(DECISION_ANCHOR, from)
        .unwrap_or(scanner.len());
    match scanner.find(CRAWFORD_MARKER, from) {
        Some(idx) if idx < header_end => (true, idx + CRAWFORD_MARKER.len()),
        _ => (false, from),
    }
}
