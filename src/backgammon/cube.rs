//! Cube decision extraction.
//!
//! The steps run in document order over one decision segment. Each one starts where the
//! previous one stopped, except the occurred-action lookup, which compares the position of
//! the `played` marker against the ends of the two equity fields.

use super::codec::DecodedPosition;
use super::error::XgError;
use super::rollout::extract_rollout;
use super::scanner::{Scanner, parse_number, parse_percentage};
use super::types::CubeDecisionRecord;

const CELL_CLOSE: &str = "</td>";
const ANALYSIS_DEPTH_LABELS: [&str; 1] = [">Analyzed in "];
const EQUITY_TERMINATORS: [&str; 2] = [CELL_CLOSE, " ("];
const NO_DOUBLE_LABELS: [&str; 2] = ["No double:</td><td>", "No redouble:</td><td>"];
const DOUBLE_TAKE_LABELS: [&str; 2] = ["Double/Take:</td><td>", "Redouble/Take:</td><td>"];
const PLAYED_MARKER: &str = "played";
const RESIGNATION_MARKERS: [&str; 3] = ["resigns", "Resigns", "resigned"];
const ACTION_VOCABULARY: [&str; 4] = [PLAYED_MARKER, "resigns", "Resigns", "resigned"];
const WRONG_PERCENTAGE_MARKER: &str = ">Percentage of wrong ";
const WRONG_THRESHOLD_LABELS: [&str; 2] = [
    "pass needed to make the double decision right: ",
    "take needed to make the double decision right: ",
];
const PERCENT_TERMINATORS: [&str; 1] = ["%"];

/// Analysis depth label that carries a rollout details section.
pub const ROLLOUT_DEPTH: &str = "Rollout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WrongThreshold {
    Pass,
    Take,
}

/// What actually happened at the cube: `(did_player_double, did_player_take)`.
type OccurredAction = (bool, bool);

pub fn extract_cube_decision(
    segment: &str,
    identifier_end: usize,
    position: DecodedPosition,
    move_number: u32,
) -> Result<CubeDecisionRecord, XgError> {
    let scanner = Scanner::new(segment);

    let (analysis_depth, next) = analysis_depth(&scanner, identifier_end)?;
    let (no_double_equity, no_double_end) =
        equity(&scanner, "no double equity", &NO_DOUBLE_LABELS, next)?;
    let (double_take_equity, double_take_end) =
        equity(&scanner, "double/take equity", &DOUBLE_TAKE_LABELS, no_double_end)?;
    let (did_player_double, did_player_take) =
        occurred_action(&scanner, identifier_end, no_double_end, double_take_end)?;

    let mut decision = CubeDecisionRecord {
        xgid: position.xgid,
        move_number,
        no_double_equity,
        double_take_equity,
        analysis_depth,
        did_player_double,
        did_player_take,
        ..Default::default()
    };

    let (threshold, next) = error_threshold(&scanner, double_take_end)?;
    match threshold {
        Some((WrongThreshold::Pass, fraction)) => decision.wrong_pass_threshold = fraction,
        Some((WrongThreshold::Take, fraction)) => decision.wrong_take_threshold = fraction,
        None => {}
    }

    if decision.analysis_depth == ROLLOUT_DEPTH {
        let (rollout, _) = extract_rollout(&scanner, next)?;
        decision.rollout = Some(rollout);
    }

    Ok(decision)
}

fn analysis_depth(scanner: &Scanner<'_>, from: usize) -> Result<(String, usize), XgError> {
    let field = scanner.field("analysis depth", &ANALYSIS_DEPTH_LABELS, &[CELL_CLOSE], from)?;
    Ok((field.value.trim().to_string(), field.next))
}

/// Equity cell under one of `labels`. The value may be followed by a parenthesized
/// difference; the step always ends after the cell's closing tag.
fn equity(
    scanner: &Scanner<'_>,
    field: &'static str,
    labels: &[&'static str],
    from: usize,
) -> Result<(f32, usize), XgError> {
    let value = scanner.field(field, labels, &EQUITY_TERMINATORS, from)?;
    let equity = parse_number::<f32>(field, value.value)?;
    let close = scanner
        .find(CELL_CLOSE, value.value_end)
        .ok_or_else(|| XgError::format(field, &[CELL_CLOSE]))?;
    Ok((equity, close + CELL_CLOSE.len()))
}

fn occurred_action(
    scanner: &Scanner<'_>,
    from: usize,
    no_double_end: usize,
    double_take_end: usize,
) -> Result<OccurredAction, XgError> {
    match scanner.find(PLAYED_MARKER, from) {
        Some(idx) if idx < no_double_end => Ok((false, false)),
        Some(idx) if idx < double_take_end => Ok((true, true)),
        Some(_) => Ok((true, false)),
        None if scanner.find_first_of(&RESIGNATION_MARKERS, from).is_some() => Ok((false, false)),
        None => Err(XgError::format("played action", &ACTION_VOCABULARY)),
    }
}

fn error_threshold(
    scanner: &Scanner<'_>,
    from: usize,
) -> Result<(Option<(WrongThreshold, f32)>, usize), XgError> {
    let Some(marker) = scanner.find(WRONG_PERCENTAGE_MARKER, from) else {
        return Ok((None, from));
    };

    let label = scanner.expect_earliest(
        "wrong threshold",
        &WRONG_THRESHOLD_LABELS,
        marker + WRONG_PERCENTAGE_MARKER.len(),
    )?;
    let value = scanner.until("wrong threshold", label.end, &PERCENT_TERMINATORS)?;
    let fraction = parse_percentage("wrong threshold", value.value)?;
    let kind = if label.candidate == 0 {
        WrongThreshold::Pass
    } else {
        WrongThreshold::Take
    };
    Ok((Some((kind, fraction)), value.next))
}
