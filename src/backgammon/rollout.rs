use super::error::XgError;
use super::scanner::{Scanner, parse_number, parse_percentage};
use super::types::RolloutDetailRecord;

const ROLLOUT_SECTION: [&str; 1] = ["Rollout details"];
const GAMES_ROLLED: [&str; 1] = ["Games rolled"];
const DICE_SEED: [&str; 1] = ["Dice Seed:"];
const SEED_TERMINATORS: [&str; 2] = ["<", ","];
// Longer label first: the bare form is a suffix of it
const ROLLOUT_DEPTH_LABELS: [&str; 2] = ["Moves and cube decisions:", "cube decisions:"];
const DOUBLE_CONFIDENCE: [&str; 1] = ["Double Decision confidence:"];
const TAKE_CONFIDENCE: [&str; 1] = ["Take Decision confidence:"];
const PERCENT_TERMINATORS: [&str; 1] = ["%"];

/// Rollout statistics behind a cube decision analysed by rollout.
///
/// Optional fields are present only when their marker is; a missing `Dice Seed:` yields
/// `None`, never 0.
pub fn extract_rollout(
    scanner: &Scanner<'_>,
    from: usize,
) -> Result<(RolloutDetailRecord, usize), XgError> {
    let section = scanner.expect_first_of("rollout details", &ROLLOUT_SECTION, from)?;

    let (trials, mut cursor) = trials(scanner, section.end)?;

    let seed = scanner.optional_field("dice seed", &DICE_SEED, &SEED_TERMINATORS, cursor)?;
    let dice_seed = match seed {
        Some(field) => {
            cursor = field.value_end;
            Some(parse_number::<i64>("dice seed", field.value)?)
        }
        None => None,
    };

    let depth = scanner.field("rollout analysis depth", &ROLLOUT_DEPTH_LABELS, &["<"], cursor)?;
    cursor = depth.value_end;

    let (double_decision_confidence, cursor) =
        confidence(scanner, "double decision confidence", &DOUBLE_CONFIDENCE, cursor)?;
    let (take_decision_confidence, cursor) =
        confidence(scanner, "take decision confidence", &TAKE_CONFIDENCE, cursor)?;

    Ok((
        RolloutDetailRecord {
            trials,
            dice_seed,
            analysis_depth: depth.value.trim().to_string(),
            double_decision_confidence,
            take_decision_confidence,
        },
        cursor,
    ))
}

/// The trial count is the last token before `Games rolled` inside its cell.
fn trials(scanner: &Scanner<'_>, from: usize) -> Result<(u32, usize), XgError> {
    let marker = scanner.expect_first_of("rollout trials", &GAMES_ROLLED, from)?;
    let cell = scanner.preceding_cell("rollout trials", '>', marker.start)?;
    let raw = cell.split_whitespace().last().unwrap_or_default();
    let trials = parse_number::<u32>("rollout trials", &raw.replace(',', ""))?;
    Ok((trials, marker.end))
}

fn confidence(
    scanner: &Scanner<'_>,
    field: &'static str,
    labels: &[&'static str],
    from: usize,
) -> Result<(Option<f32>, usize), XgError> {
    match scanner.optional_field(field, labels, &PERCENT_TERMINATORS, from)? {
        Some(value) => Ok((Some(parse_percentage(field, value.value)?), value.next)),
        None => Ok((None, from)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Result<RolloutDetailRecord, XgError> {
        extract_rollout(&Scanner::new(text), 0).map(|(rollout, _)| rollout)
    }

    #[test]
    fn test_full_rollout_section() {
        let rollout = extract(
            "<h3>Rollout details</h3><table>\
             <tr><td>5,184 Games rolled with Variance Reduction.</td></tr>\
             <tr><td>Dice Seed: 8675309</td></tr>\
             <tr><td>Moves and cube decisions: XG Roller+</td></tr>\
             <tr><td>Double Decision confidence: 99.5%</td></tr>\
             <tr><td>Take Decision confidence: 87%</td></tr></table>",
        )
        .unwrap();

        assert_eq!(rollout.trials, 5184);
        assert_eq!(rollout.dice_seed, Some(8_675_309));
        assert_eq!(rollout.analysis_depth, "XG Roller+");
        assert!((rollout.double_decision_confidence.unwrap() - 0.995).abs() < 1e-6);
        assert!((rollout.take_decision_confidence.unwrap() - 0.87).abs() < 1e-6);
    }

    #[test]
    fn test_missing_seed_is_none_not_zero() {
        let rollout = extract(
            "<p>Rollout details</p><td>1296 Games rolled</td>\
             <td>cube decisions: 3-ply</td>",
        )
        .unwrap();
        assert_eq!(rollout.trials, 1296);
        assert_eq!(rollout.dice_seed, None);
        assert_eq!(rollout.analysis_depth, "3-ply");
        assert_eq!(rollout.double_decision_confidence, None);
        assert_eq!(rollout.take_decision_confidence, None);
    }

    #[test]
    fn test_take_confidence_without_double_confidence() {
        let rollout = extract(
            "<p>Rollout details</p><td>648 Games rolled</td>\
             <td>Moves and cube decisions: 2-ply</td>\
             <td>Take Decision confidence: 64.2%</td>",
        )
        .unwrap();
        assert_eq!(rollout.double_decision_confidence, None);
        assert!((rollout.take_decision_confidence.unwrap() - 0.642).abs() < 1e-6);
    }

    #[test]
    fn test_missing_depth_is_format_error() {
        let err = extract("<p>Rollout details</p><td>648 Games rolled</td>").unwrap_err();
        assert!(matches!(err, XgError::Format { field: "rollout analysis depth", .. }));
    }

    #[test]
    fn test_bad_trial_count_is_numeric_error() {
        let err = extract(
            "<p>Rollout details</p><td>many Games rolled</td><td>cube decisions: 1-ply</td>",
        )
        .unwrap_err();
        assert!(matches!(err, XgError::NumericParse { field: "rollout trials", .. }));
    }

    #[test]
    fn test_missing_section_is_format_error() {
        let err = extract("<td>1296 Games rolled</td>").unwrap_err();
        assert!(matches!(err, XgError::Format { field: "rollout details", .. }));
    }
}
