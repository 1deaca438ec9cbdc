use super::codec::DecodedPosition;
use super::types::CheckerPlayDecisionRecord;

/// Identity of a checker-play decision. Ranked variations are not read from the export.
pub fn extract_checker_play_decision(
    position: DecodedPosition,
    move_number: u32,
) -> CheckerPlayDecisionRecord {
    CheckerPlayDecisionRecord {
        xgid: position.xgid,
        move_number,
        variations: Vec::new(),
    }
}
