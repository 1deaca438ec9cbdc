//! Position identifiers.
//!
//! The extraction engine only needs two things from an XGID: a normalized identifier string and
//! whether the position is a cube decision or a checker play. Decoding sits behind
//! [`PositionCodec`] so extraction can run against deterministic fakes in tests.

use super::error::XgError;

pub const XGID_PREFIX: &str = "XGID=";

/// Board field of the opening position, bottom player's perspective.
pub const STARTING_BOARD: &str = "-b----E-C---eE---c-e----B-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Cube,
    CheckerPlay,
}

impl DecisionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::CheckerPlay => "checker_play",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPosition {
    /// Normalized identifier, `XGID=` prefix included.
    pub xgid: String,
    pub kind: DecisionKind,
}

pub trait PositionCodec: Send + Sync {
    fn decode(&self, raw: &str) -> Result<DecodedPosition, XgError>;

    /// Identifier prefix shared by every encoding of the opening position.
    fn starting_position(&self) -> &str;

    fn is_starting_position(&self, position: &DecodedPosition) -> bool {
        position.xgid.starts_with(self.starting_position())
    }
}

/// Decoder for XG's `XGID=board:cube:owner:turn:dice:score1:score2:crawford:length:maxcube`.
#[derive(Debug, Clone)]
pub struct XgidCodec {
    starting_position: String,
}

const XGID_FIELD_COUNT: usize = 10;
const BOARD_LEN: usize = 26;
const DICE_FIELD: usize = 4;

impl Default for XgidCodec {
    fn default() -> Self {
        Self {
            starting_position: format!("{XGID_PREFIX}{STARTING_BOARD}:"),
        }
    }
}

impl XgidCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn invalid(raw: &str, reason: &'static str) -> XgError {
        XgError::Position {
            raw: raw.to_string(),
            reason,
        }
    }

    fn classify_dice(raw: &str, dice: &str) -> Result<DecisionKind, XgError> {
        match dice {
            // On roll before rolling: double or not
            "00" => Ok(DecisionKind::Cube),
            // Doubled, beavered, raccooned: take or pass
            "D" | "B" | "R" => Ok(DecisionKind::Cube),
            _ => {
                let bytes = dice.as_bytes();
                let is_die = |b: u8| (b'1'..=b'6').contains(&b);
                if bytes.len() == 2 && is_die(bytes[0]) && is_die(bytes[1]) {
                    Ok(DecisionKind::CheckerPlay)
                } else {
                    Err(Self::invalid(raw, "unrecognized dice field"))
                }
            }
        }
    }
}

impl PositionCodec for XgidCodec {
    fn decode(&self, raw: &str) -> Result<DecodedPosition, XgError> {
        let xgid = raw.trim();
        let body = xgid
            .strip_prefix(XGID_PREFIX)
            .ok_or_else(|| Self::invalid(raw, "missing XGID= prefix"))?;

        let fields: Vec<&str> = body.split(':').collect();
        if fields.len() < XGID_FIELD_COUNT {
            return Err(Self::invalid(raw, "too few fields"));
        }

        let board = fields[0];
        let board_ok = board.len() == BOARD_LEN
            && board
                .bytes()
                .all(|b| b == b'-' || (b'a'..=b'o').contains(&b) || (b'A'..=b'O').contains(&b));
        if !board_ok {
            return Err(Self::invalid(raw, "malformed board field"));
        }

        let kind = Self::classify_dice(raw, fields[DICE_FIELD])?;
        Ok(DecodedPosition {
            xgid: xgid.to_string(),
            kind,
        })
    }

    fn starting_position(&self) -> &str {
        &self.starting_position
    }
}
