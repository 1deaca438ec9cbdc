mod checker;
mod chunk;
mod codec;
mod cube;
mod cube_reader;
mod decision;
mod duckdb;
mod error;
mod export;
mod extract;
mod header;
mod log;
mod reader;
mod rollout;
mod scanner;
mod types;
mod xgid;

pub use codec::{DecisionKind, DecodedPosition, PositionCodec, XgidCodec};
pub use cube_reader::ReadXgCubeVTab;
pub use error::XgError;
pub use export::{MatchOutcome, MatchReader};
pub use reader::ReadXgVTab;
pub use types::{
    CheckerPlayDecisionRecord, CheckerPlayVariation, CubeDecisionRecord, GameRecord, MatchRecord,
    RolloutDetailRecord,
};
pub use xgid::{XgidDecisionTypeScalar, XgidIsStartingPositionScalar};
