use super::chunk::{ChunkWriter, XgColumnDef, XgLogicalType};
use super::error::ErrorAccumulator;
use super::reader::{
    ExportBindData, ExportInitData, ExportRow, Extracted, bind_export, fill_chunk, init_export,
    on_error_parameter, path_parameters,
};
use super::types::{CubeDecisionRecord, GameRecord};
use duckdb::{
    core::{DataChunkHandle, LogicalTypeHandle},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::collections::VecDeque;
use std::error::Error;

pub struct ReadXgCubeVTab;

const READ_XG_CUBE_COLUMN_COUNT: usize = 21;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadXgCubeColumn {
    MatchId = 0,
    GameNumber = 1,
    MoveNumber = 2,
    Xgid = 3,
    BottomPlayerNeeds = 4,
    TopPlayerNeeds = 5,
    IsCrawford = 6,
    AnalysisDepth = 7,
    NoDoubleEquity = 8,
    DoubleTakeEquity = 9,
    WrongPassThreshold = 10,
    WrongTakeThreshold = 11,
    DidPlayerDouble = 12,
    DidPlayerTake = 13,
    RolloutTrials = 14,
    RolloutDiceSeed = 15,
    RolloutAnalysisDepth = 16,
    DoubleDecisionConfidence = 17,
    TakeDecisionConfidence = 18,
    ParseError = 19,
    Source = 20,
}

impl ReadXgCubeColumn {
    const fn index(self) -> usize {
        self as usize
    }

    /// Columns left NULL on the row of a failed match.
    const DECISION_COLUMNS: [Self; 18] = [
        Self::GameNumber,
        Self::MoveNumber,
        Self::Xgid,
        Self::BottomPlayerNeeds,
        Self::TopPlayerNeeds,
        Self::IsCrawford,
        Self::AnalysisDepth,
        Self::NoDoubleEquity,
        Self::DoubleTakeEquity,
        Self::WrongPassThreshold,
        Self::WrongTakeThreshold,
        Self::DidPlayerDouble,
        Self::DidPlayerTake,
        Self::RolloutTrials,
        Self::RolloutDiceSeed,
        Self::RolloutAnalysisDepth,
        Self::DoubleDecisionConfidence,
        Self::TakeDecisionConfidence,
    ];
}

const READ_XG_CUBE_COLUMNS: [XgColumnDef; READ_XG_CUBE_COLUMN_COUNT] = [
    XgColumnDef {
        name: "match_id",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "game_number",
        logical_type: XgLogicalType::UInteger,
    },
    XgColumnDef {
        name: "move_number",
        logical_type: XgLogicalType::UInteger,
    },
    XgColumnDef {
        name: "xgid",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "bottom_player_needs",
        logical_type: XgLogicalType::Integer,
    },
    XgColumnDef {
        name: "top_player_needs",
        logical_type: XgLogicalType::Integer,
    },
    XgColumnDef {
        name: "is_crawford",
        logical_type: XgLogicalType::Boolean,
    },
    XgColumnDef {
        name: "analysis_depth",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "no_double_equity",
        logical_type: XgLogicalType::Float,
    },
    XgColumnDef {
        name: "double_take_equity",
        logical_type: XgLogicalType::Float,
    },
    XgColumnDef {
        name: "wrong_pass_threshold",
        logical_type: XgLogicalType::Float,
    },
    XgColumnDef {
        name: "wrong_take_threshold",
        logical_type: XgLogicalType::Float,
    },
    XgColumnDef {
        name: "did_player_double",
        logical_type: XgLogicalType::Boolean,
    },
    XgColumnDef {
        name: "did_player_take",
        logical_type: XgLogicalType::Boolean,
    },
    XgColumnDef {
        name: "rollout_trials",
        logical_type: XgLogicalType::UInteger,
    },
    XgColumnDef {
        name: "rollout_dice_seed",
        logical_type: XgLogicalType::BigInt,
    },
    XgColumnDef {
        name: "rollout_analysis_depth",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "double_decision_confidence",
        logical_type: XgLogicalType::Float,
    },
    XgColumnDef {
        name: "take_decision_confidence",
        logical_type: XgLogicalType::Float,
    },
    XgColumnDef {
        name: "parse_error",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "Source",
        logical_type: XgLogicalType::Varchar,
    },
];

/// Game context repeated on every cube row of that game.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeGameContext {
    game_number: u32,
    bottom_player_needs: i32,
    top_player_needs: i32,
    is_crawford: bool,
}

impl From<&GameRecord> for CubeGameContext {
    fn from(game: &GameRecord) -> Self {
        Self {
            game_number: game.game_number,
            bottom_player_needs: game.bottom_player_needs,
            top_player_needs: game.top_player_needs,
            is_crawford: game.is_crawford,
        }
    }
}

#[derive(Debug)]
pub enum CubeRow {
    Decision {
        match_id: String,
        source: String,
        game: CubeGameContext,
        decision: CubeDecisionRecord,
    },
    Failed {
        match_id: String,
        source: String,
        message: String,
    },
}

impl ExportRow for CubeRow {
    const COLUMNS: &'static [XgColumnDef] = &READ_XG_CUBE_COLUMNS;

    fn rows(extracted: Extracted) -> VecDeque<Self> {
        match extracted {
            Extracted::Match { source, record } => {
                let mut rows = VecDeque::with_capacity(record.cube_decision_count());
                for game in record.games {
                    let context = CubeGameContext::from(&game);
                    for decision in game.cube_decisions {
                        rows.push_back(CubeRow::Decision {
                            match_id: record.match_id.clone(),
                            source: source.clone(),
                            game: context.clone(),
                            decision,
                        });
                    }
                }
                rows
            }
            Extracted::Failed {
                match_id,
                source,
                message,
            } => VecDeque::from([CubeRow::Failed {
                match_id,
                source,
                message,
            }]),
        }
    }

    fn write(&self, writer: &mut ChunkWriter<'_>) -> Result<(), Box<dyn Error>> {
        let mut parse_error = ErrorAccumulator::default();
        match self {
            CubeRow::Decision {
                match_id,
                source,
                game,
                decision,
            } => {
                writer.write_varchar(
                    ReadXgCubeColumn::MatchId.index(),
                    Some(match_id),
                    &mut parse_error,
                )?;
                writer.write_u32(ReadXgCubeColumn::GameNumber.index(), Some(game.game_number));
                writer.write_u32(
                    ReadXgCubeColumn::MoveNumber.index(),
                    Some(decision.move_number),
                );
                writer.write_varchar(
                    ReadXgCubeColumn::Xgid.index(),
                    Some(&decision.xgid),
                    &mut parse_error,
                )?;
                writer.write_i32(
                    ReadXgCubeColumn::BottomPlayerNeeds.index(),
                    Some(game.bottom_player_needs),
                );
                writer.write_i32(
                    ReadXgCubeColumn::TopPlayerNeeds.index(),
                    Some(game.top_player_needs),
                );
                writer.write_bool(ReadXgCubeColumn::IsCrawford.index(), Some(game.is_crawford));
                writer.write_varchar(
                    ReadXgCubeColumn::AnalysisDepth.index(),
                    Some(&decision.analysis_depth),
                    &mut parse_error,
                )?;
                writer.write_f32(
                    ReadXgCubeColumn::NoDoubleEquity.index(),
                    Some(decision.no_double_equity),
                );
                writer.write_f32(
                    ReadXgCubeColumn::DoubleTakeEquity.index(),
                    Some(decision.double_take_equity),
                );
                writer.write_f32(
                    ReadXgCubeColumn::WrongPassThreshold.index(),
                    Some(decision.wrong_pass_threshold),
                );
                writer.write_f32(
                    ReadXgCubeColumn::WrongTakeThreshold.index(),
                    Some(decision.wrong_take_threshold),
                );
                writer.write_bool(
                    ReadXgCubeColumn::DidPlayerDouble.index(),
                    Some(decision.did_player_double),
                );
                writer.write_bool(
                    ReadXgCubeColumn::DidPlayerTake.index(),
                    Some(decision.did_player_take),
                );

                let rollout = decision.rollout.as_ref();
                writer.write_u32(
                    ReadXgCubeColumn::RolloutTrials.index(),
                    rollout.map(|r| r.trials),
                );
                writer.write_i64(
                    ReadXgCubeColumn::RolloutDiceSeed.index(),
                    rollout.and_then(|r| r.dice_seed),
                );
                writer.write_varchar(
                    ReadXgCubeColumn::RolloutAnalysisDepth.index(),
                    rollout.map(|r| r.analysis_depth.as_str()),
                    &mut parse_error,
                )?;
                writer.write_f32(
                    ReadXgCubeColumn::DoubleDecisionConfidence.index(),
                    rollout.and_then(|r| r.double_decision_confidence),
                );
                writer.write_f32(
                    ReadXgCubeColumn::TakeDecisionConfidence.index(),
                    rollout.and_then(|r| r.take_decision_confidence),
                );
                writer.write_varchar(
                    ReadXgCubeColumn::Source.index(),
                    Some(source),
                    &mut parse_error,
                )?;
            }
            CubeRow::Failed {
                match_id,
                source,
                message,
            } => {
                parse_error.push(message);
                writer.write_varchar(
                    ReadXgCubeColumn::MatchId.index(),
                    Some(match_id),
                    &mut parse_error,
                )?;
                for column in ReadXgCubeColumn::DECISION_COLUMNS {
                    writer.write_null(column.index());
                }
                writer.write_varchar(
                    ReadXgCubeColumn::Source.index(),
                    Some(source),
                    &mut parse_error,
                )?;
            }
        }
        writer.write_parse_error(ReadXgCubeColumn::ParseError.index(), parse_error)
    }
}

impl VTab for ReadXgCubeVTab {
    type InitData = ExportInitData<CubeRow>;
    type BindData = ExportBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        bind_export(bind, &READ_XG_CUBE_COLUMNS)
    }

    fn init(init: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        init_export(init)
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        fill_chunk(func.get_init_data(), func.get_bind_data(), output)
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        path_parameters()
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        on_error_parameter()
    }
}
