use super::chunk::{ChunkWriter, XgColumnDef, XgLogicalType};
use super::codec::{PositionCodec, XgidCodec};
use super::duckdb::bind_info_ffi::get_named_parameter_varchar;
use super::error::ErrorAccumulator;
use super::export::{MatchOutcome, discover_match_dirs, process_match_dir};
use super::log;
use super::types::MatchRecord;
use duckdb::{
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::collections::VecDeque;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const ON_ERROR_PARAM: &str = "on_error";

/// What a table function does with a match that failed to extract.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OnError {
    /// Emit a row carrying only the match id and `parse_error`.
    #[default]
    Include,
    Skip,
    Fail,
}

impl OnError {
    pub(crate) fn parse(raw: &str) -> Result<Self, Box<dyn Error>> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("include") {
            Ok(Self::Include)
        } else if normalized.eq_ignore_ascii_case("skip") {
            Ok(Self::Skip)
        } else if normalized.eq_ignore_ascii_case("fail") {
            Ok(Self::Fail)
        } else {
            Err(format!(
                "Invalid on_error value '{}'. Supported values: 'include', 'skip', 'fail' or NULL/omitted.",
                normalized
            )
            .into())
        }
    }
}

fn resolve_on_error(bind: &BindInfo) -> Result<OnError, Box<dyn Error>> {
    match get_named_parameter_varchar(bind, ON_ERROR_PARAM)?.into_option() {
        None => Ok(OnError::default()),
        Some(raw) => OnError::parse(&raw),
    }
}

#[repr(C)]
pub struct ExportBindData {
    pub(crate) dirs: Vec<PathBuf>,
    pub(crate) on_error: OnError,
}

/// Work shared by all threads of one scan: the next unclaimed match directory and rows of
/// matches that did not fit in an earlier chunk.
pub struct ExportState<R> {
    pub(crate) next_dir_idx: usize,
    pub(crate) pending: Vec<VecDeque<R>>,
}

#[repr(C)]
pub struct ExportInitData<R> {
    pub(crate) state: Mutex<ExportState<R>>,
}

/// A match after `on_error` has been applied.
#[derive(Debug)]
pub enum Extracted {
    Match {
        source: String,
        record: MatchRecord,
    },
    Failed {
        match_id: String,
        source: String,
        message: String,
    },
}

pub(crate) fn apply_on_error(
    outcome: MatchOutcome,
    on_error: OnError,
) -> Result<Option<Extracted>, Box<dyn Error>> {
    let source = outcome.source.display().to_string();
    match outcome.result {
        Ok(record) => Ok(Some(Extracted::Match { source, record })),
        Err(err) => match on_error {
            OnError::Include => Ok(Some(Extracted::Failed {
                match_id: outcome.match_id,
                source,
                message: err.to_string(),
            })),
            OnError::Skip => Ok(None),
            OnError::Fail => {
                let message = format!(
                    "Failed to extract match '{}' from '{}': {}",
                    outcome.match_id, source, err
                );
                log::error(&message);
                Err(message.into())
            }
        },
    }
}

/// Row shape of an export table function: how one match expands into rows.
pub(crate) trait ExportRow: Sized + Send {
    const COLUMNS: &'static [XgColumnDef];

    fn rows(extracted: Extracted) -> VecDeque<Self>;

    fn write(&self, writer: &mut ChunkWriter<'_>) -> Result<(), Box<dyn Error>>;
}

pub(crate) fn bind_export(
    bind: &BindInfo,
    columns: &[XgColumnDef],
) -> Result<ExportBindData, Box<dyn Error>> {
    let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
    let on_error = resolve_on_error(bind)?;
    let dirs = discover_match_dirs(&pattern)?;

    for column in columns {
        bind.add_result_column(column.name, column.logical_type.to_handle());
    }

    Ok(ExportBindData { dirs, on_error })
}

pub(crate) fn max_threads(dir_count: usize) -> u64 {
    let hardware = thread::available_parallelism().map_or(1, |n| n.get());
    dir_count.min(hardware).max(1) as u64
}

pub(crate) fn init_export<R>(init: &InitInfo) -> Result<ExportInitData<R>, Box<dyn Error>> {
    let bind_data = init.get_bind_data::<ExportBindData>();
    // SAFETY: DuckDB hands init the bind data produced by this function's `bind`, which
    // stays alive for the whole scan.
    if let Some(bind_data) = unsafe { bind_data.as_ref() } {
        init.set_max_threads(max_threads(bind_data.dirs.len()));
    }

    Ok(ExportInitData {
        state: Mutex::new(ExportState {
            next_dir_idx: 0,
            pending: Vec::new(),
        }),
    })
}

fn acquire_rows<R: ExportRow>(
    init_data: &ExportInitData<R>,
    bind_data: &ExportBindData,
    codec: &dyn PositionCodec,
) -> Result<Option<VecDeque<R>>, Box<dyn Error>> {
    loop {
        let dir_idx = {
            let mut state = init_data
                .state
                .lock()
                .map_err(|_| "export scan state poisoned")?;

            if let Some(rows) = state.pending.pop() {
                return Ok(Some(rows));
            }

            if state.next_dir_idx < bind_data.dirs.len() {
                let dir_idx = state.next_dir_idx;
                state.next_dir_idx += 1;
                dir_idx
            } else {
                return Ok(None);
            }
        };

        let outcome = process_match_dir(bind_data.dirs[dir_idx].clone(), codec);
        if let Some(extracted) = apply_on_error(outcome, bind_data.on_error)? {
            return Ok(Some(R::rows(extracted)));
        }
    }
}

fn finalize_chunk<R>(
    init_data: &ExportInitData<R>,
    leftover: Option<VecDeque<R>>,
    writer: &mut ChunkWriter<'_>,
) -> Result<(), Box<dyn Error>> {
    if let Some(rows) = leftover.filter(|rows| !rows.is_empty()) {
        let mut state = init_data
            .state
            .lock()
            .map_err(|_| "export scan state poisoned")?;
        state.pending.push(rows);
    }

    writer.set_output_len();
    Ok(())
}

/// Fill one output chunk, claiming match directories until it is full or none remain.
pub(crate) fn fill_chunk<R: ExportRow>(
    init_data: &ExportInitData<R>,
    bind_data: &ExportBindData,
    output: &mut DataChunkHandle,
) -> Result<(), Box<dyn Error>> {
    let codec = XgidCodec::new();
    let mut writer = ChunkWriter::new(output, R::COLUMNS);
    let mut current: Option<VecDeque<R>> = None;

    while !writer.is_full() {
        if current.as_ref().is_none_or(VecDeque::is_empty) {
            current = acquire_rows(init_data, bind_data, &codec)?;
        }
        let Some(rows) = current.as_mut() else {
            break;
        };
        if let Some(row) = rows.pop_front() {
            row.write(&mut writer)?;
            writer.finish_row();
        }
    }

    finalize_chunk(init_data, current, &mut writer)
}

pub(crate) fn path_parameters() -> Option<Vec<LogicalTypeHandle>> {
    Some(vec![
        LogicalTypeHandle::from(LogicalTypeId::Varchar), // export path or glob (required)
    ])
}

pub(crate) fn on_error_parameter() -> Option<Vec<(String, LogicalTypeHandle)>> {
    Some(vec![(
        ON_ERROR_PARAM.to_string(),
        LogicalTypeHandle::from(LogicalTypeId::Varchar),
    )])
}

pub struct ReadXgVTab;

const READ_XG_COLUMN_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadXgColumn {
    MatchId = 0,
    MatchLength = 1,
    BottomPlayer = 2,
    TopPlayer = 3,
    GameCount = 4,
    CubeDecisionCount = 5,
    CheckerPlayDecisionCount = 6,
    Analysis = 7,
    ParseError = 8,
    Source = 9,
}

impl ReadXgColumn {
    const fn index(self) -> usize {
        self as usize
    }
}

const READ_XG_COLUMNS: [XgColumnDef; READ_XG_COLUMN_COUNT] = [
    XgColumnDef {
        name: "match_id",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "match_length",
        logical_type: XgLogicalType::UInteger,
    },
    XgColumnDef {
        name: "bottom_player",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "top_player",
        logical_type: XgLogicalType::Varchar,
    },
    XgColumnDef {
        name: "game_count",
        logical_type: XgLogicalType::UInteger,
    },
    XgColumnDef {
        name: "cube_decision_count",
        logical_type: XgLogicalType::UInteger,
    },
    XgColumnDef {
        name: "checker_play_decision_count",
        logical_type: XgLogicalType::UInteger,
    },
    XgColumnDef {
        name: "analysis",
        logical_type: XgLogicalType::Varchar,
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

fn count(n: usize) -> Option<u32> {
    u32::try_from(n).ok()
}

impl ExportRow for Extracted {
    const COLUMNS: &'static [XgColumnDef] = &READ_XG_COLUMNS;

    fn rows(extracted: Extracted) -> VecDeque<Self> {
        VecDeque::from([extracted])
    }

    fn write(&self, writer: &mut ChunkWriter<'_>) -> Result<(), Box<dyn Error>> {
        let mut parse_error = ErrorAccumulator::default();
        match self {
            Extracted::Match { source, record } => {
                let analysis = match record.to_json() {
                    Ok(json) => Some(json),
                    Err(err) => {
                        parse_error.push(&format!("Failed to serialize analysis: {}", err));
                        None
                    }
                };

                writer.write_varchar(
                    ReadXgColumn::MatchId.index(),
                    Some(&record.match_id),
                    &mut parse_error,
                )?;
                writer.write_u32(ReadXgColumn::MatchLength.index(), Some(record.match_length));
                writer.write_varchar(
                    ReadXgColumn::BottomPlayer.index(),
                    Some(&record.bottom_player_name),
                    &mut parse_error,
                )?;
                writer.write_varchar(
                    ReadXgColumn::TopPlayer.index(),
                    Some(&record.top_player_name),
                    &mut parse_error,
                )?;
                writer.write_u32(ReadXgColumn::GameCount.index(), count(record.games.len()));
                writer.write_u32(
                    ReadXgColumn::CubeDecisionCount.index(),
                    count(record.cube_decision_count()),
                );
                writer.write_u32(
                    ReadXgColumn::CheckerPlayDecisionCount.index(),
                    count(record.checker_play_decision_count()),
                );
                writer.write_varchar(
                    ReadXgColumn::Analysis.index(),
                    analysis.as_deref(),
                    &mut parse_error,
                )?;
                writer.write_varchar(
                    ReadXgColumn::Source.index(),
                    Some(source),
                    &mut parse_error,
                )?;
            }
            Extracted::Failed {
                match_id,
                source,
                message,
            } => {
                parse_error.push(message);
                writer.write_varchar(
                    ReadXgColumn::MatchId.index(),
                    Some(match_id),
                    &mut parse_error,
                )?;
                for column in [
                    ReadXgColumn::MatchLength,
                    ReadXgColumn::BottomPlayer,
                    ReadXgColumn::TopPlayer,
                    ReadXgColumn::GameCount,
                    ReadXgColumn::CubeDecisionCount,
                    ReadXgColumn::CheckerPlayDecisionCount,
                    ReadXgColumn::Analysis,
                ] {
                    writer.write_null(column.index());
                }
                writer.write_varchar(
                    ReadXgColumn::Source.index(),
                    Some(source),
                    &mut parse_error,
                )?;
            }
        }
        writer.write_parse_error(ReadXgColumn::ParseError.index(), parse_error)
    }
}

impl VTab for ReadXgVTab {
    type InitData = ExportInitData<Extracted>;
    type BindData = ExportBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        bind_export(bind, &READ_XG_COLUMNS)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backgammon::error::XgError;
    use crate::backgammon::export::tests::{good_games, write_match};
    use crate::backgammon::export::{MatchReader, extract_match_dir};
    use tempfile::TempDir;

    fn failed_outcome() -> MatchOutcome {
        MatchOutcome {
            match_id: "broken".to_string(),
            source: PathBuf::from("/export/broken"),
            result: Err(XgError::MissingFile {
                path: PathBuf::from("/export/broken/game0.htm"),
            }),
        }
    }

    #[test]
    fn test_parse_on_error_case_insensitive() {
        assert_eq!(OnError::parse("include").unwrap(), OnError::Include);
        assert_eq!(OnError::parse(" SKIP ").unwrap(), OnError::Skip);
        assert_eq!(OnError::parse("Fail").unwrap(), OnError::Fail);
    }

    #[test]
    fn test_parse_on_error_rejects_unsupported_value() {
        let err = OnError::parse("ignore").unwrap_err().to_string();
        assert!(err.contains("Invalid on_error value 'ignore'"));
        let err = OnError::parse("  ").unwrap_err().to_string();
        assert!(err.contains("Invalid on_error value ''"));
    }

    #[test]
    fn test_on_error_default_is_include() {
        assert_eq!(OnError::default(), OnError::Include);
    }

    #[test]
    fn test_include_keeps_failed_match_as_row() {
        let extracted = apply_on_error(failed_outcome(), OnError::Include)
            .unwrap()
            .unwrap();
        match extracted {
            Extracted::Failed {
                match_id, message, ..
            } => {
                assert_eq!(match_id, "broken");
                assert!(message.contains("game0.htm"));
            }
            other => panic!("unexpected row: {other:?}"),
        }
    }

    #[test]
    fn test_skip_drops_failed_match() {
        assert!(apply_on_error(failed_outcome(), OnError::Skip)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_fail_aborts_with_match_context() {
        let err = apply_on_error(failed_outcome(), OnError::Fail)
            .unwrap_err()
            .to_string();
        assert!(err.contains("Failed to extract match 'broken'"));
        assert!(err.contains("missing required file"));
    }

    #[test]
    fn test_successful_match_passes_every_mode() {
        let root = TempDir::new().unwrap();
        let dir = write_match(root.path(), "ok", &good_games());
        for mode in [OnError::Include, OnError::Skip, OnError::Fail] {
            let outcome = MatchOutcome {
                match_id: "ok".to_string(),
                source: dir.clone(),
                result: extract_match_dir(&dir, &XgidCodec::new()),
            };
            let extracted = apply_on_error(outcome, mode).unwrap().unwrap();
            assert!(matches!(extracted, Extracted::Match { .. }));
        }
    }

    #[test]
    fn test_analysis_json_restores_match() {
        let root = TempDir::new().unwrap();
        write_match(root.path(), "ok", &good_games());
        let outcome = MatchReader::open(root.path().to_str().unwrap())
            .unwrap()
            .next()
            .unwrap();
        let record = outcome.result.unwrap();
        let restored = MatchRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_export_state_initialization() {
        let init_data: ExportInitData<Extracted> = ExportInitData {
            state: Mutex::new(ExportState {
                next_dir_idx: 0,
                pending: Vec::new(),
            }),
        };
        let state = init_data.state.lock().unwrap();
        assert_eq!(state.next_dir_idx, 0);
        assert!(state.pending.is_empty());
    }

    #[test]
    fn test_max_threads_bounded_by_dirs() {
        assert_eq!(max_threads(0), 1);
        assert_eq!(max_threads(1), 1);
        assert!(max_threads(1024) >= 1);
        assert!(max_threads(2) <= 2);
    }

    #[test]
    fn test_read_xg_columns_match_contract() {
        let expected: [(&str, XgLogicalType); READ_XG_COLUMN_COUNT] = [
            ("match_id", XgLogicalType::Varchar),
            ("match_length", XgLogicalType::UInteger),
            ("bottom_player", XgLogicalType::Varchar),
            ("top_player", XgLogicalType::Varchar),
            ("game_count", XgLogicalType::UInteger),
            ("cube_decision_count", XgLogicalType::UInteger),
            ("checker_play_decision_count", XgLogicalType::UInteger),
            ("analysis", XgLogicalType::Varchar),
            ("parse_error", XgLogicalType::Varchar),
            ("Source", XgLogicalType::Varchar),
        ];

        for (idx, column) in READ_XG_COLUMNS.iter().enumerate() {
            assert_eq!(column.name, expected[idx].0);
            assert_eq!(column.logical_type, expected[idx].1);
        }
        assert_eq!(ReadXgColumn::Source.index(), READ_XG_COLUMN_COUNT - 1);
    }
}
