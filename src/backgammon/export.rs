//! Filesystem layout of an XG web export.
//!
//! An export root holds one directory per match (plus an `images` directory of board
//! graphics). Each match directory holds `game0.htm`, the match summary, and
//! `game1.htm`..`gameN.htm`, one document per game.

use super::codec::{PositionCodec, XgidCodec};
use super::error::XgError;
use super::extract::extract_match;
use super::log;
use super::scanner::parse_number;
use super::types::MatchRecord;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::vec;

pub const SUMMARY_FILE: &str = "game0.htm";
const IMAGES_DIR: &str = "images";

static GAME_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^game(\d+)\.htm$").expect("valid game file regex"));

/// Resolve a path or glob pattern to the match directories it names, sorted by path.
///
/// A directory that itself contains `game0.htm` is a match directory; any other directory
/// is treated as an export root and contributes its subdirectories.
pub fn discover_match_dirs(pattern: &str) -> Result<Vec<PathBuf>, XgError> {
    let roots: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
        glob::glob(pattern)
            .map_err(|source| XgError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .collect()
    } else {
        vec![PathBuf::from(pattern)]
    };

    let mut dirs = Vec::new();
    for root in roots {
        if !root.is_dir() {
            continue;
        }
        if root.join(SUMMARY_FILE).is_file() {
            dirs.push(root);
            continue;
        }
        match fs::read_dir(&root) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.is_dir() && !is_images_dir(&path) {
                        dirs.push(path);
                    }
                }
            }
            Err(err) => log::warn(format!(
                "Failed to list export directory '{}': {}",
                root.display(),
                err
            )),
        }
    }

    dirs.sort();
    dirs.dedup();
    if dirs.is_empty() {
        return Err(XgError::NoMatches {
            pattern: pattern.to_string(),
        });
    }
    Ok(dirs)
}

fn is_images_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(IMAGES_DIR))
}

/// Match identifier: the match directory's own name.
pub fn match_id(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Game documents of a match directory, ordered by game number.
///
/// Numbering must run 1..N without gaps; the first missing number is reported.
pub fn game_files(dir: &Path) -> Result<Vec<PathBuf>, XgError> {
    let io_error = |source: io::Error| XgError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(caps) = GAME_FILE_RE.captures(name) {
            let number = parse_number::<u32>("game file number", &caps[1])?;
            if number > 0 {
                numbered.push((number, entry.path()));
            }
        }
    }
    numbered.sort_by_key(|(number, _)| *number);
    if let Some(pair) = numbered.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(XgError::integrity(
            "game file number",
            format!("one file for game {}", pair[0].0),
            format!("{} and {}", pair[0].1.display(), pair[1].1.display()),
        ));
    }

    let mut expected = 1;
    for (number, _) in &numbered {
        if *number != expected {
            break;
        }
        expected += 1;
    }
    if numbered.is_empty() || expected as usize <= numbered.len() {
        return Err(XgError::MissingFile {
            path: dir.join(format!("game{expected}.htm")),
        });
    }

    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

/// Read one export document. Invalid UTF-8 is replaced rather than rejected.
pub fn read_document(path: &Path) -> Result<String, XgError> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(XgError::MissingFile {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(XgError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Extract one match directory into a fully populated [`MatchRecord`].
pub fn extract_match_dir(dir: &Path, codec: &dyn PositionCodec) -> Result<MatchRecord, XgError> {
    let summary = read_document(&dir.join(SUMMARY_FILE))?;
    let games = game_files(dir)?;
    extract_match(
        &match_id(dir),
        &summary,
        games.iter().map(|path| read_document(path)),
        codec,
    )
}

/// Result of extracting one match directory. Failures stay local to their match.
#[derive(Debug)]
pub struct MatchOutcome {
    pub match_id: String,
    pub source: PathBuf,
    pub result: Result<MatchRecord, XgError>,
}

pub fn process_match_dir(dir: PathBuf, codec: &dyn PositionCodec) -> MatchOutcome {
    let match_id = match_id(&dir);
    let result = extract_match_dir(&dir, codec);
    match &result {
        Ok(record) => log::info(format!(
            "Extracted match '{}': games={}; cube_decisions={}; checker_play_decisions={}",
            match_id,
            record.games.len(),
            record.cube_decision_count(),
            record.checker_play_decision_count()
        )),
        Err(err) => log::warn(format!(
            "Extraction error: match='{}'; dir='{}'; kind={}; error={}",
            match_id,
            dir.display(),
            err.kind(),
            err
        )),
    }
    MatchOutcome {
        match_id,
        source: dir,
        result,
    }
}

/// Lazily extracts every match of an export, one directory per `next()`.
pub struct MatchReader<C: PositionCodec = XgidCodec> {
    dirs: vec::IntoIter<PathBuf>,
    codec: C,
}

impl MatchReader<XgidCodec> {
    pub fn open(pattern: &str) -> Result<Self, XgError> {
        Self::with_codec(pattern, XgidCodec::new())
    }
}

impl<C: PositionCodec> MatchReader<C> {
    pub fn with_codec(pattern: &str, codec: C) -> Result<Self, XgError> {
        Ok(Self::from_dirs(discover_match_dirs(pattern)?, codec))
    }

    pub fn from_dirs(dirs: Vec<PathBuf>, codec: C) -> Self {
        Self {
            dirs: dirs.into_iter(),
            codec,
        }
    }

    pub fn remaining(&self) -> usize {
        self.dirs.len()
    }
}

impl<C: PositionCodec> Iterator for MatchReader<C> {
    type Item = MatchOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let dir = self.dirs.next()?;
        Some(process_match_dir(dir, &self.codec))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backgammon::extract::tests::{
        CUBE_SPOT, LATER_PLAY, OPENING, checker_block, cube_block, game_doc, summary_doc,
    };
    use tempfile::TempDir;

    pub(crate) fn write_match(root: &Path, name: &str, games: &[String]) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(SUMMARY_FILE),
            summary_doc(&format!("7 point match, {} games", games.len())),
        )
        .unwrap();
        for (idx, text) in games.iter().enumerate() {
            fs::write(dir.join(format!("game{}.htm", idx + 1)), text).unwrap();
        }
        dir
    }

    pub(crate) fn good_games() -> Vec<String> {
        vec![
            game_doc(
                1,
                "7 point match",
                (0, 0),
                &format!("{}{}", checker_block(OPENING), cube_block(CUBE_SPOT)),
            ),
            game_doc(2, "7 point match", (0, 2), &checker_block(LATER_PLAY)),
        ]
    }

    #[test]
    fn test_discover_skips_images_and_sorts() {
        let root = TempDir::new().unwrap();
        write_match(root.path(), "b_match", &good_games());
        write_match(root.path(), "a_match", &good_games());
        fs::create_dir_all(root.path().join("Images")).unwrap();
        fs::write(root.path().join("notes.txt"), "not a match").unwrap();

        let dirs = discover_match_dirs(root.path().to_str().unwrap()).unwrap();
        let names: Vec<String> = dirs.iter().map(|d| match_id(d)).collect();
        assert_eq!(names, vec!["a_match", "b_match"]);
    }

    #[test]
    fn test_discover_single_match_directory() {
        let root = TempDir::new().unwrap();
        let dir = write_match(root.path(), "only", &good_games());
        let dirs = discover_match_dirs(dir.to_str().unwrap()).unwrap();
        assert_eq!(dirs, vec![dir]);
    }

    #[test]
    fn test_discover_glob_pattern() {
        let root = TempDir::new().unwrap();
        write_match(root.path(), "club_1", &good_games());
        write_match(root.path(), "club_2", &good_games());
        write_match(root.path(), "other", &good_games());

        let pattern = format!("{}/club_*", root.path().display());
        let dirs = discover_match_dirs(&pattern).unwrap();
        assert_eq!(dirs.len(), 2);
    }

    #[test]
    fn test_discover_empty_export_is_fatal() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("images")).unwrap();
        let err = discover_match_dirs(root.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, XgError::NoMatches { .. }));
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_game_files_are_numeric_order() {
        let root = TempDir::new().unwrap();
        let games: Vec<String> = (1..=11)
            .map(|n| game_doc(n, "7 point match", (0, 0), ""))
            .collect();
        let dir = write_match(root.path(), "long", &games);

        let files = game_files(&dir).unwrap();
        assert_eq!(files.len(), 11);
        assert!(files[1].ends_with("game2.htm"));
        assert!(files[10].ends_with("game11.htm"));
    }

    #[test]
    fn test_game_numbering_gap_is_missing_file() {
        let root = TempDir::new().unwrap();
        let dir = write_match(root.path(), "gappy", &good_games());
        fs::rename(dir.join("game2.htm"), dir.join("game3.htm")).unwrap();

        let err = game_files(&dir).unwrap_err();
        match err {
            XgError::MissingFile { path } => assert!(path.ends_with("game2.htm")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_padded_duplicate_game_number_is_integrity_error() {
        let root = TempDir::new().unwrap();
        let dir = write_match(root.path(), "padded", &good_games());
        fs::copy(dir.join("game1.htm"), dir.join("game01.htm")).unwrap();

        let err = game_files(&dir).unwrap_err();
        match err {
            XgError::Integrity {
                field,
                expected,
                found,
            } => {
                assert_eq!(field, "game file number");
                assert_eq!(expected, "one file for game 1");
                assert!(found.contains("game1.htm"));
                assert!(found.contains("game01.htm"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_match_without_games_is_missing_file() {
        let root = TempDir::new().unwrap();
        let dir = write_match(root.path(), "empty", &[]);
        assert!(matches!(
            game_files(&dir).unwrap_err(),
            XgError::MissingFile { .. }
        ));
    }

    #[test]
    fn test_missing_summary_fails_match() {
        let root = TempDir::new().unwrap();
        let dir = write_match(root.path(), "headless", &good_games());
        fs::remove_file(dir.join(SUMMARY_FILE)).unwrap();

        let err = extract_match_dir(&dir, &XgidCodec::new()).unwrap_err();
        assert!(matches!(err, XgError::MissingFile { .. }));
    }

    #[test]
    fn test_reader_isolates_corrupt_match() {
        let root = TempDir::new().unwrap();
        write_match(root.path(), "a_good", &good_games());
        let mut broken = good_games();
        broken[1] = game_doc(2, "9 point match", (0, 2), &checker_block(LATER_PLAY));
        write_match(root.path(), "b_broken", &broken);
        write_match(root.path(), "c_good", &good_games());

        let reader = MatchReader::open(root.path().to_str().unwrap()).unwrap();
        assert_eq!(reader.remaining(), 3);
        let outcomes: Vec<MatchOutcome> = reader.collect();

        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[2].result.is_ok());
        assert_eq!(outcomes[1].match_id, "b_broken");
        match &outcomes[1].result {
            Err(XgError::InGame {
                game_number,
                source,
            }) => {
                assert_eq!(*game_number, 2);
                assert!(matches!(
                    **source,
                    XgError::Integrity {
                        field: "match length",
                        ..
                    }
                ));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let first = outcomes[0].result.as_ref().unwrap();
        assert_eq!(first.match_id, "a_good");
        assert_eq!(first.games.len(), 2);
        assert_eq!(first.cube_decision_count(), 1);
    }
}
