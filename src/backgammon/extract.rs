//! Document-level assembly: match summary plus game documents into a [`MatchRecord`].

use super::codec::PositionCodec;
use super::decision::extract_decisions;
use super::error::XgError;
use super::header::{parse_game_header, parse_match_header};
use super::types::{GameRecord, MatchRecord};

pub fn extract_match_header(match_id: &str, summary: &str) -> Result<MatchRecord, XgError> {
    let header = parse_match_header(summary)?;
    Ok(MatchRecord {
        match_length: header.match_length,
        bottom_player_name: header.bottom_player_name,
        top_player_name: header.top_player_name,
        match_id: match_id.to_string(),
        games: Vec::new(),
    })
}

pub fn extract_game(
    text: &str,
    game_number: u32,
    match_record: &MatchRecord,
    codec: &dyn PositionCodec,
) -> Result<GameRecord, XgError> {
    let header = parse_game_header(text, game_number, match_record)?;
    let mut game = GameRecord {
        game_number: header.game_number,
        bottom_player_needs: header.bottom_player_needs,
        top_player_needs: header.top_player_needs,
        is_crawford: header.is_crawford,
        ..Default::default()
    };
    extract_decisions(text, header.body_start, &mut game, codec)?;
    Ok(game)
}

/// Build a match from its summary and its game documents, in game order.
///
/// Game documents are pulled one at a time so only one is held in memory.
pub fn extract_match<I>(
    match_id: &str,
    summary: &str,
    games: I,
    codec: &dyn PositionCodec,
) -> Result<MatchRecord, XgError>
where
    I: IntoIterator<Item = Result<String, XgError>>,
{
    let mut record = extract_match_header(match_id, summary)?;
    for (idx, text) in games.into_iter().enumerate() {
        let game_number = idx as u32 + 1;
        let text = text.map_err(|e| e.in_game(game_number))?;
        let game = extract_game(&text, game_number, &record, codec)
            .map_err(|e| e.in_game(game_number))?;
        record.games.push(game);
    }
    Ok(record)
}
