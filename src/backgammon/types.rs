use serde::{Deserialize, Serialize};

/// One analysed match reconstructed from an XG web export directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Points to win; 0 for an unlimited session.
    pub match_length: u32,
    pub bottom_player_name: String,
    pub top_player_name: String,
    /// Name of the export directory the match came from.
    pub match_id: String,
    pub games: Vec<GameRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_number: u32,
    // Counts down in fixed-length matches, raw score in unlimited sessions
    pub bottom_player_needs: i32,
    pub top_player_needs: i32,
    pub is_crawford: bool,
    pub is_from_beginning: bool,
    pub cube_decisions: Vec<CubeDecisionRecord>,
    pub checker_play_decisions: Vec<CheckerPlayDecisionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CubeDecisionRecord {
    pub xgid: String,
    pub move_number: u32,
    pub no_double_equity: f32,
    pub double_take_equity: f32,
    /// Fraction of wrong passes needed to make the double right (0 when not reported).
    pub wrong_pass_threshold: f32,
    /// Fraction of wrong takes needed to make the double right (0 when not reported).
    pub wrong_take_threshold: f32,
    pub analysis_depth: String,
    pub did_player_double: bool,
    pub did_player_take: bool,
    pub rollout: Option<RolloutDetailRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckerPlayDecisionRecord {
    pub xgid: String,
    pub move_number: u32,
    pub variations: Vec<CheckerPlayVariation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckerPlayVariation {
    pub move_text: String,
    pub analysis_depth: String,
    pub equity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolloutDetailRecord {
    pub trials: u32,
    pub dice_seed: Option<i64>,
    pub analysis_depth: String,
    pub double_decision_confidence: Option<f32>,
    pub take_decision_confidence: Option<f32>,
}

impl MatchRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn cube_decision_count(&self) -> usize {
        self.games.iter().map(|g| g.cube_decisions.len()).sum()
    }

    pub fn checker_play_decision_count(&self) -> usize {
        self.games.iter().map(|g| g.checker_play_decisions.len()).sum()
    }
}

impl GameRecord {
    /// Move number of the most recent decision of either kind, 0 before the first one.
    pub fn last_move_number(&self) -> u32 {
        let cube = self.cube_decisions.last().map_or(0, |d| d.move_number);
        let checker = self
            .checker_play_decisions
            .last()
            .map_or(0, |d| d.move_number);
        cube.max(checker)
    }

    pub fn decision_count(&self) -> usize {
        self.cube_decisions.len() + self.checker_play_decisions.len()
    }
}
