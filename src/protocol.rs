//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{AggregateStats, DailyPuzzle, GuessRecord};
use crate::evaluator::RejectionReason;
use crate::poem::Segment;
use crate::round::Phase;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GetPuzzle {
        #[serde(rename = "playerId", default)]
        player_id: Option<String>,
    },
    SubmitGuess {
        #[serde(rename = "playerId")]
        player_id: String,
        guess: String,
    },
    GetStats {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    GetShare {
        #[serde(rename = "playerId")]
        player_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Puzzle {
        view: GameView,
    },
    GuessResult {
        result: GuessOut,
    },
    Stats {
        stats: StatsOut,
    },
    Share {
        text: String,
    },
    Error {
        message: String,
    },
}

/// Everything the client needs to draw the game screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub player_id: String,
    pub date_key: String,
    /// e.g. "January 2, 2025"
    pub date_label: String,
    pub puzzle_number: usize,
    pub title: String,
    pub author: String,
    pub poem_date: String,
    /// Display range only; the target is blanked until the round is over.
    pub lines: Vec<Vec<Segment>>,
    pub clues: Vec<ClueOut>,
    pub guesses: Vec<GuessRecord>,
    pub phase: Phase,
    pub budget: usize,
    pub hints_remaining: usize,
    pub unlocked_clues: usize,
    /// Filled once the round is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// The whole poem with the target shown, once the round is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_poem: Option<Vec<Vec<Segment>>>,
    pub stats: StatsOut,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClueOut {
    #[serde(rename = "type")]
    pub kind: String,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOut {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub played: usize,
    pub wins: usize,
    pub losses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_guesses_on_win: Option<f64>,
}

impl From<&AggregateStats> for StatsOut {
    fn from(s: &AggregateStats) -> Self {
        Self {
            current_streak: s.current_streak,
            longest_streak: s.longest_streak,
            played: s.completed_games.len(),
            wins: s.wins(),
            losses: s.losses(),
            average_guesses_on_win: s.average_guesses_on_win(),
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    #[serde(rename = "playerId", default)]
    pub player_id: Option<String>,
}

#[derive(Deserialize)]
pub struct GuessIn {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub guess: String,
}

/// Result of one submission. Rejections carry a reason and a short message
/// for the transient inline notice; nothing was recorded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessOut {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<GuessRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<GameView>,
}

#[derive(Serialize)]
pub struct ShareOut {
    pub text: String,
}

#[derive(Serialize)]
pub struct TodayPoemOut {
    pub poem: DailyPuzzle,
}

/// Admin write: the whole collection. `data` missing → 400.
#[derive(Deserialize)]
pub struct PoemsIn {
    #[serde(default)]
    pub data: Option<Vec<DailyPuzzle>>,
}

#[derive(Serialize)]
pub struct PoemsOut {
    pub data: Vec<DailyPuzzle>,
}

#[derive(Serialize)]
pub struct MessageOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct RevalidateOut {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
