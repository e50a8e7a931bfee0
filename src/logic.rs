//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Resolving/issuing player ids
//!   - Building the game view for today's puzzle
//!   - The guess pipeline (evaluate → append → persist → record completion)
//!   - Stats and the share summary

use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{AggregateStats, DailyPuzzle, DateKey, GuessRecord};
use crate::evaluator::{GuessEvaluator, RejectionReason};
use crate::poem::{display_lines, render_line, Answer};
use crate::protocol::{ClueOut, GameView, GuessOut, StatsOut};
use crate::round::{Phase, Round};
use crate::share::share_text;
use crate::state::AppState;
use crate::store::Persistence;

const MAX_PLAYER_ID_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
  #[error("{0}")]
  Rejected(RejectionReason),
  #[error("The round is already over")]
  RoundOver,
  #[error("Poem not found")]
  NoPuzzle,
  #[error("Round not finished yet")]
  NotFinished,
  #[error("Invalid player id")]
  InvalidPlayer,
}

/// Existing ids must be short and URL/file safe; a missing id gets a fresh one.
pub fn resolve_player(raw: Option<&str>) -> Result<String, GameError> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(Uuid::new_v4().to_string()),
    Some(id) => {
      let ok = id.len() <= MAX_PLAYER_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
      if ok { Ok(id.to_string()) } else { Err(GameError::InvalidPlayer) }
    }
  }
}

/// Today's puzzle and the answer parsed out of it.
async fn todays_puzzle(state: &AppState, today: DateKey) -> Result<(DailyPuzzle, usize, Answer), GameError> {
  let (puzzle, number) = state.content.puzzle_for(today).await.ok_or(GameError::NoPuzzle)?;
  match Answer::from_poem(&puzzle.poem) {
    Some(answer) => Ok((puzzle, number, answer)),
    None => {
      error!(target: "content", %today, "Puzzle has no target span");
      Err(GameError::NoPuzzle)
    }
  }
}

fn build_view(player: &str, puzzle: &DailyPuzzle, number: usize, answer: &Answer, round: &Round, stats: StatsOut) -> GameView {
  let over = round.is_over();
  let unlocked = round.unlocked_clue_count(puzzle.clues.len());
  let lines = display_lines(&puzzle.poem).iter().map(|l| render_line(l, over, None)).collect();
  let clues = puzzle
    .clues
    .iter()
    .enumerate()
    .map(|(i, c)| ClueOut { kind: c.kind.clone(), unlocked: i < unlocked, text: (i < unlocked).then(|| c.text.clone()) })
    .collect();

  GameView {
    player_id: player.to_string(),
    date_key: puzzle.id.to_string(),
    date_label: puzzle.id.date().format("%B %-d, %Y").to_string(),
    puzzle_number: number,
    title: puzzle.poem.title.clone(),
    author: puzzle.poem.author.clone(),
    poem_date: puzzle.poem.date.clone(),
    lines,
    clues,
    guesses: round.state().guesses.clone(),
    phase: round.phase(),
    budget: round.budget(),
    hints_remaining: round.hints_remaining(),
    unlocked_clues: unlocked,
    answer: over.then(|| answer.target.clone()),
    full_poem: over.then(|| puzzle.poem.lines.iter().map(|l| render_line(l, true, None)).collect()),
    stats,
  }
}

#[instrument(level = "info", skip(state), fields(%player))]
pub async fn game_view(state: &AppState, player: &str) -> Result<GameView, GameError> {
  let today = state.today();
  let (puzzle, number, answer) = todays_puzzle(state, today).await?;
  let stats = reconciled_stats(state, player, today).await;
  let round = Round::new(state.persistence(player).load_round(today), state.config.rules.guess_budget);
  Ok(build_view(player, &puzzle, number, &answer, &round, StatsOut::from(&stats)))
}

/// Evaluate and record one guess. Runs under the player's session lock so a
/// second submission waits until this one is persisted.
#[instrument(level = "info", skip(state, raw), fields(%player, guess_len = raw.len()))]
pub async fn submit_guess(state: &AppState, player: &str, raw: &str) -> Result<(GuessRecord, GameView), GameError> {
  let _session = state.lock_session(player).await;

  let today = state.today();
  let budget = state.config.rules.guess_budget;
  let (puzzle, number, answer) = todays_puzzle(state, today).await?;
  let store = state.persistence(player);

  let mut round = Round::new(store.load_round(today), budget);
  if round.is_over() {
    return Err(GameError::RoundOver);
  }

  let record = GuessEvaluator::new(&state.lexicon, &state.config.rules)
    .evaluate(raw, round.state(), &answer)
    .await
    .map_err(|reason| {
      info!(target: "round", %player, %reason, "Guess rejected");
      GameError::Rejected(reason)
    })?;

  // The session lock keeps the round itself stable, but the calendar day can
  // change while a lookup is in flight; such a guess belongs to no round.
  if state.today() != today {
    warn!(target: "round", %player, "Day rolled over during lookup; discarding guess");
    return Err(GameError::RoundOver);
  }
  let phase = round.append(record.clone()).map_err(|e| {
    warn!(target: "round", %player, error = %e, "Discarding late guess");
    GameError::RoundOver
  })?;
  info!(target: "round", %player, word = %record.word, status = ?record.status, ?phase, guesses = round.state().guesses.len(), "Guess recorded");

  if let Err(e) = store.save_round(round.state()) {
    error!(target: "round", %player, error = %e, "Failed to persist round");
  }

  let stats = if phase.is_over() {
    record_completion(&store, today, phase == Phase::Won, round.state().guesses.len())
  } else {
    store.load_stats()
  };

  let view = build_view(player, &puzzle, number, &answer, &round, StatsOut::from(&stats));
  Ok((record, view))
}

fn record_completion(store: &Persistence<'_>, today: DateKey, won: bool, guesses: usize) -> AggregateStats {
  match store.record_completion(today, won, guesses) {
    Ok(stats) => {
      info!(target: "round", %today, won, guesses, streak = stats.current_streak, "Round complete");
      stats
    }
    Err(e) => {
      error!(target: "round", %today, error = %e, "Failed to record completion");
      store.load_stats()
    }
  }
}

/// Wraps `submit_guess` into the response shape both transports send.
pub async fn guess_out(state: &AppState, player: &str, raw: &str) -> Result<GuessOut, GameError> {
  match submit_guess(state, player, raw).await {
    Ok((record, view)) => Ok(GuessOut { accepted: true, reason: None, message: None, record: Some(record), view: Some(view) }),
    Err(GameError::Rejected(reason)) => Ok(GuessOut {
      accepted: false,
      reason: Some(reason),
      message: Some(reason.to_string()),
      record: None,
      view: None,
    }),
    Err(e) => Err(e),
  }
}

/// The rollover reset rewrites the stats record, so it takes the session lock
/// like a completion does.
async fn reconciled_stats(state: &AppState, player: &str, today: DateKey) -> AggregateStats {
  let _session = state.lock_session(player).await;
  state.persistence(player).reconcile_day(today)
}

#[instrument(level = "info", skip(state), fields(%player))]
pub async fn stats_for(state: &AppState, player: &str) -> StatsOut {
  StatsOut::from(&reconciled_stats(state, player, state.today()).await)
}

#[instrument(level = "info", skip(state), fields(%player))]
pub async fn share_for(state: &AppState, player: &str) -> Result<String, GameError> {
  let today = state.today();
  let (puzzle, _, _) = todays_puzzle(state, today).await?;
  let budget = state.config.rules.guess_budget;
  let round = Round::new(state.persistence(player).load_round(today), budget);
  if !round.is_over() {
    return Err(GameError::NotFinished);
  }
  Ok(share_text(&puzzle, round.state(), budget))
}
