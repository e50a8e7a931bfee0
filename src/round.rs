//! Round progression: phase, append-only guesses, unlocked clues.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{GuessRecord, GuessStatus, RoundState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  InProgress,
  Won,
  Lost,
}

impl Phase {
  pub fn is_over(self) -> bool { self != Phase::InProgress }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("round for {date} is already over")]
pub struct RoundClosed {
  pub date: String,
}

/// A round plus the budget it is played under.
#[derive(Clone, Debug)]
pub struct Round {
  state: RoundState,
  budget: usize,
}

impl Round {
  pub fn new(state: RoundState, budget: usize) -> Self {
    Self { state, budget }
  }

  pub fn state(&self) -> &RoundState { &self.state }

  pub fn budget(&self) -> usize { self.budget }

  /// A correct guess wins even when it also used the last slot.
  pub fn phase(&self) -> Phase {
    if self.state.guesses.iter().any(|g| g.status == GuessStatus::Correct) {
      Phase::Won
    } else if self.state.guesses.len() >= self.budget {
      Phase::Lost
    } else {
      Phase::InProgress
    }
  }

  pub fn is_over(&self) -> bool { self.phase().is_over() }

  pub fn append(&mut self, record: GuessRecord) -> Result<Phase, RoundClosed> {
    if self.is_over() {
      return Err(RoundClosed { date: self.state.date_key.to_string() });
    }
    self.state.guesses.push(record);
    Ok(self.phase())
  }

  /// One clue per non-winning guess, never more than there are clues.
  pub fn unlocked_clue_count(&self, clue_count: usize) -> usize {
    self.state
      .guesses
      .iter()
      .filter(|g| g.status != GuessStatus::Correct)
      .count()
      .min(clue_count)
  }

  pub fn hints_remaining(&self) -> usize {
    self.budget.saturating_sub(self.state.guesses.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::DateKey;

  fn fresh(budget: usize) -> Round {
    Round::new(RoundState::empty(DateKey::parse("20250101").unwrap()), budget)
  }

  fn miss(w: &str) -> GuessRecord { GuessRecord::new(w, GuessStatus::Incorrect) }

  #[test]
  fn budget_exhaustion_loses_and_closes() {
    let mut r = fresh(4);
    for (i, w) in ["river", "stone", "moon"].iter().enumerate() {
      assert_eq!(r.append(miss(w)), Ok(Phase::InProgress));
      assert_eq!(r.hints_remaining(), 4 - (i + 1));
    }
    assert_eq!(r.append(miss("tree")), Ok(Phase::Lost));
    assert_eq!(r.unlocked_clue_count(3), 3);
    assert_eq!(r.unlocked_clue_count(4), 4);
    assert!(r.append(miss("ox")).is_err());
    assert_eq!(r.state().guesses.len(), 4);
    assert_eq!(r.hints_remaining(), 0);
  }

  #[test]
  fn first_correct_wins_and_closes() {
    let mut r = fresh(4);
    assert_eq!(r.append(GuessRecord::new("light", GuessStatus::Correct)), Ok(Phase::Won));
    assert_eq!(r.append(miss("river")), Err(RoundClosed { date: "20250101".into() }));
    assert_eq!(r.state().guesses.len(), 1);
    assert_eq!(r.unlocked_clue_count(3), 0);
  }

  #[test]
  fn correct_on_last_slot_is_a_win() {
    let mut r = fresh(2);
    r.append(miss("river")).unwrap();
    assert_eq!(r.append(GuessRecord::new("light", GuessStatus::Correct)), Ok(Phase::Won));
    assert_eq!(r.unlocked_clue_count(3), 1);
  }

  #[test]
  fn rhyme_guesses_consume_budget_and_unlock_clues() {
    let mut r = fresh(3);
    r.append(GuessRecord::new("night", GuessStatus::Rhyme)).unwrap();
    r.append(miss("river")).unwrap();
    assert_eq!(r.unlocked_clue_count(3), 2);
    assert_eq!(r.append(GuessRecord::new("kite", GuessStatus::Rhyme)), Ok(Phase::Lost));
  }

  #[test]
  fn unlocked_clues_never_decrease() {
    let mut r = fresh(4);
    let mut last = 0;
    for w in ["a1", "b2", "c3", "d4"] {
      r.append(miss(w)).unwrap();
      let now = r.unlocked_clue_count(3);
      assert!(now >= last && now <= 3);
      last = now;
    }
  }

  #[test]
  fn restored_round_over_budget_is_lost() {
    let mut state = RoundState::empty(DateKey::parse("20250101").unwrap());
    state.guesses = vec![miss("a"), miss("b"), miss("c"), miss("d")];
    assert_eq!(Round::new(state, 3).phase(), Phase::Lost);
  }
}
