//! Guess evaluation: shape checks, duplicate check, dictionary check, then
//! classification against the day's answer.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Rules;
use crate::domain::{GuessRecord, GuessStatus, RoundState};
use crate::lexicon::{RhymeClassifier, RhymeEntry, WordValidator};
use crate::poem::Answer;

/// Why a submission was not counted. None of these touch the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
  #[error("Enter a word")]
  Empty,
  #[error("Invalid Word")]
  TooShort,
  #[error("Duplicate Guess")]
  Duplicate,
  #[error("Invalid Word")]
  NotAWord,
}

pub struct GuessEvaluator<'a, L> {
  lexicon: &'a L,
  min_len: usize,
  classify_rhymes: bool,
}

impl<'a, L> GuessEvaluator<'a, L>
where
  L: WordValidator + RhymeClassifier + Sync,
{
  pub fn new(lexicon: &'a L, rules: &Rules) -> Self {
    Self { lexicon, min_len: rules.min_guess_len, classify_rhymes: rules.rhyme_classification }
  }

  /// Checks run in order and the first failure wins:
  /// empty, too short, duplicate, unknown word.
  #[instrument(level = "debug", skip(self, round, answer), fields(guesses = round.guesses.len()))]
  pub async fn evaluate(
    &self,
    candidate: &str,
    round: &RoundState,
    answer: &Answer,
  ) -> Result<GuessRecord, RejectionReason> {
    let word = candidate.trim().to_lowercase();
    if word.is_empty() {
      return Err(RejectionReason::Empty);
    }
    if word.chars().count() < self.min_len {
      return Err(RejectionReason::TooShort);
    }
    if round.guesses.iter().any(|g| g.word.to_lowercase() == word) {
      return Err(RejectionReason::Duplicate);
    }
    if !self.lexicon.is_real_word(&word).await {
      return Err(RejectionReason::NotAWord);
    }

    if answer.matches(&word) {
      return Ok(GuessRecord::new(word, GuessStatus::Correct));
    }

    if self.classify_rhymes {
      if let Some(hint) = &answer.rhyme_hint {
        let rhymes = self.lexicon.rhymes_of(hint).await;
        if let Some(popularity) = rhyme_popularity(&rhymes, &word) {
          debug!(target: "round", %word, %hint, popularity, "Guess rhymes with hint word");
          return Ok(GuessRecord { popularity: Some(popularity), ..GuessRecord::new(word, GuessStatus::Rhyme) });
        }
      }
    }

    Ok(GuessRecord::new(word, GuessStatus::Incorrect))
  }
}

/// Rank of `word` in the lookup list mapped onto 1..=100, best rhyme = 100.
/// `None` when the word is not in the list.
pub fn rhyme_popularity(rhymes: &[RhymeEntry], word: &str) -> Option<u8> {
  let pos = rhymes.iter().position(|e| e.word.trim().eq_ignore_ascii_case(word))?;
  let len = rhymes.len();
  let pct = 100 - (pos * 100) / len;
  Some(pct.clamp(1, 100) as u8)
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::domain::DateKey;
  use crate::lexicon::LocalLexicon;

  fn lexicon() -> LocalLexicon {
    let mut rhymes = HashMap::new();
    rhymes.insert("bright".to_string(), vec!["light".into(), "night".into(), "kite".into(), "sight".into()]);
    LocalLexicon::new(["river", "stone", "moon", "tree", "ox"], rhymes)
  }

  fn answer() -> Answer {
    Answer { target: "LIGHT".into(), rhyme_hint: Some("bright".into()) }
  }

  fn round(words: &[&str]) -> RoundState {
    let mut r = RoundState::empty(DateKey::parse("20250101").unwrap());
    r.guesses = words.iter().map(|w| GuessRecord::new(*w, GuessStatus::Incorrect)).collect();
    r
  }

  fn rules(rhymes: bool) -> Rules {
    Rules { rhyme_classification: rhymes, ..Rules::default() }
  }

  #[tokio::test]
  async fn shape_checks_short_circuit_in_order() {
    let lex = lexicon();
    let rules = rules(false);
    let ev = GuessEvaluator::new(&lex, &rules);
    assert_eq!(ev.evaluate("   ", &round(&[]), &answer()).await, Err(RejectionReason::Empty));
    assert_eq!(ev.evaluate("a", &round(&[]), &answer()).await, Err(RejectionReason::TooShort));
    // Duplicate is reported even though "zz" would also fail the dictionary.
    assert_eq!(ev.evaluate("ZZ", &round(&["zz"]), &answer()).await, Err(RejectionReason::Duplicate));
    assert_eq!(ev.evaluate("hi", &round(&[]), &answer()).await, Err(RejectionReason::NotAWord));
  }

  #[tokio::test]
  async fn duplicate_check_ignores_case() {
    let lex = lexicon();
    let rules = rules(false);
    let ev = GuessEvaluator::new(&lex, &rules);
    assert_eq!(ev.evaluate("River", &round(&["river"]), &answer()).await, Err(RejectionReason::Duplicate));
  }

  #[tokio::test]
  async fn target_in_any_casing_is_correct() {
    let lex = lexicon();
    let rules = rules(false);
    let ev = GuessEvaluator::new(&lex, &rules);
    for cased in ["light", "LIGHT", "LiGhT", " light "] {
      let rec = ev.evaluate(cased, &round(&[]), &answer()).await.unwrap();
      assert_eq!(rec.status, GuessStatus::Correct, "{cased}");
      assert_eq!(rec.word, "light");
      assert_eq!(rec.popularity, None);
    }
  }

  #[tokio::test]
  async fn rhymes_only_classified_when_enabled() {
    let lex = lexicon();
    let off = rules(false);
    let rec = GuessEvaluator::new(&lex, &off).evaluate("night", &round(&[]), &answer()).await.unwrap();
    assert_eq!(rec.status, GuessStatus::Incorrect);

    let on = rules(true);
    let rec = GuessEvaluator::new(&lex, &on).evaluate("Night", &round(&[]), &answer()).await.unwrap();
    assert_eq!(rec.status, GuessStatus::Rhyme);
    assert_eq!(rec.popularity, Some(75));

    let rec = GuessEvaluator::new(&lex, &on).evaluate("river", &round(&[]), &answer()).await.unwrap();
    assert_eq!(rec.status, GuessStatus::Incorrect);
  }

  #[tokio::test]
  async fn no_hint_word_means_no_rhyme_class() {
    let lex = lexicon();
    let on = rules(true);
    let a = Answer { target: "light".into(), rhyme_hint: None };
    let rec = GuessEvaluator::new(&lex, &on).evaluate("night", &round(&[]), &a).await.unwrap();
    assert_eq!(rec.status, GuessStatus::Incorrect);
  }

  #[test]
  fn popularity_follows_rank() {
    let list: Vec<RhymeEntry> = ["a", "b", "c"].iter().map(|w| RhymeEntry { word: w.to_string(), score: None }).collect();
    assert_eq!(rhyme_popularity(&list, "A"), Some(100));
    assert_eq!(rhyme_popularity(&list, "c"), Some(34));
    assert_eq!(rhyme_popularity(&list, "d"), None);
    assert_eq!(rhyme_popularity(&[], "a"), None);
  }
}
