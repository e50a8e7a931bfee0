//! Domain models: date keys, daily puzzles (poem + clues), guesses, rounds and stats.

use std::fmt;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// Calendar day, written as `YYYYMMDD` on the wire and in storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
  pub fn parse(raw: &str) -> Result<Self, String> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
      return Err(format!("date key must be 8 digits (YYYYMMDD), got '{raw}'"));
    }
    NaiveDate::parse_from_str(raw, DATE_KEY_FORMAT)
      .map(Self)
      .map_err(|e| format!("invalid date key '{raw}': {e}"))
  }

  /// Today's key, UTC.
  pub fn today() -> Self {
    Self(Utc::now().date_naive())
  }

  pub fn date(&self) -> NaiveDate { self.0 }

  /// The calendar day before this one.
  pub fn previous(&self) -> Self {
    Self(self.0 - Duration::days(1))
  }
}

impl TryFrom<String> for DateKey {
  type Error = String;
  fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<DateKey> for String {
  fn from(key: DateKey) -> Self { key.to_string() }
}

impl fmt::Display for DateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
  }
}

/// One hint card. `kind` is the label shown while the clue is locked.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Clue {
  #[serde(rename = "type")]
  pub kind: String,
  pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poem {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub author: String,
  /// Free-text composition date shown next to the author.
  #[serde(default)]
  pub date: String,
  pub lines: Vec<String>,
  /// Inclusive line indices rendered to the player.
  pub display_range: (usize, usize),
}

/// One day's entry in the content store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyPuzzle {
  pub id: DateKey,
  pub poem: Poem,
  #[serde(default)]
  pub clues: Vec<Clue>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuessStatus {
  Correct,
  Rhyme,
  Incorrect,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
  pub word: String,
  pub status: GuessStatus,
  /// 0–100, only attached to rhyme results.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub popularity: Option<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub locked_in: Option<bool>,
}

impl GuessRecord {
  pub fn new(word: impl Into<String>, status: GuessStatus) -> Self {
    Self { word: word.into(), status, popularity: None, locked_in: None }
  }
}

/// A player's guesses for one calendar day.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundState {
  #[serde(rename = "date")]
  pub date_key: DateKey,
  #[serde(rename = "guessedWords", default)]
  pub guesses: Vec<GuessRecord>,
}

impl RoundState {
  pub fn empty(date_key: DateKey) -> Self {
    Self { date_key, guesses: Vec::new() }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletedGame {
  pub id: DateKey,
  pub guesses: usize,
  pub won: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
  #[serde(default)]
  pub current_streak: u32,
  #[serde(default)]
  pub longest_streak: u32,
  #[serde(default)]
  pub completed_games: Vec<CompletedGame>,
}

impl AggregateStats {
  pub fn has_completed(&self, key: &DateKey) -> bool {
    self.completed_games.iter().any(|g| &g.id == key)
  }

  pub fn wins(&self) -> usize {
    self.completed_games.iter().filter(|g| g.won).count()
  }

  pub fn losses(&self) -> usize {
    self.completed_games.len() - self.wins()
  }

  pub fn average_guesses_on_win(&self) -> Option<f64> {
    let wins = self.wins();
    if wins == 0 { return None; }
    let total: usize = self.completed_games.iter().filter(|g| g.won).map(|g| g.guesses).sum();
    Some(total as f64 / wins as f64)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn date_key_rejects_malformed_and_impossible_dates() {
    assert!(DateKey::parse("2025011").is_err());
    assert!(DateKey::parse("2025-01-01").is_err());
    assert!(DateKey::parse("20250230").is_err());
    assert_eq!(DateKey::parse(" 20250101 ").unwrap().to_string(), "20250101");
  }

  #[test]
  fn previous_crosses_month_and_year_boundaries() {
    assert_eq!(DateKey::parse("20250301").unwrap().previous().to_string(), "20250228");
    assert_eq!(DateKey::parse("20250101").unwrap().previous().to_string(), "20241231");
  }

  #[test]
  fn round_state_uses_stored_field_names() {
    let json = r#"{"date":"20250102","guessedWords":[{"word":"night","status":"rhyme","popularity":80}]}"#;
    let round: RoundState = serde_json::from_str(json).unwrap();
    assert_eq!(round.date_key.to_string(), "20250102");
    assert_eq!(round.guesses[0].status, GuessStatus::Rhyme);
    assert_eq!(round.guesses[0].popularity, Some(80));
    let back = serde_json::to_value(&round).unwrap();
    assert_eq!(back["guessedWords"][0]["word"], "night");
    assert!(back["guessedWords"][0].get("lockedIn").is_none());
  }

  #[test]
  fn stats_derive_wins_losses_and_average() {
    let key = |s: &str| DateKey::parse(s).unwrap();
    let stats = AggregateStats {
      current_streak: 0,
      longest_streak: 2,
      completed_games: vec![
        CompletedGame { id: key("20250101"), guesses: 1, won: true },
        CompletedGame { id: key("20250102"), guesses: 4, won: false },
        CompletedGame { id: key("20250103"), guesses: 2, won: true },
      ],
    };
    assert_eq!(stats.wins(), 2);
    assert_eq!(stats.losses(), 1);
    assert_eq!(stats.average_guesses_on_win(), Some(1.5));
    assert_eq!(AggregateStats::default().average_guesses_on_win(), None);
  }

  #[test]
  fn optional_fields_default_when_absent() {
    let p: DailyPuzzle =
      serde_json::from_str(r#"{"id":"20250101","poem":{"lines":["/a/"],"displayRange":[0,0]}}"#).unwrap();
    assert!(p.poem.title.is_empty() && p.poem.author.is_empty() && p.poem.date.is_empty());
    assert!(p.clues.is_empty());
    let stats: AggregateStats = serde_json::from_str("{}").unwrap();
    assert_eq!(stats, AggregateStats::default());
  }

  #[test]
  fn puzzle_parses_camel_case_collection_entry() {
    let json = r#"{
      "id": "20250101",
      "poem": { "title": "T", "author": "A", "date": "1850",
                "lines": ["the *night*", "the /light/"], "displayRange": [0, 1] },
      "clues": [{ "type": "letters", "text": "5" }]
    }"#;
    let p: DailyPuzzle = serde_json::from_str(json).unwrap();
    assert_eq!(p.poem.display_range, (0, 1));
    assert_eq!(p.clues[0].kind, "letters");
  }
}
