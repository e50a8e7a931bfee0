//! Spoiler-free result summary players paste elsewhere.

use crate::domain::{DailyPuzzle, GuessStatus, RoundState};
use crate::poem::{display_lines, masked_line};

const HEADER: &str = "✨🌟 Couple It! 🌟✨";

fn glyph(status: Option<GuessStatus>) -> char {
  match status {
    Some(GuessStatus::Correct) => '📗',
    Some(GuessStatus::Rhyme) => '📙',
    Some(GuessStatus::Incorrect) => '📕',
    None => '🕮',
  }
}

pub fn guess_glyphs(round: &RoundState, budget: usize) -> String {
  (0..budget.max(round.guesses.len()))
    .map(|i| glyph(round.guesses.get(i).map(|g| g.status)))
    .collect()
}

/// Letters mapped to Unicode mathematical italic; everything else unchanged.
pub fn to_italic(text: &str) -> String {
  text.chars()
    .map(|c| match c {
      'h' => 'ℎ',
      'A'..='Z' => char::from_u32(0x1D434 + (c as u32 - 'A' as u32)).unwrap_or(c),
      'a'..='z' => char::from_u32(0x1D44E + (c as u32 - 'a' as u32)).unwrap_or(c),
      _ => c,
    })
    .collect()
}

pub fn share_text(puzzle: &DailyPuzzle, round: &RoundState, budget: usize) -> String {
  let couplet = display_lines(&puzzle.poem)
    .iter()
    .map(|l| masked_line(l))
    .collect::<Vec<_>>()
    .join("\n");
  let date = round.date_key.date().format("%d/%m/%Y");
  to_italic(&format!(
    "{HEADER}\n{date}\n\n{couplet}\n\nGuesses: {}",
    guess_glyphs(round, budget)
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{DateKey, GuessRecord};
  use crate::seeds::hard_fallback_puzzle;

  #[test]
  fn italic_maps_letters_and_keeps_the_rest() {
    assert_eq!(to_italic("Ah 1!"), "\u{1D434}ℎ 1!");
    assert_eq!(to_italic("z"), "\u{1D467}");
  }

  #[test]
  fn glyphs_fill_the_budget() {
    let mut round = RoundState::empty(DateKey::parse("20250101").unwrap());
    round.guesses.push(GuessRecord::new("night", GuessStatus::Rhyme));
    round.guesses.push(GuessRecord::new("light", GuessStatus::Correct));
    assert_eq!(guess_glyphs(&round, 4), "📙📗🕮🕮");
  }

  #[test]
  fn share_text_hides_the_answer() {
    let day = DateKey::parse("20250102").unwrap();
    let puzzle = hard_fallback_puzzle(day);
    let mut round = RoundState::empty(day);
    round.guesses.push(GuessRecord::new("light", GuessStatus::Correct));
    let text = share_text(&puzzle, &round, 4);
    assert!(text.contains("02/01/2025"));
    assert!(text.contains("_____."));
    assert!(!text.contains(&to_italic("light")));
    assert!(text.ends_with("📗🕮🕮🕮"));
  }
}
