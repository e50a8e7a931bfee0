//! Built-in content so the game is playable without a configured collection.

use crate::domain::{Clue, DailyPuzzle, DateKey, Poem};

/// Absolute last-resort puzzle, stamped with the requested day.
pub fn hard_fallback_puzzle(day: DateKey) -> DailyPuzzle {
  DailyPuzzle {
    id: day,
    poem: Poem {
      title: "Do not go gentle into that good night".into(),
      author: "Dylan Thomas".into(),
      date: "1951".into(),
      lines: vec![
        "Do not go gentle into that good *night*,".into(),
        "Old age should burn and rave at close of day;".into(),
        "Rage, rage against the dying of the /light/.".into(),
      ],
      display_range: (0, 2),
    },
    clues: vec![
      Clue { kind: "letters".into(), text: "5 letters".into() },
      Clue { kind: "first letter".into(), text: "Starts with L".into() },
      Clue { kind: "meaning".into(), text: "The opposite of darkness".into() },
    ],
  }
}
