//! Poem line markup.
//!
//! Lines carry two kinds of marked spans:
//!   `*word*` : emphasis, used for the rhyme-hint word
//!   `/word/` : the hidden target word
//!
//! Inside a span the other marker is literal text. A marker without a closing
//! partner is dropped, the surrounding text is kept.

use serde::Serialize;

use crate::domain::Poem;

const EMPHASIS: char = '*';
const TARGET: char = '/';

/// Placeholder rendered where the target sits while the round is running.
pub const BLANK: &str = "____";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment {
    Plain(String),
    Emphasis(String),
    Target(String),
}

pub fn parse_line(line: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        let after = &rest[ch.len_utf8()..];
        if ch == EMPHASIS || ch == TARGET {
            if let Some(end) = after.find(ch) {
                if !plain.is_empty() {
                    out.push(Segment::Plain(std::mem::take(&mut plain)));
                }
                let inner = after[..end].to_string();
                out.push(if ch == EMPHASIS { Segment::Emphasis(inner) } else { Segment::Target(inner) });
                rest = &after[end + ch.len_utf8()..];
                continue;
            }
            // unmatched marker
            rest = after;
            continue;
        }
        plain.push(ch);
        rest = after;
    }
    if !plain.is_empty() {
        out.push(Segment::Plain(plain));
    }
    out
}

/// The hidden word and, when the poem bolds one, the word it should rhyme with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    pub target: String,
    pub rhyme_hint: Option<String>,
}

impl Answer {
    pub fn from_poem(poem: &Poem) -> Option<Self> {
        let mut target = None;
        let mut rhyme_hint = None;
        for seg in poem.lines.iter().flat_map(|l| parse_line(l)) {
            match seg {
                Segment::Target(t) if target.is_none() && !t.trim().is_empty() => target = Some(t.trim().to_string()),
                Segment::Emphasis(e) if rhyme_hint.is_none() && !e.trim().is_empty() => rhyme_hint = Some(e.trim().to_string()),
                _ => {}
            }
        }
        target.map(|target| Self { target, rhyme_hint })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let t = comparable(&self.target);
        !t.is_empty() && t == comparable(candidate)
    }
}

/// Case-folded ASCII letters only.
pub fn comparable(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Counts of each span kind across a poem; used when validating content.
pub fn span_counts(poem: &Poem) -> (usize, usize) {
    poem.lines
        .iter()
        .flat_map(|l| parse_line(l))
        .fold((0, 0), |(t, e), seg| match seg {
            Segment::Target(_) => (t + 1, e),
            Segment::Emphasis(_) => (t, e + 1),
            Segment::Plain(_) => (t, e),
        })
}

/// Lines of the display range, clamped to the poem.
pub fn display_lines(poem: &Poem) -> &[String] {
    let (start, end) = poem.display_range;
    if poem.lines.is_empty() || start > end || start >= poem.lines.len() {
        return &[];
    }
    let end = end.min(poem.lines.len() - 1);
    &poem.lines[start..=end]
}

/// Replace the target segment with either the word itself (`reveal`), the
/// player's pending input, or the blank placeholder.
pub fn render_line(line: &str, reveal: bool, pending: Option<&str>) -> Vec<Segment> {
    parse_line(line)
        .into_iter()
        .map(|seg| match seg {
            Segment::Target(_) if !reveal => {
                Segment::Target(pending.filter(|p| !p.is_empty()).unwrap_or(BLANK).to_string())
            }
            other => other,
        })
        .collect()
}

/// Plain text with markers removed and the target replaced by underscores of
/// the same length. Used by the share summary.
pub fn masked_line(line: &str) -> String {
    parse_line(line)
        .into_iter()
        .map(|seg| match seg {
            Segment::Plain(s) | Segment::Emphasis(s) => s,
            Segment::Target(t) => "_".repeat(t.chars().count()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poem(lines: &[&str], range: (usize, usize)) -> Poem {
        Poem {
            title: "Title".into(),
            author: "Author".into(),
            date: String::new(),
            lines: lines.iter().map(|s| s.to_string()).collect(),
            display_range: range,
        }
    }

    #[test]
    fn splits_plain_emphasis_and_target() {
        let segs = parse_line("Into the *night* we go, toward the /light/.");
        assert_eq!(
            segs,
            vec![
                Segment::Plain("Into the ".into()),
                Segment::Emphasis("night".into()),
                Segment::Plain(" we go, toward the ".into()),
                Segment::Target("light".into()),
                Segment::Plain(".".into()),
            ]
        );
    }

    #[test]
    fn other_marker_is_literal_inside_span_and_unmatched_marker_is_dropped() {
        assert_eq!(parse_line("*and/or*"), vec![Segment::Emphasis("and/or".into())]);
        assert_eq!(parse_line("a * b"), vec![Segment::Plain("a  b".into())]);
    }

    #[test]
    fn answer_takes_first_target_and_hint_across_lines() {
        let p = poem(&["The day is *bright*", "and so the /Night/ falls"], (0, 1));
        let a = Answer::from_poem(&p).unwrap();
        assert_eq!(a.target, "Night");
        assert_eq!(a.rhyme_hint.as_deref(), Some("bright"));
        assert!(a.matches("nIGHT"));
        assert!(a.matches(" night "));
        assert!(!a.matches("nights"));
    }

    #[test]
    fn poem_without_target_has_no_answer() {
        assert!(Answer::from_poem(&poem(&["just *text*"], (0, 0))).is_none());
    }

    #[test]
    fn render_hides_target_unless_revealed() {
        let blank = render_line("the /light/", false, None);
        assert_eq!(blank[1], Segment::Target(BLANK.into()));
        let typing = render_line("the /light/", false, Some("li"));
        assert_eq!(typing[1], Segment::Target("li".into()));
        let shown = render_line("the /light/", true, None);
        assert_eq!(shown[1], Segment::Target("light".into()));
    }

    #[test]
    fn masked_line_strips_markup() {
        assert_eq!(masked_line("a *bold* /light/!"), "a bold _____!");
    }

    #[test]
    fn display_lines_clamp_to_poem() {
        let p = poem(&["a", "b", "c"], (1, 9));
        assert_eq!(display_lines(&p), &["b".to_string(), "c".to_string()]);
        assert!(display_lines(&poem(&["a"], (3, 4))).is_empty());
    }

    #[test]
    fn span_counts_cover_all_lines() {
        let p = poem(&["*a* /b/", "/c/"], (0, 1));
        assert_eq!(span_counts(&p), (2, 1));
    }
}
