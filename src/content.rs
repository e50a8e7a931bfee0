//! Daily puzzle collection: where it comes from, the in-memory cache, and the
//! admin overwrite path.
//!
//! Sources, in order of preference:
//!   - a local JSON file (`content.path`), read-write
//!   - a remote JSON blob (`content.url`), read-only
//!   - nothing: an empty in-memory collection that falls back to the built-in
//!     seed puzzle for any day without an entry

use std::{collections::HashSet, path::PathBuf, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::ContentCfg;
use crate::domain::{DailyPuzzle, DateKey};
use crate::poem::span_counts;
use crate::seeds::hard_fallback_puzzle;

#[derive(Debug, Error)]
pub enum ContentError {
  #[error("fetch failed: {0}")]
  Fetch(String),
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),
  #[error("puzzle {id}: {reason}")]
  Invalid { id: String, reason: String },
  #[error("content source is read-only")]
  ReadOnly,
}

#[derive(Clone, Debug)]
pub enum ContentSource {
  File(PathBuf),
  Remote { url: String, client: reqwest::Client },
  Memory,
}

#[derive(Clone)]
pub struct ContentStore {
  source: ContentSource,
  cache: Arc<RwLock<Vec<DailyPuzzle>>>,
  seed_fallback: bool,
}

impl ContentStore {
  pub fn from_config(cfg: &ContentCfg) -> Self {
    if let Some(path) = &cfg.path {
      info!(target: "content", path = %path.display(), "Puzzle collection from file");
      return Self::with_source(ContentSource::File(path.clone()), Vec::new());
    }
    if let Some(url) = &cfg.url {
      let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .unwrap_or_else(|e| {
          error!(target: "content", error = %e, "Failed to build HTTP client with timeout; using defaults");
          reqwest::Client::new()
        });
      info!(target: "content", %url, "Puzzle collection from remote blob");
      return Self::with_source(ContentSource::Remote { url: url.clone(), client }, Vec::new());
    }
    warn!(target: "content", "No content source configured; serving the built-in seed puzzle");
    Self { seed_fallback: true, ..Self::in_memory(Vec::new()) }
  }

  pub fn in_memory(puzzles: Vec<DailyPuzzle>) -> Self {
    Self::with_source(ContentSource::Memory, puzzles)
  }

  fn with_source(source: ContentSource, puzzles: Vec<DailyPuzzle>) -> Self {
    Self { source, cache: Arc::new(RwLock::new(sorted(puzzles))), seed_fallback: false }
  }

  async fn fetch(&self) -> Result<Option<Vec<DailyPuzzle>>, ContentError> {
    match &self.source {
      ContentSource::File(path) => match tokio::fs::read_to_string(path).await {
        Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
          warn!(target: "content", path = %path.display(), "Collection file missing; starting empty");
          Ok(Some(Vec::new()))
        }
        Err(e) => Err(e.into()),
      },
      ContentSource::Remote { url, client } => {
        let res = client.get(url).send().await.map_err(|e| ContentError::Fetch(e.to_string()))?;
        if !res.status().is_success() {
          return Err(ContentError::Fetch(format!("HTTP {}", res.status())));
        }
        let list = res.json::<Vec<DailyPuzzle>>().await.map_err(|e| ContentError::Fetch(e.to_string()))?;
        Ok(Some(list))
      }
      ContentSource::Memory => Ok(None),
    }
  }

  /// Reload from the source. On failure the previous cache stays in place.
  #[instrument(level = "info", skip(self))]
  pub async fn refresh(&self) -> Result<usize, ContentError> {
    match self.fetch().await {
      Ok(Some(list)) => {
        let n = list.len();
        *self.cache.write().await = sorted(list);
        info!(target: "content", puzzles = n, "Puzzle collection loaded");
        Ok(n)
      }
      Ok(None) => Ok(self.cache.read().await.len()),
      Err(e) => {
        error!(target: "content", error = %e, "Puzzle collection refresh failed; keeping cached copy");
        Err(e)
      }
    }
  }

  /// The puzzle for `day` and its 1-based number in the collection.
  pub async fn puzzle_for(&self, day: DateKey) -> Option<(DailyPuzzle, usize)> {
    let cache = self.cache.read().await;
    match cache.binary_search_by(|p| p.id.cmp(&day)) {
      Ok(idx) => Some((cache[idx].clone(), idx + 1)),
      Err(_) if self.seed_fallback => {
        warn!(target: "content", %day, "No puzzle for day; serving seed");
        Some((hard_fallback_puzzle(day), cache.len() + 1))
      }
      Err(_) => None,
    }
  }

  pub async fn all(&self) -> Vec<DailyPuzzle> {
    self.cache.read().await.clone()
  }

  /// Replace the whole collection. Every entry is validated first; one bad
  /// entry rejects the write.
  #[instrument(level = "info", skip(self, puzzles), fields(count = puzzles.len()))]
  pub async fn overwrite(&self, puzzles: Vec<DailyPuzzle>) -> Result<usize, ContentError> {
    validate_collection(&puzzles)?;
    let puzzles = sorted(puzzles);
    match &self.source {
      ContentSource::Remote { .. } => return Err(ContentError::ReadOnly),
      ContentSource::File(path) => {
        let raw = serde_json::to_string_pretty(&puzzles)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, path).await?;
      }
      ContentSource::Memory => {}
    }
    let n = puzzles.len();
    *self.cache.write().await = puzzles;
    info!(target: "content", puzzles = n, "Puzzle collection overwritten");
    Ok(n)
  }
}

fn sorted(mut puzzles: Vec<DailyPuzzle>) -> Vec<DailyPuzzle> {
  puzzles.sort_by(|a, b| a.id.cmp(&b.id));
  puzzles
}

pub fn validate_puzzle(p: &DailyPuzzle) -> Result<(), String> {
  let (targets, hints) = span_counts(&p.poem);
  if targets != 1 {
    return Err(format!("expected exactly one /target/ span, found {targets}"));
  }
  if hints > 1 {
    return Err(format!("at most one *rhyme hint* span allowed, found {hints}"));
  }
  let (start, end) = p.poem.display_range;
  if start > end || end >= p.poem.lines.len() {
    return Err(format!("display range [{start}, {end}] outside {} lines", p.poem.lines.len()));
  }
  if p.clues.is_empty() {
    return Err("no clues".into());
  }
  Ok(())
}

pub fn validate_collection(puzzles: &[DailyPuzzle]) -> Result<(), ContentError> {
  let mut seen = HashSet::new();
  for p in puzzles {
    if !seen.insert(p.id) {
      return Err(ContentError::Invalid { id: p.id.to_string(), reason: "duplicate id".into() });
    }
    validate_puzzle(p).map_err(|reason| ContentError::Invalid { id: p.id.to_string(), reason })?;
  }
  Ok(())
}
