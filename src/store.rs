//! Player-local persistence.
//!
//! `KvStore` is the durable text store (one value per key, last write wins).
//! `Persistence` sits on top and keeps exactly two JSON records per player:
//! the current round and the aggregate stats.
//!
//! Reads never fail from the caller's point of view: missing or unreadable data
//! means "first time playing today".

use std::{
  collections::HashMap,
  fs,
  io,
  path::PathBuf,
  sync::Mutex,
};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::{AggregateStats, CompletedGame, DateKey, RoundState};

const ROUND_KEY: &str = "round";
const STATS_KEY: &str = "stats";

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage io: {0}")]
  Io(#[from] io::Error),
  #[error("encoding: {0}")]
  Encode(#[from] serde_json::Error),
  #[error("storage lock poisoned")]
  Poisoned,
}

pub trait KvStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryKv {
  inner: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryKv {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let map = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
    Ok(map.get(key).cloned())
  }

  fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut map = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
    map.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

/// One file per key under `dir`. Writes go through a temp file + rename.
///
/// IO is blocking `std::fs`. Records are a few hundred bytes and every call for
/// a player runs under that player's session lock, so a call costs one small
/// read or write on the worker thread. Two writers never share a `.json.tmp`
/// path because of that lock.
pub struct FileKv {
  dir: PathBuf,
}

impl FileKv {
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let dir = dir.into();
    fs::create_dir_all(&dir)?;
    info!(target: "couple_it", dir = %dir.display(), "File storage ready");
    Ok(Self { dir })
  }

  fn path_for(&self, key: &str) -> PathBuf {
    let name: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
      .collect();
    self.dir.join(format!("{name}.json"))
  }
}

impl KvStore for FileKv {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let path = self.path_for(key);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, value)?;
    fs::rename(&tmp, &path)?;
    Ok(())
  }
}

/// The two records of one player.
pub struct Persistence<'a> {
  kv: &'a dyn KvStore,
  player: &'a str,
}

impl<'a> Persistence<'a> {
  pub fn new(kv: &'a dyn KvStore, player: &'a str) -> Self {
    Self { kv, player }
  }

  fn key(&self, record: &str) -> String {
    format!("{}.{}", self.player, record)
  }

  fn read<T: serde::de::DeserializeOwned>(&self, record: &str) -> Option<T> {
    let raw = match self.kv.get(&self.key(record)) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(target: "couple_it", player = %self.player, record, error = %e, "Read failed; starting fresh");
        return None;
      }
    };
    match serde_json::from_str(&raw) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(target: "couple_it", player = %self.player, record, error = %e, "Stored record unreadable; starting fresh");
        None
      }
    }
  }

  fn write<T: serde::Serialize>(&self, record: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    self.kv.put(&self.key(record), &raw)
  }

  /// The stored round when it belongs to `today`, otherwise a fresh one.
  /// A stale record is left in place until the next save overwrites it.
  pub fn load_round(&self, today: DateKey) -> RoundState {
    match self.read::<RoundState>(ROUND_KEY) {
      Some(state) if state.date_key == today => state,
      Some(stale) => {
        debug!(target: "round", player = %self.player, stored = %stale.date_key, %today, "Stored round is for another day");
        RoundState::empty(today)
      }
      None => RoundState::empty(today),
    }
  }

  pub fn save_round(&self, state: &RoundState) -> Result<(), StoreError> {
    self.write(ROUND_KEY, state)
  }

  pub fn load_stats(&self) -> AggregateStats {
    self.read(STATS_KEY).unwrap_or_default()
  }

  /// Day rollover: a streak survives only if yesterday (or today) was completed.
  pub fn reconcile_day(&self, today: DateKey) -> AggregateStats {
    let mut stats = self.load_stats();
    if stats.current_streak > 0 && !stats.has_completed(&today) && !stats.has_completed(&today.previous()) {
      info!(target: "round", player = %self.player, %today, lost_streak = stats.current_streak, "Streak broken");
      stats.current_streak = 0;
      if let Err(e) = self.write(STATS_KEY, &stats) {
        warn!(target: "couple_it", player = %self.player, error = %e, "Failed to persist streak reset");
      }
    }
    stats
  }

  /// Idempotent per day: a second call for the same day changes nothing.
  #[instrument(level = "info", skip(self), fields(player = %self.player))]
  pub fn record_completion(&self, date: DateKey, won: bool, guess_count: usize) -> Result<AggregateStats, StoreError> {
    let mut stats = self.load_stats();
    if apply_completion(&mut stats, date, won, guess_count) {
      self.write(STATS_KEY, &stats)?;
    }
    Ok(stats)
  }
}

/// Returns false when `date` was already recorded.
pub fn apply_completion(stats: &mut AggregateStats, date: DateKey, won: bool, guess_count: usize) -> bool {
  if stats.has_completed(&date) {
    return false;
  }
  let played_yesterday = stats.has_completed(&date.previous());
  stats.completed_games.push(CompletedGame { id: date, guesses: guess_count, won });
  stats.current_streak = match (won, played_yesterday) {
    (true, true) => stats.current_streak + 1,
    (true, false) => 1,
    (false, _) => 0,
  };
  stats.longest_streak = stats.longest_streak.max(stats.current_streak);
  true
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;
  use crate::domain::{GuessRecord, GuessStatus};

  fn key(s: &str) -> DateKey { DateKey::parse(s).unwrap() }

  #[test]
  fn round_is_kept_for_same_day_only() {
    let kv = MemoryKv::default();
    let p = Persistence::new(&kv, "p1");
    let mut round = RoundState::empty(key("20250101"));
    round.guesses.push(GuessRecord::new("river", GuessStatus::Incorrect));
    p.save_round(&round).unwrap();

    assert_eq!(p.load_round(key("20250101")), round);
    let next = p.load_round(key("20250102"));
    assert!(next.guesses.is_empty());
    assert_eq!(next.date_key, key("20250102"));
    // the stale record was not deleted
    assert!(kv.get("p1.round").unwrap().is_some());
  }

  #[test]
  fn players_do_not_share_records() {
    let kv = MemoryKv::default();
    let mut round = RoundState::empty(key("20250101"));
    round.guesses.push(GuessRecord::new("river", GuessStatus::Incorrect));
    Persistence::new(&kv, "a").save_round(&round).unwrap();
    assert!(Persistence::new(&kv, "b").load_round(key("20250101")).guesses.is_empty());
  }

  #[test]
  fn garbage_record_reads_as_fresh() {
    let kv = MemoryKv::default();
    kv.put("p1.round", "{not json").unwrap();
    kv.put("p1.stats", "[]").unwrap();
    let p = Persistence::new(&kv, "p1");
    assert!(p.load_round(key("20250101")).guesses.is_empty());
    assert_eq!(p.load_stats(), AggregateStats::default());
  }

  #[test]
  fn record_completion_is_idempotent() {
    let kv = MemoryKv::default();
    let p = Persistence::new(&kv, "p1");
    let first = p.record_completion(key("20250101"), true, 2).unwrap();
    let second = p.record_completion(key("20250101"), false, 4).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.completed_games.len(), 1);
    assert_eq!(p.load_stats(), first);
  }

  #[test]
  fn streak_continues_after_yesterday_and_resets_after_gap() {
    let mut stats = AggregateStats {
      current_streak: 3,
      longest_streak: 3,
      completed_games: vec![CompletedGame { id: key("20250101"), guesses: 1, won: true }],
    };
    assert!(apply_completion(&mut stats, key("20250102"), true, 2));
    assert_eq!(stats.current_streak, 4);
    assert_eq!(stats.longest_streak, 4);

    assert!(apply_completion(&mut stats, key("20250105"), true, 1));
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.longest_streak, 4);
  }

  #[test]
  fn loss_resets_streak() {
    let mut stats = AggregateStats::default();
    apply_completion(&mut stats, key("20250101"), true, 1);
    apply_completion(&mut stats, key("20250102"), false, 4);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.longest_streak, 1);
    assert_eq!(stats.losses(), 1);
  }

  #[test]
  fn rollover_breaks_streak_when_yesterday_missed() {
    let kv = MemoryKv::default();
    let p = Persistence::new(&kv, "p1");
    p.record_completion(key("20250101"), true, 1).unwrap();

    assert_eq!(p.reconcile_day(key("20250102")).current_streak, 1);
    assert_eq!(p.reconcile_day(key("20250103")).current_streak, 0);
    assert_eq!(p.load_stats().current_streak, 0);
    assert_eq!(p.load_stats().longest_streak, 1);
  }

  #[test]
  fn file_kv_roundtrips_and_sanitizes_keys() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("players");
    let kv = FileKv::open(&dir).unwrap();
    assert_eq!(kv.get("../escape").unwrap(), None);
    kv.put("../escape", "v1").unwrap();
    kv.put("../escape", "v2").unwrap();
    assert_eq!(kv.get("../escape").unwrap().as_deref(), Some("v2"));
    assert!(dir.join(".._escape.json").exists());
  }
}
