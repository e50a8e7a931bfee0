//! Game configuration: rules, lexicon endpoints, content source and storage, from TOML.
//!
//! The file is read from GAME_CONFIG_PATH; every section is optional. A handful of
//! environment variables override the file afterwards (see `apply_env_overrides`).
//!
//! ```toml
//! [rules]
//! guess_budget = 3
//! rhyme_classification = true
//!
//! [lexicon]
//! mode = "local"
//! words = ["light", "night", "bright"]
//! [lexicon.rhymes]
//! bright = ["light", "night"]
//!
//! [content]
//! path = "./data/poems.json"
//!
//! [storage]
//! data_dir = "./data/players"
//! ```

use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::DateKey;

pub const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
pub const DEFAULT_RHYME_URL: &str = "https://api.datamuse.com/words";

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
  pub rules: Rules,
  pub lexicon: LexiconCfg,
  pub content: ContentCfg,
  pub storage: StorageCfg,
  /// Pin "today" to a fixed YYYYMMDD key (replays, local testing).
  pub today: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Rules {
  pub guess_budget: usize,
  pub min_guess_len: usize,
  /// Classify near misses against the poem's bolded word.
  pub rhyme_classification: bool,
}

impl Default for Rules {
  fn default() -> Self {
    Self { guess_budget: 4, min_guess_len: 2, rhyme_classification: false }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LexiconMode {
  #[default]
  Http,
  Local,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LexiconCfg {
  pub mode: LexiconMode,
  pub dictionary_url: String,
  pub rhyme_url: String,
  pub timeout_secs: u64,
  // local mode
  pub words: Vec<String>,
  pub rhymes: HashMap<String, Vec<String>>,
}

impl Default for LexiconCfg {
  fn default() -> Self {
    Self {
      mode: LexiconMode::Http,
      dictionary_url: DEFAULT_DICTIONARY_URL.into(),
      rhyme_url: DEFAULT_RHYME_URL.into(),
      timeout_secs: 10,
      words: Vec::new(),
      rhymes: HashMap::new(),
    }
  }
}

/// Where the daily puzzle collection lives. `path` wins over `url`; with neither,
/// the built-in seed puzzle is served.
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct ContentCfg {
  pub url: Option<String>,
  pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct StorageCfg {
  /// Directory for per-player round/stats records. In-memory when unset.
  pub data_dir: Option<PathBuf>,
}

impl GameConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(s)
  }

  /// Fixed day from config, if it parses.
  pub fn pinned_today(&self) -> Option<DateKey> {
    let raw = self.today.as_deref()?;
    match DateKey::parse(raw) {
      Ok(k) => Some(k),
      Err(e) => {
        warn!(target: "couple_it", error = %e, "Ignoring invalid pinned day");
        None
      }
    }
  }

  fn apply_env_overrides(&mut self) {
    if let Ok(url) = std::env::var("POEMS_URL") { self.content.url = Some(url); }
    if let Ok(path) = std::env::var("POEMS_PATH") { self.content.path = Some(path.into()); }
    if let Ok(dir) = std::env::var("DATA_DIR") { self.storage.data_dir = Some(dir.into()); }
    if let Ok(today) = std::env::var("GAME_TODAY") { self.today = Some(today); }
  }

  /// Clamp values the game cannot run with.
  fn sanitize(&mut self) {
    if self.rules.guess_budget == 0 {
      warn!(target: "couple_it", "guess_budget = 0 is unplayable; using 1");
      self.rules.guess_budget = 1;
    }
    if self.rules.min_guess_len == 0 { self.rules.min_guess_len = 1; }
  }
}

/// Load `GameConfig` from GAME_CONFIG_PATH, then apply env overrides.
/// IO or parse errors are logged and defaults used.
pub fn load_game_config_from_env() -> GameConfig {
  let mut cfg = match std::env::var("GAME_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match GameConfig::from_toml_str(&s) {
        Ok(cfg) => {
          info!(target: "couple_it", %path, "Loaded game config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "couple_it", %path, error = %e, "Failed to parse TOML config");
          GameConfig::default()
        }
      },
      Err(e) => {
        error!(target: "couple_it", %path, error = %e, "Failed to read TOML config file");
        GameConfig::default()
      }
    },
    Err(_) => GameConfig::default(),
  };
  cfg.apply_env_overrides();
  cfg.sanitize();
  cfg
}
