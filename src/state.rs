//! Application state: config, lexicon, content store, player storage, and the
//! per-player session locks.
//!
//! Everything that writes a player's records runs under that player's session
//! lock: a guess holds it from validation through persistence, and the
//! day-rollover stats reset holds it too, so two writers never interleave.
//! Session entries are dropped once nobody holds or waits on them.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, instrument, warn};

use crate::config::{load_game_config_from_env, GameConfig};
use crate::content::ContentStore;
use crate::domain::DateKey;
use crate::lexicon::Lexicon;
use crate::store::{FileKv, KvStore, MemoryKv, Persistence};

#[derive(Clone)]
pub struct AppState {
    pub config: GameConfig,
    pub lexicon: Lexicon,
    pub content: ContentStore,
    pub kv: Arc<dyn KvStore>,
    sessions: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
    pinned_today: Option<DateKey>,
}

impl AppState {
    /// Build state from env: load config, pick lexicon, content source and storage.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_game_config_from_env();
        let lexicon = Lexicon::from_config(&config.lexicon);
        let content = ContentStore::from_config(&config.content);

        let kv: Arc<dyn KvStore> = match &config.storage.data_dir {
            Some(dir) => match FileKv::open(dir) {
                Ok(kv) => Arc::new(kv),
                Err(e) => {
                    error!(target: "couple_it", dir = %dir.display(), error = %e, "Cannot open data dir; player records kept in memory");
                    Arc::new(MemoryKv::default())
                }
            },
            None => {
                warn!(target: "couple_it", "DATA_DIR not set; player records kept in memory");
                Arc::new(MemoryKv::default())
            }
        };

        info!(
            target: "couple_it",
            budget = config.rules.guess_budget,
            rhymes = config.rules.rhyme_classification,
            "Game rules"
        );
        Self::from_parts(config, lexicon, content, kv)
    }

    pub fn from_parts(config: GameConfig, lexicon: Lexicon, content: ContentStore, kv: Arc<dyn KvStore>) -> Self {
        let pinned_today = config.pinned_today();
        if let Some(day) = pinned_today {
            warn!(target: "couple_it", %day, "Today is pinned by configuration");
        }
        Self {
            config,
            lexicon,
            content,
            kv,
            sessions: Arc::new(StdMutex::new(HashMap::new())),
            pinned_today,
        }
    }

    pub fn today(&self) -> DateKey {
        self.pinned_today.unwrap_or_else(DateKey::today)
    }

    pub fn persistence<'a>(&'a self, player: &'a str) -> Persistence<'a> {
        Persistence::new(self.kv.as_ref(), player)
    }

    /// Wait for exclusive access to this player's records. The entry is
    /// created on first use and removed when the last guard drops.
    pub async fn lock_session(&self, player: &str) -> SessionGuard {
        let lock = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            sessions.entry(player.to_string()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        SessionGuard {
            player: player.to_string(),
            sessions: self.sessions.clone(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn session_count(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Held while a player's records are read and written.
pub struct SessionGuard {
    player: String,
    sessions: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Release the player lock first so its Arc no longer counts.
        self.guard.take();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map's own handle left: no holder, no waiter.
        if sessions.get(&self.player).is_some_and(|l| Arc::strong_count(l) == 1) {
            sessions.remove(&self.player);
        }
    }
}
