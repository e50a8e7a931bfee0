//! Word and rhyme lookups.
//!
//! Two backends share one contract:
//!   - `HttpLexicon`: a public dictionary API (status only) and a Datamuse-style
//!     rhyme API (`?rel_rhy=word` → `[{word, score}]`).
//!   - `LocalLexicon`: word list + rhyme table from config, for offline play and tests.
//!
//! Both fail closed: any transport error or non-success status means "not a word"
//! or "no rhymes". There are no retries and no caching; one call per question.

use std::{
  collections::{HashMap, HashSet},
  future::Future,
  time::Duration,
};

use reqwest::header::USER_AGENT;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{LexiconCfg, LexiconMode};

const CLIENT_UA: &str = "couple-it-backend/0.1";

pub trait WordValidator {
  fn is_real_word(&self, candidate: &str) -> impl Future<Output = bool> + Send;
}

pub trait RhymeClassifier {
  /// Rhymes of `word`, best first. Empty on any failure.
  fn rhymes_of(&self, word: &str) -> impl Future<Output = Vec<RhymeEntry>> + Send;
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RhymeEntry {
  pub word: String,
  #[serde(default)]
  pub score: Option<u64>,
}

#[derive(Clone)]
pub struct HttpLexicon {
  pub client: reqwest::Client,
  pub dictionary_url: String,
  pub rhyme_url: String,
}

impl HttpLexicon {
  pub fn new(cfg: &LexiconCfg) -> Self {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
      .build()
      .unwrap_or_else(|e| {
        error!(target: "lexicon", error = %e, "Failed to build HTTP client with timeout; using defaults");
        reqwest::Client::new()
      });
    Self {
      client,
      dictionary_url: cfg.dictionary_url.trim_end_matches('/').to_string(),
      rhyme_url: cfg.rhyme_url.clone(),
    }
  }

  fn entry_url(&self, word: &str) -> Option<Url> {
    let mut url = Url::parse(&self.dictionary_url).ok()?;
    url.path_segments_mut().ok()?.push(word);
    Some(url)
  }
}

impl WordValidator for HttpLexicon {
  #[instrument(level = "debug", skip(self))]
  async fn is_real_word(&self, candidate: &str) -> bool {
    let Some(url) = self.entry_url(candidate) else {
      error!(target: "lexicon", dictionary_url = %self.dictionary_url, "Unusable dictionary URL");
      return false;
    };
    match self.client.get(url).header(USER_AGENT, CLIENT_UA).send().await {
      Ok(res) => {
        let ok = res.status().is_success();
        debug!(target: "lexicon", status = %res.status(), ok, "Dictionary lookup");
        ok
      }
      Err(e) => {
        warn!(target: "lexicon", error = %e, "Dictionary lookup failed; treating as not a word");
        false
      }
    }
  }
}

impl RhymeClassifier for HttpLexicon {
  #[instrument(level = "debug", skip(self))]
  async fn rhymes_of(&self, word: &str) -> Vec<RhymeEntry> {
    let res = match self
      .client
      .get(&self.rhyme_url)
      .header(USER_AGENT, CLIENT_UA)
      .query(&[("rel_rhy", word)])
      .send()
      .await
    {
      Ok(res) => res,
      Err(e) => {
        warn!(target: "lexicon", error = %e, "Rhyme lookup failed; treating as no rhymes");
        return Vec::new();
      }
    };
    if !res.status().is_success() {
      warn!(target: "lexicon", status = %res.status(), "Rhyme lookup returned non-success");
      return Vec::new();
    }
    match res.json::<Vec<RhymeEntry>>().await {
      Ok(list) => {
        debug!(target: "lexicon", count = list.len(), top_score = ?list.first().and_then(|e| e.score), "Rhyme lookup");
        list
      }
      Err(e) => {
        warn!(target: "lexicon", error = %e, "Rhyme lookup body was not a word list");
        Vec::new()
      }
    }
  }
}

/// Fixed vocabulary. Known words are the configured list plus every word named
/// in the rhyme table.
#[derive(Clone, Debug, Default)]
pub struct LocalLexicon {
  words: HashSet<String>,
  rhymes: HashMap<String, Vec<String>>,
}

impl LocalLexicon {
  pub fn new<W, S>(words: W, rhymes: HashMap<String, Vec<String>>) -> Self
  where
    W: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut known: HashSet<String> = words.into_iter().map(|w| w.as_ref().trim().to_lowercase()).collect();
    let rhymes: HashMap<String, Vec<String>> = rhymes
      .into_iter()
      .map(|(k, v)| (k.to_lowercase(), v.into_iter().map(|w| w.to_lowercase()).collect::<Vec<_>>()))
      .collect();
    for (k, v) in &rhymes {
      known.insert(k.clone());
      known.extend(v.iter().cloned());
    }
    known.retain(|w| !w.is_empty());
    Self { words: known, rhymes }
  }

  pub fn len(&self) -> usize { self.words.len() }

  pub fn is_empty(&self) -> bool { self.words.is_empty() }
}

impl WordValidator for LocalLexicon {
  async fn is_real_word(&self, candidate: &str) -> bool {
    self.words.contains(&candidate.trim().to_lowercase())
  }
}

impl RhymeClassifier for LocalLexicon {
  async fn rhymes_of(&self, word: &str) -> Vec<RhymeEntry> {
    self.rhymes
      .get(&word.trim().to_lowercase())
      .map(|list| list.iter().map(|w| RhymeEntry { word: w.clone(), score: None }).collect())
      .unwrap_or_default()
  }
}

/// The lookup backend selected by configuration.
#[derive(Clone)]
pub enum Lexicon {
  Http(HttpLexicon),
  Local(LocalLexicon),
}

impl Lexicon {
  pub fn from_config(cfg: &LexiconCfg) -> Self {
    match cfg.mode {
      LexiconMode::Http => {
        let l = HttpLexicon::new(cfg);
        info!(target: "lexicon", dictionary_url = %l.dictionary_url, rhyme_url = %l.rhyme_url, "HTTP lexicon enabled");
        Lexicon::Http(l)
      }
      LexiconMode::Local => {
        let l = LocalLexicon::new(&cfg.words, cfg.rhymes.clone());
        if l.is_empty() {
          warn!(target: "lexicon", "Local lexicon is empty; every guess will be rejected");
        }
        info!(target: "lexicon", words = l.len(), "Local lexicon enabled");
        Lexicon::Local(l)
      }
    }
  }
}

impl WordValidator for Lexicon {
  async fn is_real_word(&self, candidate: &str) -> bool {
    match self {
      Lexicon::Http(l) => l.is_real_word(candidate).await,
      Lexicon::Local(l) => l.is_real_word(candidate).await,
    }
  }
}

impl RhymeClassifier for Lexicon {
  async fn rhymes_of(&self, word: &str) -> Vec<RhymeEntry> {
    match self {
      Lexicon::Http(l) => l.rhymes_of(word).await,
      Lexicon::Local(l) => l.rhymes_of(word).await,
    }
  }
}
