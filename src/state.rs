//! Application state: session store, local game bank, upstream client, and scoring settings.
//!
//! This module owns:
//!   - the session store (by session id), only for HTTP clients
//!   - the local game bank (config `[[games]]` + built-in seeds)
//!   - the optional VietVibe client
//!
//! Lock discipline: no upstream call is made while the session lock is held.
//!
//! HTTP clients can vanish without a DELETE, so every stored session carries a
//! last-touched instant and a background sweep evicts idle ones.

use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, error, info, instrument};

use crate::config::{QuizConfig, ScoringCfg};
use crate::domain::{Game, GameSource};
use crate::error::{QuizError, QuizResult};
use crate::finalizer::SessionSummary;
use crate::loader::normalize_game;
use crate::seeds::seed_games;
use crate::session::Session;
use crate::upstream::VietVibeApi;

pub struct StoredSession {
    pub session: Session,
    pub touched: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    pub bank: Arc<HashMap<String, Arc<Game>>>,
    pub upstream: Option<VietVibeApi>,
    pub scoring: ScoringCfg,
}

impl AppState {
    /// Build state from env: load config, normalize the local bank, init the upstream client.
    pub fn from_env() -> Self {
        Self::with_config(QuizConfig::from_env())
    }

    #[instrument(level = "info", skip_all)]
    pub fn with_config(cfg: QuizConfig) -> Self {
        let mut bank = HashMap::<String, Arc<Game>>::new();

        // Config games first, so they can shadow the built-in seeds.
        let seeds = seed_games();
        for raw in cfg.games.iter().chain(seeds.iter()) {
            match normalize_game(raw, GameSource::LocalBank) {
                Ok(game) => {
                    if bank.contains_key(&game.id) {
                        debug!(target: "quiz", game_id = %game.id, "Local game id already taken; skipping");
                        continue;
                    }
                    bank.insert(game.id.clone(), Arc::new(game));
                }
                Err(e) => {
                    error!(target: "quiz", error = %e, "Skipping local bank game");
                }
            }
        }
        info!(target: "quiz", local_games = bank.len(), "Local game bank ready");

        let upstream = VietVibeApi::from_config(&cfg.upstream);
        if let Some(api) = &upstream {
            info!(target: "vietvibe_quiz", base_url = %api.base_url, timeout_secs = cfg.upstream.timeout_secs, "VietVibe upstream enabled.");
        } else {
            info!(target: "vietvibe_quiz", "VietVibe upstream disabled (no base URL). Serving local games only.");
        }

        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            bank: Arc::new(bank),
            upstream,
            scoring: cfg.quiz,
        }
    }

    /// Lookup order: local bank, then upstream. Single attempt, no retry.
    #[instrument(level = "info", skip(self, auth), fields(%game_id))]
    pub async fn load_game(&self, game_id: &str, auth: Option<&str>) -> QuizResult<Arc<Game>> {
        if let Some(game) = self.bank.get(game_id) {
            return Ok(game.clone());
        }
        let api = self
            .upstream
            .as_ref()
            .ok_or_else(|| QuizError::NotFound(format!("game {} is not in the local bank", game_id)))?;
        let raw = api.fetch_game(game_id, auth).await?;
        Ok(Arc::new(normalize_game(&raw, GameSource::Upstream)?))
    }

    pub async fn insert_session(&self, session: Session) {
        let stored = StoredSession { touched: Instant::now(), session };
        self.sessions.write().await.insert(stored.session.id.clone(), stored);
    }

    pub async fn remove_session(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Run `f` against one session under the write lock.
    pub async fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> QuizResult<T>) -> QuizResult<T> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(id).ok_or_else(|| QuizError::SessionNotFound(id.to_string()))?;
        stored.touched = Instant::now();
        f(&mut stored.session)
    }

    /// Store a finalizer result. The session may have been deleted meanwhile.
    pub async fn attach_summary(&self, id: &str, summary: SessionSummary) {
        match self.sessions.write().await.get_mut(id) {
            Some(stored) => stored.session.attach_summary(summary),
            None => debug!(target: "quiz", session_id = %id, "Session gone before its summary arrived"),
        }
    }

    /// Drop sessions not touched since `cutoff`. Returns how many were evicted.
    pub async fn evict_idle_since(&self, cutoff: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.touched >= cutoff);
        before - sessions.len()
    }

    /// Periodically evict sessions idle for longer than `ttl`.
    pub fn spawn_session_sweeper(self: Arc<Self>, ttl: Duration) -> tokio::task::JoinHandle<()> {
        let period = ttl.min(Duration::from_secs(60));
        info!(target: "quiz", ttl_secs = ttl.as_secs(), "Idle session sweeper started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(cutoff) = Instant::now().checked_sub(ttl) else { continue };
                let evicted = self.evict_idle_since(cutoff).await;
                if evicted > 0 {
                    info!(target: "quiz", evicted, "Evicted idle sessions");
                }
            }
        })
    }
}
