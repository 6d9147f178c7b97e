//! Ordered collection of sessions with a current-session pointer.

use tracing::{debug, info, instrument};

use super::{GameConfig, GameId, GameSession, SessionKey};

/// All sessions of the client, in creation order.
///
/// `current` is `None` whenever `sessions` is empty. Only the current
/// session may have a running timer; callers stop it before switching or
/// removing.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<GameSession>,
    current: Option<usize>,
    next_key: u64,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self::default()
    }

    /// Appends a configured session and makes it current.
    #[instrument(skip(self, config), fields(mode = %config.mode()))]
    pub fn create(&mut self, config: GameConfig) -> SessionKey {
        let key = SessionKey(self.next_key);
        self.next_key += 1;
        self.sessions.push(GameSession::new(key, config));
        self.current = Some(self.sessions.len() - 1);
        info!(%key, index = self.sessions.len() - 1, "Session created");
        key
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when there is no session.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All sessions, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &GameSession> {
        self.sessions.iter()
    }

    /// Session at `index`.
    pub fn get(&self, index: usize) -> Option<&GameSession> {
        self.sessions.get(index)
    }

    /// Index of the current session.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The current session.
    pub fn current(&self) -> Option<&GameSession> {
        self.current.and_then(|i| self.sessions.get(i))
    }

    /// The current session, mutably.
    pub fn current_mut(&mut self) -> Option<&mut GameSession> {
        self.current.and_then(|i| self.sessions.get_mut(i))
    }

    /// Makes `index` current. Returns `false` when out of range.
    #[instrument(skip(self))]
    pub fn set_current(&mut self, index: usize) -> bool {
        if index >= self.sessions.len() {
            debug!(len = self.sessions.len(), "Index out of range");
            return false;
        }
        self.current = Some(index);
        true
    }

    /// Session with local handle `key`.
    pub fn find(&self, key: SessionKey) -> Option<&GameSession> {
        self.sessions.iter().find(|s| s.key == key)
    }

    /// Session with local handle `key`, mutably.
    pub fn find_mut(&mut self, key: SessionKey) -> Option<&mut GameSession> {
        self.sessions.iter_mut().find(|s| s.key == key)
    }

    /// Index of the session with local handle `key`.
    pub fn position(&self, key: SessionKey) -> Option<usize> {
        self.sessions.iter().position(|s| s.key == key)
    }

    /// True when `key` is the current session.
    pub fn is_current(&self, key: SessionKey) -> bool {
        self.current().is_some_and(|s| s.key == key)
    }

    /// Removes the session with server id `game_id`.
    ///
    /// Does not stop its timer. Follow with [`SessionRegistry::update_current`].
    #[instrument(skip(self), fields(game_id = %game_id))]
    pub fn delete(&mut self, game_id: &GameId) -> Option<GameSession> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.game_id.as_ref() == Some(game_id))?;
        self.remove(index)
    }

    /// Removes the session at `index`.
    ///
    /// A session before the current one shifts the pointer down so the
    /// same session stays current. Removing the current session leaves the
    /// pointer in place for [`SessionRegistry::update_current`] to clamp.
    #[instrument(skip(self))]
    pub fn remove(&mut self, index: usize) -> Option<GameSession> {
        if index >= self.sessions.len() {
            return None;
        }
        let removed = self.sessions.remove(index);
        if let Some(current) = self.current
            && index < current
        {
            self.current = Some(current - 1);
        }
        info!(key = %removed.key, index, remaining = self.sessions.len(), "Session removed");
        Some(removed)
    }

    /// Clamps the pointer after a removal.
    #[instrument(skip(self))]
    pub fn update_current(&mut self) {
        self.current = match (self.current, self.sessions.len()) {
            (_, 0) => None,
            (Some(current), len) if current >= len => Some(len - 1),
            (current, _) => current,
        };
        debug!(current = ?self.current, "Current session updated");
    }

    /// Stops the current session's timer, if it has a live one.
    #[instrument(skip(self))]
    pub fn stop_countdown(&mut self) {
        if let Some(session) = self.current_mut() {
            session.timer.stop();
        }
    }
}
