//! Session registry: which live sessions belong to which user.
//!
//! The registry keeps a forward index (`user → sessions`) for delivery and a
//! reverse index (`session → user`) so a disconnect can be cleaned up without
//! knowing who the session belonged to.
//!
//! # Thread Safety
//!
//! Both indexes sit behind a single `parking_lot::RwLock`. Every mutation
//! updates them together, so a reader never observes a session in one index
//! but not the other. Lookups take the read lock and return owned snapshots.

use super::SessionId;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// User identifier as claimed or resolved at `join`.
pub type UserId = String;

/// What [`SessionRegistry::bind`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The session was unbound and is now bound.
    Bound,
    /// The session was already bound to this user; nothing changed.
    AlreadyBound,
    /// The session moved from `previous` to the new user.
    Moved { previous: UserId },
}

#[derive(Debug, Default)]
struct Index {
    forward: HashMap<UserId, HashSet<SessionId>>,
    reverse: HashMap<SessionId, UserId>,
}

impl Index {
    fn detach(&mut self, session_id: SessionId) -> Option<UserId> {
        let user_id = self.reverse.remove(&session_id)?;
        if let Some(sessions) = self.forward.get_mut(&user_id) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                self.forward.remove(&user_id);
            }
        }
        Some(user_id)
    }

    fn attach(&mut self, user_id: &str, session_id: SessionId) -> BindOutcome {
        match self.reverse.get(&session_id) {
            Some(current) if current == user_id => return BindOutcome::AlreadyBound,
            _ => {}
        }
        let previous = self.detach(session_id);
        self.forward
            .entry(user_id.to_owned())
            .or_default()
            .insert(session_id);
        self.reverse.insert(session_id, user_id.to_owned());
        match previous {
            Some(previous) => BindOutcome::Moved { previous },
            None => BindOutcome::Bound,
        }
    }
}

/// Registry of live sessions per user.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    index: RwLock<Index>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `session_id` to `user_id`.
    ///
    /// Idempotent. A session bound to another user is moved.
    pub fn bind(&self, user_id: &str, session_id: SessionId) -> BindOutcome {
        self.index.write().attach(user_id, session_id)
    }

    /// Bind unless `user_id` already holds `limit` other sessions.
    ///
    /// The check and the insert happen under the same write lock. Returns
    /// `None` when the limit would be exceeded; the session is left as it was.
    pub fn bind_within(
        &self,
        user_id: &str,
        session_id: SessionId,
        limit: usize,
    ) -> Option<BindOutcome> {
        let mut index = self.index.write();
        let already_bound = index
            .reverse
            .get(&session_id)
            .is_some_and(|current| current == user_id);
        if !already_bound {
            let held = index.forward.get(user_id).map_or(0, HashSet::len);
            if held >= limit {
                return None;
            }
        }
        Some(index.attach(user_id, session_id))
    }

    /// Remove a session. Returns the user it was bound to, if any.
    pub fn unbind(&self, session_id: SessionId) -> Option<UserId> {
        self.index.write().detach(session_id)
    }

    /// Snapshot of the sessions bound to `user_id`. Empty for unknown users.
    pub fn sessions_for(&self, user_id: &str) -> HashSet<SessionId> {
        self.index
            .read()
            .forward
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The user a session is bound to.
    pub fn user_for(&self, session_id: SessionId) -> Option<UserId> {
        self.index.read().reverse.get(&session_id).cloned()
    }

    /// Whether `user_id` has at least one live session.
    pub fn is_online(&self, user_id: &str) -> bool {
        self.index.read().forward.contains_key(user_id)
    }

    /// Number of users with at least one session.
    pub fn online_users(&self) -> usize {
        self.index.read().forward.len()
    }

    /// Number of bound sessions.
    pub fn session_count(&self) -> usize {
        self.index.read().reverse.len()
    }

    /// Check that the forward and reverse indexes describe the same pairs
    /// and that no user maps to an empty set.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let index = self.index.read();
        let forward_pairs: usize = index.forward.values().map(HashSet::len).sum();
        forward_pairs == index.reverse.len()
            && index.forward.values().all(|sessions| !sessions.is_empty())
            && index.reverse.iter().all(|(session_id, user_id)| {
                index
                    .forward
                    .get(user_id)
                    .is_some_and(|sessions| sessions.contains(session_id))
            })
    }
}
