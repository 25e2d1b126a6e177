//! Per-connection session state.
//!
//! A [`Session`] is owned by its connection task. Shared state (the
//! registry, outbound queues) only ever refers to it by [`SessionId`].

use super::SessionId;
use super::machine::{Phase, Transition};
use super::registry::UserId;
use crate::error::RelayResult;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use uuid::Uuid;

/// One live transport connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    remote_addr: SocketAddr,
    connected_at: DateTime<Utc>,
    phase: Phase,
    user_id: Option<UserId>,
}

impl Session {
    /// A fresh session in [`Phase::Open`].
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_addr,
            connected_at: Utc::now(),
            phase: Phase::Open,
            user_id: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The identity bound by the last accepted `join`.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Check that a `join` may be applied without changing anything.
    pub fn can_bind(&self) -> RelayResult {
        self.phase.next(Transition::Bind).map(drop)
    }

    /// Record an accepted `join`.
    pub fn bind(&mut self, user_id: UserId) -> RelayResult {
        self.phase = self.phase.next(Transition::Bind)?;
        self.user_id = Some(user_id);
        Ok(())
    }

    /// Move to [`Phase::Closed`]. Returns the identity that was bound.
    pub fn close(&mut self) -> RelayResult<Option<UserId>> {
        self.phase = self.phase.next(Transition::Close)?;
        Ok(self.user_id.take())
    }
}
