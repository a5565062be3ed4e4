//! Active-session registry.
//!
//! Each tool has at most one live generation session. Starting a new session
//! for a tool supersedes any session already running for it, and a superseded
//! session's result is discarded at commit time rather than overwriting the
//! newer session's work.

use dashmap::DashMap;
use uuid::Uuid;

use toolforge_types::composition::CompositionSnapshot;
use toolforge_types::error::SessionError;

/// Tracks the live session token per tool and stores committed snapshots.
#[derive(Default)]
pub struct SessionRegistry {
    /// Tool id -> token of the session currently allowed to commit.
    active: DashMap<Uuid, Uuid>,
    /// Tool id -> last committed snapshot.
    committed: DashMap<Uuid, CompositionSnapshot>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for a tool, superseding any session already live.
    ///
    /// Returns the token the new session must present at commit.
    pub fn begin(&self, tool_id: Uuid) -> Uuid {
        let token = Uuid::now_v7();
        if let Some(previous) = self.active.insert(tool_id, token) {
            tracing::info!(%tool_id, superseded = %previous, "generation session superseded");
        }
        token
    }

    /// Whether this token still owns the tool's live session.
    pub fn is_current(&self, tool_id: Uuid, token: Uuid) -> bool {
        self.active.get(&tool_id).is_some_and(|t| *t == token)
    }

    /// Commit a finished session's composition.
    ///
    /// A stale token means a newer session was started for the same tool
    /// while this one ran; its result is discarded.
    pub fn commit(
        &self,
        tool_id: Uuid,
        token: Uuid,
        snapshot: CompositionSnapshot,
    ) -> Result<(), SessionError> {
        if !self.is_current(tool_id, token) {
            tracing::info!(%tool_id, "discarding result from superseded session");
            return Err(SessionError::Superseded);
        }
        self.committed.insert(tool_id, snapshot);
        self.active.remove(&tool_id);
        Ok(())
    }

    /// End a session without committing (cancellation or failure).
    ///
    /// Only the session holding the live token clears the slot; a superseded
    /// session ending late must not evict its successor.
    pub fn end(&self, tool_id: Uuid, token: Uuid) {
        self.active
            .remove_if(&tool_id, |_, current| *current == token);
    }

    /// Last committed snapshot for a tool, if any.
    pub fn committed(&self, tool_id: Uuid) -> Option<CompositionSnapshot> {
        self.committed.get(&tool_id).map(|s| s.clone())
    }
}
