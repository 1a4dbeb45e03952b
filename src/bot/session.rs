//! Ephemeral per-user conversation sessions.
//!
//! A session exists only while a conversation is running: it records the
//! user's current [`StateId`] and the scratch selections made so far. It is
//! created lazily by an entry command, cleared when the conversation ends,
//! and never persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::bot::states::StateId;
use crate::database::models::Lesson;

/// What a handler tells the dispatcher to do with the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Conversation continues; the next callback must match this state.
    Next(StateId),
    /// Conversation is over; scratch data is cleared.
    End,
    /// Malformed or stale input; no visible change, state unchanged.
    Stay,
}

/// Scratch data accumulated during one conversation.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    /// Course picked in the group-selection flow.
    pub course: Option<i64>,
    /// Faculty picked in the group-selection flow.
    pub faculty_id: Option<i64>,
    /// Group picked in the group-selection flow.
    pub group_id: Option<i64>,
    /// Subgroup lesson variants chosen so far.
    pub subgroups: Vec<Lesson>,
    /// The (name, lesson_format) pair currently being disambiguated.
    pub current_subgroup_lesson: Option<(String, i64)>,
    /// Lesson targeted by a pending link change.
    pub link_lesson_id: Option<i64>,
}

#[derive(Debug)]
struct Session {
    state: StateId,
    data: SessionData,
}

/// In-memory map from user id to their active session. Cheap to clone;
/// clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<i64, Session>>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's current conversational position, if any.
    pub fn current_state(&self, user_id: i64) -> Option<StateId> {
        self.lock().get(&user_id).map(|s| s.state)
    }

    /// Starts (or restarts) a conversation at `state` with fresh scratch data.
    pub fn begin(&self, user_id: i64, state: StateId) {
        self.lock().insert(
            user_id,
            Session {
                state,
                data: SessionData::default(),
            },
        );
    }

    /// Moves an active conversation to `state`, starting one if absent.
    pub fn set_state(&self, user_id: i64, state: StateId) {
        self.lock()
            .entry(user_id)
            .and_modify(|s| s.state = state)
            .or_insert(Session {
                state,
                data: SessionData::default(),
            });
    }

    /// Snapshot of the user's scratch data.
    pub fn data(&self, user_id: i64) -> Option<SessionData> {
        self.lock().get(&user_id).map(|s| s.data.clone())
    }

    /// Mutates the user's scratch data in place; no-op without a session.
    pub fn update<F: FnOnce(&mut SessionData)>(&self, user_id: i64, f: F) {
        if let Some(session) = self.lock().get_mut(&user_id) {
            f(&mut session.data);
        }
    }

    /// Ends the conversation and drops its scratch data.
    pub fn end(&self, user_id: i64) {
        self.lock().remove(&user_id);
    }

    /// Applies a handler's transition.
    pub fn apply(&self, user_id: i64, transition: Transition) {
        match transition {
            Transition::Next(state) => self.set_state(user_id, state),
            Transition::End => self.end(user_id),
            Transition::Stay => {}
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Session>> {
        // A poisoned lock means a panic while holding the guard; the scratch
        // data is still valid for every other user, so keep going.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
