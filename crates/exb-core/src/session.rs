//! In-memory per-caller session state.
//!
//! Everything here lives only for the process lifetime: a restart forces
//! re-authentication and discards any in-progress entry.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{dialogue::EntryState, domain::UserId};

/// Conversation position of a single caller.
#[derive(Clone, Debug, PartialEq)]
pub enum ConversationState {
    AwaitingPassword,
    Entry(EntryState),
}

#[derive(Clone, Debug, Default)]
struct CallerSession {
    authorized: bool,
    conversation: Option<ConversationState>,
}

/// Session store keyed by caller id, safe for concurrent access from
/// interleaved handlers of independent callers.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<UserId, CallerSession>>,
}

impl SessionStore {
    pub async fn is_authorized(&self, user: UserId) -> bool {
        self.inner
            .lock()
            .await
            .get(&user)
            .map(|s| s.authorized)
            .unwrap_or(false)
    }

    /// Mark the caller authorized for the process lifetime and drop any
    /// conversation state (authorization is terminal; there is no logout).
    pub async fn authorize(&self, user: UserId) {
        let mut map = self.inner.lock().await;
        let session = map.entry(user).or_default();
        session.authorized = true;
        session.conversation = None;
    }

    pub async fn conversation(&self, user: UserId) -> Option<ConversationState> {
        self.inner
            .lock()
            .await
            .get(&user)
            .and_then(|s| s.conversation.clone())
    }

    pub async fn set_conversation(&self, user: UserId, state: ConversationState) {
        let mut map = self.inner.lock().await;
        map.entry(user).or_default().conversation = Some(state);
    }

    pub async fn clear_conversation(&self, user: UserId) {
        let mut map = self.inner.lock().await;
        if let Some(session) = map.get_mut(&user) {
            session.conversation = None;
        }
    }
}
