//! Per-user preset selection.
//!
//! The set of users is fixed at startup from the allow-list. Entries are
//! never added or removed afterwards; only the selected preset changes.
//! The lock is held for the map access alone, never across network or
//! process I/O.

use std::collections::HashMap;

use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub selected_preset: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            selected_preset: None,
        }
    }
}

pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sessions = user_ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                (id.clone(), Session::new(id))
            })
            .collect();
        Self {
            sessions: Mutex::new(sessions),
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    /// Replace the session for an existing user.
    ///
    /// Returns false (and changes nothing) for users that have no session.
    pub async fn set(&self, session: Session) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&session.user_id) {
            Some(existing) => {
                *existing = session;
                true
            }
            None => false,
        }
    }

    pub async fn select_preset(&self, user_id: &str, preset: &str) -> bool {
        self.set(Session {
            user_id: user_id.to_string(),
            selected_preset: Some(preset.to_string()),
        })
        .await
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
