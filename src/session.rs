// src/session.rs
//! Process-wide session context: populated at login, cleared at logout,
//! read-only everywhere else. Components receive this handle at composition
//! time instead of re-parsing a serialized identity blob on every init.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(rename = "id_usuario")]
    pub id: i64,
    pub email: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<UserIdentity>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The one transition that populates the context.
    pub fn login(&self, identity: UserIdentity) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(identity);
        }
    }

    /// The one transition that clears it.
    pub fn logout(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    pub fn current(&self) -> Option<UserIdentity> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }
}
