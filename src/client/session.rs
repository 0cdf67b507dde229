use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::user::{Account, Role};

/// Identity cached by the client after a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSession {
    pub user_id: usize,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

/// Shared handle to the signed-in identity.
///
/// Clones point at the same session, so the gateway and the view logic
/// always agree on who is signed in.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<ClientSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<ClientSession>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<ClientSession>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn establish(&self, account: &Account, token: String) {
        *self.write() = Some(ClientSession {
            user_id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            token,
        });
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    pub fn current(&self) -> Option<ClientSession> {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn user_id(&self) -> Option<usize> {
        self.read().as_ref().map(|s| s.user_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.read().as_ref().map(|s| s.role)
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account() -> Account {
        Account {
            id: 7,
            name: "Rae".to_string(),
            email: "rae@example.com".to_string(),
            role: Role::Owner,
            phone: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn clones_share_the_session() {
        let store = SessionStore::new();
        let view_handle = store.clone();
        assert!(!view_handle.is_signed_in());

        store.establish(&account(), "tok".to_string());
        assert_eq!(view_handle.user_id(), Some(7));
        assert_eq!(view_handle.role(), Some(Role::Owner));
        assert_eq!(view_handle.token().as_deref(), Some("tok"));

        view_handle.clear();
        assert!(store.current().is_none());
    }
}
