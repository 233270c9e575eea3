//! Access-token storage.
//!
//! The gateway only reads tokens. Writes happen through the explicit
//! `save_*` / `clear` calls made by the embedding application's login and
//! logout flows.

use std::sync::RwLock;

/// Read accessor for the current bearer token.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// Last-write-wins in-memory token cell.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    access: RwLock<Option<String>>,
    refresh: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.save_access_token(token);
        store
    }

    pub fn save_access_token(&self, token: impl Into<String>) {
        write(&self.access, Some(token.into()));
    }

    pub fn save_refresh_token(&self, token: impl Into<String>) {
        write(&self.refresh, Some(token.into()));
    }

    pub fn refresh_token(&self) -> Option<String> {
        read(&self.refresh)
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token().is_some()
    }

    /// Drop both tokens.
    pub fn clear(&self) {
        write(&self.access, None);
        write(&self.refresh, None);
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.access)
    }
}

/// A fixed token, or none. Handy for scripts and tests.
impl TokenStore for Option<String> {
    fn access_token(&self) -> Option<String> {
        self.clone()
    }
}

// A poisoned lock still holds a valid `Option<String>`; recover it.
fn read(cell: &RwLock<Option<String>>) -> Option<String> {
    let token = match cell.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    token.filter(|t| !t.is_empty())
}

fn write(cell: &RwLock<Option<String>>, value: Option<String>) {
    match cell.write() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_no_token() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.access_token(), None);
        assert!(!store.has_access_token());
    }

    #[test]
    fn save_then_clear() {
        let store = MemoryTokenStore::new();
        store.save_access_token("abc123");
        store.save_refresh_token("r1");
        assert_eq!(store.access_token().as_deref(), Some("abc123"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));

        store.clear();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn last_write_wins() {
        let store = MemoryTokenStore::with_access_token("first");
        store.save_access_token("second");
        assert_eq!(store.access_token().as_deref(), Some("second"));
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let store = MemoryTokenStore::with_access_token("");
        assert!(!store.has_access_token());
    }
}
