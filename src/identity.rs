//! Persisted local identity.
//!
//! The session core never touches storage directly; the shell supplies an
//! implementation of [`IdentityStore`] and hands the loaded user to
//! `Session::start`.

use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::types::User;

/// Get/set capability for the logged-in identity.
pub trait IdentityStore: Send + Sync {
    /// The saved identity, if any. Unreadable or corrupt data is treated
    /// as absent.
    fn load(&self) -> Option<User>;

    fn save(&self, user: &User) -> io::Result<()>;

    /// Forget the saved identity. No-op if nothing is saved.
    fn clear(&self) -> io::Result<()>;
}

/// Identity persisted as a JSON file at a fixed path.
pub struct JsonIdentityStore {
    path: PathBuf,
}

impl JsonIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityStore for JsonIdentityStore {
    fn load(&self) -> Option<User> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring corrupt identity file: {e}");
                None
            }
        }
    }

    fn save(&self, user: &User) -> io::Result<()> {
        let json = serde_json::to_string_pretty(user)?;
        std::fs::write(&self.path, json)
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryIdentityStore {
    user: RwLock<Option<User>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Option<User> {
        self.user.read().unwrap().clone()
    }

    fn save(&self, user: &User) -> io::Result<()> {
        *self.user.write().unwrap() = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.user.write().unwrap() = None;
        Ok(())
    }
}
