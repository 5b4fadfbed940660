use parking_lot::RwLock;
use std::collections::HashMap;

use crate::hash::ScopeToken;

/// What a source file last produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Identity of the file that owns the token.
    pub source: String,
    /// `None` when the generator produced nothing.
    pub artifact: Option<String>,
}

/// Outcome of [`ArtifactRegistry::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryUpdate {
    Inserted,
    Changed,
    Unchanged,
}

impl RegistryUpdate {
    /// Whether loaders of the token's virtual module now see different content.
    pub fn is_modified(self) -> bool {
        !matches!(self, RegistryUpdate::Unchanged)
    }
}

/// Token → entry map shared by every transform of a session.
///
/// Entries are overwritten, never removed. Concurrent writes to one token
/// resolve as last-write-wins.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    entries: RwLock<HashMap<ScopeToken, RegistryEntry>>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, token: ScopeToken, source: &str, artifact: Option<String>) -> RegistryUpdate {
        let entry = RegistryEntry {
            source: source.to_string(),
            artifact,
        };

        let mut entries = self.entries.write();
        let update = match entries.get(&token) {
            None => RegistryUpdate::Inserted,
            Some(prev) if *prev == entry => RegistryUpdate::Unchanged,
            Some(_) => RegistryUpdate::Changed,
        };
        if update.is_modified() {
            entries.insert(token, entry);
        }
        update
    }

    pub fn get(&self, token: &ScopeToken) -> Option<RegistryEntry> {
        self.entries.read().get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn tokens(&self) -> Vec<ScopeToken> {
        let mut tokens: Vec<_> = self.entries.read().keys().cloned().collect();
        tokens.sort();
        tokens
    }
}
