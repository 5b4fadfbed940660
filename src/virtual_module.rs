//! Virtual Style Modules
//!
//! Every registered token is reachable at `/@miniwind/<token>.css`.
//! Addresses are computed, never stored: prefix + token + suffix forwards,
//! strip both to get the token back.

use serde::{Deserialize, Serialize};

use crate::hash::ScopeToken;
use crate::registry::ArtifactRegistry;

pub const VIRTUAL_PREFIX: &str = "/@miniwind/";
pub const VIRTUAL_SUFFIX: &str = ".css";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedModule {
    pub code: String,
    /// Files whose changes should re-run the host pipeline for this module.
    pub watch_files: Vec<String>,
}

impl LoadedModule {
    fn empty() -> Self {
        LoadedModule {
            code: String::new(),
            watch_files: Vec::new(),
        }
    }
}

pub fn virtual_address(token: &ScopeToken) -> String {
    format!("{}{}{}", VIRTUAL_PREFIX, token, VIRTUAL_SUFFIX)
}

pub fn is_virtual_address(id: &str) -> bool {
    id.starts_with(VIRTUAL_PREFIX)
}

pub fn token_from_address(id: &str) -> Option<ScopeToken> {
    let raw = id
        .strip_prefix(VIRTUAL_PREFIX)?
        .strip_suffix(VIRTUAL_SUFFIX)?;
    ScopeToken::parse(raw)
}

/// Claim prefixed ids; decline everything else so the host resolves it.
pub fn resolve_id(id: &str) -> Option<String> {
    is_virtual_address(id).then(|| id.to_string())
}

/// Body of a virtual module, or `None` for ids this plugin does not own.
///
/// A token that is not registered yet loads as an empty stylesheet; the
/// owning file's transform will register it and invalidate the module.
pub fn load(registry: &ArtifactRegistry, id: &str) -> Option<LoadedModule> {
    if !is_virtual_address(id) {
        return None;
    }

    let entry = match token_from_address(id).and_then(|token| registry.get(&token)) {
        Some(entry) => entry,
        None => {
            tracing::trace!(id, "virtual module requested before registration");
            return Some(LoadedModule::empty());
        }
    };

    let code = format!(
        "\n/* miniwind {} */\n{}",
        entry.source,
        entry.artifact.as_deref().unwrap_or_default()
    );
    Some(LoadedModule {
        code,
        watch_files: vec![entry.source],
    })
}
