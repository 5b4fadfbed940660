//! Hot Module Replacement
//!
//! Keeps a live dev server's module graph in step with the registry. When a
//! token's entry changes, the matching virtual module is marked stale and a
//! single `update` event for its address goes out to connected clients.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::BoxError;
use crate::hash::ScopeToken;
use crate::virtual_module::virtual_address;

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateKind {
    JsUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub accepted_path: String,
    pub path: String,
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrPayload {
    Update { updates: Vec<Update> },
}

impl HmrPayload {
    /// JS update for exactly one module.
    pub fn js_update(address: &str, timestamp: u64) -> Self {
        HmrPayload::Update {
            updates: vec![Update {
                accepted_path: address.to_string(),
                path: address.to_string(),
                timestamp,
                kind: UpdateKind::JsUpdate,
            }],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEV SERVER HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// A module known to the dev server's graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub id: String,
}

/// The parts of a live dev server this plugin talks to.
#[async_trait]
pub trait DevServer: Send + Sync {
    async fn module_by_id(&self, id: &str) -> Option<ModuleRef>;

    /// Drop the module's cached transform result.
    async fn invalidate_module(&self, module: &ModuleRef);

    /// Broadcast to every connected client.
    async fn send(&self, payload: HmrPayload) -> Result<(), BoxError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFIER
// ═══════════════════════════════════════════════════════════════════════════════

/// Holds the dev server handle for the session, if there is one.
#[derive(Default)]
pub struct InvalidationNotifier {
    server: RwLock<Option<Arc<dyn DevServer>>>,
}

impl InvalidationNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, server: Arc<dyn DevServer>) {
        let previous = self.server.write().replace(server);
        if previous.is_some() {
            tracing::warn!("dev server handle replaced");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.server.read().is_some()
    }

    /// Returns whether an update was broadcast.
    pub async fn invalidate(&self, token: &ScopeToken) -> bool {
        // Clone the handle so the lock is released before awaiting.
        let Some(server) = self.server.read().clone() else {
            return false;
        };

        let address = virtual_address(token);
        let Some(module) = server.module_by_id(&address).await else {
            tracing::trace!(address = %address, "virtual module not in graph yet");
            return false;
        };

        server.invalidate_module(&module).await;

        let payload = HmrPayload::js_update(&address, now_millis());
        if let Err(error) = server.send(payload).await {
            tracing::warn!(address = %address, %error, "hot update broadcast failed");
            return false;
        }

        tracing::debug!(address = %address, "hot update sent");
        true
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
