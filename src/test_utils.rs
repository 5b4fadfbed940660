//! Recording doubles for the generator and the dev server.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tokio::sync::Notify;

use crate::error::BoxError;
use crate::hmr::{DevServer, HmrPayload, ModuleRef};
use crate::transform::StyleGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub code: String,
    pub id: String,
    pub explicit_scope: Option<String>,
}

/// Returns canned styles per id and remembers how it was called.
#[derive(Default)]
pub struct StubGenerator {
    styles: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<GenerateCall>>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(self, id: &str, css: &str) -> Self {
        self.set_style(id, css);
        self
    }

    pub fn set_style(&self, id: &str, css: &str) {
        self.styles.lock().insert(id.to_string(), css.to_string());
    }

    pub fn fail_on(&self, id: &str) {
        self.failing.lock().insert(id.to_string());
    }
}

#[async_trait]
impl StyleGenerator for StubGenerator {
    async fn generate(
        &self,
        code: &str,
        id: &str,
        explicit_scope: Option<&str>,
    ) -> Result<Option<String>, BoxError> {
        self.calls.lock().push(GenerateCall {
            code: code.to_string(),
            id: id.to_string(),
            explicit_scope: explicit_scope.map(str::to_string),
        });
        if self.failing.lock().contains(id) {
            return Err(format!("cannot generate {}", id).into());
        }
        Ok(self.styles.lock().get(id).cloned())
    }
}

/// Echoes the module code back as its stylesheet. Calls whose code is
/// gated park inside the generator until [`GatedGenerator::release`].
#[derive(Default)]
pub struct GatedGenerator {
    gated: HashSet<String>,
    gate: Notify,
    pub entered: Mutex<Vec<String>>,
}

impl GatedGenerator {
    pub fn gating(code: &str) -> Self {
        GatedGenerator {
            gated: HashSet::from([code.to_string()]),
            ..Self::default()
        }
    }

    /// Wake one parked call, or let the next gated call through.
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl StyleGenerator for GatedGenerator {
    async fn generate(
        &self,
        code: &str,
        _id: &str,
        _explicit_scope: Option<&str>,
    ) -> Result<Option<String>, BoxError> {
        self.entered.lock().push(code.to_string());
        if self.gated.contains(code) {
            self.gate.notified().await;
        }
        Ok(Some(code.to_string()))
    }
}

/// In-memory module graph plus a log of what was invalidated and sent.
#[derive(Default)]
pub struct RecordingServer {
    modules: Mutex<HashSet<String>>,
    pub invalidated: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<HmrPayload>>,
    fail_sends: bool,
}

impl RecordingServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(self, id: &str) -> Self {
        self.add_module(id);
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn add_module(&self, id: &str) {
        self.modules.lock().insert(id.to_string());
    }
}

#[async_trait]
impl DevServer for RecordingServer {
    async fn module_by_id(&self, id: &str) -> Option<ModuleRef> {
        self.modules
            .lock()
            .contains(id)
            .then(|| ModuleRef { id: id.to_string() })
    }

    async fn invalidate_module(&self, module: &ModuleRef) {
        self.invalidated.lock().push(module.id.clone());
    }

    async fn send(&self, payload: HmrPayload) -> Result<(), BoxError> {
        if self.fail_sends {
            return Err("socket closed".into());
        }
        self.sent.lock().push(payload);
        Ok(())
    }
}
