use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{BoxError, PluginError, Result};
use crate::filter::FileFilter;
use crate::hash::scope_token;
use crate::hmr::{DevServer, InvalidationNotifier};
use crate::options::ModuleScopeOptions;
use crate::registry::ArtifactRegistry;
use crate::scope::{has_scope_import, rewrite_scope_import};
use crate::virtual_module::{self, virtual_address, LoadedModule};

pub const PLUGIN_NAME: &str = "miniwind:module-scope";

/// Runs after the host's own transforms.
pub const ENFORCE: &str = "post";

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Produces the stylesheet for one module.
#[async_trait]
pub trait StyleGenerator: Send + Sync {
    /// `explicit_scope` is the class selector styles should be nested under,
    /// present only when the module imports its scope. `Ok(None)` means the
    /// module needs no styles.
    async fn generate(
        &self,
        code: &str,
        id: &str,
        explicit_scope: Option<&str>,
    ) -> std::result::Result<Option<String>, BoxError>;
}

/// Result of a generator living in a host where `""` is falsy. An empty
/// stylesheet there means "no styles", so it becomes `None`.
pub fn style_from_host(style: Option<String>) -> Option<String> {
    style.filter(|css| !css.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub code: String,
    pub map: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════════════

/// All state of one dev session or build: the filter, the registry and the
/// dev server handle. Hosts share it behind an `Arc` across hooks.
pub struct ModuleScopePlugin {
    generator: Arc<dyn StyleGenerator>,
    filter: FileFilter,
    registry: ArtifactRegistry,
    notifier: InvalidationNotifier,
}

impl ModuleScopePlugin {
    pub fn new(generator: Arc<dyn StyleGenerator>, options: &ModuleScopeOptions) -> Result<Self> {
        let filter = FileFilter::new(options.include.as_deref(), options.exclude.as_deref())?;
        Ok(ModuleScopePlugin {
            generator,
            filter,
            registry: ArtifactRegistry::new(),
            notifier: InvalidationNotifier::new(),
        })
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    pub fn configure_server(&self, server: Arc<dyn DevServer>) {
        self.notifier.attach(server);
    }

    pub fn resolve_id(&self, id: &str) -> Option<String> {
        virtual_module::resolve_id(id)
    }

    pub fn load(&self, id: &str) -> Option<LoadedModule> {
        virtual_module::load(&self.registry, id)
    }

    /// `Ok(None)` leaves the module untouched.
    pub async fn transform(&self, code: &str, id: &str) -> Result<Option<TransformOutput>> {
        if id.ends_with(".css") || !self.filter.matches(id) {
            tracing::trace!(id, "skipped by filter");
            return Ok(None);
        }

        let token = scope_token(id);
        let has_scope = has_scope_import(code);
        let explicit_scope = has_scope.then(|| token.selector());

        let artifact = self
            .generator
            .generate(code, id, explicit_scope.as_deref())
            .await
            .map_err(|source| PluginError::Generate {
                id: id.to_string(),
                source,
            })?;

        if artifact.is_none() && !has_scope {
            return Ok(None);
        }

        let code = if has_scope {
            rewrite_scope_import(code, &token)
        } else {
            code.into()
        };

        let update = self.registry.put(token.clone(), id, artifact);
        tracing::debug!(id, token = %token, ?update, "registered module styles");
        if update.is_modified() {
            self.notifier.invalidate(&token).await;
        }

        Ok(Some(TransformOutput {
            code: format!("import \"{}\";{}", virtual_address(&token), code),
            map: None,
        }))
    }
}
