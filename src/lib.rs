//! # Miniwind Module Scope (native)
//!
//! Per-module stylesheets for the miniwind bundler plugin. A transformed
//! module gets a side-effect import of `/@miniwind/<token>.css`, whose body
//! is whatever the style generator produced for that module.
//!
//! ## Invariants
//!
//! 1. **Stable Tokens**: a module's token is a pure function of its id
//!    (first 8 hex digits of SHA-256). Re-transforming a file never moves
//!    its stylesheet to another address.
//!
//! 2. **One Entry Per Token**: the registry overwrites, it never appends or
//!    removes. Concurrent transforms of one file are last-write-wins.
//!
//! 3. **Loads Never Fail**: a virtual address whose token is not registered
//!    loads as an empty stylesheet. The owning transform fills it in later
//!    and invalidates the module.
//!
//! 4. **Targeted Updates**: a hot update is sent only when a token's entry
//!    actually changed and the dev server's graph already holds its module,
//!    and it names exactly that one address.
//!
//! 5. **No Partial Commits**: a failed generator call leaves the registry
//!    untouched and surfaces as [`PluginError::Generate`].

#[cfg(feature = "napi")]
mod napi_bridge;

mod error;
mod filter;
mod hash;
mod hmr;
mod options;
mod registry;
mod scope;
mod transform;
mod virtual_module;

#[cfg(test)]
mod test_utils;

pub use error::{BoxError, PluginError, Result};
pub use filter::{FileFilter, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
pub use hash::{scope_token, ScopeToken};
pub use hmr::{DevServer, HmrPayload, InvalidationNotifier, ModuleRef, Update, UpdateKind};
pub use options::{FilterPattern, ModuleScopeOptions};
pub use registry::{ArtifactRegistry, RegistryEntry, RegistryUpdate};
pub use scope::{
    has_scope_import, rewrite_scope_import, scope_module_source, scope_module_url, SCOPE_MODULE,
};
pub use transform::{
    style_from_host, ModuleScopePlugin, StyleGenerator, TransformOutput, ENFORCE, PLUGIN_NAME,
};
pub use virtual_module::{
    is_virtual_address, load, resolve_id, token_from_address, virtual_address, LoadedModule,
    VIRTUAL_PREFIX, VIRTUAL_SUFFIX,
};

#[cfg(feature = "napi")]
pub use napi_bridge::JsModuleScopePlugin;
