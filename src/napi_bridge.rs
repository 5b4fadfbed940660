//! Node.js bindings.
//!
//! The JS side of the plugin forwards Vite hooks to a `ModuleScopePlugin`
//! instance:
//!
//! ```js
//! const native = new ModuleScopePlugin(generate, options)
//! configureServer(server) {
//!   native.configureServer({
//!     getModuleById: id => !!server.moduleGraph.getModuleById(id),
//!     invalidateModule: id => server.moduleGraph.invalidateModule(server.moduleGraph.getModuleById(id)),
//!     send: payload => server.ws.send(payload),
//!   })
//! }
//! ```
//!
//! `generate` must return a Promise. Resolving to `undefined`, `null` or
//! `""` all mean the module has no styles.

use async_trait::async_trait;
use napi::bindgen_prelude::Promise;
use napi::threadsafe_function::{ErrorStrategy, ThreadSafeCallContext, ThreadsafeFunction};
use napi::{Env, JsFunction, JsObject, JsUnknown};
use napi_derive::napi;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::error::BoxError;
use crate::hmr::{DevServer, HmrPayload, ModuleRef};
use crate::options::ModuleScopeOptions;
use crate::transform::{style_from_host, ModuleScopePlugin, StyleGenerator, ENFORCE, PLUGIN_NAME};

/// Log filter for the native side, e.g. `MINIWIND_LOG=module_scope_native=debug`.
const LOG_ENV: &str = "MINIWIND_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Another plugin instance may already have installed it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn js_error(e: napi::Error) -> BoxError {
    e.reason.into()
}

fn napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

struct GenerateArgs {
    code: String,
    id: String,
    explicit_scope: Option<String>,
}

struct JsGenerator {
    generate: ThreadsafeFunction<GenerateArgs, ErrorStrategy::Fatal>,
}

impl JsGenerator {
    fn new(env: &Env, generate: JsFunction) -> napi::Result<Self> {
        let mut generate: ThreadsafeFunction<GenerateArgs, ErrorStrategy::Fatal> = generate
            .create_threadsafe_function(0, |ctx: ThreadSafeCallContext<GenerateArgs>| {
                let scope = match ctx.value.explicit_scope {
                    Some(scope) => ctx.env.create_string(&scope)?.into_unknown(),
                    None => ctx.env.get_undefined()?.into_unknown(),
                };
                let args: Vec<JsUnknown> = vec![
                    ctx.env.create_string(&ctx.value.code)?.into_unknown(),
                    ctx.env.create_string(&ctx.value.id)?.into_unknown(),
                    scope,
                ];
                Ok(args)
            })?;
        // Let Node exit while the plugin is idle.
        generate.unref(env)?;
        Ok(JsGenerator { generate })
    }
}

#[async_trait]
impl StyleGenerator for JsGenerator {
    async fn generate(
        &self,
        code: &str,
        id: &str,
        explicit_scope: Option<&str>,
    ) -> Result<Option<String>, BoxError> {
        let args = GenerateArgs {
            code: code.to_string(),
            id: id.to_string(),
            explicit_scope: explicit_scope.map(str::to_string),
        };
        let promise: Promise<Option<String>> =
            self.generate.call_async(args).await.map_err(js_error)?;
        let style = promise.await.map_err(js_error)?;
        Ok(style_from_host(style))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEV SERVER
// ═══════════════════════════════════════════════════════════════════════════════

struct JsDevServer {
    get_module_by_id: ThreadsafeFunction<String, ErrorStrategy::Fatal>,
    invalidate_module: ThreadsafeFunction<String, ErrorStrategy::Fatal>,
    send: ThreadsafeFunction<serde_json::Value, ErrorStrategy::Fatal>,
}

fn string_callback(
    env: &Env,
    server: &JsObject,
    name: &str,
) -> napi::Result<ThreadsafeFunction<String, ErrorStrategy::Fatal>> {
    let func: JsFunction = server.get_named_property(name)?;
    let mut tsfn: ThreadsafeFunction<String, ErrorStrategy::Fatal> = func
        .create_threadsafe_function(0, |ctx: ThreadSafeCallContext<String>| Ok(vec![ctx.value]))?;
    tsfn.unref(env)?;
    Ok(tsfn)
}

impl JsDevServer {
    fn new(env: &Env, server: JsObject) -> napi::Result<Self> {
        let send: JsFunction = server.get_named_property("send")?;
        let mut send: ThreadsafeFunction<serde_json::Value, ErrorStrategy::Fatal> = send
            .create_threadsafe_function(0, |ctx: ThreadSafeCallContext<serde_json::Value>| {
                Ok(vec![ctx.value])
            })?;
        send.unref(env)?;

        Ok(JsDevServer {
            get_module_by_id: string_callback(env, &server, "getModuleById")?,
            invalidate_module: string_callback(env, &server, "invalidateModule")?,
            send,
        })
    }
}

#[async_trait]
impl DevServer for JsDevServer {
    async fn module_by_id(&self, id: &str) -> Option<ModuleRef> {
        match self
            .get_module_by_id
            .call_async::<Option<bool>>(id.to_string())
            .await
        {
            Ok(Some(true)) => Some(ModuleRef { id: id.to_string() }),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(id, %error, "getModuleById failed");
                None
            }
        }
    }

    async fn invalidate_module(&self, module: &ModuleRef) {
        if let Err(error) = self
            .invalidate_module
            .call_async::<Option<bool>>(module.id.clone())
            .await
        {
            tracing::warn!(id = %module.id, %error, "invalidateModule failed");
        }
    }

    async fn send(&self, payload: HmrPayload) -> Result<(), BoxError> {
        let payload = serde_json::to_value(&payload)?;
        self.send
            .call_async::<Option<bool>>(payload)
            .await
            .map(|_| ())
            .map_err(js_error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN CLASS
// ═══════════════════════════════════════════════════════════════════════════════

#[napi(object)]
pub struct JsTransformResult {
    pub code: String,
    pub map: Option<String>,
}

#[napi(object)]
pub struct JsLoadResult {
    pub code: String,
    pub watch_files: Vec<String>,
}

#[napi(js_name = "ModuleScopePlugin")]
pub struct JsModuleScopePlugin {
    inner: Arc<ModuleScopePlugin>,
}

#[napi]
impl JsModuleScopePlugin {
    #[napi(constructor)]
    pub fn new(
        env: Env,
        generate: JsFunction,
        options: Option<serde_json::Value>,
    ) -> napi::Result<Self> {
        init_tracing();

        let options = match options {
            Some(value) => ModuleScopeOptions::from_json(value).map_err(napi_error)?,
            None => ModuleScopeOptions::default(),
        };
        let generator = Arc::new(JsGenerator::new(&env, generate)?);
        let inner = ModuleScopePlugin::new(generator, &options).map_err(napi_error)?;
        Ok(JsModuleScopePlugin {
            inner: Arc::new(inner),
        })
    }

    #[napi(getter)]
    pub fn name(&self) -> String {
        PLUGIN_NAME.to_string()
    }

    #[napi(getter)]
    pub fn enforce(&self) -> String {
        ENFORCE.to_string()
    }

    #[napi]
    pub fn configure_server(&self, env: Env, server: JsObject) -> napi::Result<()> {
        let server = JsDevServer::new(&env, server)?;
        self.inner.configure_server(Arc::new(server));
        Ok(())
    }

    #[napi]
    pub async fn transform(
        &self,
        code: String,
        id: String,
    ) -> napi::Result<Option<JsTransformResult>> {
        let output = self
            .inner
            .transform(&code, &id)
            .await
            .map_err(napi_error)?;
        Ok(output.map(|out| JsTransformResult {
            code: out.code,
            map: out.map,
        }))
    }

    #[napi]
    pub fn resolve_id(&self, id: String) -> Option<String> {
        self.inner.resolve_id(&id)
    }

    #[napi]
    pub fn load(&self, id: String) -> Option<JsLoadResult> {
        self.inner.load(&id).map(|loaded| JsLoadResult {
            code: loaded.code,
            watch_files: loaded.watch_files,
        })
    }
}
