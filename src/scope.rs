//! Scope Import Rewriting
//!
//! A module may ask for its own scope token at runtime:
//!
//! ```js
//! import scope from '@miniwind/scope'
//! const cls = scope()
//! ```
//!
//! The import clause is swapped for a self-contained `data:` module whose
//! default export is a function returning the literal token.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

use crate::hash::ScopeToken;

/// Specifier of the scope helper module.
pub const SCOPE_MODULE: &str = "@miniwind/scope";

lazy_static! {
    /// ` from '@miniwind/scope'` with either quote style (quotes must match).
    static ref SCOPE_IMPORT_RE: Regex =
        Regex::new(r#" from (?:'@miniwind/scope'|"@miniwind/scope")"#).unwrap();
}

pub fn has_scope_import(code: &str) -> bool {
    SCOPE_IMPORT_RE.is_match(code)
}

/// Source of the inline module standing in for [`SCOPE_MODULE`].
pub fn scope_module_source(token: &ScopeToken) -> String {
    format!("export default () => \"{}\"", token)
}

/// `data:` URL carrying [`scope_module_source`].
pub fn scope_module_url(token: &ScopeToken) -> String {
    format!(
        "data:text/javascript;base64,{}",
        STANDARD.encode(scope_module_source(token))
    )
}

/// Replace every scope import clause in `code`. Returns the input untouched
/// (borrowed) when there is nothing to replace.
pub fn rewrite_scope_import<'a>(code: &'a str, token: &ScopeToken) -> Cow<'a, str> {
    let replacement = format!(" from '{}'", scope_module_url(token));
    SCOPE_IMPORT_RE.replace_all(code, regex::NoExpand(&replacement))
}
