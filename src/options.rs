use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One include/exclude rule. A bare string is a glob; `{ "regex": ".." }`
/// is a regular expression tested against the raw module id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterPattern {
    Glob(String),
    Regex { regex: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleScopeOptions {
    /// Replaces the default include list when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<FilterPattern>>,
    /// Replaces the default exclude list when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<FilterPattern>>,
}

impl ModuleScopeOptions {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
