use thiserror::Error;

/// Failure raised by a collaborator outside this crate (generator, dev server).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PluginError {
    /// The style generator failed for `id`. Nothing was registered.
    #[error("style generation failed for {id}: {source}")]
    Generate {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid filter pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid plugin options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;
