use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid safelist pattern `{pattern}`: {source}")]
    SafelistPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
