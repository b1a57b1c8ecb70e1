use crosswind_core::ConfigError;
use crosswind_css::ParseError;
use thiserror::Error;

/// 生成过程中的硬错误
///
/// 无法识别的候选类、歧义的任意值等软错误不会走到这里，
/// 它们只会让候选类不产生任何规则（并可能记录一条诊断）。
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Your custom variant `{variant}` has an invalid format string `{format}`. \
         Make sure it's an at-rule or contains a `&` placeholder."
    )]
    InvalidVariantFormat { variant: String, format: String },

    #[error("plugin `{plugin}` failed: {message}")]
    Plugin { plugin: String, message: String },

    #[error("The `{class}` class does not exist{}", line_suffix(*.line))]
    UnknownApplyTarget { class: String, line: Option<usize> },

    #[error(
        "You cannot `@apply` the `{class}` utility here because it creates a circular dependency{}",
        line_suffix(*.line)
    )]
    CircularApply { class: String, line: Option<usize> },

    #[error("{message}{}", line_suffix(*.line))]
    InvalidApply { message: String, line: Option<usize> },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Css(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// 插件回调中的错误
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

fn line_suffix(line: Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_apply_target_message() {
        let err = Error::UnknownApplyTarget {
            class: "foo".into(),
            line: Some(3),
        };
        assert_eq!(err.to_string(), "The `foo` class does not exist (line 3)");
    }

    #[test]
    fn test_config_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = ConfigError::from(json_err).into();
        assert!(matches!(err, Error::Config(_)));
    }
}
