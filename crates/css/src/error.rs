use thiserror::Error;

/// CSS / 选择器解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset} in `{input}`")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub input: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            offset,
            input: input.to_string(),
        }
    }
}
