use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 规则所属的层
///
/// 声明顺序即排序顺序：`defaults < base < components < utilities < user < variants`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Defaults,
    Base,
    Components,
    Utilities,
    /// 作者在样式表中直接写的规则（`@apply` 查找用）
    User,
    /// 带变体的规则，原始层记录在 `parent_layer`
    Variants,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Defaults => "defaults",
            Layer::Base => "base",
            Layer::Components => "components",
            Layer::Utilities => "utilities",
            Layer::User => "user",
            Layer::Variants => "variants",
        }
    }

    /// `@tailwind <name>` 占位符对应的层
    pub fn from_placeholder(name: &str) -> Option<Self> {
        match name {
            "base" => Some(Layer::Base),
            "components" => Some(Layer::Components),
            "utilities" => Some(Layer::Utilities),
            "variants" => Some(Layer::Variants),
            _ => None,
        }
    }
}

/// 诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 去重用的 key（同一个 key 每次构建只报告一次）
    pub key: String,
    pub messages: Vec<String>,
}

impl Diagnostic {
    pub fn warning(key: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            key: key.into(),
            messages,
        }
    }

    pub fn error(key: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            key: key.into(),
            messages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

/// 按 key 批量收集的诊断
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: IndexMap<String, Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条警告；同 key 已存在时忽略
    pub fn warn(&mut self, key: impl Into<String>, messages: Vec<String>) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return;
        }
        tracing::warn!(key = %key, "{}", messages.join("\n"));
        self.entries
            .insert(key.clone(), Diagnostic::warning(key, messages));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.values()
    }

    /// 取出全部诊断并清空
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries).into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_order() {
        assert!(Layer::Defaults < Layer::Base);
        assert!(Layer::Base < Layer::Components);
        assert!(Layer::Components < Layer::Utilities);
        assert!(Layer::Utilities < Layer::User);
        assert!(Layer::User < Layer::Variants);
    }

    #[test]
    fn test_layer_placeholder() {
        assert_eq!(Layer::from_placeholder("utilities"), Some(Layer::Utilities));
        assert_eq!(Layer::from_placeholder("screens"), None);
    }

    #[test]
    fn test_diagnostics_batched_by_key() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("content-problems", vec!["first".to_string()]);
        diagnostics.warn("content-problems", vec!["second".to_string()]);
        diagnostics.warn("other", vec!["third".to_string()]);

        assert_eq!(diagnostics.len(), 2);
        let taken = diagnostics.take();
        assert_eq!(taken[0].messages, vec!["first".to_string()]);
        assert_eq!(taken[1].key, "other");
        assert!(diagnostics.is_empty());
    }
}
