use serde::{Deserialize, Serialize};

/// 不依赖任何类名、无条件输出的规则使用的候选标记
pub const NOT_ON_DEMAND: &str = "*";

/// 解析后的候选类
///
/// `md:hover:!bg-red-500/50` →
/// - `variants`: `["md", "hover"]`（书写顺序，应用时从右到左）
/// - `base`: `"bg-red-500/50"`
/// - `important`: `true`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedCandidate {
    /// 原始候选字符串
    pub raw: String,

    /// 变体链
    pub variants: Vec<String>,

    /// 工具类部分（已去掉 `!`）
    pub base: String,

    /// 重要性标记（前缀 `!` 或旧式后缀 `!`）
    pub important: bool,
}

impl ParsedCandidate {
    /// 变体分组 `hover:(flex,underline)` 的各个部分
    pub fn group_parts(&self) -> Option<Vec<&str>> {
        let inner = self.base.strip_prefix('(')?.strip_suffix(')')?;
        Some(crate::split_at_top_level(inner, ","))
    }

    /// 从右到左的变体迭代（最右边的变体最先应用）
    pub fn variants_innermost_first(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().rev().map(String::as_str)
    }
}

/// 是否是任意值（`[...]`）
pub fn is_arbitrary_value(input: &str) -> bool {
    input.len() >= 2 && input.starts_with('[') && input.ends_with(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_arbitrary_value() {
        assert!(is_arbitrary_value("[13px]"));
        assert!(!is_arbitrary_value("13px"));
        assert!(!is_arbitrary_value("["));
    }

    #[test]
    fn test_group_parts() {
        let parsed = ParsedCandidate {
            raw: "hover:(flex,underline)".to_string(),
            variants: vec!["hover".to_string()],
            base: "(flex,underline)".to_string(),
            important: false,
        };
        assert_eq!(parsed.group_parts(), Some(vec!["flex", "underline"]));
    }
}
