use crate::split::split_at_top_level;
use crate::types::{ParsedCandidate, NOT_ON_DEMAND};

/// 解析候选类字符串
///
/// 支持的格式：
/// - 简单类：`flex`, `p-4`, `bg-red-500`
/// - 变体：`hover:bg-blue-500`, `md:hover:flex`
/// - 任意变体：`[&:nth-child(3)]:underline`
/// - 重要性：`!flex`, `md:!flex`，以及旧式 `flex!`
/// - 自定义分隔符：`md_flex`（`separator = "_"`）
///
/// # 示例
///
/// ```
/// use crosswind_parse::parse_candidate;
///
/// let parsed = parse_candidate("md:hover:!bg-blue-500/50", ":");
/// assert_eq!(parsed.variants, vec!["md", "hover"]);
/// assert_eq!(parsed.base, "bg-blue-500/50");
/// assert!(parsed.important);
/// ```
pub fn parse_candidate(input: &str, separator: &str) -> ParsedCandidate {
    if input == NOT_ON_DEMAND {
        return ParsedCandidate {
            raw: input.to_string(),
            variants: Vec::new(),
            base: input.to_string(),
            important: false,
        };
    }

    let mut parts = split_at_top_level(input, separator);
    let last = parts.pop().unwrap_or_default();

    let (base, important) = strip_important(last);

    ParsedCandidate {
        raw: input.to_string(),
        variants: parts.into_iter().map(str::to_string).collect(),
        base: base.to_string(),
        important,
    }
}

/// 去掉 `!` 标记
fn strip_important(base: &str) -> (&str, bool) {
    if let Some(rest) = base.strip_prefix('!') {
        return (rest, true);
    }
    // 旧式后缀 `!`，排除 `[...]` 内部的感叹号
    if let Some(rest) = base.strip_suffix('!') {
        if !rest.is_empty() && !rest.ends_with('\\') {
            return (rest, true);
        }
    }
    (base, false)
}

/// 展开变体分组
///
/// `md:hover:(flex,underline)` → `["md:hover:flex", "md:hover:underline"]`。
/// 不是分组时返回 `None`。
pub fn expand_variant_group(parsed: &ParsedCandidate, separator: &str) -> Option<Vec<String>> {
    let parts = parsed.group_parts()?;
    let prefix = parsed.variants.join(separator);

    Some(
        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(|part| {
                if prefix.is_empty() {
                    part.to_string()
                } else {
                    format!("{prefix}{separator}{part}")
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_class() {
        let parsed = parse_candidate("underline", ":");
        assert!(parsed.variants.is_empty());
        assert_eq!(parsed.base, "underline");
        assert!(!parsed.important);
    }

    #[test]
    fn test_multiple_variants() {
        let parsed = parse_candidate("focus:hover:text-center", ":");
        assert_eq!(parsed.variants, vec!["focus", "hover"]);
        let applied: Vec<&str> = parsed.variants_innermost_first().collect();
        assert_eq!(applied, vec!["hover", "focus"]);
    }

    #[test]
    fn test_important_prefix() {
        let parsed = parse_candidate("md:!flex", ":");
        assert_eq!(parsed.base, "flex");
        assert!(parsed.important);
    }

    #[test]
    fn test_important_suffix() {
        let parsed = parse_candidate("flex!", ":");
        assert_eq!(parsed.base, "flex");
        assert!(parsed.important);
    }

    #[test]
    fn test_arbitrary_variant() {
        let parsed = parse_candidate("[&:nth-child(3)]:underline", ":");
        assert_eq!(parsed.variants, vec!["[&:nth-child(3)]"]);
        assert_eq!(parsed.base, "underline");
    }

    #[test]
    fn test_arbitrary_property_kept_whole() {
        let parsed = parse_candidate("hover:[mask-type:luminance]", ":");
        assert_eq!(parsed.variants, vec!["hover"]);
        assert_eq!(parsed.base, "[mask-type:luminance]");
    }

    #[test]
    fn test_not_on_demand() {
        let parsed = parse_candidate(NOT_ON_DEMAND, ":");
        assert_eq!(parsed.base, "*");
        assert!(parsed.variants.is_empty());
    }

    #[test]
    fn test_expand_variant_group() {
        let parsed = parse_candidate("md:hover:(flex,underline)", ":");
        assert_eq!(
            expand_variant_group(&parsed, ":"),
            Some(vec!["md:hover:flex".to_string(), "md:hover:underline".to_string()])
        );
        assert_eq!(expand_variant_group(&parse_candidate("flex", ":"), ":"), None);
    }
}
