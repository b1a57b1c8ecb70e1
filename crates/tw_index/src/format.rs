//! Variant selector formatting.
//!
//! Variants contribute format strings (`&:hover`, `:merge(.group):focus &`).
//! [`format_variant_selector`] folds them, innermost first, into one
//! selector built around the candidate class; [`finalize_selector`] then
//! substitutes that selector for the base class inside the utility's own
//! selector.

use crate::variant::CollectedFormat;
use crosswind_css::{
    eliminate_irrelevant, move_pseudo_elements, parse_selector_list, prefix_selector, Component,
    ParseError, Pseudo, PseudoArgs, Selector, SelectorList,
};

const MERGE: &str = ":merge";

/// 把收集到的格式依次合并到候选类选择器上
pub fn format_variant_selector(
    formats: &[CollectedFormat],
    candidate: &str,
    prefix: &str,
) -> Result<SelectorList, ParseError> {
    let mut current = SelectorList::new(vec![Selector::class(candidate)]);

    for format in formats {
        let mut ast = parse_selector_list(&format.format)?;
        if format.respect_prefix {
            prefix_selector(&mut ast, prefix, false);
        }

        handle_merge_pseudo(&mut current, &mut ast);

        let replacement = current
            .selectors
            .first()
            .map(|selector| selector.nodes.clone())
            .unwrap_or_default();
        for selector in &mut ast.selectors {
            selector.replace_nesting(&replacement);
        }
        current = ast;
    }

    Ok(current)
}

/// 合并同名的 `:merge(...)`
///
/// `current` 已有 `:merge(.group):hover .x`，格式为 `:merge(.group):focus &` 时，
/// `:focus` 插到已有的 `:merge(.group)` 之后，格式本身只剩 `&`。
fn handle_merge_pseudo(current: &mut SelectorList, format: &mut SelectorList) {
    for selector in &mut format.selectors {
        let mut i = 0;
        while i < selector.nodes.len() {
            let Some(key) = merge_key(&selector.nodes[i]) else {
                i += 1;
                continue;
            };
            let Some((target, position)) = find_merge(current, &key) else {
                i += 1;
                continue;
            };

            let end = selector.nodes[i + 1..]
                .iter()
                .position(|node| matches!(node, Component::Combinator(_)))
                .map_or(selector.nodes.len(), |p| i + 1 + p);
            let attachments: Vec<Component> = selector.nodes[i + 1..end].to_vec();
            let remove_to = if end < selector.nodes.len() { end + 1 } else { end };
            selector.nodes.drain(i..remove_to);

            let nodes = &mut current.selectors[target].nodes;
            for (offset, node) in attachments.into_iter().enumerate() {
                nodes.insert(position + 1 + offset, node);
            }
        }
    }
}

fn merge_key(node: &Component) -> Option<String> {
    match node {
        Component::Pseudo(Pseudo {
            name,
            args: Some(PseudoArgs::Selectors(list)),
        }) if name == MERGE => Some(list.to_string()),
        _ => None,
    }
}

fn find_merge(list: &SelectorList, key: &str) -> Option<(usize, usize)> {
    list.selectors.iter().enumerate().find_map(|(s, selector)| {
        selector
            .nodes
            .iter()
            .position(|node| merge_key(node).as_deref() == Some(key))
            .map(|n| (s, n))
    })
}

/// 在规则选择器中用格式替换基础类
///
/// # 参数
///
/// - `current`: 工具类规则的原始选择器
/// - `format`: [`format_variant_selector`] 的结果
/// - `base`: 候选类的最后一段（不含变体）
///
/// 所有分支都不包含 `base` 时返回 `None`。
pub fn finalize_selector(
    current: &str,
    format: &SelectorList,
    base: &str,
) -> Result<Option<String>, ParseError> {
    let mut ast = parse_selector_list(current)?;
    if !eliminate_irrelevant(&mut ast, base) {
        return Ok(None);
    }

    let format_nodes = format
        .selectors
        .first()
        .map(|selector| selector.nodes.clone())
        .unwrap_or_default();

    for selector in &mut ast.selectors {
        for start in replace_class(selector, base, &format_nodes) {
            resort_compound(selector, start);
            resort_compound(selector, start + format_nodes.len().saturating_sub(1));
        }
        unwrap_merge(selector);
        move_pseudo_elements(selector);
    }

    Ok(Some(ast.to_string()))
}

/// 替换（含伪类参数内的）所有 `base` 类；返回顶层替换位置
fn replace_class(selector: &mut Selector, base: &str, replacement: &[Component]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut nodes = Vec::with_capacity(selector.nodes.len() + replacement.len());
    for mut node in std::mem::take(&mut selector.nodes) {
        match &mut node {
            Component::Class(name) if name == base => {
                starts.push(nodes.len());
                nodes.extend(replacement.iter().cloned());
                continue;
            }
            Component::Pseudo(Pseudo {
                args: Some(PseudoArgs::Selectors(list)),
                ..
            }) => {
                for inner in &mut list.selectors {
                    replace_class(inner, base, replacement);
                }
            }
            _ => {}
        }
        nodes.push(node);
    }
    selector.nodes = nodes;
    starts
}

/// 重排 `index` 所在的复合选择器：标签在前，伪类/伪元素在后，其余保持相对顺序
fn resort_compound(selector: &mut Selector, index: usize) {
    fn rank(node: &Component) -> u8 {
        match node {
            Component::Tag(_) => 0,
            Component::Pseudo(_) => 2,
            _ => 1,
        }
    }

    let nodes = &mut selector.nodes;
    if index >= nodes.len() || matches!(nodes[index], Component::Combinator(_)) {
        return;
    }
    let start = nodes[..index]
        .iter()
        .rposition(|node| matches!(node, Component::Combinator(_)))
        .map_or(0, |i| i + 1);
    let end = nodes[index..]
        .iter()
        .position(|node| matches!(node, Component::Combinator(_)))
        .map_or(nodes.len(), |i| index + i);
    nodes[start..end].sort_by_key(rank);
}

/// `:merge(.group)` → `.group`
pub(crate) fn unwrap_merge(selector: &mut Selector) {
    let mut nodes = Vec::with_capacity(selector.nodes.len());
    for mut node in std::mem::take(&mut selector.nodes) {
        if let Component::Pseudo(Pseudo {
            name,
            args: Some(PseudoArgs::Selectors(list)),
        }) = &mut node
        {
            if name == MERGE {
                if let Some(inner) = list.selectors.first_mut() {
                    unwrap_merge(inner);
                    nodes.append(&mut inner.nodes);
                }
                continue;
            }
            for inner in &mut list.selectors {
                unwrap_merge(inner);
            }
        }
        nodes.push(node);
    }
    selector.nodes = nodes;
}

/// `important: "#app"` 策略
///
/// 带顶层组合符的选择器包进 `:is()`，末尾的伪元素留在外面。
pub fn apply_important_selector(selector: &str, important: &str) -> Result<String, ParseError> {
    let mut list = parse_selector_list(selector)?;

    for selector in &mut list.selectors {
        move_pseudo_elements(selector);
        if !selector.has_top_level_combinator() {
            continue;
        }

        let split = selector
            .nodes
            .iter()
            .rposition(|node| !matches!(node, Component::Pseudo(p) if p.is_element()))
            .map_or(0, |i| i + 1);
        let trailing = selector.nodes.split_off(split);
        let inner = std::mem::take(selector);
        selector.nodes.push(Component::Pseudo(Pseudo::with_selectors(
            ":is",
            SelectorList::new(vec![inner]),
        )));
        selector.nodes.extend(trailing);
    }

    Ok(format!("{important} {list}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn formats(list: &[&str]) -> Vec<CollectedFormat> {
        list.iter()
            .map(|f| CollectedFormat {
                format: f.to_string(),
                respect_prefix: true,
            })
            .collect()
    }

    fn finalize(rule: &str, formats_list: &[&str], candidate: &str, base: &str) -> Option<String> {
        let format = format_variant_selector(&formats(formats_list), candidate, "").unwrap();
        finalize_selector(rule, &format, base).unwrap()
    }

    #[test]
    fn test_stacked_pseudo_classes() {
        assert_eq!(
            finalize(".text-center", &["&:hover", "&:focus"], "focus:hover:text-center", "text-center")
                .as_deref(),
            Some(r".focus\:hover\:text-center:hover:focus")
        );
    }

    #[test]
    fn test_merge_shares_group() {
        assert_eq!(
            finalize(
                ".text-center",
                &[":merge(.group):hover &", ":merge(.group):focus &"],
                "group-focus:group-hover:text-center",
                "text-center"
            )
            .as_deref(),
            Some(r".group:focus:hover .group-focus\:group-hover\:text-center")
        );
    }

    #[test]
    fn test_different_merge_keys_stay_separate() {
        assert_eq!(
            finalize(
                ".flex",
                &[":merge(.peer):checked ~ &", ":merge(.group):hover &"],
                "group-hover:peer-checked:flex",
                "flex"
            )
            .as_deref(),
            Some(r".group:hover .peer:checked ~ .group-hover\:peer-checked\:flex")
        );
    }

    #[test]
    fn test_pseudo_element_stays_last() {
        assert_eq!(
            finalize(
                ".placeholder-red-500::placeholder",
                &["&:hover"],
                "hover:placeholder-red-500",
                "placeholder-red-500"
            )
            .as_deref(),
            Some(r".hover\:placeholder-red-500:hover::placeholder")
        );
    }

    #[test]
    fn test_before_variant_on_hover() {
        assert_eq!(
            finalize(".underline", &["&::before", "&:hover"], "hover:before:underline", "underline")
                .as_deref(),
            Some(r".hover\:before\:underline:hover::before")
        );
    }

    #[test]
    fn test_irrelevant_branches_removed() {
        assert_eq!(
            finalize(".a, .b", &["&:hover"], "hover:b", "b").as_deref(),
            Some(r".hover\:b:hover")
        );
        assert_eq!(finalize(".a", &["&:hover"], "hover:b", "b"), None);
    }

    #[test]
    fn test_tag_sorted_first() {
        assert_eq!(
            finalize(".prose", &["div&"], "[div&]:prose", "prose").as_deref(),
            Some(r"div.\[div\&\]\:prose")
        );
    }

    #[test]
    fn test_format_respects_prefix() {
        let format = format_variant_selector(&formats(&[".dark &"]), "dark:tw-flex", "tw-").unwrap();
        assert_eq!(format.to_string(), r".tw-dark .dark\:tw-flex");
    }

    #[test]
    fn test_apply_important_selector() {
        assert_eq!(apply_important_selector(".underline", "#app").unwrap(), "#app .underline");
        assert_eq!(
            apply_important_selector(".group:hover .x::before", "#app").unwrap(),
            "#app :is(.group:hover .x)::before"
        );
    }
}
