use super::{Component, Pseudo, PseudoArgs, Selector, SelectorList};

/// Which class tokens [`rewrite_class_names`] touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassScope {
    /// Every class, including those nested inside pseudo arguments.
    All,
    /// Only the rightmost top-level class of each selector.
    Last,
}

/// Collects class names in document order, skipping anything inside `:not(...)`.
///
/// Duplicates are kept out; the first occurrence wins.
pub fn extract_class_names(list: &SelectorList) -> Vec<String> {
    let mut out = Vec::new();
    for selector in &list.selectors {
        collect_classes(selector, &mut out);
    }
    out
}

fn collect_classes(selector: &Selector, out: &mut Vec<String>) {
    for node in &selector.nodes {
        match node {
            Component::Class(name) => {
                if !out.iter().any(|seen| seen == name) {
                    out.push(name.clone());
                }
            }
            Component::Pseudo(Pseudo {
                name,
                args: Some(PseudoArgs::Selectors(inner)),
            }) if name != ":not" => {
                for selector in &inner.selectors {
                    collect_classes(selector, out);
                }
            }
            _ => {}
        }
    }
}

/// Renames class tokens in place.
pub fn rewrite_class_names(
    list: &mut SelectorList,
    scope: ClassScope,
    f: &mut dyn FnMut(&str) -> String,
) {
    match scope {
        ClassScope::All => list.walk_mut(&mut |node| {
            if let Component::Class(name) = node {
                *name = f(name);
            }
        }),
        ClassScope::Last => {
            for selector in &mut list.selectors {
                if let Some(Component::Class(name)) = selector
                    .nodes
                    .iter_mut()
                    .rev()
                    .find(|node| matches!(node, Component::Class(_)))
                {
                    *name = f(name);
                }
            }
        }
    }
}

/// 给所有类名加前缀
///
/// `prepend_negative` 时 `-mt-4` → `-tw-mt-4` 而不是 `tw--mt-4`。
pub fn prefix_selector(list: &mut SelectorList, prefix: &str, prepend_negative: bool) {
    if prefix.is_empty() {
        return;
    }
    rewrite_class_names(list, ClassScope::All, &mut |name| {
        match name.strip_prefix('-') {
            Some(rest) if prepend_negative => format!("-{prefix}{rest}"),
            _ => format!("{prefix}{name}"),
        }
    });
}

/// 删除不包含 `base` 类的选择器分支；返回是否还有剩余
pub fn eliminate_irrelevant(list: &mut SelectorList, base: &str) -> bool {
    list.selectors.retain(|selector| {
        let mut found = false;
        selector.walk(&mut |node| {
            found |= matches!(node, Component::Class(name) if name == base);
        });
        found
    });
    !list.selectors.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector_list;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_ignores_not() {
        let list = parse_selector_list(r".a:not(.b) .c, :is(.d) .a").unwrap();
        assert_eq!(extract_class_names(&list), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_rewrite_last_only() {
        let mut list = parse_selector_list(".foo .bar").unwrap();
        rewrite_class_names(&mut list, ClassScope::Last, &mut |c| format!("hover:{c}"));
        assert_eq!(list.to_string(), r".foo .hover\:bar");
    }

    #[test]
    fn test_rewrite_all_descends_into_pseudos() {
        let mut list = parse_selector_list(".a:is(.b)").unwrap();
        rewrite_class_names(&mut list, ClassScope::All, &mut |c| c.to_uppercase());
        assert_eq!(list.to_string(), ".A:is(.B)");
    }

    #[test]
    fn test_prefix_selector() {
        let mut list = parse_selector_list(".-mt-4, .group:hover .flex").unwrap();
        prefix_selector(&mut list, "tw-", true);
        assert_eq!(list.to_string(), ".-tw-mt-4, .tw-group:hover .tw-flex");

        let mut list = parse_selector_list(".-mt-4").unwrap();
        prefix_selector(&mut list, "tw-", false);
        assert_eq!(list.to_string(), ".tw--mt-4");
    }

    #[test]
    fn test_eliminate_irrelevant() {
        let mut list = parse_selector_list(".a, .b > .x, :is(.b)").unwrap();
        assert!(eliminate_irrelevant(&mut list, "b"));
        assert_eq!(list.to_string(), ".b > .x, :is(.b)");
        assert!(!eliminate_irrelevant(&mut list, "zzz"));
    }
}
