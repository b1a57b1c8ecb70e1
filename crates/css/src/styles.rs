//! Nested style objects.
//!
//! Plugins describe their output as a tree of declarations and nested
//! selectors / at-rules, the way CSS-in-JS objects do. [`Styles::into_rules`]
//! flattens that tree into plain [`Node`]s:
//!
//! - `&` in a nested key is replaced with the parent selector, otherwise
//!   the key is joined to the parent as a descendant
//! - comma lists on either side expand to their cartesian product
//! - at-rules bubble out of rules and wrap the parent selector

use crate::ast::{AtRule, Node, Rule};
use crate::parser::split_at_rule;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Styles {
    entries: Vec<StyleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StyleEntry {
    Decl(String, String),
    Nested(String, Styles),
}

impl Styles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration. camelCase properties are converted to kebab-case.
    pub fn decl(mut self, prop: &str, value: impl Into<String>) -> Self {
        self.entries
            .push(StyleEntry::Decl(kebab_case(prop), value.into()));
        self
    }

    /// Adds a nested selector (`&:hover`, `> li`) or at-rule (`@media ...`).
    pub fn nest(mut self, key: impl Into<String>, styles: Styles) -> Self {
        self.entries.push(StyleEntry::Nested(key.into(), styles));
        self
    }

    pub fn push_decl(&mut self, prop: &str, value: impl Into<String>) {
        self.entries
            .push(StyleEntry::Decl(kebab_case(prop), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declarations at this level, in insertion order.
    pub fn decls(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|entry| match entry {
            StyleEntry::Decl(prop, value) => Some((prop.as_str(), value.as_str())),
            StyleEntry::Nested(..) => None,
        })
    }

    /// 以 `selector` 为根展开
    pub fn into_rules(self, selector: &str) -> Vec<Node> {
        flatten(self, Some(selector))
    }

    /// 顶层的 key 本身就是选择器或 at-rule
    pub fn into_nodes(self) -> Vec<Node> {
        flatten(self, None)
    }
}

fn flatten(styles: Styles, parent: Option<&str>) -> Vec<Node> {
    let mut decls = Vec::new();
    let mut nested = Vec::new();

    for entry in styles.entries {
        match entry {
            StyleEntry::Decl(prop, value) => decls.push(Node::decl(prop, value)),
            StyleEntry::Nested(key, child) => {
                let key = key.trim();
                if let Some(at) = key.strip_prefix('@') {
                    let (name, params) = split_at_rule(at);
                    let children = flatten(child, parent);
                    nested.push(Node::AtRule(AtRule::new(name, params, Some(children))));
                } else {
                    let selector = match parent {
                        Some(parent) => resolve_nested_selector(parent, key),
                        None => key.to_string(),
                    };
                    nested.extend(flatten(child, Some(&selector)));
                }
            }
        }
    }

    let mut out = Vec::with_capacity(nested.len() + 1);
    if !decls.is_empty() {
        match parent {
            Some(selector) => out.push(Node::Rule(Rule::new(selector, decls))),
            None => out.extend(decls),
        }
    }
    out.extend(nested);
    out
}

/// 嵌套选择器展开
///
/// ```
/// use crosswind_css::resolve_nested_selector;
///
/// assert_eq!(resolve_nested_selector(".a, .b", "&:hover"), ".a:hover, .b:hover");
/// assert_eq!(resolve_nested_selector(".a", "> li"), ".a > li");
/// ```
pub fn resolve_nested_selector(parent: &str, child: &str) -> String {
    let parents = split_list(parent);
    let children = split_list(child);
    let mut out = Vec::with_capacity(parents.len() * children.len());

    for p in &parents {
        for c in &children {
            if c.contains('&') {
                out.push(c.replace('&', p));
            } else {
                out.push(format!("{p} {c}"));
            }
        }
    }

    out.join(", ")
}

/// 按顶层逗号切分选择器列表
fn split_list(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

/// `backgroundColor` → `background-color`，`WebkitAppearance` → `-webkit-appearance`
fn kebab_case(prop: &str) -> String {
    if prop.starts_with("--") || !prop.chars().any(|c| c.is_ascii_uppercase()) {
        return prop.to_string();
    }
    let mut out = String::with_capacity(prop.len() + 4);
    for (i, c) in prop.chars().enumerate() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            if i == 0 && prop.starts_with("ms") {
                out.push('-');
            }
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit_css;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("backgroundColor"), "background-color");
        assert_eq!(kebab_case("WebkitAppearance"), "-webkit-appearance");
        assert_eq!(kebab_case("msFlexAlign"), "-ms-flex-align");
        assert_eq!(kebab_case("--tw-bg-opacity"), "--tw-bg-opacity");
        assert_eq!(kebab_case("display"), "display");
    }

    #[test]
    fn test_flatten_nested_selector() {
        let styles = Styles::new()
            .decl("color", "red")
            .nest("&::placeholder", Styles::new().decl("color", "blue"));
        assert_eq!(
            emit_css(&styles.into_rules(".a")),
            ".a {\n  color: red;\n}\n.a::placeholder {\n  color: blue;\n}\n"
        );
    }

    #[test]
    fn test_flatten_at_rule_bubbles() {
        let styles = Styles::new().decl("width", "100%").nest(
            "@media (min-width: 640px)",
            Styles::new().decl("maxWidth", "640px"),
        );
        assert_eq!(
            emit_css(&styles.into_rules(".container")),
            ".container {\n  width: 100%;\n}\n@media (min-width: 640px) {\n  .container {\n    max-width: 640px;\n  }\n}\n"
        );
    }

    #[test]
    fn test_into_nodes_top_level() {
        let styles = Styles::new()
            .nest(
                "@keyframes spin",
                Styles::new().nest("to", Styles::new().decl("transform", "rotate(360deg)")),
            )
            .nest("@font-face", Styles::new().decl("fontFamily", "X"));
        let nodes = styles.into_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            emit_css(&nodes),
            "@keyframes spin {\n  to {\n    transform: rotate(360deg);\n  }\n}\n@font-face {\n  font-family: X;\n}\n"
        );
    }

    #[test]
    fn test_resolve_cartesian() {
        assert_eq!(
            resolve_nested_selector(".a, .b", "&:hover, &:focus"),
            ".a:hover, .a:focus, .b:hover, .b:focus"
        );
    }
}
