//! `@apply` expansion.
//!
//! Each `@apply a b !important` is resolved against the classes the author
//! defined in the same stylesheet first, then against the engine. Rules
//! whose rewritten selector is the parent's own selector have their
//! declarations spliced in place of the `@apply`; everything else (variant
//! selectors, media queries) is inserted after the parent, sorted by offset.
//! Inlined rules may carry their own `@apply`, so expansion repeats until
//! none is left.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::offsets::RuleOffset;
use crosswind_core::Layer;
use crosswind_css::{
    extract_class_names, move_pseudo_elements, parse_selector_list, retain_rules, walk_decls_mut, AtRule,
    Component, Node, Pseudo, PseudoArgs, Rule, Selector, SelectorList,
};
use crosswind_parse::split_at_top_level;
use indexmap::IndexMap;

/// 可被 `@apply` 的一条规则
#[derive(Debug, Clone)]
pub(crate) struct ApplyRule {
    offset: RuleOffset,
    important: bool,
    node: Node,
}

/// 作者样式表中按类名索引的规则
pub(crate) type LocalApplyCache = IndexMap<String, Vec<ApplyRule>>;

/// `@apply` 的参数：`font-bold underline !important`
fn split_apply_params(params: &str) -> (Vec<&str>, bool) {
    let mut candidates: Vec<&str> = params.split_whitespace().collect();
    let important = candidates.last() == Some(&"!important");
    if important {
        candidates.pop();
    }
    (candidates, important)
}

fn is_apply(node: &Node) -> bool {
    matches!(node, Node::AtRule(at) if at.name == "apply")
}

fn contains_apply(nodes: &[Node]) -> bool {
    nodes
        .iter()
        .any(|node| is_apply(node) || contains_apply(node.children()))
}

/// `hover:font-bold` → `font-bold`
fn base_candidate<'a>(candidate: &'a str, separator: &str) -> &'a str {
    split_at_top_level(candidate, separator).last().copied().unwrap_or(candidate)
}

fn classes_of(selector: &str) -> Vec<String> {
    parse_selector_list(selector)
        .map(|list| extract_class_names(&list))
        .unwrap_or_default()
}

impl Context {
    /// 收集作者样式表里的类规则（带上外层 at-rule）
    pub(crate) fn local_apply_cache(&mut self, nodes: &[Node]) -> LocalApplyCache {
        let mut found = Vec::new();
        collect_local_rules(nodes, &mut Vec::new(), &mut found);

        let mut cache = LocalApplyCache::new();
        for (rule, container) in found {
            let offset = self.registry.offsets.create(Layer::User);
            for class in classes_of(&rule.selector) {
                cache.entry(class).or_default().push(ApplyRule {
                    offset: offset.clone(),
                    important: false,
                    node: container.clone(),
                });
            }
        }
        cache
    }

    /// 展开所有 `@apply`
    pub(crate) fn expand_apply(&mut self, root: &mut Vec<Node>, local: &LocalApplyCache) -> Result<()> {
        let mut passes = 0;
        while contains_apply(root) {
            self.expand_apply_in(root, local)?;
            passes += 1;
        }
        if passes > 0 {
            tracing::debug!(passes, "expanded @apply");
        }
        Ok(())
    }

    fn expand_apply_in(&mut self, nodes: &mut Vec<Node>, local: &LocalApplyCache) -> Result<()> {
        let mut out = Vec::with_capacity(nodes.len());

        for node in std::mem::take(nodes) {
            match node {
                Node::Rule(mut rule) if rule.nodes.iter().any(is_apply) => {
                    let siblings = self.apply_into(&mut rule, local)?;
                    if !rule.nodes.is_empty() {
                        out.push(Node::Rule(rule));
                    }
                    out.extend(siblings);
                }
                Node::Rule(mut rule) => {
                    self.expand_apply_in(&mut rule.nodes, local)?;
                    out.push(Node::Rule(rule));
                }
                Node::AtRule(at) if at.name == "apply" => {
                    return Err(Error::InvalidApply {
                        message: "@apply must be used inside a rule.".to_string(),
                        line: at.line,
                    });
                }
                Node::AtRule(mut at) => {
                    let nested = at.nodes.as_deref().and_then(|children| {
                        children.iter().find_map(|child| match child {
                            Node::AtRule(apply) if apply.name == "apply" => Some(nested_at_rule_error(&at, apply)),
                            _ => None,
                        })
                    });
                    if let Some(err) = nested {
                        return Err(err);
                    }
                    if let Some(children) = &mut at.nodes {
                        self.expand_apply_in(children, local)?;
                    }
                    out.push(Node::AtRule(at));
                }
                other => out.push(other),
            }
        }

        *nodes = out;
        Ok(())
    }

    /// 展开一条规则内的 `@apply`；返回要插在该规则之后的兄弟节点
    fn apply_into(&mut self, parent: &mut Rule, local: &LocalApplyCache) -> Result<Vec<Node>> {
        let separator = self.config.separator.clone();
        let parent_selector = parent.selector.clone();
        let normalized_parent = parse_selector_list(&parent_selector)
            .map(|list| list.to_string())
            .unwrap_or_else(|_| parent_selector.clone());
        let parent_classes = classes_of(&parent_selector);
        let parasites = [format!("{}group", self.config.prefix), format!("{}peer", self.config.prefix)];

        let mut siblings: Vec<(RuleOffset, Node)> = Vec::new();
        let mut kept = Vec::with_capacity(parent.nodes.len());

        for child in std::mem::take(&mut parent.nodes) {
            let Node::AtRule(apply) = &child else {
                kept.push(child);
                continue;
            };
            if apply.name != "apply" {
                kept.push(child);
                continue;
            }

            let (candidates, important) = split_apply_params(&apply.params);
            let mut inline: Vec<(RuleOffset, Vec<Node>)> = Vec::new();

            for candidate in candidates {
                if parasites.iter().any(|p| p == candidate) {
                    return Err(Error::InvalidApply {
                        message: format!("@apply should not be used with the '{candidate}' utility"),
                        line: apply.line,
                    });
                }

                let rules = self
                    .apply_rules(candidate, local)?
                    .ok_or_else(|| Error::UnknownApplyTarget {
                        class: candidate.to_string(),
                        line: apply.line,
                    })?;

                for rule in &rules {
                    if let Node::Rule(r) = &rule.node {
                        if r.nodes.iter().any(|n| matches!(n, Node::Rule(_))) {
                            return Err(Error::InvalidApply {
                                message: format!(
                                    "The `{candidate}` class cannot be used with `@apply` because `@apply` does not currently support nested CSS."
                                ),
                                line: apply.line,
                            });
                        }
                    }
                }

                let base = base_candidate(candidate, &separator);
                let potential = [candidate, base];

                for rule in rules {
                    let node_classes = relevant_classes(&rule.node, &potential, &separator);
                    if parent_classes.iter().any(|class| node_classes.contains(class)) {
                        return Err(Error::CircularApply {
                            class: candidate.to_string(),
                            line: apply.line,
                        });
                    }

                    let mut container = vec![rule.node];
                    let rewrite = !matches!(&container[0], Node::AtRule(at) if at.is_keyframes());
                    if rewrite {
                        let mark = rule.important || important;
                        retain_rules(&mut container, &mut |r| {
                            if !classes_of(&r.selector).iter().any(|class| class == candidate) {
                                return Ok::<_, crosswind_css::ParseError>(false);
                            }
                            r.selector = replace_selector(&parent_selector, &r.selector, candidate)?;
                            if mark {
                                walk_decls_mut(&mut r.nodes, &mut |decl| decl.important = true);
                            }
                            Ok(true)
                        })?;
                    }

                    let Some(node) = container.into_iter().next() else {
                        continue;
                    };
                    match node {
                        Node::Rule(r) if r.selector == normalized_parent => inline.push((rule.offset, r.nodes)),
                        other => siblings.push((rule.offset, other)),
                    }
                }
            }

            for (_, decls) in self.registry.offsets.sort(inline) {
                kept.extend(decls);
            }
        }

        parent.nodes = kept;
        Ok(self
            .registry
            .offsets
            .sort(siblings)
            .into_iter()
            .map(|(_, node)| node)
            .collect())
    }

    /// 候选类的规则：作者样式表优先，其次由引擎解析；不存在时返回 `None`
    fn apply_rules(&mut self, candidate: &str, local: &LocalApplyCache) -> Result<Option<Vec<ApplyRule>>> {
        if let Some(rules) = local.get(candidate) {
            return Ok(Some(rules.clone()));
        }
        if self.caches.not_class_cache.contains(candidate) {
            return Ok(None);
        }

        let matches = match self.caches.class_cache.get(candidate) {
            Some(matches) => matches.clone(),
            None => match self.caches.apply_cache.get(candidate) {
                Some(matches) => matches.clone(),
                None => {
                    let matches = self.resolve_matches(candidate)?;
                    if matches.is_empty() {
                        self.caches.not_class_cache.insert(candidate.to_string());
                        return Ok(None);
                    }
                    self.caches.apply_cache.insert(candidate.to_string(), matches.clone());
                    matches
                }
            },
        };

        Ok(Some(
            matches
                .into_iter()
                .map(|m| ApplyRule {
                    offset: m.offset,
                    important: m.important,
                    node: m.rule,
                })
                .collect(),
        ))
    }
}

fn nested_at_rule_error(parent: &AtRule, apply: &AtRule) -> Error {
    let message = if parent.name == "screen" {
        let (candidates, _) = split_apply_params(&apply.params);
        let suggestion: Vec<String> = candidates.iter().map(|c| format!("{}:{c}", parent.params)).collect();
        format!(
            "@apply is not supported within nested at-rules like @screen. We suggest you write this as @apply {} instead.",
            suggestion.join(" ")
        )
    } else {
        format!(
            "@apply is not supported within nested at-rules like @{name}. You can fix this by un-nesting @{name}.",
            name = parent.name
        )
    };
    Error::InvalidApply {
        message,
        line: apply.line,
    }
}

/// 规则（含外层 at-rule 链的副本）
fn collect_local_rules(nodes: &[Node], ancestors: &mut Vec<AtRule>, out: &mut Vec<(Rule, Node)>) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                let mut container = Node::Rule(rule.clone());
                for at in ancestors.iter().rev() {
                    let mut wrapper = at.clone();
                    wrapper.nodes = Some(vec![container]);
                    container = Node::AtRule(wrapper);
                }
                out.push((rule.clone(), container));
            }
            Node::AtRule(at) if !at.is_keyframes() => {
                if let Some(children) = &at.nodes {
                    ancestors.push(AtRule::new(at.name.clone(), at.params.clone(), None));
                    collect_local_rules(children, ancestors, out);
                    ancestors.pop();
                }
            }
            _ => {}
        }
    }
}

/// 规则中与候选类相关的类名
///
/// `.dark .a, .b` 应用 `a` 时只看 `.dark .a` 这一支；变体类再补上它的基础类。
fn relevant_classes(node: &Node, potential: &[&str], separator: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    crosswind_css::walk_rules(std::slice::from_ref(node), &mut |rule| selectors.push(rule.selector.clone()));

    let mut classes = Vec::new();
    for selector in selectors {
        let Ok(list) = parse_selector_list(&selector) else { continue };
        for selector in list.selectors {
            let group = extract_class_names(&SelectorList::new(vec![selector]));
            if group.iter().any(|class| potential.contains(&class.as_str())) {
                classes.extend(group);
            }
        }
    }

    let bases: Vec<String> = classes
        .iter()
        .map(|class| base_candidate(class, separator).to_string())
        .collect();
    classes.extend(bases);
    classes
}

/// 把工具类选择器中的候选类替换为父规则的选择器
///
/// `.abc` 应用 `hover:font-bold`（`.hover\:font-bold:hover`）→ `.abc:hover`。
fn replace_selector(parent: &str, utility: &str, candidate: &str) -> std::result::Result<String, crosswind_css::ParseError> {
    let parents = parse_selector_list(parent)?;
    let utilities = parse_selector_list(utility)?;

    let mut replaced = Vec::new();
    for parent in &parents.selectors {
        for utility in &utilities.selectors {
            let mut selector = utility.clone();
            if replace_first_class(&mut selector, candidate, &parent.nodes) {
                sort_compounds(&mut selector);
                move_pseudo_elements(&mut selector);
                replaced.push(selector);
            }
        }
    }

    Ok(SelectorList::new(replaced).to_string())
}

fn replace_first_class(selector: &mut Selector, class: &str, replacement: &[Component]) -> bool {
    let position = selector
        .nodes
        .iter()
        .position(|node| matches!(node, Component::Class(name) if name == class));
    if let Some(position) = position {
        selector.nodes.splice(position..=position, replacement.iter().cloned());
        return true;
    }

    for node in &mut selector.nodes {
        if let Component::Pseudo(Pseudo {
            args: Some(PseudoArgs::Selectors(list)),
            ..
        }) = node
        {
            for inner in &mut list.selectors {
                if replace_first_class(inner, class, replacement) {
                    return true;
                }
            }
        }
    }
    false
}

/// 每个复合选择器内：标签在前，伪元素在后
fn sort_compounds(selector: &mut Selector) {
    fn rank(node: &Component) -> u8 {
        match node {
            Component::Tag(_) => 0,
            Component::Pseudo(pseudo) if pseudo.is_element() => 2,
            _ => 1,
        }
    }

    let mut start = 0;
    let len = selector.nodes.len();
    for end in 0..=len {
        if end == len || matches!(selector.nodes[end], Component::Combinator(_)) {
            selector.nodes[start..end].sort_by_key(rank);
            start = end + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswind_core::Config;
    use pretty_assertions::assert_eq;

    fn process(css: &str) -> Result<String> {
        let mut ctx = Context::new(Config::default()).unwrap();
        ctx.process_css(css, Vec::<String>::new())
    }

    #[test]
    fn test_split_apply_params() {
        assert_eq!(split_apply_params("font-bold  underline"), (vec!["font-bold", "underline"], false));
        assert_eq!(split_apply_params("flex !important"), (vec!["flex"], true));
    }

    #[test]
    fn test_replace_selector() {
        assert_eq!(
            replace_selector(".abc", r".hover\:font-bold:hover", "hover:font-bold").unwrap(),
            ".abc:hover"
        );
        assert_eq!(
            replace_selector("section", ".foo.bar", "bar").unwrap(),
            "section.foo"
        );
        assert_eq!(
            replace_selector(".a, .b", ".x::placeholder", "x").unwrap(),
            ".a::placeholder, .b::placeholder"
        );
    }

    #[test]
    fn test_apply_splices_declarations_in_place() {
        let css = process(".btn { color: red; @apply font-bold underline; margin: 0 }").unwrap();
        assert_eq!(
            css,
            ".btn {\n  color: red;\n  font-weight: 700;\n  text-decoration-line: underline;\n  margin: 0;\n}\n"
        );
    }

    #[test]
    fn test_apply_sorts_by_utility_order() {
        let css = process(".btn { @apply underline flex; }").unwrap();
        assert_eq!(css, ".btn {\n  display: flex;\n  text-decoration-line: underline;\n}\n");
    }

    #[test]
    fn test_apply_variants_become_siblings() {
        let css = process(".btn { @apply hover:font-bold sm:flex; }").unwrap();
        assert_eq!(
            css,
            ".btn:hover {\n  font-weight: 700;\n}\n@media (min-width: 640px) {\n  .btn {\n    display: flex;\n  }\n}\n"
        );
    }

    #[test]
    fn test_apply_at_rule_only_variants() {
        let css = process(".btn { @apply print:flex; }").unwrap();
        assert_eq!(css, "@media print {\n  .btn {\n    display: flex;\n  }\n}\n");

        let css = process(".btn { @apply supports-[display:grid]:flex; }").unwrap();
        assert!(css.starts_with("@supports"));
        assert!(css.contains(".btn {\n    display: flex;\n  }"));
    }

    #[test]
    fn test_apply_important() {
        let css = process(".btn { @apply flex !important; }").unwrap();
        assert_eq!(css, ".btn {\n  display: flex !important;\n}\n");
    }

    #[test]
    fn test_apply_local_class_recursively() {
        let css = process(".a { @apply underline; }\n.b { @apply a flex; }").unwrap();
        assert_eq!(
            css,
            ".a {\n  text-decoration-line: underline;\n}\n.b {\n  display: flex;\n  text-decoration-line: underline;\n}\n"
        );
    }

    #[test]
    fn test_unknown_apply_target() {
        let err = process(".btn {\n  @apply nope;\n}").unwrap_err();
        assert!(matches!(err, Error::UnknownApplyTarget { ref class, line: Some(2) } if class == "nope"));
    }

    #[test]
    fn test_circular_apply() {
        let err = process(".a { @apply b; }\n.b { @apply a; }").unwrap_err();
        assert!(matches!(err, Error::CircularApply { .. }));
    }

    #[test]
    fn test_apply_inside_media_is_rejected() {
        let err = process("@media print { @apply flex; }").unwrap_err();
        assert!(matches!(err, Error::InvalidApply { .. }));
        assert!(err.to_string().contains("un-nesting @media"));
    }

    #[test]
    fn test_apply_group_is_rejected() {
        let err = process(".a { @apply group; }").unwrap_err();
        assert!(err.to_string().contains("'group'"));
    }
}
