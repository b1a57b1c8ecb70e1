//! CSS node tree shared by the parser, the printer and the engine.

/// CSS 节点
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Decl(Decl),
    Comment(String),
}

/// 选择器规则 `selector { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    /// 源码行号（仅作者样式表中的节点有）
    pub line: Option<usize>,
}

/// at-rule `@name params { ... }` 或 `@name params;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    /// `None` 表示没有块（`@apply foo;`）
    pub nodes: Option<Vec<Node>>,
    pub line: Option<usize>,
}

/// 声明 `prop: value`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decl {
    pub prop: String,
    pub value: String,
    pub important: bool,
}

impl Rule {
    pub fn new(selector: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            selector: selector.into(),
            nodes,
            line: None,
        }
    }
}

impl AtRule {
    pub fn new(name: impl Into<String>, params: impl Into<String>, nodes: Option<Vec<Node>>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            nodes,
            line: None,
        }
    }

    pub fn is_keyframes(&self) -> bool {
        self.name == "keyframes" || self.name.ends_with("-keyframes")
    }
}

impl Decl {
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            value: value.into(),
            important: false,
        }
    }
}

impl Node {
    pub fn rule(selector: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::Rule(Rule::new(selector, nodes))
    }

    pub fn decl(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Node::Decl(Decl::new(prop, value))
    }

    pub fn at_rule(name: impl Into<String>, params: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::AtRule(AtRule::new(name, params, Some(nodes)))
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Node::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    /// 子节点
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Rule(rule) => &rule.nodes,
            Node::AtRule(at) => at.nodes.as_deref().unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Rule(rule) => Some(&mut rule.nodes),
            Node::AtRule(at) => at.nodes.as_mut(),
            _ => None,
        }
    }
}

/// 遍历所有规则（`@keyframes` 内部除外）
pub fn walk_rules<'a>(nodes: &'a [Node], f: &mut dyn FnMut(&'a Rule)) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                f(rule);
                walk_rules(&rule.nodes, f);
            }
            Node::AtRule(at) if !at.is_keyframes() => {
                if let Some(children) = &at.nodes {
                    walk_rules(children, f);
                }
            }
            _ => {}
        }
    }
}

/// 可变遍历所有规则（`@keyframes` 内部除外）
pub fn walk_rules_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Rule)) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                f(rule);
                walk_rules_mut(&mut rule.nodes, f);
            }
            Node::AtRule(at) if !at.is_keyframes() => {
                if let Some(children) = &mut at.nodes {
                    walk_rules_mut(children, f);
                }
            }
            _ => {}
        }
    }
}

/// 可变遍历规则内的声明（`@keyframes` 内部除外）
pub fn walk_decls_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Decl)) {
    for node in nodes {
        match node {
            Node::Decl(decl) => f(decl),
            Node::Rule(rule) => walk_decls_mut(&mut rule.nodes, f),
            Node::AtRule(at) if !at.is_keyframes() => {
                if let Some(children) = &mut at.nodes {
                    walk_decls_mut(children, f);
                }
            }
            _ => {}
        }
    }
}

/// 按谓词保留规则；返回 `Err` 时立即中止
///
/// 被清空的 at-rule 一并移除。
pub fn retain_rules<E>(
    nodes: &mut Vec<Node>,
    f: &mut dyn FnMut(&mut Rule) -> Result<bool, E>,
) -> Result<(), E> {
    let mut kept = Vec::with_capacity(nodes.len());
    for mut node in std::mem::take(nodes) {
        let keep = match &mut node {
            Node::Rule(rule) => {
                if f(rule)? {
                    retain_rules(&mut rule.nodes, f)?;
                    true
                } else {
                    false
                }
            }
            Node::AtRule(at) if !at.is_keyframes() => match &mut at.nodes {
                Some(children) if !children.is_empty() => {
                    retain_rules(children, f)?;
                    !children.is_empty()
                }
                _ => true,
            },
            _ => true,
        };
        if keep {
            kept.push(node);
        }
    }
    *nodes = kept;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Node> {
        vec![
            Node::rule(".a", vec![Node::decl("color", "red")]),
            Node::at_rule(
                "media",
                "(min-width: 640px)",
                vec![Node::rule(".b", vec![Node::decl("color", "blue")])],
            ),
            Node::at_rule(
                "keyframes",
                "spin",
                vec![Node::rule("to", vec![Node::decl("transform", "rotate(360deg)")])],
            ),
        ]
    }

    #[test]
    fn test_walk_rules_skips_keyframes() {
        let nodes = sample();
        let mut seen = Vec::new();
        walk_rules(&nodes, &mut |rule| seen.push(rule.selector.clone()));
        assert_eq!(seen, vec![".a", ".b"]);
    }

    #[test]
    fn test_walk_decls_mut() {
        let mut nodes = sample();
        walk_decls_mut(&mut nodes, &mut |decl| decl.important = true);
        let Node::AtRule(keyframes) = &nodes[2] else { panic!("expected at-rule") };
        let Node::Rule(to) = &keyframes.nodes.as_ref().unwrap()[0] else { panic!("expected rule") };
        let Node::Decl(decl) = &to.nodes[0] else { panic!("expected decl") };
        assert!(!decl.important);
    }

    #[test]
    fn test_retain_rules_drops_empty_at_rules() {
        let mut nodes = sample();
        retain_rules::<()>(&mut nodes, &mut |rule| Ok(rule.selector != ".b")).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(&nodes[1], Node::AtRule(at) if at.name == "keyframes"));
    }
}
