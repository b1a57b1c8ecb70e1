//! Selector AST.
//!
//! Class names are stored unescaped; escaping happens only when printing.
//! Pseudo arguments are parsed as nested selector lists for the
//! selector-taking pseudos (`:is`, `:not`, `:where`, `:has`, `:merge`, ...)
//! and kept as raw text otherwise (`:nth-child(2n+1)`).

mod classes;
mod escape;
mod parser;
mod pseudo;

use std::fmt;

pub use classes::{
    eliminate_irrelevant, extract_class_names, prefix_selector, rewrite_class_names, ClassScope,
};
pub use escape::{escape_class_name, unescape};
pub use parser::{parse_selector, parse_selector_list};
pub use pseudo::{move_pseudo_elements, pseudo_properties, PseudoProperties};

/// 逗号分隔的选择器列表
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

/// 单个复合选择器链
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Selector {
    pub nodes: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    /// `.name`，未转义
    Class(String),
    /// `#id`，保留原文
    Id(String),
    /// `div` / `*`
    Tag(String),
    /// `[...]` 内部原文
    Attribute(String),
    /// `&`
    Nesting,
    Pseudo(Pseudo),
    Combinator(Combinator),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pseudo {
    /// 带冒号：`:hover`、`::before`
    pub name: String,
    pub args: Option<PseudoArgs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoArgs {
    Selectors(SelectorList),
    Raw(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

impl SelectorList {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Visits every component, descending into pseudo arguments.
    pub fn walk(&self, f: &mut dyn FnMut(&Component)) {
        for selector in &self.selectors {
            selector.walk(f);
        }
    }

    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Component)) {
        for selector in &mut self.selectors {
            selector.walk_mut(f);
        }
    }
}

impl Selector {
    pub fn new(nodes: Vec<Component>) -> Self {
        Self { nodes }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(vec![Component::Class(name.into())])
    }

    pub fn has_top_level_combinator(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node, Component::Combinator(_)))
    }

    pub fn walk(&self, f: &mut dyn FnMut(&Component)) {
        for node in &self.nodes {
            f(node);
            if let Component::Pseudo(Pseudo {
                args: Some(PseudoArgs::Selectors(list)),
                ..
            }) = node
            {
                list.walk(f);
            }
        }
    }

    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Component)) {
        for node in &mut self.nodes {
            f(node);
            if let Component::Pseudo(Pseudo {
                args: Some(PseudoArgs::Selectors(list)),
                ..
            }) = node
            {
                list.walk_mut(f);
            }
        }
    }

    /// 是否（含伪类参数内）包含 `&`
    pub fn contains_nesting(&self) -> bool {
        let mut found = false;
        self.walk(&mut |node| found |= matches!(node, Component::Nesting));
        found
    }

    /// 把所有 `&` 替换为 `replacement` 的节点（含伪类参数内）
    pub fn replace_nesting(&mut self, replacement: &[Component]) {
        let mut nodes = Vec::with_capacity(self.nodes.len() + replacement.len());
        for mut node in std::mem::take(&mut self.nodes) {
            match &mut node {
                Component::Nesting => {
                    nodes.extend(replacement.iter().cloned());
                    continue;
                }
                Component::Pseudo(Pseudo {
                    args: Some(PseudoArgs::Selectors(list)),
                    ..
                }) => {
                    for inner in &mut list.selectors {
                        inner.replace_nesting(replacement);
                    }
                }
                _ => {}
            }
            nodes.push(node);
        }
        self.nodes = nodes;
    }
}

impl Pseudo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    pub fn with_selectors(name: impl Into<String>, list: SelectorList) -> Self {
        Self {
            name: name.into(),
            args: Some(PseudoArgs::Selectors(list)),
        }
    }

    pub fn is_element(&self) -> bool {
        pseudo::is_pseudo_element(self)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                // 相对选择器：`:has(> img)`
                Component::Combinator(c) if i == 0 => match c {
                    Combinator::Descendant => {}
                    other => write!(f, "{} ", other.symbol())?,
                },
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Class(name) => write!(f, ".{}", escape_class_name(name)),
            Component::Id(id) => write!(f, "#{id}"),
            Component::Tag(tag) => f.write_str(tag),
            Component::Attribute(raw) => write!(f, "[{raw}]"),
            Component::Nesting => f.write_str("&"),
            Component::Pseudo(pseudo) => write!(f, "{pseudo}"),
            Component::Combinator(Combinator::Descendant) => f.write_str(" "),
            Component::Combinator(c) => write!(f, " {} ", c.symbol()),
        }
    }
}

impl fmt::Display for Pseudo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match &self.args {
            None => Ok(()),
            Some(PseudoArgs::Selectors(list)) => write!(f, "({list})"),
            Some(PseudoArgs::Raw(raw)) => write!(f, "({raw})"),
        }
    }
}

impl Combinator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => ">",
            Combinator::NextSibling => "+",
            Combinator::SubsequentSibling => "~",
        }
    }
}
