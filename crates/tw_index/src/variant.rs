//! Variant functions and the API they run against.
//!
//! A variant is stored as one or more [`VariantFn`]s. Each one receives a
//! [`VariantApi`] holding a private copy of the rule being rewritten and
//! records its effect either declaratively (`format("&:hover")`,
//! `wrap(@media ...)`) or by editing the copy directly. Direct edits are
//! diffed afterwards and turned back into a format string so everything
//! downstream deals with one representation.

use crate::error::Result;
use crosswind_css::{parse_selector_list, split_at_rule, walk_rules, walk_rules_mut, AtRule, Component, Node};
use crosswind_parse::split_at_top_level;
use std::sync::Arc;

pub type VariantFn = Arc<dyn Fn(&mut VariantApi) -> Result<VariantOutput> + Send + Sync>;

/// 变体函数的返回值
pub enum VariantOutput {
    /// 通过 `format` / `wrap` / 直接修改容器完成
    Done,
    /// 丢弃该规则
    Drop,
    /// 单个格式字符串
    Format(String),
    /// 多个格式字符串，每个都会生成一条并行规则
    Formats(Vec<String>),
}

/// 变体参数：`group-[.x]/name` → `value = ".x"`, `modifier = "name"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantArgs {
    /// `None` 表示没有给出值
    pub value: Option<String>,
    pub modifier: Option<String>,
}

/// 已收集的选择器格式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectedFormat {
    pub format: String,
    pub respect_prefix: bool,
}

/// 变体函数可用的操作
pub struct VariantApi {
    container: Vec<Node>,
    formats: Vec<String>,
    backup: Option<Vec<String>>,
    warnings: Vec<(String, Vec<String>)>,
    pub args: VariantArgs,
    pub separator: String,
}

impl VariantApi {
    pub fn new(container: Vec<Node>, args: VariantArgs, separator: impl Into<String>) -> Self {
        Self {
            container,
            formats: Vec::new(),
            backup: None,
            warnings: Vec::new(),
            args,
            separator: separator.into(),
        }
    }

    /// 直接修改规则（旧式写法）
    pub fn container_mut(&mut self) -> &mut Vec<Node> {
        self.prepare_backup();
        &mut self.container
    }

    pub fn container(&self) -> &[Node] {
        &self.container
    }

    /// 改写每条顶层规则的每个选择器；回调参数为 `(selector, class_name)`
    pub fn modify_selectors(&mut self, mut f: impl FnMut(&str, &str) -> String) {
        self.prepare_backup();
        for node in &mut self.container {
            let Node::Rule(rule) = node else { continue };
            let rewritten: Vec<String> = split_at_top_level(&rule.selector, ",")
                .into_iter()
                .map(|selector| {
                    let selector = selector.trim();
                    f(selector, &class_name_of(selector))
                })
                .collect();
            rule.selector = rewritten.join(", ");
        }
    }

    /// 用 at-rule 包裹容器内容
    pub fn wrap(&mut self, mut wrapper: AtRule) {
        wrapper.nodes = Some(std::mem::take(&mut self.container));
        self.container.push(Node::AtRule(wrapper));
    }

    pub fn format(&mut self, format: impl Into<String>) {
        self.formats.push(format.into());
    }

    /// 记录一条诊断，由调用方汇总
    pub fn warn(&mut self, key: impl Into<String>, messages: Vec<String>) {
        self.warnings.push((key.into(), messages));
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<(String, Vec<String>)> {
        std::mem::take(&mut self.warnings)
    }

    fn prepare_backup(&mut self) {
        if self.backup.is_some() {
            return;
        }
        let mut selectors = Vec::new();
        walk_rules(&self.container, &mut |rule| selectors.push(rule.selector.clone()));
        self.backup = Some(selectors);
    }

    /// 取出结果：容器、显式格式，以及从直接修改中还原出的格式
    ///
    /// `rebuild` 把原始选择器改写为插件作者会拼出的 `variant:class` 形式。
    pub(crate) fn finish(mut self, rebuild: &dyn Fn(&str) -> Option<String>) -> (Vec<Node>, Vec<String>) {
        let Some(originals) = self.backup.take() else {
            return (self.container, self.formats);
        };

        let mut formats = self.formats;
        let mut index = 0;
        walk_rules_mut(&mut self.container, &mut |rule| {
            let Some(before) = originals.get(index) else { return };
            index += 1;
            if *before == rule.selector {
                return;
            }
            if let Some(rebuilt) = rebuild(before) {
                formats.push(rule.selector.replace(&rebuilt, "&"));
            }
            rule.selector = before.clone();
        });
        (self.container, formats)
    }
}

/// 选择器中第一个复合选择器链的最后一个类名
fn class_name_of(selector: &str) -> String {
    parse_selector_list(selector)
        .ok()
        .and_then(|list| {
            list.selectors.into_iter().next().and_then(|first| {
                first.nodes.into_iter().rev().find_map(|node| match node {
                    Component::Class(name) => Some(name),
                    _ => None,
                })
            })
        })
        .unwrap_or_default()
}

/// 格式字符串是否合法：at-rule，或包含 `&`
pub fn is_valid_variant_format(format: &str) -> bool {
    format.starts_with('@') || format.contains('&')
}

/// 拆分格式字符串：`@media (x) { &:hover }` → `["@media (x)", "&:hover"]`
pub fn parse_variant_format(input: &str) -> Vec<String> {
    let input = collapse_whitespace(input);
    let mut parts = Vec::new();
    let mut current = String::new();

    for c in input.chars() {
        match c {
            '{' | '}' => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 把格式字符串编译为变体函数
///
/// 各部分从内到外应用：选择器部分记为 `format`，at-rule 部分记为 `wrap`。
pub fn parse_variant(format: &str) -> VariantFn {
    enum Step {
        Format(String),
        Wrap(String, String),
    }

    let steps: Vec<Step> = parse_variant_format(format)
        .into_iter()
        .rev()
        .map(|part| match part.strip_prefix('@') {
            Some(at) => {
                let (name, params) = split_at_rule(at);
                Step::Wrap(name, params)
            }
            None => Step::Format(part),
        })
        .collect();

    Arc::new(move |api: &mut VariantApi| {
        for step in &steps {
            match step {
                Step::Format(format) => api.format(format.clone()),
                Step::Wrap(name, params) => api.wrap(AtRule::new(name.clone(), params.clone(), None)),
            }
        }
        Ok(VariantOutput::Done)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswind_css::emit_css;
    use pretty_assertions::assert_eq;

    fn rule() -> Vec<Node> {
        vec![Node::rule(".flex", vec![Node::decl("display", "flex")])]
    }

    fn run(f: &VariantFn) -> (Vec<Node>, Vec<String>) {
        let mut api = VariantApi::new(rule(), VariantArgs::default(), ":");
        assert!(matches!(f(&mut api), Ok(VariantOutput::Done)));
        api.finish(&|_| None)
    }

    #[test]
    fn test_parse_variant_format() {
        assert_eq!(parse_variant_format("&:hover"), vec!["&:hover"]);
        assert_eq!(
            parse_variant_format("@supports (display: grid) {\n  @media print { &:hover }\n}"),
            vec!["@supports (display: grid)", "@media print", "&:hover"]
        );
    }

    #[test]
    fn test_valid_format() {
        assert!(is_valid_variant_format("&:hover"));
        assert!(is_valid_variant_format("@media print"));
        assert!(!is_valid_variant_format(":hover"));
    }

    #[test]
    fn test_parse_variant_wraps_outermost_last() {
        let f = parse_variant("@supports (display: grid) { @media print { &:hover } }");
        let (container, formats) = run(&f);
        assert_eq!(formats, vec!["&:hover"]);
        assert_eq!(
            emit_css(&container),
            "@supports (display: grid) {\n  @media print {\n    .flex {\n      display: flex;\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn test_modify_selectors_is_reverse_engineered() {
        let mut api = VariantApi::new(rule(), VariantArgs::default(), ":");
        api.modify_selectors(|selector, class| {
            assert_eq!(class, "flex");
            format!(".foo {}", selector.replace(".flex", r".foo\:flex"))
        });
        let (container, formats) = api.finish(&|before| Some(before.replace(".flex", r".foo\:flex")));
        assert_eq!(formats, vec![".foo &"]);
        assert_eq!(container[0].as_rule().unwrap().selector, ".flex");
    }

    #[test]
    fn test_untouched_container_adds_no_format() {
        let mut api = VariantApi::new(rule(), VariantArgs::default(), ":");
        let _ = api.container_mut();
        let (_, formats) = api.finish(&|before| Some(before.to_string()));
        assert!(formats.is_empty());
    }
}
