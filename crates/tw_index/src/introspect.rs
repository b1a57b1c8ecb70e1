//! Introspection for editor tooling and class sorters.

use crate::context::Context;
use crate::error::Result;
use crate::format::{format_variant_selector, unwrap_merge};
use crate::plugin::{css_value, ClassListEntry, VariantKind};
use crate::resolver::{format_class, Match};
use crate::value::{negate_value, DataType, Modifiers, UtilityOptions};
use crosswind_core::Layer;
use crosswind_css::{move_pseudo_elements, Component, Node};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

const PLACEHOLDER: &str = "__placeholder__";

/// 可生成的类名
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassListItem {
    pub name: String,
    /// 支持的修饰符（`bg-red-500/50` 中的 `50`）；只在需要元数据时填充
    pub modifiers: Vec<String>,
}

/// 已注册的变体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
    pub name: String,
    /// 是否接受任意值（`supports-[display:grid]`）
    pub is_arbitrary: bool,
    /// 静态值
    pub values: Vec<String>,
    /// 值与名字之间是否有 `-`；只有 `@` 没有
    pub has_dash: bool,
}

impl VariantInfo {
    /// 变体生成的选择器，`&` 代表工具类本身
    ///
    /// 只包装 at-rule 的变体写成 `@media (min-width: 640px){&}`。
    pub fn selectors(&self, ctx: &mut Context, value: Option<&str>, modifier: Option<&str>) -> Result<Vec<String>> {
        ctx.variant_selectors(self, value, modifier)
    }
}

impl Context {
    /// 所有可生成的类名，按注册顺序；负值类排在同一工具类的正值之后
    pub fn get_class_list(&self, include_metadata: bool) -> Vec<ClassListItem> {
        let opacities: Vec<String> = match self.config.theme("opacity") {
            Some(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };

        let mut out = Vec::new();
        for entry in &self.registry.class_list {
            match entry {
                ClassListEntry::Class(name) => out.push(ClassListItem {
                    name: name.clone(),
                    modifiers: Vec::new(),
                }),
                ClassListEntry::Dynamic(identifier, options) => {
                    let modifiers = if include_metadata {
                        modifiers_of(options, &opacities)
                    } else {
                        Vec::new()
                    };
                    let item = |name: String| ClassListItem {
                        name,
                        modifiers: modifiers.clone(),
                    };

                    let mut negatives = Vec::new();
                    for (key, value) in &options.values {
                        if value.is_null() {
                            continue;
                        }
                        out.push(item(format_class(identifier, key)));
                        if options.supports_negative_values && negate_value(&css_value(value)).is_some() {
                            negatives.push(item(format_class(identifier, &format!("-{key}"))));
                        }
                    }
                    out.extend(negatives);
                }
            }
        }
        out
    }

    /// 可以单独使用的变体；`match_variant` 的静态值只通过 `values` 列出
    pub fn get_variants(&self) -> Vec<VariantInfo> {
        self.registry
            .variant_options
            .iter()
            .filter(|(_, options)| options.kind != VariantKind::MatchValue)
            .map(|(name, options)| VariantInfo {
                name: name.clone(),
                is_arbitrary: options.kind == VariantKind::MatchDynamic,
                values: options.values.clone(),
                has_dash: name != "@",
            })
            .collect()
    }

    /// 外部排序工具用的排序键
    ///
    /// 未知类为 `None`；`group` / `peer` 本身不生成规则，占用最小的两个序号。
    pub fn get_class_order<S: AsRef<str>>(&mut self, classes: &[S]) -> Result<Vec<(String, Option<u64>)>> {
        let parasites = [format!("{}group", self.config.prefix), format!("{}peer", self.config.prefix)];

        let mut candidates: Vec<String> = classes.iter().map(|c| c.as_ref().to_string()).collect();
        candidates.sort();
        candidates.dedup();

        let entries = self
            .generate_rules(&candidates)?
            .into_iter()
            .map(|entry| (entry.offset, entry.candidate))
            .collect();

        let mut orders: IndexMap<String, u64> = IndexMap::new();
        let mut next = parasites.len() as u64;
        for (_, candidate) in self.registry.offsets.sort(entries) {
            orders.entry(candidate).or_insert_with(|| {
                next += 1;
                next - 1
            });
        }

        Ok(classes
            .iter()
            .map(|class| {
                let class = class.as_ref();
                let order = orders
                    .get(class)
                    .copied()
                    .or_else(|| parasites.iter().position(|p| p == class).map(|i| i as u64));
                (class.to_string(), order)
            })
            .collect())
    }

    fn variant_selectors(&mut self, info: &VariantInfo, value: Option<&str>, modifier: Option<&str>) -> Result<Vec<String>> {
        let joiner = if info.has_dash { "-" } else { "" };
        let mut variant = match value {
            None => info.name.clone(),
            Some(value) if info.values.iter().any(|v| v == value) => format!("{}{joiner}{value}", info.name),
            Some(value) => format!("{}{joiner}[{value}]", info.name),
        };
        if let Some(modifier) = modifier {
            variant.push('/');
            variant.push_str(modifier);
        }

        let placeholder = Match::new(
            self.registry.offsets.create(Layer::Utilities),
            Arc::new(UtilityOptions::default()),
            Node::rule(format!(".{PLACEHOLDER}"), Vec::new()),
        );
        let matches = self.apply_variant(&variant, vec![placeholder])?;

        let prefix = self.config.prefix.clone();
        Ok(matches.iter().filter_map(|m| describe_variant(m, &prefix)).collect())
    }
}

fn modifiers_of(options: &UtilityOptions, opacities: &[String]) -> Vec<String> {
    let mut modifiers: Vec<String> = match &options.modifiers {
        Some(Modifiers::Map(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };
    if options.has_type(DataType::Color) {
        modifiers.extend(opacities.iter().cloned());
    }
    modifiers
}

fn describe_variant(m: &Match, prefix: &str) -> Option<String> {
    let mut list = format_variant_selector(&m.formats, PLACEHOLDER, prefix).ok()?;
    for selector in &mut list.selectors {
        unwrap_merge(selector);
        move_pseudo_elements(selector);
        selector.walk_mut(&mut |node| {
            if matches!(node, Component::Class(name) if name == PLACEHOLDER) {
                *node = Component::Nesting;
            }
        });
    }

    let mut wrappers = Vec::new();
    let mut node = &m.rule;
    while let Node::AtRule(at) = node {
        wrappers.push(format!("@{} {}", at.name, at.params));
        match at.nodes.as_deref() {
            Some([child, ..]) => node = child,
            _ => break,
        }
    }

    Some(
        wrappers
            .iter()
            .rev()
            .fold(list.to_string(), |inner, wrapper| format!("{wrapper}{{{inner}}}")),
    )
}
