//! Candidate resolution.
//!
//! [`Context::resolve_matches`] turns one candidate string into zero or more
//! [`Match`]es. The base utility is looked up as an exact identifier, then
//! as an arbitrary property `[prop:value]`, then as a negative value, and
//! finally through every `(prefix, modifier)` split of the candidate. The
//! resulting rules get the class prefix, the `!` marker and the variant
//! chain applied, right to left, before the collected formats are folded
//! into the final selector.

use crate::bits::Bitfield;
use crate::context::Context;
use crate::error::Result;
use crate::format::{finalize_selector, format_variant_selector};
use crate::offsets::{Offsets, RuleOffset, SortArgs, SortOption};
use crate::plugin::{CandidateRule, RuleTemplate, UtilityExtras, UtilityFn};
use crate::value::{coerce_value, matching_types, DataType, UtilityOptions};
use crate::variant::{is_valid_variant_format, parse_variant, CollectedFormat, VariantApi, VariantArgs, VariantFn, VariantOutput};
use crosswind_core::Layer;
use crosswind_css::{
    eliminate_irrelevant, escape_class_name, is_parsable_declaration, parse_selector_list, prefix_selector,
    retain_rules, rewrite_class_names, walk_decls_mut, walk_rules_mut, ClassScope, Node, Styles,
};
use crosswind_parse::{
    candidate_permutations, expand_variant_group, is_arbitrary_value, is_valid_arbitrary_value, normalize,
    parse_candidate, split_at_top_level,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

static ARBITRARY_PROPERTY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([a-zA-Z0-9-_]+):(\S+)\]$").unwrap());
static PROPERTY_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_-]").unwrap());
static VARIANT_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)(-?)\[(.*)\]").unwrap());

/// 一条候选类规则
#[derive(Clone)]
pub struct Match {
    pub offset: RuleOffset,
    pub options: Arc<UtilityOptions>,
    pub rule: Node,
    /// 变体收集到的选择器格式（从内到外）
    pub formats: Vec<CollectedFormat>,
    pub important: bool,
}

impl Match {
    pub(crate) fn new(offset: RuleOffset, options: Arc<UtilityOptions>, rule: Node) -> Self {
        Self {
            offset,
            options,
            rule,
            formats: Vec::new(),
            important: false,
        }
    }
}

/// 同一个插件产出的规则，以及修饰符能匹配的类型
struct PluginMatches {
    rules: Vec<Match>,
    types: Vec<DataType>,
}

impl PluginMatches {
    fn accepts_any(&self) -> bool {
        self.rules.iter().any(|m| m.options.has_type(DataType::Any))
    }
}

impl Context {
    /// 解析一个候选类
    ///
    /// 无法识别时返回空列表；只有插件回调的错误会以 `Err` 返回。
    pub(crate) fn resolve_matches(&mut self, candidate: &str) -> Result<Vec<Match>> {
        self.resolve_with_original(candidate, candidate)
    }

    fn resolve_with_original(&mut self, candidate: &str, original: &str) -> Result<Vec<Match>> {
        let separator = self.config.separator.clone();
        let parsed = parse_candidate(candidate, &separator);
        let mut out = Vec::new();

        if self.config.features.variant_grouping {
            if let Some(expanded) = expand_variant_group(&parsed, &separator) {
                for part in expanded {
                    out.extend(self.resolve_with_original(&part, original)?);
                }
                return Ok(out);
            }
        }

        let class_candidate = parsed.base.as_str();
        let literal_base = split_at_top_level(candidate, &separator)
            .last()
            .map(|segment| segment.to_string())
            .unwrap_or_default();

        for (rules, modifier) in self.matched_plugins(class_candidate) {
            let mut matches = self.materialize(candidate, &rules, &modifier)?;
            matches = self.apply_prefix(matches, class_candidate);
            if parsed.important {
                matches = apply_important(matches, class_candidate, &literal_base);
            }
            for variant in parsed.variants_innermost_first() {
                if matches.is_empty() {
                    break;
                }
                matches = self.apply_variant(variant, matches)?;
            }
            out.extend(
                matches
                    .into_iter()
                    .filter_map(|m| self.apply_final_format(m, original, &literal_base)),
            );
        }

        Ok(out)
    }

    /// 候选规则组和各自的修饰符，按尝试顺序排列
    fn matched_plugins(&mut self, class_candidate: &str) -> Vec<(Vec<CandidateRule>, String)> {
        let mut found = Vec::new();

        if let Some(rules) = self.registry.candidate_rules.get(class_candidate) {
            found.push((rules.clone(), "DEFAULT".to_string()));
        }
        if let Some(rule) = self.arbitrary_property(class_candidate) {
            found.push((vec![rule], "DEFAULT".to_string()));
        }

        let prefix = self.config.prefix.as_str();
        let has_prefix = class_candidate.starts_with(prefix) || class_candidate.starts_with(&format!("-{prefix}"));
        let negative = has_prefix && class_candidate.as_bytes().get(prefix.len()) == Some(&b'-');
        let positive = if negative {
            format!("{prefix}{}", &class_candidate[prefix.len() + 1..])
        } else {
            class_candidate.to_string()
        };

        if negative {
            if let Some(rules) = self.registry.candidate_rules.get(&positive) {
                found.push((rules.clone(), "-DEFAULT".to_string()));
            }
        }

        for (identifier, modifier) in candidate_permutations(&positive) {
            if let Some(rules) = self.registry.candidate_rules.get(identifier) {
                let modifier = if negative {
                    format!("-{modifier}")
                } else {
                    modifier.to_string()
                };
                found.push((rules.clone(), modifier));
            }
        }

        found
    }

    /// `[mask-type:luminance]` 这类一次性的工具类
    fn arbitrary_property(&self, class_candidate: &str) -> Option<CandidateRule> {
        let caps = ARBITRARY_PROPERTY.captures(class_candidate)?;
        let property = caps.get(1)?.as_str();
        let value = caps.get(2)?.as_str();

        if !PROPERTY_NAME.is_match(property) || !is_valid_arbitrary_value(value) {
            return None;
        }
        let normalized = normalize(value, Some(property));
        if !is_parsable_declaration(property, &normalized) {
            return None;
        }

        let selector = format!(".{}", escape_class_name(class_candidate));
        let rule = Styles::new().decl(property, normalized).into_rules(&selector).into_iter().next()?;
        Some(CandidateRule {
            offset: self.registry.offsets.arbitrary_property(),
            options: Arc::new(UtilityOptions::new().respect_prefix(false)),
            template: RuleTemplate::Static(rule),
        })
    }

    /// 调用插件函数或复制静态模板，并处理任意值的歧义
    fn materialize(&mut self, candidate: &str, rules: &[CandidateRule], modifier: &str) -> Result<Vec<Match>> {
        let is_only_plugin = rules.len() == 1;
        let mut groups = Vec::new();

        for rule in rules {
            let nodes = match &rule.template {
                RuleTemplate::Dynamic { identifier, func } => {
                    self.run_utility(identifier, func, &rule.options, modifier, is_only_plugin)?
                }
                RuleTemplate::Static(node) if modifier == "DEFAULT" || modifier == "-DEFAULT" => vec![node.clone()],
                RuleTemplate::Static(_) => Vec::new(),
            };
            if nodes.is_empty() {
                continue;
            }

            let types = matching_types(modifier, &rule.options, &self.opacity)
                .into_iter()
                .map(|coerced| coerced.ty)
                .collect();
            groups.push(PluginMatches {
                rules: nodes
                    .into_iter()
                    .map(|node| Match::new(rule.offset.clone(), rule.options.clone(), node))
                    .collect(),
                types,
            });
        }

        if is_arbitrary_value(modifier) {
            if groups.len() > 1 {
                let (with_any, without_any): (Vec<usize>, Vec<usize>) =
                    (0..groups.len()).partition(|&i| groups[i].accepts_any());
                let fallback = find_fallback(&groups, &without_any).or_else(|| find_fallback(&groups, &with_any));
                match fallback {
                    Some(index) => groups = vec![groups.swap_remove(index)],
                    None => {
                        self.warn_ambiguous(candidate, &groups);
                        return Ok(Vec::new());
                    }
                }
            }
            for group in &mut groups {
                group.rules.retain(|m| is_parsable_node(&m.rule));
            }
        }

        Ok(groups.into_iter().flat_map(|group| group.rules).collect())
    }

    /// 动态工具类：强制转换修饰符，再调用插件函数
    fn run_utility(
        &mut self,
        identifier: &str,
        func: &UtilityFn,
        options: &UtilityOptions,
        modifier: &str,
        is_only_plugin: bool,
    ) -> Result<Vec<Node>> {
        let Some(coerced) = coerce_value(modifier, options, &self.opacity) else {
            return Ok(Vec::new());
        };

        if !options.has_type(coerced.ty) {
            if !is_only_plugin {
                return Ok(Vec::new());
            }
            let hint = format!("{}:", coerced.ty.as_str());
            self.diagnostics.warn(
                format!("unnecessary-typehint-{identifier}-{modifier}"),
                vec![
                    format!("Unnecessary typehint `{}` in `{identifier}-{modifier}`.", coerced.ty.as_str()),
                    format!("You can safely update it to `{identifier}-{}`.", modifier.replacen(&hint, "", 1)),
                ],
            );
        }

        if let Value::String(value) = &coerced.value {
            if !is_valid_arbitrary_value(value) {
                return Ok(Vec::new());
            }
        }

        let extras = UtilityExtras {
            modifier: coerced.modifier,
        };
        let styles = func(&coerced.value, &extras)?;
        if styles.is_empty() {
            return Ok(Vec::new());
        }

        let selector = format!(".{}", escape_class_name(&format_class(identifier, modifier)));
        Ok(styles.into_rules(&selector))
    }

    fn warn_ambiguous(&mut self, candidate: &str, groups: &[PluginMatches]) {
        let mut messages = vec![format!(
            "The class `{candidate}` is ambiguous and matches multiple utilities."
        )];

        for (index, group) in groups.iter().enumerate() {
            let unique = group.types.iter().find(|ty| {
                groups
                    .iter()
                    .enumerate()
                    .all(|(other, g)| other == index || !g.types.contains(ty))
            });
            let output = describe(&group.rules);
            match unique {
                Some(ty) => messages.push(format!(
                    "  Use `{}` for `{output}`",
                    candidate.replacen('[', &format!("[{}:", ty.as_str()), 1)
                )),
                None => messages.push(format!("  `{candidate}` would produce `{output}`")),
            }
        }

        messages.push(format!(
            "If this is content and not a class, replace it with `{}` to silence this warning.",
            candidate.replacen('[', "&lsqb;", 1).replacen(']', "&rsqb;", 1)
        ));
        self.diagnostics.warn(candidate, messages);
    }

    fn apply_prefix(&self, mut matches: Vec<Match>, class_candidate: &str) -> Vec<Match> {
        let prefix = self.config.prefix.as_str();
        if prefix.is_empty() {
            return matches;
        }

        let prepend_negative = class_candidate.starts_with('-');
        for m in matches.iter_mut().filter(|m| m.options.respect_prefix) {
            walk_rules_mut(std::slice::from_mut(&mut m.rule), &mut |rule| {
                if let Ok(mut list) = parse_selector_list(&rule.selector) {
                    prefix_selector(&mut list, prefix, prepend_negative);
                    rule.selector = list.to_string();
                }
            });
        }
        matches
    }

    /// 对一个变体应用所有已收集的规则
    pub(crate) fn apply_variant(&mut self, variant: &str, matches: Vec<Match>) -> Result<Vec<Match>> {
        let separator = self.config.separator.clone();
        let mut name = variant.to_string();
        let mut args = VariantArgs::default();

        let parts = split_at_top_level(variant, "/");
        if parts.len() > 1 && !self.registry.variant_map.contains_key(variant) {
            let (last, rest) = parts.split_last().map(|(l, r)| (l.to_string(), r.join("/"))).unwrap_or_default();
            name = rest;
            args.modifier = Some(last);
        }

        if name.ends_with(']') && !name.starts_with('[') {
            let captured = VARIANT_VALUE.captures(&name).map(|caps| {
                (
                    caps[1].to_string(),
                    caps[2].to_string(),
                    caps[3].to_string(),
                )
            });
            if let Some((lead, dash, value)) = captured {
                if (lead == "@" && dash == "-") || (lead != "@" && dash.is_empty()) {
                    return Ok(Vec::new());
                }
                name = name.replacen(&format!("{dash}[{value}]"), "", 1);
                args.value = Some(value);
            }
        }

        if is_arbitrary_value(&name)
            && !self.registry.variant_map.contains_key(&name)
            && !self.register_arbitrary_variant(&name)
        {
            return Ok(Vec::new());
        }

        let Some(fns) = self.registry.variant_map.get(&name).cloned() else {
            return Ok(Vec::new());
        };
        let options = self.registry.variant_options.get(&name).cloned().unwrap_or_default();
        let respect_prefix = !is_arbitrary_value(&name) && options.respect_prefix;
        let rebuild_prefix = format!("{name}{separator}");
        let sort = SortOption {
            id: options.id.clone().unwrap_or_else(|| name.clone()),
            variant: Bitfield::zero(),
            args: SortArgs {
                value: options.value.clone().or_else(|| args.value.clone()).unwrap_or_default(),
                modifier: args.modifier.clone(),
            },
            sort: options.sort.clone(),
        };

        let mut result = Vec::new();
        for m in matches {
            if m.offset.parent_layer == Layer::User {
                continue;
            }

            let mut queue: VecDeque<(RuleOffset, VariantFn, Vec<Node>)> = fns
                .iter()
                .map(|(offset, f)| (offset.clone(), f.clone(), vec![m.rule.clone()]))
                .collect();

            while let Some((variant_offset, f, container)) = queue.pop_front() {
                let mut api = VariantApi::new(container, args.clone(), separator.clone());
                let output = f(&mut api)?;
                for (key, messages) in api.take_warnings() {
                    self.diagnostics.warn(key, messages);
                }

                match output {
                    VariantOutput::Drop => continue,
                    VariantOutput::Formats(formats) => {
                        for (index, format) in formats.iter().enumerate() {
                            queue.push_back((
                                Offsets::apply_parallel_offset(&variant_offset, index),
                                parse_variant(format),
                                api.container().to_vec(),
                            ));
                        }
                        continue;
                    }
                    VariantOutput::Format(format) => {
                        if !is_valid_variant_format(&format) {
                            continue;
                        }
                        parse_variant(&format)(&mut api)?;
                    }
                    VariantOutput::Done => {}
                }

                let (container, formats) = api.finish(&|before| rebuild_selector(before, &rebuild_prefix));
                let Some(rule) = container.into_iter().next() else {
                    continue;
                };

                let mut collected = m.formats.clone();
                collected.extend(formats.into_iter().map(|format| CollectedFormat { format, respect_prefix }));
                result.push(Match {
                    offset: Offsets::apply_variant_offset(&m.offset, &variant_offset, Some(sort.clone())),
                    options: m.options.clone(),
                    rule,
                    formats: collected,
                    important: m.important,
                });
            }
        }

        Ok(result)
    }

    /// 注册 `[&:nth-child(3)]` 这类任意变体；不支持多个选择器
    fn register_arbitrary_variant(&mut self, name: &str) -> bool {
        let selector = normalize(&name[1..name.len() - 1], None);
        let selectors = split_at_top_level(&selector, ",");
        if selectors.len() != 1 || !selectors.iter().all(|s| is_valid_variant_format(s)) {
            return false;
        }

        let offsets = &mut self.registry.offsets;
        offsets.record_variant(name, 1);
        let Some(offset) = offsets.for_variant(name, 0) else {
            return false;
        };

        self.registry
            .variant_map
            .insert(name.to_string(), vec![(offset, parse_variant(selectors[0].trim()))]);
        true
    }

    /// 把收集到的格式合并进规则的选择器；选择器无效时丢弃整条规则
    ///
    /// 只包装 at-rule 的变体（`sm:`、`print:`）不产生格式，基础类仍要改写为完整的候选类。
    fn apply_final_format(&self, mut m: Match, original: &str, base: &str) -> Option<Match> {
        if m.formats.is_empty() && original == base {
            return Some(m);
        }

        let format = format_variant_selector(&m.formats, original, &self.config.prefix).ok()?;
        let mut container = vec![m.rule];
        retain_rules(&mut container, &mut |rule| {
            match finalize_selector(&rule.selector, &format, base)? {
                Some(selector) => {
                    rule.selector = selector;
                    Ok::<_, crosswind_css::ParseError>(true)
                }
                None => Ok(false),
            }
        })
        .ok()?;

        m.rule = container.into_iter().next()?;
        Some(m)
    }
}

/// 所有规则都标为 `!important`，基础类名改为候选类的原样写法（`!flex`）
fn apply_important(matches: Vec<Match>, class_candidate: &str, literal_base: &str) -> Vec<Match> {
    matches
        .into_iter()
        .map(|mut m| {
            walk_rules_mut(std::slice::from_mut(&mut m.rule), &mut |rule| {
                if let Ok(mut list) = parse_selector_list(&rule.selector) {
                    let original = list.clone();
                    if !eliminate_irrelevant(&mut list, class_candidate) {
                        list = original;
                    }
                    rewrite_class_names(&mut list, ClassScope::All, &mut |name| {
                        if name == class_candidate {
                            literal_base.to_string()
                        } else {
                            name.to_string()
                        }
                    });
                    rule.selector = list.to_string();
                }
                walk_decls_mut(&mut rule.nodes, &mut |decl| decl.important = true);
            });
            m.important = true;
            m
        })
        .collect()
}

/// 没有 `any` 类型的组里优先；只有一组时直接选中
fn find_fallback(groups: &[PluginMatches], candidates: &[usize]) -> Option<usize> {
    if candidates.len() == 1 {
        return candidates.first().copied();
    }
    candidates.iter().copied().find(|&index| {
        let group = &groups[index];
        group.rules.iter().any(|m| {
            is_parsable_node(&m.rule)
                && m
                    .options
                    .types
                    .iter()
                    .any(|spec| spec.prefer_on_conflict && group.types.contains(&spec.ty))
        })
    })
}

fn is_parsable_node(node: &Node) -> bool {
    match node {
        Node::Decl(decl) => is_parsable_declaration(&decl.prop, &decl.value),
        _ => node.children().iter().all(is_parsable_node),
    }
}

fn describe(rules: &[Match]) -> String {
    fn collect(node: &Node, out: &mut Vec<String>) {
        match node {
            Node::Decl(decl) => out.push(format!("{}: {};", decl.prop, decl.value)),
            _ => node.children().iter().for_each(|child| collect(child, out)),
        }
    }

    let mut decls = Vec::new();
    for m in rules {
        collect(&m.rule, &mut decls);
    }
    decls.join(" ")
}

/// 插件作者会拼出的选择器：每个类名前加 `variant:`
fn rebuild_selector(selector: &str, prefix: &str) -> Option<String> {
    let mut list = parse_selector_list(selector).ok()?;
    rewrite_class_names(&mut list, ClassScope::All, &mut |name| format!("{prefix}{name}"));
    Some(list.to_string())
}

/// 标识符 + 修饰符 → 类名
///
/// - `DEFAULT` → `m`
/// - `-` / `-DEFAULT` → `-m`
/// - `-4` → `-m-4`
/// - `/50` → `m/50`
/// - 其余 → `m-4`
pub(crate) fn format_class(identifier: &str, modifier: &str) -> String {
    match modifier {
        "DEFAULT" => identifier.to_string(),
        "-" | "-DEFAULT" => format!("-{identifier}"),
        _ if modifier.starts_with('-') => format!("-{identifier}{modifier}"),
        _ if modifier.starts_with('/') => format!("{identifier}{modifier}"),
        _ => format!("{identifier}-{modifier}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{plugin, utility};
    use crate::value::DataType;
    use crosswind_core::Config;
    use crosswind_css::emit_css;
    use pretty_assertions::assert_eq;

    fn context() -> Context {
        Context::new(Config::default()).unwrap()
    }

    fn css(matches: &[Match]) -> String {
        let nodes: Vec<Node> = matches.iter().map(|m| m.rule.clone()).collect();
        emit_css(&nodes)
    }

    fn selectors(matches: &[Match]) -> Vec<String> {
        let mut out = Vec::new();
        for m in matches {
            crosswind_css::walk_rules(std::slice::from_ref(&m.rule), &mut |rule| out.push(rule.selector.clone()));
        }
        out
    }

    #[test]
    fn test_format_class() {
        assert_eq!(format_class("m", "DEFAULT"), "m");
        assert_eq!(format_class("m", "-DEFAULT"), "-m");
        assert_eq!(format_class("m", "-4"), "-m-4");
        assert_eq!(format_class("w", "/2"), "w/2");
        assert_eq!(format_class("bg", "red-500"), "bg-red-500");
    }

    #[test]
    fn test_static_utility() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("flex").unwrap();
        assert_eq!(css(&matches), ".flex {\n  display: flex;\n}\n");
    }

    #[test]
    fn test_unknown_candidate() {
        let mut ctx = context();
        assert!(ctx.resolve_matches("not-a-utility").unwrap().is_empty());
        assert!(ctx.resolve_matches("unknown:flex").unwrap().is_empty());
    }

    #[test]
    fn test_negative_value() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("-m-4").unwrap();
        assert_eq!(css(&matches), ".-m-4 {\n  margin: -1rem;\n}\n");
    }

    #[test]
    fn test_variants_apply_right_to_left() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("focus:hover:text-center").unwrap();
        assert_eq!(selectors(&matches), vec![r".focus\:hover\:text-center:hover:focus"]);
    }

    #[test]
    fn test_group_variants_share_one_ancestor() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("group-focus:group-hover:text-center").unwrap();
        assert_eq!(
            selectors(&matches),
            vec![r".group:focus:hover .group-focus\:group-hover\:text-center"]
        );
    }

    #[test]
    fn test_pseudo_element_stays_last() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("hover:placeholder-red-500").unwrap();
        assert_eq!(
            selectors(&matches),
            vec![r".hover\:placeholder-red-500:hover::placeholder"]
        );
    }

    #[test]
    fn test_important_marker() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("!flex").unwrap();
        assert_eq!(css(&matches), ".\\!flex {\n  display: flex !important;\n}\n");

        let matches = ctx.resolve_matches("flex!").unwrap();
        assert_eq!(css(&matches), ".flex\\! {\n  display: flex !important;\n}\n");
    }

    #[test]
    fn test_arbitrary_property() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("[mask-type:luminance]").unwrap();
        assert_eq!(
            css(&matches),
            ".\\[mask-type\\:luminance\\] {\n  mask-type: luminance;\n}\n"
        );
        assert_eq!(matches[0].offset.arbitrary, 1);

        assert!(!ctx.resolve_matches("[background:url(http://x)]").unwrap().is_empty());
        assert!(ctx.resolve_matches("[https://example.com]").unwrap().is_empty());
    }

    #[test]
    fn test_arbitrary_variant() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("[&:nth-child(3)]:underline").unwrap();
        assert_eq!(selectors(&matches), vec![r".\[\&\:nth-child\(3\)\]\:underline:nth-child(3)"]);
        assert!(ctx.resolve_matches("[&:hover,&:focus]:underline").unwrap().is_empty());
    }

    #[test]
    fn test_rejected_arbitrary_variant_reserves_no_bit() {
        let mut ctx = context();
        assert!(ctx.resolve_matches("[&:hover,&:focus]:underline").unwrap().is_empty());
        assert!(ctx.resolve_matches("[hover]:underline").unwrap().is_empty());
        assert!(!ctx.registry.offsets.has_variant("[&:hover,&:focus]"));
        assert!(!ctx.registry.offsets.has_variant("[hover]"));

        assert!(!ctx.resolve_matches("[&_p]:underline").unwrap().is_empty());
        assert!(ctx.registry.offsets.has_variant("[&_p]"));
    }

    #[test]
    fn test_screen_variant_wraps_media() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("sm:flex").unwrap();
        assert_eq!(
            css(&matches),
            "@media (min-width: 640px) {\n  .sm\\:flex {\n    display: flex;\n  }\n}\n"
        );
        assert_eq!(matches[0].offset.layer, Layer::Variants);
        assert_eq!(matches[0].offset.parent_layer, Layer::Utilities);
    }

    #[test]
    fn test_at_rule_only_variants_rewrite_base_class() {
        let mut ctx = context();
        assert_eq!(
            css(&ctx.resolve_matches("print:flex").unwrap()),
            "@media print {\n  .print\\:flex {\n    display: flex;\n  }\n}\n"
        );
        assert_eq!(
            selectors(&ctx.resolve_matches("supports-[display:grid]:flex").unwrap()),
            vec![r".supports-\[display\:grid\]\:flex"]
        );
        assert_eq!(
            selectors(&ctx.resolve_matches("md:sm:flex").unwrap()),
            vec![r".md\:sm\:flex"]
        );
        assert_eq!(
            selectors(&ctx.resolve_matches("sm:hover:flex").unwrap()),
            vec![r".sm\:hover\:flex:hover"]
        );
    }

    #[test]
    fn test_color_opacity_modifier() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("bg-red-500/50").unwrap();
        assert_eq!(
            css(&matches),
            ".bg-red-500\\/50 {\n  background-color: rgb(239 68 68 / 0.5);\n}\n"
        );
    }

    #[test]
    fn test_prefix_with_negative() {
        let mut ctx = Context::new(Config::default().with_prefix("tw-")).unwrap();
        assert_eq!(selectors(&ctx.resolve_matches("tw-flex").unwrap()), vec![".tw-flex"]);
        assert_eq!(selectors(&ctx.resolve_matches("-tw-m-4").unwrap()), vec![".-tw-m-4"]);
        assert!(ctx.resolve_matches("flex").unwrap().is_empty());
    }

    #[test]
    fn test_ambiguous_arbitrary_value() {
        let conflicting = plugin("conflicting", |api| {
            let opts = || UtilityOptions::new().types([DataType::Length]);
            api.match_utilities(
                [("foo", utility(|value, _| Ok(Styles::new().decl("width", crate::plugin::css_value(value)))))],
                opts(),
            );
            api.match_utilities(
                [("foo", utility(|value, _| Ok(Styles::new().decl("height", crate::plugin::css_value(value)))))],
                opts(),
            );
            Ok(())
        });
        let mut ctx = Context::with_plugins(Config::default(), vec![conflicting]).unwrap();

        assert!(ctx.resolve_matches("foo-[10px]").unwrap().is_empty());
        let diagnostics = ctx.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        let text = diagnostics[0].messages.join("\n");
        assert!(text.contains("width: 10px;"));
        assert!(text.contains("height: 10px;"));
    }

    #[test]
    fn test_prefer_on_conflict_wins() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("text-[2em]").unwrap();
        assert_eq!(css(&matches), ".text-\\[2em\\] {\n  font-size: 2em;\n}\n");

        let matches = ctx.resolve_matches("text-[#123456]").unwrap();
        assert!(css(&matches).contains("color: rgb(18 52 86"));
        assert!(ctx.take_diagnostics().is_empty());
    }

    #[test]
    fn test_type_hint() {
        let mut ctx = context();
        let matches = ctx.resolve_matches("text-[length:var(--size)]").unwrap();
        assert_eq!(
            css(&matches),
            ".text-\\[length\\:var\\(--size\\)\\] {\n  font-size: var(--size);\n}\n"
        );
    }

    #[test]
    fn test_variant_grouping() {
        let mut config = Config::default();
        config.features.variant_grouping = true;
        let mut ctx = Context::new(config).unwrap();
        let matches = ctx.resolve_matches("hover:(flex,underline)").unwrap();
        assert_eq!(
            selectors(&matches),
            vec![
                r".hover\:\(flex\2c underline\):hover",
                r".hover\:\(flex\2c underline\):hover",
            ]
        );
    }

    #[test]
    fn test_plugin_error_propagates() {
        let failing = plugin("failing", |api| {
            api.match_utilities(
                [("boom", utility(|_, _| Err(crate::Error::plugin("failing", "nope"))))],
                UtilityOptions::new(),
            );
            Ok(())
        });
        let mut ctx = Context::with_plugins(Config::default(), vec![failing]).unwrap();
        assert!(ctx.resolve_matches("boom-[1px]").is_err());
    }
}
