//! Rule generation and stylesheet assembly.
//!
//! Every resolved candidate is cached: unknown candidates in a "not a
//! class" set, known ones as their matches plus the rules they contributed.
//! All rules live in one deduplicated rule cache, which is sorted by offset
//! and split into layers only when new candidates were added since the last
//! assembly.

use crate::context::Context;
use crate::error::Result;
use crate::format::apply_important_selector;
use crate::offsets::{compare_offsets, RuleOffset};
use crate::plugin::ClassListEntry;
use crate::resolver::{format_class, Match};
use crate::value::DataType;
use crosswind_core::{Important, Layer};
use crosswind_css::{emit_css, parse_stylesheet, walk_decls_mut, walk_rules_mut, Node};
use crosswind_parse::{split_at_top_level, NOT_ON_DEMAND};
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

const CONTENT_PROBLEMS: &str = "content-problems";

/// 生成的一条规则
///
/// 相等性只看 `(offset, rule)`：不同候选类产生的相同规则只保留一份。
#[derive(Debug, Clone)]
pub struct RuleEntry {
    pub offset: RuleOffset,
    pub rule: Node,
    /// 首个产生该规则的候选类
    pub candidate: String,
    /// 在该候选类产生的规则中的位置
    pub position: usize,
}

impl PartialEq for RuleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.rule == other.rule
    }
}

impl Eq for RuleEntry {}

impl Hash for RuleEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
        self.rule.hash(state);
    }
}

/// 规则的全序：偏移量，其次候选类，最后是候选类内的位置
pub fn compare_entries(a: &RuleEntry, b: &RuleEntry) -> Ordering {
    compare_offsets(&a.offset, &b.offset)
        .then_with(|| a.candidate.cmp(&b.candidate))
        .then(a.position.cmp(&b.position))
}

/// 按层分组、排好序的规则
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub base: Vec<RuleEntry>,
    pub defaults: Vec<RuleEntry>,
    pub components: Vec<RuleEntry>,
    pub utilities: Vec<RuleEntry>,
    pub variants: Vec<RuleEntry>,
}

impl Stylesheet {
    /// 全部规则，按输出顺序
    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.base
            .iter()
            .chain(&self.defaults)
            .chain(&self.components)
            .chain(&self.utilities)
            .chain(&self.variants)
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.defaults.len() + self.components.len() + self.utilities.len() + self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 无占位符时直接输出全部规则
    pub fn to_css(&self) -> String {
        let nodes: Vec<Node> = self.iter().map(|entry| entry.rule.clone()).collect();
        emit_css(&nodes)
    }
}

/// 每个 [`Context`] 独占的生成缓存
#[derive(Default)]
pub(crate) struct Caches {
    pub class_cache: IndexMap<String, Vec<Match>>,
    pub not_class_cache: HashSet<String>,
    pub candidate_rule_cache: IndexMap<String, IndexSet<RuleEntry>>,
    pub rule_cache: IndexSet<RuleEntry>,
    /// 仅供 `@apply` 使用的匹配结果，不参与样式表
    pub apply_cache: IndexMap<String, Vec<Match>>,
    /// 组装时 `class_cache` 的大小，以及组装结果
    pub stylesheet: Option<(usize, Stylesheet)>,
}

/// 样式表中出现的 `@tailwind` 占位符
#[derive(Debug, Default, Clone, Copy)]
struct Placeholders {
    base: bool,
    components: bool,
    utilities: bool,
    variants: bool,
}

impl Placeholders {
    fn any(&self) -> bool {
        self.base || self.components || self.utilities || self.variants
    }

    fn collect(nodes: &[Node], found: &mut Placeholders) {
        for node in nodes {
            if let Some(layer) = placeholder_layer(node) {
                match layer {
                    Layer::Base => found.base = true,
                    Layer::Components => found.components = true,
                    Layer::Utilities => found.utilities = true,
                    Layer::Variants => found.variants = true,
                    _ => {}
                }
            }
            Self::collect(node.children(), found);
        }
    }
}

fn placeholder_layer(node: &Node) -> Option<Layer> {
    let Node::AtRule(at) = node else { return None };
    if at.name != "tailwind" {
        return None;
    }
    match at.params.trim() {
        "screens" => Some(Layer::Variants),
        params => Layer::from_placeholder(params),
    }
}

impl Context {
    /// 为一组候选类生成规则
    ///
    /// 候选类先排序（加上安全列表和无条件规则的标记），保证任意值的偏移量
    /// 分配与输入顺序无关。返回本次涉及的全部规则，未排序。
    pub fn generate<I, S>(&mut self, candidates: I) -> Result<Vec<RuleEntry>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sorted: Vec<String> = candidates.into_iter().map(|c| c.as_ref().to_string()).collect();
        sorted.extend(self.safelist.iter().cloned());
        sorted.push(NOT_ON_DEMAND.to_string());
        sorted.sort();
        sorted.dedup();

        let known = self.caches.class_cache.len();
        let rules = self.generate_rules(&sorted)?;
        tracing::debug!(
            candidates = sorted.len(),
            resolved = self.caches.class_cache.len() - known,
            rules = rules.len(),
            "generated rules"
        );
        Ok(rules)
    }

    pub(crate) fn generate_rules(&mut self, candidates: &[String]) -> Result<Vec<RuleEntry>> {
        let mut all = Vec::new();

        for candidate in candidates {
            if self.caches.not_class_cache.contains(candidate) {
                continue;
            }
            if let Some(rules) = self.caches.candidate_rule_cache.get(candidate) {
                all.extend(rules.iter().cloned());
                continue;
            }

            let matches = match self.caches.class_cache.get(candidate) {
                Some(matches) => matches.clone(),
                None => self.resolve_matches(candidate)?,
            };
            if matches.is_empty() {
                self.caches.not_class_cache.insert(candidate.clone());
                continue;
            }

            let mut rules = IndexSet::new();
            for (position, m) in matches.iter().enumerate() {
                let mut rule = m.rule.clone();
                if m.options.respect_important {
                    apply_important_strategy(&self.config.important, &mut rule);
                }
                let entry = RuleEntry {
                    offset: m.offset.clone(),
                    rule,
                    candidate: candidate.clone(),
                    position,
                };
                self.caches.rule_cache.insert(entry.clone());
                rules.insert(entry.clone());
                all.push(entry);
            }
            self.caches.class_cache.insert(candidate.clone(), matches);
            self.caches.candidate_rule_cache.insert(candidate.clone(), rules);
        }

        Ok(all)
    }

    /// 已生成规则的分层结果；只有新增候选类后才重新排序
    pub fn stylesheet(&mut self) -> &Stylesheet {
        let count = self.caches.class_cache.len();
        let cached = match self.caches.stylesheet.take() {
            Some((built, sheet)) if built == count => (built, sheet),
            _ => (count, self.build_stylesheet()),
        };
        &self.caches.stylesheet.insert(cached).1
    }

    fn build_stylesheet(&self) -> Stylesheet {
        let mut entries: Vec<RuleEntry> = self.caches.rule_cache.iter().cloned().collect();
        entries.sort_by(|a, b| a.candidate.cmp(&b.candidate).then(a.position.cmp(&b.position)));
        let sorted = self
            .registry
            .offsets
            .sort(entries.into_iter().map(|entry| (entry.offset.clone(), entry)).collect());

        let mut sheet = Stylesheet::default();
        for (_, entry) in sorted {
            match entry.offset.layer {
                Layer::Base => sheet.base.push(entry),
                Layer::Defaults => sheet.defaults.push(entry),
                Layer::Components => sheet.components.push(entry),
                Layer::Utilities | Layer::User => sheet.utilities.push(entry),
                Layer::Variants => sheet.variants.push(entry),
            }
        }

        tracing::debug!(rules = sheet.len(), "assembled stylesheet");
        sheet
    }

    /// 处理作者样式表：展开 `@tailwind` 占位符，再展开 `@apply`
    pub fn process_css<I, S>(&mut self, css: &str, candidates: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = parse_stylesheet(css)?;
        let local = self.local_apply_cache(&root);

        let mut found = Placeholders::default();
        Placeholders::collect(&root, &mut found);
        if found.any() {
            self.generate(candidates)?;
            let sheet = self.stylesheet().clone();
            self.splice_layers(&mut root, &sheet, found);
        }

        self.expand_apply(&mut root, &local)?;
        Ok(emit_css(&root))
    }

    fn splice_layers(&mut self, root: &mut Vec<Node>, sheet: &Stylesheet, found: Placeholders) {
        let nodes_of = |entries: &[RuleEntry]| entries.iter().map(|entry| entry.rule.clone()).collect::<Vec<_>>();

        let variants: Vec<&RuleEntry> = sheet
            .variants
            .iter()
            .filter(|entry| match entry.offset.parent_layer {
                Layer::Components => found.components,
                Layer::Utilities => found.utilities,
                _ => true,
            })
            .collect();

        let mut base = nodes_of(&sheet.base);
        base.extend(nodes_of(&sheet.defaults));
        let variant_nodes: Vec<Node> = variants.iter().map(|entry| entry.rule.clone()).collect();

        let mut content = IndexMap::new();
        content.insert(Layer::Base, base);
        content.insert(Layer::Components, nodes_of(&sheet.components));
        content.insert(Layer::Utilities, nodes_of(&sheet.utilities));
        content.insert(Layer::Variants, variant_nodes.clone());
        replace_placeholders(root, &mut content);

        if !found.variants && !variant_nodes.is_empty() {
            root.extend(variant_nodes);
        }

        let utility_variants = variants
            .iter()
            .any(|entry| entry.offset.parent_layer == Layer::Utilities);
        if found.utilities && sheet.utilities.is_empty() && !utility_variants {
            self.diagnostics.warn(
                CONTENT_PROBLEMS,
                vec![
                    "No utility classes were detected in your source files. If this is unexpected, \
                     double-check the `content` option in your Tailwind CSS configuration."
                        .to_string(),
                    "https://tailwindcss.com/docs/content-configuration".to_string(),
                ],
            );
        }
    }

    /// 展开安全列表中的模式；没有匹配任何类名的模式记一条诊断
    pub(crate) fn safelist_candidates(&mut self) -> Result<Vec<String>> {
        let mut out: Vec<String> = self
            .config
            .safelist
            .iter()
            .filter_map(|entry| match entry {
                crosswind_core::SafelistEntry::Class(class) => Some(class.clone()),
                crosswind_core::SafelistEntry::Pattern { .. } => None,
            })
            .collect();

        let patterns = self.config.safelist_patterns()?;
        if patterns.is_empty() {
            return Ok(out);
        }

        let check_important = patterns.iter().any(|(regex, _)| regex.as_str().contains('!'));
        let mut counts = vec![0usize; patterns.len()];
        for class in self.safelist_universe(check_important) {
            for (index, (regex, variants)) in patterns.iter().enumerate() {
                if !regex.is_match(&class) {
                    continue;
                }
                counts[index] += 1;
                for variant in variants {
                    out.push(format!("{variant}{}{class}", self.config.separator));
                }
                out.push(class.clone());
            }
        }

        for ((regex, _), count) in patterns.iter().zip(counts) {
            if count == 0 {
                self.diagnostics.warn(
                    regex.as_str(),
                    vec![
                        format!("The safelist pattern `{}` doesn't match any Tailwind CSS classes.", regex.as_str()),
                        "Fix this pattern or remove it from your `safelist` configuration.".to_string(),
                    ],
                );
            }
        }

        Ok(out)
    }

    /// 安全列表模式的匹配范围：注册过的所有类名，含负值、透明度和 `!` 写法
    fn safelist_universe(&self, check_important: bool) -> Vec<String> {
        let prefix_len = self.config.prefix.len();
        let opacities: Vec<String> = match self.config.theme("opacity") {
            Some(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };

        let mut out = Vec::new();
        for entry in &self.registry.class_list {
            match entry {
                ClassListEntry::Class(class) => out.push(class.clone()),
                ClassListEntry::Dynamic(identifier, options) => {
                    let mut classes: Vec<String> = options
                        .values
                        .keys()
                        .map(|key| format_class(identifier, key))
                        .collect();
                    if options.supports_negative_values {
                        let negated: Vec<String> = classes.iter().map(|c| format!("-{c}")).collect();
                        let after_prefix: Vec<String> = classes
                            .iter()
                            .filter(|c| c.len() >= prefix_len && c.is_char_boundary(prefix_len))
                            .map(|c| format!("{}-{}", &c[..prefix_len], &c[prefix_len..]))
                            .collect();
                        classes.extend(negated);
                        classes.extend(after_prefix);
                    }
                    if options.has_type(DataType::Color) {
                        let with_opacity: Vec<String> = classes
                            .iter()
                            .flat_map(|c| opacities.iter().map(move |o| format!("{c}/{o}")))
                            .collect();
                        classes.extend(with_opacity);
                    }
                    if check_important && options.respect_important {
                        let important: Vec<String> = classes.iter().map(|c| format!("!{c}")).collect();
                        classes.extend(important);
                    }
                    out.extend(classes);
                }
            }
        }
        out
    }

    /// 从所有缓存中移除一个候选类
    ///
    /// 黑名单中的类保持在 not-a-class 缓存里；其他候选类仍然产生的规则不会被移除。
    pub fn invalidate_candidate(&mut self, candidate: &str) {
        self.caches.class_cache.shift_remove(candidate);
        self.caches.apply_cache.shift_remove(candidate);
        if !self.config.blocklist.iter().any(|blocked| blocked == candidate) {
            self.caches.not_class_cache.remove(candidate);
        }
        if let Some(rules) = self.caches.candidate_rule_cache.shift_remove(candidate) {
            for rule in &rules {
                let shared = self
                    .caches
                    .candidate_rule_cache
                    .values()
                    .any(|others| others.contains(rule));
                if !shared {
                    self.caches.rule_cache.shift_remove(rule);
                }
            }
        }
        self.caches.stylesheet = None;
    }
}

/// 配置的 `important` 策略
fn apply_important_strategy(important: &Important, rule: &mut Node) {
    match important {
        Important::Flag(true) => {
            walk_decls_mut(std::slice::from_mut(rule), &mut |decl| decl.important = true);
        }
        Important::Selector(selector) => {
            walk_rules_mut(std::slice::from_mut(rule), &mut |r| {
                let rewritten: std::result::Result<Vec<String>, _> = split_at_top_level(&r.selector, ",")
                    .into_iter()
                    .map(|part| apply_important_selector(part.trim(), selector))
                    .collect();
                if let Ok(parts) = rewritten {
                    r.selector = parts.join(", ");
                }
            });
        }
        Important::Flag(false) => {}
    }
}

/// 用生成的内容替换 `@tailwind` 占位符（每层只替换第一个）
fn replace_placeholders(nodes: &mut Vec<Node>, content: &mut IndexMap<Layer, Vec<Node>>) {
    let mut out = Vec::with_capacity(nodes.len());
    for mut node in std::mem::take(nodes) {
        if let Some(layer) = placeholder_layer(&node) {
            if let Some(generated) = content.get_mut(&layer) {
                out.append(generated);
            }
            continue;
        }
        if let Some(children) = node.children_mut() {
            replace_placeholders(children, content);
        }
        out.push(node);
    }
    *nodes = out;
}
