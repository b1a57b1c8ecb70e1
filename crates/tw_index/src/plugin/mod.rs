//! Plugin registry.
//!
//! Plugins (built-in and user supplied) run once per [`Context`] against a
//! [`PluginApi`]. They register:
//!
//! - static rule templates (`add_base`, `add_utilities`, `add_components`),
//!   keyed by every class the rule's selectors mention
//! - dynamic utilities (`match_utilities`), keyed by their root identifier
//!   and materialized per candidate from a coerced value
//! - variants (`add_variant*`, `match_variant`)
//!
//! Each registration mints a [`RuleOffset`]. Variant bits are assigned
//! after every plugin has run, in registration order.
//!
//! [`Context`]: crate::Context

pub mod utilities;
pub mod variants;

use crate::error::{Error, Result};
use crate::offsets::{Offsets, RuleOffset, SortFn};
use crate::value::UtilityOptions;
use crate::variant::{is_valid_variant_format, parse_variant, VariantApi, VariantFn, VariantOutput};
use crosswind_core::theme::{flatten_color_palette, to_css_string};
use crosswind_core::{Config, Layer};
use crosswind_css::{escape_class_name, extract_class_names, parse_selector_list, walk_rules, Node, Styles};
use crosswind_parse::NOT_ON_DEMAND;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// 动态工具类函数：`(值, 附加信息) -> 样式`
pub type UtilityFn = Arc<dyn Fn(&Value, &UtilityExtras) -> Result<Styles> + Send + Sync>;

/// `match_variant` 的函数：`(值, api) -> 结果`
pub type MatchVariantFn = Arc<dyn Fn(&str, &mut VariantApi) -> Result<VariantOutput> + Send + Sync>;

/// 传给动态工具类函数的附加信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtilityExtras {
    /// `text-lg/7` 中解析后的 `7`
    pub modifier: Option<String>,
}

/// 把闭包包装为 [`UtilityFn`]
pub fn utility<F>(f: F) -> UtilityFn
where
    F: Fn(&Value, &UtilityExtras) -> Result<Styles> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 动态工具类的值转为 CSS 字符串
pub fn css_value(value: &Value) -> String {
    to_css_string(value).unwrap_or_default()
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn register(&self, api: &mut PluginApi<'_>) -> Result<()>;
}

/// 由闭包实现的插件
pub struct FnPlugin<F> {
    name: String,
    register: F,
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&mut PluginApi<'_>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, api: &mut PluginApi<'_>) -> Result<()> {
        (self.register)(api)
    }
}

/// 用闭包创建插件
///
/// ```
/// use crosswind_engine::plugin::plugin;
/// use crosswind_css::Styles;
///
/// let tabs = plugin("tab-size", |api| {
///     api.add_utilities(Styles::new().nest(".tab-4", Styles::new().decl("tabSize", "4")), Default::default());
///     Ok(())
/// });
/// assert_eq!(tabs.name(), "tab-size");
/// ```
pub fn plugin<F>(name: impl Into<String>, register: F) -> Arc<dyn Plugin>
where
    F: Fn(&mut PluginApi<'_>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnPlugin {
        name: name.into(),
        register,
    })
}

/// 可以作为静态规则注册的内容
pub trait IntoNodes {
    fn into_nodes(self) -> Vec<Node>;
}

impl IntoNodes for Styles {
    fn into_nodes(self) -> Vec<Node> {
        Styles::into_nodes(self)
    }
}

impl IntoNodes for Vec<Node> {
    fn into_nodes(self) -> Vec<Node> {
        self
    }
}

/// 规则模板
#[derive(Clone)]
pub enum RuleTemplate {
    Static(Node),
    Dynamic { identifier: String, func: UtilityFn },
}

/// 候选类规则表中的一项
#[derive(Clone)]
pub struct CandidateRule {
    pub offset: RuleOffset,
    pub options: Arc<UtilityOptions>,
    pub template: RuleTemplate,
}

impl CandidateRule {
    pub fn layer(&self) -> Layer {
        self.offset.layer
    }
}

/// `get_class_list` 的数据来源
#[derive(Clone)]
pub enum ClassListEntry {
    Class(String),
    Dynamic(String, Arc<UtilityOptions>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum VariantKind {
    #[default]
    Plain,
    /// `match_variant` 为每个静态值生成的变体
    MatchValue,
    /// `match_variant` 本身，接受 `name-[value]`
    MatchDynamic,
}

/// 变体选项
#[derive(Clone)]
pub struct VariantOptions {
    /// 共享 `id` 的变体之间用 `sort` 排序
    pub id: Option<String>,
    pub sort: Option<SortFn>,
    /// 排序用的值，缺省时使用任意值
    pub value: Option<String>,
    /// 格式字符串中的类名是否加配置的前缀
    pub respect_prefix: bool,
    pub(crate) kind: VariantKind,
    pub(crate) values: Vec<String>,
}

impl Default for VariantOptions {
    fn default() -> Self {
        Self {
            id: None,
            sort: None,
            value: None,
            respect_prefix: true,
            kind: VariantKind::Plain,
            values: Vec::new(),
        }
    }
}

impl VariantOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sort(mut self, sort: SortFn) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn respect_prefix(mut self, respect: bool) -> Self {
        self.respect_prefix = respect;
        self
    }
}

/// `match_variant` 选项
#[derive(Clone)]
pub struct MatchVariantOptions {
    /// 静态值；`DEFAULT` 用于不带值的写法
    pub values: IndexMap<String, String>,
    pub sort: Option<SortFn>,
    pub id: Option<String>,
    pub respect_prefix: bool,
}

impl Default for MatchVariantOptions {
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
            sort: None,
            id: None,
            respect_prefix: true,
        }
    }
}

impl MatchVariantOptions {
    pub fn values<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    pub fn sort(mut self, sort: SortFn) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn respect_prefix(mut self, respect: bool) -> Self {
        self.respect_prefix = respect;
        self
    }
}

/// 插件注册的全部内容
#[derive(Default)]
pub struct Registry {
    pub(crate) candidate_rules: IndexMap<String, Vec<CandidateRule>>,
    pub(crate) variant_map: IndexMap<String, Vec<(RuleOffset, VariantFn)>>,
    pub(crate) variant_options: IndexMap<String, VariantOptions>,
    pub(crate) class_list: Vec<ClassListEntry>,
    pub(crate) offsets: Offsets,
    pending_variants: IndexMap<String, Vec<VariantFn>>,
    next_variant_id: usize,
}

impl Registry {
    fn register_variant(&mut self, name: &str, fns: Vec<VariantFn>, options: VariantOptions) {
        self.pending_variants.shift_remove(name);
        self.pending_variants.insert(name.to_string(), fns);
        self.variant_options.insert(name.to_string(), options);
    }

    fn variant_id(&mut self) -> String {
        self.next_variant_id += 1;
        self.next_variant_id.to_string()
    }

    /// 按注册顺序为变体分配位
    fn finalize(&mut self) {
        for (name, fns) in std::mem::take(&mut self.pending_variants) {
            self.offsets.record_variant(&name, fns.len());
            let entries = fns
                .into_iter()
                .enumerate()
                .filter_map(|(idx, f)| Some((self.offsets.for_variant(&name, idx)?, f)))
                .collect();
            self.variant_map.insert(name, entries);
        }
    }

    /// 未注册过的候选类标识
    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.candidate_rules.contains_key(identifier)
    }
}

/// 插件可用的注册接口
pub struct PluginApi<'a> {
    config: &'a Config,
    registry: &'a mut Registry,
    plugin: &'a str,
}

impl<'a> PluginApi<'a> {
    pub fn config(&self) -> &Config {
        self.config
    }

    /// 当前插件名
    pub fn plugin_name(&self) -> &str {
        self.plugin
    }

    pub fn theme(&self, path: &str) -> Option<&Value> {
        self.config.theme(path)
    }

    /// 主题中的字符串值
    pub fn theme_value(&self, path: &str) -> Option<String> {
        self.config.theme_value(path)
    }

    /// 主题中的对象，按键展开
    pub fn theme_map(&self, path: &str) -> IndexMap<String, Value> {
        match self.theme(path) {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => IndexMap::new(),
        }
    }

    /// 展开的调色板：`red-500`, `white`
    pub fn theme_colors(&self, path: &str) -> IndexMap<String, Value> {
        self.theme(path).map(flatten_color_palette).unwrap_or_default()
    }

    /// 加上配置的类名前缀：`group` → `tw-group`
    pub fn prefix(&self, class: &str) -> String {
        format!("{}{class}", self.config.prefix)
    }

    /// 转义为类选择器使用的形式
    pub fn escape(&self, class: &str) -> String {
        escape_class_name(class)
    }

    pub fn add_base(&mut self, styles: impl IntoNodes) {
        let options = UtilityOptions::new().respect_prefix(false).respect_important(false);
        self.add_static(Layer::Base, styles.into_nodes(), options);
    }

    pub fn add_defaults(&mut self, styles: impl IntoNodes) {
        let options = UtilityOptions::new().respect_prefix(false).respect_important(false);
        self.add_static(Layer::Defaults, styles.into_nodes(), options);
    }

    pub fn add_utilities(&mut self, styles: impl IntoNodes, options: UtilityOptions) {
        self.add_static(Layer::Utilities, styles.into_nodes(), options);
    }

    pub fn add_components(&mut self, styles: impl IntoNodes, options: UtilityOptions) {
        self.add_static(Layer::Components, styles.into_nodes(), options);
    }

    pub fn match_utilities<'b>(
        &mut self,
        utilities: impl IntoIterator<Item = (&'b str, UtilityFn)>,
        options: UtilityOptions,
    ) {
        self.add_dynamic(Layer::Utilities, utilities, options);
    }

    pub fn match_components<'b>(
        &mut self,
        utilities: impl IntoIterator<Item = (&'b str, UtilityFn)>,
        options: UtilityOptions,
    ) {
        self.add_dynamic(Layer::Components, utilities, options);
    }

    /// 用格式字符串注册变体；多个格式各自生成一条规则
    pub fn add_variant(&mut self, name: &str, formats: &[&str]) -> Result<()> {
        self.add_variant_with(name, formats, VariantOptions::default())
    }

    pub fn add_variant_with(&mut self, name: &str, formats: &[&str], options: VariantOptions) -> Result<()> {
        let fns = formats
            .iter()
            .map(|format| {
                if !is_valid_variant_format(format) {
                    return Err(invalid_format(name, format));
                }
                Ok(parse_variant(format))
            })
            .collect::<Result<Vec<_>>>()?;
        self.registry.register_variant(name, fns, options);
        Ok(())
    }

    /// 用函数注册变体
    pub fn add_variant_fn<F>(&mut self, name: &str, f: F, options: VariantOptions)
    where
        F: Fn(&mut VariantApi) -> Result<VariantOutput> + Send + Sync + 'static,
    {
        self.add_variant_fns(name, vec![Arc::new(f)], options);
    }

    /// 多个函数，每个函数各自占一位
    pub fn add_variant_fns(&mut self, name: &str, fns: Vec<VariantFn>, options: VariantOptions) {
        let fns = fns.into_iter().map(|f| checked(name, f)).collect();
        self.registry.register_variant(name, fns, options);
    }

    /// 参数化变体
    ///
    /// 每个静态值注册为 `name-key`（`@` 注册为 `@key`），另外注册 `name`
    /// 本身用于 `name-[value]` 任意值。
    pub fn match_variant<F>(&mut self, name: &str, f: F, options: MatchVariantOptions)
    where
        F: Fn(&str, &mut VariantApi) -> Result<VariantOutput> + Send + Sync + 'static,
    {
        let id = options.id.clone().unwrap_or_else(|| self.registry.variant_id());
        let f: MatchVariantFn = Arc::new(f);
        let special = name == "@";

        for (key, value) in &options.values {
            if key == "DEFAULT" {
                continue;
            }
            let variant = if special {
                format!("{name}{key}")
            } else {
                format!("{name}-{key}")
            };
            let f = f.clone();
            let bound = value.clone();
            let func: VariantFn = Arc::new(move |api: &mut VariantApi| f(&bound, api));
            self.registry.register_variant(
                &variant,
                vec![checked(&variant, func)],
                VariantOptions {
                    id: Some(id.clone()),
                    sort: options.sort.clone(),
                    value: Some(value.clone()),
                    respect_prefix: options.respect_prefix,
                    kind: VariantKind::MatchValue,
                    values: Vec::new(),
                },
            );
        }

        let default = options.values.get("DEFAULT").cloned();
        let func: VariantFn = Arc::new(move |api: &mut VariantApi| {
            let value = match (&api.args.value, &default) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => default.clone(),
                (None, None) => return Ok(VariantOutput::Drop),
            };
            f(&value, api)
        });
        self.registry.register_variant(
            name,
            vec![checked(name, func)],
            VariantOptions {
                id: Some(id),
                sort: options.sort,
                value: None,
                respect_prefix: options.respect_prefix,
                kind: VariantKind::MatchDynamic,
                values: options.values.keys().cloned().collect(),
            },
        );
    }

    fn prefix_identifier(&self, identifier: &str, options: &UtilityOptions) -> String {
        if identifier == NOT_ON_DEMAND || !options.respect_prefix {
            return identifier.to_string();
        }
        self.prefix(identifier)
    }

    fn add_static(&mut self, layer: Layer, nodes: Vec<Node>, options: UtilityOptions) {
        let options = Arc::new(options);
        for node in nodes {
            let offset = self.registry.offsets.create(layer);
            for identifier in identifiers_of(&node) {
                let identifier = self.prefix_identifier(&identifier, &options);
                if matches!(layer, Layer::Utilities | Layer::Components) && identifier != NOT_ON_DEMAND {
                    let known = self
                        .registry
                        .class_list
                        .iter()
                        .any(|entry| matches!(entry, ClassListEntry::Class(c) if *c == identifier));
                    if !known {
                        self.registry.class_list.push(ClassListEntry::Class(identifier.clone()));
                    }
                }
                self.registry
                    .candidate_rules
                    .entry(identifier)
                    .or_default()
                    .push(CandidateRule {
                        offset: offset.clone(),
                        options: options.clone(),
                        template: RuleTemplate::Static(node.clone()),
                    });
            }
        }
    }

    fn add_dynamic<'b>(
        &mut self,
        layer: Layer,
        utilities: impl IntoIterator<Item = (&'b str, UtilityFn)>,
        options: UtilityOptions,
    ) {
        let options = Arc::new(options);
        for (identifier, func) in utilities {
            let prefixed = self.prefix_identifier(identifier, &options);
            let offset = self.registry.offsets.create(layer);
            self.registry
                .class_list
                .push(ClassListEntry::Dynamic(prefixed.clone(), options.clone()));
            self.registry
                .candidate_rules
                .entry(prefixed)
                .or_default()
                .push(CandidateRule {
                    offset,
                    options: options.clone(),
                    template: RuleTemplate::Dynamic {
                        identifier: identifier.to_string(),
                        func,
                    },
                });
        }
    }
}

fn invalid_format(variant: &str, format: &str) -> Error {
    Error::InvalidVariantFormat {
        variant: variant.to_string(),
        format: format.to_string(),
    }
}

/// 校验函数返回的格式字符串；单个格式立即应用
fn checked(name: &str, f: VariantFn) -> VariantFn {
    let name = name.to_string();
    Arc::new(move |api: &mut VariantApi| match f(api)? {
        VariantOutput::Format(format) => {
            if !is_valid_variant_format(&format) {
                return Err(invalid_format(&name, &format));
            }
            parse_variant(&format)(api)
        }
        VariantOutput::Formats(formats) => {
            if let Some(bad) = formats.iter().find(|f| !is_valid_variant_format(f)) {
                return Err(invalid_format(&name, bad));
            }
            Ok(VariantOutput::Formats(formats))
        }
        other => Ok(other),
    })
}

/// 规则的候选类标识
///
/// 选择器（含 at-rule 内的规则）里出现的所有类名；任一选择器不含类名时
/// 额外加上 [`NOT_ON_DEMAND`]，使规则无条件输出。
fn identifiers_of(node: &Node) -> Vec<String> {
    let mut selectors = Vec::new();
    match node {
        Node::Rule(rule) => selectors.push(rule.selector.clone()),
        Node::AtRule(_) => walk_rules(std::slice::from_ref(node), &mut |rule| {
            selectors.push(rule.selector.clone())
        }),
        _ => {}
    }

    let mut classes: Vec<String> = Vec::new();
    let mut not_on_demand = false;
    for selector in selectors {
        let Ok(list) = parse_selector_list(&selector) else {
            not_on_demand = true;
            continue;
        };
        for selector in list.selectors {
            let found = extract_class_names(&crosswind_css::SelectorList::new(vec![selector]));
            if found.is_empty() {
                not_on_demand = true;
            }
            for class in found {
                if !classes.contains(&class) {
                    classes.push(class);
                }
            }
        }
    }

    if not_on_demand {
        classes.insert(0, NOT_ON_DEMAND.to_string());
    }
    classes
}

/// 运行所有插件
///
/// 顺序：内置工具类、内置前置变体、用户插件、内置后置变体（断点、暗色等），
/// 之后按注册顺序为变体分配位。
pub(crate) fn register_plugins(config: &Config, plugins: &[Arc<dyn Plugin>]) -> Result<Registry> {
    let mut registry = Registry::default();

    let mut ordered: Vec<&dyn Plugin> = Vec::new();
    ordered.extend(utilities::CORE_PLUGINS.iter().map(|p| p as &dyn Plugin));
    ordered.extend(variants::BEFORE_VARIANTS.iter().map(|p| p as &dyn Plugin));
    ordered.extend(plugins.iter().map(|p| p.as_ref()));
    ordered.extend(variants::after_variants(config).into_iter().map(|p| p as &dyn Plugin));

    for plugin in ordered {
        let mut api = PluginApi {
            config,
            registry: &mut registry,
            plugin: plugin.name(),
        };
        plugin.register(&mut api)?;
    }

    registry.finalize();
    tracing::debug!(
        identifiers = registry.candidate_rules.len(),
        variants = registry.variant_map.len(),
        "registered plugins"
    );
    Ok(registry)
}

/// 内置插件：名字 + 注册函数
pub(crate) struct CorePlugin {
    pub name: &'static str,
    pub register: fn(&mut PluginApi<'_>) -> Result<()>,
}

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn register(&self, api: &mut PluginApi<'_>) -> Result<()> {
        (self.register)(api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;
    use pretty_assertions::assert_eq;

    fn registry_with(plugins: &[Arc<dyn Plugin>]) -> Registry {
        register_plugins(&Config::default(), plugins).unwrap()
    }

    #[test]
    fn test_identifiers_of() {
        let node = Node::rule(".group:hover .foo, .bar:not(.baz)", vec![Node::decl("color", "red")]);
        assert_eq!(identifiers_of(&node), vec!["group", "foo", "bar"]);

        let node = Node::rule("*, ::before", vec![Node::decl("box-sizing", "border-box")]);
        assert_eq!(identifiers_of(&node), vec!["*"]);

        let node = Node::at_rule(
            "media",
            "(min-width: 640px)",
            vec![Node::rule(".container", vec![Node::decl("max-width", "640px")])],
        );
        assert_eq!(identifiers_of(&node), vec!["container"]);
    }

    #[test]
    fn test_static_rules_get_distinct_offsets() {
        let registry = registry_with(&[]);
        let block = &registry.candidate_rules["block"][0];
        let flex = &registry.candidate_rules["flex"][0];
        assert_eq!(block.layer(), Layer::Utilities);
        assert!(block.offset.index < flex.offset.index);
    }

    #[test]
    fn test_prefix_applies_to_identifiers() {
        let config = Config::default().with_prefix("tw-");
        let registry = register_plugins(&config, &[]).unwrap();
        assert!(registry.has_identifier("tw-flex"));
        assert!(registry.has_identifier("tw-m"));
        assert!(!registry.has_identifier("flex"));
        assert!(registry.has_identifier("*"));
    }

    #[test]
    fn test_invalid_variant_format_is_rejected() {
        let bad = plugin("bad", |api| api.add_variant("foo", &[":hover"]));
        let err = register_plugins(&Config::default(), &[bad]).err().unwrap();
        assert!(matches!(err, Error::InvalidVariantFormat { ref variant, .. } if variant == "foo"));
    }

    #[test]
    fn test_user_variants_sort_before_screens() {
        let custom = plugin("custom", |api| api.add_variant("optional", &["&:optional"]));
        let registry = registry_with(&[custom]);
        let optional = &registry.variant_map["optional"][0].0;
        let sm = &registry.variant_map["sm"][0].0;
        let hover = &registry.variant_map["hover"][0].0;
        assert!(hover.variants < optional.variants);
        assert!(optional.variants < sm.variants);
    }

    #[test]
    fn test_parallel_variant_reserves_bits() {
        let registry = registry_with(&[]);
        let selection = &registry.variant_map["selection"];
        assert_eq!(selection.len(), 2);
        assert!(selection[0].0.variants < selection[1].0.variants);
    }

    #[test]
    fn test_match_variant_registers_values() {
        let tabs = plugin("tabs", |api| {
            api.match_variant(
                "tab",
                |value, _| Ok(VariantOutput::Format(format!("&[data-tab={value}]"))),
                MatchVariantOptions::default().values([("one", "1"), ("DEFAULT", "0")]),
            );
            Ok(())
        });
        let registry = registry_with(&[tabs]);
        assert!(registry.variant_map.contains_key("tab-one"));
        assert!(registry.variant_map.contains_key("tab"));
        assert!(!registry.variant_map.contains_key("tab-DEFAULT"));

        let options = &registry.variant_options["tab"];
        assert_eq!(options.kind, VariantKind::MatchDynamic);
        assert_eq!(options.values, vec!["one", "DEFAULT"]);
        assert_eq!(
            registry.variant_options["tab-one"].id,
            registry.variant_options["tab"].id
        );
    }

    #[test]
    fn test_dynamic_utilities_are_listed() {
        let registry = registry_with(&[]);
        let bg = registry
            .class_list
            .iter()
            .find_map(|entry| match entry {
                ClassListEntry::Dynamic(name, options) if name == "bg" && options.has_type(DataType::Color) => {
                    Some(options.clone())
                }
                _ => None,
            })
            .unwrap();
        assert!(bg.values.contains_key("red-500"));
    }
}
