//! Utility values: option types and modifier coercion.
//!
//! A dynamic utility receives the part of the candidate after its prefix
//! (the *modifier*: `red-500/50`, `[10px]`, `-4`). Coercion turns that into a
//! concrete value by looking it up in the utility's `values`, or by
//! validating and normalizing an arbitrary `[...]` value against the
//! declared [`DataType`]s.

use crate::color;
use crate::data_types;
use crosswind_core::theme::to_css_string;
use crosswind_parse::{is_arbitrary_value, normalize, split_utility_modifier};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static TYPE_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w-]+$").unwrap());
static SIGNED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+|\d*\.\d+)(e[+-]?\d+)?(%|\w+)?$").unwrap());

/// 工具类接受的值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Any,
    Color,
    Url,
    Image,
    Length,
    Percentage,
    Position,
    Lookup,
    GenericName,
    FamilyName,
    Number,
    LineWidth,
    AbsoluteSize,
    RelativeSize,
    Shadow,
    Size,
}

impl DataType {
    pub const ALL: [DataType; 16] = [
        DataType::Any,
        DataType::Color,
        DataType::Url,
        DataType::Image,
        DataType::Length,
        DataType::Percentage,
        DataType::Position,
        DataType::Lookup,
        DataType::GenericName,
        DataType::FamilyName,
        DataType::Number,
        DataType::LineWidth,
        DataType::AbsoluteSize,
        DataType::RelativeSize,
        DataType::Shadow,
        DataType::Size,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Any => "any",
            DataType::Color => "color",
            DataType::Url => "url",
            DataType::Image => "image",
            DataType::Length => "length",
            DataType::Percentage => "percentage",
            DataType::Position => "position",
            DataType::Lookup => "lookup",
            DataType::GenericName => "generic-name",
            DataType::FamilyName => "family-name",
            DataType::Number => "number",
            DataType::LineWidth => "line-width",
            DataType::AbsoluteSize => "absolute-size",
            DataType::RelativeSize => "relative-size",
            DataType::Shadow => "shadow",
            DataType::Size => "size",
        }
    }

    /// 类型提示 `[length:2em]` 中的类型名
    pub fn from_name(name: &str) -> Option<Self> {
        DataType::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    fn guess(&self) -> Option<fn(&str) -> bool> {
        match self {
            DataType::Url => Some(data_types::url),
            DataType::Image => Some(data_types::image),
            DataType::Length => Some(data_types::length),
            DataType::Percentage => Some(data_types::percentage),
            DataType::Position => Some(data_types::position),
            DataType::GenericName => Some(data_types::generic_name),
            DataType::FamilyName => Some(data_types::family_name),
            DataType::Number => Some(data_types::number),
            DataType::LineWidth => Some(data_types::line_width),
            DataType::AbsoluteSize => Some(data_types::absolute_size),
            DataType::RelativeSize => Some(data_types::relative_size),
            DataType::Shadow => Some(data_types::shadow),
            DataType::Size => Some(data_types::background_size),
            DataType::Any | DataType::Color | DataType::Lookup => None,
        }
    }
}

/// 声明的类型；`prefer_on_conflict` 在多个工具类争抢同一个任意值时胜出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub ty: DataType,
    pub prefer_on_conflict: bool,
}

impl From<DataType> for TypeSpec {
    fn from(ty: DataType) -> Self {
        TypeSpec {
            ty,
            prefer_on_conflict: false,
        }
    }
}

impl TypeSpec {
    pub fn preferred(ty: DataType) -> Self {
        TypeSpec {
            ty,
            prefer_on_conflict: true,
        }
    }
}

/// 工具类修饰符（`text-lg/7` 中的 `7`）
#[derive(Debug, Clone, PartialEq)]
pub enum Modifiers {
    /// 任意修饰符原样传给插件
    Any,
    /// 修饰符先按表查找
    Map(IndexMap<String, String>),
}

/// `add_utilities` / `match_utilities` 的选项
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityOptions {
    pub types: Vec<TypeSpec>,
    pub values: IndexMap<String, Value>,
    pub supports_negative_values: bool,
    pub modifiers: Option<Modifiers>,
    pub respect_prefix: bool,
    pub respect_important: bool,
}

impl Default for UtilityOptions {
    fn default() -> Self {
        Self {
            types: vec![DataType::Any.into()],
            values: IndexMap::new(),
            supports_negative_values: false,
            modifiers: None,
            respect_prefix: true,
            respect_important: true,
        }
    }
}

impl UtilityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(mut self, types: impl IntoIterator<Item = impl Into<TypeSpec>>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn values(mut self, values: IndexMap<String, Value>) -> Self {
        self.values = values;
        self
    }

    pub fn negative(mut self) -> Self {
        self.supports_negative_values = true;
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn respect_prefix(mut self, respect: bool) -> Self {
        self.respect_prefix = respect;
        self
    }

    pub fn respect_important(mut self, respect: bool) -> Self {
        self.respect_important = respect;
        self
    }

    pub fn has_type(&self, ty: DataType) -> bool {
        self.types.iter().any(|spec| spec.ty == ty)
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// 强制转换的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Value,
    pub ty: DataType,
    /// 已按 `modifiers` 表解析过的工具类修饰符
    pub modifier: Option<String>,
}

/// 把修饰符转换为具体的值
///
/// # 参数
///
/// - `modifier`: 前缀之后的部分，例如 `red-500/50`、`[length:2em]`
/// - `options`: 工具类选项
/// - `opacity`: 主题中的 `opacity` 表，用于颜色透明度修饰符
///
/// 类型提示不被支持、或没有类型能接受该值时返回 `None`。
pub fn coerce_value(modifier: &str, options: &UtilityOptions, opacity: &Value) -> Option<Coerced> {
    if options.lookup(modifier).is_some() {
        for spec in &options.types {
            if let Some(value) = coerce_as(spec.ty, modifier, options, opacity) {
                return Some(Coerced {
                    value,
                    ty: spec.ty,
                    modifier: None,
                });
            }
        }
    }

    if is_arbitrary_value(modifier) {
        let inner = &modifier[1..modifier.len() - 1];
        if let Some((hint, value)) = inner.split_once(':') {
            if TYPE_HINT.is_match(hint) {
                let ty = DataType::from_name(hint)?;
                if !value.is_empty() {
                    let value = as_value(&format!("[{value}]"), options, |_| true)?;
                    return Some(Coerced {
                        value: Value::String(value),
                        ty,
                        modifier: None,
                    });
                }
            }
        }
    }

    matching_types(modifier, options, opacity).into_iter().next()
}

/// 所有能接受该修饰符的类型（按声明顺序）
pub fn matching_types(modifier: &str, options: &UtilityOptions, opacity: &Value) -> Vec<Coerced> {
    let (value, utility_modifier) = split_modifier(modifier, options);
    if utility_modifier.is_some() && value.is_empty() {
        return Vec::new();
    }

    options
        .types
        .iter()
        .filter_map(|spec| {
            let raw = if spec.ty == DataType::Color { modifier } else { value };
            coerce_as(spec.ty, raw, options, opacity).map(|value| {
                Coerced {
                    value,
                    ty: spec.ty,
                    modifier: utility_modifier.clone(),
                }
            })
        })
        .collect()
}

/// 启用了 `modifiers` 时拆出 `/modifier`，并按表解析
fn split_modifier<'a>(modifier: &'a str, options: &UtilityOptions) -> (&'a str, Option<String>) {
    let Some(modifiers) = &options.modifiers else {
        return (modifier, None);
    };
    let (value, utility_modifier) = split_utility_modifier(modifier);
    let Some(utility_modifier) = utility_modifier else {
        return (value, None);
    };

    let resolved = match modifiers {
        Modifiers::Any => utility_modifier.to_string(),
        Modifiers::Map(map) => match map.get(utility_modifier) {
            Some(configured) => configured.clone(),
            None if is_arbitrary_value(utility_modifier) => {
                normalize(&utility_modifier[1..utility_modifier.len() - 1], None)
            }
            None => utility_modifier.to_string(),
        },
    };
    (value, Some(resolved))
}

fn coerce_as(
    ty: DataType,
    modifier: &str,
    options: &UtilityOptions,
    opacity: &Value,
) -> Option<Value> {
    match ty {
        DataType::Any => as_value_json(modifier, options, |_| true),
        DataType::Color => as_color(modifier, options, opacity).map(Value::String),
        DataType::Lookup => options.lookup(modifier).cloned(),
        _ => {
            let guess = ty.guess()?;
            as_value_json(modifier, options, guess)
        }
    }
}

/// 与 [`as_value`] 相同，但保留 `values` 中的非字符串值（字体大小元组等）
fn as_value_json(modifier: &str, options: &UtilityOptions, validate: impl Fn(&str) -> bool) -> Option<Value> {
    if let Some(value) = options.lookup(modifier) {
        return Some(value.clone());
    }
    as_value(modifier, options, validate).map(Value::String)
}

/// 按 `values` 查找，或验证并规范化任意值；支持负值
pub fn as_value(modifier: &str, options: &UtilityOptions, validate: impl Fn(&str) -> bool) -> Option<String> {
    if let Some(value) = options.lookup(modifier) {
        return to_css_string(value);
    }

    if options.supports_negative_values {
        if let Some(positive) = modifier.strip_prefix('-') {
            if let Some(value) = options.lookup(positive) {
                return negate_value(&to_css_string(value)?);
            }
            if is_arbitrary_value(positive) {
                let resolved = resolve_arbitrary_value(positive, &validate)?;
                return negate_value(&resolved);
            }
            return None;
        }
    }

    resolve_arbitrary_value(modifier, &validate)
}

fn resolve_arbitrary_value(modifier: &str, validate: &dyn Fn(&str) -> bool) -> Option<String> {
    if !is_arbitrary_value(modifier) {
        return None;
    }
    let inner = &modifier[1..modifier.len() - 1];
    if !validate(inner) {
        return None;
    }
    Some(normalize(inner, None))
}

/// 颜色，支持 `/50`、`/[.3]` 透明度修饰符
pub fn as_color(modifier: &str, options: &UtilityOptions, opacity: &Value) -> Option<String> {
    if let Some(value) = options.lookup(modifier) {
        return to_css_string(value);
    }

    let (base, alpha) = split_utility_modifier(modifier);
    if let Some(alpha) = alpha {
        let color = match options.lookup(base) {
            Some(value) => to_css_string(value)?,
            None if is_arbitrary_value(base) => base[1..base.len() - 1].to_string(),
            None => return None,
        };
        let alpha = if is_arbitrary_value(alpha) {
            normalize(&alpha[1..alpha.len() - 1], None)
        } else {
            to_css_string(opacity.get(alpha)?)?
        };
        return color::with_alpha_value(&color, &alpha);
    }

    as_value(modifier, options, data_types::color)
}

/// 取反
///
/// - `0` 不变
/// - 数字翻转符号：`4px` → `-4px`，`-4px` → `4px`
/// - `var()`/`calc()`/`min()`/`max()`/`clamp()` 包进 `calc(... * -1)`
/// - 其它值无法取反，返回 `None`
pub fn negate_value(value: &str) -> Option<String> {
    if value == "0" {
        return Some("0".to_string());
    }

    if SIGNED_NUMBER.is_match(value) {
        return Some(match value.as_bytes()[0] {
            b'-' => value[1..].to_string(),
            b'+' => format!("-{}", &value[1..]),
            _ => format!("-{value}"),
        });
    }

    const NUMERIC_FUNCTIONS: [&str; 5] = ["var(", "calc(", "min(", "max(", "clamp("];
    if NUMERIC_FUNCTIONS.iter().any(|f| value.contains(f)) {
        return Some(format!("calc({value} * -1)"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spacing() -> UtilityOptions {
        let values = [("4", "1rem"), ("px", "1px"), ("auto", "auto")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        UtilityOptions::new()
            .types([DataType::Length, DataType::Percentage])
            .values(values)
            .negative()
    }

    fn colors() -> UtilityOptions {
        let values = [("red-500", "#ef4444"), ("brand", "rgb(var(--brand) / <alpha-value>)")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        UtilityOptions::new().types([DataType::Color, DataType::Any]).values(values)
    }

    fn opacity() -> Value {
        json!({ "50": "0.5" })
    }

    #[test]
    fn test_negate_value() {
        assert_eq!(negate_value("0").as_deref(), Some("0"));
        assert_eq!(negate_value("1rem").as_deref(), Some("-1rem"));
        assert_eq!(negate_value("-1rem").as_deref(), Some("1rem"));
        assert_eq!(negate_value("var(--x)").as_deref(), Some("calc(var(--x) * -1)"));
        assert_eq!(negate_value("auto"), None);
    }

    #[test]
    fn test_as_value_lookup_and_negative() {
        let options = spacing();
        assert_eq!(as_value("4", &options, |_| true).as_deref(), Some("1rem"));
        assert_eq!(as_value("-4", &options, |_| true).as_deref(), Some("-1rem"));
        assert_eq!(as_value("-[3px]", &options, |_| true).as_deref(), Some("-3px"));
        assert_eq!(as_value("-auto", &options, |_| true), None);
        assert_eq!(as_value("[calc(100%-1rem)]", &options, |_| true).as_deref(), Some("calc(100% - 1rem)"));
    }

    #[test]
    fn test_coerce_lookup() {
        let coerced = coerce_value("4", &spacing(), &opacity()).unwrap();
        assert_eq!(coerced.value, json!("1rem"));
        assert_eq!(coerced.ty, DataType::Length);
    }

    #[test]
    fn test_coerce_arbitrary_guesses_type() {
        let options = UtilityOptions::new().types([DataType::Color, DataType::Length]);
        assert_eq!(coerce_value("[10px]", &options, &opacity()).unwrap().ty, DataType::Length);
        assert_eq!(coerce_value("[#fff]", &options, &opacity()).unwrap().ty, DataType::Color);
        assert!(coerce_value("[foo]", &options, &opacity()).is_none());
    }

    #[test]
    fn test_coerce_type_hint() {
        let options = UtilityOptions::new().types([DataType::Color]);
        let coerced = coerce_value("[length:var(--x)]", &options, &opacity()).unwrap();
        assert_eq!(coerced.ty, DataType::Length);
        assert_eq!(coerced.value, json!("var(--x)"));
        assert!(coerce_value("[bogus:1px]", &options, &opacity()).is_none());
    }

    #[test]
    fn test_url_inside_arbitrary_value_is_not_a_hint() {
        let options = UtilityOptions::new().types([DataType::Url]);
        let coerced = coerce_value("[url(https://x.test/a.png)]", &options, &opacity()).unwrap();
        assert_eq!(coerced.ty, DataType::Url);
    }

    #[test]
    fn test_color_with_opacity() {
        let options = colors();
        assert_eq!(
            as_color("red-500/50", &options, &opacity()).as_deref(),
            Some("rgb(239 68 68 / 0.5)")
        );
        assert_eq!(
            as_color("red-500/[.3]", &options, &opacity()).as_deref(),
            Some("rgb(239 68 68 / .3)")
        );
        assert_eq!(
            as_color("brand/50", &options, &opacity()).as_deref(),
            Some("rgb(var(--brand) / 0.5)")
        );
        assert_eq!(as_color("red-500/13", &options, &opacity()), None);
        assert_eq!(
            as_color("[#0000ff]/50", &options, &opacity()).as_deref(),
            Some("rgb(0 0 255 / 0.5)")
        );
    }

    #[test]
    fn test_utility_modifier_map() {
        let mut line_heights = IndexMap::new();
        line_heights.insert("7".to_string(), "1.75rem".to_string());
        let values = [("lg".to_string(), json!("1.125rem"))].into_iter().collect();
        let options = UtilityOptions::new()
            .types([DataType::AbsoluteSize, DataType::Length])
            .values(values)
            .modifiers(Modifiers::Map(line_heights));

        let coerced = coerce_value("lg/7", &options, &opacity()).unwrap();
        assert_eq!(coerced.value, json!("1.125rem"));
        assert_eq!(coerced.modifier.as_deref(), Some("1.75rem"));

        let arbitrary = coerce_value("lg/[3rem]", &options, &opacity()).unwrap();
        assert_eq!(arbitrary.modifier.as_deref(), Some("3rem"));
    }
}
