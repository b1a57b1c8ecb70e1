//! Built-in variants.
//!
//! Split in two batches around user plugins: selector variants are
//! registered before them, stacking variants (`supports`, screens, `dark`,
//! `print`, ...) after, which gives the stacking ones the higher bits.

use super::utilities::leading_number;
use super::{CorePlugin, MatchVariantOptions, PluginApi, VariantOptions};
use crate::color::remove_alpha_variable;
use crate::error::Result;
use crate::offsets::{SortArgs, SortFn};
use crate::variant::{VariantApi, VariantFn, VariantOutput};
use crosswind_core::{Config, DarkMode};
use crosswind_css::{walk_rules_mut, Node};
use crosswind_parse::normalize;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

static RAW_SUPPORTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w*\s*\(").unwrap());
static SUPPORTS_KEYWORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(and|or|not)\b").unwrap());
static TRAILING_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\D+)$").unwrap());

const VISITED_ALPHA: &[&str] = &["--tw-text-opacity", "--tw-border-opacity", "--tw-bg-opacity"];
const VISITED: &str = "&:visited";

pub(crate) static BEFORE_VARIANTS: &[CorePlugin] = &[
    CorePlugin { name: "childVariant", register: child_variant },
    CorePlugin { name: "pseudoElementVariants", register: pseudo_element_variants },
    CorePlugin { name: "pseudoClassVariants", register: pseudo_class_variants },
    CorePlugin { name: "hasVariants", register: has_variants },
    CorePlugin { name: "ariaVariants", register: aria_variants },
    CorePlugin { name: "dataVariants", register: data_variants },
];

static SUPPORTS: CorePlugin = CorePlugin { name: "supportsVariants", register: supports_variants };
static REDUCED_MOTION: CorePlugin = CorePlugin { name: "reducedMotionVariants", register: reduced_motion_variants };
static CONTRAST: CorePlugin = CorePlugin { name: "prefersContrastVariants", register: prefers_contrast_variants };
static SCREENS: CorePlugin = CorePlugin { name: "screenVariants", register: screen_variants };
static ORIENTATION: CorePlugin = CorePlugin { name: "orientationVariants", register: orientation_variants };
static DIRECTION: CorePlugin = CorePlugin { name: "directionVariants", register: direction_variants };
static DARK: CorePlugin = CorePlugin { name: "darkVariants", register: dark_variants };
static FORCED_COLORS: CorePlugin = CorePlugin { name: "forcedColorsVariants", register: forced_colors_variants };
static PRINT: CorePlugin = CorePlugin { name: "printVariant", register: print_variant };

/// 用户插件之后注册的变体
///
/// `darkMode: "class"` 时 `dark` 排在断点之前（旧行为）。
pub(crate) fn after_variants(config: &Config) -> Vec<&'static CorePlugin> {
    if matches!(config.dark_mode, DarkMode::Class(_)) {
        vec![
            &SUPPORTS,
            &REDUCED_MOTION,
            &CONTRAST,
            &DARK,
            &SCREENS,
            &ORIENTATION,
            &DIRECTION,
            &FORCED_COLORS,
            &PRINT,
        ]
    } else {
        vec![
            &SUPPORTS,
            &REDUCED_MOTION,
            &CONTRAST,
            &SCREENS,
            &ORIENTATION,
            &DIRECTION,
            &DARK,
            &FORCED_COLORS,
            &PRINT,
        ]
    }
}

/// 删除透明度变量声明，并去掉颜色里对它们的引用
fn remove_alpha_variables(api: &mut VariantApi, variables: &[&str]) {
    for node in api.container_mut() {
        remove_alpha_in(node, variables);
    }
}

fn remove_alpha_in(node: &mut Node, variables: &[&str]) {
    let Some(children) = node.children_mut() else { return };
    children.retain(|child| !matches!(child, Node::Decl(decl) if variables.contains(&decl.prop.as_str())));
    for child in children {
        match child {
            Node::Decl(decl) => decl.value = remove_alpha_variable(&decl.value, variables),
            other => remove_alpha_in(other, variables),
        }
    }
}

fn child_variant(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("*", &["& > *"])
}

fn with_content(api: &mut VariantApi) {
    walk_rules_mut(api.container_mut(), &mut |rule| {
        let has_content = rule
            .nodes
            .iter()
            .any(|node| matches!(node, Node::Decl(decl) if decl.prop == "content"));
        if !has_content {
            rule.nodes.insert(0, Node::decl("content", "var(--tw-content)"));
        }
    });
}

fn pseudo_element_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("first-letter", &["&::first-letter"])?;
    api.add_variant("first-line", &["&::first-line"])?;

    let marker: Vec<VariantFn> = ["& *::marker", "&::marker"]
        .into_iter()
        .map(|format| -> VariantFn {
            Arc::new(move |api: &mut VariantApi| {
                remove_alpha_variables(api, &["--tw-text-opacity"]);
                Ok(VariantOutput::Format(format.to_string()))
            })
        })
        .collect();
    api.add_variant_fns("marker", marker, VariantOptions::default());

    api.add_variant("selection", &["& *::selection", "&::selection"])?;
    api.add_variant("file", &["&::file-selector-button"])?;
    api.add_variant("placeholder", &["&::placeholder"])?;
    api.add_variant("backdrop", &["&::backdrop"])?;

    for (name, format) in [("before", "&::before"), ("after", "&::after")] {
        api.add_variant_fn(
            name,
            move |api| {
                with_content(api);
                Ok(VariantOutput::Format(format.to_string()))
            },
            VariantOptions::default(),
        );
    }
    Ok(())
}

/// `(变体名, 格式)`
fn pseudo_variants(hover_only_when_supported: bool) -> Vec<(&'static str, String)> {
    let mut variants: Vec<(&'static str, String)> = vec![
        ("first", "&:first-child".into()),
        ("last", "&:last-child".into()),
        ("only", "&:only-child".into()),
        ("odd", "&:nth-child(odd)".into()),
        ("even", "&:nth-child(even)".into()),
    ];
    variants.extend(["first-of-type", "last-of-type", "only-of-type"].map(|p| (p, format!("&:{p}"))));
    variants.push(("visited", VISITED.into()));
    variants.push(("target", "&:target".into()));
    variants.push(("open", "&[open]".into()));
    variants.extend(
        [
            "default",
            "checked",
            "indeterminate",
            "placeholder-shown",
            "autofill",
            "optional",
            "required",
            "valid",
            "invalid",
            "in-range",
            "out-of-range",
            "read-only",
            "empty",
            "focus-within",
        ]
        .map(|p| (p, format!("&:{p}"))),
    );
    let hover = if hover_only_when_supported {
        "@media (hover: hover) and (pointer: fine) { &:hover }"
    } else {
        "&:hover"
    };
    variants.push(("hover", hover.into()));
    variants.extend(["focus", "focus-visible", "active", "enabled", "disabled"].map(|p| (p, format!("&:{p}"))));
    variants
}

fn pseudo_class_variants(api: &mut PluginApi<'_>) -> Result<()> {
    let variants = pseudo_variants(api.config().features.hover_only_when_supported);

    for (name, format) in &variants {
        if format == VISITED {
            api.add_variant_fn(
                name,
                |api| {
                    remove_alpha_variables(api, VISITED_ALPHA);
                    Ok(VariantOutput::Format(VISITED.to_string()))
                },
                VariantOptions::default(),
            );
        } else {
            api.add_variant(name, &[format.as_str()])?;
        }
    }

    let values: IndexMap<String, String> = variants
        .into_iter()
        .map(|(name, format)| (name.to_string(), format))
        .collect();

    for (name, combinator) in [("group", " &"), ("peer", " ~ &")] {
        let class = api.prefix(&format!(".{name}"));
        api.match_variant(
            name,
            move |value, api| {
                if value == VISITED {
                    remove_alpha_variables(api, VISITED_ALPHA);
                }
                let merge = match &api.args.modifier {
                    Some(modifier) => format!(":merge({class}\\/{})", crosswind_css::escape_class_name(modifier)),
                    None => format!(":merge({class})"),
                };
                Ok(VariantOutput::Format(splice_merge(value, &merge, combinator)))
            },
            MatchVariantOptions::default().values(values.clone()).respect_prefix(false),
        );
    }
    Ok(())
}

/// 把 `&` 换成 `:merge(.group)...` + 原伪类 + ` &`
///
/// `&:hover` → `:merge(.group):hover &`；
/// `@media (hover: hover) { &:hover }` → `@media (hover: hover) { :merge(.group):hover & }`
fn splice_merge(value: &str, merge: &str, combinator: &str) -> String {
    let mut result = normalize(value, None);
    if !result.contains('&') {
        result = format!("&{result}");
    }

    let mut start = None;
    let mut end = None;
    let mut quotes = 0;
    for (i, c) in result.char_indices() {
        match c {
            '&' => start = Some(i),
            '\'' | '"' => quotes += 1,
            ' ' if start.is_some() && quotes == 0 => end = Some(i),
            _ => {}
        }
    }

    let Some(start) = start else { return result };
    let end = end.unwrap_or(result.len());
    format!(
        "{}{merge}{}{combinator}{}",
        &result[..start],
        &result[start + 1..end],
        &result[end..]
    )
}

fn has_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.match_variant(
        "has",
        |value, _| Ok(VariantOutput::Format(format!("&:has({})", normalize(value, None)))),
        MatchVariantOptions::default().respect_prefix(false),
    );

    for (name, combinator) in [("group-has", " &"), ("peer-has", " ~ &")] {
        let class = api.prefix(if name == "group-has" { ".group" } else { ".peer" });
        api.match_variant(
            name,
            move |value, api| {
                let merge = match &api.args.modifier {
                    Some(modifier) => format!(":merge({class}\\/{modifier})"),
                    None => format!(":merge({class})"),
                };
                Ok(VariantOutput::Format(format!(
                    "{merge}:has({}){combinator}",
                    normalize(value, None)
                )))
            },
            MatchVariantOptions::default().respect_prefix(false),
        );
    }
    Ok(())
}

/// 属性选择器的值加引号：`checked=true` → `checked="true"`
fn normalize_attribute_selector(value: &str) -> String {
    let Some(eq) = value.find('=') else {
        return value.to_string();
    };
    let (name, rest) = value.split_at(eq);
    let raw = &rest[1..];
    if raw.starts_with('\'') || raw.starts_with('"') {
        return value.to_string();
    }

    if raw.len() > 2 {
        let bytes = raw.as_bytes();
        let flag = bytes[bytes.len() - 1];
        if bytes[bytes.len() - 2] == b' ' && matches!(flag, b'i' | b'I' | b's' | b'S') {
            return format!("{name}=\"{}\" {}", &raw[..raw.len() - 2], flag as char);
        }
    }
    format!("{name}=\"{raw}\"")
}

fn string_values(api: &PluginApi<'_>, path: &str) -> IndexMap<String, String> {
    api.theme_map(path)
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            _ => None,
        })
        .collect()
}

/// `aria-*` / `data-*` 及其 `group-`、`peer-` 版本
fn attribute_variants(api: &mut PluginApi<'_>, attribute: &'static str) {
    let values = string_values(api, attribute);

    api.match_variant(
        attribute,
        move |value, _| {
            let selector = normalize_attribute_selector(&normalize(value, None));
            Ok(VariantOutput::Format(format!("&[{attribute}-{selector}]")))
        },
        MatchVariantOptions::default().values(values.clone()),
    );

    for (prefix, combinator) in [("group", " &"), ("peer", " ~ &")] {
        api.match_variant(
            &format!("{prefix}-{attribute}"),
            move |value, api| {
                let selector = normalize_attribute_selector(&normalize(value, None));
                let merge = match &api.args.modifier {
                    Some(modifier) => format!(":merge(.{prefix}\\/{modifier})"),
                    None => format!(":merge(.{prefix})"),
                };
                Ok(VariantOutput::Format(format!("{merge}[{attribute}-{selector}]{combinator}")))
            },
            MatchVariantOptions::default().values(values.clone()),
        );
    }
}

fn aria_variants(api: &mut PluginApi<'_>) -> Result<()> {
    attribute_variants(api, "aria");
    Ok(())
}

fn data_variants(api: &mut PluginApi<'_>) -> Result<()> {
    attribute_variants(api, "data");
    Ok(())
}

fn supports_variants(api: &mut PluginApi<'_>) -> Result<()> {
    let values = string_values(api, "supports");
    api.match_variant(
        "supports",
        |value, _| {
            let check = normalize(value, None);
            if RAW_SUPPORTS.is_match(&check) {
                let check = SUPPORTS_KEYWORDS.replace_all(&check, " $1 ");
                return Ok(VariantOutput::Format(format!("@supports {check}")));
            }
            let mut check = if check.contains(':') {
                check
            } else {
                format!("{check}: var(--tw)")
            };
            if !(check.starts_with('(') && check.ends_with(')')) {
                check = format!("({check})");
            }
            Ok(VariantOutput::Format(format!("@supports {check}")))
        },
        MatchVariantOptions::default().values(values),
    );
    Ok(())
}

fn reduced_motion_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("motion-safe", &["@media (prefers-reduced-motion: no-preference)"])?;
    api.add_variant("motion-reduce", &["@media (prefers-reduced-motion: reduce)"])
}

fn prefers_contrast_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("contrast-more", &["@media (prefers-contrast: more)"])?;
    api.add_variant("contrast-less", &["@media (prefers-contrast: less)"])
}

/// `640px` → `px`；无单位时为 `(none)`
fn unit_of(value: &str) -> String {
    TRAILING_UNIT
        .captures(value)
        .and_then(|c| c.get(1))
        .map_or_else(|| "(none)".to_string(), |m| m.as_str().to_string())
}

fn screen_sort(ascending: bool) -> SortFn {
    Arc::new(move |a: &SortArgs, z: &SortArgs| {
        let (a, z) = (leading_number(&a.value), leading_number(&z.value));
        let order = a.total_cmp(&z);
        if ascending {
            order
        } else {
            order.reverse()
        }
    })
}

fn screen_variants(api: &mut PluginApi<'_>) -> Result<()> {
    let screens = string_values(api, "screens");
    let all_simple = api
        .theme_map("screens")
        .values()
        .all(Value::is_string);

    let mut units: Vec<String> = screens.values().map(|v| unit_of(v)).collect();
    units.sort();
    units.dedup();
    let consistent_units = units.len() <= 1;
    let unit = units.first().cloned();

    let min_sort = screen_sort(true);
    let max_sort = screen_sort(false);

    let build = move |kind: &'static str| {
        let unit = unit.clone();
        move |value: &str, api: &mut VariantApi| -> Result<VariantOutput> {
            if !all_simple {
                api.warn(
                    "complex-screen-config",
                    vec![
                        "The `min-*` and `max-*` variants are not supported with a `screens` configuration containing objects."
                            .to_string(),
                    ],
                );
                return Ok(VariantOutput::Drop);
            }
            let mixed = !consistent_units || unit.as_ref().is_some_and(|u| *u != unit_of(value));
            if mixed {
                api.warn(
                    "minmax-have-mixed-units",
                    vec![
                        "The `min-*` and `max-*` variants are not supported with a `screens` configuration containing mixed units."
                            .to_string(),
                    ],
                );
                return Ok(VariantOutput::Drop);
            }
            Ok(VariantOutput::Format(format!("@media ({kind}-width: {value})")))
        }
    };

    for (name, min) in &screens {
        api.add_variant_with(
            &format!("max-{name}"),
            &[format!("@media not all and (min-width: {min})").as_str()],
            VariantOptions::new().id("max-screens").sort(max_sort.clone()).value(min.clone()),
        )?;
    }
    api.match_variant(
        "max",
        build("max"),
        MatchVariantOptions::default().id("max-screens").sort(max_sort),
    );

    let sortable = all_simple && consistent_units;
    for (name, min) in &screens {
        let mut options = VariantOptions::new().id("min-screens").value(min.clone());
        if sortable {
            options = options.sort(min_sort.clone());
        }
        api.add_variant_with(name, &[format!("@media (min-width: {min})").as_str()], options)?;
    }
    api.match_variant(
        "min",
        build("min"),
        MatchVariantOptions::default().id("min-screens").sort(min_sort),
    );
    Ok(())
}

fn orientation_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("portrait", &["@media (orientation: portrait)"])?;
    api.add_variant("landscape", &["@media (orientation: landscape)"])
}

fn direction_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("ltr", &["&:where([dir=\"ltr\"], [dir=\"ltr\"] *)"])?;
    api.add_variant("rtl", &["&:where([dir=\"rtl\"], [dir=\"rtl\"] *)"])
}

fn dark_variants(api: &mut PluginApi<'_>) -> Result<()> {
    match api.config().dark_mode.clone() {
        DarkMode::Media => api.add_variant("dark", &["@media (prefers-color-scheme: dark)"]),
        DarkMode::Class(class) => api.add_variant("dark", &[format!(":is({class} &)").as_str()]),
        DarkMode::Disabled => {
            api.add_variant_fn("dark", |_| Ok(VariantOutput::Drop), VariantOptions::default());
            Ok(())
        }
    }
}

fn forced_colors_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("forced-colors", &["@media (forced-colors: active)"])
}

fn print_variant(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("print", &["@media print"])
}
