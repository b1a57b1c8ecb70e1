//! Built-in utilities.
//!
//! Registration order here is the order utilities sort in within their
//! layer, so the list mirrors the usual cascade: resets and layout first,
//! spacing and sizing next, then typography and effects.

use super::{css_value, utility, CorePlugin, PluginApi, UtilityFn};
use crate::color::with_alpha_variable;
use crate::error::Result;
use crate::value::{DataType, Modifiers, TypeSpec, UtilityOptions};
use crosswind_core::theme::to_css_string;
use crosswind_css::{parse_stylesheet, Styles};
use indexmap::IndexMap;
use serde_json::Value;

const PREFLIGHT: &str = include_str!("preflight.css");

/// `(类名前缀, 属性)`：同一组共用一次 `match_utilities`
type PropertyGroup = &'static [(&'static str, &'static [&'static str])];

/// 单条声明的静态工具类：`(类名, 属性, 值)`
type StaticUtility = (&'static str, &'static str, &'static str);

pub(crate) static CORE_PLUGINS: &[CorePlugin] = &[
    CorePlugin { name: "preflight", register: preflight },
    CorePlugin { name: "container", register: container },
    CorePlugin { name: "accessibility", register: accessibility },
    CorePlugin { name: "pointerEvents", register: pointer_events },
    CorePlugin { name: "visibility", register: visibility },
    CorePlugin { name: "position", register: position },
    CorePlugin { name: "inset", register: inset },
    CorePlugin { name: "zIndex", register: z_index },
    CorePlugin { name: "margin", register: margin },
    CorePlugin { name: "display", register: display },
    CorePlugin { name: "height", register: height },
    CorePlugin { name: "width", register: width },
    CorePlugin { name: "space", register: space },
    CorePlugin { name: "borderRadius", register: border_radius },
    CorePlugin { name: "borderWidth", register: border_width },
    CorePlugin { name: "borderColor", register: border_color },
    CorePlugin { name: "backgroundColor", register: background_color },
    CorePlugin { name: "backgroundImage", register: background_image },
    CorePlugin { name: "backgroundSize", register: background_size },
    CorePlugin { name: "backgroundPosition", register: background_position },
    CorePlugin { name: "padding", register: padding },
    CorePlugin { name: "textAlign", register: text_align },
    CorePlugin { name: "fontFamily", register: font_family },
    CorePlugin { name: "fontSize", register: font_size },
    CorePlugin { name: "fontWeight", register: font_weight },
    CorePlugin { name: "textColor", register: text_color },
    CorePlugin { name: "textDecoration", register: text_decoration },
    CorePlugin { name: "placeholderColor", register: placeholder_color },
    CorePlugin { name: "opacity", register: opacity },
    CorePlugin { name: "transitionProperty", register: transition_property },
    CorePlugin { name: "content", register: content },
];

/// 把值写入若干属性
fn properties(properties: &'static [&'static str]) -> UtilityFn {
    utility(move |value, _| {
        let value = css_value(value);
        Ok(properties
            .iter()
            .fold(Styles::new(), |styles, prop| styles.decl(prop, value.clone())))
    })
}

/// 按主题键注册属性型工具类，每组一次 `match_utilities`
fn property_utilities(api: &mut PluginApi<'_>, theme_key: &str, groups: &[PropertyGroup], options: UtilityOptions) {
    let values = api.theme_map(theme_key);
    for group in groups {
        let utilities = group.iter().map(|(class, props)| (*class, properties(*props)));
        api.match_utilities(utilities, options.clone().values(values.clone()));
    }
}

fn static_utilities(api: &mut PluginApi<'_>, utilities: &[StaticUtility]) {
    let styles = utilities.iter().fold(Styles::new(), |styles, (class, prop, value)| {
        styles.nest(format!(".{class}"), Styles::new().decl(prop, *value))
    });
    api.add_utilities(styles, UtilityOptions::new());
}

/// 带 `--tw-*-opacity` 变量的颜色工具类
fn color_utility(property: &'static str, variable: &'static str) -> UtilityFn {
    utility(move |value, _| Ok(color_decls(&css_value(value), property, variable)))
}

fn color_decls(color: &str, property: &str, variable: &str) -> Styles {
    with_alpha_variable(color, property, variable)
        .into_iter()
        .fold(Styles::new(), |styles, (prop, value)| styles.decl(&prop, value))
}

fn color_options(colors: IndexMap<String, Value>) -> UtilityOptions {
    UtilityOptions::new()
        .types([DataType::Color, DataType::Any])
        .values(colors)
}

fn preflight(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_base(parse_stylesheet(PREFLIGHT)?);
    Ok(())
}

fn container(api: &mut PluginApi<'_>) -> Result<()> {
    let screens = api
        .theme("container.screens")
        .or_else(|| api.theme("screens"))
        .cloned()
        .unwrap_or(Value::Null);
    let center = api.theme("container.center").and_then(Value::as_bool).unwrap_or(false);
    let padding = api.theme_value("container.padding");

    let mut min_widths: Vec<String> = Vec::new();
    if let Value::Object(map) = &screens {
        for value in map.values() {
            let min = match value {
                Value::String(min) => Some(min.clone()),
                Value::Object(range) => range.get("min").and_then(Value::as_str).map(str::to_string),
                _ => None,
            };
            if let Some(min) = min.filter(|m| !min_widths.contains(m)) {
                min_widths.push(min);
            }
        }
    }
    min_widths.sort_by(|a, b| leading_number(a).total_cmp(&leading_number(b)));

    let mut base = Styles::new().decl("width", "100%");
    if center {
        base = base.decl("marginRight", "auto").decl("marginLeft", "auto");
    }
    if let Some(padding) = &padding {
        base = base.decl("paddingRight", padding.clone()).decl("paddingLeft", padding.clone());
    }

    let mut styles = Styles::new().nest(".container", base);
    for min in min_widths {
        styles = styles.nest(
            format!("@media (min-width: {min})"),
            Styles::new().nest(".container", Styles::new().decl("maxWidth", min.clone())),
        );
    }
    api.add_components(styles, UtilityOptions::new());
    Ok(())
}

/// `640px` → 640
pub(crate) fn leading_number(value: &str) -> f64 {
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    value[..end].parse().unwrap_or(0.0)
}

fn accessibility(api: &mut PluginApi<'_>) -> Result<()> {
    let sr_only = Styles::new()
        .decl("position", "absolute")
        .decl("width", "1px")
        .decl("height", "1px")
        .decl("padding", "0")
        .decl("margin", "-1px")
        .decl("overflow", "hidden")
        .decl("clip", "rect(0, 0, 0, 0)")
        .decl("whiteSpace", "nowrap")
        .decl("borderWidth", "0");
    let not_sr_only = Styles::new()
        .decl("position", "static")
        .decl("width", "auto")
        .decl("height", "auto")
        .decl("padding", "0")
        .decl("margin", "0")
        .decl("overflow", "visible")
        .decl("clip", "auto")
        .decl("whiteSpace", "normal");
    api.add_utilities(
        Styles::new().nest(".sr-only", sr_only).nest(".not-sr-only", not_sr_only),
        UtilityOptions::new(),
    );
    Ok(())
}

fn pointer_events(api: &mut PluginApi<'_>) -> Result<()> {
    static_utilities(
        api,
        &[
            ("pointer-events-none", "pointerEvents", "none"),
            ("pointer-events-auto", "pointerEvents", "auto"),
        ],
    );
    Ok(())
}

fn visibility(api: &mut PluginApi<'_>) -> Result<()> {
    static_utilities(
        api,
        &[
            ("visible", "visibility", "visible"),
            ("invisible", "visibility", "hidden"),
            ("collapse", "visibility", "collapse"),
        ],
    );
    Ok(())
}

fn position(api: &mut PluginApi<'_>) -> Result<()> {
    static_utilities(
        api,
        &[
            ("static", "position", "static"),
            ("fixed", "position", "fixed"),
            ("absolute", "position", "absolute"),
            ("relative", "position", "relative"),
            ("sticky", "position", "sticky"),
        ],
    );
    Ok(())
}

fn inset(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "inset",
        &[
            &[("inset", &["inset"])],
            &[("inset-x", &["left", "right"]), ("inset-y", &["top", "bottom"])],
            &[
                ("start", &["inset-inline-start"]),
                ("end", &["inset-inline-end"]),
                ("top", &["top"]),
                ("right", &["right"]),
                ("bottom", &["bottom"]),
                ("left", &["left"]),
            ],
        ],
        UtilityOptions::new().negative(),
    );
    Ok(())
}

fn z_index(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(api, "zIndex", &[&[("z", &["z-index"])]], UtilityOptions::new().negative());
    Ok(())
}

fn margin(api: &mut PluginApi<'_>) -> Result<()> {
    let mut values = api.theme_map("spacing");
    values.insert("auto".to_string(), Value::String("auto".to_string()));
    let options = UtilityOptions::new().negative().values(values);
    for group in MARGIN {
        let utilities = group.iter().map(|(class, props)| (*class, properties(*props)));
        api.match_utilities(utilities, options.clone());
    }
    Ok(())
}

static MARGIN: &[PropertyGroup] = &[
    &[("m", &["margin"])],
    &[("mx", &["margin-left", "margin-right"]), ("my", &["margin-top", "margin-bottom"])],
    &[
        ("ms", &["margin-inline-start"]),
        ("me", &["margin-inline-end"]),
        ("mt", &["margin-top"]),
        ("mr", &["margin-right"]),
        ("mb", &["margin-bottom"]),
        ("ml", &["margin-left"]),
    ],
];

fn display(api: &mut PluginApi<'_>) -> Result<()> {
    static_utilities(
        api,
        &[
            ("block", "display", "block"),
            ("inline-block", "display", "inline-block"),
            ("inline", "display", "inline"),
            ("flex", "display", "flex"),
            ("inline-flex", "display", "inline-flex"),
            ("table", "display", "table"),
            ("inline-table", "display", "inline-table"),
            ("table-caption", "display", "table-caption"),
            ("table-cell", "display", "table-cell"),
            ("table-column", "display", "table-column"),
            ("table-column-group", "display", "table-column-group"),
            ("table-footer-group", "display", "table-footer-group"),
            ("table-header-group", "display", "table-header-group"),
            ("table-row-group", "display", "table-row-group"),
            ("table-row", "display", "table-row"),
            ("flow-root", "display", "flow-root"),
            ("grid", "display", "grid"),
            ("inline-grid", "display", "inline-grid"),
            ("contents", "display", "contents"),
            ("list-item", "display", "list-item"),
            ("hidden", "display", "none"),
        ],
    );
    Ok(())
}

fn height(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(api, "height", &[&[("h", &["height"])]], UtilityOptions::new());
    Ok(())
}

fn width(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(api, "width", &[&[("w", &["width"])]], UtilityOptions::new());
    Ok(())
}

const SPACE_SIBLINGS: &str = "& > :not([hidden]) ~ :not([hidden])";

fn space(api: &mut PluginApi<'_>) -> Result<()> {
    let space_x = utility(|value, _| {
        let value = zero_px(css_value(value));
        Ok(Styles::new().nest(
            SPACE_SIBLINGS,
            Styles::new()
                .decl("--tw-space-x-reverse", "0")
                .decl("marginRight", format!("calc({value} * var(--tw-space-x-reverse))"))
                .decl("marginLeft", format!("calc({value} * calc(1 - var(--tw-space-x-reverse)))")),
        ))
    });
    let space_y = utility(|value, _| {
        let value = zero_px(css_value(value));
        Ok(Styles::new().nest(
            SPACE_SIBLINGS,
            Styles::new()
                .decl("--tw-space-y-reverse", "0")
                .decl("marginTop", format!("calc({value} * calc(1 - var(--tw-space-y-reverse)))"))
                .decl("marginBottom", format!("calc({value} * var(--tw-space-y-reverse))")),
        ))
    });
    let values = api.theme_map("spacing");
    api.match_utilities(
        [("space-x", space_x), ("space-y", space_y)],
        UtilityOptions::new().values(values).negative(),
    );

    api.add_utilities(
        Styles::new()
            .nest(
                ".space-y-reverse > :not([hidden]) ~ :not([hidden])",
                Styles::new().decl("--tw-space-y-reverse", "1"),
            )
            .nest(
                ".space-x-reverse > :not([hidden]) ~ :not([hidden])",
                Styles::new().decl("--tw-space-x-reverse", "1"),
            ),
        UtilityOptions::new(),
    );
    Ok(())
}

fn zero_px(value: String) -> String {
    if value == "0" {
        "0px".to_string()
    } else {
        value
    }
}

fn border_radius(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "borderRadius",
        &[
            &[("rounded", &["border-radius"])],
            &[
                ("rounded-s", &["border-start-start-radius", "border-end-start-radius"]),
                ("rounded-e", &["border-start-end-radius", "border-end-end-radius"]),
                ("rounded-t", &["border-top-left-radius", "border-top-right-radius"]),
                ("rounded-r", &["border-top-right-radius", "border-bottom-right-radius"]),
                ("rounded-b", &["border-bottom-right-radius", "border-bottom-left-radius"]),
                ("rounded-l", &["border-top-left-radius", "border-bottom-left-radius"]),
            ],
            &[
                ("rounded-tl", &["border-top-left-radius"]),
                ("rounded-tr", &["border-top-right-radius"]),
                ("rounded-br", &["border-bottom-right-radius"]),
                ("rounded-bl", &["border-bottom-left-radius"]),
            ],
        ],
        UtilityOptions::new(),
    );
    Ok(())
}

static BORDER_SIDES: &[PropertyGroup] = &[
    &[("border", &["border-width"])],
    &[
        ("border-x", &["border-left-width", "border-right-width"]),
        ("border-y", &["border-top-width", "border-bottom-width"]),
    ],
    &[
        ("border-s", &["border-inline-start-width"]),
        ("border-e", &["border-inline-end-width"]),
        ("border-t", &["border-top-width"]),
        ("border-r", &["border-right-width"]),
        ("border-b", &["border-bottom-width"]),
        ("border-l", &["border-left-width"]),
    ],
];

fn border_width(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "borderWidth",
        BORDER_SIDES,
        UtilityOptions::new().types([DataType::LineWidth, DataType::Length]),
    );
    Ok(())
}

fn border_color(api: &mut PluginApi<'_>) -> Result<()> {
    let mut colors = api.theme_colors("colors");
    colors.shift_remove("DEFAULT");

    let groups: [&[(&str, &'static str)]; 3] = [
        &[("border", "border-color")],
        &[("border-x", "border-inline-color"), ("border-y", "border-block-color")],
        &[
            ("border-s", "border-inline-start-color"),
            ("border-e", "border-inline-end-color"),
            ("border-t", "border-top-color"),
            ("border-r", "border-right-color"),
            ("border-b", "border-bottom-color"),
            ("border-l", "border-left-color"),
        ],
    ];
    for group in groups {
        let utilities = group
            .iter()
            .map(|(class, property)| (*class, color_utility(property, "--tw-border-opacity")));
        api.match_utilities(utilities, color_options(colors.clone()));
    }
    Ok(())
}

fn background_color(api: &mut PluginApi<'_>) -> Result<()> {
    let colors = api.theme_colors("colors");
    api.match_utilities(
        [("bg", color_utility("background-color", "--tw-bg-opacity"))],
        color_options(colors),
    );
    Ok(())
}

fn background_image(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "backgroundImage",
        &[&[("bg", &["background-image"])]],
        UtilityOptions::new().types([DataType::Lookup, DataType::Image, DataType::Url]),
    );
    Ok(())
}

fn background_size(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "backgroundSize",
        &[&[("bg", &["background-size"])]],
        UtilityOptions::new().types([DataType::Lookup, DataType::Length, DataType::Percentage, DataType::Size]),
    );
    Ok(())
}

fn background_position(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "backgroundPosition",
        &[&[("bg", &["background-position"])]],
        UtilityOptions::new().types([TypeSpec::from(DataType::Lookup), TypeSpec::preferred(DataType::Position)]),
    );
    Ok(())
}

fn padding(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "spacing",
        &[
            &[("p", &["padding"])],
            &[("px", &["padding-left", "padding-right"]), ("py", &["padding-top", "padding-bottom"])],
            &[
                ("ps", &["padding-inline-start"]),
                ("pe", &["padding-inline-end"]),
                ("pt", &["padding-top"]),
                ("pr", &["padding-right"]),
                ("pb", &["padding-bottom"]),
                ("pl", &["padding-left"]),
            ],
        ],
        UtilityOptions::new(),
    );
    Ok(())
}

fn text_align(api: &mut PluginApi<'_>) -> Result<()> {
    static_utilities(
        api,
        &[
            ("text-left", "textAlign", "left"),
            ("text-center", "textAlign", "center"),
            ("text-right", "textAlign", "right"),
            ("text-justify", "textAlign", "justify"),
            ("text-start", "textAlign", "start"),
            ("text-end", "textAlign", "end"),
        ],
    );
    Ok(())
}

fn font_family(api: &mut PluginApi<'_>) -> Result<()> {
    let font = utility(|value, _| {
        let (families, options) = split_tuple(value);
        let mut styles = Styles::new().decl("fontFamily", css_value(families));
        if let Some(settings) = options.and_then(|o| o.get("fontFeatureSettings")).and_then(Value::as_str) {
            styles = styles.decl("fontFeatureSettings", settings);
        }
        if let Some(settings) = options.and_then(|o| o.get("fontVariationSettings")).and_then(Value::as_str) {
            styles = styles.decl("fontVariationSettings", settings);
        }
        Ok(styles)
    });
    let values = api.theme_map("fontFamily");
    api.match_utilities(
        [("font", font)],
        UtilityOptions::new()
            .types([DataType::Lookup, DataType::GenericName, DataType::FamilyName])
            .values(values),
    );
    Ok(())
}

/// `[value, { ...options }]` 元组
fn split_tuple(value: &Value) -> (&Value, Option<&serde_json::Map<String, Value>>) {
    match value {
        Value::Array(items) if items.len() == 2 && items[1].is_object() => (&items[0], items[1].as_object()),
        _ => (value, None),
    }
}

fn font_size(api: &mut PluginApi<'_>) -> Result<()> {
    let text = utility(|value, extras| {
        let (size, line_height, options) = match value {
            Value::Array(items) if items.len() == 2 => match &items[1] {
                Value::Object(options) => (
                    &items[0],
                    options.get("lineHeight").and_then(to_css_string),
                    Some(options),
                ),
                other => (&items[0], to_css_string(other), None),
            },
            _ => (value, None, None),
        };

        let styles = Styles::new().decl("fontSize", css_value(size));
        if let Some(modifier) = &extras.modifier {
            return Ok(styles.decl("lineHeight", modifier.clone()));
        }

        let mut styles = match line_height {
            Some(line_height) => styles.decl("lineHeight", line_height),
            None => styles,
        };
        for key in ["letterSpacing", "fontWeight"] {
            if let Some(extra) = options.and_then(|o| o.get(key)).and_then(to_css_string) {
                styles = styles.decl(key, extra);
            }
        }
        Ok(styles)
    });

    let values = api.theme_map("fontSize");
    let line_heights = api
        .theme_map("lineHeight")
        .into_iter()
        .filter_map(|(key, value)| Some((key, to_css_string(&value)?)))
        .collect();
    api.match_utilities(
        [("text", text)],
        UtilityOptions::new()
            .types([DataType::AbsoluteSize, DataType::RelativeSize, DataType::Length, DataType::Percentage])
            .values(values)
            .modifiers(Modifiers::Map(line_heights)),
    );
    Ok(())
}

fn font_weight(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(
        api,
        "fontWeight",
        &[&[("font", &["font-weight"])]],
        UtilityOptions::new().types([DataType::Lookup, DataType::Number, DataType::Any]),
    );
    Ok(())
}

fn text_color(api: &mut PluginApi<'_>) -> Result<()> {
    let colors = api.theme_colors("colors");
    api.match_utilities([("text", color_utility("color", "--tw-text-opacity"))], color_options(colors));
    Ok(())
}

fn text_decoration(api: &mut PluginApi<'_>) -> Result<()> {
    static_utilities(
        api,
        &[
            ("underline", "textDecorationLine", "underline"),
            ("overline", "textDecorationLine", "overline"),
            ("line-through", "textDecorationLine", "line-through"),
            ("no-underline", "textDecorationLine", "none"),
        ],
    );
    Ok(())
}

fn placeholder_color(api: &mut PluginApi<'_>) -> Result<()> {
    let placeholder = utility(|value, _| {
        Ok(Styles::new().nest(
            "&::placeholder",
            color_decls(&css_value(value), "color", "--tw-placeholder-opacity"),
        ))
    });
    let colors = api.theme_colors("colors");
    api.match_utilities([("placeholder", placeholder)], color_options(colors));
    Ok(())
}

fn opacity(api: &mut PluginApi<'_>) -> Result<()> {
    property_utilities(api, "opacity", &[&[("opacity", &["opacity"])]], UtilityOptions::new());
    Ok(())
}

const DEFAULT_TIMING_FUNCTION: &str = "cubic-bezier(0.4, 0, 0.2, 1)";
const DEFAULT_DURATION: &str = "150ms";

fn transition_property(api: &mut PluginApi<'_>) -> Result<()> {
    let timing = api
        .theme_value("transitionTimingFunction.DEFAULT")
        .unwrap_or_else(|| DEFAULT_TIMING_FUNCTION.to_string());
    let duration = api
        .theme_value("transitionDuration.DEFAULT")
        .unwrap_or_else(|| DEFAULT_DURATION.to_string());

    let transition = utility(move |value, _| {
        let value = css_value(value);
        let styles = Styles::new().decl("transitionProperty", value.clone());
        if value == "none" {
            return Ok(styles);
        }
        Ok(styles
            .decl("transitionTimingFunction", timing.clone())
            .decl("transitionDuration", duration.clone()))
    });
    let values = api.theme_map("transitionProperty");
    api.match_utilities([("transition", transition)], UtilityOptions::new().values(values));
    Ok(())
}

fn content(api: &mut PluginApi<'_>) -> Result<()> {
    let content = utility(|value, _| {
        Ok(Styles::new()
            .decl("--tw-content", css_value(value))
            .decl("content", "var(--tw-content)"))
    });
    let values = api.theme_map("content");
    api.match_utilities([("content", content)], UtilityOptions::new().values(values));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{register_plugins, ClassListEntry, RuleTemplate, UtilityExtras};
    use crosswind_core::Config;
    use crosswind_css::emit_css;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet;

    fn run(identifier: &str, value: Value, modifier: Option<&str>) -> String {
        let registry = register_plugins(&Config::default(), &[]).unwrap();
        let rule = registry.candidate_rules[identifier]
            .iter()
            .find(|rule| matches!(rule.template, RuleTemplate::Dynamic { .. }))
            .unwrap();
        let RuleTemplate::Dynamic { func, .. } = &rule.template else { unreachable!() };
        let extras = UtilityExtras {
            modifier: modifier.map(str::to_string),
        };
        emit_css(&func(&value, &extras).unwrap().into_rules(".x"))
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("640px"), 640.0);
        assert_eq!(leading_number("48.5rem"), 48.5);
        assert_eq!(leading_number("abc"), 0.0);
    }

    #[test]
    fn test_font_size_tuple() {
        assert_eq!(
            run("text", json!(["1.125rem", { "lineHeight": "1.75rem", "letterSpacing": "-0.01em" }]), None),
            ".x {\n  font-size: 1.125rem;\n  line-height: 1.75rem;\n  letter-spacing: -0.01em;\n}\n"
        );
        assert_eq!(
            run("text", json!(["1.125rem", { "lineHeight": "1.75rem" }]), Some("2rem")),
            ".x {\n  font-size: 1.125rem;\n  line-height: 2rem;\n}\n"
        );
        assert_eq!(run("text", json!(["2rem", "3rem"]), None), ".x {\n  font-size: 2rem;\n  line-height: 3rem;\n}\n");
    }

    #[test]
    fn test_space_between_zero() {
        assert_eq!(
            run("space-x", json!("0"), None),
            ".x > :not([hidden]) ~ :not([hidden]) {\n  --tw-space-x-reverse: 0;\n  margin-right: calc(0px * var(--tw-space-x-reverse));\n  margin-left: calc(0px * calc(1 - var(--tw-space-x-reverse)));\n}\n"
        );
    }

    #[test]
    fn test_font_family_joins_stack() {
        assert_eq!(
            run("font", json!([["Inter", "sans-serif"], { "fontFeatureSettings": "\"cv11\"" }]), None),
            ".x {\n  font-family: Inter, sans-serif;\n  font-feature-settings: \"cv11\";\n}\n"
        );
    }

    #[test]
    fn test_container_breakpoints() {
        let registry = register_plugins(&Config::default(), &[]).unwrap();
        let rules = &registry.candidate_rules["container"];
        assert_eq!(rules.len(), 6);
        assert!(rules.windows(2).all(|w| w[0].offset.index < w[1].offset.index));
    }

    #[test]
    fn test_static_class_list_has_no_duplicates() {
        let registry = register_plugins(&Config::default(), &[]).unwrap();
        let statics: Vec<&String> = registry
            .class_list
            .iter()
            .filter_map(|entry| match entry {
                ClassListEntry::Class(class) => Some(class),
                ClassListEntry::Dynamic(..) => None,
            })
            .collect();
        let unique: HashSet<&String> = statics.iter().copied().collect();
        assert_eq!(statics.len(), unique.len());
        assert!(statics.iter().any(|c| *c == "sr-only"));
        assert!(statics.iter().any(|c| *c == "space-x-reverse"));
    }
}
