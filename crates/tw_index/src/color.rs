//! Color parsing and alpha handling.
//!
//! Colors stay strings end to end; parsing only happens when an alpha
//! channel has to be injected. Theme colors may carry an `<alpha-value>`
//! placeholder, which is substituted instead of parsed.

use once_cell::sync::Lazy;
use regex::Regex;

const ALPHA_PLACEHOLDER: &str = "<alpha-value>";

const VALUE: &str = r"(?:\d+|\d*\.\d+)%?";
const SEP: &str = r"(?:\s*,\s*|\s+)";
const ALPHA_SEP: &str = r"\s*[,/]\s*";
const CUSTOM_PROPERTY: &str = r"var\(--(?:[^ )]*?)(?:,(?:[^ )]*?|\(--[^ )]*?\)))?\)";

static HEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#([a-f\d]{2})([a-f\d]{2})([a-f\d]{2})([a-f\d]{2})?$").unwrap()
});
static SHORT_HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#([a-f\d])([a-f\d])([a-f\d])([a-f\d])?$").unwrap());
static RGB: Lazy<Regex> = Lazy::new(|| function_regex("rgba?"));
static HSL: Lazy<Regex> = Lazy::new(|| function_regex("hsla?"));
static VAR_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^var\(.*?\)$").unwrap());

fn function_regex(name: &str) -> Regex {
    let part = format!("({VALUE}|{CUSTOM_PROPERTY})");
    let pattern = format!(
        r"^({name})\(\s*{part}(?:{SEP}{part})?(?:{SEP}{part})?(?:{ALPHA_SEP}{part})?\s*\)$"
    );
    Regex::new(&pattern).unwrap()
}

/// 颜色函数的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Rgba,
    Hsl,
    Hsla,
}

impl ColorMode {
    fn as_str(self) -> &'static str {
        match self {
            ColorMode::Rgb => "rgb",
            ColorMode::Rgba => "rgba",
            ColorMode::Hsl => "hsl",
            ColorMode::Hsla => "hsla",
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "rgba" => ColorMode::Rgba,
            "hsl" => ColorMode::Hsl,
            "hsla" => ColorMode::Hsla,
            _ => ColorMode::Rgb,
        }
    }
}

/// 解析后的颜色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedColor {
    pub mode: ColorMode,
    pub channels: Vec<String>,
    pub alpha: Option<String>,
}

/// 解析 CSS 颜色
///
/// 支持 `transparent`、命名颜色、`#rgb`/`#rgba`/`#rrggbb`/`#rrggbbaa`
/// 以及 `rgb()`/`hsl()`（通道可以是 `var(--x)`）。`loose` 允许通道不足三个。
pub fn parse_color(value: &str, loose: bool) -> Option<ParsedColor> {
    let value = value.trim();

    if value == "transparent" {
        return Some(ParsedColor {
            mode: ColorMode::Rgb,
            channels: vec!["0".into(), "0".into(), "0".into()],
            alpha: Some("0".into()),
        });
    }

    if let Some(named) = palette::named::from_str(value) {
        return Some(ParsedColor {
            mode: ColorMode::Rgb,
            channels: vec![
                named.red.to_string(),
                named.green.to_string(),
                named.blue.to_string(),
            ],
            alpha: None,
        });
    }

    if let Some(parsed) = parse_hex(value) {
        return Some(parsed);
    }

    let caps = RGB.captures(value).or_else(|| HSL.captures(value))?;
    let mode = ColorMode::from_name(&caps[1]);
    let channels: Vec<String> = (2..=4)
        .filter_map(|i| caps.get(i))
        .map(|m| m.as_str().to_string())
        .collect();
    let alpha = caps.get(5).map(|m| m.as_str().to_string());

    // rgba(var(--my-color), 0.1)
    if channels.len() == 2 && channels[0].starts_with("var(") {
        return Some(ParsedColor {
            mode,
            channels: vec![channels[0].clone()],
            alpha: Some(channels[1].clone()),
        });
    }

    if !loose && channels.len() != 3 {
        return None;
    }
    if channels.len() < 3 && !channels.iter().any(|c| VAR_ONLY.is_match(c)) {
        return None;
    }

    Some(ParsedColor {
        mode,
        channels,
        alpha,
    })
}

fn parse_hex(value: &str) -> Option<ParsedColor> {
    let expanded;
    let value = match SHORT_HEX.captures(value) {
        Some(caps) => {
            let double = |i: usize| caps.get(i).map(|m| m.as_str().repeat(2)).unwrap_or_default();
            expanded = format!("#{}{}{}{}", double(1), double(2), double(3), double(4));
            expanded.as_str()
        }
        None => value,
    };

    let caps = HEX.captures(value)?;
    let channel = |i: usize| -> Option<u8> { u8::from_str_radix(caps.get(i)?.as_str(), 16).ok() };

    Some(ParsedColor {
        mode: ColorMode::Rgb,
        channels: vec![
            channel(1)?.to_string(),
            channel(2)?.to_string(),
            channel(3)?.to_string(),
        ],
        alpha: channel(4).map(|a| (f64::from(a) / 255.0).to_string()),
    })
}

/// 输出颜色：`rgb(r g b / a)`，`rgba`/`hsla` 使用逗号写法
pub fn format_color(color: &ParsedColor) -> String {
    match color.mode {
        ColorMode::Rgba | ColorMode::Hsla => {
            let alpha = color
                .alpha
                .as_ref()
                .map(|a| format!(", {a}"))
                .unwrap_or_default();
            format!("{}({}{alpha})", color.mode.as_str(), color.channels.join(", "))
        }
        ColorMode::Rgb | ColorMode::Hsl => {
            let alpha = color
                .alpha
                .as_ref()
                .map(|a| format!(" / {a}"))
                .unwrap_or_default();
            format!("{}({}{alpha})", color.mode.as_str(), color.channels.join(" "))
        }
    }
}

/// 颜色是否含有 `<alpha-value>` 占位符
pub fn has_alpha_placeholder(color: &str) -> bool {
    color.contains(ALPHA_PLACEHOLDER)
}

/// 以固定透明度输出颜色；无法解析时返回 `None`
pub fn with_alpha_value(color: &str, alpha: &str) -> Option<String> {
    if has_alpha_placeholder(color) {
        return Some(color.replace(ALPHA_PLACEHOLDER, alpha));
    }
    let parsed = parse_color(color, true)?;
    Some(format_color(&ParsedColor {
        alpha: Some(alpha.to_string()),
        ..parsed
    }))
}

/// 颜色与透明度变量
///
/// `#ef4444` → `[("--tw-bg-opacity", "1"), ("background-color", "rgb(239 68 68 / var(--tw-bg-opacity))")]`。
/// 已带透明度或无法解析的颜色原样输出，不设置变量。
pub fn with_alpha_variable(color: &str, property: &str, variable: &str) -> Vec<(String, String)> {
    let opacity = format!("var({variable})");

    if has_alpha_placeholder(color) {
        return vec![
            (variable.to_string(), "1".to_string()),
            (property.to_string(), color.replace(ALPHA_PLACEHOLDER, &opacity)),
        ];
    }

    match parse_color(color, false) {
        Some(parsed) if parsed.alpha.is_none() => vec![
            (variable.to_string(), "1".to_string()),
            (
                property.to_string(),
                format_color(&ParsedColor {
                    alpha: Some(opacity),
                    ..parsed
                }),
            ),
        ],
        _ => vec![(property.to_string(), color.to_string())],
    }
}

/// 不带透明度变量时的颜色值
pub fn to_color_value(color: &str) -> String {
    if has_alpha_placeholder(color) {
        color.replace(ALPHA_PLACEHOLDER, "1")
    } else {
        color.to_string()
    }
}

/// 去掉 `var(--tw-*-opacity)` 透明度（`:visited` 不允许使用变量）
pub fn remove_alpha_variable(value: &str, variables: &[&str]) -> String {
    let Some(parsed) = parse_color(value, true) else {
        return value.to_string();
    };
    match &parsed.alpha {
        Some(alpha) if variables.iter().any(|v| alpha == &format!("var({v})")) => {
            format_color(&ParsedColor {
                alpha: Some("1".to_string()),
                ..parsed
            })
        }
        _ => value.to_string(),
    }
}
