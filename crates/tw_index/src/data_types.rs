//! Value-kind guessing for arbitrary values.
//!
//! Each predicate answers "could this raw arbitrary value be a `<kind>`?".
//! They are heuristics used to pick between utilities sharing a prefix,
//! not validators of full CSS grammar.

use crate::color::parse_color;
use crosswind_parse::{normalize, split_at_top_level};
use once_cell::sync::Lazy;
use phf::phf_set;
use regex::Regex;

const LENGTH_UNITS: &str = "cm|mm|Q|in|pc|pt|px|em|ex|ch|rem|lh|rlh|vw|vh|vmin|vmax|vb|vi|svw|svh|lvw|lvh|dvw|dvh|cqw|cqh|cqi|cqb|cqmin|cqmax";

static LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^[+-]?[0-9]*\.?[0-9]+(?:[eE][+-]?[0-9]+)?(?:{LENGTH_UNITS})$")).unwrap()
});
static CSS_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:min|max|clamp|calc)\(.*\)").unwrap());
static SHADOW_LENGTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(\d+|\.\d+)(.*?)$").unwrap());
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"'[^"']+'|"[^"']+""#).unwrap());

static LINE_WIDTHS: phf::Set<&'static str> = phf_set! { "thin", "medium", "thick" };

static POSITIONS: phf::Set<&'static str> = phf_set! { "center", "top", "right", "bottom", "left" };

static GENERIC_NAMES: phf::Set<&'static str> = phf_set! {
    "serif", "sans-serif", "monospace", "cursive", "fantasy", "system-ui",
    "ui-serif", "ui-sans-serif", "ui-monospace", "ui-rounded", "math", "emoji", "fangsong",
};

static ABSOLUTE_SIZES: phf::Set<&'static str> = phf_set! {
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large",
};

static RELATIVE_SIZES: phf::Set<&'static str> = phf_set! { "larger", "smaller" };

static GRADIENTS: &[&str] = &[
    "conic-gradient",
    "linear-gradient",
    "radial-gradient",
    "repeating-conic-gradient",
    "repeating-linear-gradient",
    "repeating-radial-gradient",
];

static SHADOW_KEYWORDS: phf::Set<&'static str> = phf_set! { "inset", "inherit", "initial", "revert", "unset" };

fn is_css_function(value: &str) -> bool {
    CSS_FUNCTION.is_match(value)
}

/// `value` 按顶层 `separator` 拆分后，每段都是 `var()` 或满足 `accept`，且至少一段满足
fn every_part(value: &str, separator: &str, accept: impl Fn(&str) -> bool) -> bool {
    let mut matched = 0;
    for part in split_at_top_level(value, separator) {
        let part = normalize(part, None);
        if part.starts_with("var(") {
            continue;
        }
        if !accept(&part) {
            return false;
        }
        matched += 1;
    }
    matched > 0
}

pub fn url(value: &str) -> bool {
    value.starts_with("url(")
}

pub fn number(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.parse::<f64>().is_ok_and(|n| !n.is_nan()) || is_css_function(value)
}

pub fn percentage(value: &str) -> bool {
    value.strip_suffix('%').is_some_and(number) || is_css_function(value)
}

pub fn length(value: &str) -> bool {
    value == "0" || LENGTH.is_match(value) || is_css_function(value)
}

pub fn line_width(value: &str) -> bool {
    LINE_WIDTHS.contains(value)
}

/// 每个阴影至少要有 x、y 两个长度
pub fn shadow(value: &str) -> bool {
    let normalized = normalize(value, None);
    split_at_top_level(&normalized, ",").into_iter().all(|shadow| {
        let mut lengths = 0;
        let mut keyword_seen = false;
        for part in split_at_top_level(shadow.trim(), " ") {
            if part.is_empty() {
                continue;
            }
            if !keyword_seen && SHADOW_KEYWORDS.contains(part) {
                keyword_seen = true;
            } else if SHADOW_LENGTH.is_match(part) {
                lengths += 1;
            }
        }
        lengths >= 2
    })
}

pub fn color(value: &str) -> bool {
    every_part(value, "_", |part| parse_color(part, true).is_some())
}

pub fn gradient(value: &str) -> bool {
    let value = normalize(value, None);
    GRADIENTS
        .iter()
        .any(|kind| value.strip_prefix(kind).is_some_and(|rest| rest.starts_with('(')))
}

pub fn image(value: &str) -> bool {
    every_part(value, ",", |part| {
        url(part)
            || gradient(part)
            || ["element(", "image(", "cross-fade(", "image-set("]
                .iter()
                .any(|f| part.starts_with(f))
    })
}

pub fn position(value: &str) -> bool {
    every_part(value, "_", |part| {
        POSITIONS.contains(part) || length(part) || percentage(part)
    })
}

/// 含空格的字体名必须加引号；不能以数字开头
pub fn family_name(value: &str) -> bool {
    every_part(value, ",", |part| {
        if part.contains(' ') && !QUOTED.is_match(part) {
            return false;
        }
        !part.starts_with(|c: char| c.is_ascii_digit())
    })
}

pub fn generic_name(value: &str) -> bool {
    GENERIC_NAMES.contains(value)
}

pub fn absolute_size(value: &str) -> bool {
    ABSOLUTE_SIZES.contains(value)
}

pub fn relative_size(value: &str) -> bool {
    RELATIVE_SIZES.contains(value)
}

/// `background-size`：关键字，或一到两个长度 / 百分比 / `auto`
pub fn background_size(value: &str) -> bool {
    let value = normalize(value, None);
    if matches!(value.as_str(), "cover" | "contain") {
        return true;
    }
    split_at_top_level(&value, ",").into_iter().all(|layer| {
        let parts: Vec<&str> = layer.split_whitespace().collect();
        (1..=2).contains(&parts.len())
            && parts
                .iter()
                .all(|p| *p == "auto" || length(p) || percentage(p) || p.starts_with("var("))
    })
}
