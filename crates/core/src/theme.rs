//! Theme path lookup.

use indexmap::IndexMap;
use serde_json::Value;

/// 将主题路径拆成段
///
/// - `"colors.red.500"` → `["colors", "red", "500"]`
/// - `"spacing[2.5]"` → `["spacing", "2.5"]`
/// - `"colors.red[500]"` → `["colors", "red", "500"]`
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    current.push(inner);
                }
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// 按路径查找主题值
pub fn lookup<'a>(theme: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = theme;
    for segment in parse_path(path) {
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// 主题值转为 CSS 字符串
///
/// 字体族数组用逗号连接；`fontSize` 元组只取第一项。
pub fn to_css_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            if items.len() > 1 && items[1..].iter().all(Value::is_object) {
                return to_css_string(&items[0]);
            }
            let parts: Option<Vec<String>> = items.iter().map(to_css_string).collect();
            Some(parts?.join(", "))
        }
        _ => None,
    }
}

/// 展开嵌套调色板
///
/// `{ "red": { "500": "#ef4444", "DEFAULT": "#f00" } }` →
/// `red-500`, `red`
pub fn flatten_color_palette(value: &Value) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    if let Value::Object(map) = value {
        for (key, child) in map {
            flatten_into(&mut out, key, child);
        }
    }
    out
}

fn flatten_into(out: &mut IndexMap<String, Value>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "DEFAULT" {
                    flatten_into(out, prefix, child);
                } else {
                    flatten_into(out, &format!("{prefix}-{key}"), child);
                }
            }
        }
        _ => {
            out.insert(prefix.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("colors.red.500"), vec!["colors", "red", "500"]);
        assert_eq!(parse_path("spacing[2.5]"), vec!["spacing", "2.5"]);
        assert_eq!(parse_path("colors.red[500]"), vec!["colors", "red", "500"]);
    }

    #[test]
    fn test_lookup_nested() {
        let theme = json!({ "spacing": { "2.5": "0.625rem" }, "colors": { "red": { "500": "#ef4444" } } });
        assert_eq!(lookup(&theme, "spacing[2.5]"), Some(&json!("0.625rem")));
        assert_eq!(lookup(&theme, "colors.red.500"), Some(&json!("#ef4444")));
        assert_eq!(lookup(&theme, "colors.blue.500"), None);
    }

    #[test]
    fn test_to_css_string_font_family() {
        let value = json!(["ui-sans-serif", "system-ui", "sans-serif"]);
        assert_eq!(
            to_css_string(&value).as_deref(),
            Some("ui-sans-serif, system-ui, sans-serif")
        );
    }

    #[test]
    fn test_to_css_string_font_size_tuple() {
        let value = json!(["0.875rem", { "lineHeight": "1.25rem" }]);
        assert_eq!(to_css_string(&value).as_deref(), Some("0.875rem"));
    }

    #[test]
    fn test_flatten_color_palette() {
        let colors = json!({
            "black": "#000",
            "red": { "DEFAULT": "#f00", "500": "#ef4444" }
        });
        let flat = flatten_color_palette(&colors);
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["black", "red", "red-500"]);
    }
}
