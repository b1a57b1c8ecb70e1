use once_cell::sync::Lazy;
use regex::Regex;

/// 不自动包裹 `var()` 的属性
const VAR_INJECTION_EXCEPTIONS: &[&str] = &[
    "scroll-timeline-name",
    "timeline-scope",
    "view-timeline-name",
    "font-palette",
    "anchor-name",
    "anchor-scope",
    "position-anchor",
    "position-try-options",
    "scroll-timeline",
    "animation-timeline",
    "view-timeline",
    "position-try",
];

/// 数学函数内不插入空格的关键字
const MATH_KEYWORDS: &[&str] = &[
    "min-content",
    "max-content",
    "fit-content",
    "safe-area-inset-top",
    "safe-area-inset-right",
    "safe-area-inset-bottom",
    "safe-area-inset-left",
    "titlebar-area-x",
    "titlebar-area-y",
    "titlebar-area-width",
    "titlebar-area-height",
    "keyboard-inset-top",
    "keyboard-inset-right",
    "keyboard-inset-bottom",
    "keyboard-inset-left",
    "keyboard-inset-width",
    "keyboard-inset-height",
    "radial-gradient",
    "linear-gradient",
    "conic-gradient",
    "repeating-radial-gradient",
    "repeating-linear-gradient",
    "repeating-conic-gradient",
    "anchor-size",
];

static URL_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"url\(.*?\)").unwrap());
static MATH_FN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(calc|min|max|clamp)\(.+\)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// 规范化任意值
///
/// - `--x` → `var(--x)`（部分属性除外）
/// - `url(...)` 内容保持原样
/// - `_` → 空格，`\_` → `_`
/// - `calc()`/`min()`/`max()`/`clamp()` 内的运算符两侧补空格
pub fn normalize(value: &str, property: Option<&str>) -> String {
    normalize_inner(value, property, true)
}

fn normalize_inner(value: &str, property: Option<&str>, is_root: bool) -> String {
    let is_exception = property.is_some_and(|p| VAR_INJECTION_EXCEPTIONS.contains(&p));
    if value.starts_with("--") && !is_exception {
        return format!("var({value})");
    }

    if value.contains("url(") {
        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for m in URL_SPLIT.find_iter(value) {
            if m.start() > last {
                out.push_str(&normalize_inner(&value[last..m.start()], property, false));
            }
            out.push_str(m.as_str());
            last = m.end();
        }
        if last < value.len() {
            out.push_str(&normalize_inner(&value[last..], property, false));
        }
        return out;
    }

    let mut value = convert_underscores(value);
    if is_root {
        value = value.trim().to_string();
    }

    normalize_math_operator_spacing(&value)
}

/// `_` → 空格，`\_` → 字面下划线
fn convert_underscores(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'_') {
            chars.next();
            result.push('_');
        } else if ch == '_' {
            result.push(' ');
        } else {
            result.push(ch);
        }
    }

    result
}

fn normalize_math_operator_spacing(value: &str) -> String {
    MATH_FN
        .replace_all(value, |caps: &regex::Captures<'_>| space_operators(&caps[0]))
        .into_owned()
}

fn space_operators(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len() + 8);
    let mut i = 0;

    let peek = |i: usize, word: &str| -> bool {
        word.chars()
            .enumerate()
            .all(|(j, c)| chars.get(i + j) == Some(&c))
    };
    let consume_until = |i: usize, stops: &[char]| -> usize {
        chars[i..]
            .iter()
            .position(|c| stops.contains(c))
            .map_or(chars.len(), |p| i + p)
    };

    while i < chars.len() {
        let c = chars[i];

        if peek(i, "var") {
            let end = consume_until(i, &[')', ',']);
            result.extend(&chars[i..end]);
            i = end;
            continue;
        }
        if let Some(keyword) = MATH_KEYWORDS.iter().find(|k| peek(i, k)) {
            result.push_str(keyword);
            i += keyword.chars().count();
            continue;
        }
        if peek(i, "theme") {
            let end = consume_until(i, &[')']);
            result.extend(&chars[i..end]);
            i = end;
            continue;
        }
        if c == '[' {
            let end = consume_until(i, &[']']);
            result.extend(&chars[i..end]);
            i = end;
            continue;
        }

        let last = result.trim_end().chars().last();
        let after_operator = matches!(last, Some('(' | '+' | '-' | '*' | '/' | ','));
        if matches!(c, '+' | '-' | '*' | '/') && !after_operator {
            result.push(' ');
            result.push(c);
            result.push(' ');
        } else {
            result.push(c);
        }
        i += 1;
    }

    WHITESPACE.replace_all(&result, " ").into_owned()
}

/// 任意值合法性检查：括号配对、引号闭合、顶层不含 `:`
pub fn is_valid_arbitrary_value(value: &str) -> bool {
    let mut stack: Vec<char> = Vec::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for c in value.chars() {
        let escaped = prev == Some('\\');
        prev = Some(c);

        if c == ':' && !in_quotes && stack.is_empty() {
            return false;
        }
        if matches!(c, '"' | '\'' | '`') && !escaped {
            in_quotes = !in_quotes;
        }
        if in_quotes || escaped {
            continue;
        }
        match c {
            '{' | '[' | '(' => stack.push(c),
            '}' | ']' | ')' => {
                let expected = match c {
                    '}' => '{',
                    ']' => '[',
                    _ => '(',
                };
                if stack.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
    }

    stack.is_empty() && !in_quotes
}

/// 拆分工具类修饰符：`red-500/50` → `("red-500", Some("50"))`
pub fn split_utility_modifier(modifier: &str) -> (&str, Option<&str>) {
    let Some(mut slash) = modifier.rfind('/') else {
        return (modifier, None);
    };

    let bytes = modifier.as_bytes();
    let next_to_arbitrary = (slash > 0 && bytes[slash - 1] == b']')
        || bytes.get(slash + 1) == Some(&b'[');

    if !next_to_arbitrary {
        let start = modifier[..slash].rfind('[');
        let end = modifier[slash..].find(']').map(|p| p + slash);
        if let (Some(start), Some(_end)) = (start, end) {
            match modifier[..start].rfind('/') {
                Some(previous) => slash = previous,
                None => return (modifier, None),
            }
        }
    }

    if slash == modifier.len() - 1 {
        return (modifier, None);
    }

    if crate::is_arbitrary_value(modifier) && !modifier.contains("]/[") {
        return (modifier, None);
    }

    (&modifier[..slash], Some(&modifier[slash + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_underscores() {
        assert_eq!(normalize("1fr_auto", None), "1fr auto");
        assert_eq!(normalize(r"a\_b", None), "a_b");
        assert_eq!(normalize("_x_", None), "x");
    }

    #[test]
    fn test_normalize_var_injection() {
        assert_eq!(normalize("--brand", None), "var(--brand)");
        assert_eq!(normalize("--brand", Some("anchor-name")), "--brand");
    }

    #[test]
    fn test_normalize_url_untouched() {
        assert_eq!(
            normalize("url(/a_b.png)_center", None),
            "url(/a_b.png) center"
        );
    }

    #[test]
    fn test_normalize_math() {
        assert_eq!(normalize("calc(100%-2rem)", None), "calc(100% - 2rem)");
        assert_eq!(
            normalize("calc(var(--a-b)*2)", None),
            "calc(var(--a-b) * 2)"
        );
        assert_eq!(normalize("min(1rem,-2px)", None), "min(1rem,-2px)");
        assert_eq!(
            normalize("calc(100vh-env(safe-area-inset-top))", None),
            "calc(100vh - env(safe-area-inset-top))"
        );
    }

    #[test]
    fn test_valid_arbitrary_value() {
        assert!(is_valid_arbitrary_value("rgb(0,0,0)"));
        assert!(is_valid_arbitrary_value("url(http://x)"));
        assert!(is_valid_arbitrary_value("'a:b'"));
        assert!(!is_valid_arbitrary_value("a:b"));
        assert!(!is_valid_arbitrary_value("rgb(0,0,0"));
        assert!(!is_valid_arbitrary_value("a)"));
        assert!(!is_valid_arbitrary_value("'open"));
    }

    #[test]
    fn test_split_utility_modifier() {
        assert_eq!(split_utility_modifier("red-500/50"), ("red-500", Some("50")));
        assert_eq!(split_utility_modifier("red-500"), ("red-500", None));
        assert_eq!(split_utility_modifier("red-500/[.3]"), ("red-500", Some("[.3]")));
        assert_eq!(split_utility_modifier("[url(/a/b)]"), ("[url(/a/b)]", None));
        assert_eq!(split_utility_modifier("[#000]/[.5]"), ("[#000]", Some("[.5]")));
        assert_eq!(split_utility_modifier("red/"), ("red/", None));
    }
}
