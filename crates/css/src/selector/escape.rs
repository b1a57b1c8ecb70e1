/// 转义 CSS 标识符（类名）
///
/// - ASCII 标点 → `\:`、`\[`、`\/` 等
/// - 控制字符与非 ASCII 字符 → `\HEX `
/// - 逗号 → `\2c `
/// - 数字开头 → `\3X `，`-` 后接数字或 `-` → `\-`
///
/// ```
/// use crosswind_css::escape_class_name;
///
/// assert_eq!(escape_class_name("hover:flex"), r"hover\:flex");
/// assert_eq!(escape_class_name("2xl:p-4"), r"\32xl\:p-4");
/// ```
pub fn escape_class_name(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;

        if c == ',' {
            out.push_str("\\2c ");
            continue;
        }

        if !(0x20..=0x7e).contains(&code) {
            push_hex_escape(&mut out, code, chars.get(i + 1).copied());
            continue;
        }

        if needs_single_escape(c) {
            out.push('\\');
        }
        out.push(c);
    }

    // 标识符开头的特殊情况
    if let Some(&first) = chars.first() {
        if first == '-' && matches!(chars.get(1), Some(c) if *c == '-' || c.is_ascii_digit()) {
            out.insert(0, '\\');
        } else if first.is_ascii_digit() {
            let mut escaped = String::with_capacity(out.len() + 4);
            push_hex_escape(&mut escaped, first as u32, chars.get(1).copied());
            escaped.push_str(&out[1..]);
            out = escaped;
        }
    }

    out
}

/// `\HEX` 后面的空格只在下一个字符是十六进制数字或空格时保留
fn push_hex_escape(out: &mut String, code: u32, next: Option<char>) {
    out.push('\\');
    out.push_str(&format!("{code:X}"));
    let next_output = next.map(|n| {
        if needs_single_escape(n) || (n as u32) < 0x20 || (n as u32) > 0x7e {
            '\\'
        } else {
            n
        }
    });
    if matches!(next_output, Some(n) if n.is_ascii_hexdigit() || n == ' ') {
        out.push(' ');
    }
}

fn needs_single_escape(c: char) -> bool {
    matches!(c,
        ' '..=',' | '.' | '/' | ':'..='@' | '['..='^' | '`' | '{'..='~'
    )
}

/// 反转义 CSS 标识符
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }

        if matches!(chars.peek(), Some(' ' | '\t' | '\n')) {
            chars.next();
        }
        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}');
        out.push(decoded);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_punctuation() {
        assert_eq!(escape_class_name("focus:hover:text-center"), r"focus\:hover\:text-center");
        assert_eq!(escape_class_name("[mask-type:luminance]"), r"\[mask-type\:luminance\]");
        assert_eq!(escape_class_name("w-1/2"), r"w-1\/2");
        assert_eq!(escape_class_name("!flex"), r"\!flex");
        assert_eq!(escape_class_name("p-0.5"), r"p-0\.5");
    }

    #[test]
    fn test_escape_commas() {
        assert_eq!(escape_class_name("bg-[rgb(0,0,0)]"), r"bg-\[rgb\(0\2c 0\2c 0\)\]");
    }

    #[test]
    fn test_escape_leading_digit() {
        assert_eq!(escape_class_name("2xl"), r"\32xl");
        assert_eq!(escape_class_name("2a"), r"\32 a");
    }

    #[test]
    fn test_escape_leading_dash() {
        assert_eq!(escape_class_name("-mt-4"), "-mt-4");
        assert_eq!(escape_class_name("-2"), r"\-2");
        assert_eq!(escape_class_name("--x"), r"\--x");
    }

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape_class_name("é"), r"\E9");
        assert_eq!(escape_class_name("éa"), r"\E9 a");
        assert_eq!(escape_class_name("éz"), r"\E9z");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"hover\:flex"), "hover:flex");
        assert_eq!(unescape(r"\32xl"), "2xl");
        assert_eq!(unescape(r"\32 a"), "2a");
        assert_eq!(unescape(r"bg-\[rgb\(0\2c 0\2c 0\)\]"), "bg-[rgb(0,0,0)]");
    }
}
