/// 只在顶层切分字符串
///
/// `(...)`、`[...]`、`{...}` 内部以及转义字符后的分隔符都不会被切分：
///
/// ```
/// use crosswind_parse::split_at_top_level;
///
/// assert_eq!(
///     split_at_top_level("[&:hover]:bg-red-500", ":"),
///     vec!["[&:hover]", "bg-red-500"]
/// );
/// ```
pub fn split_at_top_level<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    if separator.is_empty() {
        parts.push(input);
        return parts;
    }

    let bytes = input.as_bytes();
    let sep = separator.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut last = 0;
    let mut escaped = false;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];

        if stack.is_empty() && !escaped && bytes[idx..].starts_with(sep) {
            parts.push(&input[last..idx]);
            last = idx + sep.len();
            idx += sep.len();
            continue;
        }

        escaped = !escaped && b == b'\\';

        match b {
            b'(' | b'[' | b'{' => stack.push(b),
            b')' if stack.last() == Some(&b'(') => {
                stack.pop();
            }
            b']' if stack.last() == Some(&b'[') => {
                stack.pop();
            }
            b'}' if stack.last() == Some(&b'{') => {
                stack.pop();
            }
            _ => {}
        }

        idx += 1;
    }

    parts.push(&input[last..]);
    parts
}
