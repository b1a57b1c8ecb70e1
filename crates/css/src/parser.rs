use crate::ast::{AtRule, Decl, Node, Rule};
use crate::error::ParseError;

/// 解析 CSS 文本
///
/// 支持规则、嵌套规则、带块/不带块的 at-rule、声明与注释。
///
/// ```
/// use crosswind_css::{parse_stylesheet, Node};
///
/// let nodes = parse_stylesheet(".btn { @apply font-bold; color: red }").unwrap();
/// assert_eq!(nodes.len(), 1);
/// assert!(matches!(&nodes[0], Node::Rule(rule) if rule.nodes.len() == 2));
/// ```
pub fn parse_stylesheet(input: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser::new(input);
    let nodes = parser.parse_nodes(false)?;
    Ok(nodes)
}

/// 内部解析器
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

/// 语句的终止符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Semicolon,
    OpenBrace,
    CloseBrace,
    Eof,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.pos, self.input)
    }

    fn line_at(&self, offset: usize) -> usize {
        self.input[..offset].matches('\n').count() + 1
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn parse_nodes(&mut self, in_block: bool) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        loop {
            self.skip_whitespace();
            let rest = self.rest();

            if rest.is_empty() {
                if in_block {
                    return Err(self.error("Unclosed block"));
                }
                return Ok(nodes);
            }

            if let Some(body) = rest.strip_prefix("/*") {
                let end = body
                    .find("*/")
                    .ok_or_else(|| self.error("Unclosed comment"))?;
                nodes.push(Node::Comment(body[..end].to_string()));
                self.pos += 2 + end + 2;
                continue;
            }

            if rest.starts_with('}') {
                if in_block {
                    self.pos += 1;
                    return Ok(nodes);
                }
                return Err(self.error("Unexpected }"));
            }

            if rest.starts_with(';') {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            let (end, terminator) = self.scan_statement();
            let prelude = self.input[start..end].trim();
            let line = self.line_at(start);

            match terminator {
                Terminator::OpenBrace => {
                    self.pos = end + 1;
                    let children = self.parse_nodes(true)?;
                    if let Some(at) = prelude.strip_prefix('@') {
                        let (name, params) = split_at_rule(at);
                        let mut at_rule = AtRule::new(name, params, Some(children));
                        at_rule.line = Some(line);
                        nodes.push(Node::AtRule(at_rule));
                    } else {
                        let mut rule = Rule::new(prelude, children);
                        rule.line = Some(line);
                        nodes.push(Node::Rule(rule));
                    }
                }
                Terminator::Semicolon | Terminator::CloseBrace | Terminator::Eof => {
                    self.pos = if terminator == Terminator::Semicolon {
                        end + 1
                    } else {
                        end
                    };
                    if let Some(at) = prelude.strip_prefix('@') {
                        let (name, params) = split_at_rule(at);
                        let mut at_rule = AtRule::new(name, params, None);
                        at_rule.line = Some(line);
                        nodes.push(Node::AtRule(at_rule));
                    } else if in_block {
                        nodes.push(Node::Decl(parse_declaration(prelude).ok_or_else(|| {
                            ParseError::new("Unknown word", start, self.input)
                        })?));
                    } else {
                        return Err(ParseError::new("Unknown word", start, self.input));
                    }
                }
            }
        }
    }

    /// 找到当前语句的终止位置（跳过字符串、括号与注释）
    fn scan_statement(&self) -> (usize, Terminator) {
        let bytes = self.input.as_bytes();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut i = self.pos;

        while i < bytes.len() {
            let b = bytes[i];
            if let Some(q) = quote {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            match b {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'"' | b'\'' => quote = Some(b),
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => return (i, Terminator::Semicolon),
                b'{' if depth == 0 => return (i, Terminator::OpenBrace),
                b'}' if depth == 0 => return (i, Terminator::CloseBrace),
                _ => {}
            }
            i += 1;
        }

        (bytes.len(), Terminator::Eof)
    }
}

/// `media (min-width: 640px)` → `("media", "(min-width: 640px)")`
pub fn split_at_rule(input: &str) -> (String, String) {
    let end = input
        .find(|c: char| c.is_whitespace() || c == '(' || c == '{' || c == '"' || c == '\'')
        .unwrap_or(input.len());
    (input[..end].to_string(), input[end..].trim().to_string())
}

fn parse_declaration(input: &str) -> Option<Decl> {
    let colon = input.find(':')?;
    let prop = input[..colon].trim();
    if prop.is_empty() {
        return None;
    }
    let mut value = input[colon + 1..].trim();
    let mut important = false;

    let lower = value.to_ascii_lowercase();
    if let Some(bang) = lower.rfind('!') {
        if lower[bang + 1..].trim() == "important" {
            value = value[..bang].trim_end();
            important = true;
        }
    }

    let mut decl = Decl::new(prop, value);
    decl.important = important;
    Some(decl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule_with_declarations() {
        let nodes = parse_stylesheet(".a { color: red; margin: 0 !important }").unwrap();
        let Node::Rule(rule) = &nodes[0] else { panic!("expected rule") };
        assert_eq!(rule.selector, ".a");
        assert_eq!(rule.nodes.len(), 2);
        assert!(matches!(&rule.nodes[1], Node::Decl(d) if d.important && d.value == "0"));
    }

    #[test]
    fn test_parse_tailwind_directives() {
        let nodes = parse_stylesheet("@tailwind base;\n@tailwind utilities;").unwrap();
        assert_eq!(nodes.len(), 2);
        let Node::AtRule(at) = &nodes[1] else { panic!("expected at-rule") };
        assert_eq!(at.name, "tailwind");
        assert_eq!(at.params, "utilities");
        assert_eq!(at.line, Some(2));
        assert!(at.nodes.is_none());
    }

    #[test]
    fn test_parse_nested_media() {
        let nodes = parse_stylesheet("@media (min-width: 640px) { .a { color: red } }").unwrap();
        let Node::AtRule(at) = &nodes[0] else { panic!("expected at-rule") };
        assert_eq!(at.name, "media");
        assert_eq!(at.params, "(min-width: 640px)");
        assert_eq!(at.nodes.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_parse_strings_and_urls() {
        let nodes =
            parse_stylesheet(r#".a { content: "}"; background: url(data:image/png;base64,AA) }"#)
                .unwrap();
        let Node::Rule(rule) = &nodes[0] else { panic!("expected rule") };
        assert!(matches!(&rule.nodes[0], Node::Decl(d) if d.value == "\"}\""));
        assert!(matches!(&rule.nodes[1], Node::Decl(d) if d.value == "url(data:image/png;base64,AA)"));
    }

    #[test]
    fn test_parse_comments() {
        let nodes = parse_stylesheet("/* hi */ .a { /* inner */ color: red }").unwrap();
        assert!(matches!(&nodes[0], Node::Comment(c) if c == " hi "));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_stylesheet(".a { color: red").is_err());
        assert!(parse_stylesheet("}").is_err());
        assert!(parse_stylesheet(".a { color }").is_err());
    }

    #[test]
    fn test_split_at_rule() {
        assert_eq!(
            split_at_rule("media(any-hover:hover)"),
            ("media".to_string(), "(any-hover:hover)".to_string())
        );
        assert_eq!(split_at_rule("apply  font-bold"), ("apply".to_string(), "font-bold".to_string()));
    }
}
