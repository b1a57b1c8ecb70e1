use super::escape::unescape;
use super::{Combinator, Component, Pseudo, PseudoArgs, Selector, SelectorList};
use crate::error::ParseError;

/// 参数按选择器列表解析的伪类
static SELECTOR_PSEUDOS: phf::Set<&'static str> = phf::phf_set! {
    ":not", ":is", ":where", ":has", ":matches", ":merge",
    ":host", ":host-context", "::slotted", ":-webkit-any", ":-moz-any",
    ":global", ":local",
};

/// 解析逗号分隔的选择器列表
///
/// ```
/// use crosswind_css::parse_selector_list;
///
/// let list = parse_selector_list(r".a, .hover\:b:hover").unwrap();
/// assert_eq!(list.selectors.len(), 2);
/// ```
pub fn parse_selector_list(input: &str) -> Result<SelectorList, ParseError> {
    let mut parser = SelectorParser {
        input,
        chars: input.char_indices().collect(),
        pos: 0,
    };
    let list = parser.parse_list(None)?;
    if list.selectors.is_empty() {
        return Err(ParseError::new("Empty selector", 0, input));
    }
    Ok(list)
}

/// 解析单个选择器；多于一个时报错
pub fn parse_selector(input: &str) -> Result<Selector, ParseError> {
    let mut list = parse_selector_list(input)?;
    if list.selectors.len() != 1 {
        return Err(ParseError::new("Expected a single selector", 0, input));
    }
    Ok(list.selectors.remove(0))
}

struct SelectorParser<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.offset(), self.input)
    }

    /// `close` 为 `Some(')')` 时解析到匹配的右括号为止
    fn parse_list(&mut self, close: Option<char>) -> Result<SelectorList, ParseError> {
        let mut selectors = Vec::new();
        let mut current: Vec<Component> = Vec::new();
        let mut pending_space = false;

        loop {
            let Some(c) = self.peek() else {
                if close.is_some() {
                    return Err(self.error("Unclosed pseudo arguments"));
                }
                break;
            };

            if Some(c) == close {
                self.pos += 1;
                break;
            }

            if c.is_whitespace() {
                self.pos += 1;
                if !current.is_empty() && !matches!(current.last(), Some(Component::Combinator(_)))
                {
                    pending_space = true;
                }
                continue;
            }

            if c == ',' {
                self.pos += 1;
                if current.is_empty() {
                    return Err(self.error("Empty selector in list"));
                }
                selectors.push(Selector::new(std::mem::take(&mut current)));
                pending_space = false;
                continue;
            }

            let combinator = match c {
                '>' => Some(Combinator::Child),
                '+' => Some(Combinator::NextSibling),
                '~' => Some(Combinator::SubsequentSibling),
                _ => None,
            };
            if let Some(combinator) = combinator {
                self.pos += 1;
                pending_space = false;
                if matches!(current.last(), Some(Component::Combinator(_))) {
                    return Err(self.error("Consecutive combinators"));
                }
                current.push(Component::Combinator(combinator));
                continue;
            }

            if pending_space {
                current.push(Component::Combinator(Combinator::Descendant));
                pending_space = false;
            }

            let component = self.parse_component(c)?;
            current.push(component);
        }

        if matches!(current.last(), Some(Component::Combinator(_))) {
            return Err(self.error("Dangling combinator"));
        }
        if !current.is_empty() {
            selectors.push(Selector::new(current));
        } else if !selectors.is_empty() {
            return Err(self.error("Trailing comma"));
        }

        Ok(SelectorList::new(selectors))
    }

    fn parse_component(&mut self, c: char) -> Result<Component, ParseError> {
        match c {
            '.' => {
                self.pos += 1;
                let raw = self.read_ident();
                if raw.is_empty() {
                    return Err(self.error("Expected class name"));
                }
                Ok(Component::Class(unescape(&raw)))
            }
            '#' => {
                self.pos += 1;
                let raw = self.read_ident();
                if raw.is_empty() {
                    return Err(self.error("Expected id"));
                }
                Ok(Component::Id(raw))
            }
            '&' => {
                self.pos += 1;
                Ok(Component::Nesting)
            }
            '*' => {
                self.pos += 1;
                Ok(Component::Tag("*".into()))
            }
            '[' => {
                self.pos += 1;
                let raw = self.read_balanced('[', ']')?;
                Ok(Component::Attribute(raw))
            }
            ':' => self.parse_pseudo().map(Component::Pseudo),
            c if is_ident_start(c) => Ok(Component::Tag(self.read_ident())),
            other => Err(self.error(&format!("Unexpected character `{other}`"))),
        }
    }

    fn parse_pseudo(&mut self) -> Result<Pseudo, ParseError> {
        let mut name = String::from(":");
        self.pos += 1;
        if self.peek() == Some(':') {
            name.push(':');
            self.pos += 1;
        }
        let ident = self.read_ident();
        if ident.is_empty() {
            return Err(self.error("Expected pseudo name"));
        }
        name.push_str(&ident);

        if self.peek() != Some('(') {
            return Ok(Pseudo::new(name));
        }
        self.pos += 1;

        let key = name.to_ascii_lowercase();
        let args = if SELECTOR_PSEUDOS.contains(key.as_str()) {
            PseudoArgs::Selectors(self.parse_list(Some(')'))?)
        } else {
            PseudoArgs::Raw(self.read_balanced('(', ')')?.trim().to_string())
        };
        Ok(Pseudo {
            name,
            args: Some(args),
        })
    }

    fn read_ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                out.push(c);
                self.pos += 1;
                if let Some(next) = self.peek() {
                    out.push(next);
                    self.pos += 1;
                    // `\3X ` 形式的十六进制转义后可跟一个空格
                    if next.is_ascii_hexdigit() {
                        let mut digits = 1;
                        while digits < 6 {
                            match self.peek() {
                                Some(h) if h.is_ascii_hexdigit() => {
                                    out.push(h);
                                    self.pos += 1;
                                    digits += 1;
                                }
                                _ => break,
                            }
                        }
                        if self.peek() == Some(' ') {
                            out.push(' ');
                            self.pos += 1;
                        }
                    }
                }
                continue;
            }
            if is_ident_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    /// 读取到匹配的结束符，返回内部原文（不含结束符）
    fn read_balanced(&mut self, open: char, close: char) -> Result<String, ParseError> {
        let start = self.offset();
        let mut depth = 1usize;
        let mut quote: Option<char> = None;

        while let Some(c) = self.peek() {
            let at = self.offset();
            self.pos += 1;
            if let Some(q) = quote {
                if c == '\\' {
                    self.pos += 1;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\\' => self.pos += 1,
                '"' | '\'' => quote = Some(c),
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.input[start..at].to_string());
                    }
                }
                _ => {}
            }
        }

        Err(ParseError::new(
            format!("Unclosed `{open}`"),
            start,
            self.input,
        ))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || c == '_' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
