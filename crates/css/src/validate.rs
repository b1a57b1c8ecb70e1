use std::sync::Arc;

use swc_core::common::{input::StringInput, FileName, SourceMap};
use swc_core::css::ast::{ComponentValue, Rule, Stylesheet};
use swc_core::css::parser::{parse_string_input, parser::ParserConfig};
use url::Url;

/// `prop:value` 看起来像一个 URL（`https://example.com`）
///
/// 只有带 `://` 且能解析出非空 host 的字符串才算。
pub fn looks_like_uri(declaration: &str) -> bool {
    if !declaration.contains("://") {
        return false;
    }
    match Url::parse(declaration) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// 判断 `a { prop: value }` 是否为合法的单条声明
///
/// ```
/// use crosswind_css::is_parsable_declaration;
///
/// assert!(is_parsable_declaration("mask-type", "luminance"));
/// assert!(!is_parsable_declaration("color", "red}"));
/// ```
pub fn is_parsable_declaration(property: &str, value: &str) -> bool {
    if looks_like_uri(&format!("{property}:{value}")) {
        return false;
    }

    let css = format!("a{{{property}:{value}}}");
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom("arbitrary.css".into()).into(), css);
    let mut errors = vec![];
    let stylesheet = match parse_string_input::<Stylesheet>(
        StringInput::from(&*fm),
        None,
        ParserConfig::default(),
        &mut errors,
    ) {
        Ok(stylesheet) => stylesheet,
        Err(_) => return false,
    };
    if !errors.is_empty() || stylesheet.rules.len() != 1 {
        return false;
    }

    match &stylesheet.rules[0] {
        Rule::QualifiedRule(rule) => {
            rule.block.value.len() == 1
                && matches!(rule.block.value[0], ComponentValue::Declaration(_))
        }
        _ => false,
    }
}
