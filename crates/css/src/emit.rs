use crate::ast::{AtRule, Decl, Node, Rule};
use std::fmt::Write;

/// 生成 CSS 字符串
///
/// 保证：
/// - 两空格缩进，每条声明以 `;` 结尾
/// - 相同输入产生完全相同的输出
pub fn emit_css(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        emit_node(&mut out, node, 0);
    }
    out
}

fn emit_node(out: &mut String, node: &Node, depth: usize) {
    match node {
        Node::Rule(rule) => emit_rule(out, rule, depth),
        Node::AtRule(at) => emit_at_rule(out, at, depth),
        Node::Decl(decl) => emit_decl(out, decl, depth),
        Node::Comment(text) => {
            indent(out, depth);
            let _ = writeln!(out, "/*{text}*/");
        }
    }
}

fn emit_rule(out: &mut String, rule: &Rule, depth: usize) {
    indent(out, depth);
    let _ = writeln!(out, "{} {{", rule.selector);
    for child in &rule.nodes {
        emit_node(out, child, depth + 1);
    }
    indent(out, depth);
    out.push_str("}\n");
}

fn emit_at_rule(out: &mut String, at: &AtRule, depth: usize) {
    indent(out, depth);
    out.push('@');
    out.push_str(&at.name);
    if !at.params.is_empty() {
        out.push(' ');
        out.push_str(&at.params);
    }
    match &at.nodes {
        None => out.push_str(";\n"),
        Some(children) => {
            out.push_str(" {\n");
            for child in children {
                emit_node(out, child, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
    }
}

fn emit_decl(out: &mut String, decl: &Decl, depth: usize) {
    indent(out, depth);
    let _ = write!(out, "{}: {}", decl.prop, decl.value);
    if decl.important {
        out.push_str(" !important");
    }
    out.push_str(";\n");
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
