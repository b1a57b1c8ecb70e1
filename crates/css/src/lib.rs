pub mod ast;
pub mod emit;
pub mod error;
pub mod parser;
pub mod selector;
pub mod styles;
pub mod validate;

// Re-export main types
pub use ast::{retain_rules, walk_decls_mut, walk_rules, walk_rules_mut, AtRule, Decl, Node, Rule};
pub use emit::emit_css;
pub use error::ParseError;
pub use parser::{parse_stylesheet, split_at_rule};
pub use selector::{
    eliminate_irrelevant, escape_class_name, extract_class_names, move_pseudo_elements,
    parse_selector, parse_selector_list, prefix_selector, rewrite_class_names, unescape,
    ClassScope, Combinator, Component, Pseudo, PseudoArgs, Selector, SelectorList,
};
pub use styles::{resolve_nested_selector, Styles};
pub use validate::{is_parsable_declaration, looks_like_uri};
