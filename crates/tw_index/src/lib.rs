//! Utility-class CSS engine.
//!
//! A [`Context`] owns a resolved [`Config`](crosswind_core::Config), the
//! plugin registry and every cache. Feed it candidate class names with
//! [`Context::generate`] / [`Context::stylesheet`], or process a whole
//! stylesheet with `@tailwind` placeholders and `@apply` through
//! [`Context::process_css`].

mod apply;
pub mod bits;
pub mod color;
pub mod context;
pub mod data_types;
pub mod error;
pub mod format;
pub mod generator;
pub mod introspect;
pub mod offsets;
pub mod plugin;
pub mod resolver;
pub mod value;
pub mod variant;

pub use context::{Context, ContextCache};
pub use error::{Error, Result};
pub use generator::{compare_entries, RuleEntry, Stylesheet};
pub use introspect::{ClassListItem, VariantInfo};
pub use offsets::{Offsets, RuleOffset, SortArgs, SortFn, SortOption};
pub use plugin::{
    css_value, plugin, utility, IntoNodes, MatchVariantOptions, Plugin, PluginApi, UtilityExtras, UtilityFn,
    VariantOptions,
};
pub use resolver::Match;
pub use value::{DataType, Modifiers, TypeSpec, UtilityOptions};
pub use variant::{VariantApi, VariantArgs, VariantFn, VariantOutput};
