use crosswind_core::{Config, DarkMode, Diagnostics, Important, SafelistEntry};
use pretty_assertions::assert_eq;

#[test]
fn test_full_config_from_json() {
    let json = r##"{
        "prefix": "tw-",
        "separator": "_",
        "important": "#app",
        "darkMode": ["class", ".night"],
        "safelist": ["underline", { "pattern": "^p-[0-9]+$" }],
        "blocklist": ["container"],
        "features": { "variantGrouping": true },
        "theme": {
            "screens": { "tablet": "640px" },
            "colors": { "brand": { "DEFAULT": "#0af", "dark": "#05a" } }
        }
    }"##;

    let config = Config::from_json(json).expect("Failed to load config");

    assert_eq!(config.prefix, "tw-");
    assert_eq!(config.separator, "_");
    assert_eq!(config.important, Important::Selector("#app".to_string()));
    assert_eq!(config.dark_mode, DarkMode::Class(".night".to_string()));
    assert_eq!(config.safelist[0], SafelistEntry::Class("underline".to_string()));
    assert_eq!(config.blocklist, vec!["container".to_string()]);
    assert!(config.features.variant_grouping);
    assert!(!config.features.hover_only_when_supported);

    // 用户主题整体替换默认主题
    assert_eq!(config.theme_value("screens.tablet").as_deref(), Some("640px"));
    assert_eq!(config.theme_value("screens.sm"), None);
    assert_eq!(config.theme_value("colors.brand.dark").as_deref(), Some("#05a"));
}

#[test]
fn test_default_theme_lookups() {
    let config = Config::default();

    assert_eq!(config.theme_value("spacing[2.5]").as_deref(), Some("0.625rem"));
    assert_eq!(config.theme_value("colors.red.500").as_deref(), Some("#ef4444"));
    assert_eq!(config.theme_value("fontSize.sm").as_deref(), Some("0.875rem"));
    assert_eq!(
        config.theme_value("fontFamily.mono").as_deref(),
        Some("ui-monospace, SFMono-Regular, Menlo, Monaco, Consolas, monospace")
    );
}

#[test]
fn test_config_hash_is_stable() {
    let a = Config::from_json(r#"{ "prefix": "tw-" }"#).unwrap();
    let b = Config::default().with_prefix("tw-");
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.hash().to_hex().len(), 64);
}

#[test]
fn test_diagnostics_drain() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.warn("content-problems", vec!["No utility classes were detected".to_string()]);
    let drained = diagnostics.take();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].key, "content-problems");
}
