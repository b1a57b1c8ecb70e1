use crosswind_core::{Config, Important, Layer};
use crosswind_css::{emit_css, Node};
use crosswind_engine::{compare_entries, Context, Error, RuleEntry};
use pretty_assertions::assert_eq;

fn css_of(entries: &[RuleEntry]) -> String {
    let nodes: Vec<Node> = entries.iter().map(|entry| entry.rule.clone()).collect();
    emit_css(&nodes)
}

#[test]
fn test_end_to_end_default_config() {
    let mut ctx = Context::new(Config::default()).unwrap();
    ctx.generate(["underline", "hover:font-bold", "sm:flex"]).unwrap();
    let sheet = ctx.stylesheet().clone();

    assert_eq!(sheet.utilities.len() + sheet.variants.len(), 3);
    assert_eq!(sheet.utilities[0].candidate, "underline");
    assert_eq!(sheet.variants[0].candidate, "hover:font-bold");
    assert_eq!(sheet.variants[1].candidate, "sm:flex");
    assert_eq!(sheet.variants[1].offset.parent_layer, Layer::Utilities);

    let mut generated = sheet.utilities.clone();
    generated.extend(sheet.variants.iter().cloned());
    assert_eq!(
        css_of(&generated),
        ".underline {\n  text-decoration-line: underline;\n}\n\
         .hover\\:font-bold:hover {\n  font-weight: 700;\n}\n\
         @media (min-width: 640px) {\n  .sm\\:flex {\n    display: flex;\n  }\n}\n"
    );
}

#[test]
fn test_variant_chain_flattens_onto_one_compound() {
    let mut ctx = Context::new(Config::default()).unwrap();
    let rules = ctx.generate(["focus:hover:text-center"]).unwrap();
    let selectors: Vec<&str> = rules
        .iter()
        .filter(|entry| entry.candidate == "focus:hover:text-center")
        .filter_map(|entry| entry.rule.as_rule())
        .map(|rule| rule.selector.as_str())
        .collect();
    assert_eq!(selectors, vec![r".focus\:hover\:text-center:hover:focus"]);
}

#[test]
fn test_merge_variants_share_group() {
    let mut ctx = Context::new(Config::default()).unwrap();
    let rules = ctx.generate(["group-focus:group-hover:text-center"]).unwrap();
    let rule = rules
        .iter()
        .filter(|entry| entry.candidate == "group-focus:group-hover:text-center")
        .find_map(|entry| entry.rule.as_rule())
        .unwrap();
    assert_eq!(rule.selector, r".group:focus:hover .group-focus\:group-hover\:text-center");
}

#[test]
fn test_resolution_is_cached() {
    let mut ctx = Context::new(Config::default()).unwrap();
    let first = ctx.generate(["hover:underline", "[mask-type:luminance]"]).unwrap();
    let second = ctx.generate(["hover:underline", "[mask-type:luminance]"]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_arbitrary_property() {
    let mut ctx = Context::new(Config::default()).unwrap();
    let rules = ctx
        .generate(["[mask-type:luminance]", "[background:url(http://x)]"])
        .unwrap();
    let css = css_of(
        &rules
            .into_iter()
            .filter(|entry| entry.offset.layer == Layer::Utilities)
            .collect::<Vec<_>>(),
    );
    assert!(css.contains(".\\[background\\:url\\(http\\:\\/\\/x\\)\\] {\n  background: url(http://x);\n}"));
    assert!(css.contains(".\\[mask-type\\:luminance\\] {\n  mask-type: luminance;\n}"));
}

#[test]
fn test_important_selector_strategy() {
    let config = Config::default().with_important(Important::Selector("#app".to_string()));
    let mut ctx = Context::new(config).unwrap();
    let rules = ctx.generate(["underline"]).unwrap();
    let rule = rules
        .iter()
        .filter(|entry| entry.candidate == "underline")
        .find_map(|entry| entry.rule.as_rule())
        .unwrap();
    assert_eq!(rule.selector, "#app .underline");
}

#[test]
fn test_total_order_has_no_ties() {
    let mut ctx = Context::new(Config::default()).unwrap();
    ctx.generate([
        "flex",
        "block",
        "underline",
        "m-4",
        "-m-4",
        "p-2",
        "bg-red-500",
        "text-center",
        "[mask-type:luminance]",
        "hover:flex",
        "focus:flex",
        "sm:flex",
        "md:underline",
        "dark:bg-red-500",
        "[&:nth-child(3)]:underline",
    ])
    .unwrap();
    let entries: Vec<RuleEntry> = ctx.stylesheet().iter().cloned().collect();

    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            let ab = compare_entries(a, b);
            let ba = compare_entries(b, a);
            assert_ne!(ab, std::cmp::Ordering::Equal, "{} vs {}", a.candidate, b.candidate);
            assert_eq!(ab, ba.reverse());
        }
    }
}

#[test]
fn test_process_css_with_placeholders_and_apply() {
    let mut ctx = Context::new(Config::default()).unwrap();
    let css = ctx
        .process_css(
            "@tailwind utilities;\n@tailwind variants;\n.btn {\n  @apply underline hover:font-bold;\n}\n",
            ["flex", "sm:flex"],
        )
        .unwrap();

    assert_eq!(
        css,
        ".flex {\n  display: flex;\n}\n\
         @media (min-width: 640px) {\n  .sm\\:flex {\n    display: flex;\n  }\n}\n\
         .btn {\n  text-decoration-line: underline;\n}\n\
         .btn:hover {\n  font-weight: 700;\n}\n"
    );
}

#[test]
fn test_process_css_reports_unknown_apply() {
    let mut ctx = Context::new(Config::default()).unwrap();
    let err = ctx
        .process_css(".btn {\n  color: red;\n  @apply not-a-class;\n}", Vec::<String>::new())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownApplyTarget { ref class, line: Some(3) } if class == "not-a-class"));
}

#[test]
fn test_empty_utilities_warns_once() {
    let mut ctx = Context::new(Config::default()).unwrap();
    ctx.process_css("@tailwind utilities;", Vec::<String>::new()).unwrap();
    ctx.process_css("@tailwind utilities;", Vec::<String>::new()).unwrap();
    let diagnostics = ctx.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].key, "content-problems");
}
