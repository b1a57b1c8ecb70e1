use crosswind_parse::{
    candidate_permutations, expand_variant_group, normalize, parse_candidate,
    split_utility_modifier,
};
use pretty_assertions::assert_eq;

#[test]
fn test_parse_specific_candidates() {
    // 常见候选类：(输入, 变体, 工具类, 重要性)
    let test_cases = vec![
        ("underline", vec![], "underline", false),
        ("hover:font-bold", vec!["hover"], "font-bold", false),
        ("sm:flex", vec!["sm"], "flex", false),
        ("group-focus:group-hover:text-center", vec!["group-focus", "group-hover"], "text-center", false),
        ("md:!bg-[#fff]/50", vec!["md"], "bg-[#fff]/50", true),
        ("[&_p]:mt-4", vec!["[&_p]"], "mt-4", false),
        ("supports-[display:grid]:grid", vec!["supports-[display:grid]"], "grid", false),
        ("-mt-4", vec![], "-mt-4", false),
    ];

    for (input, variants, base, important) in test_cases {
        let parsed = parse_candidate(input, ":");
        assert_eq!(parsed.variants, variants, "Variants mismatch for '{}'", input);
        assert_eq!(parsed.base, base, "Base mismatch for '{}'", input);
        assert_eq!(parsed.important, important, "Important mismatch for '{}'", input);
    }
}

#[test]
fn test_custom_separator() {
    let parsed = parse_candidate("md_hover_flex", "_");
    assert_eq!(parsed.variants, vec!["md", "hover"]);
    assert_eq!(parsed.base, "flex");
}

#[test]
fn test_resolve_path_for_opacity_candidate() {
    // 模拟解析器的查找过程：先拆前缀，再拆透明度修饰符
    let parsed = parse_candidate("hover:bg-red-500/50", ":");
    let (prefix, modifier) = candidate_permutations(&parsed.base)
        .find(|(prefix, _)| *prefix == "bg")
        .expect("bg prefix");
    assert_eq!(prefix, "bg");
    assert_eq!(split_utility_modifier(modifier), ("red-500", Some("50")));
}

#[test]
fn test_grouped_variants_fan_out() {
    let parsed = parse_candidate("dark:hover:(bg-black,text-white)", ":");
    let expanded = expand_variant_group(&parsed, ":").expect("group");
    assert_eq!(expanded, vec!["dark:hover:bg-black", "dark:hover:text-white"]);
}

#[test]
fn test_normalize_grid_template() {
    assert_eq!(
        normalize("repeat(3,minmax(0,1fr))_[full-end]", None),
        "repeat(3,minmax(0,1fr)) [full-end]"
    );
}
