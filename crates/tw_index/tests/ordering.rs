use crosswind_core::Config;
use crosswind_engine::bits::Bitfield;
use crosswind_engine::Context;
use proptest::prelude::*;

const POOL: &[&str] = &[
    "flex",
    "block",
    "underline",
    "m-4",
    "-m-4",
    "mx-2",
    "p-2",
    "bg-red-500",
    "bg-red-500/50",
    "text-center",
    "text-[2em]",
    "[mask-type:luminance]",
    "[color:red]",
    "hover:flex",
    "focus:hover:underline",
    "group-hover:underline",
    "sm:flex",
    "md:hover:bg-red-500",
    "dark:underline",
    "[&>*]:p-2",
    "[&_p]:underline",
    "!flex",
    "not-a-class",
];

fn generate_css(candidates: &[&str]) -> String {
    let mut ctx = Context::new(Config::default()).unwrap();
    ctx.generate(candidates.iter().copied()).unwrap();
    ctx.stylesheet().to_css()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_output_is_independent_of_candidate_order(
        shuffled in Just(POOL.to_vec()).prop_shuffle(),
    ) {
        prop_assert_eq!(generate_css(&shuffled), generate_css(POOL));
    }

    #[test]
    fn test_incremental_generation_matches_one_pass(
        subset in proptest::sample::subsequence(POOL.to_vec(), 1..POOL.len()),
    ) {
        let mut ctx = Context::new(Config::default()).unwrap();
        for candidate in subset.iter().rev() {
            ctx.generate([*candidate]).unwrap();
        }
        prop_assert_eq!(ctx.stylesheet().to_css(), generate_css(&subset));
    }
}

#[test]
fn test_incremental_order_does_not_leak_into_output() {
    let pairs = [
        ["[mask-type:luminance]", "[color:red]"],
        ["[&_p]:underline", "[&>*]:p-2"],
    ];
    for [a, b] in pairs {
        let mut forward = Context::new(Config::default()).unwrap();
        forward.generate([a]).unwrap();
        forward.generate([b]).unwrap();

        let mut backward = Context::new(Config::default()).unwrap();
        backward.generate([b]).unwrap();
        backward.generate([a]).unwrap();

        let css = forward.stylesheet().to_css();
        assert_eq!(css, backward.stylesheet().to_css());
        assert_eq!(css, generate_css(&[a, b]));
    }
}

#[test]
fn test_bit_remap_four_cycle() {
    // 0 → 1 → 2 → 3 → 0
    let mapping = [(0, 1), (1, 2), (2, 3), (3, 0)];

    let mut both = Bitfield::zero();
    both.set(1);
    both.set(3);
    let remapped = both.remap(&mapping);
    assert_eq!(remapped.ones().collect::<Vec<_>>(), vec![0, 2]);

    let swap = [(1, 3), (3, 1)];
    assert_eq!(both.remap(&swap).ones().collect::<Vec<_>>(), vec![1, 3]);

    let mut all = Bitfield::zero();
    for bit in 0..4 {
        all.set(bit);
    }
    assert_eq!(all.remap(&mapping), all);
}
