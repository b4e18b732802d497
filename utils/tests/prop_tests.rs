use proptest::prelude::*;

use estuary_utils::{mul_div_ceil, mul_div_floor};

proptest! {
    /// floor(a*b/c) <= ceil(a*b/c) <= floor(a*b/c) + 1 for nonzero c.
    #[test]
    fn ceil_floor_bracket(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128, c in 1u128..u64::MAX as u128) {
        let lo = mul_div_floor(a, b, c);
        let hi = mul_div_ceil(a, b, c);
        prop_assert!(lo <= hi);
        prop_assert!(hi - lo <= 1);
    }

    /// Exact division produces the same result for floor and ceil.
    #[test]
    fn exact_division_agrees(a in 0u128..u32::MAX as u128, c in 1u128..u32::MAX as u128) {
        let product_divisible = a * c;
        prop_assert_eq!(mul_div_floor(product_divisible, 1, c), mul_div_ceil(product_divisible, 1, c));
        prop_assert_eq!(mul_div_floor(product_divisible, 1, c), a);
    }

    /// Pro-rata splits never exceed the whole: sum of floor(total*b_i/T)
    /// over a partition b_1..b_n of T is at most total.
    #[test]
    fn prorata_never_exceeds_total(
        total in 0u128..1_000_000_000,
        parts in prop::collection::vec(1u128..1_000_000, 1..12),
    ) {
        let t: u128 = parts.iter().sum();
        let paid: u128 = parts.iter().map(|b| mul_div_floor(total, *b, t)).sum();
        prop_assert!(paid <= total);
    }
}
