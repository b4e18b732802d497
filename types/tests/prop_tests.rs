use proptest::prelude::*;

use estuary_types::{Shares, Timestamp, VoteId, VoteKind};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// advance_past always lands strictly after `now`, on an interval
    /// boundary relative to the starting slot.
    #[test]
    fn advance_past_lands_after_now(
        slot in 0u64..1_000_000,
        interval in 1u64..100_000,
        now in 0u64..10_000_000,
    ) {
        let next = Timestamp::new(slot).advance_past(interval, Timestamp::new(now));
        prop_assert!(next > Timestamp::new(now));
        if next.as_secs() >= slot {
            prop_assert_eq!((next.as_secs() - slot) % interval, 0);
        }
    }

    /// advance_past never overshoots by a full interval.
    #[test]
    fn advance_past_is_minimal(
        slot in 0u64..1_000_000,
        interval in 1u64..100_000,
        now in 0u64..10_000_000,
    ) {
        let next = Timestamp::new(slot).advance_past(interval, Timestamp::new(now));
        if slot <= now {
            prop_assert!(next.as_secs() - now <= interval);
        }
    }

    /// Shares checked arithmetic agrees with i64 checked arithmetic.
    #[test]
    fn shares_checked_add_matches_i64(a in any::<i64>(), b in any::<i64>()) {
        let sum = Shares::new(a).checked_add(Shares::new(b));
        prop_assert_eq!(sum.map(|s| s.raw()), a.checked_add(b));
    }

    /// to_u128 -> try_from_u128 round-trips non-negative amounts.
    #[test]
    fn shares_u128_roundtrip(a in 0i64..i64::MAX) {
        let s = Shares::new(a);
        prop_assert_eq!(Shares::try_from_u128(s.to_u128()), Some(s));
    }

    /// Vote ids round-trip through their textual form.
    #[test]
    fn vote_id_text_roundtrip(kind in 0u8..4, instance in any::<u32>()) {
        let kind = match kind {
            0 => VoteKind::Committee,
            1 => VoteKind::Witness,
            2 => VoteKind::Worker,
            _ => VoteKind::Son,
        };
        let id = VoteId::new(kind, instance);
        prop_assert_eq!(id.to_string().parse::<VoteId>().unwrap(), id);
    }

    /// Vote ids round-trip through bincode.
    #[test]
    fn vote_id_bincode_roundtrip(instance in any::<u32>()) {
        let id = VoteId::new(VoteKind::Witness, instance);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: VoteId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, id);
    }
}
