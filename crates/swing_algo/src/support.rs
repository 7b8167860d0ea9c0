// crates/swing_algo/src/support.rs

use swing_core::{CoreError, SupportRatio, VoteCount};

/// Each party's share of the constituency total.
pub fn calculate_support(votes: &VoteCount) -> Result<SupportRatio, CoreError> {
    let total = votes.total();
    if total == 0 {
        return Err(CoreError::ZeroTotalVotes);
    }
    let total = total as f64;
    Ok(SupportRatio::from_normalized(votes.as_map().map(|_, &v| v as f64 / total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use swing_core::{Party, PartyMap};

    #[test]
    fn zero_total_is_an_error() {
        assert_eq!(calculate_support(&VoteCount::default()), Err(CoreError::ZeroTotalVotes));
    }

    #[test]
    fn shares_are_count_over_total() {
        let mut m = PartyMap::splat(0u64);
        m.set(Party::Labour, 300);
        m.set(Party::Green, 100);
        let s = calculate_support(&VoteCount::new(m)).unwrap();
        assert_eq!(s.get(Party::Labour), 0.75);
        assert_eq!(s.get(Party::Green), 0.25);
        assert_eq!(s.get(Party::Ukip), 0.0);
    }

    proptest! {
        #[test]
        fn support_sums_to_one(counts in prop::collection::vec(0u64..5_000_000, Party::COUNT)) {
            prop_assume!(counts.iter().any(|&c| c > 0));
            let v = VoteCount::new(PartyMap::from_fn(|p| counts[p.index()]));
            let s = calculate_support(&v).unwrap();
            prop_assert!((s.sum() - 1.0).abs() < 1e-9);
            for (_, x) in s.iter() {
                prop_assert!((0.0..=1.0).contains(&x));
            }
        }
    }
}
