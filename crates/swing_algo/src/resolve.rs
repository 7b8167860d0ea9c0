//! Plurality resolution for one constituency.
//!
//! Highest count wins. When several parties tie at the top, one is drawn
//! uniformly from the whole tied set with a single rejection-sampled pick, so
//! every tied party has probability 1/k regardless of canonical order.
//! A constituency where every party polled zero is a tie among all of them.

use swing_core::{Party, SimRng, VoteCount};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub winner: Party,
    /// Number of parties tied at the maximum (1 = clear winner).
    pub tie_width: usize,
}

pub fn resolve_constituency(votes: &VoteCount, rng: &mut SimRng) -> Resolution {
    let tied = top_by_votes(votes);
    let winner = if tied.len() == 1 {
        tied[0]
    } else {
        let idx = rng.choose_index(tied.len()).unwrap_or(0);
        tied[idx]
    };
    Resolution { winner, tie_width: tied.len() }
}

/// Scan in canonical order and return every party at the maximum.
fn top_by_votes(votes: &VoteCount) -> Vec<Party> {
    let mut max_val: u64 = 0;
    let mut tied: Vec<Party> = Vec::with_capacity(Party::COUNT);
    for (p, v) in votes.iter() {
        if v > max_val {
            max_val = v;
            tied.clear();
            tied.push(p);
        } else if v == max_val {
            tied.push(p);
        }
    }
    tied
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use swing_core::PartyMap;

    fn counts(pairs: &[(Party, u64)]) -> VoteCount {
        let mut m = PartyMap::splat(0u64);
        for &(p, v) in pairs {
            m.set(p, v);
        }
        VoteCount::new(m)
    }

    #[test]
    fn all_zero_is_full_tie() {
        let mut rng = SimRng::from_seed_u64(11);
        let r = resolve_constituency(&VoteCount::default(), &mut rng);
        assert_eq!(r.tie_width, Party::COUNT);
    }

    #[test]
    fn three_way_tie_is_uniform() {
        let v = counts(&[(Party::Labour, 500), (Party::Green, 500), (Party::Ukip, 500), (Party::Other, 10)]);
        let mut rng = SimRng::from_seed_u64(0x5EED);
        let draws = 30_000u32;
        let mut hits = [0u32; 3];
        for _ in 0..draws {
            let r = resolve_constituency(&v, &mut rng);
            assert_eq!(r.tie_width, 3);
            match r.winner {
                Party::Labour => hits[0] += 1,
                Party::Green => hits[1] += 1,
                Party::Ukip => hits[2] += 1,
                other => panic!("untied party won: {other}"),
            }
        }
        let expected = f64::from(draws) / 3.0;
        let chi2: f64 = hits
            .iter()
            .map(|&h| {
                let d = f64::from(h) - expected;
                d * d / expected
            })
            .sum();
        // df = 2; 20.0 is well past the p = 0.001 critical value (13.82)
        assert!(chi2 < 20.0, "chi2 = {chi2}, hits = {hits:?}");
    }

    proptest! {
        #[test]
        fn strict_maximum_always_wins(
            counts in prop::collection::vec(0u64..100_000, Party::COUNT),
            lead in 1u64..1_000,
            winner_ix in 0usize..Party::COUNT,
            seed in any::<u64>(),
        ) {
            let mut m = PartyMap::from_fn(|p| counts[p.index()]);
            let top = counts.iter().copied().max().unwrap_or(0);
            let w = Party::ALL[winner_ix];
            m.set(w, top + lead);
            let r = resolve_constituency(&VoteCount::new(m), &mut SimRng::from_seed_u64(seed));
            prop_assert_eq!(r.winner, w);
            prop_assert_eq!(r.tie_width, 1);
        }
    }
}
