// crates/swing_algo/src/predict.rs
//
// Constituency predictor: move last-election votes by the general swing, then
// add per-party normal noise scaled by how volatile the seat has been.

use log::trace;
use swing_core::{Constituency, CoreError, Party, PartyMap, SimRng, SupportRatio, VoteCount};

use crate::support::calculate_support;
use crate::swing::{calculate_swing, SwingMatrix};

/// Per-constituency quantities that do not depend on the realization.
/// Built once at setup; building fails on zero-total historical results.
#[derive(Clone, Debug)]
pub struct ConstituencyBasis {
    pub votes_prev1: VoteCount,
    pub total_prev1: u64,
    pub support_prev1: SupportRatio,
    pub historical: SwingMatrix,
}

impl ConstituencyBasis {
    pub fn prepare(c: &Constituency) -> Result<Self, CoreError> {
        let support_prev2 = calculate_support(&c.prev2)?;
        let support_prev1 = calculate_support(&c.prev1)?;
        Ok(Self {
            votes_prev1: c.prev1,
            total_prev1: c.prev1.total(),
            support_prev1,
            historical: calculate_swing(&support_prev2, &support_prev1),
        })
    }

    /// Deterministic part of the prediction: prev1 votes moved by the general swing.
    pub fn baseline(&self, general: &SwingMatrix) -> PartyMap<f64> {
        let total = self.total_prev1 as f64;
        PartyMap::from_fn(|p| {
            let moved = (total * general.net_swing(p)).round();
            (self.votes_prev1.get(p) as f64 + moved).max(0.0)
        })
    }

    /// Mean |cell| over the target and historical rows for `p`; 0 with no cells.
    pub fn mean_abs_swing(&self, target_swing: &SwingMatrix, p: Party) -> f64 {
        let (s_t, n_t) = target_swing.abs_row_stats(p);
        let (s_h, n_h) = self.historical.abs_row_stats(p);
        let n = n_t + n_h;
        if n == 0 {
            0.0
        } else {
            (s_t + s_h) / n as f64
        }
    }
}

/// Simulated vote count for one constituency.
///
/// `general` is the national (or regional) swing from last-election support to
/// the realization's target; `target` is the support this seat is steered toward.
pub fn predict_constituency(
    basis: &ConstituencyBasis,
    general: &SwingMatrix,
    target: &SupportRatio,
    scale_factor: f64,
    rng: &mut SimRng,
) -> VoteCount {
    let target_swing = calculate_swing(&basis.support_prev1, target);
    let baseline = basis.baseline(general);

    let mut out = VoteCount::default();
    for p in Party::ALL {
        let base = baseline[p];
        let sd = 0.5 * base * basis.mean_abs_swing(&target_swing, p) * scale_factor;
        let drawn = draw_votes(base, sd, rng);
        trace!("{p}: baseline={base} sd={sd} drawn={drawn}");
        out.set(p, drawn as u64);
    }
    out
}

/// Normal(base, sd) rounded to the nearest vote and clamped at 0; `sd == 0` is exact.
fn draw_votes(base: f64, sd: f64, rng: &mut SimRng) -> f64 {
    if sd > 0.0 {
        rng.normal(base, sd).round().max(0.0)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn counts(pairs: &[(Party, u64)]) -> VoteCount {
        let mut m = PartyMap::splat(0u64);
        for &(p, v) in pairs {
            m.set(p, v);
        }
        VoteCount::new(m)
    }

    fn seat() -> Constituency {
        Constituency {
            name: "Testford".into(),
            region: "North".into(),
            prev2: counts(&[(Party::Conservative, 20_000), (Party::Labour, 15_000)]),
            prev1: counts(&[(Party::Conservative, 18_000), (Party::Labour, 17_000)]),
        }
    }

    fn share(pairs: &[(Party, f64)]) -> SupportRatio {
        let mut m = PartyMap::splat(0.0);
        for &(p, v) in pairs {
            m.set(p, v);
        }
        SupportRatio::from_normalized(m)
    }

    #[test]
    fn zero_scale_returns_baseline() {
        let basis = ConstituencyBasis::prepare(&seat()).unwrap();
        let national_prev1 = share(&[(Party::Conservative, 36.0 / 70.0), (Party::Labour, 34.0 / 70.0)]);
        let target = share(&[(Party::Conservative, 0.55), (Party::Labour, 0.45)]);
        let general = calculate_swing(&national_prev1, &target);
        let mut rng = SimRng::from_seed_u64(3);
        let v = predict_constituency(&basis, &general, &target, 0.0, &mut rng);
        assert_eq!(v.get(Party::Conservative), 19_250);
        assert_eq!(v.get(Party::Labour), 15_750);
        assert_eq!(v.get(Party::Other), 0);
    }

    #[test]
    fn baseline_clamps_at_zero() {
        let basis = ConstituencyBasis::prepare(&seat()).unwrap();
        let before = share(&[(Party::Conservative, 0.6), (Party::Labour, 0.4)]);
        let after = share(&[(Party::Conservative, 0.0), (Party::Labour, 1.0)]);
        let general = calculate_swing(&before, &after);
        let b = basis.baseline(&general);
        assert_eq!(b[Party::Conservative], 0.0);
        assert_eq!(b[Party::Labour], 38_000.0);
    }

    #[test]
    fn zero_total_history_rejected() {
        let mut c = seat();
        c.prev2 = VoteCount::default();
        assert_eq!(ConstituencyBasis::prepare(&c).unwrap_err(), CoreError::ZeroTotalVotes);
    }

    #[test]
    fn mean_abs_swing_of_static_party_is_zero() {
        let basis = ConstituencyBasis::prepare(&seat()).unwrap();
        let target_swing = calculate_swing(&basis.support_prev1, &basis.support_prev1);
        // Other never moved: every cell present and zero.
        assert_eq!(basis.mean_abs_swing(&target_swing, Party::Other), 0.0);
    }

    proptest! {
        #[test]
        fn drawn_votes_are_never_negative(
            seed in any::<u64>(),
            base in 0u32..5_000,
            sd in 0.0f64..1_000_000.0,
        ) {
            let mut rng = SimRng::from_seed_u64(seed);
            for _ in 0..16 {
                let v = draw_votes(f64::from(base), sd, &mut rng);
                prop_assert!(v >= 0.0);
                prop_assert_eq!(v, v.round());
            }
        }

        #[test]
        fn predictor_is_reproducible(seed in any::<u64>(), con in 0.0f64..1.0) {
            let basis = ConstituencyBasis::prepare(&seat()).unwrap();
            let target = share(&[(Party::Conservative, con), (Party::Labour, 1.0 - con)]);
            let general = calculate_swing(&basis.support_prev1, &target);
            let a = predict_constituency(&basis, &general, &target, 1.5, &mut SimRng::from_seed_u64(seed));
            let b = predict_constituency(&basis, &general, &target, 1.5, &mut SimRng::from_seed_u64(seed));
            prop_assert_eq!(a, b);
        }
    }
}
