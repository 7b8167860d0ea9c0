//! Proportional swing matrix.
//!
//! Gainers take their gain from losers in proportion to each loser's share of
//! the total loss; losers give to gainers in proportion to each gainer's share
//! of the total gain. Cells are non-negative magnitudes; the sign lives in
//! [`SwingMatrix::net_swing`].
//!
//! A cell is `None` when the pair is not counterparts in the allocation
//! (e.g. two gainers). Parties with exactly zero swing get explicit `Some(0.0)`
//! cells: against everyone in their own row, and in every gainer/loser row.
//! Present cells count toward the per-party mean absolute swing in
//! [`crate::predict`], absent ones do not.

use swing_core::{Party, PartyMap, SupportRatio};

type Row = PartyMap<Option<f64>>;

#[derive(Clone, Debug, PartialEq)]
pub struct SwingMatrix {
    rows: PartyMap<Row>,
    net: PartyMap<f64>,
}

impl SwingMatrix {
    /// Signed row sum: positive for gainers, negative for losers.
    #[inline]
    pub fn net_swing(&self, p: Party) -> f64 {
        self.net[p]
    }

    #[inline]
    pub fn cell(&self, dest: Party, src: Party) -> Option<f64> {
        self.rows[dest][src]
    }

    /// Present cells of one row, in canonical order.
    pub fn row(&self, dest: Party) -> impl Iterator<Item = (Party, f64)> + '_ {
        self.rows[dest].iter().filter_map(|(src, c)| c.map(|v| (src, v)))
    }

    /// Σ magnitudes in a row.
    pub fn row_sum(&self, dest: Party) -> f64 {
        self.row(dest).map(|(_, v)| v).sum()
    }

    pub fn present_cells(&self, dest: Party) -> usize {
        self.rows[dest].values().filter(|c| c.is_some()).count()
    }

    /// Σ |cell| over a row, with the number of present cells.
    pub fn abs_row_stats(&self, dest: Party) -> (f64, usize) {
        self.row(dest).fold((0.0, 0), |(s, n), (_, v)| (s + v.abs(), n + 1))
    }
}

/// Swing from `before` to `after`. Parties absent from either side read as 0,
/// so an entrant swings in by `after[p]` and a leaver out by `before[p]`.
pub fn calculate_swing(before: &SupportRatio, after: &SupportRatio) -> SwingMatrix {
    let swing = PartyMap::from_fn(|p| after.get(p) - before.get(p));

    let mut pos_total = 0.0;
    let mut neg_total = 0.0;
    for &s in swing.values() {
        if s > 0.0 {
            pos_total += s;
        } else if s < 0.0 {
            neg_total += -s;
        }
    }

    let mut rows: PartyMap<Row> = PartyMap::splat(PartyMap::splat(None));
    for dest in Party::ALL {
        let sd = swing[dest];
        let row = &mut rows[dest];
        for src in Party::ALL {
            let ss = swing[src];
            row[src] = if sd == 0.0 || ss == 0.0 {
                Some(0.0)
            } else if sd > 0.0 && ss < 0.0 {
                Some(sd * (-ss / neg_total))
            } else if sd < 0.0 && ss > 0.0 {
                Some(-sd * (ss / pos_total))
            } else {
                None
            };
        }
    }

    let net = PartyMap::from_fn(|p| {
        let sum: f64 = rows[p].values().flatten().sum();
        if swing[p] < 0.0 {
            -sum
        } else {
            sum
        }
    });

    SwingMatrix { rows, net }
}
