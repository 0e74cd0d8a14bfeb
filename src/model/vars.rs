//! Decision-variable layout. Every family lives in a contiguous block of
//! columns indexed by (player, week[, slot]), so the hot paths address
//! variables by arithmetic rather than hashing; the pool's lookup table maps
//! indices back to player ids.

use crate::domain::{Pool, BENCH_SLOTS, MAX_FREE_TRANSFERS};
use crate::error::ModelError;
use crate::linear::LinearModel;

/// Ceiling on total decision variables; a run this size has gone wrong
/// upstream of the builder.
const MAX_COLUMNS: usize = 4_000_000;

/// Offsets of each variable family within the column space of one model.
#[derive(Debug, Clone)]
pub struct VarGrid {
    players: usize,
    weeks: usize,
    squad: usize,
    squad_fh: usize,
    lineup: usize,
    captain: usize,
    vicecap: usize,
    transfer_in: usize,
    transfer_out: usize,
    use_tc: usize,
    bench: usize,
    use_wc: usize,
    use_bb: usize,
    use_fh: usize,
    fts: usize,
    penalised: usize,
    ft_state: usize,
    ft_floor: usize,
    ft_cap: usize,
    itb: usize,
}

impl VarGrid {
    pub fn allocate(
        lp: &mut LinearModel,
        pool: &Pool,
        initial_free_transfers: u8,
    ) -> Result<Self, ModelError> {
        let players = pool.len();
        let weeks = pool.horizon().len();
        let per_pair = 8 + BENCH_SLOTS;
        let per_week = 3 + 3 + MAX_FREE_TRANSFERS as usize + 2;
        let estimate = players * weeks * per_pair + weeks * per_week;
        if estimate > MAX_COLUMNS {
            return Err(ModelError::VariableOverflow { count: estimate });
        }

        let id = |p: usize| pool.players()[p].id;
        let gw = |w: usize| pool.horizon().gameweek(w);

        let pair_block = |lp: &mut LinearModel, tag: &str| {
            let base = lp.num_columns();
            for p in 0..players {
                for w in 0..weeks {
                    lp.binary(format!("{tag}_{}_w{}", id(p), gw(w)));
                }
            }
            base
        };
        let squad = pair_block(lp, "sq");
        let squad_fh = pair_block(lp, "sqfh");
        let lineup = pair_block(lp, "xi");
        let captain = pair_block(lp, "cap");
        let vicecap = pair_block(lp, "vc");
        let transfer_in = pair_block(lp, "tin");
        let transfer_out = pair_block(lp, "tout");
        let use_tc = pair_block(lp, "tc");

        let bench = lp.num_columns();
        for p in 0..players {
            for w in 0..weeks {
                for o in 0..BENCH_SLOTS {
                    lp.binary(format!("bn{o}_{}_w{}", id(p), gw(w)));
                }
            }
        }

        let week_block = |lp: &mut LinearModel, tag: &str| {
            let base = lp.num_columns();
            for w in 0..weeks {
                lp.binary(format!("{tag}_w{}", gw(w)));
            }
            base
        };
        let use_wc = week_block(lp, "wc");
        let use_bb = week_block(lp, "bb");
        let use_fh = week_block(lp, "fh");

        let fts = lp.num_columns();
        for w in 0..weeks {
            lp.push_column(
                format!("ft_w{}", gw(w)),
                1.0,
                MAX_FREE_TRANSFERS as f64,
                true,
                0.0,
            );
        }
        // The entry state is given, not decided.
        lp.fix(fts, initial_free_transfers as f64);

        let penalised = lp.num_columns();
        for w in 0..weeks {
            lp.push_column(format!("hit_w{}", gw(w)), 0.0, f64::INFINITY, true, 0.0);
        }

        let ft_state = lp.num_columns();
        for w in 0..weeks {
            for s in 1..=MAX_FREE_TRANSFERS {
                lp.binary(format!("fts{s}_w{}", gw(w)));
            }
        }

        let ft_floor = lp.num_columns();
        for w in 0..weeks.saturating_sub(1) {
            lp.binary(format!("ftlo_w{}", gw(w)));
        }
        let ft_cap = lp.num_columns();
        for w in 0..weeks.saturating_sub(1) {
            lp.binary(format!("fthi_w{}", gw(w)));
        }

        let itb = lp.num_columns();
        for w in 0..weeks {
            lp.push_column(format!("itb_w{}", gw(w)), 0.0, f64::INFINITY, false, 0.0);
        }

        Ok(Self {
            players,
            weeks,
            squad,
            squad_fh,
            lineup,
            captain,
            vicecap,
            transfer_in,
            transfer_out,
            use_tc,
            bench,
            use_wc,
            use_bb,
            use_fh,
            fts,
            penalised,
            ft_state,
            ft_floor,
            ft_cap,
            itb,
        })
    }

    pub fn players(&self) -> usize {
        self.players
    }

    pub fn weeks(&self) -> usize {
        self.weeks
    }

    #[inline]
    fn pair(&self, base: usize, p: usize, w: usize) -> usize {
        debug_assert!(p < self.players && w < self.weeks);
        base + p * self.weeks + w
    }

    pub fn squad(&self, p: usize, w: usize) -> usize {
        self.pair(self.squad, p, w)
    }

    pub fn squad_fh(&self, p: usize, w: usize) -> usize {
        self.pair(self.squad_fh, p, w)
    }

    pub fn lineup(&self, p: usize, w: usize) -> usize {
        self.pair(self.lineup, p, w)
    }

    pub fn captain(&self, p: usize, w: usize) -> usize {
        self.pair(self.captain, p, w)
    }

    pub fn vicecap(&self, p: usize, w: usize) -> usize {
        self.pair(self.vicecap, p, w)
    }

    pub fn transfer_in(&self, p: usize, w: usize) -> usize {
        self.pair(self.transfer_in, p, w)
    }

    pub fn transfer_out(&self, p: usize, w: usize) -> usize {
        self.pair(self.transfer_out, p, w)
    }

    pub fn use_tc(&self, p: usize, w: usize) -> usize {
        self.pair(self.use_tc, p, w)
    }

    pub fn bench(&self, p: usize, w: usize, slot: usize) -> usize {
        debug_assert!(p < self.players && w < self.weeks && slot < BENCH_SLOTS);
        self.bench + (p * self.weeks + w) * BENCH_SLOTS + slot
    }

    pub fn use_wc(&self, w: usize) -> usize {
        debug_assert!(w < self.weeks);
        self.use_wc + w
    }

    pub fn use_bb(&self, w: usize) -> usize {
        debug_assert!(w < self.weeks);
        self.use_bb + w
    }

    pub fn use_fh(&self, w: usize) -> usize {
        debug_assert!(w < self.weeks);
        self.use_fh + w
    }

    pub fn fts(&self, w: usize) -> usize {
        debug_assert!(w < self.weeks);
        self.fts + w
    }

    pub fn penalised(&self, w: usize) -> usize {
        debug_assert!(w < self.weeks);
        self.penalised + w
    }

    /// Indicator for the free-transfer state `s` in week `w`; `s` is 1..=5.
    pub fn ft_state(&self, w: usize, s: u8) -> usize {
        debug_assert!(w < self.weeks && (1..=MAX_FREE_TRANSFERS).contains(&s));
        self.ft_state + w * MAX_FREE_TRANSFERS as usize + (s as usize - 1)
    }

    /// Clamp binary: the week's transition bottomed out at one free transfer.
    pub fn ft_floor(&self, w: usize) -> usize {
        debug_assert!(w + 1 < self.weeks);
        self.ft_floor + w
    }

    /// Clamp binary: the week's transition saturated at five free transfers.
    pub fn ft_cap(&self, w: usize) -> usize {
        debug_assert!(w + 1 < self.weeks);
        self.ft_cap + w
    }

    pub fn itb(&self, w: usize) -> usize {
        debug_assert!(w < self.weeks);
        self.itb + w
    }
}
